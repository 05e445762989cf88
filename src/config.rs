use crate::backend::{BackendConfig, ProviderKind};
use crate::batch::FileTask;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Title used when none is given.
pub const DEFAULT_TITLE: &str = "Complete Study Notes";

/// Configuration for a notes run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Document title, also the source of the output file name
    pub title: String,

    /// Files to explain, in document order
    pub tasks: Vec<FileTask>,

    /// Text-generation backend settings
    pub backend: BackendConfig,

    /// Directory the document is written to
    pub output_dir: PathBuf,

    /// Explicit output file name; derived from the title when unset
    pub output_name: Option<String>,

    /// Where to save the generated records as JSON
    pub archive_path: Option<PathBuf>,

    /// Path to an external prompt template
    pub template_path: Option<PathBuf>,

    /// Dry run mode (print the document instead of writing it)
    pub dry_run: bool,

    /// Create backups of existing files
    pub backup_existing: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use devnotes::Config;
    ///
    /// let config = Config::builder()
    ///     .title("Python Basics")
    ///     .file("loops.py")
    ///     .build()
    ///     .expect("valid configuration");
    /// assert_eq!(config.tasks.len(), 1);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// Input files are not checked here; a missing file fails the batch
    /// when it is reached.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The title is blank
    /// - No files are configured
    /// - The template file is missing or invalid
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::config("title must not be empty"));
        }

        if self.tasks.is_empty() {
            return Err(Error::config("at least one input file is required"));
        }

        if let Some(name) = &self.output_name {
            if name.trim().is_empty() {
                return Err(Error::config("output name must not be empty"));
            }
        }

        if let Some(ref template_path) = self.template_path {
            if !template_path.exists() {
                return Err(Error::config(format!(
                    "Template file does not exist: {}",
                    template_path.display()
                )));
            }

            if !template_path.is_file() {
                return Err(Error::config(format!(
                    "Template path is not a file: {}",
                    template_path.display()
                )));
            }

            crate::template_validator::TemplateValidator::validate_template(template_path)?;
        }

        Ok(())
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    title: Option<String>,
    tasks: Vec<FileTask>,
    provider: Option<ProviderKind>,
    model: Option<String>,
    api_key: Option<String>,
    endpoint: Option<String>,
    timeout: Option<Duration>,
    max_output_tokens: Option<u32>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    archive_path: Option<PathBuf>,
    template_path: Option<PathBuf>,
    dry_run: bool,
    backup_existing: Option<bool>,
}

impl ConfigBuilder {
    /// Sets the document title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Appends a task.
    #[must_use]
    pub fn task(mut self, task: FileTask) -> Self {
        self.tasks.push(task);
        self
    }

    /// Appends several tasks, keeping their order.
    #[must_use]
    pub fn tasks(mut self, tasks: impl IntoIterator<Item = FileTask>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    /// Appends a file with no overrides.
    #[must_use]
    pub fn file(self, path: impl Into<PathBuf>) -> Self {
        self.task(FileTask::new(path))
    }

    /// Sets the provider.
    #[must_use]
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sets the model; the provider default is used otherwise.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the provider base URL.
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the output token cap.
    #[must_use]
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets the output file name.
    #[must_use]
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Saves the generated records to this path.
    #[must_use]
    pub fn archive_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive_path = Some(path.into());
        self
    }

    /// Sets the path to an external prompt template.
    ///
    /// The template must be valid Tera and reference `content` and
    /// `topic_name`.
    #[must_use]
    pub fn template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    /// Enables dry run mode.
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Enables or disables backup creation.
    #[must_use]
    pub fn backup_existing(mut self, enabled: bool) -> Self {
        self.backup_existing = Some(enabled);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let mut backend = BackendConfig::new(self.provider.unwrap_or(ProviderKind::Gemini));
        if let Some(model) = self.model {
            backend.model = model;
        }
        backend.api_key = self.api_key;
        backend.endpoint = self.endpoint;
        backend.timeout = self.timeout;
        if let Some(tokens) = self.max_output_tokens {
            backend.max_output_tokens = tokens;
        }

        let config = Config {
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            tasks: self.tasks,
            backend,
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from(".")),
            output_name: self.output_name,
            archive_path: self.archive_path,
            template_path: self.template_path,
            dry_run: self.dry_run,
            backup_existing: self.backup_existing.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}
