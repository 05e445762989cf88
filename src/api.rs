//! # Quick Start API
//!
//! High-level, ergonomic API for common use cases. Start here if you want a
//! notes document without assembling a [`Config`] by hand.
//!
//! ## Examples
//!
//! ```no_run
//! use devnotes::api::{Notes, Provider};
//!
//! // Two files, default provider (key from GEMINI_API_KEY)
//! Notes::titled("Python Basics")
//!     .file("loops.py")
//!     .file("functions.py")
//!     .run()?;
//!
//! // Every source file of a directory, with a named topic up front
//! Notes::titled("Data Science")
//!     .file_with_topic("intro.ipynb", "Getting Started")
//!     .dir("./lessons")
//!     .provider(Provider::Claude)
//!     .output("./notes")
//!     .archive("./notes/data_science.json")
//!     .run()?;
//! # Ok::<(), devnotes::Error>(())
//! ```

use crate::{
    Config, FileTask, Pipeline, PipelineStats, ProviderKind, Result, TextBackend,
    collect_sources,
};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Core API
// ============================================================================

/// Entry point for the Quick Start API.
///
/// Inputs keep the order in which they are added; a directory expands to
/// its sorted source files at that position.
#[derive(Debug, Clone)]
#[must_use = "call .run() to generate the notes"]
pub struct Notes {
    title: String,
    inputs: Vec<Input>,
    provider: ProviderKind,
    model: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
    output: PathBuf,
    name: Option<String>,
    archive: Option<PathBuf>,
    template_path: Option<PathBuf>,
    dry_run: bool,
}

#[derive(Debug, Clone)]
enum Input {
    Task(FileTask),
    Dir(PathBuf),
}

impl Default for Notes {
    fn default() -> Self {
        Self {
            title: crate::config::DEFAULT_TITLE.to_string(),
            inputs: Vec::new(),
            provider: ProviderKind::Gemini,
            model: None,
            api_key: None,
            timeout: None,
            output: PathBuf::from("."),
            name: None,
            archive: None,
            template_path: None,
            dry_run: false,
        }
    }
}

impl Notes {
    /// Starts a document with the given title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Adds a file; its topic is derived from the file name.
    pub fn file(self, path: impl Into<PathBuf>) -> Self {
        self.task(FileTask::new(path))
    }

    /// Adds a file under an explicit topic.
    pub fn file_with_topic(self, path: impl Into<PathBuf>, topic: impl Into<String>) -> Self {
        self.task(FileTask::new(path).with_topic(topic))
    }

    /// Adds a fully specified task.
    pub fn task(mut self, task: FileTask) -> Self {
        self.inputs.push(Input::Task(task));
        self
    }

    /// Adds every source file under a directory.
    pub fn dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(Input::Dir(path.into()));
        self
    }

    /// Select the provider.
    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = provider.into();
        self
    }

    /// Override the provider's default model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the API key instead of reading it from the environment.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Give up on a request after this long.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the output directory.
    ///
    /// Default: current directory
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    /// Set the output file name instead of deriving it from the title.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Save the generated notes as JSON for later editing.
    pub fn archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive = Some(path.into());
        self
    }

    /// Use a custom Tera prompt template.
    ///
    /// The template must reference `content` and `topic_name`; it may also
    /// use `main_title`, `previous_topics` and `suggestion`.
    pub fn template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    /// Print the document instead of writing it.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Generate the notes and write the document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No input files were given, or a directory has none
    /// - No API key is available
    /// - Any file fails to extract or generate
    pub fn run(self) -> Result<PipelineStats> {
        let config = self.build_config()?;
        Pipeline::new(config)?.run()
    }

    /// Like [`Notes::run`], with a caller-supplied backend.
    ///
    /// # Errors
    ///
    /// See [`Notes::run`].
    pub fn run_with(self, backend: Box<dyn TextBackend>) -> Result<PipelineStats> {
        let config = self.build_config()?;
        Pipeline::with_backend(config, backend)?.run()
    }

    fn build_config(self) -> Result<Config> {
        let mut tasks = Vec::new();
        for input in self.inputs {
            match input {
                Input::Task(task) => tasks.push(task),
                Input::Dir(dir) => {
                    tasks.extend(collect_sources(dir, &[])?.into_iter().map(FileTask::new));
                }
            }
        }

        let mut builder = Config::builder()
            .title(self.title)
            .tasks(tasks)
            .provider(self.provider)
            .output_dir(self.output)
            .dry_run(self.dry_run);

        if let Some(model) = self.model {
            builder = builder.model(model);
        }

        if let Some(key) = self.api_key {
            builder = builder.api_key(key);
        }

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(name) = self.name {
            builder = builder.output_name(name);
        }

        if let Some(archive) = self.archive {
            builder = builder.archive_path(archive);
        }

        if let Some(template_path) = self.template_path {
            builder = builder.template_path(template_path);
        }

        builder.build()
    }
}

// ============================================================================
// Type-safe enums for common options
// ============================================================================

/// Text-generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Google Gemini (default)
    Gemini,
    /// OpenAI
    OpenAi,
    /// Anthropic Claude
    Claude,
}

impl From<Provider> for ProviderKind {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::Gemini => Self::Gemini,
            Provider::OpenAi => Self::OpenAi,
            Provider::Claude => Self::Claude,
        }
    }
}

// ============================================================================
// Convenience functions
// ============================================================================

/// Generate notes for a list of files with default settings.
///
/// # Examples
///
/// ```no_run
/// use devnotes::api::notes;
///
/// let stats = notes("Python Basics", ["loops.py", "functions.py"])?;
/// println!("Wrote {} files", stats.files_written);
/// # Ok::<(), devnotes::Error>(())
/// ```
pub fn notes<I, P>(title: &str, files: I) -> Result<PipelineStats>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    files
        .into_iter()
        .fold(Notes::titled(title), |notes, file| notes.file(file))
        .run()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::ScriptedBackend;
    use assert_fs::prelude::*;

    #[test]
    fn notes_builder_has_sensible_defaults() {
        let notes = Notes::titled("Python");
        assert_eq!(notes.title, "Python");
        assert_eq!(notes.provider, ProviderKind::Gemini);
        assert_eq!(notes.output, PathBuf::from("."));
        assert!(!notes.dry_run);
    }

    #[test]
    fn notes_builder_is_fluent() {
        let config = Notes::titled("Python")
            .file("a.py")
            .file_with_topic("b.py", "Second")
            .provider(Provider::OpenAi)
            .model("gpt-4o-mini")
            .output("./notes")
            .name("python.md")
            .dry_run()
            .build_config()
            .unwrap();

        assert_eq!(config.tasks.len(), 2);
        assert_eq!(config.tasks[1].topic.as_deref(), Some("Second"));
        assert_eq!(config.backend.provider, ProviderKind::OpenAi);
        assert_eq!(config.backend.model, "gpt-4o-mini");
        assert_eq!(config.output_dir, PathBuf::from("./notes"));
        assert_eq!(config.output_name.as_deref(), Some("python.md"));
        assert!(config.dry_run);
    }

    #[test]
    fn provider_default_model_is_used() {
        let config = Notes::titled("T")
            .file("a.py")
            .provider(Provider::Claude)
            .build_config()
            .unwrap();
        assert_eq!(config.backend.model, ProviderKind::Claude.default_model());
    }

    #[test]
    fn directories_expand_in_place() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("lessons/b.py").write_str("pass").unwrap();
        temp.child("lessons/a.py").write_str("pass").unwrap();

        let config = Notes::titled("T")
            .file("first.py")
            .dir(temp.child("lessons").path())
            .file("last.py")
            .build_config()
            .unwrap();

        let names: Vec<_> = config
            .tasks
            .iter()
            .map(|t| t.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["first.py", "a.py", "b.py", "last.py"]);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(Notes::titled("T").build_config().unwrap_err().is_config());
    }

    #[test]
    fn run_with_custom_backend() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("react-props-state.js").write_str("export default App;").unwrap();

        let backend = ScriptedBackend::with_responses(["Props flow down."]);
        let stats = Notes::titled("React")
            .file(temp.child("react-props-state.js").path())
            .output(temp.path())
            .run_with(Box::new(backend))
            .unwrap();

        assert_eq!(stats.topics, "React Props State");
        temp.child("react_notes.md")
            .assert("# React\n\n## React Props State\n\nProps flow down.\n\n");
    }
}
