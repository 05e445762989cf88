use crate::{
    error::{Error, Result},
    template_validator::TemplateValidator,
};
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};

const BUILTIN_TEMPLATE: &str = "notes";
const CUSTOM_TEMPLATE: &str = "custom";

/// Values substituted into the notes prompt.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PromptInput<'a> {
    /// Title of the whole document
    pub main_title: &'a str,
    /// Comma-joined topics already covered by earlier files
    pub previous_topics: &'a str,
    /// Topic of the current file
    pub topic_name: &'a str,
    /// Free-text style suggestion
    pub suggestion: &'a str,
    /// Extracted file content
    pub content: &'a str,
}

/// Renders the instructional prompt sent to the backend for each file.
#[derive(Debug)]
pub struct PromptEngine {
    tera: Tera,
    template_name: &'static str,
}

impl PromptEngine {
    /// Creates an engine using the built-in notes prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in template fails to compile.
    pub fn builtin() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(BUILTIN_TEMPLATE, include_str!("../templates/notes.tera"))
            .map_err(|e| Error::template(BUILTIN_TEMPLATE, &e))?;

        Ok(Self {
            tera,
            template_name: BUILTIN_TEMPLATE,
        })
    }

    /// Creates an engine from an external Tera template file.
    ///
    /// The template is validated first and sees the same variables as the
    /// built-in one: `main_title`, `previous_topics`, `topic_name`,
    /// `suggestion` and `content`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file fails validation or does not compile.
    pub fn from_file(path: &Path) -> Result<Self> {
        TemplateValidator::validate_template(path)?;

        let mut tera = Tera::default();
        // Registered under a fixed name so tera never autoescapes by suffix.
        let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        tera.add_raw_template(CUSTOM_TEMPLATE, &source)
            .map_err(|e| Error::template(path.display().to_string(), &e))?;

        Ok(Self {
            tera,
            template_name: CUSTOM_TEMPLATE,
        })
    }

    /// Creates the engine for an optional template override.
    ///
    /// # Errors
    ///
    /// See [`PromptEngine::builtin`] and [`PromptEngine::from_file`].
    pub fn new(template_path: Option<&Path>) -> Result<Self> {
        match template_path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    /// Renders the prompt with every input embedded verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render(&self, input: &PromptInput<'_>) -> Result<String> {
        let context = Context::from_serialize(input)
            .map_err(|e| Error::template(self.template_name, &e))?;

        self.tera
            .render(self.template_name, &context)
            .map_err(|e| Error::template(self.template_name, &e))
    }
}
