use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the devnotes library.
///
/// None of these are recovered inside the library: the first error aborts
/// the run and is handed back to the caller as-is.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Input file is missing, unreadable, or not valid UTF-8.
    #[error("Failed to read '{path}': {message}")]
    Read {
        /// Path that could not be read
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Notebook file is not valid structured data.
    #[error("Failed to parse notebook '{path}': {message}")]
    Parse {
        /// Path to the malformed notebook
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// The text-generation backend failed.
    #[error("{provider} backend error: {message}")]
    Backend {
        /// Provider that produced the failure
        provider: String,
        /// Error message, verbatim from the provider where possible
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// IO error on the output side, with the path involved.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Prompt template rendering error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// A custom prompt template was rejected.
    #[error("Invalid template '{path}': {message}")]
    TemplateValidation {
        /// Template path
        path: String,
        /// Reason it was rejected
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },

    /// No source files found while collecting a directory.
    #[error("No source files found in '{path}'. Check .gitignore rules or include patterns.")]
    NoFiles {
        /// Directory that was scanned
        path: PathBuf,
    },

    /// System time error.
    #[error("System time error: {message}")]
    SystemTime {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates a read error with path context.
    #[must_use]
    pub fn read(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a notebook parse error.
    #[must_use]
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a backend error for the named provider.
    #[must_use]
    pub fn backend(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates an output-side IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: &tera::Error) -> Self {
        // tera nests the useful part of the message in the source chain
        let mut message = source.to_string();
        let mut cause = std::error::Error::source(source);
        while let Some(inner) = cause {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            cause = inner.source();
        }

        Self::Template {
            template: template.into(),
            message,
        }
    }

    /// Creates a template validation error.
    #[must_use]
    pub fn template_validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TemplateValidation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a no files error.
    #[must_use]
    pub fn no_files(path: impl Into<PathBuf>) -> Self {
        Self::NoFiles { path: path.into() }
    }

    /// Returns true if this is a read error.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::Read { .. })
    }

    /// Returns true if this is a notebook parse error.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Returns true if this is a backend error.
    #[must_use]
    pub const fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

impl From<std::time::SystemTimeError> for Error {
    fn from(e: std::time::SystemTimeError) -> Self {
        Self::SystemTime {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = Error::config("title is required");
        assert!(err.is_config());
        assert!(err.to_string().contains("title is required"));
    }

    #[test]
    fn test_read_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::read("/tmp/loops.py", &io_err);
        assert!(err.is_read());
        assert!(err.to_string().contains("/tmp/loops.py"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_backend_error_keeps_message() {
        let err = Error::backend("claude", "HTTP 401 Unauthorized: invalid x-api-key");
        assert!(err.is_backend());
        assert_eq!(
            err.to_string(),
            "claude backend error: HTTP 401 Unauthorized: invalid x-api-key"
        );
    }

    #[test]
    fn test_error_clone() {
        let err = Error::parse("nb.ipynb", "expected value");
        let cloned = err.clone();
        assert!(cloned.is_parse());
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_serialization_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_template_error_includes_cause() {
        let mut tera = tera::Tera::default();
        let source = tera.add_raw_template("broken", "{% if %}").unwrap_err();
        let err = Error::template("broken", &source);
        assert!(err.to_string().contains("broken"));
    }
}
