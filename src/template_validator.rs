use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tera::Tera;

/// Maximum template file size (256KB)
const MAX_TEMPLATE_SIZE: u64 = 256 * 1024;

/// Variables a prompt template cannot do without
const REQUIRED_VARIABLES: &[&str] = &["content", "topic_name"];

/// Variables most prompts want, but can skip
const OPTIONAL_VARIABLES: &[&str] = &["main_title", "previous_topics", "suggestion"];

/// Validates external prompt templates
pub(crate) struct TemplateValidator;

impl TemplateValidator {
    /// Validates an external prompt template file
    ///
    /// Performs the following checks:
    /// 1. File exists and is a regular file
    /// 2. File size is within limits
    /// 3. Template syntax is valid (can be compiled by Tera)
    /// 4. Template references the file content and topic
    ///
    /// # Errors
    ///
    /// Returns an error if any check fails.
    pub(crate) fn validate_template(path: &Path) -> Result<()> {
        let display = path.to_string_lossy().to_string();

        if !path.exists() {
            return Err(Error::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "Template file not found"),
            ));
        }

        if !path.is_file() {
            return Err(Error::template_validation(display, "Path is not a file"));
        }

        let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;
        if metadata.len() > MAX_TEMPLATE_SIZE {
            return Err(Error::template_validation(
                display,
                format!(
                    "Template file too large: {} bytes (max: {} bytes)",
                    metadata.len(),
                    MAX_TEMPLATE_SIZE
                ),
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        if content.trim().is_empty() {
            return Err(Error::template_validation(display, "Template file is empty"));
        }

        let mut temp_tera = Tera::default();
        temp_tera
            .add_raw_template("validation", &content)
            .map_err(|e| {
                Error::template_validation(display.clone(), format!("Template syntax error: {e}"))
            })?;

        Self::check_required_variables(&content, &display)?;
        Self::check_optional_variables(&content);

        Ok(())
    }

    /// Heuristic: looks for `{{ var`, `{{var` or `var }}` in the source.
    fn check_required_variables(content: &str, display: &str) -> Result<()> {
        let missing: Vec<&str> = REQUIRED_VARIABLES
            .iter()
            .filter(|var| !mentions(content, var))
            .copied()
            .collect();

        if !missing.is_empty() {
            return Err(Error::template_validation(
                display,
                format!(
                    "Template is missing required variables: {}. \n\
                    Prompt templates must use content and topic_name.",
                    missing.join(", ")
                ),
            ));
        }

        Ok(())
    }

    fn check_optional_variables(content: &str) {
        for var in OPTIONAL_VARIABLES {
            if !mentions(content, var) {
                tracing::debug!("Prompt template does not use optional variable: {}", var);
            }
        }
    }
}

fn mentions(content: &str, var: &str) -> bool {
    let patterns = [
        format!("{{{{ {var}"),
        format!("{{{{{var}"),
        format!("{var} }}}}"),
        format!("{var}|"),
    ];

    patterns.iter().any(|pattern| content.contains(pattern.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_validate_valid_template() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template_file = temp.child("prompt.tera");
        template_file
            .write_str("Explain {{ topic_name }} ({{ suggestion }}):\n{{ content }}")
            .unwrap();

        assert!(TemplateValidator::validate_template(template_file.path()).is_ok());
    }

    #[test]
    fn test_validate_with_filter() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template_file = temp.child("prompt.tera");
        template_file
            .write_str("{{topic_name|upper}}\n{{ content|trim }}")
            .unwrap();

        assert!(TemplateValidator::validate_template(template_file.path()).is_ok());
    }

    #[test]
    fn test_validate_nonexistent_file() {
        let result = TemplateValidator::validate_template(Path::new("/nonexistent/prompt.tera"));
        assert!(result.unwrap_err().is_io());
    }

    #[test]
    fn test_validate_empty_template() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template_file = temp.child("empty.tera");
        template_file.write_str("   \n  \n  ").unwrap();

        let result = TemplateValidator::validate_template(template_file.path());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_validate_syntax_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template_file = temp.child("invalid.tera");
        template_file
            .write_str("{% if topic_name %}\n{{ content }}")
            .unwrap();

        let result = TemplateValidator::validate_template(template_file.path());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Template syntax error"));
    }

    #[test]
    fn test_validate_missing_required_vars() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template_file = temp.child("incomplete.tera");
        template_file.write_str("Write about {{ topic_name }}").unwrap();

        let err_msg = TemplateValidator::validate_template(template_file.path())
            .unwrap_err()
            .to_string();
        assert!(err_msg.contains("missing required variables"));
        assert!(err_msg.contains("content"));
    }

    #[test]
    fn test_validate_file_too_large() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template_file = temp.child("large.tera");

        let large_content = "x".repeat((MAX_TEMPLATE_SIZE + 1) as usize);
        template_file.write_str(&large_content).unwrap();

        let result = TemplateValidator::validate_template(template_file.path());
        assert!(result.unwrap_err().to_string().contains("too large"));
    }
}
