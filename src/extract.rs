use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

/// Literal suffix identifying a notebook file (case-sensitive).
pub const NOTEBOOK_SUFFIX: &str = ".ipynb";

static SOURCE_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "py", "js", "ipynb", "java", "cpp", "c", "txt", "h", "hpp", "cc", "rs", "go", "ts", "jsx",
        "tsx", "rb", "php", "cs", "kt", "swift", "scala", "sh", "sql", "html", "css", "md",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Deserialize)]
struct Notebook {
    #[serde(default)]
    cells: Vec<Cell>,
}

#[derive(Debug, Deserialize)]
struct Cell {
    #[serde(default)]
    cell_type: String,
    #[serde(default)]
    source: CellSource,
}

/// nbformat allows the cell source as one string or as a list of lines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CellSource {
    Text(String),
    Lines(Vec<String>),
}

impl Default for CellSource {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl CellSource {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Lines(lines) => lines.concat(),
        }
    }
}

/// Returns the text content of a source file.
///
/// Files whose name ends in `.ipynb` are parsed as Jupyter notebooks and only
/// their code cells are kept, joined with a newline. Everything else is read
/// as UTF-8 text, whatever it actually contains.
///
/// # Errors
///
/// Returns [`Error::Read`] if the file is missing, unreadable or not UTF-8,
/// and [`Error::Parse`] if a notebook is not valid JSON.
pub fn extract(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| Error::read(path, &e))?;

    if is_notebook(path) {
        let code = notebook_code(&text).map_err(|e| Error::parse(path, e.to_string()))?;
        debug!(
            "Extracted {} bytes of code from notebook {}",
            code.len(),
            path.display()
        );
        Ok(code)
    } else {
        trace!("Read {} bytes from {}", text.len(), path.display());
        Ok(text)
    }
}

/// Concatenates the code cells of a notebook document.
fn notebook_code(raw: &str) -> serde_json::Result<String> {
    let notebook: Notebook = serde_json::from_str(raw)?;

    let cells: Vec<String> = notebook
        .cells
        .into_iter()
        .filter(|cell| cell.cell_type == "code")
        .map(|cell| cell.source.into_text())
        .collect();

    Ok(cells.join("\n"))
}

/// Checks the literal `.ipynb` suffix.
#[must_use]
pub fn is_notebook(path: &Path) -> bool {
    path.to_str()
        .is_some_and(|p| p.ends_with(NOTEBOOK_SUFFIX))
}

/// Checks if a file extension is one of the known source types.
#[must_use]
pub(crate) fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    const NOTEBOOK: &str = r##"{
        "cells": [
            {"cell_type": "markdown", "source": ["# Loops\n", "Narrative text"]},
            {"cell_type": "code", "source": ["for i in range(3):\n", "    print(i)"],
             "outputs": [{"output_type": "stream", "text": ["0\n1\n2\n"]}]},
            {"cell_type": "code", "source": "total = sum(range(3))"}
        ],
        "metadata": {},
        "nbformat": 4
    }"##;

    #[test]
    fn test_extract_plain_text() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("loops.py");
        file.write_str("for i in range(3):\n    print(i)\n").unwrap();

        let content = extract(file.path()).unwrap();
        assert_eq!(content, "for i in range(3):\n    print(i)\n");
    }

    #[test]
    fn test_extract_notebook_keeps_only_code_cells() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("loops.ipynb");
        file.write_str(NOTEBOOK).unwrap();

        let content = extract(file.path()).unwrap();
        assert_eq!(
            content,
            "for i in range(3):\n    print(i)\ntotal = sum(range(3))"
        );
        assert!(!content.contains("Narrative"));
        assert!(!content.contains("0\n1\n2"));
    }

    #[test]
    fn test_extract_notebook_without_cells() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("empty.ipynb");
        file.write_str(r#"{"metadata": {}}"#).unwrap();

        assert_eq!(extract(file.path()).unwrap(), "");
    }

    #[test]
    fn test_extract_invalid_notebook() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("broken.ipynb");
        file.write_str("{ not json").unwrap();

        let err = extract(file.path()).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_suffix_is_case_sensitive() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("upper.IPYNB");
        file.write_str("{ not json").unwrap();

        // Not a notebook, so it comes back verbatim.
        assert_eq!(extract(file.path()).unwrap(), "{ not json");
    }

    #[test]
    fn test_extract_missing_file() {
        let err = extract("/nonexistent/path/loops.py").unwrap_err();
        assert!(err.is_read());
    }

    #[test]
    fn test_extract_non_utf8() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("latin1.txt");
        file.write_binary(&[0x66, 0x6f, 0xff, 0xfe]).unwrap();

        assert!(extract(file.path()).unwrap_err().is_read());
    }

    #[test]
    fn test_has_source_extension() {
        assert!(has_source_extension(Path::new("loops.py")));
        assert!(has_source_extension(Path::new("nb.ipynb")));
        assert!(has_source_extension(Path::new("Main.java")));
        assert!(!has_source_extension(Path::new("image.png")));
        assert!(!has_source_extension(Path::new("Makefile")));
    }
}
