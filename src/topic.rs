use crate::batch::FileTask;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static NUMPY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)numpy").expect("valid regex"));

/// Derives a readable topic label from a file name.
///
/// Drops the directory and final extension, turns `_` and `-` into spaces
/// and uppercases the first letter of every word. Interior casing is left
/// alone. Any spelling of `numpy` becomes `NumPy`.
///
/// ```
/// use devnotes::derive_topic;
///
/// assert_eq!(derive_topic("numpy_basics.py"), "NumPy Basics");
/// assert_eq!(derive_topic("react-props-state.js"), "React Props State");
/// ```
#[must_use]
pub fn derive_topic(filename: impl AsRef<Path>) -> String {
    let stem = filename
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    let spaced = stem.replace(['_', '-'], " ");
    let topic = spaced
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");

    NUMPY.replace_all(&topic, "NumPy").into_owned()
}

/// Resolves the topic used for a task: the trimmed override when non-empty,
/// otherwise the name derived from the file.
#[must_use]
pub fn resolve_topic(task: &FileTask) -> String {
    match task.topic.as_deref().map(str::trim) {
        Some(topic) if !topic.is_empty() => topic.to_string(),
        _ => derive_topic(&task.path),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
