use crate::{
    error::{Error, Result},
    extract::extract,
    generator::NoteGenerator,
    topic::resolve_topic,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Suggestion used when a task does not carry one.
pub const DEFAULT_SUGGESTION: &str = "Explain clearly and simply";

/// Progress message sent after the last file.
pub const PROGRESS_COMPLETE: &str = "complete";

/// One input file with its optional overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTask {
    /// File to explain
    pub path: PathBuf,

    /// Section topic; derived from the file name when missing or blank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Free-text guidance on how the file should be explained
    #[serde(default = "default_suggestion")]
    pub suggestion: String,
}

fn default_suggestion() -> String {
    DEFAULT_SUGGESTION.to_string()
}

impl FileTask {
    /// Creates a task with no topic override and the default suggestion.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            topic: None,
            suggestion: default_suggestion(),
        }
    }

    /// Sets the topic override.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Sets the style suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }
}

/// Reads tasks from a JSON manifest (an array of tasks).
///
/// Relative paths are resolved against the manifest's directory.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or is not valid JSON.
pub fn load_manifest(path: &Path) -> Result<Vec<FileTask>> {
    let raw = fs::read_to_string(path).map_err(|e| Error::read(path, &e))?;
    let mut tasks: Vec<FileTask> = serde_json::from_str(&raw)
        .map_err(|e| Error::config(format!("Invalid manifest '{}': {e}", path.display())))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for task in &mut tasks {
        if task.path.is_relative() {
            task.path = base.join(&task.path);
        }
    }

    Ok(tasks)
}

/// Generated notes for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    /// Input path, as given
    pub file_path: PathBuf,

    /// Topic the notes were generated under
    pub topic_name: String,

    /// Markdown produced by the backend
    pub notes: String,
}

/// Generates notes for every task, in order.
///
/// Each prompt carries the topics of all earlier files so the backend can
/// avoid repeating them. Returns the records (one per task, same order) and
/// the final comma-joined topic list.
///
/// `progress` receives `(index, total, message)` before each file and
/// `(total, total, "complete")` at the end.
///
/// # Errors
///
/// The first extraction or generation failure aborts the run; no partial
/// list is returned.
pub fn run_batch(
    tasks: &[FileTask],
    main_title: &str,
    generator: &NoteGenerator,
    mut progress: Option<&mut dyn FnMut(usize, usize, &str)>,
) -> Result<(Vec<NoteRecord>, String)> {
    let total = tasks.len();
    let mut records = Vec::with_capacity(total);
    let mut previous_topics = String::new();

    for (index, task) in tasks.iter().enumerate() {
        if let Some(report) = progress.as_deref_mut() {
            report(index, total, &format!("processing {}", task.path.display()));
        }
        info!("Processing file {}/{}: {}", index + 1, total, task.path.display());

        let content = extract(&task.path)?;
        let topic_name = resolve_topic(task);
        info!("Topic: {}", topic_name);

        let notes = generator.generate(
            main_title,
            &previous_topics,
            &topic_name,
            &task.suggestion,
            &content,
        )?;

        if !previous_topics.is_empty() {
            previous_topics.push_str(", ");
        }
        previous_topics.push_str(&topic_name);

        records.push(NoteRecord {
            file_path: task.path.clone(),
            topic_name,
            notes,
        });
    }

    if let Some(report) = progress.as_deref_mut() {
        report(total, total, PROGRESS_COMPLETE);
    }

    Ok((records, previous_topics))
}
