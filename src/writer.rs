use crate::{
    batch::NoteRecord,
    error::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::SystemTime,
};
use tracing::{debug, info};

/// Suffix appended to the derived output file name.
pub const NOTES_FILE_SUFFIX: &str = "_notes.md";

/// Derives the output file name from the document title.
///
/// ```
/// assert_eq!(devnotes::notes_file_name("Complete Python Notes"), "complete_python_notes_notes.md");
/// ```
#[must_use]
pub fn notes_file_name(title: &str) -> String {
    format!("{}{}", title.replace(' ', "_").to_lowercase(), NOTES_FILE_SUFFIX)
}

/// A saved run: the records plus what is needed to assemble them again.
///
/// The `notes` of each record can be edited by hand before re-assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesArchive {
    /// Document title
    pub title: String,

    /// Comma-joined topics, in processing order
    pub previous_topics: String,

    /// Generation timestamp
    pub generated_at: String,

    /// One record per input file
    pub records: Vec<NoteRecord>,
}

impl NotesArchive {
    /// Creates an archive stamped with the current local time.
    #[must_use]
    pub fn new(title: impl Into<String>, previous_topics: impl Into<String>, records: Vec<NoteRecord>) -> Self {
        Self {
            title: title.into(),
            previous_topics: previous_topics.into(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            records,
        }
    }

    /// Loads an archive saved by a previous run.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| Error::read(path, &e))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Writes the assembled document and archives with atomic operations.
#[derive(Debug, Clone)]
pub(crate) struct Writer {
    output_dir: PathBuf,
    backup_existing: bool,
}

impl Writer {
    pub(crate) fn new(output_dir: impl Into<PathBuf>, backup_existing: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            backup_existing,
        }
    }

    /// Output path for a document, from an explicit name or the title.
    pub(crate) fn document_path(&self, title: &str, output_name: Option<&str>) -> PathBuf {
        let name = output_name.map_or_else(|| notes_file_name(title), str::to_string);
        self.output_dir.join(name)
    }

    /// Writes the assembled document.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory cannot be created or the
    /// write fails.
    pub(crate) fn write_document(&self, path: &Path, document: &str) -> Result<()> {
        self.ensure_parent(path)?;
        self.write_file_atomic(path, document)?;

        info!("Wrote {} bytes of notes to {}", document.len(), path.display());
        Ok(())
    }

    /// Writes the archive as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub(crate) fn write_archive(&self, path: &Path, archive: &NotesArchive) -> Result<()> {
        let json = serde_json::to_string_pretty(archive)?;
        self.ensure_parent(path)?;
        self.write_file_atomic(path, &json)?;

        info!(
            "Saved {} note records to {}",
            archive.records.len(),
            path.display()
        );
        Ok(())
    }

    fn ensure_parent(&self, path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))
            }
            _ => Ok(()),
        }
    }

    /// Writes a file atomically with optional backup.
    ///
    /// # Process
    ///
    /// 1. Creates backup if file exists and backup is enabled
    /// 2. Writes content to temporary file
    /// 3. Syncs temporary file to disk
    /// 4. Atomically renames temporary file to target path
    fn write_file_atomic(&self, path: &Path, content: &str) -> Result<()> {
        if path.exists() && self.backup_existing {
            self.backup_file(path)?;
        }

        let temp_path = path.with_extension("tmp");
        let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| Error::io(&temp_path, e))?;

        temp_file
            .sync_all()
            .map_err(|e| Error::io(&temp_path, e))?;

        drop(temp_file);

        fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

        Ok(())
    }

    /// Creates a timestamped backup of an existing file.
    fn backup_file(&self, path: &Path) -> Result<()> {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)?
            .as_nanos();

        let filename = path
            .file_name()
            .ok_or_else(|| Error::config("Invalid file path"))?
            .to_string_lossy();

        let backup_name = format!("{filename}.backup.{timestamp}");
        let backup_path = path
            .parent()
            .ok_or_else(|| Error::config("Invalid file path"))?
            .join(backup_name);

        fs::copy(path, &backup_path).map_err(|e| Error::io(&backup_path, e))?;

        debug!("Created backup: {}", backup_path.display());
        Ok(())
    }

    pub(crate) fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn records() -> Vec<NoteRecord> {
        vec![NoteRecord {
            file_path: PathBuf::from("loops.py"),
            topic_name: "Loops".to_string(),
            notes: "Loops repeat work.".to_string(),
        }]
    }

    #[test]
    fn test_notes_file_name() {
        assert_eq!(notes_file_name("My Study Notes"), "my_study_notes_notes.md");
        assert_eq!(notes_file_name("NumPy"), "numpy_notes.md");
    }

    #[test]
    fn test_document_path() {
        let writer = Writer::new("/out", true);
        assert_eq!(
            writer.document_path("Python Basics", None),
            PathBuf::from("/out/python_basics_notes.md")
        );
        assert_eq!(
            writer.document_path("Python Basics", Some("final.md")),
            PathBuf::from("/out/final.md")
        );
    }

    #[test]
    fn test_write_document_creates_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        let output_dir = temp.child("nested").child("out");
        let writer = Writer::new(output_dir.path(), true);

        let path = writer.document_path("Python", None);
        writer.write_document(&path, "# Python\n\n").unwrap();

        output_dir.child("python_notes.md").assert("# Python\n\n");
        assert!(!output_dir.child("python_notes.tmp").exists());
    }

    #[test]
    fn test_write_document_creates_backup() {
        let temp = assert_fs::TempDir::new().unwrap();
        let existing = temp.child("python_notes.md");
        existing.write_str("old notes").unwrap();

        let writer = Writer::new(temp.path(), true);
        writer.write_document(existing.path(), "new notes").unwrap();

        existing.assert("new notes");
        let backups: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| name.contains(".backup."))
            .collect();
        assert_eq!(backups.len(), 1);
        assert!(backups[0].starts_with("python_notes.md.backup."));
    }

    #[test]
    fn test_write_document_without_backup() {
        let temp = assert_fs::TempDir::new().unwrap();
        let existing = temp.child("python_notes.md");
        existing.write_str("old notes").unwrap();

        let writer = Writer::new(temp.path(), false);
        writer.write_document(existing.path(), "new notes").unwrap();

        existing.assert("new notes");
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_archive_round_trip() {
        let temp = assert_fs::TempDir::new().unwrap();
        let path = temp.child("notes.json");
        let writer = Writer::new(temp.path(), false);

        let archive = NotesArchive::new("Python", "Loops", records());
        writer.write_archive(path.path(), &archive).unwrap();

        let loaded = NotesArchive::load(path.path()).unwrap();
        assert_eq!(loaded, archive);
    }

    #[test]
    fn test_archive_load_errors() {
        let temp = assert_fs::TempDir::new().unwrap();
        let path = temp.child("notes.json");
        path.write_str("[]").unwrap();

        assert!(NotesArchive::load(path.path()).is_err());
        assert!(NotesArchive::load(&temp.path().join("missing.json")).unwrap_err().is_read());
    }
}
