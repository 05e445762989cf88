//! # devnotes
//!
//! Turns source files and Jupyter notebooks into one Markdown study-notes
//! document, with a hosted language model writing the explanations.
//!
//! ## Features
//!
//! - Notebook-aware extraction (code cells only)
//! - Topic names derived from file names, with per-file overrides
//! - Running context so later sections don't repeat earlier topics
//! - Gemini, OpenAI and Claude backends behind one trait
//! - Atomic file operations with automatic backups
//! - Editable JSON archive that can be re-assembled later
//!
//! ## Quick Start
//!
//! ```no_run
//! use devnotes::{Config, Pipeline, ProviderKind};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .title("Python Basics")
//!     .file("loops.py")
//!     .file("numpy_basics.ipynb")
//!     .provider(ProviderKind::Gemini)
//!     .output_dir("./notes")
//!     .build()?;
//!
//! Pipeline::new(config)?.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library follows a pipeline architecture:
//! 1. **Extractor**: Reads a file, keeping only code cells of notebooks
//! 2. **Topic namer**: Picks the section heading for each file
//! 3. **Generator**: Renders the prompt and calls the backend
//! 4. **Batch**: Runs the files in order, carrying the covered topics
//! 5. **Assembler**: Joins the notes, dropping echoed headings
//! 6. **Writer**: Persists the document and archive

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod assemble;
mod backend;
mod batch;
mod config;
mod error;
mod extract;
mod generator;
mod pipeline;
mod prompt;
mod scanner;
mod template_validator;
mod topic;
mod writer;

pub mod api;

pub use assemble::{assemble, strip_duplicate_titles};
pub use backend::{BackendConfig, ProviderKind, TextBackend};
pub use batch::{
    DEFAULT_SUGGESTION, FileTask, NoteRecord, PROGRESS_COMPLETE, load_manifest, run_batch,
};
pub use config::{Config, ConfigBuilder, DEFAULT_TITLE};
pub use error::{Error, Result};
pub use extract::{NOTEBOOK_SUFFIX, extract, is_notebook};
pub use generator::NoteGenerator;
pub use pipeline::{Pipeline, PipelineStats, ProgressFn, reassemble};
pub use prompt::{PromptEngine, PromptInput};
pub use scanner::collect_sources;
pub use topic::{derive_topic, resolve_topic};
pub use writer::{NOTES_FILE_SUFFIX, NotesArchive, notes_file_name};

/// Runs the complete notes pipeline with the given configuration.
///
/// This is the main entry point for the library.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - No API key is available for the provider
/// - Any input file cannot be read or parsed
/// - The backend fails for any file
/// - The document cannot be written
///
/// # Examples
///
/// ```no_run
/// use devnotes::{Config, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder()
///     .title("Python Basics")
///     .file("loops.py")
///     .build()?;
///
/// run(config)?.print_summary();
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config) -> Result<PipelineStats> {
    Pipeline::new(config)?.run()
}
