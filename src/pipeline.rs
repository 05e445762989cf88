use crate::{
    assemble::assemble,
    backend::TextBackend,
    batch::run_batch,
    config::Config,
    error::Result,
    extract::is_notebook,
    generator::NoteGenerator,
    prompt::PromptEngine,
    writer::{NotesArchive, Writer},
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Callback receiving `(index, total, message)` while files are processed.
pub type ProgressFn<'a> = &'a mut dyn FnMut(usize, usize, &str);

/// Statistics collected during pipeline execution.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    /// Number of input files
    pub total_files: usize,

    /// Number of notebook inputs
    pub notebook_files: usize,

    /// Size of the input files on disk
    pub input_bytes: u64,

    /// Size of the generated notes, before assembly
    pub note_bytes: usize,

    /// Size of the assembled document
    pub document_bytes: usize,

    /// Topics in document order, comma-joined
    pub topics: String,

    /// Total execution time
    pub duration: Duration,

    /// Time spent generating notes
    pub generate_duration: Duration,

    /// Time spent writing
    pub write_duration: Duration,

    /// Written document, if any
    pub output_path: Option<PathBuf>,

    /// Written archive, if any
    pub archive_path: Option<PathBuf>,

    /// Number of files written
    pub files_written: usize,
}

impl PipelineStats {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              Study Notes Summary                      ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!(
            "║ Files Explained:      {:>8}                        ║",
            self.total_files
        );
        println!(
            "║   - Notebooks:        {:>8}                        ║",
            self.notebook_files
        );
        println!(
            "║ Input Size:           {:>8} bytes                  ║",
            self.input_bytes
        );
        println!(
            "║ Notes Size:           {:>8} bytes                  ║",
            self.note_bytes
        );
        println!(
            "║ Document Size:        {:>8} bytes                  ║",
            self.document_bytes
        );
        println!("║                                                       ║");
        println!(
            "║ Files Written:        {:>8}                        ║",
            self.files_written
        );
        if let Some(path) = &self.output_path {
            println!("║ Document:                                             ║");
            println!("║   {}", path.display());
        }
        if let Some(path) = &self.archive_path {
            println!("║ Archive:                                              ║");
            println!("║   {}", path.display());
        }
        println!("║                                                       ║");
        println!("║ Timing Breakdown:                                     ║");
        println!(
            "║   - Generating:       {:>8.2}s                     ║",
            self.generate_duration.as_secs_f64()
        );
        println!(
            "║   - Writing:          {:>8.2}s                     ║",
            self.write_duration.as_secs_f64()
        );
        println!(
            "║   - Total:            {:>8.2}s                     ║",
            self.duration.as_secs_f64()
        );
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

/// Orchestrates a notes run: generate per file, assemble, write.
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    generator: NoteGenerator,
    writer: Writer,
}

impl Pipeline {
    /// Creates a pipeline, building the backend from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The prompt template cannot be loaded
    /// - No API key is available for the provider
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let backend = config.backend.provider.create(&config.backend)?;
        Self::build(config, backend)
    }

    /// Creates a pipeline around an existing backend.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the template cannot be loaded.
    pub fn with_backend(config: Config, backend: Box<dyn TextBackend>) -> Result<Self> {
        config.validate()?;
        Self::build(config, backend)
    }

    fn build(config: Config, backend: Box<dyn TextBackend>) -> Result<Self> {
        let prompts = PromptEngine::new(config.template_path.as_deref())?;
        let writer = Writer::new(config.output_dir.clone(), config.backup_existing);

        Ok(Self {
            generator: NoteGenerator::new(backend, prompts),
            writer,
            config,
        })
    }

    /// Executes the complete pipeline and returns statistics.
    ///
    /// # Process
    ///
    /// 1. **Generate**: Prompts the backend once per file, in order
    /// 2. **Assemble**: Joins the notes under the document title
    /// 3. **Write**: Persists the document (and archive, when configured)
    ///
    /// In dry run mode the document is printed instead of written.
    ///
    /// # Errors
    ///
    /// The first failing file aborts the run before anything is written.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use devnotes::{Config, Pipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .title("Python Basics")
    ///     .file("loops.py")
    ///     .build()?;
    ///
    /// let stats = Pipeline::new(config)?.run()?;
    /// stats.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    pub fn run(self) -> Result<PipelineStats> {
        self.execute(None)
    }

    /// Like [`Pipeline::run`], reporting progress for each file.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run`].
    pub fn run_with_progress(self, progress: ProgressFn<'_>) -> Result<PipelineStats> {
        self.execute(Some(progress))
    }

    #[instrument(skip_all, fields(title = %self.config.title, backend = self.generator.backend_name()))]
    fn execute(self, progress: Option<ProgressFn<'_>>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let config = &self.config;

        info!("Starting notes run for {} files", config.tasks.len());

        // Stage 1: Generating
        info!("Stage 1/3: Generating notes...");
        let generate_start = Instant::now();
        let (records, topics) = run_batch(&config.tasks, &config.title, &self.generator, progress)?;
        let generate_duration = generate_start.elapsed();

        let note_bytes: usize = records.iter().map(|r| r.notes.len()).sum();
        info!(
            "✓ Generated notes for {} files in {:.2}s",
            records.len(),
            generate_duration.as_secs_f64()
        );

        // Stage 2: Assembling
        info!("Stage 2/3: Assembling document...");
        let document = assemble(&config.title, &records);
        debug!("Document is {} bytes", document.len());

        // Stage 3: Writing
        let write_start = Instant::now();
        let mut output_path = None;
        let mut archive_path = None;
        let files_written = if config.dry_run {
            warn!("Dry run mode enabled - skipping file writes");
            println!("{document}");
            0
        } else {
            info!("Stage 3/3: Writing to {}...", self.writer.output_dir().display());
            let path = self
                .writer
                .document_path(&config.title, config.output_name.as_deref());
            self.writer.write_document(&path, &document)?;
            output_path = Some(path);

            if let Some(path) = &config.archive_path {
                let archive = NotesArchive::new(config.title.clone(), topics.clone(), records.clone());
                self.writer.write_archive(path, &archive)?;
                archive_path = Some(path.clone());
            }

            usize::from(output_path.is_some()) + usize::from(archive_path.is_some())
        };
        let write_duration = write_start.elapsed();

        let stats = PipelineStats {
            total_files: records.len(),
            notebook_files: config.tasks.iter().filter(|t| is_notebook(&t.path)).count(),
            input_bytes: config.tasks.iter().map(|t| file_size(&t.path)).sum(),
            note_bytes,
            document_bytes: document.len(),
            topics,
            duration: start_time.elapsed(),
            generate_duration,
            write_duration,
            output_path,
            archive_path,
            files_written,
        };

        info!(
            "✓ Pipeline completed successfully in {:.2}s",
            stats.duration.as_secs_f64()
        );

        Ok(stats)
    }
}

fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map_or(0, |m| m.len())
}

/// Rebuilds the document from a saved archive.
///
/// Writes to `output` when given, otherwise to the title-derived file
/// name in the current directory. An existing document is backed up.
///
/// # Errors
///
/// Returns an error if the archive cannot be loaded or the write fails.
pub fn reassemble(archive_path: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let archive = NotesArchive::load(archive_path)?;
    info!(
        "Re-assembling {} records from {}",
        archive.records.len(),
        archive_path.display()
    );

    let document = assemble(&archive.title, &archive.records);

    let writer = Writer::new(".", true);
    let path = output.map_or_else(|| writer.document_path(&archive.title, None), Path::to_path_buf);

    writer.write_document(&path, &document)?;
    Ok(path)
}
