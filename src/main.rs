use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use devnotes::{Config, FileTask, Pipeline, ProviderKind, collect_sources, load_manifest, reassemble};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "devnotes",
    version,
    author,
    about = "Turn source files and notebooks into Markdown study notes",
    long_about = "Turn source files and Jupyter notebooks into one Markdown study-notes \
    document.\n\n\
    Each file is explained by a hosted language model, in order, with the topics \
    already covered passed along so sections build on each other. Notebooks \
    contribute their code cells only.\n\n\
    USAGE EXAMPLES:\n  \
      # Two files with the default provider (GEMINI_API_KEY)\n  \
      devnotes generate loops.py numpy_basics.ipynb --title \"Python Basics\"\n\n  \
      # Every source file in a folder, using Claude\n  \
      devnotes generate --dir ./lessons --provider claude --out ./notes\n\n  \
      # Name the sections yourself (applied by position)\n  \
      devnotes generate a.py b.py --topic \"Variables\" --topic \"Control Flow\"\n\n  \
      # Keep an editable archive, then rebuild after editing it\n  \
      devnotes generate a.py --archive notes.json\n  \
      devnotes assemble --archive notes.json"
)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate notes for a set of files
    Generate(GenerateArgs),

    /// Rebuild the document from a saved archive
    Assemble {
        /// Archive written by `generate --archive`
        #[arg(short, long, value_name = "FILE")]
        archive: PathBuf,

        /// Output file (default: derived from the title, in the current directory)
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Files to explain, in document order
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Add every source file under a directory (respects .gitignore)
    #[arg(short, long, value_name = "PATH")]
    dir: Option<PathBuf>,

    /// Glob patterns selecting files under --dir (can be used multiple times)
    #[arg(long, value_name = "GLOB", requires = "dir")]
    include: Vec<String>,

    /// JSON manifest: an array of {"path", "topic", "suggestion"} objects
    #[arg(short, long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Topic for the file at the same position (empty keeps the derived one)
    #[arg(long, value_name = "TOPIC")]
    topic: Vec<String>,

    /// Explanation style for the file at the same position
    #[arg(long, value_name = "TEXT")]
    suggestion: Vec<String>,

    /// Document title
    #[arg(short, long, default_value = devnotes::DEFAULT_TITLE)]
    title: String,

    /// Text-generation provider
    #[arg(short, long, value_enum, default_value = "gemini")]
    provider: CliProvider,

    /// Model name (default depends on the provider)
    #[arg(long)]
    model: Option<String>,

    /// API key (falls back to the provider's own environment variable)
    #[arg(long, env = "DEVNOTES_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Provider base URL override
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Request timeout in seconds (0 waits indefinitely)
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Output directory
    #[arg(short, long, default_value = ".", value_name = "PATH")]
    out: PathBuf,

    /// Output file name (default: <title>_notes.md)
    #[arg(long, value_name = "NAME")]
    name: Option<String>,

    /// Also save the generated notes as editable JSON
    #[arg(long, value_name = "FILE")]
    archive: Option<PathBuf>,

    /// Path to custom Tera prompt template
    ///
    /// Must use {{ content }} and {{ topic_name }}; may use {{ main_title }},
    /// {{ previous_topics }} and {{ suggestion }}.
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Dry run (print the document instead of writing files)
    #[arg(long)]
    dry_run: bool,

    /// Overwrite existing files without a backup
    #[arg(long)]
    no_backup: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliProvider {
    Gemini,
    Openai,
    Claude,
}

impl From<CliProvider> for ProviderKind {
    fn from(p: CliProvider) -> Self {
        match p {
            CliProvider::Gemini => Self::Gemini,
            CliProvider::Openai => Self::OpenAi,
            CliProvider::Claude => Self::Claude,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    match cli.command {
        Command::Generate(args) => generate(args),
        Command::Assemble { archive, out } => {
            let path = reassemble(&archive, out.as_deref())
                .with_context(|| format!("Failed to assemble {}", archive.display()))?;
            println!("Notes written to {}", path.display());
            Ok(())
        }
    }
}

fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let tasks = collect_tasks(&args)?;
    let dry_run = args.dry_run;

    let mut builder = Config::builder()
        .title(args.title)
        .tasks(tasks)
        .provider(args.provider.into())
        .output_dir(args.out)
        .dry_run(args.dry_run)
        .backup_existing(!args.no_backup);

    if let Some(model) = args.model {
        builder = builder.model(model);
    }

    if let Some(key) = args.api_key {
        builder = builder.api_key(key);
    }

    if let Some(endpoint) = args.endpoint {
        builder = builder.endpoint(endpoint);
    }

    if args.timeout > 0 {
        builder = builder.timeout(Duration::from_secs(args.timeout));
    }

    if let Some(name) = args.name {
        builder = builder.output_name(name);
    }

    if let Some(archive) = args.archive {
        builder = builder.archive_path(archive);
    }

    if let Some(template_path) = args.template {
        builder = builder.template_path(template_path);
    }

    let config = builder.build().context("Failed to build configuration")?;

    let mut report = |index: usize, total: usize, message: &str| {
        if index < total {
            eprintln!("[{}/{}] {}", index + 1, total, message);
        }
    };

    let stats = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run_with_progress(&mut report)
        .context("Notes generation failed")?;

    if !dry_run {
        stats.print_summary();
    }

    Ok(())
}

/// Gathers tasks from positional files, `--dir` and `--manifest`, in that
/// order, then applies `--topic`/`--suggestion` by position.
fn collect_tasks(args: &GenerateArgs) -> anyhow::Result<Vec<FileTask>> {
    let mut tasks: Vec<FileTask> = args.files.iter().cloned().map(FileTask::new).collect();

    if let Some(dir) = &args.dir {
        let files = collect_sources(dir, &args.include)
            .with_context(|| format!("Failed to scan {}", dir.display()))?;
        tasks.extend(files.into_iter().map(FileTask::new));
    }

    if let Some(manifest) = &args.manifest {
        let loaded = load_manifest(manifest)
            .with_context(|| format!("Failed to load manifest {}", manifest.display()))?;
        tasks.extend(loaded);
    }

    if args.topic.len() > tasks.len() || args.suggestion.len() > tasks.len() {
        tracing::warn!("More --topic/--suggestion values than files; extras are ignored");
    }

    for (task, topic) in tasks.iter_mut().zip(&args.topic) {
        if !topic.trim().is_empty() {
            task.topic = Some(topic.clone());
        }
    }

    for (task, suggestion) in tasks.iter_mut().zip(&args.suggestion) {
        task.suggestion = suggestion.clone();
    }

    Ok(tasks)
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("devnotes=info"),
        1 => EnvFilter::new("devnotes=debug"),
        _ => EnvFilter::new("devnotes=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    Ok(())
}
