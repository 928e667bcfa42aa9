//! seqanalyser - Terminal front end for sequence analysis.
//!
//! ## Usage
//!
//! ```bash
//! seqanalyser --backend fq-backend
//! seqanalyser --backend python3 --backend-arg analyse.py --format fasta
//! ```
//!
//! The backend program is called once per submission with the command name
//! (`analyse_fastq_sequences`, `analyse_fasta_sequences`, `analyse_fastq_file`
//! or `analyse_fasta_file`) as its last argument, reads the parameter as JSON
//! on stdin and prints the results as a JSON array.

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, Level};

use seqanalyser::backend::{Dispatcher, ProcessBackend};
use seqanalyser::controller::run_app;
use seqanalyser::dispatch::ExtensionPolicy;
use seqanalyser::model::{AppState, SequenceFormat, Settings};
use seqanalyser::ui::glyphs;

/// Sequence format specification for command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// FASTQ records (with quality scores)
    Fastq,
    /// FASTA records
    Fasta,
}

impl From<FormatArg> for SequenceFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Fastq => SequenceFormat::Fastq,
            FormatArg::Fasta => SequenceFormat::Fasta,
        }
    }
}

/// seqanalyser - Paste or pick FASTQ/FASTA input and browse per-record analysis results
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Analysis backend program
    #[arg(short = 'b', long = "backend", default_value = "seqanalyser-backend")]
    backend: PathBuf,

    /// Extra argument passed to the backend before the command name (repeatable)
    #[arg(long = "backend-arg", allow_hyphen_values = true)]
    backend_args: Vec<String>,

    /// Initially selected sequence format
    #[arg(short = 'f', long = "format", value_enum, default_value = "fastq")]
    format: FormatArg,

    /// Reject files whose extension belongs to the other format instead of
    /// leaving the decision to the backend
    #[arg(long = "strict-extensions")]
    strict_extensions: bool,

    /// Directory the file browser starts in (default: current directory)
    #[arg(long = "start-dir")]
    start_dir: Option<PathBuf>,

    /// Directory exported results are written to (default: current directory)
    #[arg(long = "export-dir")]
    export_dir: Option<PathBuf>,

    /// Log file (default: a new file in the temporary directory)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Log debug details
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Use plain ASCII glyphs
    #[arg(long = "ascii")]
    ascii: bool,
}

/// Sends logs to a file; the terminal belongs to the UI.
fn init_logging(log_file: Option<PathBuf>, verbose: bool) -> Result<PathBuf> {
    let path = log_file.unwrap_or_else(|| {
        std::env::temp_dir().join(format!("seqanalyser-{:08x}.log", rand::random::<u32>()))
    });
    let file = File::create(&path)
        .with_context(|| format!("Cannot create log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .init();

    Ok(path)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let cwd = std::env::current_dir().context("Cannot determine current directory")?;
    let start_dir = args.start_dir.unwrap_or_else(|| cwd.clone());
    if !start_dir.is_dir() {
        anyhow::bail!("Start directory {} does not exist", start_dir.display());
    }
    let export_dir = args.export_dir.unwrap_or(cwd);
    if !export_dir.is_dir() {
        anyhow::bail!("Export directory {} does not exist", export_dir.display());
    }

    let log_path = init_logging(args.log_file, args.verbose)?;

    let policy = if args.strict_extensions {
        ExtensionPolicy::Reject
    } else {
        ExtensionPolicy::Defer
    };
    info!(
        backend = %args.backend.display(),
        ?policy,
        "starting"
    );

    let backend = ProcessBackend::new(args.backend).with_args(args.backend_args);
    let dispatcher = Dispatcher::new(Arc::new(backend));
    let state = AppState::new(Settings {
        format: args.format.into(),
        policy,
        start_dir,
        export_dir,
        glyphs: glyphs::select(!args.ascii),
    });

    run_app(state, dispatcher)?;

    eprintln!("Log written to {}", log_path.display());
    Ok(())
}
