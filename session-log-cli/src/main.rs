//! Session Log Reader CLI Application
//!
//! This is the command-line interface for the session log reader.
//! It uses the session-log-decoder library and adds:
//! - Session and experiment summaries
//! - Session selection by subject, number and date
//! - Table export (TXT/JSON) with paired-event durations
//! - Analog data dumps

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use session_log_decoder::{
    load_analog_data, Experiment, ExperimentTable, Session, SessionTable, SubjectId, SubjectSelector,
    When,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::{AppConfig, OutputFormat};

/// Session Log Reader - Import and tabulate behavioural task logs
#[derive(Parser, Debug)]
#[command(name = "session-log-cli")]
#[command(about = "Import and tabulate behavioural task session logs", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Keep subject IDs as strings instead of converting them to integers
    #[arg(long, global = true)]
    string_subject_ids: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import one session file and print its summary
    Session {
        /// Session data file
        file: PathBuf,
    },

    /// Import an experiment folder and list its sessions
    Experiment {
        /// Experiment data folder
        folder: PathBuf,

        /// Only list sessions of these subjects (can be repeated)
        #[arg(long = "subject", value_name = "ID")]
        subjects: Vec<String>,

        /// Sessions to list: all, 5, 3,5,8, ...,10, 5,..., 2017-07-01,...,2017-07-07
        #[arg(long, value_name = "EXPR", default_value = "all")]
        when: String,

        /// Write the session cache into the folder
        #[arg(long)]
        save: bool,
    },

    /// Export a session file or experiment folder as a table
    Table {
        /// Session data file or experiment folder
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Output file (default: stdout, or output_dir from the config)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Paired start/end events (can be repeated)
        #[arg(long = "pair", value_name = "START=END", value_parser = config::parse_pair)]
        pairs: Vec<(String, String)>,

        /// Suffix marking end events of paired events, e.g. _out
        #[arg(long, value_name = "SUFFIX")]
        pair_end_suffix: Option<String>,
    },

    /// Print the samples of an analog data file
    Analog {
        /// Analog data file
        file: PathBuf,

        /// Maximum number of samples to print
        #[arg(long, value_name = "COUNT")]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Session Log Reader CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", session_log_decoder::VERSION);

    let mut app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    if args.string_subject_ids {
        app_config.import.integer_subject_ids = false;
    }

    match args.command {
        Command::Session { file } => session_mode(&file, &app_config),
        Command::Experiment {
            folder,
            subjects,
            when,
            save,
        } => experiment_mode(&folder, &subjects, &when, save, &app_config),
        Command::Table {
            path,
            format,
            output,
            pairs,
            pair_end_suffix,
        } => {
            app_config.pairing.paired_events.extend(pairs);
            if pair_end_suffix.is_some() {
                app_config.pairing.pair_end_suffix = pair_end_suffix;
            }
            if let Some(format) = format {
                app_config.output.format = format;
            }
            table_mode(&path, output, &app_config)
        }
        Command::Analog { file, limit } => analog_mode(&file, limit),
    }
}

/// Import one session and print its summary
fn session_mode(file: &Path, config: &AppConfig) -> Result<()> {
    let session = Session::from_file(file, &config.import)
        .with_context(|| format!("Failed to import session {:?}", file))?;

    report::print_session_summary(&session);
    Ok(())
}

/// Import an experiment folder, list selected sessions, optionally save the cache
fn experiment_mode(
    folder: &Path,
    subjects: &[String],
    when: &str,
    save: bool,
    config: &AppConfig,
) -> Result<()> {
    let experiment = Experiment::open(folder, &config.import)
        .with_context(|| format!("Failed to import experiment {:?}", folder))?;

    let selector = if subjects.is_empty() {
        SubjectSelector::All
    } else {
        let ids = subjects
            .iter()
            .map(|raw| SubjectId::from_raw(raw, config.import.integer_subject_ids))
            .collect::<session_log_decoder::Result<Vec<_>>>()?;
        SubjectSelector::Ids(ids)
    };
    let when: When = when
        .parse()
        .with_context(|| format!("Invalid --when selection {:?}", when))?;

    let selected = experiment.get_sessions(&selector, &when);
    report::print_experiment_summary(&experiment, &selected);

    if save {
        experiment.save()?;
        println!("\nSaved session cache: {:?}", experiment.cache_path());
    }
    Ok(())
}

/// Write the table for a session file or an experiment folder
fn table_mode(path: &Path, output: Option<PathBuf>, config: &AppConfig) -> Result<()> {
    let format = config.output.format;
    let output = output.or_else(|| {
        let dir = config.output.output_dir.as_ref()?;
        let stem = path.file_stem()?.to_string_lossy().into_owned();
        Some(dir.join(format!("{}.{}", stem, format.extension())))
    });

    let mut out: Box<dyn Write> = match &output {
        Some(file) => {
            log::info!("Writing table to {:?}", file);
            Box::new(BufWriter::new(
                File::create(file).with_context(|| format!("Failed to create {:?}", file))?,
            ))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    if path.is_dir() {
        let table = ExperimentTable::from_folder(path, &config.import, &config.pairing)
            .with_context(|| format!("Failed to build experiment table for {:?}", path))?;
        log::info!("Experiment table: {} rows", table.len());
        if !table.skipped_files().is_empty() {
            log::warn!("{} files left out of the table", table.skipped_files().len());
        }
        report::write_experiment_table(&table, format, &mut out)?;
    } else {
        let table = SessionTable::from_file(path, &config.pairing)
            .with_context(|| format!("Failed to build session table for {:?}", path))?;
        log::info!("Session table: {} rows", table.len());
        report::write_session_table(&table, format, &mut out)?;
    }

    out.flush()?;
    Ok(())
}

/// Print analog samples as `time<TAB>value`
fn analog_mode(file: &Path, limit: Option<usize>) -> Result<()> {
    let samples = load_analog_data(file)
        .with_context(|| format!("Failed to load analog data {:?}", file))?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(out, "time\tvalue")?;
    for sample in samples.iter().take(limit.unwrap_or(usize::MAX)) {
        writeln!(out, "{}\t{}", sample.time, sample.value)?;
    }
    out.flush()?;

    log::info!("{} samples in {:?}", samples.len(), file);
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
