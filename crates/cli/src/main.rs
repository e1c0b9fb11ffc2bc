use anyhow::{Context, Result};
use clap::Parser;
use media_renamer_core::{
    load_config, run_rename, validate_template, Aborted, DecisionCache, LinePrompt, RenameEvent,
    RenameOptions, RenameSummary,
};
use std::path::{self, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

const FORMAT_HELP: &str = "\
Format string for the file name is defined by a mix of custom text and following tags enclosed in {}:
  YYYY        Year
  MM          Month
  DD          Day
  hh          Hours
  mm          Minutes
  ss          Seconds
  Seq         Sequence number
  Artist      Artist
  Make        Camera Make
  Model       Camera Model
  Height      Height of image in pixels
  Folder      Parent folder of the image file

The original file extension is always appended.

Examples:
  Format String:          {YYYY}-{MM}-{DD}-{Folder}-{Seq}
  File Name:              2014-05-09-Wedding_Shoot-001.jpg
                          2014-05-09-Wedding_Shoot-002.jpg

  Format String:          {YYYY}{DD}{MM}_{Model}_Beach_Shoot_{Seq}
  File Name:              20140905_PENTAX K-x_Beach_Shoot_001.jpg
                          20140905_PENTAX K-x_Beach_Shoot_002.jpg";

#[derive(Debug, Parser)]
#[command(name = "media-renamer", version)]
#[command(about = "Rename photos and videos in bulk using information stored in EXIF")]
#[command(after_long_help = FORMAT_HELP)]
struct Cli {
    /// Format of the new file name [default: {YYYY}-{MM}-{DD}_{hh}-{mm}-{ss}_{Height}]
    #[arg(short = 'f', value_name = "FORMAT")]
    format: Option<String>,

    /// Starting sequence number [default: 1]
    #[arg(short = 's', value_name = "N")]
    sequence: Option<u64>,

    /// Recursive mode
    #[arg(short = 'r')]
    recursive: bool,

    /// Include hidden files and directories
    #[arg(short = 'i')]
    include_hidden: bool,

    /// Test mode, don't apply changes
    #[arg(short = 't')]
    test: bool,

    /// Print full paths and extra details
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print warnings and the summary
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Absolute path to file or directory
    #[arg(required = true, num_args = 1..)]
    input: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match cmd_rename(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.downcast_ref::<Aborted>().is_some() => {
            eprintln!("Aborted.");
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(cli: &Cli) {
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_rename(cli: &Cli) -> Result<()> {
    let config = load_config()?;
    let template = cli.format.clone().unwrap_or(config.template);
    validate_template(&template).context("Invalid format string")?;
    debug!("Actual format string: {template}");

    let inputs = cli
        .input
        .iter()
        .map(|input| {
            path::absolute(input)
                .with_context(|| format!("Failed to resolve input path: {}", input.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let options = RenameOptions {
        inputs,
        template,
        sequence_start: cli.sequence.unwrap_or(config.sequence_start),
        recursive: cli.recursive || config.recursive,
        include_hidden: cli.include_hidden || config.include_hidden,
        dry_run: cli.test,
    };

    let mut decisions = DecisionCache::new();
    let mut prompt = LinePrompt::stdio();
    let summary = run_rename(&options, &mut decisions, &mut prompt, |event| {
        print_event(cli, &event);
    })?;

    print_summary(cli, &summary);
    Ok(())
}

fn print_event(cli: &Cli, event: &RenameEvent<'_>) {
    match event {
        RenameEvent::FolderStarted(dir) => {
            if !cli.quiet {
                println!("Processing folder: {}", dir.display());
            }
        }
        RenameEvent::Renamed { from, to } => {
            if cli.verbose {
                println!("{} --> {}", from.display(), to.display());
            } else if !cli.quiet {
                println!("{} --> {}", file_name(from), file_name(to));
            }
        }
        RenameEvent::FolderFinished(_) => {
            if !cli.quiet {
                println!();
            }
        }
    }
}

fn print_summary(cli: &Cli, summary: &RenameSummary) {
    println!("Processed {} files.", summary.processed);
    if cli.test {
        println!("Test mode: no files were renamed.");
    }
    if cli.verbose {
        println!(
            "Unchanged: {}, skipped: {}, failed: {}",
            summary.unchanged,
            summary.skipped,
            summary.failed.len()
        );
    }
    for failed in &summary.failed {
        eprintln!("Skipped {}: {}", failed.path.display(), failed.reason);
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
