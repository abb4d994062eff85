use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

use parity_harness::config;
use parity_harness::{LedgerStore, Recorder, ReportLayout, SummaryGenerator};

/// Parity - inspect behavioural differences recorded by side-by-side runs
#[derive(Parser, Debug)]
#[command(
    name = "parity",
    about = "Inspect the difference ledger recorded by side-by-side comparison runs",
    after_help = "ENVIRONMENT VARIABLES:\n\
        PARITY_REPORT_DIR          Directory holding the ledger, summary and screenshots\n\
        PARITY_SCENARIO_TIMEOUT    Per-instance scenario timeout (s)\n\
        PARITY_RESPONSE_TIMEOUT    Chat response timeout (s)\n\
        RUST_LOG                   Log filter (default: info)"
)]
struct Args {
    /// Report directory (default: tests/reports)
    #[arg(long, short = 'r', global = true, env = "PARITY_REPORT_DIR")]
    report_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Regenerate DIFFERENCES-SUMMARY.md from the ledger
    Summary {
        /// Also print the summary to stdout
        #[arg(long, short = 'p')]
        print: bool,
    },

    /// List every recorded difference
    List {
        /// Output the ledger as JSON
        #[arg(long)]
        json: bool,
    },

    /// Empty the ledger and remove recorded screenshots
    Clear,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let layout = ReportLayout::in_dir(args.report_dir.unwrap_or_else(config::report_dir));

    match args.command {
        Commands::Summary { print } => {
            let summary = SummaryGenerator::for_layout(&layout).generate()?;
            if print {
                println!("{}", summary);
            } else {
                println!("Summary written to {}", layout.summary_path().display());
            }
        }

        Commands::List { json } => {
            let entries = Recorder::in_layout(layout).ledger().load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No differences recorded.");
            } else {
                for entry in &entries {
                    println!(
                        "{}  {}  ({} difference{})",
                        entry.observed_at.format("%Y-%m-%d %H:%M:%S"),
                        entry.scenario_id,
                        entry.mismatch_reasons.len(),
                        if entry.mismatch_reasons.len() == 1 { "" } else { "s" }
                    );
                    for reason in &entry.mismatch_reasons {
                        println!("    - {}", reason.replace('\n', "\n      "));
                    }
                }
            }
        }

        Commands::Clear => {
            let recorder = Recorder::in_layout(layout);
            recorder.clear()?;
            recorder.layout().clear_snapshots()?;
            println!("Cleared ledger in {}", recorder.layout().root().display());
        }
    }

    Ok(())
}
