//! nlq-eval - annotation agreement CLI
//!
//! Scores a test annotation file against its gold reference and writes the
//! four-tier agreement report as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Report to stdout, pretty-printed
//! nlq-eval gold_queries.json test_results.json
//!
//! # Report to a file, one line
//! nlq-eval gold_queries.json test_results.json --compact -o report.json
//! ```

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use nlq_eval::{evaluate_corpus, Corpus, Result};

/// Score test annotations against a gold reference.
#[derive(Parser)]
#[command(name = "nlq-eval", author, version, about)]
struct Cli {
    /// Gold (reference) annotation file.
    gold: PathBuf,

    /// Test (pipeline output) annotation file.
    test: PathBuf,

    /// Write the report here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit single-line JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let gold = Corpus::from_path(&cli.gold)?;
    let test = Corpus::from_path(&cli.test)?;
    log::info!(
        "loaded {} gold and {} test queries",
        gold.queries.len(),
        test.queries.len()
    );

    let report = evaluate_corpus(&gold, &test)?.to_json();
    let rendered = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };

    match &cli.output {
        Some(path) => fs::write(path, rendered + "\n")?,
        None => println!("{rendered}"),
    }
    Ok(())
}
