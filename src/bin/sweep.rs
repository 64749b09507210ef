//! mwis-sweep: run an experiment phase and write its result tables.
//!
//! Without `--phase` the built-in card-count sweep runs.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mwis_grid::env_config::{init_logging, init_rayon_threads};
use mwis_grid::error::SolveResult;
use mwis_grid::experiment::{run_phase, ExperimentPhase};

#[derive(Parser, Debug)]
#[command(name = "mwis-sweep")]
struct Args {
    /// Phase definition (JSON); defaults to the card-count sweep
    #[arg(long)]
    phase: Option<PathBuf>,

    /// Output directory
    #[arg(long, default_value = "results")]
    output: PathBuf,

    /// Seed for board seeds
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Print the phase definition and exit
    #[arg(long)]
    dry_run: bool,
}

fn run(args: &Args) -> SolveResult<()> {
    let phase = match &args.phase {
        Some(path) => ExperimentPhase::from_json_file(path)?,
        None => ExperimentPhase::default(),
    };
    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&phase)?);
        println!("{} tasks", phase.tasks(args.seed).len());
        return Ok(());
    }

    let threads = init_rayon_threads()?;
    let output = args.output.join(&phase.name);
    println!("=== mwis-sweep ===");
    println!("Phase: {}  threads={}  output={}", phase.name, threads, output.display());

    let report = run_phase(&phase, args.seed, &output)?;
    for table in &report.tables {
        println!("  wrote {}", table.display());
    }
    println!(
        "\nDone. {} tasks in {:.1}s.",
        report.records.len(),
        report.elapsed_secs
    );
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
