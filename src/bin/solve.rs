//! mwis-solve: solve one board with one or all algorithms.
//!
//! The board comes from a JSON file (`[[w, ...], ...]`) or is generated from a
//! seed. Prints value, wall time and the selected masks row by row.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use mwis_grid::board_gen::{BoardConfig, ValueDistribution};
use mwis_grid::env_config::{block_size, init_logging};
use mwis_grid::error::{card_budget, SolveResult};
use mwis_grid::experiment::{max_cards_for, timed, Algorithm};
use mwis_grid::greedy_repair::GreedyRepairParams;
use mwis_grid::row_scoring::check_path;
use mwis_grid::types::{Board, Boundary};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Choice {
    BottomUp,
    TopDown,
    Astar,
    Greedy,
    All,
}

impl Choice {
    fn algorithms(self) -> Vec<Algorithm> {
        match self {
            Choice::BottomUp => vec![Algorithm::BottomUp],
            Choice::TopDown => vec![Algorithm::TopDown],
            Choice::Astar => vec![Algorithm::AStar],
            Choice::Greedy => vec![Algorithm::GreedyRepair],
            Choice::All => Algorithm::ALL.to_vec(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "mwis-solve")]
struct Args {
    /// Algorithm to run
    #[arg(long, value_enum, default_value_t = Choice::Astar)]
    algorithm: Choice,

    /// Board JSON file; a random board is generated when omitted
    #[arg(long)]
    board: Option<PathBuf>,

    /// Random board height
    #[arg(long, default_value_t = 100)]
    rows: usize,

    /// Random board width
    #[arg(long, default_value_t = 4)]
    columns: usize,

    /// Random cell value range (inclusive)
    #[arg(long, default_value_t = -1000, allow_hyphen_values = true)]
    low: i32,
    #[arg(long, default_value_t = 1000)]
    high: i32,

    /// RNG seed for board generation and greedy repair
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Card budget K
    #[arg(long, allow_hyphen_values = true)]
    max_cards: Option<i64>,

    /// Card budget as a fraction of the board size (used when --max-cards is absent)
    #[arg(long, default_value_t = 0.1)]
    fraction: f64,

    /// Greedy repair rounds
    #[arg(long, default_value_t = 200)]
    iterations: usize,

    /// Greedy repair window as a fraction of the board height
    #[arg(long, default_value_t = 0.05)]
    region_fraction: f64,

    /// Print the selected masks
    #[arg(long)]
    show_path: bool,
}

fn load_board(args: &Args) -> SolveResult<Board> {
    match &args.board {
        Some(path) => {
            let file = std::fs::File::open(path)?;
            Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
        }
        None => BoardConfig {
            config_id: 0,
            rows: args.rows,
            columns: args.columns,
            distribution: ValueDistribution::Uniform {
                low: args.low,
                high: args.high,
            },
        }
        .generate(args.seed),
    }
}

fn run(args: &Args) -> SolveResult<()> {
    let board = load_board(args)?;
    let max_cards = match args.max_cards {
        Some(k) => card_budget(k)?,
        None => max_cards_for(board.size(), args.fraction),
    };
    let block_size = block_size()?;
    let params = GreedyRepairParams {
        iterations: args.iterations,
        region_fraction: args.region_fraction,
    };

    println!("=== mwis-solve ===");
    println!(
        "Board: {} x {}  K={}  block_size={}",
        board.rows(),
        board.width(),
        max_cards,
        block_size
    );

    for algorithm in args.algorithm.algorithms() {
        let ((solution, _), secs) =
            timed(|| algorithm.solve(&board, max_cards, block_size, &params, args.seed))?;
        check_path(&board, &solution.path, max_cards, Boundary::default())?;
        println!(
            "{:<18} value={:<10} cards={:<6} time={:.3}s",
            algorithm.name(),
            solution.value,
            solution.cards(),
            secs
        );
        if args.show_path {
            for (r, mask) in solution.path.iter().enumerate() {
                println!("  {:>5}: {:0width$b}", r, mask, width = board.width().max(1));
            }
        }
    }
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
