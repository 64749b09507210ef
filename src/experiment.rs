//! Experiment sweeps: run every algorithm over a grid of random boards.
//!
//! A phase expands into one task per
//! (board config × board instance × card fraction × algorithm × parameter set).
//! Tasks run in parallel on the rayon pool, each task single-threaded, and
//! results are written under the output directory:
//!
//! ```text
//! <out>/board_configs/board_configs.json
//! <out>/tables/<algorithm>.csv
//! <out>/logs/<algorithm>-<n>.csv      (per-iteration trace, randomized algorithms only)
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::astar::solve_astar_with_block_size;
use crate::board_gen::{BoardConfig, ValueDistribution};
use crate::constants::*;
use crate::dp_solver::{solve_bottom_up, solve_top_down};
use crate::error::{SolveResult, SolverError};
use crate::greedy_repair::{greedy_and_repair, GreedyRepairParams};
use crate::types::{Board, Boundary, Solution};

/// Solvers available to sweeps and to `mwis-solve`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "dynamic-bottom-up")]
    BottomUp,
    #[serde(rename = "dynamic-top-down")]
    TopDown,
    #[serde(rename = "astar")]
    AStar,
    #[serde(rename = "greedy")]
    GreedyRepair,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::BottomUp,
        Algorithm::TopDown,
        Algorithm::AStar,
        Algorithm::GreedyRepair,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::BottomUp => "dynamic-bottom-up",
            Algorithm::TopDown => "dynamic-top-down",
            Algorithm::AStar => "astar",
            Algorithm::GreedyRepair => "greedy",
        }
    }

    pub fn is_deterministic(self) -> bool {
        !matches!(self, Algorithm::GreedyRepair)
    }

    /// Run once. `params` and `seed` only matter for randomized algorithms.
    pub fn solve(
        self,
        board: &Board,
        max_cards: usize,
        block_size: usize,
        params: &GreedyRepairParams,
        seed: u64,
    ) -> SolveResult<(Solution, Vec<i64>)> {
        match self {
            Algorithm::BottomUp => {
                Ok((solve_bottom_up(board, max_cards, Boundary::default())?, Vec::new()))
            }
            Algorithm::TopDown => {
                Ok((solve_top_down(board, max_cards, Boundary::default())?, Vec::new()))
            }
            Algorithm::AStar => Ok((
                solve_astar_with_block_size(board, max_cards, block_size)?,
                Vec::new(),
            )),
            Algorithm::GreedyRepair => {
                let outcome = greedy_and_repair(board, max_cards, params, seed)?;
                Ok((outcome.solution, outcome.trace))
            }
        }
    }
}

/// Run `f` and return its result with the elapsed wall time in seconds.
pub fn timed<T>(f: impl FnOnce() -> SolveResult<T>) -> SolveResult<(T, f64)> {
    let start = Instant::now();
    let value = f()?;
    Ok((value, start.elapsed().as_secs_f64()))
}

/// Parameter grid for the greedy repair solver; every combination is run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GreedyGrid {
    pub iterations: Vec<usize>,
    pub region_fractions: Vec<f64>,
}

impl Default for GreedyGrid {
    fn default() -> Self {
        Self {
            iterations: vec![DEFAULT_REPAIR_ITERATIONS],
            region_fractions: vec![DEFAULT_REGION_FRACTION],
        }
    }
}

impl GreedyGrid {
    pub fn combinations(&self) -> Vec<GreedyRepairParams> {
        self.iterations
            .iter()
            .flat_map(|&iterations| {
                self.region_fractions
                    .iter()
                    .map(move |&region_fraction| GreedyRepairParams {
                        iterations,
                        region_fraction,
                    })
            })
            .collect()
    }
}

fn default_columns() -> usize {
    DEFAULT_WIDTH
}

fn default_repetitions() -> usize {
    1
}

fn default_algorithms() -> Vec<Algorithm> {
    Algorithm::ALL.to_vec()
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

/// One sweep, loadable from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExperimentPhase {
    pub name: String,
    pub board_heights: Vec<usize>,
    #[serde(default = "default_columns")]
    pub columns: usize,
    pub distributions: Vec<ValueDistribution>,
    pub max_cards_fractions: Vec<f64>,
    pub boards_per_config: usize,
    #[serde(default = "default_repetitions")]
    pub repetitions: usize,
    #[serde(default)]
    pub greedy: GreedyGrid,
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<Algorithm>,
    #[serde(default = "default_block_size")]
    pub block_size: usize,
}

impl Default for ExperimentPhase {
    /// Card-count sweep: 500 × 4 boards, uniform(-1000, 1000), K from 10% to 90%.
    fn default() -> Self {
        Self {
            name: "card-number".to_string(),
            board_heights: vec![500],
            columns: DEFAULT_WIDTH,
            distributions: vec![ValueDistribution::Uniform {
                low: -1000,
                high: 1000,
            }],
            max_cards_fractions: vec![0.1, 0.3, 0.5, 0.7, 0.9],
            boards_per_config: 7,
            repetitions: 1,
            greedy: GreedyGrid::default(),
            algorithms: default_algorithms(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl ExperimentPhase {
    pub fn from_json_file(path: &Path) -> SolveResult<Self> {
        let phase: ExperimentPhase = serde_json::from_reader(File::open(path)?)?;
        phase.validate()?;
        Ok(phase)
    }

    pub fn validate(&self) -> SolveResult<()> {
        if self.repetitions == 0 {
            return Err(SolverError::parameter("repetitions must be at least 1"));
        }
        if self.block_size == 0 {
            return Err(SolverError::InvalidBlockSize(0));
        }
        if let Some(f) = self
            .max_cards_fractions
            .iter()
            .find(|f| !(f.is_finite() && **f >= 0.0))
        {
            return Err(SolverError::parameter(format!(
                "max_cards fraction must be a non-negative number, got {f}"
            )));
        }
        for distribution in &self.distributions {
            distribution.validate()?;
        }
        for params in self.greedy.combinations() {
            params.validate()?;
        }
        Ok(())
    }

    /// One config per (height, distribution), ids in creation order.
    pub fn board_configs(&self) -> Vec<BoardConfig> {
        let mut configs = Vec::new();
        for &rows in &self.board_heights {
            for &distribution in &self.distributions {
                configs.push(BoardConfig {
                    config_id: configs.len(),
                    rows,
                    columns: self.columns,
                    distribution,
                });
            }
        }
        configs
    }

    /// Expand into tasks. Board seeds are drawn from `seed`, so the whole
    /// phase is reproducible.
    pub fn tasks(&self, seed: u64) -> Vec<ExperimentTask> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let greedy_params = self.greedy.combinations();
        let mut tasks = Vec::new();
        let mut board_id = 0usize;
        for config in self.board_configs() {
            for _ in 0..self.boards_per_config {
                let board_seed = rng.random::<u32>() as u64;
                for &fraction in &self.max_cards_fractions {
                    for &algorithm in &self.algorithms {
                        let params: Vec<Option<GreedyRepairParams>> =
                            if algorithm.is_deterministic() {
                                vec![None]
                            } else {
                                greedy_params.iter().copied().map(Some).collect()
                            };
                        for params in params {
                            tasks.push(ExperimentTask {
                                algorithm,
                                config,
                                board_id,
                                board_seed,
                                max_cards_fraction: fraction,
                                params,
                            });
                        }
                    }
                }
                board_id += 1;
            }
        }
        tasks
    }
}

/// Card budget for a board of `size` cells: `max(1, floor(size × fraction))`.
pub fn max_cards_for(size: usize, fraction: f64) -> usize {
    ((size as f64 * fraction) as usize).max(1)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExperimentTask {
    pub algorithm: Algorithm,
    pub config: BoardConfig,
    pub board_id: usize,
    pub board_seed: u64,
    pub max_cards_fraction: f64,
    pub params: Option<GreedyRepairParams>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Measurement {
    Single {
        value: i64,
        time: f64,
    },
    Repeated {
        num_trials: usize,
        value_mean: f64,
        value_std: f64,
        value_min: i64,
        value_max: i64,
        time_mean: f64,
        time_std: f64,
        /// Mean objective after the fill (index 0) and after each repair.
        trace_mean: Vec<f64>,
        trace_std: Vec<f64>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskRecord {
    pub algorithm: Algorithm,
    pub board_id: usize,
    pub board_config_id: usize,
    pub max_cards_fraction: f64,
    pub max_cards: usize,
    pub params: Option<GreedyRepairParams>,
    pub measurement: Measurement,
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Generate the task's board and run its algorithm (`repetitions` times if randomized).
pub fn run_task(task: &ExperimentTask, repetitions: usize, block_size: usize) -> SolveResult<TaskRecord> {
    let board = task.config.generate(task.board_seed)?;
    let max_cards = max_cards_for(board.size(), task.max_cards_fraction);
    let params = task.params.unwrap_or_default();

    let measurement = if task.algorithm.is_deterministic() {
        let ((solution, _), time) = timed(|| {
            task.algorithm
                .solve(&board, max_cards, block_size, &params, task.board_seed)
        })?;
        Measurement::Single {
            value: solution.value,
            time,
        }
    } else {
        let mut values = Vec::with_capacity(repetitions);
        let mut times = Vec::with_capacity(repetitions);
        let mut traces = Vec::with_capacity(repetitions);
        for rep in 0..repetitions {
            let seed = task.board_seed.wrapping_add(rep as u64);
            let ((solution, trace), time) =
                timed(|| task.algorithm.solve(&board, max_cards, block_size, &params, seed))?;
            values.push(solution.value);
            times.push(time);
            traces.push(trace);
        }
        let as_f64: Vec<f64> = values.iter().map(|&v| v as f64).collect();
        let (value_mean, value_std) = mean_std(&as_f64);
        let (time_mean, time_std) = mean_std(&times);
        let steps = traces.iter().map(Vec::len).min().unwrap_or(0);
        let (trace_mean, trace_std) = (0..steps)
            .map(|i| {
                let column: Vec<f64> = traces.iter().map(|t| t[i] as f64).collect();
                mean_std(&column)
            })
            .unzip();
        Measurement::Repeated {
            num_trials: repetitions,
            value_mean,
            value_std,
            value_min: values.iter().copied().min().unwrap_or(0),
            value_max: values.iter().copied().max().unwrap_or(0),
            time_mean,
            time_std,
            trace_mean,
            trace_std,
        }
    };

    Ok(TaskRecord {
        algorithm: task.algorithm,
        board_id: task.board_id,
        board_config_id: task.config.config_id,
        max_cards_fraction: task.max_cards_fraction,
        max_cards,
        params: task.params,
        measurement,
    })
}

impl TaskRecord {
    fn csv_header(&self) -> &'static str {
        match self.measurement {
            Measurement::Single { .. } => {
                "algo,board_id,board_config_id,max_cards_fraction,max_cards,value,time"
            }
            Measurement::Repeated { .. } => {
                "algo,board_id,board_config_id,max_cards_fraction,max_cards,iterations,region_fraction,\
                 num_trials,value_mean,value_std,value_min,value_max,time_mean,time_std"
            }
        }
    }

    fn csv_row(&self) -> String {
        let prefix = format!(
            "{},{},{},{},{}",
            self.algorithm.name(),
            self.board_id,
            self.board_config_id,
            self.max_cards_fraction,
            self.max_cards
        );
        match &self.measurement {
            Measurement::Single { value, time } => format!("{prefix},{value},{time:.6}"),
            Measurement::Repeated {
                num_trials,
                value_mean,
                value_std,
                value_min,
                value_max,
                time_mean,
                time_std,
                ..
            } => {
                let params = self.params.unwrap_or_default();
                format!(
                    "{prefix},{},{},{num_trials},{value_mean:.3},{value_std:.3},{value_min},{value_max},\
                     {time_mean:.6},{time_std:.6}",
                    params.iterations, params.region_fraction
                )
            }
        }
    }
}

/// Write one CSV table for records of a single algorithm.
pub fn write_csv(path: &Path, records: &[&TaskRecord]) -> SolveResult<()> {
    let mut f = BufWriter::new(File::create(path)?);
    if let Some(first) = records.first() {
        writeln!(f, "{}", first.csv_header())?;
    }
    for record in records {
        writeln!(f, "{}", record.csv_row())?;
    }
    f.flush()?;
    Ok(())
}

fn write_trace_log(path: &Path, mean: &[f64], std: &[f64]) -> SolveResult<()> {
    let mut f = BufWriter::new(File::create(path)?);
    writeln!(f, "iter,eval_mean,eval_std")?;
    for (i, (m, s)) in mean.iter().zip(std).enumerate() {
        writeln!(f, "{i},{m:.3},{s:.3}")?;
    }
    f.flush()?;
    Ok(())
}

/// What a finished phase produced.
#[derive(Debug)]
pub struct PhaseReport {
    pub records: Vec<TaskRecord>,
    pub tables: Vec<PathBuf>,
    pub elapsed_secs: f64,
}

/// Run a whole phase and write its tables under `output_dir`.
pub fn run_phase(phase: &ExperimentPhase, seed: u64, output_dir: &Path) -> SolveResult<PhaseReport> {
    phase.validate()?;
    let start = Instant::now();
    let tables_dir = output_dir.join("tables");
    let logs_dir = output_dir.join("logs");
    let configs_dir = output_dir.join("board_configs");
    for dir in [&tables_dir, &logs_dir, &configs_dir] {
        fs::create_dir_all(dir)?;
    }

    let configs = phase.board_configs();
    let configs_file = BufWriter::new(File::create(configs_dir.join("board_configs.json"))?);
    serde_json::to_writer_pretty(configs_file, &configs)?;
    for config in &configs {
        info!(
            config_id = config.config_id,
            rows = config.rows,
            columns = config.columns,
            distribution = %config.distribution.label(),
            "board config"
        );
    }

    let tasks = phase.tasks(seed);
    let total = tasks.len();
    info!(phase = %phase.name, tasks = total, configs = configs.len(), "starting phase");

    let done = AtomicUsize::new(0);
    let records: Vec<TaskRecord> = tasks
        .par_iter()
        .map(|task| -> SolveResult<TaskRecord> {
            let record = run_task(task, phase.repetitions, phase.block_size)?;
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            if finished % 10 == 0 || finished == total {
                info!(phase = %phase.name, "completed {finished}/{total} tasks");
            }
            Ok(record)
        })
        .collect::<SolveResult<_>>()?;

    let mut tables = Vec::new();
    for algorithm in &phase.algorithms {
        let rows: Vec<&TaskRecord> = records
            .iter()
            .filter(|r| r.algorithm == *algorithm)
            .collect();
        let path = tables_dir.join(format!("{}.csv", algorithm.name()));
        write_csv(&path, &rows)?;
        tables.push(path);

        let mut log_index = 0usize;
        for record in &rows {
            if let Measurement::Repeated {
                trace_mean,
                trace_std,
                ..
            } = &record.measurement
            {
                let log_path = logs_dir.join(format!("{}-{log_index}.csv", algorithm.name()));
                write_trace_log(&log_path, trace_mean, trace_std)?;
                log_index += 1;
            }
        }
    }

    let elapsed_secs = start.elapsed().as_secs_f64();
    info!(phase = %phase.name, elapsed_secs, "phase finished");
    Ok(PhaseReport {
        records,
        tables,
        elapsed_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_phase() -> ExperimentPhase {
        ExperimentPhase {
            name: "unit".to_string(),
            board_heights: vec![6, 9],
            columns: 3,
            distributions: vec![ValueDistribution::Uniform { low: -20, high: 20 }],
            max_cards_fractions: vec![0.2, 0.5],
            boards_per_config: 2,
            repetitions: 3,
            greedy: GreedyGrid {
                iterations: vec![5, 10],
                region_fractions: vec![0.3],
            },
            algorithms: Algorithm::ALL.to_vec(),
            block_size: 2,
        }
    }

    #[test]
    fn test_max_cards_for() {
        assert_eq!(max_cards_for(2000, 0.1), 200);
        assert_eq!(max_cards_for(4, 0.1), 1);
        assert_eq!(max_cards_for(10, 0.0), 1);
    }

    #[test]
    fn test_task_expansion() {
        let phase = small_phase();
        assert_eq!(phase.board_configs().len(), 2);
        let tasks = phase.tasks(1);
        // 2 configs × 2 boards × 2 fractions × (3 exact + 2 greedy params)
        assert_eq!(tasks.len(), 2 * 2 * 2 * 5);
        assert_eq!(tasks, phase.tasks(1));
        let board_ids: std::collections::BTreeSet<usize> = tasks.iter().map(|t| t.board_id).collect();
        assert_eq!(board_ids.len(), 4);
    }

    #[test]
    fn test_exact_algorithms_agree_per_board() {
        let phase = small_phase();
        let tasks = phase.tasks(5);
        let records: Vec<TaskRecord> = tasks
            .iter()
            .map(|t| run_task(t, phase.repetitions, phase.block_size).unwrap())
            .collect();
        let exact_value = |r: &TaskRecord| match r.measurement {
            Measurement::Single { value, .. } => Some(value),
            Measurement::Repeated { .. } => None,
        };
        for r in &records {
            let reference = records
                .iter()
                .find(|o| {
                    o.algorithm == Algorithm::BottomUp
                        && o.board_id == r.board_id
                        && o.max_cards == r.max_cards
                })
                .and_then(exact_value)
                .unwrap();
            match &r.measurement {
                Measurement::Single { value, .. } => assert_eq!(*value, reference),
                Measurement::Repeated {
                    value_max,
                    value_min,
                    num_trials,
                    ..
                } => {
                    assert!(*value_max <= reference);
                    assert!(value_min <= value_max);
                    assert_eq!(*num_trials, 3);
                }
            }
        }
    }

    #[test]
    fn test_phase_json_defaults() {
        let json = r#"{
            "name": "tiny",
            "board_heights": [4],
            "distributions": [{"type": "uniform", "low": -3, "high": 3}],
            "max_cards_fractions": [0.5],
            "boards_per_config": 1
        }"#;
        let phase: ExperimentPhase = serde_json::from_str(json).unwrap();
        assert_eq!(phase.columns, DEFAULT_WIDTH);
        assert_eq!(phase.repetitions, 1);
        assert_eq!(phase.algorithms, Algorithm::ALL.to_vec());
        assert_eq!(phase.greedy, GreedyGrid::default());
        assert!(phase.validate().is_ok());
    }

    #[test]
    fn test_csv_rows() {
        let record = TaskRecord {
            algorithm: Algorithm::AStar,
            board_id: 3,
            board_config_id: 1,
            max_cards_fraction: 0.5,
            max_cards: 8,
            params: None,
            measurement: Measurement::Single {
                value: 42,
                time: 0.25,
            },
        };
        assert_eq!(record.csv_row(), "astar,3,1,0.5,8,42,0.250000");
        assert!(record.csv_header().ends_with("value,time"));
    }
}
