//! Known-answer tests run through every exact solver, plus window embedding,
//! error reporting and the greedy repair solver.

use mwis_grid::astar::{solve_astar, solve_astar_with_block_size};
use mwis_grid::dp_solver::{solve_bottom_up, solve_dp, solve_top_down};
use mwis_grid::error::{card_budget, SolveResult, SolverError};
use mwis_grid::greedy_repair::{greedy_and_repair, greedy_fill, repair_region, GreedyRepairParams};
use mwis_grid::row_scoring::{check_path, path_value};
use mwis_grid::types::{Board, Boundary, Solution};

struct Case {
    board: Vec<Vec<i32>>,
    max_cards: usize,
    expected: i64,
}

fn case(board: Vec<Vec<i32>>, max_cards: usize, expected: i64) -> Case {
    Case {
        board,
        max_cards,
        expected,
    }
}

fn known_cases() -> Vec<Case> {
    vec![
        // no values
        case(vec![vec![]], 0, 0),
        case(vec![vec![]], 1, 0),
        // single value
        case(vec![vec![1]], 1, 1),
        case(vec![vec![-1]], 1, 0),
        // one row
        case(vec![vec![1, 1, 1, 1]], 0, 0),
        case(vec![vec![1, 1, 1, 1]], 1, 1),
        case(vec![vec![1, 2, 3, 4]], 1, 4),
        case(vec![vec![1, 1, 1, 1]], 4, 2),
        case(vec![vec![2, 1, 2, 1]], 4, 4),
        case(vec![vec![1, -1, 1, -1]], 4, 2),
        case(vec![vec![-1, -1, -1, -1]], 4, 0),
        case(vec![vec![1, 2, 3, 4]], 4, 6),
        // two rows
        case(vec![vec![1, 1, 1, 1], vec![1, 1, 1, 1]], 0, 0),
        case(vec![vec![1, 1, 1, 1], vec![1, 1, 1, 1]], 1, 1),
        case(vec![vec![1, 1, 1, 4], vec![1, 1, 1, 1]], 1, 4),
        case(vec![vec![1, 1, 1, 1], vec![1, 1, 1, 1]], 8, 4),
        case(vec![vec![2, 1, 2, 1], vec![1, 2, 1, 2]], 8, 8),
        case(vec![vec![-1, -1, -1, -1], vec![-1, -1, -1, -1]], 8, 0),
        case(vec![vec![1, -1, -1, -1], vec![1, -1, -1, -1]], 8, 1),
        case(vec![vec![1, -1, 1, -1], vec![1, -1, 1, -1]], 8, 2),
        case(vec![vec![1, -1, -1, 1], vec![1, -1, 1, 1]], 8, 3),
        case(vec![vec![1, -1, 1, -1], vec![-1, 1, -1, 1]], 8, 4),
        case(vec![vec![5, 3, 10, -1], vec![0, -3, 9, -2]], 8, 15),
    ]
}

type Solver = fn(&Board, usize) -> SolveResult<Solution>;

fn bottom_up(board: &Board, max_cards: usize) -> SolveResult<Solution> {
    solve_bottom_up(board, max_cards, Boundary::default())
}

fn top_down(board: &Board, max_cards: usize) -> SolveResult<Solution> {
    solve_top_down(board, max_cards, Boundary::default())
}

fn astar_block_1(board: &Board, max_cards: usize) -> SolveResult<Solution> {
    solve_astar_with_block_size(board, max_cards, 1)
}

fn solvers() -> [(&'static str, Solver); 4] {
    [
        ("bottom-up", bottom_up as Solver),
        ("top-down", top_down as Solver),
        ("astar", solve_astar as Solver),
        ("astar-block-1", astar_block_1 as Solver),
    ]
}

#[test]
fn test_known_answers_all_solvers() {
    for (name, solve) in solvers() {
        for tc in known_cases() {
            let board = Board::new(tc.board.clone()).unwrap();
            let sol = solve(&board, tc.max_cards).unwrap();
            assert_eq!(
                sol.value, tc.expected,
                "{name} board={:?} max_cards={}",
                tc.board, tc.max_cards
            );
            assert_eq!(sol.path.len(), board.rows());
            let checked = check_path(&board, &sol.path, tc.max_cards, Boundary::default()).unwrap();
            assert_eq!(checked, sol.value, "{name} path disagrees with value");
        }
    }
}

#[test]
fn test_empty_width_board_paths() {
    let board = Board::new(vec![vec![]]).unwrap();
    for (_, solve) in solvers() {
        assert_eq!(solve(&board, 3).unwrap(), Solution::empty(1));
    }
}

#[test]
fn test_window_embedding() {
    // Middle two rows of a four-row board, with rows 0 and 3 fixed.
    let full = Board::new(vec![
        vec![0, 0, 0, 0],
        vec![8, 1, 7, 1],
        vec![1, 6, 1, 9],
        vec![0, 0, 0, 0],
    ])
    .unwrap();
    let window = full.slice_rows(1..3).unwrap();
    let above = 0b0001; // column 0
    let below = 0b1000; // column 3
    let boundary = Boundary::new(above, below);

    let bu = solve_bottom_up(&window, 4, boundary).unwrap();
    let td = solve_top_down(&window, 4, boundary).unwrap();
    assert_eq!(bu.value, td.value);
    // column 0 of row 1 and column 3 of row 2 are blocked: best is 7 + 6
    assert_eq!(bu.value, 13);

    let mut embedded = vec![above, 0, 0, below];
    embedded[1..3].copy_from_slice(&bu.path);
    check_path(&full, &embedded, 6, Boundary::default()).unwrap();
    assert_eq!(path_value(&full, &embedded), 13);
}

#[test]
fn test_solve_dp_matches_bottom_up() {
    let board = Board::new(vec![vec![3, -2, 4], vec![5, 1, -1], vec![2, 2, 2]]).unwrap();
    for k in 0..=6 {
        assert_eq!(
            solve_dp(&board, k, Boundary::default()).unwrap(),
            solve_bottom_up(&board, k, Boundary::default()).unwrap()
        );
    }
}

#[test]
fn test_error_reporting() {
    assert!(matches!(Board::new(vec![]), Err(SolverError::EmptyBoard)));
    assert!(matches!(
        Board::new(vec![vec![1, 2, 3], vec![4, 5]]),
        Err(SolverError::RaggedBoard { row: 1, .. })
    ));
    assert!(matches!(
        card_budget(-1),
        Err(SolverError::NegativeCardBudget(-1))
    ));

    let board = Board::new(vec![vec![1, 2, 3, 4]]).unwrap();
    assert!(matches!(
        solve_bottom_up(&board, 2, Boundary::new(0b0011, 0)),
        Err(SolverError::InvalidMask { .. })
    ));
    assert!(matches!(
        solve_top_down(&board, 2, Boundary::new(0, 0b10000)),
        Err(SolverError::InvalidMask { .. })
    ));
    assert!(matches!(
        solve_astar_with_block_size(&board, 2, 0),
        Err(SolverError::InvalidBlockSize(0))
    ));
}

#[test]
fn test_greedy_repair_full_window_is_exact() {
    let board = Board::new(vec![
        vec![4, -1, 6, 2],
        vec![3, 8, -5, 7],
        vec![-2, 5, 9, 1],
        vec![6, 0, 3, 4],
        vec![1, 7, -3, 5],
    ])
    .unwrap();
    let optimum = solve_bottom_up(&board, 6, Boundary::default()).unwrap().value;
    let mut masks = greedy_fill(&board, 6);
    let greedy_value = path_value(&board, &masks);
    assert!(greedy_value <= optimum);
    // a window covering the whole board is an exact solve
    repair_region(&board, &mut masks, 0, board.rows(), 6).unwrap();
    assert_eq!(path_value(&board, &masks), optimum);

    let params = GreedyRepairParams {
        iterations: 20,
        region_fraction: 1.0,
    };
    let outcome = greedy_and_repair(&board, 6, &params, 11).unwrap();
    assert_eq!(outcome.trace[0], greedy_value);
    assert!(outcome.solution.value <= optimum);
    assert!(outcome.solution.value >= greedy_value);
}

#[test]
fn test_greedy_repair_is_reproducible() {
    let rows: Vec<Vec<i32>> = (0..60)
        .map(|i| (0..4).map(|j| ((i * 31 + j * 17) % 41) - 15).collect())
        .collect();
    let board = Board::new(rows).unwrap();
    let params = GreedyRepairParams::default();
    let a = greedy_and_repair(&board, 40, &params, 9).unwrap();
    let b = greedy_and_repair(&board, 40, &params, 9).unwrap();
    assert_eq!(a, b);
    let optimum = solve_astar(&board, 40).unwrap().value;
    assert!(a.solution.value <= optimum);
    check_path(&board, &a.solution.path, 40, Boundary::default()).unwrap();
}
