//! Static evaluation of positions
//!
//! Scores are from X's point of view: positive favours X, negative favours O.
//! A won position scores exactly `±WIN_SCORE`; every non-terminal score of the
//! built-in evaluators is clamped into `±HEURISTIC_LIMIT`, leaving room for the
//! search to bias win scores by depth without ever meeting a heuristic score.

use anyhow::Result;

use crate::game::{Board, Cell, GameType, Marker, State};
use crate::scanner::{count_open_sequences, has_win, DIRECTIONS};

/// Score of a position won by X (negated for O)
pub const WIN_SCORE: i32 = 10_000;

/// Largest magnitude of a non-terminal built-in score
pub const HEURISTIC_LIMIT: i32 = WIN_SCORE - 1_000;

/// Reward for a line window, indexed by the number of cells still missing - 1
const WINDOW_WEIGHTS: [i32; 4] = [100, 10, 3, 1];

/// Bonus for holding the centre cell in [`SequenceEvaluator`]
const CENTRE_BONUS: i32 = 5;

/// A static evaluation function.
///
/// Implementations must be deterministic for a given state. Returning an error
/// makes the search fall back to [`LineEvaluator`] for that call.
pub trait Evaluator: Send + Sync {
    fn score(&self, state: &State, game: &GameType) -> Result<i32>;
}

impl<F> Evaluator for F
where
    F: Fn(&State, &GameType) -> Result<i32> + Send + Sync,
{
    fn score(&self, state: &State, game: &GameType) -> Result<i32> {
        self(state, game)
    }
}

/// Scores every window of k cells in the four directions.
///
/// A window holding any opposing marker (or a forbidden cell, which can never
/// be filled) is worth nothing; otherwise its reward grows steeply as the
/// owner closes in on k, with the largest step for a window one cell short.
#[derive(Copy, Clone, Default, Debug)]
pub struct LineEvaluator;

impl LineEvaluator {
    pub fn evaluate(&self, board: &Board, k: usize) -> i32 {
        if has_win(board, Marker::X, k) {
            return WIN_SCORE;
        }
        if has_win(board, Marker::O, k) {
            return -WIN_SCORE;
        }

        let mut x_score = 0;
        let mut o_score = 0;
        let k_span = k as isize - 1;

        for (row, col, _) in board.cells() {
            let (row, col) = (row as isize, col as isize);
            for &(dr, dc) in DIRECTIONS.iter() {
                if !board.in_bounds(row + k_span * dr, col + k_span * dc) {
                    continue;
                }

                let (mut x, mut o, mut empty) = (0, 0, 0);
                for step in 0..k as isize {
                    match board.cell(row + step * dr, col + step * dc) {
                        Some(Cell::Taken(Marker::X)) => x += 1,
                        Some(Cell::Taken(Marker::O)) => o += 1,
                        Some(Cell::Empty) => empty += 1,
                        _ => {}
                    }
                }
                x_score += window_score(x, o, empty, k);
                o_score += window_score(o, x, empty, k);
            }
        }

        (x_score - o_score).max(-HEURISTIC_LIMIT).min(HEURISTIC_LIMIT)
    }
}

impl Evaluator for LineEvaluator {
    fn score(&self, state: &State, game: &GameType) -> Result<i32> {
        Ok(self.evaluate(state.board(), game.k))
    }
}

fn window_score(own: usize, opponent: usize, empty: usize, k: usize) -> i32 {
    if opponent > 0 || own + empty < k {
        return 0;
    }
    let missing = k - own;
    WINDOW_WEIGHTS[(missing.max(1) - 1).min(WINDOW_WEIGHTS.len() - 1)]
}

/// Scores open runs of every length from 2 to k.
///
/// Each open run of length `l` is worth `l² · 10`, five times that when it is
/// one marker short of k, plus a small bonus for holding the centre cell.
#[derive(Copy, Clone, Default, Debug)]
pub struct SequenceEvaluator;

impl SequenceEvaluator {
    pub fn evaluate(&self, board: &Board, k: usize) -> i32 {
        if has_win(board, Marker::X, k) {
            return WIN_SCORE;
        }
        if has_win(board, Marker::O, k) {
            return -WIN_SCORE;
        }

        let mut score = 0i32;
        for length in 2..=k {
            let mut weight = (length * length * 10) as i32;
            if length + 1 == k {
                weight *= 5;
            }
            score += weight * count_open_sequences(board, Marker::X, length, k) as i32;
            score -= weight * count_open_sequences(board, Marker::O, length, k) as i32;
        }

        match board.get(board.rows() / 2, board.cols() / 2) {
            Cell::Taken(Marker::X) => score += CENTRE_BONUS,
            Cell::Taken(Marker::O) => score -= CENTRE_BONUS,
            _ => {}
        }

        score.max(-HEURISTIC_LIMIT).min(HEURISTIC_LIMIT)
    }
}

impl Evaluator for SequenceEvaluator {
    fn score(&self, state: &State, game: &GameType) -> Result<i32> {
        Ok(self.evaluate(state.board(), game.k))
    }
}
