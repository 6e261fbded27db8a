//! An agent for playing "K-in-a-Row" on an n×m board with forbidden cells
//!
//! The agent chooses moves with a time-boxed minimax search using alpha-beta
//! pruning, a Zobrist-hashed transposition cache and a pluggable static
//! evaluator.
//!
//! # Basic Usage
//!
//! ```
//! use kinarow_ai::{GameType, Move, SearchConfig, Solver, ZobristTable};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let game = GameType::from_rows(3, &["XX ", " O ", "  O"], kinarow_ai::Marker::X)?;
//! let zobrist = ZobristTable::for_game(&game);
//! let config = SearchConfig::default();
//!
//! let solver = Solver::new(&game, &zobrist, &config);
//! let (decision, _stats) = solver.decide(&game.initial_state);
//!
//! assert_eq!(decision.chosen(), Some(Move::new(0, 2)));
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod game;

pub mod scanner;

pub mod evaluator;

pub mod moves;

pub mod transposition_table;

pub mod solver;

pub mod commentary;

pub mod agent;

pub mod game_master;

mod test;

pub use agent::{Agent, Player, RandomPlayer, Turn};
pub use evaluator::{Evaluator, LineEvaluator, SequenceEvaluator, WIN_SCORE};
pub use game::{Board, Cell, GameType, Marker, Move, State};
pub use game_master::{GameMaster, GameRecord, GameResult};
pub use scanner::{count_open_sequences, has_win, test_win, Outcome};
pub use solver::{Decision, SearchConfig, SearchContext, SearchStats, Solver};
pub use transposition_table::{TranspositionTable, ZobristTable};

/// The largest supported number of rows or columns
pub const MAX_DIMENSION: usize = 30;

// a depth-biased win must still outrank every heuristic score, even after a
// search as long as the largest board has cells
const_assert!(
    MAX_DIMENSION * MAX_DIMENSION < (evaluator::WIN_SCORE - evaluator::HEURISTIC_LIMIT) as usize
);
