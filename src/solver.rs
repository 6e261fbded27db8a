//! Minimax search with alpha-beta pruning, a transposition cache and a soft deadline

use log::{debug, trace, warn};

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::evaluator::{Evaluator, LineEvaluator};
use crate::game::{GameType, Marker, Move, State};
use crate::moves::{legal_moves, order_moves};
use crate::scanner::winner;
use crate::transposition_table::{Bound, Entry, TranspositionTable, ZobristTable};

/// Bound of the search window
pub const INFINITY: i32 = i32::MAX;

/// Fraction of the time limit the search may use before it starts unwinding
pub const TIME_FRACTION: f64 = 0.8;

/// Options for one decision
#[derive(Clone)]
pub struct SearchConfig {
    pub use_pruning: bool,
    pub use_transposition_cache: bool,
    pub order_moves: bool,
    pub max_ply: u32,
    pub time_limit: Duration,
    /// Boards with at most this many cells are searched to completion,
    /// ignoring `max_ply`. 0 always respects `max_ply`.
    pub exhaustive_cells: usize,
    /// Replaces the built-in [`LineEvaluator`] when set
    pub evaluator: Option<Arc<dyn Evaluator>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            use_pruning: true,
            use_transposition_cache: true,
            order_moves: true,
            max_ply: 3,
            time_limit: Duration::from_secs(1),
            exhaustive_cells: 9,
            evaluator: None,
        }
    }
}

impl SearchConfig {
    pub fn with_pruning(mut self, use_pruning: bool) -> Self {
        self.use_pruning = use_pruning;
        self
    }

    pub fn with_transposition_cache(mut self, use_transposition_cache: bool) -> Self {
        self.use_transposition_cache = use_transposition_cache;
        self
    }

    pub fn with_move_ordering(mut self, order_moves: bool) -> Self {
        self.order_moves = order_moves;
        self
    }

    pub fn with_max_ply(mut self, max_ply: u32) -> Self {
        self.max_ply = max_ply;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_exhaustive_cells(mut self, exhaustive_cells: usize) -> Self {
        self.exhaustive_cells = exhaustive_cells;
        self
    }

    pub fn with_evaluator<E: Evaluator + 'static>(mut self, evaluator: E) -> Self {
        self.evaluator = Some(Arc::new(evaluator));
        self
    }
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("use_pruning", &self.use_pruning)
            .field("use_transposition_cache", &self.use_transposition_cache)
            .field("order_moves", &self.order_moves)
            .field("max_ply", &self.max_ply)
            .field("time_limit", &self.time_limit)
            .field("exhaustive_cells", &self.exhaustive_cells)
            .field("custom_evaluator", &self.evaluator.is_some())
            .finish()
    }
}

/// Diagnostic counters for one decision
#[derive(Copy, Clone, Default, Eq, PartialEq, Debug)]
pub struct SearchStats {
    pub static_eval_count: usize,
    pub alpha_beta_cutoff_count: usize,
    /// Number of writes to the transposition cache
    pub cache_entry_count: usize,
    pub cache_hit_count: usize,
    pub node_count: usize,
    /// Ply limit the decision searched with
    pub max_ply: u32,
    pub elapsed: Duration,
    /// The deadline was reached and part of the tree was skipped
    pub timed_out: bool,
}

/// Mutable state of one decision: the cache, the counters and the deadline.
///
/// Created fresh for every decision, so nothing leaks from one turn to the next.
pub struct SearchContext {
    pub table: TranspositionTable,
    pub stats: SearchStats,
    deadline: Instant,
    evaluator_failed: bool,
}

impl SearchContext {
    pub fn new(deadline: Instant) -> Self {
        Self {
            table: TranspositionTable::new(),
            stats: SearchStats::default(),
            deadline,
            evaluator_failed: false,
        }
    }

    fn past_deadline(&mut self) -> bool {
        if !self.stats.timed_out && Instant::now() >= self.deadline {
            self.stats.timed_out = true;
        }
        self.stats.timed_out
    }
}

/// The result of a decision
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Move {
        chosen: Move,
        state: State,
        score: i32,
    },
    /// No legal move exists; the game is over for the side to move
    NoMove,
}

impl Decision {
    pub fn chosen(&self) -> Option<Move> {
        match self {
            Decision::Move { chosen, .. } => Some(*chosen),
            Decision::NoMove => None,
        }
    }

    pub fn score(&self) -> Option<i32> {
        match self {
            Decision::Move { score, .. } => Some(*score),
            Decision::NoMove => None,
        }
    }
}

/// A minimax searcher for one game.
///
/// # Position Scoring
/// Scores are from X's point of view. A position won by X scores the win
/// constant minus the number of plies from the decision's root, a position won
/// by O the negated constant plus the plies, so the search prefers the fastest
/// win and the slowest loss.
pub struct Solver<'a> {
    game: &'a GameType,
    zobrist: &'a ZobristTable,
    config: &'a SearchConfig,
}

impl<'a> Solver<'a> {
    pub fn new(game: &'a GameType, zobrist: &'a ZobristTable, config: &'a SearchConfig) -> Self {
        Self {
            game,
            zobrist,
            config,
        }
    }

    /// Static evaluation through the configured evaluator, counted once per call
    pub fn evaluate(&self, ctx: &mut SearchContext, state: &State) -> i32 {
        ctx.stats.static_eval_count += 1;
        match &self.config.evaluator {
            Some(evaluator) => match evaluator.score(state, self.game) {
                Ok(score) => score,
                Err(err) => {
                    if !ctx.evaluator_failed {
                        warn!("evaluator failed, using the built-in one: {:#}", err);
                        ctx.evaluator_failed = true;
                    }
                    LineEvaluator.evaluate(state.board(), self.game.k)
                }
            },
            None => LineEvaluator.evaluate(state.board(), self.game.k),
        }
    }

    /// Ply limit for a decision from `state`
    pub fn effective_max_ply(&self, state: &State) -> u32 {
        let board = state.board();
        if board.rows() * board.cols() <= self.config.exhaustive_cells {
            board.empty_count() as u32
        } else {
            self.config.max_ply
        }
    }

    fn candidates(&self, state: &State) -> Vec<Move> {
        let moves = legal_moves(state);
        if self.config.order_moves {
            order_moves(state, moves)
        } else {
            moves
        }
    }

    /// Performs game tree search
    ///
    /// Returns the score of `state` (see [Position Scoring]). `hash` is the
    /// Zobrist hash of `state` and `ply` its distance from the decision's root.
    ///
    /// [Position Scoring]: #position-scoring
    #[allow(clippy::too_many_arguments)]
    pub fn search(
        &self,
        ctx: &mut SearchContext,
        state: &State,
        hash: u64,
        depth_remaining: u32,
        ply: u32,
        mut alpha: i32,
        mut beta: i32,
    ) -> i32 {
        ctx.stats.node_count += 1;

        let board = state.board();
        let won_by = winner(board, self.game.k);
        if won_by.is_some() || board.is_full() {
            let score = self.evaluate(ctx, state);
            return match won_by {
                Some(Marker::X) => score - ply as i32,
                Some(Marker::O) => score + ply as i32,
                None => score,
            };
        }

        if depth_remaining == 0 {
            return self.evaluate(ctx, state);
        }

        if ctx.past_deadline() {
            return self.evaluate(ctx, state);
        }

        let use_cache = self.config.use_transposition_cache;
        if use_cache {
            if let Some(entry) = ctx.table.lookup(hash, depth_remaining) {
                if let Some(score) = entry.cutoff(alpha, beta) {
                    ctx.stats.cache_hit_count += 1;
                    return score;
                }
            }
        }

        let (alpha_start, beta_start) = (alpha, beta);
        let side = state.whose_move();
        let maximizing = side == Marker::X;
        let mut best = if maximizing { -INFINITY } else { INFINITY };

        for mv in self.candidates(state) {
            let next = state.with_move(mv);
            let next_hash = self.zobrist.update(hash, mv, side);
            let score = self.search(ctx, &next, next_hash, depth_remaining - 1, ply + 1, alpha, beta);

            if maximizing {
                best = best.max(score);
                if self.config.use_pruning {
                    alpha = alpha.max(score);
                }
            } else {
                best = best.min(score);
                if self.config.use_pruning {
                    beta = beta.min(score);
                }
            }

            if self.config.use_pruning && alpha >= beta {
                ctx.stats.alpha_beta_cutoff_count += 1;
                break;
            }
            // whatever is unexplored stays unexplored; unwind with what we have
            if ctx.past_deadline() {
                break;
            }
        }

        if use_cache && !ctx.stats.timed_out {
            let bound = if !self.config.use_pruning {
                Bound::Exact
            } else if best <= alpha_start {
                Bound::Upper
            } else if best >= beta_start {
                Bound::Lower
            } else {
                Bound::Exact
            };
            ctx.table.store(
                hash,
                Entry {
                    score: best,
                    depth_remaining,
                    bound,
                },
            );
            ctx.stats.cache_entry_count += 1;
        }

        best
    }

    /// Chooses a move for the side to move in `state`.
    ///
    /// Every candidate is searched with `max_ply - 1` plies of lookahead and the
    /// first one with the best score for the side to move wins. Once the
    /// deadline passes, a candidate whose search was cut short is dropped unless
    /// it is the only one scored.
    pub fn decide(&self, state: &State) -> (Decision, SearchStats) {
        let start = Instant::now();
        let mut ctx = SearchContext::new(start + self.config.time_limit.mul_f64(TIME_FRACTION));

        let moves = if state.is_finished() {
            Vec::new()
        } else {
            self.candidates(state)
        };
        if moves.is_empty() {
            ctx.stats.elapsed = start.elapsed();
            return (Decision::NoMove, ctx.stats);
        }

        let max_ply = self.effective_max_ply(state);
        ctx.stats.max_ply = max_ply;
        let root_hash = self.zobrist.hash(state.board());
        let side = state.whose_move();
        let maximizing = side == Marker::X;

        let (mut alpha, mut beta) = (-INFINITY, INFINITY);
        let mut best: Option<(Move, i32)> = None;

        for mv in moves {
            if best.is_some() && ctx.past_deadline() {
                break;
            }

            let next = state.with_move(mv);
            let next_hash = self.zobrist.update(root_hash, mv, side);
            let score = self.search(
                &mut ctx,
                &next,
                next_hash,
                max_ply.saturating_sub(1),
                1,
                alpha,
                beta,
            );
            trace!("candidate {} scored {}", mv, score);

            // a subtree cut short by the deadline is only trusted when nothing else was scored
            if ctx.stats.timed_out && best.is_some() {
                break;
            }

            let improves = match best {
                None => true,
                Some((_, best_score)) if maximizing => score > best_score,
                Some((_, best_score)) => score < best_score,
            };
            if improves {
                best = Some((mv, score));
            }

            if self.config.use_pruning {
                if maximizing {
                    alpha = alpha.max(score);
                } else {
                    beta = beta.min(score);
                }
            }
        }

        ctx.stats.elapsed = start.elapsed();
        let decision = match best {
            Some((chosen, score)) => Decision::Move {
                chosen,
                state: state.with_move(chosen),
                score,
            },
            None => Decision::NoMove,
        };
        debug!(
            "{} plays {:?} after {:?}: {:?}",
            side,
            decision.chosen(),
            ctx.stats.elapsed,
            ctx.stats
        );
        (decision, ctx.stats)
    }
}
