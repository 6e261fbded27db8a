//! Remarks that accompany moves
//!
//! Purely presentational: a commentator sees the outcome of a decision but
//! never influences it.

use rand::{rngs::StdRng, seq::IndexedRandom, SeedableRng};

use crate::game::{Marker, Move, State};
use crate::scanner::count_open_sequences;
use crate::solver::SearchStats;

/// Everything a commentator may talk about after a decision
pub struct RemarkContext<'a> {
    /// The position before the move
    pub state: &'a State,
    pub chosen: Option<Move>,
    pub score: Option<i32>,
    pub stats: &'a SearchStats,
    pub side: Marker,
    pub k: usize,
    pub opponent: &'a str,
    pub opponent_remark: &'a str,
}

pub trait Commentator: Send {
    fn remark(&mut self, ctx: &RemarkContext<'_>) -> String;
}

/// Says nothing
#[derive(Copy, Clone, Default, Debug)]
pub struct Silent;

impl Commentator for Silent {
    fn remark(&mut self, _ctx: &RemarkContext<'_>) -> String {
        String::new()
    }
}

/// An excitable announcer that explains itself when asked
pub struct SportsCaster {
    rng: StdRng,
}

impl SportsCaster {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn explain(ctx: &RemarkContext<'_>) -> String {
        let chosen = match ctx.chosen {
            Some(chosen) => chosen,
            None => return "There was nothing left to explain, no move was possible.".to_string(),
        };
        let mut explanation = format!("Here's the breakdown of my move to {}:\n", chosen);
        explanation += &format!("- I evaluated {} board positions\n", ctx.stats.static_eval_count);
        explanation += &format!(
            "- Alpha-beta pruning made {} cutoffs across {} nodes\n",
            ctx.stats.alpha_beta_cutoff_count, ctx.stats.node_count
        );
        explanation += &format!(
            "- My cache stored {} results and answered {} lookups\n",
            ctx.stats.cache_entry_count, ctx.stats.cache_hit_count
        );
        explanation += &format!(
            "- I looked {} plies ahead in {:.4} seconds, all for {}-in-a-row!",
            ctx.stats.max_ply,
            ctx.stats.elapsed.as_secs_f64(),
            ctx.k
        );
        explanation
    }

    fn take_on_the_game(ctx: &RemarkContext<'_>) -> String {
        let board = ctx.state.board();
        let (x, o) = (board.marker_count(Marker::X), board.marker_count(Marker::O));
        let mut take = format!(
            "{} moves in: X has {} markers and O has {}, with {} cells still open.\n",
            x + o,
            x,
            o,
            board.empty_count()
        );

        if ctx.k > 1 {
            let near = ctx.k - 1;
            take += &format!(
                "- Open runs of {}: X {}, O {}\n",
                near,
                count_open_sequences(board, Marker::X, near, ctx.k),
                count_open_sequences(board, Marker::O, near, ctx.k)
            );
        }

        let mine = match (ctx.score, ctx.side) {
            (Some(score), Marker::X) => score,
            (Some(score), Marker::O) => -score,
            (None, _) => 0,
        };
        take += if mine > 5_000 {
            "- I can see the finish line from here!"
        } else if mine < -5_000 {
            "- Honestly? I'm in trouble."
        } else if mine > 0 {
            "- I like my chances."
        } else if mine < 0 {
            "- You've got the upper hand for now."
        } else {
            "- Dead even, anyone's game."
        };
        take
    }
}

impl Commentator for SportsCaster {
    fn remark(&mut self, ctx: &RemarkContext<'_>) -> String {
        let lowered = ctx.opponent_remark.to_lowercase();
        if lowered.contains("tell me how you did that") || lowered.contains("how did you do that") {
            return Self::explain(ctx);
        }
        if lowered.contains("take on the game so far") {
            return Self::take_on_the_game(ctx);
        }

        let chosen = match ctx.chosen {
            Some(chosen) => chosen,
            None => return "No moves left, the whistle blows!".to_string(),
        };
        let (side, row, col) = (ctx.side, chosen.row + 1, chosen.col + 1);

        if let Some(score) = ctx.score {
            let winning = match ctx.side {
                Marker::X => score > 5_000,
                Marker::O => score < -5_000,
            };
            if winning {
                return format!("{} smells victory at ({}, {})! {} had better pray!", side, row, col, ctx.opponent);
            }
        }

        let templates = [
            format!("And {} makes a strong move to row {}, column {}!", side, row, col),
            format!("Excellent positioning by {} at ({}, {})!", side, row, col),
            format!("{} stakes a claim on the board!", side),
            format!("What a play! {} moves to ({}, {})!", side, row, col),
            format!("{} is setting up for something big!", side),
            format!("The crowd goes wild as {} plays ({}, {})!", side, row, col),
        ];
        templates
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default()
    }
}
