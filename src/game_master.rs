//! Runs a game between two players, checking every move they hand back

use log::{info, warn};

use crate::agent::Player;
use crate::game::{GameType, Marker, Move, State};
use crate::scanner::{test_win, Outcome};
use crate::solver::{Decision, SearchStats};

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum GameResult {
    Win(Marker),
    Draw,
    /// The turn limit was reached without a winner
    TurnLimit,
    /// `loser` failed to prepare, returned an error or proposed an invalid move
    Forfeit { loser: Marker, reason: String },
}

impl GameResult {
    pub fn winner(&self) -> Option<Marker> {
        match self {
            GameResult::Win(marker) => Some(*marker),
            GameResult::Forfeit { loser, .. } => Some(loser.opponent()),
            GameResult::Draw | GameResult::TurnLimit => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MoveRecord {
    pub side: Marker,
    pub chosen: Move,
    pub utterance: String,
    pub stats: SearchStats,
}

#[derive(Clone, Debug)]
pub struct GameRecord {
    pub moves: Vec<MoveRecord>,
    pub final_state: State,
    pub result: GameResult,
}

pub struct GameMaster {
    game: GameType,
}

impl GameMaster {
    pub fn new(game: GameType) -> Self {
        Self { game }
    }

    /// Plays one game with `x` playing X and `o` playing O
    pub fn play(&self, x: &mut dyn Player, o: &mut dyn Player) -> GameRecord {
        let mut state = self.game.initial_state.clone();
        let mut moves = Vec::new();

        let (x_name, o_name) = (x.nickname().to_string(), o.nickname().to_string());
        info!("{} (X) vs {} (O) at {}", x_name, o_name, self.game.short_name);

        if let Err(err) = x.prepare(&self.game, Marker::X, &o_name) {
            return self.forfeit(state, moves, Marker::X, format!("failed to prepare: {:#}", err));
        }
        if let Err(err) = o.prepare(&self.game, Marker::O, &x_name) {
            return self.forfeit(state, moves, Marker::O, format!("failed to prepare: {:#}", err));
        }

        let mut remark = "The game is starting.".to_string();
        let mut turn_count = 0;
        loop {
            let side = state.whose_move();
            let time_limit = self.game.time_per_move;
            let result = match side {
                Marker::X => x.make_move(&state, &remark, time_limit),
                Marker::O => o.make_move(&state, &remark, time_limit),
            };

            let turn = match result {
                Ok(turn) => turn,
                Err(err) => return self.forfeit(state, moves, side, format!("{:#}", err)),
            };

            let (chosen, proposed) = match turn.decision {
                Decision::Move { chosen, state: proposed, .. } => (chosen, proposed),
                Decision::NoMove => {
                    info!("{} has no move, game drawn", side);
                    return self.finish(state, moves, GameResult::Draw);
                }
            };

            // never trust the player's own copy of the board
            let next = match state.apply(chosen) {
                Ok(next) => next,
                Err(err) => return self.forfeit(state, moves, side, format!("{:#}", err)),
            };
            if proposed != next {
                return self.forfeit(
                    state,
                    moves,
                    side,
                    format!("returned a board that does not match the move {}", chosen),
                );
            }

            info!("{} plays {}: {}", side, chosen, turn.utterance);
            moves.push(MoveRecord {
                side,
                chosen,
                utterance: turn.utterance.clone(),
                stats: turn.stats,
            });
            remark = turn.utterance;
            state = next;

            match test_win(&state, chosen, self.game.k) {
                Outcome::Win(marker) => return self.finish(state, moves, GameResult::Win(marker)),
                Outcome::Draw => return self.finish(state, moves, GameResult::Draw),
                Outcome::Ongoing => {}
            }

            turn_count += 1;
            if turn_count >= self.game.turn_limit {
                return self.finish(state, moves, GameResult::TurnLimit);
            }
        }
    }

    fn forfeit(&self, state: State, moves: Vec<MoveRecord>, loser: Marker, reason: String) -> GameRecord {
        warn!("{} forfeits: {}", loser, reason);
        self.finish(state, moves, GameResult::Forfeit { loser, reason })
    }

    fn finish(&self, state: State, moves: Vec<MoveRecord>, result: GameResult) -> GameRecord {
        info!("game over after {} moves: {:?}", moves.len(), result);
        GameRecord {
            moves,
            final_state: state.finish(),
            result,
        }
    }
}
