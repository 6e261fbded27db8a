//! Players the game master can drive

use anyhow::{anyhow, Result};
use log::debug;
use rand::{rngs::StdRng, seq::IndexedRandom, SeedableRng};

use std::time::Duration;

use crate::commentary::{Commentator, RemarkContext, SportsCaster};
use crate::game::{GameType, Marker, State};
use crate::moves::legal_moves;
use crate::solver::{Decision, SearchConfig, SearchStats, Solver};
use crate::transposition_table::ZobristTable;

/// What a player hands back for one turn
#[derive(Clone, Debug)]
pub struct Turn {
    pub decision: Decision,
    pub stats: SearchStats,
    pub utterance: String,
}

/// The per-game contract between a player and the game master
pub trait Player {
    fn nickname(&self) -> &str;

    fn introduce(&self) -> String;

    /// One-time setup before the first move of a game
    fn prepare(&mut self, game: &GameType, side: Marker, opponent: &str) -> Result<()>;

    fn make_move(&mut self, state: &State, remark: &str, time_limit: Duration) -> Result<Turn>;
}

struct Prepared {
    game: GameType,
    zobrist: ZobristTable,
    side: Marker,
    opponent: String,
}

/// A minimax-searching player
pub struct Agent {
    nickname: String,
    long_name: String,
    twin: bool,
    config: SearchConfig,
    commentator: Box<dyn Commentator>,
    prepared: Option<Prepared>,
}

impl Agent {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            nickname: "Tactician".to_string(),
            long_name: "The Tireless Tactician".to_string(),
            twin: false,
            config,
            commentator: Box::new(SportsCaster::new(0)),
            prepared: None,
        }
    }

    /// A second agent with its own name, for self-play
    pub fn twin(config: SearchConfig) -> Self {
        Self {
            nickname: "Tactician2".to_string(),
            long_name: "The Tireless Tactician Junior".to_string(),
            twin: true,
            config,
            commentator: Box::new(SportsCaster::new(1)),
            prepared: None,
        }
    }

    pub fn with_commentator<C: Commentator + 'static>(mut self, commentator: C) -> Self {
        self.commentator = Box::new(commentator);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn side(&self) -> Option<Marker> {
        self.prepared.as_ref().map(|prepared| prepared.side)
    }

    /// Chooses a move under an explicit configuration.
    ///
    /// The time budget is `time_limit`, whatever `config.time_limit` says.
    /// Running out of moves is reported as [`Decision::NoMove`], not as an error.
    pub fn make_move_with(
        &mut self,
        state: &State,
        remark: &str,
        time_limit: Duration,
        config: &SearchConfig,
    ) -> Result<Turn> {
        let prepared = self
            .prepared
            .as_ref()
            .ok_or_else(|| anyhow!("{} has not been prepared for a game", self.nickname))?;

        let config = config.clone().with_time_limit(time_limit);
        let solver = Solver::new(&prepared.game, &prepared.zobrist, &config);
        let (decision, stats) = solver.decide(state);
        debug!("{} decided {:?}", self.nickname, decision.chosen());

        let utterance = self.commentator.remark(&RemarkContext {
            state,
            chosen: decision.chosen(),
            score: decision.score(),
            stats: &stats,
            side: state.whose_move(),
            k: prepared.game.k,
            opponent: &prepared.opponent,
            opponent_remark: remark,
        });

        Ok(Turn {
            decision,
            stats,
            utterance,
        })
    }
}

impl Player for Agent {
    fn nickname(&self) -> &str {
        &self.nickname
    }

    fn introduce(&self) -> String {
        let mut intro = format!("Greetings! I am {}.\n", self.long_name);
        intro += "I look ahead with minimax search and alpha-beta pruning, and I never forget a position I've scored.\n";
        if self.twin {
            intro += "My sibling taught me everything, so expect an equally stubborn game!\n";
        }
        intro
    }

    fn prepare(&mut self, game: &GameType, side: Marker, opponent: &str) -> Result<()> {
        if game.k == 0 || game.k > game.n.max(game.m) {
            return Err(anyhow!(
                "cannot play {}-in-a-row on a {}x{} board",
                game.k,
                game.n,
                game.m
            ));
        }
        self.prepared = Some(Prepared {
            game: game.clone(),
            zobrist: ZobristTable::for_game(game),
            side,
            opponent: opponent.to_string(),
        });
        Ok(())
    }

    fn make_move(&mut self, state: &State, remark: &str, time_limit: Duration) -> Result<Turn> {
        let config = self.config.clone();
        self.make_move_with(state, remark, time_limit, &config)
    }
}

/// Fills a uniformly random empty cell
pub struct RandomPlayer {
    nickname: String,
    rng: StdRng,
}

impl RandomPlayer {
    pub fn new(seed: u64) -> Self {
        Self {
            nickname: "Randy".to_string(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Player for RandomPlayer {
    fn nickname(&self) -> &str {
        &self.nickname
    }

    fn introduce(&self) -> String {
        "I'm Randy. I don't plan, I just play.\n".to_string()
    }

    fn prepare(&mut self, _game: &GameType, _side: Marker, _opponent: &str) -> Result<()> {
        Ok(())
    }

    fn make_move(&mut self, state: &State, _remark: &str, _time_limit: Duration) -> Result<Turn> {
        let decision = match legal_moves(state).choose(&mut self.rng) {
            Some(&chosen) => Decision::Move {
                chosen,
                state: state.with_move(chosen),
                score: 0,
            },
            None => Decision::NoMove,
        };
        let utterance = match decision.chosen() {
            Some(chosen) => format!("I'll just go here: {}.", chosen),
            None => "Nowhere left to go.".to_string(),
        };
        Ok(Turn {
            decision,
            stats: SearchStats::default(),
            utterance,
        })
    }
}
