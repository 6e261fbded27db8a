#[cfg(test)]
pub mod test {
    use anyhow::{anyhow, Result};
    use rand::{rngs::StdRng, seq::IndexedRandom, SeedableRng};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use crate::evaluator::HEURISTIC_LIMIT;
    use crate::moves::legal_moves;
    use crate::scanner::{is_terminal, winner};
    use crate::*;

    fn exhaustive(pruning: bool) -> SearchConfig {
        SearchConfig::default()
            .with_pruning(pruning)
            .with_transposition_cache(false)
            .with_time_limit(Duration::from_secs(60))
    }

    // every position reached by random play from the game's start until it ends
    fn random_positions(game: &GameType, seed: u64) -> Vec<State> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = game.initial_state.clone();
        let mut positions = vec![state.clone()];
        while !is_terminal(state.board(), game.k) {
            let moves = legal_moves(&state);
            let mv = match moves.choose(&mut rng) {
                Some(&mv) => mv,
                None => break,
            };
            state = state.with_move(mv);
            positions.push(state.clone());
        }
        positions
    }

    #[test]
    pub fn lines_in_every_direction() -> Result<()> {
        let row = Board::from_rows(&["   ", "OOO", "X X"])?;
        assert!(has_win(&row, Marker::O, 3));
        assert!(!has_win(&row, Marker::X, 3));

        let column = Board::from_rows(&[" X ", " X ", "OXO"])?;
        assert!(has_win(&column, Marker::X, 3));

        let diagonal = Board::from_rows(&["X  ", " X ", "  X"])?;
        assert!(has_win(&diagonal, Marker::X, 3));
        assert!(!has_win(&diagonal, Marker::O, 3));

        let anti_diagonal = Board::from_rows(&["  O", " O ", "O  "])?;
        assert!(has_win(&anti_diagonal, Marker::O, 3));

        // a line is only as long as its unbroken part
        let broken = Board::from_rows(&["XX X"])?;
        assert!(!has_win(&broken, Marker::X, 3));
        assert!(has_win(&broken, Marker::X, 2));
        Ok(())
    }

    #[test]
    pub fn forbidden_cells_never_complete_a_line() -> Result<()> {
        let board = Board::from_rows(&["XX-XX", "     ", "O-O-O"])?;
        assert!(!has_win(&board, Marker::X, 3));
        assert!(!has_win(&board, Marker::O, 2));

        let game = GameType::five_in_a_row();
        let zobrist = ZobristTable::for_game(&game);
        let config = SearchConfig::default().with_max_ply(2);
        let (decision, _) = Solver::new(&game, &zobrist, &config).decide(&game.initial_state);
        let chosen = decision.chosen().ok_or_else(|| anyhow!("expected a move"))?;
        assert_eq!(game.initial_state.board().get(chosen.row, chosen.col), Cell::Empty);
        Ok(())
    }

    #[test]
    pub fn win_scores_only_for_won_positions() -> Result<()> {
        let game = GameType::custom(3, 4, 4)?;
        for seed in 0..20 {
            for state in random_positions(&game, seed) {
                let score = LineEvaluator.evaluate(state.board(), game.k);
                match winner(state.board(), game.k) {
                    Some(Marker::X) => assert_eq!(score, WIN_SCORE),
                    Some(Marker::O) => assert_eq!(score, -WIN_SCORE),
                    None => assert!(score.abs() <= HEURISTIC_LIMIT, "{} scored {}", state.board(), score),
                }

                let sequences = SequenceEvaluator.evaluate(state.board(), game.k);
                if winner(state.board(), game.k).is_none() {
                    assert!(sequences.abs() <= HEURISTIC_LIMIT);
                }
            }
        }
        assert!(HEURISTIC_LIMIT + ((MAX_DIMENSION * MAX_DIMENSION) as i32) < WIN_SCORE);
        Ok(())
    }

    #[test]
    pub fn open_sequences() -> Result<()> {
        // an edge on one side, room on the other
        let board = Board::from_rows(&["XX   "])?;
        assert_eq!(count_open_sequences(&board, Marker::X, 2, 3), 1);
        assert_eq!(count_open_sequences(&board, Marker::X, 1, 3), 0);

        let board = Board::from_rows(&["OXX  "])?;
        assert_eq!(count_open_sequences(&board, Marker::X, 2, 4), 1);

        // not enough room left to ever reach four
        let board = Board::from_rows(&["OXX O"])?;
        assert_eq!(count_open_sequences(&board, Marker::X, 2, 4), 0);

        let board = Board::from_rows(&["-XX- "])?;
        assert_eq!(count_open_sequences(&board, Marker::X, 2, 3), 0);
        Ok(())
    }

    #[test]
    pub fn pruning_never_changes_the_decision() -> Result<()> {
        let game = GameType::tic_tac_toe();
        let zobrist = ZobristTable::for_game(&game);

        for &ordered in [false, true].iter() {
            let minimax = exhaustive(false).with_move_ordering(ordered);
            let alpha_beta = exhaustive(true).with_move_ordering(ordered);
            let mut cutoffs = 0;

            for seed in 0..6 {
                // skip the empty board, searched on its own below
                for state in random_positions(&game, seed).into_iter().skip(1) {
                    let (expected, full_stats) = Solver::new(&game, &zobrist, &minimax).decide(&state);
                    let (pruned, pruned_stats) = Solver::new(&game, &zobrist, &alpha_beta).decide(&state);

                    assert_eq!(pruned.chosen(), expected.chosen(), "{}", state.board());
                    assert_eq!(pruned.score(), expected.score(), "{}", state.board());
                    assert!(pruned_stats.node_count <= full_stats.node_count);
                    assert_eq!(full_stats.alpha_beta_cutoff_count, 0);
                    cutoffs += pruned_stats.alpha_beta_cutoff_count;
                }
            }
            assert!(cutoffs > 0);
        }
        Ok(())
    }

    #[test]
    pub fn cache_never_changes_the_score() -> Result<()> {
        let game = GameType::custom(3, 4, 4)?;
        let zobrist = ZobristTable::for_game(&game);
        let base = SearchConfig::default()
            .with_max_ply(4)
            .with_exhaustive_cells(0)
            .with_time_limit(Duration::from_secs(60));

        for &pruning in [false, true].iter() {
            let uncached = base.clone().with_pruning(pruning).with_transposition_cache(false);
            let cached = base.clone().with_pruning(pruning).with_transposition_cache(true);

            for seed in 0..4 {
                for state in random_positions(&game, seed).into_iter().take(5) {
                    let (expected, plain) = Solver::new(&game, &zobrist, &uncached).decide(&state);
                    let (decision, stats) = Solver::new(&game, &zobrist, &cached).decide(&state);

                    assert_eq!(decision.score(), expected.score(), "{}", state.board());
                    assert_eq!(decision.chosen(), expected.chosen(), "{}", state.board());
                    assert_eq!(plain.cache_entry_count, 0);
                    assert_eq!(plain.cache_hit_count, 0);
                    if expected.chosen().is_some() {
                        assert!(stats.cache_entry_count > 0);
                    }
                }
            }
        }
        Ok(())
    }

    #[test]
    pub fn counters_track_cutoffs_and_cache_hits() -> Result<()> {
        let game = GameType::tic_tac_toe();
        let zobrist = ZobristTable::for_game(&game);
        let config = SearchConfig::default().with_time_limit(Duration::from_secs(60));

        let (decision, stats) = Solver::new(&game, &zobrist, &config).decide(&game.initial_state);
        assert_eq!(decision.score(), Some(0));
        assert!(stats.alpha_beta_cutoff_count > 0);
        assert!(stats.cache_hit_count > 0);
        assert!(stats.cache_entry_count > 0);
        assert!(stats.static_eval_count > 0);
        assert!(stats.static_eval_count <= stats.node_count);

        let plain = config.with_pruning(false).with_transposition_cache(false);
        let (_, plain_stats) = Solver::new(&game, &zobrist, &plain).decide(&game.initial_state);
        assert_eq!(plain_stats.alpha_beta_cutoff_count, 0);
        assert_eq!(plain_stats.cache_hit_count, 0);
        assert!(plain_stats.node_count > stats.node_count);
        Ok(())
    }

    #[test]
    pub fn zobrist_hash_ignores_move_order() -> Result<()> {
        let game = GameType::custom(4, 5, 5)?;
        let zobrist = ZobristTable::for_game(&game);
        let start = game.initial_state.clone();

        let a = start
            .with_move(Move::new(0, 0))
            .with_move(Move::new(1, 1))
            .with_move(Move::new(2, 2));
        let b = start
            .with_move(Move::new(2, 2))
            .with_move(Move::new(1, 1))
            .with_move(Move::new(0, 0));
        assert_eq!(a.board(), b.board());
        assert_eq!(zobrist.hash(a.board()), zobrist.hash(b.board()));

        // swapping who owns a cell changes the hash
        let c = start
            .with_move(Move::new(1, 1))
            .with_move(Move::new(0, 0))
            .with_move(Move::new(2, 2));
        assert_ne!(zobrist.hash(a.board()), zobrist.hash(c.board()));

        // incremental updates agree with hashing from scratch
        let mut hash = zobrist.hash(start.board());
        let mut state = start;
        for &mv in [Move::new(3, 1), Move::new(4, 4), Move::new(0, 2)].iter() {
            hash = zobrist.update(hash, mv, state.whose_move());
            state = state.with_move(mv);
            assert_eq!(hash, zobrist.hash(state.board()));
        }

        // the same dimensions always give the same keys
        assert_eq!(ZobristTable::for_game(&game).hash(state.board()), hash);
        Ok(())
    }

    #[test]
    pub fn slow_evaluator_respects_time_limit() -> Result<()> {
        let game = GameType::custom(4, 5, 5)?;
        let zobrist = ZobristTable::for_game(&game);
        let delay = Duration::from_millis(10);
        let time_limit = Duration::from_millis(300);

        let config = SearchConfig::default()
            .with_max_ply(4)
            .with_exhaustive_cells(0)
            .with_time_limit(time_limit)
            .with_evaluator(move |state: &State, game: &GameType| -> Result<i32> {
                std::thread::sleep(delay);
                Ok(LineEvaluator.evaluate(state.board(), game.k))
            });

        let start_time = Instant::now();
        let (decision, stats) = Solver::new(&game, &zobrist, &config).decide(&game.initial_state);
        let elapsed = start_time.elapsed();

        println!(
            "Slow evaluator\n Time: {:.6}s, No. of evaluations: {}, timed out: {}",
            elapsed.as_secs_f64(),
            stats.static_eval_count,
            stats.timed_out
        );
        assert!(decision.chosen().is_some());
        assert!(stats.timed_out);
        assert!(elapsed < time_limit * 2, "took {:?}", elapsed);
        Ok(())
    }

    #[test]
    pub fn cut_short_candidates_do_not_replace_searched_ones() -> Result<()> {
        let game = GameType::custom(4, 4, 4)?;
        let zobrist = ZobristTable::for_game(&game);
        let calls = AtomicUsize::new(0);

        // X at (0, 1) looks great until O answers at (3, 3), the last reply searched
        let config = SearchConfig::default()
            .with_max_ply(2)
            .with_exhaustive_cells(0)
            .with_pruning(false)
            .with_transposition_cache(false)
            .with_move_ordering(false)
            .with_time_limit(Duration::from_millis(375))
            .with_evaluator(move |state: &State, _: &GameType| -> Result<i32> {
                // the 15 replies to the first candidate are scored at once
                if calls.fetch_add(1, Ordering::SeqCst) >= 15 {
                    std::thread::sleep(Duration::from_millis(200));
                }
                let board = state.board();
                if board.get(0, 1) == Cell::Taken(Marker::X) && board.get(3, 3) != Cell::Taken(Marker::O) {
                    Ok(100)
                } else if board.get(0, 1) == Cell::Taken(Marker::X) {
                    Ok(-100)
                } else {
                    Ok(0)
                }
            });

        let (decision, stats) = Solver::new(&game, &zobrist, &config).decide(&game.initial_state);
        assert!(stats.timed_out);
        assert_eq!(decision.chosen(), Some(Move::new(0, 0)));
        assert_eq!(decision.score(), Some(0));
        Ok(())
    }

    #[test]
    pub fn full_search() -> Result<()> {
        let game = GameType::tic_tac_toe();
        let zobrist = ZobristTable::for_game(&game);
        let config = exhaustive(false).with_move_ordering(false).with_max_ply(9);

        let start_time = Instant::now();
        let (decision, stats) = Solver::new(&game, &zobrist, &config).decide(&game.initial_state);
        let time = start_time.elapsed();

        println!(
            "Full game search\n Time: {:.6}s, No. of positions: {}, kpos/s: {}",
            time.as_secs_f64(),
            stats.node_count,
            stats.node_count as f64 / (1000.0 * time.as_secs_f64())
        );
        // every opening draws, so the first corner is kept
        assert_eq!(decision.chosen(), Some(Move::new(0, 0)));
        assert_eq!(decision.score(), Some(0));
        assert_eq!(stats.max_ply, 9);
        assert!(!stats.timed_out);
        Ok(())
    }

    #[test]
    pub fn takes_the_immediate_win() -> Result<()> {
        let game = GameType::from_rows(3, &["XX ", " O ", "  O"], Marker::X)?;
        let zobrist = ZobristTable::for_game(&game);

        for &pruning in [false, true].iter() {
            let config = SearchConfig::default().with_pruning(pruning);
            let (decision, _) = Solver::new(&game, &zobrist, &config).decide(&game.initial_state);

            assert_eq!(decision.chosen(), Some(Move::new(0, 2)));
            assert_eq!(decision.score(), Some(WIN_SCORE - 1));
            match decision {
                Decision::Move { state, .. } => {
                    assert_eq!(state.whose_move(), Marker::O);
                    assert_eq!(test_win(&state, Move::new(0, 2), game.k), Outcome::Win(Marker::X));
                }
                Decision::NoMove => return Err(anyhow!("expected a move")),
            }
        }
        Ok(())
    }

    #[test]
    pub fn blocks_the_opponent() -> Result<()> {
        let game = GameType::from_rows(3, &["XX ", " O ", "   "], Marker::O)?;
        let zobrist = ZobristTable::for_game(&game);
        let (decision, _) = Solver::new(&game, &zobrist, &SearchConfig::default()).decide(&game.initial_state);

        assert_eq!(decision.chosen(), Some(Move::new(0, 2)));
        Ok(())
    }

    #[test]
    pub fn no_move_when_nothing_is_left() -> Result<()> {
        let game = GameType::from_rows(3, &["XOX", "XOO", "OXX"], Marker::O)?;
        let zobrist = ZobristTable::for_game(&game);
        let solver_config = SearchConfig::default();
        let solver = Solver::new(&game, &zobrist, &solver_config);

        let (decision, stats) = solver.decide(&game.initial_state);
        assert_eq!(decision, Decision::NoMove);
        assert_eq!(stats.node_count, 0);

        let open = GameType::tic_tac_toe();
        let finished = open.initial_state.clone().finish();
        let (decision, _) = Solver::new(&open, &zobrist, &solver_config).decide(&finished);
        assert_eq!(decision.chosen(), None);
        Ok(())
    }

    #[test]
    pub fn parse_errors() -> Result<()> {
        assert!(Board::from_rows(&["XX", "X"]).is_err());
        assert!(Board::from_rows(&["XZ"]).is_err());
        assert!(Board::from_rows::<&str>(&[]).is_err());
        assert!(Board::from_rows(&[""]).is_err());

        let too_wide = "-".repeat(MAX_DIMENSION + 1);
        assert!(Board::from_rows(&[too_wide]).is_err());

        assert!(GameType::custom(4, 3, 3).is_err());
        assert!(GameType::custom(0, 3, 3).is_err());
        assert!(GameType::custom(3, 0, 3).is_err());
        assert!(GameType::custom(3, MAX_DIMENSION + 1, 3).is_err());

        let board = Board::from_rows(&["x.o", "#- ", "   "])?;
        assert_eq!(board.get(0, 0), Cell::Taken(Marker::X));
        assert_eq!(board.get(0, 1), Cell::Empty);
        assert_eq!(board.get(1, 0), Cell::Forbidden);
        assert_eq!(board.to_string(), "X O\n-- \n   ");
        Ok(())
    }

    #[test]
    pub fn invalid_moves_are_rejected() -> Result<()> {
        let game = GameType::from_rows(3, &["X- ", "   ", "   "], Marker::O)?;
        let state = game.initial_state.clone();

        assert!(state.apply(Move::new(0, 0)).is_err());
        assert!(state.apply(Move::new(0, 1)).is_err());
        assert!(state.apply(Move::new(3, 0)).is_err());
        assert!(state.apply(Move::new(0, 3)).is_err());
        assert!(state.clone().finish().apply(Move::new(2, 2)).is_err());
        assert_eq!(state, game.initial_state);

        let next = state.apply(Move::new(2, 2))?;
        assert_eq!(next.board().get(2, 2), Cell::Taken(Marker::O));
        assert_eq!(next.whose_move(), Marker::X);
        assert_eq!(next.marker_count(Marker::O), 1);
        Ok(())
    }

    #[test]
    pub fn win_and_draw_detection() -> Result<()> {
        let won = GameType::from_rows(3, &["XXX", "OO ", "   "], Marker::O)?;
        assert_eq!(test_win(&won.initial_state, Move::new(0, 1), 3), Outcome::Win(Marker::X));
        // only lines through the last move count
        assert_eq!(test_win(&won.initial_state, Move::new(1, 0), 3), Outcome::Ongoing);

        let drawn = GameType::from_rows(3, &["XOX", "XOO", "OXX"], Marker::O)?;
        assert!(drawn.initial_state.is_full());
        assert_eq!(test_win(&drawn.initial_state, Move::new(2, 2), 3), Outcome::Draw);

        let open = GameType::from_rows(3, &["X  ", "   ", "   "], Marker::O)?;
        assert_eq!(test_win(&open.initial_state, Move::new(0, 0), 3), Outcome::Ongoing);

        // (0, 3) would wrap onto (1, 0) if read as a flat index
        let wrapped = GameType::from_rows(3, &["   ", "X X", "OXO"], Marker::O)?;
        assert_eq!(test_win(&wrapped.initial_state, Move::new(0, 3), 3), Outcome::Ongoing);
        assert_eq!(test_win(&wrapped.initial_state, Move::new(5, 5), 3), Outcome::Ongoing);
        assert_eq!(test_win(&drawn.initial_state, Move::new(3, 0), 3), Outcome::Draw);
        Ok(())
    }

    #[test]
    pub fn failing_evaluator_falls_back() -> Result<()> {
        let game = GameType::from_rows(3, &["    ", " X  ", "  O ", "    "], Marker::X)?;
        let zobrist = ZobristTable::for_game(&game);
        let built_in = SearchConfig::default().with_max_ply(2);
        let failing = built_in
            .clone()
            .with_evaluator(|_: &State, _: &GameType| -> Result<i32> { Err(anyhow!("no opinion")) });

        let (expected, expected_stats) = Solver::new(&game, &zobrist, &built_in).decide(&game.initial_state);
        let (decision, stats) = Solver::new(&game, &zobrist, &failing).decide(&game.initial_state);

        assert_eq!(decision, expected);
        assert_eq!(stats.static_eval_count, expected_stats.static_eval_count);
        assert!(stats.static_eval_count > 0);
        Ok(())
    }

    #[test]
    pub fn decisions_are_deterministic() -> Result<()> {
        let game = GameType::cassini();
        let zobrist = ZobristTable::for_game(&game);
        let config = SearchConfig::default().with_max_ply(2).with_time_limit(Duration::from_secs(30));

        let (first, _) = Solver::new(&game, &zobrist, &config).decide(&game.initial_state);
        let (second, _) = Solver::new(&game, &zobrist, &config).decide(&game.initial_state);
        assert_eq!(first, second);

        let chosen = first.chosen().ok_or_else(|| anyhow!("expected a move"))?;
        assert_eq!(game.initial_state.board().get(chosen.row, chosen.col), Cell::Empty);
        Ok(())
    }

    #[test]
    pub fn agents_draw_tic_tac_toe() -> Result<()> {
        let master = GameMaster::new(GameType::tic_tac_toe());
        let mut x = Agent::new(SearchConfig::default());
        let mut o = Agent::twin(SearchConfig::default());

        let record = master.play(&mut x, &mut o);
        assert_eq!(record.result, GameResult::Draw);
        assert_eq!(record.moves.len(), 9);
        assert!(record.final_state.is_finished());
        assert_eq!(x.side(), Some(Marker::X));
        assert_eq!(o.side(), Some(Marker::O));
        Ok(())
    }

    #[test]
    pub fn random_player_loses_or_draws() -> Result<()> {
        let master = GameMaster::new(GameType::tic_tac_toe());
        for seed in 0..5 {
            let mut random = RandomPlayer::new(seed);
            let mut agent = Agent::new(SearchConfig::default());

            let record = master.play(&mut random, &mut agent);
            match &record.result {
                GameResult::Forfeit { loser, reason } => {
                    return Err(anyhow!("{} forfeited: {}", loser, reason));
                }
                result => assert_ne!(result.winner(), Some(Marker::X)),
            }
            for entry in record.moves.iter().filter(|entry| entry.side == Marker::X) {
                assert_eq!(record.final_state.board().get(entry.chosen.row, entry.chosen.col), Cell::Taken(Marker::X));
            }
        }
        Ok(())
    }

    #[test]
    pub fn agent_explains_itself() -> Result<()> {
        let game = GameType::tic_tac_toe();
        let mut agent = Agent::new(SearchConfig::default());
        assert!(agent
            .make_move(&game.initial_state, "", game.time_per_move)
            .is_err());

        agent.prepare(&game, Marker::X, "Randy")?;
        assert!(agent.introduce().contains("Tactician"));

        let turn = agent.make_move(&game.initial_state, "Tell me how you did that", game.time_per_move)?;
        assert!(turn.decision.chosen().is_some());
        assert!(turn.utterance.contains("evaluated"), "{}", turn.utterance);
        assert_eq!(turn.stats.max_ply, 9);

        // the commentator never changes the move
        let mut quiet = Agent::new(SearchConfig::default()).with_commentator(commentary::Silent);
        quiet.prepare(&game, Marker::X, "Randy")?;
        let silent = quiet.make_move(&game.initial_state, "", game.time_per_move)?;
        assert_eq!(silent.decision, turn.decision);
        assert!(silent.utterance.is_empty());
        Ok(())
    }

    #[test]
    pub fn unusable_game_fails_to_prepare() -> Result<()> {
        let mut game = GameType::tic_tac_toe();
        game.k = 4;
        let mut agent = Agent::new(SearchConfig::default());
        assert!(agent.prepare(&game, Marker::X, "Randy").is_err());

        let master = GameMaster::new(game);
        let record = master.play(&mut agent, &mut RandomPlayer::new(0));
        assert_eq!(record.result.winner(), Some(Marker::O));
        assert!(record.moves.is_empty());
        Ok(())
    }
}
