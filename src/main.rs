use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use log::info;
use rayon::prelude::*;

use std::time::{Duration, Instant};

use kinarow_ai::commentary::SportsCaster;
use kinarow_ai::*;

mod display;
use display::*;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Preset {
    /// 3x3, three in a row
    Ttt,
    /// 7x7, five in a row, corners forbidden
    Fiar,
    /// 7x8, five in a row around an obstacle
    Cassini,
    /// Empty board sized by --rows/--cols, k from -k
    Custom,
}

/// Pits the K-in-a-Row agent against itself or a random player
#[derive(Parser, Debug)]
#[command(name = "kinarow", version)]
struct Args {
    #[arg(long, value_enum, default_value_t = Preset::Ttt)]
    game: Preset,

    /// Markers in a row needed to win (custom games)
    #[arg(short = 'k', default_value_t = 4)]
    k: usize,

    #[arg(long, default_value_t = 5)]
    rows: usize,

    #[arg(long, default_value_t = 5)]
    cols: usize,

    /// Number of games; more than one plays them in parallel and prints a summary
    #[arg(long, default_value_t = 1)]
    games: usize,

    #[arg(long, default_value_t = 3)]
    max_ply: u32,

    /// Seconds allowed per move
    #[arg(long, default_value_t = 1.0)]
    time: f64,

    #[arg(long)]
    no_pruning: bool,

    #[arg(long)]
    no_cache: bool,

    #[arg(long)]
    no_ordering: bool,

    /// Score positions by open runs instead of k-windows
    #[arg(long)]
    sequence_eval: bool,

    /// Let the agent play O against a random X
    #[arg(long)]
    random_opponent: bool,

    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Only print the result
    #[arg(short, long)]
    quiet: bool,
}

fn game_type(args: &Args) -> Result<GameType> {
    if !(args.time > 0.0 && args.time.is_finite()) {
        return Err(anyhow!("time per move must be a positive number of seconds, got {}", args.time));
    }
    let mut game = match args.game {
        Preset::Ttt => GameType::tic_tac_toe(),
        Preset::Fiar => GameType::five_in_a_row(),
        Preset::Cassini => GameType::cassini(),
        Preset::Custom => GameType::custom(args.k, args.rows, args.cols)?,
    };
    game.time_per_move = Duration::from_secs_f64(args.time);
    Ok(game)
}

fn search_config(args: &Args) -> SearchConfig {
    let config = SearchConfig::default()
        .with_pruning(!args.no_pruning)
        .with_transposition_cache(!args.no_cache)
        .with_move_ordering(!args.no_ordering)
        .with_max_ply(args.max_ply);
    if args.sequence_eval {
        config.with_evaluator(SequenceEvaluator)
    } else {
        config
    }
}

fn play_one(game: &GameType, config: &SearchConfig, args: &Args, index: u64, verbose: bool) -> GameRecord {
    let master = GameMaster::new(game.clone());
    let seed = args.seed.wrapping_add(index);
    let mut agent = Agent::new(config.clone()).with_commentator(SportsCaster::new(seed));

    if args.random_opponent {
        let mut random = RandomPlayer::new(seed);
        if verbose {
            print!("{}{}", random.introduce(), agent.introduce());
        }
        master.play(&mut random, &mut agent)
    } else {
        let mut twin = Agent::twin(config.clone()).with_commentator(SportsCaster::new(!seed));
        if verbose {
            print!("{}{}", agent.introduce(), twin.introduce());
        }
        master.play(&mut agent, &mut twin)
    }
}

fn describe(result: &GameResult) -> String {
    match result {
        GameResult::Win(marker) => format!("{} wins!", marker),
        GameResult::Draw => "Game over; it's a draw.".to_string(),
        GameResult::TurnLimit => "Turn limit reached; it's a draw.".to_string(),
        GameResult::Forfeit { loser, reason } => {
            format!("{} forfeits ({}), {} wins!", loser, reason, loser.opponent())
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let game = game_type(&args)?;
    let config = search_config(&args);
    info!("{} with {:?}", game.long_name, config);

    if args.games <= 1 {
        println!("Welcome to {}\n", game.long_name);
        let record = play_one(&game, &config, &args, 0, !args.quiet);

        if !args.quiet {
            println!();
            for entry in record.moves.iter() {
                println!("Move is by {} to {}", entry.side, entry.chosen);
                if !entry.utterance.is_empty() {
                    println!("{} says: {}", entry.side, entry.utterance);
                }
            }
            println!();
        }
        draw_board(record.final_state.board())?;
        println!("{}", describe(&record.result));
        return Ok(());
    }

    let progress = ProgressBar::new(args.games as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("Playing games: {bar:40.cyan/blue} {pos}/{len} ~{eta} remaining")
            .progress_chars("█▓▒░  "),
    );

    let start = Instant::now();
    let records: Vec<GameRecord> = (0..args.games as u64)
        .into_par_iter()
        .map(|index| {
            let record = play_one(&game, &config, &args, index, false);
            progress.inc(1);
            record
        })
        .collect();
    progress.finish();

    let count = |side: Marker| {
        records
            .iter()
            .filter(|record| record.result.winner() == Some(side))
            .count()
    };
    let forfeits = records
        .iter()
        .filter(|record| match record.result {
            GameResult::Forfeit { .. } => true,
            _ => false,
        })
        .count();
    let (x_wins, o_wins) = (count(Marker::X), count(Marker::O));

    let moves: Vec<&SearchStats> = records
        .iter()
        .flat_map(|record| record.moves.iter().map(|entry| &entry.stats))
        .collect();
    let mean_evals = moves.iter().map(|stats| stats.static_eval_count).sum::<usize>() as f64
        / moves.len().max(1) as f64;

    println!(
        "{} games in {}: X won {}, O won {}, {} drawn, {} forfeits",
        records.len(),
        HumanDuration(start.elapsed()),
        x_wins,
        o_wins,
        records.len() - x_wins - o_wins,
        forfeits
    );
    println!("Mean static evaluations per move: {:.1}", mean_evals);
    Ok(())
}
