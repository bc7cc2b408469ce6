//! Former-MCTS: command-line front end.
//!
//! ## Usage
//!
//! - `former-mcts solve board.txt` - Search for a short solution
//! - `former-mcts playout board.txt` - Random playout statistics
//! - `former-mcts generate -W 7 -H 9` - Print a random board file
//! - `former-mcts show board.txt` - Print a board and its blob count

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use former_mcts::board::{Board, Move};
use former_mcts::config::{SearchConfig, SolverConfig};
use former_mcts::constants::{
    EXPLORATION_WEIGHT, SCORE_SCALE, SELECTION_THRESHOLD, TIME_LIMIT, VARIANCE_SMOOTHING, WORKERS,
};
use former_mcts::playout::benchmark;
use former_mcts::score::ScoreFunction;
use former_mcts::solver::solve;

/// Former-MCTS: solve block-clearing puzzles with SP-MCTS
#[derive(Parser)]
#[command(name = "former-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Scoring {
    Linear,
    Clamped,
    Exponential,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for the shortest solution with parallel SP-MCTS
    Solve {
        /// Board file
        board: PathBuf,
        /// Number of independent searches
        #[arg(short, long, default_value_t = WORKERS)]
        workers: usize,
        /// Time budget per search, in seconds
        #[arg(short, long, default_value_t = TIME_LIMIT.as_secs_f64())]
        time_limit: f64,
        /// Stop each search after this many iterations
        #[arg(short, long)]
        iterations: Option<u64>,
        /// Stop each search once its tree holds this many nodes
        #[arg(long)]
        max_nodes: Option<usize>,
        /// Parent visits before UCT replaces random selection
        #[arg(long, default_value_t = SELECTION_THRESHOLD)]
        threshold: u32,
        /// Exploration weight C
        #[arg(short = 'c', long, default_value_t = EXPLORATION_WEIGHT)]
        exploration: f64,
        /// Variance smoothing D
        #[arg(short = 'd', long, default_value_t = VARIANCE_SMOOTHING)]
        variance_smoothing: f64,
        /// Seed of the first worker; workers use consecutive seeds
        #[arg(long, default_value_t = 0)]
        seed_base: u64,
        #[arg(long, value_enum, default_value_t = Scoring::Linear)]
        scoring: Scoring,
        /// Print the board after every move of the solution
        #[arg(long)]
        replay: bool,
    },
    /// Run random playouts and report move-count statistics
    Playout {
        board: PathBuf,
        #[arg(short, long, default_value_t = 1000)]
        games: usize,
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
    },
    /// Print a random board file
    Generate {
        #[arg(short = 'W', long, default_value_t = 7)]
        width: usize,
        #[arg(short = 'H', long, default_value_t = 9)]
        height: usize,
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Print a board
    Show { board: PathBuf },
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load(path: &Path) -> Result<Board> {
    Board::from_file(path).with_context(|| format!("could not load {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Solve {
            board,
            workers,
            time_limit,
            iterations,
            max_nodes,
            threshold,
            exploration,
            variance_smoothing,
            seed_base,
            scoring,
            replay,
        } => {
            let board = load(&board)?;
            let time_limit = Duration::try_from_secs_f64(time_limit)
                .context("time limit must be a non-negative number of seconds")?;
            let scoring = match scoring {
                Scoring::Linear => ScoreFunction::default(),
                Scoring::Clamped => ScoreFunction::clamped(),
                Scoring::Exponential => ScoreFunction::Exponential {
                    scale: SCORE_SCALE,
                },
            };

            let mut search = SearchConfig::default()
                .with_selection_threshold(threshold)
                .with_exploration(exploration)
                .with_variance_smoothing(variance_smoothing)
                .with_time_limit(time_limit)
                .with_scoring(scoring);
            search.max_iterations = iterations;
            search.max_nodes = max_nodes;

            let config = SolverConfig::new(workers)
                .with_seed_base(seed_base)
                .with_search(search);
            run_solve(&board, &config, replay)
        }
        Commands::Playout { board, games, seed } => {
            let board = load(&board)?;
            let mut rng = fastrand::Rng::with_seed(seed);
            let Some(summary) = benchmark(&board, games, &mut rng) else {
                bail!("at least one game is required");
            };
            println!(
                "Average time: {:.2} ms",
                summary.mean_time.as_secs_f64() * 1000.0
            );
            println!("Min moves: {}", summary.min_moves);
            println!("Average moves: {:.2}", summary.mean_moves);
            println!("Max moves: {}", summary.max_moves);
            Ok(())
        }
        Commands::Generate {
            width,
            height,
            seed,
        } => {
            let mut rng = match seed {
                Some(s) => fastrand::Rng::with_seed(s),
                None => fastrand::Rng::new(),
            };
            print!("{}", Board::random(width, height, &mut rng));
            Ok(())
        }
        Commands::Show { board } => {
            let board = load(&board)?;
            print!("{board}");
            println!(
                "{}x{} board, {} blobs",
                board.width(),
                board.height(),
                board.blobs().len()
            );
            Ok(())
        }
    }
}

fn run_solve(board: &Board, config: &SolverConfig, replay: bool) -> Result<()> {
    if board.is_terminal() {
        println!("Board is already clear");
        return Ok(());
    }

    let report = solve(board, config)?;
    info!(
        iterations = report.total_iterations(),
        seed = ?report.winning_seed(),
        "search complete"
    );

    if !report.is_solved() {
        println!("No solution found within the time limit");
        return Ok(());
    }

    let listing: Vec<String> = report.moves.iter().map(Move::to_string).collect();
    println!("Best solution: [{}]", listing.join(", "));
    println!("Number of moves: {}", report.moves.len());

    if replay {
        let mut current = board.clone();
        println!("{current}");
        for (i, &mv) in report.moves.iter().enumerate() {
            current.play(mv);
            println!("Move {}: {mv}\n{current}", i + 1);
        }
        if !current.is_terminal() {
            bail!("solution does not clear the board");
        }
    }
    Ok(())
}
