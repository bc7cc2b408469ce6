//! Best-of-N parallel search.
//!
//! Runs one independent [`Mcts`] engine per worker on a dedicated thread
//! pool. Each engine gets its own board copy, tree and seeded random
//! source, so nothing is shared between threads. Once every engine has
//! finished, the shortest non-empty solution wins; ties go to the lowest
//! worker index, which keeps the merge deterministic.

use rayon::prelude::*;
use thiserror::Error;
use tracing::info;

use crate::board::{Board, Move};
use crate::config::{ConfigError, SolverConfig};
use crate::mcts::{Mcts, SearchStats};

#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Outcome of one worker.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub seed: u64,
    pub moves: Vec<Move>,
    pub stats: SearchStats,
}

/// Outcome of a parallel solve.
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Shortest solution found, empty if every worker came back empty.
    pub moves: Vec<Move>,
    /// Index of the worker that produced `moves`.
    pub winner: Option<usize>,
    /// Per-worker results, in worker order.
    pub workers: Vec<WorkerReport>,
}

impl SolveReport {
    pub fn is_solved(&self) -> bool {
        self.winner.is_some()
    }

    /// Seed of the winning worker.
    pub fn winning_seed(&self) -> Option<u64> {
        self.winner.map(|i| self.workers[i].seed)
    }

    pub fn total_iterations(&self) -> u64 {
        self.workers.iter().map(|w| w.stats.iterations).sum()
    }
}

/// Run a single engine to completion.
pub fn run_worker(board: &Board, seed: u64, config: &SolverConfig) -> WorkerReport {
    let mut mcts = Mcts::new(board, seed, config.search.clone());
    let moves = mcts.search();
    WorkerReport {
        seed,
        moves,
        stats: mcts.stats().clone(),
    }
}

/// Pick the shortest non-empty result, preferring earlier entries on ties.
pub fn select_best(results: &[WorkerReport]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, r) in results.iter().enumerate() {
        if r.moves.is_empty() {
            continue;
        }
        match best {
            Some(b) if results[b].moves.len() <= r.moves.len() => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Search `board` with `config.workers` engines in parallel.
pub fn solve(board: &Board, config: &SolverConfig) -> Result<SolveReport, SolveError> {
    config.validate()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|i| format!("mcts-worker-{i}"))
        .build()?;

    info!(
        workers = config.workers,
        time_limit_ms = config.search.time_limit.as_millis() as u64,
        width = board.width(),
        height = board.height(),
        "starting parallel search"
    );

    let workers: Vec<WorkerReport> = pool.install(|| {
        config
            .seeds
            .par_iter()
            .map(|&seed| run_worker(board, seed, config))
            .collect()
    });

    let winner = select_best(&workers);
    let moves = winner
        .map(|i| workers[i].moves.clone())
        .unwrap_or_default();

    match winner {
        Some(i) => info!(
            moves = moves.len(),
            seed = workers[i].seed,
            "parallel search finished"
        ),
        None => info!("parallel search finished without a solution"),
    }

    Ok(SolveReport {
        moves,
        winner,
        workers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(seed: u64, len: usize) -> WorkerReport {
        WorkerReport {
            seed,
            moves: vec![Move::new(0, 0); len],
            stats: SearchStats::default(),
        }
    }

    #[test]
    fn test_select_best_prefers_shortest() {
        let results = vec![report(0, 5), report(1, 3), report(2, 4)];
        assert_eq!(select_best(&results), Some(1));
    }

    #[test]
    fn test_select_best_skips_empty_results() {
        let results = vec![report(0, 0), report(1, 7), report(2, 0)];
        assert_eq!(select_best(&results), Some(1));
    }

    #[test]
    fn test_select_best_ties_go_to_first() {
        let results = vec![report(0, 6), report(1, 4), report(2, 4)];
        assert_eq!(select_best(&results), Some(1));
    }

    #[test]
    fn test_select_best_all_empty() {
        let results = vec![report(0, 0), report(1, 0)];
        assert_eq!(select_best(&results), None);
        assert_eq!(select_best(&[]), None);
    }

    #[test]
    fn test_solve_rejects_invalid_config() {
        let board: Board = "BB".parse().unwrap();
        let config = SolverConfig::new(2).with_seeds(vec![4, 4]);
        assert!(matches!(
            solve(&board, &config),
            Err(SolveError::Config(ConfigError::DuplicateSeed(4)))
        ));
    }
}
