//! Random playouts (board simulation to completion).
//!
//! A playout clicks uniformly random non-empty cells until the board is
//! clear. The number of clicks is the estimate the tree search feeds on.
//! Randomness always comes from an explicit [`fastrand::Rng`] owned by the
//! caller, so playouts are reproducible per seed and safe to run on many
//! threads at once.

use std::time::{Duration, Instant};

use crate::board::Board;

/// Play random clicks on `board` until it is terminal.
///
/// Returns the number of clicks made. Every click removes at least one
/// cell, so the count never exceeds the board's cell count; it is zero only
/// when the board starts out clear.
pub fn random_playout(board: &mut Board, rng: &mut fastrand::Rng) -> usize {
    let mut n_moves = 0;
    while !board.is_terminal() {
        let candidates = board.occupied();
        let mv = candidates[rng.usize(..candidates.len())];
        board.play(mv);
        n_moves += 1;
    }
    n_moves
}

/// Aggregate results of repeated playouts from one position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayoutSummary {
    pub games: usize,
    pub min_moves: usize,
    pub max_moves: usize,
    pub mean_moves: f64,
    pub mean_time: Duration,
}

/// Run `games` independent playouts from clones of `board`.
///
/// Returns `None` when `games` is zero.
pub fn benchmark(board: &Board, games: usize, rng: &mut fastrand::Rng) -> Option<PlayoutSummary> {
    if games == 0 {
        return None;
    }

    let mut min_moves = usize::MAX;
    let mut max_moves = 0;
    let mut total_moves = 0;
    let mut total_time = Duration::ZERO;

    for _ in 0..games {
        let mut scratch = board.clone();
        let t0 = Instant::now();
        let n = random_playout(&mut scratch, rng);
        total_time += t0.elapsed();

        min_moves = min_moves.min(n);
        max_moves = max_moves.max(n);
        total_moves += n;
    }

    Some(PlayoutSummary {
        games,
        min_moves,
        max_moves,
        mean_moves: total_moves as f64 / games as f64,
        mean_time: mean_duration(total_time, games),
    })
}

/// Average of `total` over `count` samples, valid for any non-zero count.
fn mean_duration(total: Duration, count: usize) -> Duration {
    total.div_f64(count as f64)
}
