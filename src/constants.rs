//! Constants for the board palette, scoring, and search parameters.
//!
//! This module collects every tunable default used by the engine. The
//! values mirror the parameters the solver was originally tuned with
//! (32 workers, 10 second budget, threshold 10, C = 10, D = 1).

use std::time::Duration;

// =============================================================================
// Board Palette
// =============================================================================

/// Symbols accepted in a board file, in palette order.
pub const SYMBOLS: [char; 4] = ['B', 'G', 'P', 'O'];

/// Symbol used when rendering an empty cell. Not accepted in board files.
pub const EMPTY_SYMBOL: char = '.';

// =============================================================================
// Scoring
// =============================================================================

/// Scale constant `K` of the linear score.
///
/// Keeps scores in a range where the variance term of the selection
/// formula stays comparable to the exploration term.
pub const SCORE_SCALE: f64 = 10_000.0;

/// Scale of the clamped score variant (`scale * max(cap - n, 0)`).
pub const CLAMPED_SCORE_SCALE: f64 = 10.0;

/// Move cap of the clamped score variant.
pub const CLAMPED_SCORE_CAP: u32 = 63;

// =============================================================================
// Search Parameters
// =============================================================================

/// Parent visit count below which children are picked uniformly at random.
pub const SELECTION_THRESHOLD: u32 = 10;

/// Exploration weight `C` of the UCT formula.
pub const EXPLORATION_WEIGHT: f64 = 10.0;

/// Variance smoothing term `D` of the UCT formula.
pub const VARIANCE_SMOOTHING: f64 = 1.0;

/// Wall-clock budget per engine.
pub const TIME_LIMIT: Duration = Duration::from_secs(10);

/// Number of independent engines run by the solver.
pub const WORKERS: usize = 32;

/// Initial node capacity reserved by a fresh search tree.
pub const TREE_CAPACITY: usize = 1024;
