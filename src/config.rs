//! Search and solver configuration.

use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;

use crate::constants::{
    EXPLORATION_WEIGHT, SELECTION_THRESHOLD, TIME_LIMIT, VARIANCE_SMOOTHING, WORKERS,
};
use crate::score::ScoreFunction;

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("selection threshold must be at least 1")]
    SelectionThreshold,
    #[error("exploration weight must be finite and positive (got {0})")]
    ExplorationWeight(f64),
    #[error("variance smoothing must be finite and positive (got {0})")]
    VarianceSmoothing(f64),
    #[error("search budget is empty: time limit and iteration cap must both be non-zero")]
    EmptyBudget,
    #[error("node cap must be at least 1")]
    NodeCap,
    #[error("worker count must be at least 1")]
    Workers,
    #[error("expected one seed per worker ({workers}), got {seeds}")]
    SeedCount { workers: usize, seeds: usize },
    #[error("seed {0} is used by more than one worker")]
    DuplicateSeed(u64),
}

/// Parameters of a single tree search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Parent visits below which child selection is uniform random.
    pub selection_threshold: u32,
    /// UCT exploration weight `C`.
    pub exploration: f64,
    /// UCT variance smoothing `D`.
    pub variance_smoothing: f64,
    /// Wall-clock budget.
    pub time_limit: Duration,
    /// Optional iteration cap. Makes a run independent of machine speed.
    pub max_iterations: Option<u64>,
    /// Optional tree size cap.
    pub max_nodes: Option<usize>,
    pub scoring: ScoreFunction,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            selection_threshold: SELECTION_THRESHOLD,
            exploration: EXPLORATION_WEIGHT,
            variance_smoothing: VARIANCE_SMOOTHING,
            time_limit: TIME_LIMIT,
            max_iterations: None,
            max_nodes: None,
            scoring: ScoreFunction::default(),
        }
    }
}

impl SearchConfig {
    pub fn with_selection_threshold(mut self, threshold: u32) -> Self {
        self.selection_threshold = threshold;
        self
    }

    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    pub fn with_variance_smoothing(mut self, d: f64) -> Self {
        self.variance_smoothing = d;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn with_max_nodes(mut self, nodes: usize) -> Self {
        self.max_nodes = Some(nodes);
        self
    }

    pub fn with_scoring(mut self, scoring: ScoreFunction) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.selection_threshold < 1 {
            return Err(ConfigError::SelectionThreshold);
        }
        if !(self.exploration.is_finite() && self.exploration > 0.0) {
            return Err(ConfigError::ExplorationWeight(self.exploration));
        }
        if !(self.variance_smoothing.is_finite() && self.variance_smoothing > 0.0) {
            return Err(ConfigError::VarianceSmoothing(self.variance_smoothing));
        }
        if self.time_limit.is_zero() || self.max_iterations == Some(0) {
            return Err(ConfigError::EmptyBudget);
        }
        if self.max_nodes == Some(0) {
            return Err(ConfigError::NodeCap);
        }
        Ok(())
    }
}

/// Parameters of the parallel solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub search: SearchConfig,
    pub workers: usize,
    /// One seed per worker.
    pub seeds: Vec<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::new(WORKERS)
    }
}

impl SolverConfig {
    /// `workers` engines seeded `0..workers`.
    pub fn new(workers: usize) -> Self {
        Self {
            search: SearchConfig::default(),
            workers,
            seeds: (0..workers as u64).collect(),
        }
    }

    /// Shift the derived seeds to `base..base + workers`.
    pub fn with_seed_base(mut self, base: u64) -> Self {
        self.seeds = (0..self.workers as u64)
            .map(|i| base.wrapping_add(i))
            .collect();
        self
    }

    pub fn with_seeds(mut self, seeds: Vec<u64>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.search.validate()?;
        if self.workers < 1 {
            return Err(ConfigError::Workers);
        }
        if self.seeds.len() != self.workers {
            return Err(ConfigError::SeedCount {
                workers: self.workers,
                seeds: self.seeds.len(),
            });
        }
        let mut seen = HashSet::with_capacity(self.seeds.len());
        for &seed in &self.seeds {
            if !seen.insert(seed) {
                return Err(ConfigError::DuplicateSeed(seed));
            }
        }
        Ok(())
    }
}
