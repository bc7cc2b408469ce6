//! Mapping from playout length to search reward.
//!
//! Shorter solutions must score higher. Every variant here is
//! non-increasing in the total move count; [`ScoreFunction::Linear`] is the
//! default used by the search.

use crate::constants::{CLAMPED_SCORE_CAP, CLAMPED_SCORE_SCALE, SCORE_SCALE};

/// Reward function applied to `depth + playout length`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreFunction {
    /// `scale * (1 - (n - 1) / max_moves)`.
    Linear { scale: f64 },
    /// `scale * max(cap - n, 0)`.
    Clamped { scale: f64, cap: u32 },
    /// `scale * exp(-n / max_moves)`.
    Exponential { scale: f64 },
}

impl Default for ScoreFunction {
    fn default() -> Self {
        ScoreFunction::Linear { scale: SCORE_SCALE }
    }
}

impl ScoreFunction {
    /// The clamped variant with its historical constants.
    pub fn clamped() -> Self {
        ScoreFunction::Clamped {
            scale: CLAMPED_SCORE_SCALE,
            cap: CLAMPED_SCORE_CAP,
        }
    }

    /// Score a rollout that cleared the board in `total_moves` clicks.
    ///
    /// `max_moves` is the board's cell count. A zero `max_moves` (an empty
    /// board) is treated as one to keep the ratio finite.
    pub fn score(&self, total_moves: usize, max_moves: usize) -> f64 {
        let n = total_moves as f64;
        let max = max_moves.max(1) as f64;
        match *self {
            ScoreFunction::Linear { scale } => scale * (1.0 - (n - 1.0) / max),
            ScoreFunction::Clamped { scale, cap } => scale * (f64::from(cap) - n).max(0.0),
            ScoreFunction::Exponential { scale } => scale * (-n / max).exp(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScoreFunction::Linear { .. } => "linear",
            ScoreFunction::Clamped { .. } => "clamped",
            ScoreFunction::Exponential { .. } => "exponential",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_endpoints() {
        let f = ScoreFunction::default();
        assert_eq!(f.score(1, 100), SCORE_SCALE);
        assert!((f.score(101, 100)).abs() < 1e-9);
    }

    #[test]
    fn test_all_variants_decrease_with_moves() {
        let variants = [
            ScoreFunction::default(),
            ScoreFunction::clamped(),
            ScoreFunction::Exponential { scale: 100.0 },
        ];
        for f in variants {
            let mut prev = f.score(1, 50);
            for n in 2..=50 {
                let s = f.score(n, 50);
                assert!(s <= prev, "{} increased at n={n}", f.name());
                prev = s;
            }
            assert!(f.score(1, 50) > f.score(50, 50), "{} is flat", f.name());
        }
    }

    #[test]
    fn test_clamped_floors_at_zero() {
        let f = ScoreFunction::clamped();
        assert_eq!(f.score(62, 0), 10.0);
        assert_eq!(f.score(63, 0), 0.0);
        assert_eq!(f.score(500, 0), 0.0);
    }
}
