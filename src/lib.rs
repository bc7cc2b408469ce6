//! Former-MCTS: a single-player MCTS solver for block-clearing puzzles.
//!
//! Clicking a block removes it together with every connected block of the
//! same color; the remaining blocks fall down. The goal is to clear the
//! board in as few clicks as possible. This crate searches for short
//! solutions with Single-Player Monte Carlo Tree Search, running several
//! independently seeded searches in parallel and keeping the best.
//!
//! ## Modules
//!
//! - [`constants`] - Palette symbols and default search parameters
//! - [`board`] - Board state, blob detection, clicks and gravity
//! - [`playout`] - Random simulation to a cleared board
//! - [`score`] - Rewards for playout lengths
//! - [`config`] - Search and solver configuration
//! - [`mcts`] - The SP-MCTS engine
//! - [`solver`] - Parallel best-of-N search
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use former_mcts::board::Board;
//! use former_mcts::config::{SearchConfig, SolverConfig};
//! use former_mcts::solver::solve;
//!
//! let board: Board = "BBG\nGBG\nGGO".parse().unwrap();
//! let search = SearchConfig::default()
//!     .with_time_limit(Duration::from_secs(1))
//!     .with_max_iterations(500);
//! let report = solve(&board, &SolverConfig::new(2).with_search(search)).unwrap();
//! assert!(board.replay(&report.moves).is_terminal());
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod mcts;
pub mod playout;
pub mod score;
pub mod solver;
