//! # mini-metropolis
//!
//! Random-walk Metropolis–Hastings for one-dimensional targets.
//!
//! The sampler draws a symmetric offset around the current state, accepts the
//! candidate with probability `min(1, π(y) / π(x))`, and records the state after
//! every iteration, so a run of `n` iterations always yields `n` samples.
//!
//! ```rust
//! use mini_metropolis::distributions::{Gaussian1D, GaussianWalk};
//! use mini_metropolis::metropolis_hastings::metropolis_hastings;
//! use mini_metropolis::stats::summarize;
//!
//! let target = Gaussian1D::<f64>::standard();
//! let mut rng = GaussianWalk::<f64>::new().set_seed(42);
//! let samples = metropolis_hastings(&target, 2.0, 0.0, 20_000, &mut rng).unwrap();
//!
//! let summary = summarize(&samples, 1_000).unwrap();
//! assert!(summary.mean.abs() < 0.2);
//! ```

pub mod config;
pub mod core;
pub mod distributions;
pub mod error;
pub mod io;
pub mod metropolis_hastings;
pub mod stats;
