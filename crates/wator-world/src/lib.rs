//! Wa-Tor simulation engine.
//!
//! This crate implements the toroidal grid where fish and sharks live, the
//! per-entity rules, and sequential and parallel chronon stepping.

pub mod grid;
pub mod entity;
pub mod parallel;
pub mod simulation;
pub mod run;

pub use grid::{Grid, GridSnapshot, Neighbors};
pub use entity::{Fish, Shark};
pub use simulation::Simulation;
pub use run::{run, run_with, benchmark, benchmark_config, BenchmarkResult, RunReport};
