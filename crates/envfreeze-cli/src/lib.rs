//! envfreeze command-line driver

#![allow(missing_docs)]

pub mod app;
pub mod cli;
pub mod telemetry;

pub use app::{execute, execute_with, prepare};
pub use cli::{split_targets, Cli, LogFormat, SolverArg};
