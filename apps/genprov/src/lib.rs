//! # genprov
//!
//! Command-line driver for genprov-core: reads event files, runs the record
//! writer and persists or prints the results.

pub mod cli;
pub mod config;
