//! CLI library components for the precinct QA checker.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod report;
