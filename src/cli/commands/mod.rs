//! Command implementations

pub mod completions;
pub mod config;
pub mod extract;
pub mod filter;
pub mod format;
pub mod run;
