//! Core module - configuration, pipeline stages and run reporting

pub mod archive;
pub mod config;
pub mod error;
pub mod identity;
pub mod intermediate;
pub mod naming;
pub mod pipeline;
pub mod summary;

pub use archive::{filter_archive, FilterOptions};
pub use config::{Config, ConfigError};
pub use error::CaseError;
pub use identity::{ClientIdentity, ConventionKind, IdentityConvention, IdentityParseError};
pub use pipeline::{run_pipeline, RunOptions, Stages};
pub use summary::{Failure, FailureKind, RunSummary};
