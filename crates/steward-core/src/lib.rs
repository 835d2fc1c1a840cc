//! Core types, configuration, and error handling for Steward.
//!
//! This crate provides the shared foundation used by the other Steward crates:
//! - [`StewardError`]: unified error type using `thiserror`
//! - [`StewardConfig`]: configuration loaded from `.steward.toml`
//! - Shared types: [`PullRequest`], [`ProjectId`], [`RepoFile`], [`Report`],
//!   [`AnalysisStep`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{
    GitHubConfig, LlmConfig, MatcherKind, OutputConfig, ResolverConfig, StewardConfig,
};
pub use error::StewardError;
pub use types::{
    AnalysisStep, CandidateProjectSet, EntryKind, OutputFormat, ProjectId, PullRequest, RepoFile,
    Report, ReportOrigin,
};

/// A convenience `Result` type for Steward operations.
pub type Result<T> = std::result::Result<T, StewardError>;
