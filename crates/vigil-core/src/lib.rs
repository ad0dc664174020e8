//! Core types, configuration, and error handling for the Vigil reviewer.
//!
//! This crate provides the shared foundation used by the other Vigil crates:
//! - [`VigilError`] — unified error type using `thiserror`
//! - [`VigilConfig`] — configuration loaded from `vigil.toml`
//! - Shared types: [`PullRequestRef`], [`ChangedFile`], [`ReviewFeedback`],
//!   [`LineComment`], [`CodeSnippet`]

mod config;
mod error;
mod types;

pub use config::{GitHubConfig, LlmConfig, ServerConfig, VigilConfig};
pub use error::VigilError;
pub use types::{ChangedFile, CodeSnippet, LineComment, PullRequestRef, ReviewFeedback};

/// A convenience `Result` type for Vigil operations.
pub type Result<T> = std::result::Result<T, VigilError>;
