//! Review orchestration for the Vigil pull request reviewer.
//!
//! Provides the full pipeline: LLM client, prompt construction, feedback
//! parsing, comment formatting, GitHub integration, and the orchestrator
//! that turns a list of changed files into posted review comments.

pub mod feedback;
pub mod format;
pub mod github;
pub mod llm;
pub mod pipeline;
pub mod prompt;
