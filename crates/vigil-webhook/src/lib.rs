//! HTTP webhook listener for the Vigil pull request reviewer.
//!
//! Thin transport layer: decodes GitHub pull request events and hands
//! qualifying ones to [`vigil_review::pipeline::ReviewPipeline`]. All
//! decision logic lives in `vigil-review`.

pub mod server;

pub use server::{build_router, serve, AppState};
