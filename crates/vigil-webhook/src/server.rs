//! Webhook listener setup and request handling.
//!
//! Axum HTTP server bridging GitHub pull request events to the review
//! pipeline. The webhook endpoint always answers 200 — the sender must
//! never see a retry-inducing status regardless of internal failures.
//!
//! Endpoints:
//!   POST /webhook
//!   GET  /health

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};
use vigil_core::{PullRequestRef, VigilError};
use vigil_review::pipeline::ReviewPipeline;

/// Response body for a processed pull request event.
pub const PROCESSED: &str = "Webhook received!";
/// Response body for any other delivery.
pub const IGNORED: &str = "Event ignored";

/// Shared state behind the router.
pub struct AppState {
    /// The review pipeline invoked for qualifying events.
    pub pipeline: ReviewPipeline,
}

/// Build the webhook router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind and serve the webhook listener until the process exits.
///
/// # Errors
///
/// Returns [`VigilError::Config`] for an unparseable bind address, or
/// [`VigilError::Io`] if binding or serving fails.
pub async fn serve(bind: &str, port: u16, state: Arc<AppState>) -> Result<(), VigilError> {
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .map_err(|e| VigilError::Config(format!("invalid bind address {bind}:{port}: {e}")))?;

    let router = build_router(state);

    info!("webhook listener on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

#[derive(Deserialize)]
struct WebhookPayload {
    action: String,
    pull_request: Option<PullRequestEvent>,
}

#[derive(Deserialize)]
struct PullRequestEvent {
    number: u64,
    user: Login,
    base: Base,
}

#[derive(Deserialize)]
struct Login {
    login: String,
}

#[derive(Deserialize)]
struct Base {
    repo: Repo,
}

#[derive(Deserialize)]
struct Repo {
    owner: Login,
    name: String,
}

/// Decode a delivery body into a review trigger.
///
/// Returns `None` for malformed JSON, actions other than
/// `opened`/`synchronize`, or a payload without a well-formed
/// `pull_request` object — all of which are acknowledged and ignored.
fn parse_trigger(body: &str) -> Option<PullRequestRef> {
    let payload: WebhookPayload = serde_json::from_str(body).ok()?;
    if payload.action != "opened" && payload.action != "synchronize" {
        return None;
    }
    let event = payload.pull_request?;
    Some(PullRequestRef {
        number: event.number,
        author: event.user.login,
        owner: event.base.repo.owner.login,
        repo: event.base.repo.name,
    })
}

/// Webhook endpoint receiving pull request events.
///
/// The delivery is processed end-to-end before the response is sent, and
/// the response is always 200: pipeline failures are logged, never
/// surfaced to the sender.
async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    body: String,
) -> (StatusCode, &'static str) {
    let Some(pr) = parse_trigger(&body) else {
        return (StatusCode::OK, IGNORED);
    };

    info!(
        pr = pr.number,
        author = %pr.author,
        "pull request opened/updated"
    );

    if let Err(e) = state.pipeline.run(&pr).await {
        error!(pr = pr.number, error = %e, "review run failed");
    }

    (StatusCode::OK, PROCESSED)
}

/// Liveness endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use vigil_core::ChangedFile;
    use vigil_review::github::{ChangeSetFetcher, CommentPoster};
    use vigil_review::llm::{ChatMessage, ModelClient};

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChangeSetFetcher for CountingFetcher {
        async fn list_changed_files(
            &self,
            _pr: &PullRequestRef,
        ) -> Result<Vec<ChangedFile>, VigilError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl ChangeSetFetcher for FailingFetcher {
        async fn list_changed_files(
            &self,
            _pr: &PullRequestRef,
        ) -> Result<Vec<ChangedFile>, VigilError> {
            Err(VigilError::GitHub("boom".into()))
        }
    }

    struct SilentModel;

    #[async_trait]
    impl ModelClient for SilentModel {
        async fn chat(&self, _messages: Vec<ChatMessage>) -> Result<String, VigilError> {
            Ok(r#"{"commentNeeded": false}"#.into())
        }
    }

    struct NullPoster {
        bodies: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommentPoster for NullPoster {
        async fn post_comment(&self, _pr: &PullRequestRef, body: &str) -> Result<(), VigilError> {
            self.bodies.lock().unwrap().push(body.to_string());
            Ok(())
        }
    }

    fn state_with_fetcher(fetcher: Arc<CountingFetcher>) -> Arc<AppState> {
        Arc::new(AppState {
            pipeline: ReviewPipeline::new(
                fetcher,
                Arc::new(SilentModel),
                Arc::new(NullPoster {
                    bodies: Mutex::new(Vec::new()),
                }),
            ),
        })
    }

    fn payload(action: &str) -> String {
        format!(
            r#"{{
                "action": "{action}",
                "pull_request": {{
                    "number": 42,
                    "user": {{ "login": "octocat" }},
                    "base": {{ "repo": {{ "owner": {{ "login": "acme" }}, "name": "widgets" }} }}
                }}
            }}"#
        )
    }

    #[test]
    fn trigger_parsed_from_opened_payload() {
        let pr = parse_trigger(&payload("opened")).unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.author, "octocat");
        assert_eq!(pr.owner, "acme");
        assert_eq!(pr.repo, "widgets");
    }

    #[test]
    fn trigger_rejects_other_actions() {
        assert!(parse_trigger(&payload("closed")).is_none());
        assert!(parse_trigger(&payload("labeled")).is_none());
        assert!(parse_trigger(&payload("synchronize")).is_some());
    }

    #[test]
    fn trigger_rejects_malformed_bodies() {
        assert!(parse_trigger("not json").is_none());
        assert!(parse_trigger(r#"{"action": "opened"}"#).is_none());
        assert!(parse_trigger(r#"{"pull_request": {}}"#).is_none());
    }

    #[tokio::test]
    async fn qualifying_event_runs_pipeline_once() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let state = state_with_fetcher(fetcher.clone());

        let (status, body) = handle_webhook(State(state), payload("opened")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, PROCESSED);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ignored_action_never_reaches_pipeline() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let state = state_with_fetcher(fetcher.clone());

        let (status, body) = handle_webhook(State(state), payload("closed")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, IGNORED);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_body_is_acknowledged_not_errored() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let state = state_with_fetcher(fetcher.clone());

        let (status, body) = handle_webhook(State(state), "{broken".into()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, IGNORED);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pipeline_failure_still_answers_200() {
        let state = Arc::new(AppState {
            pipeline: ReviewPipeline::new(
                Arc::new(FailingFetcher),
                Arc::new(SilentModel),
                Arc::new(NullPoster {
                    bodies: Mutex::new(Vec::new()),
                }),
            ),
        });

        let (status, body) = handle_webhook(State(state), payload("synchronize")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, PROCESSED);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(value) = health().await;
        assert_eq!(value["status"], "ok");
        assert!(value["version"].is_string());
    }
}
