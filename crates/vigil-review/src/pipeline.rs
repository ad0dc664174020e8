use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};
use vigil_core::{PullRequestRef, ReviewFeedback, VigilError};

use crate::format;
use crate::github::{ChangeSetFetcher, CommentPoster};
use crate::llm::{ChatMessage, ModelClient, Role};
use crate::prompt;

/// Backoff before the single retry of a failed model call.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Statistics about one review run, for structured logging and tests.
///
/// # Examples
///
/// ```
/// use vigil_review::pipeline::RunReport;
///
/// let report = RunReport {
///     files_reviewed: 2,
///     comments_posted: 1,
///     fallback_posted: false,
/// };
/// assert_eq!(report.comments_posted, 1);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Files that had a patch and went through the review step.
    pub files_reviewed: usize,
    /// Comments successfully created on the pull request.
    pub comments_posted: usize,
    /// Whether the fallback overview comment was posted.
    pub fallback_posted: bool,
}

/// Review orchestrator that drives the full pipeline for one pull request.
///
/// Iterates changed files, invokes the model per file, applies the
/// comment decision, and triggers the fallback summary pass when no
/// per-file comment was posted. Collaborators are injected as trait
/// objects so tests can substitute doubles.
pub struct ReviewPipeline {
    fetcher: Arc<dyn ChangeSetFetcher>,
    model: Arc<dyn ModelClient>,
    poster: Arc<dyn CommentPoster>,
}

impl ReviewPipeline {
    /// Create a pipeline from its three collaborators.
    pub fn new(
        fetcher: Arc<dyn ChangeSetFetcher>,
        model: Arc<dyn ModelClient>,
        poster: Arc<dyn CommentPoster>,
    ) -> Self {
        Self {
            fetcher,
            model,
            poster,
        }
    }

    /// Review one pull request end to end.
    ///
    /// Files without a patch are excluded. Per-file reviews run strictly
    /// sequentially; only the postings of one file's multiple line comments
    /// run concurrently. Posting failures are logged and contained per file.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::GitHub`] if the changed-file listing itself
    /// fails; everything downstream degrades instead of propagating.
    pub async fn run(&self, pr: &PullRequestRef) -> Result<RunReport, VigilError> {
        let files = self.fetcher.list_changed_files(pr).await?;
        info!(
            pr = pr.number,
            files = files.len(),
            "reviewing pull request"
        );

        let mut summaries: Vec<String> = Vec::new();
        let mut files_reviewed = 0usize;
        let mut comments_posted = 0usize;

        for file in &files {
            let Some(patch) = file.patch.as_deref().filter(|p| !p.is_empty()) else {
                debug!(file = %file.filename, "no patch, skipping");
                continue;
            };
            files_reviewed += 1;

            let feedback = self.review_file(&file.filename, patch).await;
            if let Some(summary) = feedback.summary() {
                summaries.push(summary.to_string());
            }
            comments_posted += self.post_feedback(pr, &file.filename, &feedback).await;
        }

        let mut fallback_posted = false;
        if comments_posted == 0 && !summaries.is_empty() {
            fallback_posted = self.post_fallback(pr, &summaries).await;
        }

        let report = RunReport {
            files_reviewed,
            comments_posted,
            fallback_posted,
        };
        info!(
            pr = pr.number,
            files_reviewed = report.files_reviewed,
            comments_posted = report.comments_posted,
            fallback_posted = report.fallback_posted,
            "review run complete"
        );
        Ok(report)
    }

    /// Invoke the model for one file's diff and parse the response.
    ///
    /// A transport failure degrades to `Skip` after one retry — an
    /// infrastructure failure must not read as "needs a comment".
    async fn review_file(&self, filename: &str, patch: &str) -> ReviewFeedback {
        let messages = vec![
            ChatMessage {
                role: Role::System,
                content: prompt::build_system_prompt(),
            },
            ChatMessage {
                role: Role::User,
                content: prompt::build_review_prompt(filename, patch),
            },
        ];

        match self.chat_with_retry(messages).await {
            Some(raw) => crate::feedback::parse_feedback(&raw),
            None => ReviewFeedback::Skip { message: None },
        }
    }

    async fn chat_with_retry(&self, messages: Vec<ChatMessage>) -> Option<String> {
        match self.model.chat(messages.clone()).await {
            Ok(raw) => Some(raw),
            Err(first) => {
                warn!(error = %first, "model call failed, retrying once");
                tokio::time::sleep(RETRY_BACKOFF).await;
                match self.model.chat(messages).await {
                    Ok(raw) => Some(raw),
                    Err(second) => {
                        warn!(error = %second, "model call failed after retry, skipping");
                        None
                    }
                }
            }
        }
    }

    /// Apply the comment decision for one file's feedback.
    ///
    /// Returns the number of comments successfully posted.
    async fn post_feedback(
        &self,
        pr: &PullRequestRef,
        filename: &str,
        feedback: &ReviewFeedback,
    ) -> usize {
        match feedback {
            ReviewFeedback::Skip { .. } => 0,
            ReviewFeedback::Line { line_comments, .. } if !line_comments.is_empty() => {
                // One comment per line comment, issued concurrently; an
                // individual failure must not block the siblings.
                let posts = line_comments.iter().map(|lc| {
                    let body = format::line_comment_body(filename, lc);
                    async move { self.poster.post_comment(pr, &body).await }
                });
                let results = join_all(posts).await;

                let mut posted = 0usize;
                for (lc, result) in line_comments.iter().zip(results) {
                    match result {
                        Ok(()) => posted += 1,
                        Err(e) => warn!(
                            file = %filename,
                            line = lc.line_number,
                            error = %e,
                            "failed to post line comment"
                        ),
                    }
                }
                posted
            }
            ReviewFeedback::Line {
                summary,
                detailed_feedback,
                ..
            }
            | ReviewFeedback::General {
                summary,
                detailed_feedback,
            } => {
                let body = format::summary_comment_body(summary, detailed_feedback.as_deref());
                self.post_single(pr, filename, &body).await
            }
            ReviewFeedback::Degraded { raw_message } => {
                let body = format::degraded_comment_body(raw_message);
                self.post_single(pr, filename, &body).await
            }
        }
    }

    async fn post_single(&self, pr: &PullRequestRef, filename: &str, body: &str) -> usize {
        match self.poster.post_comment(pr, body).await {
            Ok(()) => 1,
            Err(e) => {
                warn!(file = %filename, error = %e, "failed to post comment");
                0
            }
        }
    }

    /// Run the fallback summary pass: one model call over the collected
    /// summaries, one overview comment.
    ///
    /// Returns whether the overview comment was posted.
    async fn post_fallback(&self, pr: &PullRequestRef, summaries: &[String]) -> bool {
        debug!(summaries = summaries.len(), "running fallback summary pass");
        let messages = vec![
            ChatMessage {
                role: Role::System,
                content: prompt::build_system_prompt(),
            },
            ChatMessage {
                role: Role::User,
                content: prompt::build_fallback_prompt(summaries),
            },
        ];

        let feedback = match self.chat_with_retry(messages).await {
            Some(raw) => crate::feedback::parse_feedback(&raw),
            None => ReviewFeedback::Skip { message: None },
        };
        let body = format::fallback_comment_body(&feedback);

        match self.poster.post_comment(pr, &body).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to post fallback comment");
                false
            }
        }
    }
}
