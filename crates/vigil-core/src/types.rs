use serde::{Deserialize, Serialize};

/// Identity of the pull request under review.
///
/// Constructed once from the inbound webhook event and passed by reference
/// through the pipeline; never mutated.
///
/// # Examples
///
/// ```
/// use vigil_core::PullRequestRef;
///
/// let pr = PullRequestRef {
///     number: 42,
///     author: "octocat".into(),
///     owner: "acme".into(),
///     repo: "widgets".into(),
/// };
/// assert_eq!(pr.number, 42);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRef {
    /// Pull request number.
    pub number: u64,
    /// Login of the pull request author.
    pub author: String,
    /// Login of the repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

/// A file changed by the pull request.
///
/// Files with no patch (binary or otherwise undiffable) are skipped by the
/// orchestrator; a file entering the review step always has a non-empty patch.
///
/// # Examples
///
/// ```
/// use vigil_core::ChangedFile;
///
/// let file = ChangedFile {
///     filename: "src/lib.rs".into(),
///     patch: Some("@@ -1 +1 @@\n-old\n+new".into()),
/// };
/// assert!(file.patch.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
    /// Path of the file within the repository.
    pub filename: String,
    /// Unified diff of the changes, absent for binary/unchanged files.
    pub patch: Option<String>,
}

/// A single line-anchored remark from the review model.
///
/// `line_number` refers to a position in the new-file side of the diff and
/// is always at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineComment {
    /// 1-based line number in the new version of the file.
    pub line_number: u32,
    /// The remark to attach at that line.
    pub comment: String,
}

/// A before/after code example accompanying feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnippet {
    /// The code as it appears in the diff.
    pub before: String,
    /// The suggested replacement.
    pub after: String,
}

/// Parsed outcome of one review model invocation.
///
/// Exactly one variant is active per parse result, so every consumer is
/// forced to handle each case explicitly.
///
/// # Examples
///
/// ```
/// use vigil_core::ReviewFeedback;
///
/// let feedback = ReviewFeedback::Skip { message: Some("looks fine".into()) };
/// assert!(matches!(feedback, ReviewFeedback::Skip { .. }));
/// assert_eq!(feedback.summary(), Some("looks fine"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewFeedback {
    /// The model determined no comment is warranted. Never carries line
    /// comments.
    Skip {
        /// Short reason given by the model, when present.
        message: Option<String>,
    },
    /// Feedback anchored to specific lines of the diff.
    Line {
        /// High-level assessment of the change.
        summary: String,
        /// Breakdown of the key issues, when present.
        detailed_feedback: Option<String>,
        /// Line-anchored remarks, in model order.
        line_comments: Vec<LineComment>,
        /// Optional before/after examples.
        code_snippets: Vec<CodeSnippet>,
    },
    /// Feedback without line anchors.
    General {
        /// High-level assessment of the change.
        summary: String,
        /// Breakdown of the key issues, when present.
        detailed_feedback: Option<String>,
    },
    /// Model output could not be parsed as structured feedback. Still
    /// treated as comment-worthy so the author is notified that automated
    /// review failed cleanly rather than vanishing.
    Degraded {
        /// Fixed explanatory notice plus the raw model output.
        raw_message: String,
    },
}

impl ReviewFeedback {
    /// The per-file summary text collected for the fallback pass, if any.
    ///
    /// `Skip` yields its message (a skipping file's summary still feeds the
    /// fallback overview); `Degraded` yields nothing since it always posts
    /// its own comment.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_core::ReviewFeedback;
    ///
    /// let general = ReviewFeedback::General {
    ///     summary: "Solid refactor".into(),
    ///     detailed_feedback: None,
    /// };
    /// assert_eq!(general.summary(), Some("Solid refactor"));
    ///
    /// let degraded = ReviewFeedback::Degraded { raw_message: "???".into() };
    /// assert_eq!(degraded.summary(), None);
    /// ```
    pub fn summary(&self) -> Option<&str> {
        let text = match self {
            ReviewFeedback::Skip { message } => message.as_deref()?,
            ReviewFeedback::Line { summary, .. } | ReviewFeedback::General { summary, .. } => {
                summary.as_str()
            }
            ReviewFeedback::Degraded { .. } => return None,
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
