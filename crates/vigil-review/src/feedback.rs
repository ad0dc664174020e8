//! Interpretation of raw model output as structured feedback.
//!
//! The model is asked for the JSON contract described in
//! [`crate::prompt::build_system_prompt`]; anything it actually returns is
//! mapped onto [`ReviewFeedback`] here. Parsing never fails outward —
//! malformed output degrades to [`ReviewFeedback::Degraded`] so the review
//! loop cannot abort on bad model output.

use serde::Deserialize;
use vigil_core::{CodeSnippet, LineComment, ReviewFeedback};

/// Fixed notice prepended to unparseable model output before posting.
pub const DEGRADED_NOTICE: &str =
    "Automated review could not interpret the model output as structured feedback. \
     The raw response is included below.";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFeedback {
    comment_needed: Option<bool>,
    message: Option<String>,
    summary: Option<String>,
    detailed_feedback: Option<String>,
    #[serde(default)]
    line_comments: Vec<WireLineComment>,
    #[serde(default)]
    code_snippets: Vec<WireSnippet>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLineComment {
    line_number: Option<serde_json::Value>,
    comment: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSnippet {
    before: Option<String>,
    after: Option<String>,
}

impl WireFeedback {
    fn matches_schema(&self) -> bool {
        self.comment_needed.is_some()
            || self.message.is_some()
            || self.summary.is_some()
            || self.detailed_feedback.is_some()
            || !self.line_comments.is_empty()
    }
}

/// Parse raw model text into a [`ReviewFeedback`] variant.
///
/// Handles markdown code fences around JSON. An explicit
/// `"commentNeeded": false` always wins over any stray content; line
/// comments with a missing or non-positive line number are dropped the same
/// way invalid entries are dropped elsewhere in the pipeline. Output that is
/// not JSON, or JSON matching none of the schema fields, becomes
/// [`ReviewFeedback::Degraded`] carrying [`DEGRADED_NOTICE`] plus the raw
/// text.
///
/// # Examples
///
/// ```
/// use vigil_core::ReviewFeedback;
/// use vigil_review::feedback::parse_feedback;
///
/// let skip = parse_feedback(r#"{"commentNeeded": false, "message": "all good"}"#);
/// assert_eq!(skip, ReviewFeedback::Skip { message: Some("all good".into()) });
///
/// let degraded = parse_feedback("not json at all");
/// assert!(matches!(degraded, ReviewFeedback::Degraded { .. }));
/// ```
pub fn parse_feedback(raw: &str) -> ReviewFeedback {
    let cleaned = strip_code_fences(raw);

    let wire: WireFeedback = match serde_json::from_str(cleaned) {
        Ok(w) => w,
        Err(_) => return degraded(raw),
    };

    if !wire.matches_schema() {
        return degraded(raw);
    }

    if wire.comment_needed == Some(false) {
        let message = wire
            .message
            .or(wire.summary)
            .filter(|m| !m.trim().is_empty());
        return ReviewFeedback::Skip { message };
    }

    let line_comments: Vec<LineComment> = wire
        .line_comments
        .into_iter()
        .filter_map(valid_line_comment)
        .collect();

    let summary = wire.summary.unwrap_or_default();
    let detailed_feedback = wire.detailed_feedback.filter(|d| !d.trim().is_empty());

    if line_comments.is_empty() {
        ReviewFeedback::General {
            summary,
            detailed_feedback,
        }
    } else {
        ReviewFeedback::Line {
            summary,
            detailed_feedback,
            line_comments,
            code_snippets: wire
                .code_snippets
                .into_iter()
                .filter_map(valid_snippet)
                .collect(),
        }
    }
}

fn degraded(raw: &str) -> ReviewFeedback {
    ReviewFeedback::Degraded {
        raw_message: format!("{DEGRADED_NOTICE}\n\n{raw}"),
    }
}

fn valid_line_comment(wire: WireLineComment) -> Option<LineComment> {
    let line = match &wire.line_number {
        Some(serde_json::Value::Number(n)) => {
            let l = n.as_u64()?;
            if l == 0 {
                return None;
            }
            l as u32
        }
        _ => return None,
    };
    let comment = wire.comment.filter(|c| !c.trim().is_empty())?;
    Some(LineComment {
        line_number: line,
        comment,
    })
}

fn valid_snippet(wire: WireSnippet) -> Option<CodeSnippet> {
    Some(CodeSnippet {
        before: wire.before?,
        after: wire.after?,
    })
}

fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}
