//! Comment body formatting.
//!
//! The exact shapes here are load-bearing: downstream tooling keys off the
//! marker line, and the diff-style context header encodes the line window
//! other integrations parse. Reproduce them byte-for-byte when changing
//! anything.

use vigil_core::{LineComment, ReviewFeedback};

/// Fixed marker line prefixed to every posted comment, identifying it as
/// automated feedback.
pub const FEEDBACK_MARKER: &str = "\u{1f916} AI Code Review Feedback:";

/// Body used when the fallback model invocation yields nothing usable.
pub const NO_SIGNIFICANT_CHANGES: &str =
    "No significant changes detected in this pull request.";

/// Normalize literal escaped newline sequences in model output into real
/// line breaks.
///
/// # Examples
///
/// ```
/// use vigil_review::format::normalize_newlines;
///
/// assert_eq!(normalize_newlines("a\\nb"), "a\nb");
/// assert_eq!(normalize_newlines("a\\r\\nb"), "a\nb");
/// ```
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\\r\\n", "\n").replace("\\n", "\n")
}

/// Format the body for a single line-anchored comment.
///
/// Includes the file path and a synthesized diff-style context block whose
/// header encodes a 3-line window from `start = max(line - 1, 0)` through
/// `end = line + 2`, rendered as `@@ -{start + 1},{window} @@`. The comment
/// text appears both inside the code block and again as a plain "AI
/// Comment" section.
///
/// # Examples
///
/// ```
/// use vigil_core::LineComment;
/// use vigil_review::format::line_comment_body;
///
/// let lc = LineComment { line_number: 10, comment: "possible null deref".into() };
/// let body = line_comment_body("src/auth.rs", &lc);
/// assert!(body.contains("src/auth.rs"));
/// assert!(body.contains("@@ -10,4 @@"));
/// ```
pub fn line_comment_body(filename: &str, line_comment: &LineComment) -> String {
    let line = line_comment.line_number;
    let start = line.saturating_sub(1);
    let end = line + 2;
    let window = end - start + 1;
    let comment = normalize_newlines(&line_comment.comment);

    format!(
        "{FEEDBACK_MARKER}\n\n\
         **File:** `{filename}`\n\n\
         ```diff\n\
         @@ -{},{} @@\n\
         # AI Comment (line {line}): {comment}\n\
         ```\n\n\
         **AI Comment:** {comment}\n",
        start + 1,
        window,
    )
}

/// Format a summary-style body: `summary`, blank line, `detailed_feedback`,
/// each defaulting to the empty string.
///
/// # Examples
///
/// ```
/// use vigil_review::format::{summary_comment_body, FEEDBACK_MARKER};
///
/// let body = summary_comment_body("Looks solid", Some("One nit inline."));
/// assert!(body.starts_with(FEEDBACK_MARKER));
/// assert!(body.contains("Looks solid\n\nOne nit inline."));
/// ```
pub fn summary_comment_body(summary: &str, detailed_feedback: Option<&str>) -> String {
    let summary = normalize_newlines(summary);
    let detail = normalize_newlines(detailed_feedback.unwrap_or_default());
    format!("{FEEDBACK_MARKER}\n\n{summary}\n\n{detail}")
}

/// Format the body for feedback whose raw output could not be parsed.
pub fn degraded_comment_body(raw_message: &str) -> String {
    format!("{FEEDBACK_MARKER}\n\n{}", normalize_newlines(raw_message))
}

/// Format the single overview comment for the fallback pass.
///
/// Uses the parsed summary/detail when available; when the fallback
/// invocation itself yielded nothing, falls back to
/// [`NO_SIGNIFICANT_CHANGES`].
pub fn fallback_comment_body(feedback: &ReviewFeedback) -> String {
    match feedback {
        ReviewFeedback::Line {
            summary,
            detailed_feedback,
            ..
        }
        | ReviewFeedback::General {
            summary,
            detailed_feedback,
        } => summary_comment_body(summary, detailed_feedback.as_deref()),
        ReviewFeedback::Degraded { raw_message } => degraded_comment_body(raw_message),
        ReviewFeedback::Skip {
            message: Some(message),
        } => summary_comment_body(message, None),
        ReviewFeedback::Skip { message: None } => {
            format!("{FEEDBACK_MARKER}\n\n{NO_SIGNIFICANT_CHANGES}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::LineComment;

    fn lc(line: u32, comment: &str) -> LineComment {
        LineComment {
            line_number: line,
            comment: comment.into(),
        }
    }

    #[test]
    fn line_comment_header_window() {
        // line 10 -> start 9, end 12, four-line window, header anchored at 10
        let body = line_comment_body("src/auth.rs", &lc(10, "possible null deref"));
        assert!(body.contains("@@ -10,4 @@"));
        assert!(body.contains("`src/auth.rs`"));
    }

    #[test]
    fn line_comment_window_clamps_at_file_start() {
        let body = line_comment_body("src/lib.rs", &lc(1, "top of file"));
        assert!(body.contains("@@ -1,4 @@"));
    }

    #[test]
    fn line_comment_embeds_text_twice() {
        let body = line_comment_body("a.rs", &lc(5, "shadowed variable"));
        let occurrences = body.matches("shadowed variable").count();
        assert_eq!(occurrences, 2);
        assert!(body.contains("**AI Comment:** shadowed variable"));
    }

    #[test]
    fn every_body_starts_with_marker() {
        let bodies = [
            line_comment_body("a.rs", &lc(3, "x")),
            summary_comment_body("s", Some("d")),
            degraded_comment_body("raw"),
            fallback_comment_body(&ReviewFeedback::Skip { message: None }),
        ];
        for body in bodies {
            assert!(body.starts_with(FEEDBACK_MARKER));
        }
    }

    #[test]
    fn summary_body_concatenates_with_blank_line() {
        let body = summary_comment_body("Summary here", Some("Detail here"));
        assert!(body.contains("Summary here\n\nDetail here"));
    }

    #[test]
    fn summary_body_defaults_missing_detail_to_empty() {
        let body = summary_comment_body("Only summary", None);
        assert!(body.contains("Only summary"));
        assert!(body.ends_with("Only summary\n\n"));
    }

    #[test]
    fn escaped_newlines_are_normalized() {
        let body = summary_comment_body("first\\nsecond", None);
        assert!(body.contains("first\nsecond"));
        assert!(!body.contains("\\n"));

        let line = line_comment_body("a.rs", &lc(2, "one\\r\\ntwo"));
        assert!(line.contains("one\ntwo"));
    }

    #[test]
    fn fallback_uses_parsed_summary_when_available() {
        let feedback = ReviewFeedback::General {
            summary: "Overall fine".into(),
            detailed_feedback: Some("Minor nits only.".into()),
        };
        let body = fallback_comment_body(&feedback);
        assert!(body.contains("Overall fine\n\nMinor nits only."));
    }

    #[test]
    fn fallback_uses_fixed_message_when_nothing_usable() {
        let body = fallback_comment_body(&ReviewFeedback::Skip { message: None });
        assert!(body.contains(NO_SIGNIFICANT_CHANGES));
    }

    #[test]
    fn fallback_uses_skip_message_when_present() {
        let body = fallback_comment_body(&ReviewFeedback::Skip {
            message: Some("quiet PR".into()),
        });
        assert!(body.contains("quiet PR"));
    }
}
