//! Review instruction construction.
//!
//! Turns a (filename, diff) pair, or a list of per-file summaries, into the
//! text sent to the model: guidelines plus the content to review, with the
//! structured-JSON output contract spelled out in the system prompt.

/// Separator between per-file summaries in the fallback request.
pub const SUMMARY_SEPARATOR: &str = "\n\n---\n\n";

const SYSTEM_PROMPT: &str = "\
You are Vigil, an expert senior software engineer performing in-depth code \
review of pull request changes.

Guidelines for the review:
1. Code Quality: assess readability, maintainability, and adherence to best practices.
2. Performance: identify bottlenecks, inefficiencies, or redundant operations.
3. Security: highlight potential vulnerabilities or security flaws.
4. Scalability & Architecture: suggest improvements for long-term maintainability.
5. Edge Cases & Bugs: identify logic errors, missing validations, or unhandled edge cases.

Respond with a single JSON object:
{
  \"commentNeeded\": true | false,
  \"message\": \"when commentNeeded is false: short reason no comment is warranted\",
  \"summary\": \"high-level assessment of the changes\",
  \"detailedFeedback\": \"breakdown of the key issues and suggestions\",
  \"lineComments\": [
    { \"lineNumber\": 42, \"comment\": \"issue at this line of the new file\" }
  ],
  \"codeSnippets\": [
    { \"before\": \"current code\", \"after\": \"improved code\" }
  ]
}

Line numbers refer to the new-file side of the diff and start at 1. Only \
include lineComments you can anchor to a specific line. If the changes \
warrant no comment at all, return {\"commentNeeded\": false, \"message\": \
\"...\", \"summary\": \"...\"} and nothing else.";

/// Build the system prompt for the review model.
///
/// # Examples
///
/// ```
/// use vigil_review::prompt::build_system_prompt;
///
/// let prompt = build_system_prompt();
/// assert!(prompt.contains("Vigil"));
/// assert!(prompt.contains("commentNeeded"));
/// ```
pub fn build_system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

/// Build the per-file review instruction from a filename and its diff.
///
/// # Examples
///
/// ```
/// use vigil_review::prompt::build_review_prompt;
///
/// let prompt = build_review_prompt("src/auth.rs", "+new line");
/// assert!(prompt.contains("src/auth.rs"));
/// assert!(prompt.contains("+new line"));
/// ```
pub fn build_review_prompt(filename: &str, diff: &str) -> String {
    format!(
        "Analyze the following code changes in the file: **{filename}**\n\n\
         ```diff\n{diff}\n```\n"
    )
}

/// Build the fallback summary instruction from the collected per-file
/// summaries, joined by [`SUMMARY_SEPARATOR`].
///
/// Used only when the per-file pass produced zero posted comments.
///
/// # Examples
///
/// ```
/// use vigil_review::prompt::build_fallback_prompt;
///
/// let prompt = build_fallback_prompt(&["fine".into(), "also fine".into()]);
/// assert!(prompt.contains("fine\n\n---\n\nalso fine"));
/// ```
pub fn build_fallback_prompt(summaries: &[String]) -> String {
    format!(
        "You have received feedback for each of the files in the pull request. \
         Here are the individual feedbacks:\n\n{}\n\n\
         Generate a brief but comprehensive summary of the overall pull request \
         based on the individual feedbacks above. Focus on significant changes \
         or patterns noticed across the files, common quality issues, and any \
         general suggestions for improvement. Avoid repeating details already \
         given in individual file reviews; keep the summary professional and \
         succinct. Respond with the same JSON object schema, using the summary \
         and detailedFeedback fields.",
        summaries.join(SUMMARY_SEPARATOR)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_contains_contract() {
        let prompt = build_system_prompt();
        assert!(prompt.contains("commentNeeded"));
        assert!(prompt.contains("lineComments"));
        assert!(prompt.contains("codeSnippets"));
        assert!(prompt.contains("new-file side"));
    }

    #[test]
    fn review_prompt_includes_filename_and_diff() {
        let prompt = build_review_prompt("src/db.rs", "+added line");
        assert!(prompt.contains("**src/db.rs**"));
        assert!(prompt.contains("+added line"));
        assert!(prompt.contains("```diff"));
    }

    #[test]
    fn fallback_prompt_joins_with_separator() {
        let summaries = vec!["first file fine".to_string(), "second file fine".to_string()];
        let prompt = build_fallback_prompt(&summaries);
        assert!(prompt.contains("first file fine\n\n---\n\nsecond file fine"));
    }

    #[test]
    fn fallback_prompt_preserves_order() {
        let summaries = vec!["aaa".to_string(), "bbb".to_string(), "ccc".to_string()];
        let prompt = build_fallback_prompt(&summaries);
        let a = prompt.find("aaa").unwrap();
        let b = prompt.find("bbb").unwrap();
        let c = prompt.find("ccc").unwrap();
        assert!(a < b && b < c);
    }
}
