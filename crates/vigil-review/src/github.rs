use std::time::Duration;

use async_trait::async_trait;
use vigil_core::{ChangedFile, GitHubConfig, PullRequestRef, VigilError};

/// Seam for listing the files changed by a pull request.
#[async_trait]
pub trait ChangeSetFetcher: Send + Sync {
    /// Return the ordered list of changed files, each with an optional patch.
    async fn list_changed_files(
        &self,
        pr: &PullRequestRef,
    ) -> Result<Vec<ChangedFile>, VigilError>;
}

/// Seam for posting a comment against a pull request.
#[async_trait]
pub trait CommentPoster: Send + Sync {
    /// Post `body` as an issue comment on the pull request.
    async fn post_comment(&self, pr: &PullRequestRef, body: &str) -> Result<(), VigilError>;
}

/// GitHub client for fetching changed files and posting comments.
///
/// Implements both [`ChangeSetFetcher`] and [`CommentPoster`]. Every call is
/// bounded by the configured timeout so a stalled GitHub call cannot hang a
/// webhook delivery.
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
    timeout: Duration,
}

impl GitHubClient {
    /// Create a client from the GitHub configuration, falling back to the
    /// `GITHUB_TOKEN` environment variable when no token is configured.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Config`] if no token is available, or
    /// [`VigilError::GitHub`] if the client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vigil_core::GitHubConfig;
    /// use vigil_review::github::GitHubClient;
    ///
    /// let config = GitHubConfig {
    ///     token: Some("ghp_xxxx".into()),
    ///     ..GitHubConfig::default()
    /// };
    /// let client = GitHubClient::new(&config).unwrap();
    /// ```
    pub fn new(config: &GitHubConfig) -> Result<Self, VigilError> {
        let token = match &config.token {
            Some(t) => t.clone(),
            None => std::env::var("GITHUB_TOKEN").map_err(|_| {
                VigilError::Config(
                    "GITHUB_TOKEN not set. Set [github].token in vigil.toml or the GITHUB_TOKEN env var".into(),
                )
            })?,
        };

        let timeout = Duration::from_secs(config.timeout_secs);

        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.clone())
            .build()
            .map_err(|e| VigilError::GitHub(format!("failed to create GitHub client: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VigilError::GitHub(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            octocrab,
            http,
            token,
            timeout,
        })
    }
}

#[async_trait]
impl ChangeSetFetcher for GitHubClient {
    /// Fetch the changed files of a pull request via the list-files endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::GitHub`] on network or API errors.
    async fn list_changed_files(
        &self,
        pr: &PullRequestRef,
    ) -> Result<Vec<ChangedFile>, VigilError> {
        let url = format!(
            "https://api.github.com/repos/{}/{}/pulls/{}/files?per_page=100",
            pr.owner, pr.repo, pr.number
        );

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "vigil")
            .send()
            .await
            .map_err(|e| VigilError::GitHub(format!("failed to fetch changed files: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VigilError::GitHub(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| VigilError::GitHub(format!("failed to decode changed files: {e}")))
    }
}

#[async_trait]
impl CommentPoster for GitHubClient {
    /// Create an issue comment on the pull request.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Post`] on API errors or timeout.
    async fn post_comment(&self, pr: &PullRequestRef, body: &str) -> Result<(), VigilError> {
        let route = format!(
            "/repos/{}/{}/issues/{}/comments",
            pr.owner, pr.repo, pr.number
        );
        let payload = serde_json::json!({ "body": body });

        let request = self.octocrab.post(route, Some(&payload));
        let response: Result<serde_json::Value, octocrab::Error> =
            tokio::time::timeout(self.timeout, request)
                .await
                .map_err(|_| {
                    VigilError::Post(format!(
                        "comment creation timed out after {}s",
                        self.timeout.as_secs()
                    ))
                })?;

        response.map_err(|e| VigilError::Post(format!("failed to create comment: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_fails_without_token() {
        // Only meaningful when the environment doesn't leak a real token.
        if std::env::var("GITHUB_TOKEN").is_ok() {
            return;
        }
        let config = GitHubConfig::default();
        let result = GitHubClient::new(&config);
        assert!(matches!(result, Err(VigilError::Config(_))));
    }

    #[tokio::test]
    async fn construction_succeeds_with_configured_token() {
        let config = GitHubConfig {
            token: Some("ghp_test".into()),
            ..GitHubConfig::default()
        };
        let client = GitHubClient::new(&config).unwrap();
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn changed_files_decode_from_github_shape() {
        let json = r#"[
            {"filename": "src/lib.rs", "patch": "@@ -1 +1 @@\n-a\n+b", "status": "modified"},
            {"filename": "logo.png", "status": "added"}
        ]"#;
        let files: Vec<ChangedFile> = serde_json::from_str(json).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].patch.is_some());
        assert!(files[1].patch.is_none());
    }
}
