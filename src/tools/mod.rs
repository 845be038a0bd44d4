//! The four pull-request operations an agent can call.
//!
//! Every operation opens its own [`Session`], resolves the repository and the
//! pull request, performs one action and returns a typed record. Failures of
//! any kind are flattened into an [`ErrorInfo`] carrying only a message; the
//! `fold*` helpers turn either side into the JSON shape callers consume.

pub mod call;
pub mod types;

pub use call::{descriptors, ToolCall, ToolDescriptor};
pub use types::{
    ChangedFile, CommentResult, FileStatus, PullRequestSummary, ReviewComment, ReviewEvent,
    ReviewResult,
};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::github::types::{ApiPullRequest, NewReview};
use crate::github::{Endpoint, GitHubError, Session};

/// The only failure shape an operation reports: `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{error}")]
pub struct ErrorInfo {
    pub error: String,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let error = if message.trim().is_empty() {
            "unknown error".to_string()
        } else {
            message
        };
        Self { error }
    }
}

impl From<GitHubError> for ErrorInfo {
    fn from(error: GitHubError) -> Self {
        ErrorInfo::new(error.to_string())
    }
}

/// Entry point for the pull-request operations.
///
/// Holds only the API endpoint; credentials are supplied per call and never
/// retained.
#[derive(Debug, Clone, Default)]
pub struct PrTools {
    endpoint: Endpoint,
}

impl PrTools {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Fetch the pull request's metadata.
    #[instrument(skip_all, fields(owner = %owner, repo = %repo, pr = pr_number))]
    pub async fn get_pr_details(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        token: &str,
    ) -> Result<PullRequestSummary, ErrorInfo> {
        let details = async {
            let session = Session::connect(&self.endpoint, token)?;
            let pr = resolve_pull_request(&session, owner, repo, pr_number).await?;
            Ok::<_, GitHubError>(PullRequestSummary::from(pr))
        };
        details
            .await
            .map_err(|err| fold_error("getting PR details", err))
    }

    /// Fetch every changed file, with its head-branch content unless it was
    /// removed.
    ///
    /// A failed content fetch is recorded in that file's `content` and does not
    /// affect the other entries.
    #[instrument(skip_all, fields(owner = %owner, repo = %repo, pr = pr_number))]
    pub async fn get_pr_files(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        token: &str,
    ) -> Result<Vec<ChangedFile>, ErrorInfo> {
        let files = async {
            let session = Session::connect(&self.endpoint, token)?;
            let pr = resolve_pull_request(&session, owner, repo, pr_number).await?;
            let entries = session.pull_request_files(owner, repo, pr_number).await?;
            info!(files = entries.len(), head_ref = %pr.head.ref_name, "listed changed files");

            let mut files = Vec::with_capacity(entries.len());
            for entry in entries {
                let mut file = ChangedFile::from(entry);
                if file.status != FileStatus::Removed {
                    let content = match session
                        .file_content(owner, repo, &file.filename, &pr.head.ref_name)
                        .await
                    {
                        Ok(text) => text,
                        Err(err) => {
                            warn!(file = %file.filename, error = %err, "could not fetch file content");
                            format!("Error getting content: {err}")
                        }
                    };
                    file.content = Some(content);
                }
                files.push(file);
            }
            Ok::<_, GitHubError>(files)
        };
        files.await.map_err(|err| fold_error("getting PR files", err))
    }

    /// Submit one review holding `review_body` and every inline comment.
    ///
    /// Paths and positions are forwarded as given; GitHub decides whether
    /// they are valid.
    #[allow(clippy::too_many_arguments)] // mirrors the tool-call argument list
    #[instrument(
        skip_all,
        fields(owner = %owner, repo = %repo, pr = pr_number, event = %event, comments = comments.len())
    )]
    pub async fn submit_pr_review(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        review_body: &str,
        comments: &[ReviewComment],
        event: &ReviewEvent,
        token: &str,
    ) -> Result<ReviewResult, ErrorInfo> {
        if !event.is_recognized() {
            warn!("unrecognized review event, passing it to GitHub as is");
        }

        let review = async {
            let session = Session::connect(&self.endpoint, token)?;
            resolve_pull_request(&session, owner, repo, pr_number).await?;
            let new_review = NewReview {
                body: review_body,
                event: event.as_str(),
                comments: comments.iter().map(ReviewComment::as_new).collect(),
            };
            let created = session
                .create_review(owner, repo, pr_number, &new_review)
                .await?;
            info!(review_id = created.id, state = %created.state, "submitted review");
            Ok::<_, GitHubError>(ReviewResult::from(created))
        };
        review
            .await
            .map_err(|err| fold_error("submitting PR review", err))
    }

    /// Post a general comment on the pull request's conversation.
    #[instrument(skip_all, fields(owner = %owner, repo = %repo, pr = pr_number))]
    pub async fn add_pr_comment(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        comment: &str,
        token: &str,
    ) -> Result<CommentResult, ErrorInfo> {
        let posted = async {
            let session = Session::connect(&self.endpoint, token)?;
            resolve_pull_request(&session, owner, repo, pr_number).await?;
            let created = session
                .create_issue_comment(owner, repo, pr_number, comment)
                .await?;
            info!(comment_id = created.id, "posted comment");
            Ok::<_, GitHubError>(CommentResult::from(created))
        };
        posted
            .await
            .map_err(|err| fold_error("adding PR comment", err))
    }
}

async fn resolve_pull_request(
    session: &Session,
    owner: &str,
    repo: &str,
    pr_number: u64,
) -> Result<ApiPullRequest, GitHubError> {
    let repository = session.repository(owner, repo).await?;
    debug!(repository = %repository.full_name, "resolved repository");
    let pr = session.pull_request(owner, repo, pr_number).await?;
    debug!(title = %pr.title, state = %pr.state, "resolved pull request");
    Ok(pr)
}

fn fold_error(action: &str, err: GitHubError) -> ErrorInfo {
    error!(error = %err, "error {action}");
    ErrorInfo::from(err)
}

/// Review-comment position of `line` in the changed file at `path`, or an
/// error when the pull request does not touch that file.
pub fn locate_position(
    files: &[ChangedFile],
    path: &str,
    line: u64,
) -> Result<Option<u64>, ErrorInfo> {
    files
        .iter()
        .find(|file| file.filename == path)
        .map(|file| file.diff_position(line))
        .ok_or_else(|| ErrorInfo::new(format!("{path} is not changed by this pull request")))
}

/// Serialize an operation result into the shape callers consume: the record
/// itself, or `{"error": ...}`.
pub fn fold<T: Serialize>(result: &Result<T, ErrorInfo>) -> Value {
    match result {
        Ok(record) => serde_json::to_value(record)
            .unwrap_or_else(|err| json!(ErrorInfo::new(err.to_string()))),
        Err(info) => json!(info),
    }
}

/// Like [`fold`], except a failure is wrapped in a one-element list so the
/// result is always a list, as existing callers of `get_pr_files` expect.
pub fn fold_files(result: &Result<Vec<ChangedFile>, ErrorInfo>) -> Value {
    match result {
        Ok(_) => fold(result),
        Err(info) => json!([info]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_info_never_empty() {
        assert_eq!(ErrorInfo::new("").error, "unknown error");
        assert_eq!(ErrorInfo::new("boom").error, "boom");
    }

    #[test]
    fn test_fold_error_has_single_key() {
        let result: Result<CommentResult, ErrorInfo> = Err(ErrorInfo::new("Bad credentials"));
        let value = fold(&result);
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(value["error"], "Bad credentials");
    }

    #[test]
    fn test_fold_success_serializes_record() {
        let result: Result<CommentResult, ErrorInfo> = Ok(CommentResult {
            id: 99,
            created_at: "2024-03-01T10:00:00Z".parse().unwrap(),
        });
        assert_eq!(
            fold(&result),
            json!({"id": 99, "created_at": "2024-03-01T10:00:00Z"})
        );
    }

    #[test]
    fn test_fold_files_wraps_error_in_list() {
        let failed: Result<Vec<ChangedFile>, ErrorInfo> = Err(ErrorInfo::new("Not Found"));
        assert_eq!(fold_files(&failed), json!([{"error": "Not Found"}]));

        let empty: Result<Vec<ChangedFile>, ErrorInfo> = Ok(Vec::new());
        assert_eq!(fold_files(&empty), json!([]));
    }

    #[test]
    fn test_locate_position_finds_changed_file() {
        let files = vec![ChangedFile {
            filename: "src/app.py".to_string(),
            status: FileStatus::Modified,
            additions: 1,
            deletions: 1,
            changes: 2,
            blob_url: None,
            raw_url: None,
            patch: Some("@@ -4,2 +4,2 @@\n keep\n-old\n+new".to_string()),
            content: None,
        }];
        assert_eq!(locate_position(&files, "src/app.py", 5), Ok(Some(3)));
        assert_eq!(locate_position(&files, "src/app.py", 40), Ok(None));

        let err = locate_position(&files, "README.md", 1).unwrap_err();
        assert_eq!(err.error, "README.md is not changed by this pull request");
    }

    #[test]
    fn test_github_error_converts_to_message() {
        let info = ErrorInfo::from(GitHubError::InvalidUrl("nope".to_string()));
        assert_eq!(info.error, "Invalid GitHub API URL: nope");
    }
}
