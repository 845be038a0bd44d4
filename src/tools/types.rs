//! Result records returned by the pull-request tools.
//!
//! Field names are part of the wire contract with the calling agent; renames
//! here are breaking changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::github::types::{
    ApiIssueComment, ApiPullRequest, ApiPullRequestFile, ApiReview, NewReviewComment,
};
use crate::pr::diff;

/// Metadata about a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSummary {
    /// PR number (e.g., 42)
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    /// "open" or "closed"
    pub state: String,
    /// Author's GitHub login
    #[serde(rename = "user")]
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Branch the changes come from
    pub head_ref: String,
    /// Branch the changes merge into
    pub base_ref: String,
}

impl From<ApiPullRequest> for PullRequestSummary {
    fn from(pr: ApiPullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title,
            body: pr.body,
            state: pr.state,
            author: pr.user.login,
            created_at: pr.created_at,
            updated_at: pr.updated_at,
            head_ref: pr.head.ref_name,
            base_ref: pr.base.ref_name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
}

impl FileStatus {
    /// Collapse GitHub's file statuses onto the three this crate reports.
    ///
    /// Renamed, copied, changed and unchanged files all still exist on the
    /// head branch, so they count as modified.
    pub fn from_api(status: &str) -> Self {
        match status {
            "added" => FileStatus::Added,
            "removed" => FileStatus::Removed,
            _ => FileStatus::Modified,
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Removed => write!(f, "removed"),
        }
    }
}

/// A single file changed by a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Repository-relative path (e.g., "src/auth/config.rs")
    pub filename: String,
    pub status: FileStatus,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
    pub blob_url: Option<String>,
    pub raw_url: Option<String>,
    /// Unified diff; absent for binary or oversized files
    pub patch: Option<String>,
    /// File text on the head branch, or an "Error getting content: ..." note.
    /// Never set for removed files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChangedFile {
    /// Review-comment position of `line` (in the head version of the file),
    /// if the patch shows that line.
    pub fn diff_position(&self, line: u64) -> Option<u64> {
        let patch = self.patch.as_deref()?;
        match diff::parse_patch(patch) {
            Ok(hunks) => diff::position_for_line(&hunks, line),
            Err(error) => {
                debug!(file = %self.filename, %error, "patch could not be parsed");
                None
            }
        }
    }
}

impl From<ApiPullRequestFile> for ChangedFile {
    fn from(file: ApiPullRequestFile) -> Self {
        Self {
            status: FileStatus::from_api(&file.status),
            filename: file.filename,
            additions: file.additions,
            deletions: file.deletions,
            changes: file.changes,
            blob_url: file.blob_url,
            raw_url: file.raw_url,
            patch: file.patch,
            content: None,
        }
    }
}

/// An inline comment to attach to a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub path: String,
    /// Offset within the file's patch, not a line number in the file
    pub position: u64,
    pub body: String,
}

impl ReviewComment {
    pub(crate) fn as_new(&self) -> NewReviewComment<'_> {
        NewReviewComment {
            path: &self.path,
            position: self.position,
            body: &self.body,
        }
    }
}

/// The action a review takes. Anything GitHub might add later travels
/// through `Other` untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReviewEvent {
    Approve,
    RequestChanges,
    Comment,
    Other(String),
}

impl ReviewEvent {
    pub fn as_str(&self) -> &str {
        match self {
            ReviewEvent::Approve => "APPROVE",
            ReviewEvent::RequestChanges => "REQUEST_CHANGES",
            ReviewEvent::Comment => "COMMENT",
            ReviewEvent::Other(event) => event,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ReviewEvent::Other(_))
    }
}

impl From<&str> for ReviewEvent {
    fn from(event: &str) -> Self {
        match event {
            "APPROVE" => ReviewEvent::Approve,
            "REQUEST_CHANGES" => ReviewEvent::RequestChanges,
            "COMMENT" => ReviewEvent::Comment,
            other => ReviewEvent::Other(other.to_string()),
        }
    }
}

impl From<String> for ReviewEvent {
    fn from(event: String) -> Self {
        ReviewEvent::from(event.as_str())
    }
}

impl From<ReviewEvent> for String {
    fn from(event: ReviewEvent) -> Self {
        match event {
            ReviewEvent::Other(event) => event,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ReviewEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub id: u64,
    /// e.g. "APPROVED", "CHANGES_REQUESTED", "COMMENTED"
    pub state: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl From<ApiReview> for ReviewResult {
    fn from(review: ApiReview) -> Self {
        Self {
            id: review.id,
            state: review.state,
            submitted_at: review.submitted_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentResult {
    pub id: u64,
    pub created_at: DateTime<Utc>,
}

impl From<ApiIssueComment> for CommentResult {
    fn from(comment: ApiIssueComment) -> Self {
        Self {
            id: comment.id,
            created_at: comment.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed_file(status: FileStatus, patch: Option<&str>) -> ChangedFile {
        ChangedFile {
            filename: "src/app.py".to_string(),
            status,
            additions: 1,
            deletions: 1,
            changes: 2,
            blob_url: None,
            raw_url: None,
            patch: patch.map(str::to_string),
            content: None,
        }
    }

    #[test]
    fn test_file_status_from_api() {
        assert_eq!(FileStatus::from_api("added"), FileStatus::Added);
        assert_eq!(FileStatus::from_api("removed"), FileStatus::Removed);
        assert_eq!(FileStatus::from_api("modified"), FileStatus::Modified);
        assert_eq!(FileStatus::from_api("renamed"), FileStatus::Modified);
        assert_eq!(FileStatus::from_api("copied"), FileStatus::Modified);
    }

    #[test]
    fn test_summary_serializes_author_as_user() {
        let summary = PullRequestSummary {
            number: 42,
            title: "Add OAuth2 login flow".to_string(),
            body: None,
            state: "open".to_string(),
            author: "alice".to_string(),
            created_at: "2024-03-01T10:00:00Z".parse().unwrap(),
            updated_at: "2024-03-02T11:30:00Z".parse().unwrap(),
            head_ref: "feature/oauth".to_string(),
            base_ref: "main".to_string(),
        };
        let value = serde_json::to_value(&summary).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 9);
        assert_eq!(value["user"], "alice");
        assert!(value["body"].is_null());
        assert_eq!(value["created_at"], "2024-03-01T10:00:00Z");
    }

    #[test]
    fn test_removed_file_has_no_content_key() {
        let value = serde_json::to_value(changed_file(FileStatus::Removed, None)).unwrap();
        assert!(value.get("content").is_none());
        assert!(value["patch"].is_null());
        assert_eq!(value["status"], "removed");
    }

    #[test]
    fn test_diff_position_uses_patch() {
        let file = changed_file(FileStatus::Modified, Some("@@ -10,2 +10,2 @@\n a\n-b\n+c"));
        assert_eq!(file.diff_position(11), Some(3));
        assert_eq!(file.diff_position(5), None);
        assert_eq!(changed_file(FileStatus::Added, None).diff_position(1), None);
    }

    #[test]
    fn test_review_event_round_trips_unknown_values() {
        let event: ReviewEvent = serde_json::from_str("\"APPROVE\"").unwrap();
        assert_eq!(event, ReviewEvent::Approve);

        let event: ReviewEvent = serde_json::from_str("\"approve\"").unwrap();
        assert_eq!(event, ReviewEvent::Other("approve".to_string()));
        assert!(!event.is_recognized());
        assert_eq!(serde_json::to_string(&event).unwrap(), "\"approve\"");
    }
}
