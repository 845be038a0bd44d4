//! Wire shapes of the GitHub REST endpoints this crate calls.
//!
//! Only the fields that are read are declared; serde ignores the rest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRepository {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub login: String,
}

/// The `head` or `base` side of a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiBranchRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPullRequest {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub user: ApiUser,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub head: ApiBranchRef,
    pub base: ApiBranchRef,
}

/// One entry of `GET /pulls/{number}/files`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPullRequestFile {
    pub filename: String,
    /// added, removed, modified, renamed, copied, changed or unchanged
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
    #[serde(default)]
    pub blob_url: Option<String>,
    #[serde(default)]
    pub raw_url: Option<String>,
    /// Omitted by GitHub for binary files and very large diffs.
    #[serde(default)]
    pub patch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiReview {
    pub id: u64,
    pub state: String,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiIssueComment {
    pub id: u64,
    pub created_at: DateTime<Utc>,
}

/// Body GitHub sends with 4xx/5xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

impl ApiErrorBody {
    /// `message`, followed by any validation details GitHub attached.
    pub fn describe(&self) -> String {
        let details: Vec<String> = self
            .errors
            .iter()
            .filter_map(|error| match error {
                serde_json::Value::String(text) => Some(text.clone()),
                serde_json::Value::Object(fields) => fields
                    .get("message")
                    .or_else(|| fields.get("code"))
                    .and_then(|value| value.as_str())
                    .map(str::to_string),
                _ => None,
            })
            .collect();

        if details.is_empty() {
            self.message.clone()
        } else {
            format!("{} ({})", self.message, details.join("; "))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReviewComment<'a> {
    pub path: &'a str,
    pub position: u64,
    pub body: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReview<'a> {
    pub body: &'a str,
    pub event: &'a str,
    pub comments: Vec<NewReviewComment<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewIssueComment<'a> {
    pub body: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_request_ignores_unknown_fields() {
        let json = r#"{
            "number": 42,
            "title": "Add OAuth2 login flow",
            "body": null,
            "state": "open",
            "draft": false,
            "user": { "login": "alice", "id": 1 },
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-02T11:30:00Z",
            "head": { "ref": "feature/oauth", "sha": "abc" },
            "base": { "ref": "main", "sha": "def" }
        }"#;
        let pr: ApiPullRequest = serde_json::from_str(json).unwrap();
        assert_eq!(pr.number, 42);
        assert!(pr.body.is_none());
        assert_eq!(pr.head.ref_name, "feature/oauth");
        assert_eq!(pr.base.ref_name, "main");
    }

    #[test]
    fn test_file_without_patch() {
        let json = r#"{
            "filename": "logo.png",
            "status": "added",
            "additions": 0,
            "deletions": 0,
            "changes": 0,
            "blob_url": "https://github.com/o/r/blob/abc/logo.png",
            "raw_url": "https://github.com/o/r/raw/abc/logo.png"
        }"#;
        let file: ApiPullRequestFile = serde_json::from_str(json).unwrap();
        assert!(file.patch.is_none());
    }

    #[test]
    fn test_error_body_describe_with_validation_errors() {
        let body: ApiErrorBody = serde_json::from_str(
            r#"{"message": "Unprocessable Entity", "errors": ["Position is invalid", {"code": "custom", "message": "Path could not be resolved"}]}"#,
        )
        .unwrap();
        assert_eq!(
            body.describe(),
            "Unprocessable Entity (Position is invalid; Path could not be resolved)"
        );

        let plain: ApiErrorBody = serde_json::from_str(r#"{"message": "Bad credentials"}"#).unwrap();
        assert_eq!(plain.describe(), "Bad credentials");
    }
}
