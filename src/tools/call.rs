//! Tool-call surface for an orchestrating agent: JSON descriptors to register
//! the tools, and a dispatcher that runs a `{"name", "arguments"}` call and
//! returns the folded JSON result.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use super::types::{ReviewComment, ReviewEvent};
use super::{fold, fold_files, ErrorInfo, PrTools};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Arguments naming the pull request every tool acts on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TargetArgs {
    pub repo_owner: String,
    pub repo_name: String,
    pub pr_number: u64,
    /// Falls back to the configured token when omitted.
    #[serde(default)]
    pub github_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewArgs {
    #[serde(flatten)]
    pub target: TargetArgs,
    #[serde(default)]
    pub review_body: String,
    #[serde(default)]
    pub comments: Vec<ReviewComment>,
    pub event: ReviewEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommentArgs {
    #[serde(flatten)]
    pub target: TargetArgs,
    pub comment: String,
}

/// One tool invocation, as `{"name": "...", "arguments": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolCall {
    GetPrDetails(TargetArgs),
    GetPrFiles(TargetArgs),
    SubmitPrReview(ReviewArgs),
    AddPrComment(CommentArgs),
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::GetPrDetails(_) => "get_pr_details",
            ToolCall::GetPrFiles(_) => "get_pr_files",
            ToolCall::SubmitPrReview(_) => "submit_pr_review",
            ToolCall::AddPrComment(_) => "add_pr_comment",
        }
    }

    pub fn target(&self) -> &TargetArgs {
        match self {
            ToolCall::GetPrDetails(target) | ToolCall::GetPrFiles(target) => target,
            ToolCall::SubmitPrReview(args) => &args.target,
            ToolCall::AddPrComment(args) => &args.target,
        }
    }
}

impl PrTools {
    /// Run a tool call and return its result in wire form.
    ///
    /// A non-empty token in the call's arguments wins over `fallback_token`.
    /// A call with neither produces an error result without contacting GitHub.
    pub async fn dispatch(&self, call: &ToolCall, fallback_token: Option<&str>) -> Value {
        let target = call.target();
        info!(tool = call.name(), owner = %target.repo_owner, repo = %target.repo_name, pr = target.pr_number, "dispatching tool call");

        let supplied = target.github_token.as_deref().filter(|token| !token.is_empty());
        let Some(token) = supplied.or(fallback_token) else {
            error!(tool = call.name(), "no GitHub token available");
            let missing = ErrorInfo::new("GitHub token not provided");
            return match call {
                ToolCall::GetPrFiles(_) => json!([missing]),
                _ => json!(missing),
            };
        };

        let (owner, repo, pr_number) = (
            target.repo_owner.as_str(),
            target.repo_name.as_str(),
            target.pr_number,
        );
        match call {
            ToolCall::GetPrDetails(_) => {
                fold(&self.get_pr_details(owner, repo, pr_number, token).await)
            }
            ToolCall::GetPrFiles(_) => {
                fold_files(&self.get_pr_files(owner, repo, pr_number, token).await)
            }
            ToolCall::SubmitPrReview(args) => fold(
                &self
                    .submit_pr_review(
                        owner,
                        repo,
                        pr_number,
                        &args.review_body,
                        &args.comments,
                        &args.event,
                        token,
                    )
                    .await,
            ),
            ToolCall::AddPrComment(args) => fold(
                &self
                    .add_pr_comment(owner, repo, pr_number, &args.comment, token)
                    .await,
            ),
        }
    }

    /// Parse `raw` as a [`ToolCall`] and dispatch it. Malformed calls come
    /// back as an error result, list-wrapped when the call names
    /// `get_pr_files`.
    pub async fn dispatch_json(&self, raw: &str, fallback_token: Option<&str>) -> Value {
        let value = match serde_json::from_str::<Value>(raw) {
            Ok(value) => value,
            Err(err) => return malformed_call(&err, false),
        };
        let lists_files = value.get("name").and_then(Value::as_str) == Some("get_pr_files");
        match serde_json::from_value::<ToolCall>(value) {
            Ok(call) => self.dispatch(&call, fallback_token).await,
            Err(err) => malformed_call(&err, lists_files),
        }
    }
}

fn malformed_call(err: &serde_json::Error, lists_files: bool) -> Value {
    error!(error = %err, "malformed tool call");
    let info = ErrorInfo::new(format!("Invalid tool call: {err}"));
    if lists_files {
        json!([info])
    } else {
        json!(info)
    }
}

fn target_properties() -> serde_json::Map<String, Value> {
    let properties = json!({
        "repo_owner": {"type": "string", "description": "Owner of the repository"},
        "repo_name": {"type": "string", "description": "Name of the repository"},
        "pr_number": {"type": "integer", "minimum": 1, "description": "Pull request number"},
        "github_token": {"type": "string", "description": "GitHub access token"}
    });
    match properties {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

fn schema(extra: Value, extra_required: &[&str]) -> Value {
    let mut properties = target_properties();
    if let Value::Object(extra) = extra {
        properties.extend(extra);
    }
    let mut required = vec!["repo_owner", "repo_name", "pr_number"];
    required.extend_from_slice(extra_required);
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": properties,
        "required": required,
    })
}

/// Descriptors for the four tools, ready to hand to an agent.
pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "get_pr_details".into(),
            description: "Gets the details of a specific pull request: title, description, \
                          state, author, timestamps and branches."
                .into(),
            input_schema: schema(json!({}), &[]),
        },
        ToolDescriptor {
            name: "get_pr_files".into(),
            description: "Gets all files changed in a pull request with their patches and \
                          their current content on the head branch."
                .into(),
            input_schema: schema(json!({}), &[]),
        },
        ToolDescriptor {
            name: "submit_pr_review".into(),
            description: "Submits a review to a pull request with comments on specific files."
                .into(),
            input_schema: schema(
                json!({
                    "review_body": {"type": "string", "description": "Overall review comment"},
                    "comments": {
                        "type": "array",
                        "description": "Inline comments anchored to a position in a file's diff",
                        "items": {
                            "type": "object",
                            "properties": {
                                "path": {"type": "string"},
                                "position": {"type": "integer", "minimum": 1},
                                "body": {"type": "string"}
                            },
                            "required": ["path", "position", "body"]
                        }
                    },
                    "event": {
                        "type": "string",
                        "enum": ["APPROVE", "REQUEST_CHANGES", "COMMENT"],
                        "description": "Review event type"
                    }
                }),
                &["event"],
            ),
        },
        ToolDescriptor {
            name: "add_pr_comment".into(),
            description: "Adds a general comment to a pull request.".into(),
            input_schema: schema(
                json!({"comment": {"type": "string", "description": "Comment text"}}),
                &["comment"],
            ),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_review_call() {
        let call: ToolCall = serde_json::from_value(json!({
            "name": "submit_pr_review",
            "arguments": {
                "repo_owner": "org",
                "repo_name": "repo",
                "pr_number": 7,
                "review_body": "Looks good",
                "comments": [{"path": "src/app.py", "position": 12, "body": "fix this"}],
                "event": "APPROVE"
            }
        }))
        .unwrap();

        let ToolCall::SubmitPrReview(args) = &call else {
            panic!("expected a review call, got {call:?}");
        };
        assert_eq!(call.name(), "submit_pr_review");
        assert_eq!(args.target.pr_number, 7);
        assert!(args.target.github_token.is_none());
        assert_eq!(args.event, ReviewEvent::Approve);
        assert_eq!(args.comments[0].position, 12);
    }

    #[test]
    fn test_parse_unknown_tool_fails() {
        let result = serde_json::from_value::<ToolCall>(json!({
            "name": "merge_pr",
            "arguments": {"repo_owner": "org", "repo_name": "repo", "pr_number": 1}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_descriptors_cover_all_tools() {
        let tools = descriptors();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            ["get_pr_details", "get_pr_files", "submit_pr_review", "add_pr_comment"]
        );

        let review = &tools[2].input_schema;
        assert!(review["properties"]["comments"].is_object());
        assert!(review["properties"]["github_token"].is_object());
        assert_eq!(
            review["required"],
            json!(["repo_owner", "repo_name", "pr_number", "event"])
        );
    }

    #[tokio::test]
    async fn test_dispatch_without_token_reports_error() {
        let tools = PrTools::default();
        let call: ToolCall = serde_json::from_value(json!({
            "name": "get_pr_files",
            "arguments": {"repo_owner": "org", "repo_name": "repo", "pr_number": 1}
        }))
        .unwrap();
        let value = tools.dispatch(&call, None).await;
        assert_eq!(value, json!([{"error": "GitHub token not provided"}]));
    }

    #[tokio::test]
    async fn test_dispatch_json_rejects_malformed_call() {
        let value = PrTools::default().dispatch_json("{not json", Some("t")).await;
        let message = value["error"].as_str().unwrap();
        assert!(message.starts_with("Invalid tool call"));
    }

    #[tokio::test]
    async fn test_dispatch_json_keeps_list_shape_for_bad_file_call() {
        let raw = r#"{"name": "get_pr_files", "arguments": {"repo_owner": "org", "repo_name": "repo", "pr_number": "7"}}"#;
        let value = PrTools::default().dispatch_json(raw, Some("t")).await;
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0]["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid tool call"));

        let raw = r#"{"name": "get_pr_details", "arguments": {"repo_owner": "org", "repo_name": "repo", "pr_number": "7"}}"#;
        let value = PrTools::default().dispatch_json(raw, Some("t")).await;
        assert!(value.is_object());
    }
}
