use clap::{Parser, Subcommand};
use pr_review_tools::config::Config;
use pr_review_tools::pr::{self, PrUrl};
use pr_review_tools::tools::{self, ReviewComment, ReviewEvent};
use pr_review_tools::PrTools;
use serde_json::{json, Value};
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

/// pr-review-tools: run the pull-request review tools from the command line.
/// Results are printed to stdout as JSON.
#[derive(Parser, Debug)]
#[command(name = "pr-review-tools", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a pull request's metadata
    Details {
        /// Pull request URL (e.g., https://github.com/org/repo/pull/42)
        pr_url: String,
    },

    /// List the files a pull request changes, with their content
    Files { pr_url: String },

    /// Submit a review
    Review {
        pr_url: String,

        /// APPROVE, REQUEST_CHANGES or COMMENT
        #[arg(short, long)]
        event: String,

        /// Overall review comment
        #[arg(short, long, default_value = "")]
        body: String,

        /// JSON file with an array of {"path", "position", "body"} comments
        #[arg(short, long)]
        comments: Option<PathBuf>,
    },

    /// Post a general comment
    Comment { pr_url: String, text: String },

    /// Translate a file line number into a review-comment position
    Position {
        pr_url: String,
        /// Repository-relative path of the file
        path: String,
        /// Line number in the head version of the file
        line: u64,
    },

    /// Run a raw tool call: {"name": "...", "arguments": {...}}
    Call {
        /// The call as JSON; read from stdin when omitted
        json: Option<String>,
    },

    /// Print the tool descriptors
    Schema,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = Config::load()?;
    let pr_tools = PrTools::new(config.endpoint());
    debug!(api_url = %pr_tools.endpoint().api_url(), "configured endpoint");
    let token = config.github_token();

    let output = match cli.command {
        Command::Schema => serde_json::to_value(tools::descriptors())?,
        Command::Call { json } => {
            let raw = match json {
                Some(raw) => raw,
                None => {
                    let mut raw = String::new();
                    std::io::stdin().read_to_string(&mut raw)?;
                    raw
                }
            };
            pr_tools.dispatch_json(&raw, token.as_deref()).await
        }
        Command::Details { pr_url } => {
            let target = parse_target(&pr_url)?;
            let token = require_token(token)?;
            tools::fold(
                &pr_tools
                    .get_pr_details(&target.owner, &target.repo, target.pr_number, &token)
                    .await,
            )
        }
        Command::Files { pr_url } => {
            let target = parse_target(&pr_url)?;
            let token = require_token(token)?;
            tools::fold_files(
                &pr_tools
                    .get_pr_files(&target.owner, &target.repo, target.pr_number, &token)
                    .await,
            )
        }
        Command::Review {
            pr_url,
            event,
            body,
            comments,
        } => {
            let target = parse_target(&pr_url)?;
            let token = require_token(token)?;
            let comments: Vec<ReviewComment> = match comments {
                Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
                None => Vec::new(),
            };
            let event = ReviewEvent::from(event);
            tools::fold(
                &pr_tools
                    .submit_pr_review(
                        &target.owner,
                        &target.repo,
                        target.pr_number,
                        &body,
                        &comments,
                        &event,
                        &token,
                    )
                    .await,
            )
        }
        Command::Comment { pr_url, text } => {
            let target = parse_target(&pr_url)?;
            let token = require_token(token)?;
            tools::fold(
                &pr_tools
                    .add_pr_comment(&target.owner, &target.repo, target.pr_number, &text, &token)
                    .await,
            )
        }
        Command::Position { pr_url, path, line } => {
            let target = parse_target(&pr_url)?;
            let token = require_token(token)?;
            let _span = info_span!("position", path = %path, line).entered();
            let located = pr_tools
                .get_pr_files(&target.owner, &target.repo, target.pr_number, &token)
                .await
                .and_then(|files| tools::locate_position(&files, &path, line));
            match located {
                Ok(position) => json!({ "path": path, "line": line, "position": position }),
                Err(err) => json!(err),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    info!(failed = is_error(&output), "done");
    Ok(())
}

fn parse_target(pr_url: &str) -> Result<PrUrl, pr::PrError> {
    let _span = info_span!("parse_pr_url", pr_url = %pr_url).entered();
    let target = pr::parse_pr_url(pr_url)?;
    debug!(host = %target.host, owner = %target.owner, repo = %target.repo, pr = target.pr_number, "parsed PR URL");
    Ok(target)
}

fn require_token(token: Option<String>) -> Result<String, &'static str> {
    token.ok_or("GitHub token not found: set GITHUB_TOKEN or [github].token in .pr-review-tools.toml")
}

fn is_error(output: &Value) -> bool {
    match output {
        Value::Object(map) => map.contains_key("error"),
        Value::Array(items) => matches!(items.as_slice(), [Value::Object(map)] if map.contains_key("error")),
        _ => false,
    }
}
