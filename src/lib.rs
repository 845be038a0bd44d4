//! Pull-request tools for code-review agents.
//!
//! Four operations against the GitHub REST API: read a pull request's
//! metadata, read its changed files with their content, submit a review with
//! inline comments, and post a plain comment. See [`tools::PrTools`].

pub mod config;
pub mod github;
pub mod pr;
pub mod tools;

pub use github::Endpoint;
pub use tools::{ErrorInfo, PrTools};
