pub mod diff;
pub mod types;

pub use types::PrUrl;

use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("Invalid PR URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to parse diff: {0}")]
    DiffParse(String),
}

/// Parse a pull-request URL into its component parts.
///
/// Expected format: https://{host}/{owner}/{repo}/pull/{number}, where host is
/// github.com or a GitHub Enterprise server. Trailing segments such as
/// `/files` or `/commits` are accepted and ignored.
pub fn parse_pr_url(url: &str) -> Result<PrUrl, PrError> {
    let invalid = || PrError::InvalidUrl(url.to_string());
    let parsed = Url::parse(url).map_err(|_| invalid())?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }
    let host = parsed.host_str().ok_or_else(invalid)?.to_string();

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|segment| !segment.is_empty())
        .collect();

    match segments.as_slice() {
        [owner, repo, "pull", number, ..] => {
            let pr_number = number.parse::<u64>().map_err(|_| invalid())?;
            if pr_number == 0 {
                return Err(invalid());
            }
            Ok(PrUrl {
                host,
                owner: owner.to_string(),
                repo: repo.to_string(),
                pr_number,
            })
        }
        _ => Err(invalid()),
    }
}
