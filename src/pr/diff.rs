use super::types::{Hunk, LineKind, PatchLine};
use super::PrError;

/// Parse the `patch` GitHub returns for one changed file into hunks.
///
/// The patch has no `diff --git` preamble; it starts at the first hunk header:
///   @@ -{old_start},{old_count} +{new_start},{new_count} @@ optional context
///
/// Positions follow GitHub's review-comment convention: the line right below
/// the first `@@` header is position 1, and every following line counts,
/// including later hunk headers.
pub fn parse_patch(patch: &str) -> Result<Vec<Hunk>, PrError> {
    let mut hunks: Vec<Hunk> = Vec::new();
    let mut old_line: u64 = 0;
    let mut new_line: u64 = 0;

    for (index, line) in patch.lines().enumerate() {
        let position = index as u64;

        if line.starts_with("@@") {
            let (old_start, old_count, new_start, new_count) = parse_hunk_header(line)?;
            old_line = old_start;
            new_line = new_start;
            hunks.push(Hunk {
                old_start,
                old_count,
                new_start,
                new_count,
                header_position: position,
                lines: Vec::new(),
            });
            continue;
        }

        let hunk = hunks.last_mut().ok_or_else(|| {
            PrError::DiffParse("Patch does not start with a hunk header".to_string())
        })?;

        let (kind, old, new) = match line.chars().next() {
            Some('+') => (LineKind::Added, None, Some(new_line)),
            Some('-') => (LineKind::Removed, Some(old_line), None),
            Some('\\') => (LineKind::Marker, None, None),
            // GitHub strips the leading space of blank context lines.
            Some(' ') | None => (LineKind::Context, Some(old_line), Some(new_line)),
            Some(_) => {
                return Err(PrError::DiffParse(format!(
                    "Unexpected line in hunk at position {position}"
                )))
            }
        };
        if old.is_some() {
            old_line = old_line.saturating_add(1);
        }
        if new.is_some() {
            new_line = new_line.saturating_add(1);
        }

        hunk.lines.push(PatchLine {
            position,
            kind,
            old_line: old,
            new_line: new,
        });
    }

    Ok(hunks)
}

/// The review-comment position of `new_line` (a line number in the head
/// version of the file), or `None` when that line is not shown in the patch.
pub fn position_for_line(hunks: &[Hunk], new_line: u64) -> Option<u64> {
    hunks
        .iter()
        .filter(|hunk| new_line >= hunk.new_start && new_line - hunk.new_start < hunk.new_count)
        .flat_map(|hunk| hunk.lines.iter())
        .find(|line| line.new_line == Some(new_line))
        .map(|line| line.position)
}

fn parse_hunk_header(line: &str) -> Result<(u64, u64, u64, u64), PrError> {
    let header = line
        .trim()
        .strip_prefix("@@")
        .ok_or_else(|| PrError::DiffParse("Invalid hunk header".to_string()))?;
    let (ranges, _section) = header
        .split_once("@@")
        .ok_or_else(|| PrError::DiffParse(format!("Unterminated hunk header: {line}")))?;
    let mut parts = ranges.split_whitespace();
    let old_part = parts
        .next()
        .ok_or_else(|| PrError::DiffParse("Missing old range".to_string()))?;
    let new_part = parts
        .next()
        .ok_or_else(|| PrError::DiffParse("Missing new range".to_string()))?;

    let (old_start, old_count) = parse_range(old_part, '-')?;
    let (new_start, new_count) = parse_range(new_part, '+')?;

    Ok((old_start, old_count, new_start, new_count))
}

fn parse_range(part: &str, prefix: char) -> Result<(u64, u64), PrError> {
    let range = part
        .strip_prefix(prefix)
        .ok_or_else(|| PrError::DiffParse("Invalid range prefix".to_string()))?;
    let (start_str, count_str) = match range.split_once(',') {
        Some((start, count)) => (start, count),
        None => (range, "1"),
    };
    let start = start_str
        .parse::<u64>()
        .map_err(|_| PrError::DiffParse(format!("Invalid range start in {}", part)))?;
    let count = count_str
        .parse::<u64>()
        .map_err(|_| PrError::DiffParse(format!("Invalid range count in {}", part)))?;
    Ok((start, count))
}
