/// The parts of a pull-request URL.
/// Extracted by `parse_pr_url()` in pr/mod.rs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrUrl {
    /// Host the URL points at (e.g., "github.com")
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

/// What a single patch line does to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Added,
    Removed,
    Context,
    /// "\ No newline at end of file"
    Marker,
}

/// One line of a hunk, with its review-comment position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchLine {
    /// Lines below the first hunk header; the line right under it is 1
    pub position: u64,
    pub kind: LineKind,
    /// Line number in the base version, for removed and context lines
    pub old_line: Option<u64>,
    /// Line number in the head version, for added and context lines
    pub new_line: Option<u64>,
}

/// A contiguous region of changes within a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// Starting line number in the old file
    pub old_start: u64,
    /// Number of lines in the old file
    pub old_count: u64,
    /// Starting line number in the new file
    pub new_start: u64,
    /// Number of lines in the new file
    pub new_count: u64,
    /// Position of the `@@` header itself (0 for the first hunk)
    pub header_position: u64,
    pub lines: Vec<PatchLine>,
}

