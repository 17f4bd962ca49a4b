use std::time::Duration;

/// Counters for one mirror pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Issue pages fetched
    pub issue_pages: usize,
    /// Issue files written
    pub issues: usize,
    /// Comment pages fetched, across all issues
    pub comment_pages: usize,
    /// Comment files written
    pub comments: usize,
    /// Wall-clock time of the pass
    pub elapsed: Duration,
}
