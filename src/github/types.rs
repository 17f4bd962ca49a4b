use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum page size the GitHub REST API accepts.
pub const PER_PAGE: u8 = 100;

/// An issue as returned by the list-issues endpoint.
///
/// Only the fields the mirror acts on are typed; everything else (title, body,
/// state, user, timestamps, ...) is kept verbatim in `rest` so the written file
/// reads back as the record that was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    /// Comment count.
    pub comments: u64,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// An issue comment. Scoped under its parent issue by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Repository the client is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    /// The one repository this tool mirrors.
    pub fn jekyll() -> Self {
        RepoId {
            owner: "jekyll".to_string(),
            repo: "jekyll".to_string(),
        }
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
}

impl IssueState {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueState::Open => "open",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
        }
    }
}

/// Page cursor plus the filters of a list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Only meaningful for issue listings; comment listings leave it unset.
    pub state: Option<IssueState>,
    pub sort: &'static str,
    pub direction: Direction,
    pub page: u32,
    pub per_page: u8,
}

impl ListOptions {
    /// First page of open issues, oldest first.
    pub fn open_issues() -> Self {
        ListOptions {
            state: Some(IssueState::Open),
            ..Self::comments()
        }
    }

    /// First page of an issue's comments, oldest first.
    pub fn comments() -> Self {
        ListOptions {
            state: None,
            sort: "created",
            direction: Direction::Asc,
            page: 0,
            per_page: PER_PAGE,
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::with_capacity(5);
        if let Some(state) = self.state {
            query.push(("state", state.as_str().to_string()));
        }
        query.push(("sort", self.sort.to_string()));
        query.push(("direction", self.direction.as_str().to_string()));
        query.push(("page", self.page.to_string()));
        query.push(("per_page", self.per_page.to_string()));
        query
    }
}

/// One page of a list call.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` on the last page.
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    /// Zero is treated like an absent next page.
    pub fn new(items: Vec<T>, next_page: Option<u32>) -> Self {
        Page {
            items,
            next_page: next_page.filter(|p| *p != 0),
        }
    }
}
