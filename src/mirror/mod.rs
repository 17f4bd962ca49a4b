pub mod writer;

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, info, info_span, instrument, Instrument};

use crate::github::{Comment, FetchError, Issue, IssueSource, ListOptions};
use crate::report::RunSummary;
use crate::store::Store;
use writer::{create_dir_all, run_batch, write_json, WriteError};

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("listing issues; page {page}: {source}")]
    ListIssues {
        page: u32,
        #[source]
        source: FetchError,
    },

    #[error("listing comments for issue={issue}; page {page}: {source}")]
    ListComments {
        issue: u64,
        page: u32,
        #[source]
        source: FetchError,
    },

    #[error("writing issues; page {page}: {source}")]
    WriteIssues {
        page: u32,
        #[source]
        source: WriteError,
    },

    #[error("writing comments for issue={issue}; page {page}: {source}")]
    WriteComments {
        issue: u64,
        page: u32,
        #[source]
        source: WriteError,
    },

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("issue task failed: {0}")]
    Join(#[from] JoinError),
}

/// What one issue task produced.
#[derive(Debug, Default, Clone, Copy)]
struct IssueOutcome {
    comment_pages: usize,
    comments: usize,
}

/// Drives one mirror pass: issue pages in sequence, every issue of a page in
/// parallel, and per issue its comment pages in sequence.
pub struct Mirror {
    source: Arc<dyn IssueSource>,
    store: Arc<Store>,
}

impl Mirror {
    pub fn new(source: Arc<dyn IssueSource>, store: Store) -> Self {
        Mirror {
            source,
            store: Arc::new(store),
        }
    }

    /// Mirror every open issue. The next issue page is only fetched once all
    /// issues of the current page (comments included) are on disk.
    pub async fn run(&self) -> Result<RunSummary, MirrorError> {
        let started = Instant::now();
        let mut summary = RunSummary::default();
        let mut opts = ListOptions::open_issues();

        loop {
            let page = self
                .source
                .list_issues(&opts)
                .await
                .map_err(|source| MirrorError::ListIssues {
                    page: opts.page,
                    source,
                })?;
            summary.issue_pages += 1;

            let outcomes = self
                .write_issues(page.items)
                .instrument(info_span!("issues_page", page = opts.page))
                .await
                .map_err(|err| match err {
                    MirrorError::Write(source) => MirrorError::WriteIssues {
                        page: opts.page,
                        source,
                    },
                    other => other,
                })?;
            summary.issues += outcomes.len();
            for outcome in &outcomes {
                summary.comment_pages += outcome.comment_pages;
                summary.comments += outcome.comments;
            }

            match page.next_page {
                Some(next) => opts.page = next,
                None => {
                    info!("no more pages");
                    break;
                }
            }
        }

        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    async fn write_issues(&self, issues: Vec<Issue>) -> Result<Vec<IssueOutcome>, MirrorError> {
        debug!("processing {} issues", issues.len());
        let source = self.source.clone();
        let store = self.store.clone();
        run_batch(issues, move |issue| {
            mirror_issue(source.clone(), store.clone(), issue)
        })
        .await
    }
}

#[instrument(skip_all, fields(issue = issue.number))]
async fn mirror_issue(
    source: Arc<dyn IssueSource>,
    store: Arc<Store>,
    issue: Issue,
) -> Result<IssueOutcome, MirrorError> {
    let started = Instant::now();
    let number = issue.number;
    debug!("started processing {number}");

    write_json(&store.issue_file(number), &issue).await?;

    let outcome = if issue.comments == 0 {
        IssueOutcome::default()
    } else {
        mirror_comments(source.as_ref(), &store, number).await?
    };

    info!(
        comments = outcome.comments,
        "finished processing {number} in {:?}",
        started.elapsed()
    );
    Ok(outcome)
}

async fn mirror_comments(
    source: &dyn IssueSource,
    store: &Arc<Store>,
    number: u64,
) -> Result<IssueOutcome, MirrorError> {
    create_dir_all(&store.comments_dir(number)).await?;

    let mut outcome = IssueOutcome::default();
    let mut opts = ListOptions::comments();
    loop {
        let page = source
            .list_comments(number, &opts)
            .await
            .map_err(|source| MirrorError::ListComments {
                issue: number,
                page: opts.page,
                source,
            })?;
        outcome.comment_pages += 1;

        outcome.comments += write_comments(store, number, page.items)
            .await
            .map_err(|source| MirrorError::WriteComments {
                issue: number,
                page: opts.page,
                source,
            })?;

        match page.next_page {
            Some(next) => opts.page = next,
            None => return Ok(outcome),
        }
    }
}

async fn write_comments(
    store: &Arc<Store>,
    number: u64,
    comments: Vec<Comment>,
) -> Result<usize, WriteError> {
    debug!("processing {} comments for issue={number}", comments.len());
    let store = store.clone();
    let written = run_batch(comments, move |comment| {
        let store = store.clone();
        async move { write_json(&store.comment_file(number, comment.id), &comment).await }
    })
    .await?;
    Ok(written.len())
}
