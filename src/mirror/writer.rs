use serde::Serialize;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, Instrument, Span};

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("serializing record for {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("write task failed: {0}")]
    Join(#[from] JoinError),
}

/// Run `unit` once per item, all concurrently, and wait for every task.
///
/// Returns the results in completion order, or the first error observed.
/// Tasks still in flight when an error arrives are left to finish; their
/// outcomes are dropped.
pub async fn run_batch<T, R, E, F, Fut>(items: Vec<T>, unit: F) -> Result<Vec<R>, E>
where
    T: Send + 'static,
    R: Send + 'static,
    E: From<JoinError> + Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for item in items {
        tasks.spawn(unit(item).instrument(Span::current()));
    }

    let mut results = Vec::with_capacity(tasks.len());
    let mut first_err = None;
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(E::from).and_then(|r| r);
        match outcome {
            Ok(r) => results.push(r),
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(results),
    }
}

/// Serialize `value` as JSON and write it to `path`, creating the parent
/// directory first. Existing files are overwritten.
pub async fn write_json<V: Serialize + ?Sized>(path: &Path, value: &V) -> Result<(), WriteError> {
    let json = serde_json::to_vec(value).map_err(|source| WriteError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        create_dir_all(parent).await?;
    }

    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o644);
    let mut file = options.open(path).await.map_err(io_err)?;
    file.write_all(&json).await.map_err(io_err)?;
    file.flush().await.map_err(io_err)?;

    debug!(path = %path.display(), bytes = json.len(), "wrote file");
    Ok(())
}

/// `mkdir -p` with 0755 directories. Safe to race with other writers.
pub async fn create_dir_all(dir: &Path) -> Result<(), WriteError> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o755);
    builder.create(dir).await.map_err(|source| WriteError::Io {
        path: dir.to_path_buf(),
        source,
    })
}
