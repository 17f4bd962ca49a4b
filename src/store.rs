use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("error opening issue cache folder {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("issue cache root {} is not a directory", path.display())]
    NotADirectory { path: PathBuf },
}

/// Local store root. Maps issue numbers and comment ids onto paths:
///
/// ```text
/// <root>/issues/<number>.json
/// <root>/issues/<number>/comments/<id>.json
/// ```
///
/// The mapping functions do no I/O.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Create the root if absent and make sure it is a usable directory.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>) -> Result<Store, StoreError> {
        let root = root.as_ref().to_path_buf();
        let open_err = |source| StoreError::Open {
            path: root.clone(),
            source,
        };

        fs::create_dir_all(&root).map_err(open_err)?;
        let metadata = fs::metadata(&root).map_err(open_err)?;
        if !metadata.is_dir() {
            return Err(StoreError::NotADirectory { path: root.clone() });
        }
        // Listing catches roots we cannot read.
        fs::read_dir(&root).map_err(open_err)?;

        debug!("opened issue cache folder");
        Ok(Store { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn issue_file(&self, number: u64) -> PathBuf {
        self.issues_dir().join(format!("{number}.json"))
    }

    pub fn comments_dir(&self, number: u64) -> PathBuf {
        self.issues_dir().join(number.to_string()).join("comments")
    }

    pub fn comment_file(&self, number: u64, comment_id: u64) -> PathBuf {
        self.comments_dir(number).join(format!("{comment_id}.json"))
    }

    fn issues_dir(&self) -> PathBuf {
        self.root.join("issues")
    }
}
