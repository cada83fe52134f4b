use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure raised while turning an orders file into an [`crate::loader::OrderTable`].
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("File {path:?} does not exist")]
    Missing { path: PathBuf },
    #[error("Unable to read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed CSV in {path:?} at line {line}: {message}")]
    Malformed {
        path: PathBuf,
        line: u64,
        message: String,
    },
}
