use extpack_core::install::FetchError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),

    #[error("GitHub API rate limit exceeded")]
    RateLimited { reset_at: Option<String> },

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid archive: {0}")]
    Archive(String),

    #[error("No manifest.json found in {}", .0.display())]
    NoManifest(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for FetchError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(what) => FetchError::NotFound(what),
            Error::RateLimited { reset_at } => FetchError::RateLimited { reset_at },
            Error::Http(e) if e.is_connect() || e.is_timeout() => {
                FetchError::Unreachable(e.to_string())
            }
            other => FetchError::Failed(other.to_string()),
        }
    }
}
