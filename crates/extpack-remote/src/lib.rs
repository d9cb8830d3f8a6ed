//! Fetches extension sources hosted on GitHub releases.

mod archive;
mod error;
mod github;

pub use archive::unpack_tar_gz;
pub use error::{Error, Result};
pub use github::{DEFAULT_API_BASE, GitHubFetcher};
