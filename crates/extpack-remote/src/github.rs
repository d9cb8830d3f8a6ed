use crate::archive::unpack_tar_gz;
use crate::{Error, Result};
use extpack_core::extension;
use extpack_core::install::{FetchError, ReleaseFetcher};
use extpack_core::pack::RepoRef;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// How deep to look for the manifest inside an unpacked source archive
const MANIFEST_SEARCH_DEPTH: usize = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

/// Downloads release source archives from the GitHub REST API
pub struct GitHubFetcher {
    client: Client,
    runtime: tokio::runtime::Runtime,
    api_base: String,
    token: Option<String>,
}

impl GitHubFetcher {
    /// `token` raises the API rate limit and grants access to private repos
    pub fn new(token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("extpack/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            client,
            runtime,
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn latest_release_url(&self, repo: &RepoRef) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base, repo.owner, repo.name
        )
    }

    fn tarball_url(&self, repo: &RepoRef, tag: &str) -> String {
        format!(
            "{}/repos/{}/{}/tarball/{}",
            self.api_base, repo.owner, repo.name, tag
        )
    }

    async fn get(&self, url: &str) -> Result<Response> {
        tracing::debug!("GET {}", url);

        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        Ok(request.send().await?)
    }

    async fn latest_tag(&self, repo: &RepoRef) -> Result<String> {
        let url = self.latest_release_url(repo);
        let response = self.get(&url).await?;
        check_status(
            response.status(),
            response.headers(),
            &url,
            || format!("no published release for {}", repo),
        )?;

        let release: Release = response.json().await?;
        tracing::debug!("Latest release of {} is {}", repo, release.tag_name);
        Ok(release.tag_name)
    }

    async fn download(&self, url: &str, what: &str, progress: &mut dyn FnMut(f64)) -> Result<Vec<u8>> {
        let mut response = self.get(url).await?;
        check_status(response.status(), response.headers(), url, || what.to_string())?;

        let total = response.content_length().unwrap_or(0);
        let mut bytes = Vec::with_capacity(initial_capacity(total));

        while let Some(chunk) = response.chunk().await? {
            bytes.extend_from_slice(&chunk);
            if total > 0 {
                progress((bytes.len() as f64 / total as f64).min(1.0));
            }
        }
        progress(1.0);

        tracing::debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }

    async fn fetch_release(
        &self,
        repo: &RepoRef,
        tag: Option<&str>,
        dest: &Path,
        progress: &mut dyn FnMut(f64),
    ) -> Result<PathBuf> {
        let tag = match tag {
            Some(tag) => tag.to_string(),
            None => self.latest_tag(repo).await?,
        };

        tracing::info!("Downloading {}@{}", repo, tag);
        let url = self.tarball_url(repo, &tag);
        let bytes = self
            .download(&url, &format!("release {} of {}", tag, repo), progress)
            .await?;

        install_into(&bytes, dest)
    }
}

impl ReleaseFetcher for GitHubFetcher {
    fn fetch(
        &self,
        repo: &RepoRef,
        tag: Option<&str>,
        dest: &Path,
        progress: &mut dyn FnMut(f64),
    ) -> std::result::Result<PathBuf, FetchError> {
        self.runtime
            .block_on(self.fetch_release(repo, tag, dest, progress))
            .map_err(FetchError::from)
    }
}

/// Unpack into a staging sibling of `dest`, then move it into place so a
/// half-written download never occupies the cache slot.
fn install_into(bytes: &[u8], dest: &Path) -> Result<PathBuf> {
    let parent = dest
        .parent()
        .ok_or_else(|| Error::Archive(format!("no parent directory for {}", dest.display())))?;
    std::fs::create_dir_all(parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".extpack-fetch-")
        .tempdir_in(parent)?;
    unpack_tar_gz(bytes, staging.path())?;

    if dest.exists() {
        std::fs::remove_dir_all(dest)?;
    }
    std::fs::rename(staging.path(), dest)?;

    extension::locate_root(dest, MANIFEST_SEARCH_DEPTH)
        .ok_or_else(|| Error::NoManifest(dest.to_path_buf()))
}

/// Map GitHub error statuses onto fetch failures
fn check_status(
    status: StatusCode,
    headers: &HeaderMap,
    url: &str,
    what: impl FnOnce() -> String,
) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }

    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound(what()));
    }

    let remaining = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok());
    let limited = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && remaining == Some("0"));

    if limited {
        let reset_at = headers
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
            .map(|time| time.to_rfc3339());
        return Err(Error::RateLimited { reset_at });
    }

    Err(Error::Status {
        status: status.as_u16(),
        url: url.to_string(),
    })
}

/// Upfront buffer size for a download; the announced length is only a hint
fn initial_capacity(content_length: u64) -> usize {
    usize::try_from(content_length.min(MAX_PREALLOCATION)).unwrap_or(0)
}
