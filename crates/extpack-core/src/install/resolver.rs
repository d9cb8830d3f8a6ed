use super::collaborators::{FetchError, ReleaseFetcher};
use crate::pack::{ExtensionDescriptor, ExtensionKind, ExtensionSource, Pack, RepoRef};
use crate::{Error, Settings, ValidationError, bundle, extension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CHROME_WEB_STORE_URL: &str = "https://chromewebstore.google.com/detail";

/// How far below a cached download the manifest may sit
const CACHE_SEARCH_DEPTH: usize = 3;

/// Progress notifications emitted while resolving a pack
#[derive(Debug, Clone, Copy)]
pub enum ProgressEvent<'a> {
    /// Resolution of entry `index` (0-based) of `total` is starting
    Started {
        index: usize,
        total: usize,
        descriptor: &'a ExtensionDescriptor,
    },
    /// Download progress for a `github` entry, `fraction` in `0.0..=1.0`
    Download {
        index: usize,
        total: usize,
        descriptor: &'a ExtensionDescriptor,
        fraction: f64,
    },
    /// Entry `index` is done, successfully or not
    Finished {
        index: usize,
        total: usize,
        descriptor: &'a ExtensionDescriptor,
        ok: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedExtension {
    pub index: usize,
    pub name: String,
    pub kind: ExtensionKind,
    pub path: PathBuf,
    /// Served from an existing cache entry without fetching
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManualInstall {
    pub index: usize,
    pub name: String,
    pub store_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionFailure {
    pub index: usize,
    pub name: String,
    pub kind: ExtensionKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Outcome of resolving every entry of a pack
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionReport {
    /// Directories ready to load, in pack order
    pub ready: Vec<ResolvedExtension>,
    /// Store entries the user has to install by hand
    pub manual: Vec<ManualInstall>,
    pub errors: Vec<ResolutionFailure>,
}

impl ResolutionReport {
    pub fn directories(&self) -> Vec<PathBuf> {
        self.ready.iter().map(|r| r.path.clone()).collect()
    }
}

#[derive(Error, Debug)]
enum EntryError {
    #[error("Extension directory no longer exists: {}", .0.display())]
    Missing(PathBuf),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Core(#[from] Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl EntryError {
    fn hint(&self) -> Option<String> {
        match self {
            EntryError::Missing(_) => Some("rebuild the pack or restore the directory".to_string()),
            EntryError::Invalid(_) => Some("fix the extension's manifest.json".to_string()),
            EntryError::Core(Error::CorruptBundle { .. }) => {
                Some("the pack file is damaged; recreate it".to_string())
            }
            EntryError::Core(_) => None,
            EntryError::Fetch(err) => err.hint(),
        }
    }
}

enum Resolution {
    Ready { path: PathBuf, cached: bool },
    Manual { store_id: String },
}

/// Turns pack entries into on-disk extension directories.
///
/// Entries are handled one at a time, in order; a failing entry is recorded
/// and never stops the ones after it.
pub struct Resolver<'a> {
    settings: &'a Settings,
    fetcher: &'a dyn ReleaseFetcher,
}

impl<'a> Resolver<'a> {
    pub fn new(settings: &'a Settings, fetcher: &'a dyn ReleaseFetcher) -> Self {
        Self { settings, fetcher }
    }

    pub fn resolve(
        &self,
        pack: &Pack,
        on_progress: &mut dyn FnMut(ProgressEvent<'_>),
    ) -> ResolutionReport {
        let total = pack.extensions.len();
        let mut report = ResolutionReport::default();

        tracing::info!("Resolving {} extension(s) of pack '{}'", total, pack.name);

        for (index, descriptor) in pack.extensions.iter().enumerate() {
            on_progress(ProgressEvent::Started {
                index,
                total,
                descriptor,
            });

            let outcome = self.resolve_one(pack, index, total, descriptor, on_progress);
            let ok = outcome.is_ok();

            match outcome {
                Ok(Resolution::Ready { path, cached }) => {
                    tracing::debug!("'{}' ready at {}", descriptor.name, path.display());
                    report.ready.push(ResolvedExtension {
                        index,
                        name: descriptor.name.clone(),
                        kind: descriptor.kind(),
                        path,
                        cached,
                    });
                }
                Ok(Resolution::Manual { store_id }) => {
                    report.manual.push(ManualInstall {
                        index,
                        name: descriptor.name.clone(),
                        url: format!("{}/{}", CHROME_WEB_STORE_URL, store_id),
                        store_id,
                    });
                }
                Err(err) => {
                    tracing::warn!("Could not resolve '{}': {}", descriptor.name, err);
                    report.errors.push(ResolutionFailure {
                        index,
                        name: descriptor.name.clone(),
                        kind: descriptor.kind(),
                        message: err.to_string(),
                        hint: err.hint(),
                    });
                }
            }

            on_progress(ProgressEvent::Finished {
                index,
                total,
                descriptor,
                ok,
            });
        }

        tracing::info!(
            "Resolved {} ready, {} manual, {} failed",
            report.ready.len(),
            report.manual.len(),
            report.errors.len()
        );

        report
    }

    fn resolve_one(
        &self,
        pack: &Pack,
        index: usize,
        total: usize,
        descriptor: &ExtensionDescriptor,
        on_progress: &mut dyn FnMut(ProgressEvent<'_>),
    ) -> Result<Resolution, EntryError> {
        match &descriptor.source {
            ExtensionSource::Local { path } => {
                if !path.exists() {
                    return Err(EntryError::Missing(path.clone()));
                }
                extension::validate(path)?;
                Ok(Resolution::Ready {
                    path: path.clone(),
                    cached: false,
                })
            }
            ExtensionSource::Bundled { .. } => {
                let target = self.bundled_target(pack, index, descriptor);
                if target.exists() {
                    std::fs::remove_dir_all(&target).map_err(|e| Error::Io {
                        path: target.clone(),
                        source: e,
                    })?;
                }
                let path = bundle::extract(descriptor, &target)?;
                extension::validate(&path)?;
                Ok(Resolution::Ready {
                    path,
                    cached: false,
                })
            }
            ExtensionSource::Github { repo, release_tag } => {
                let slot = self.github_slot(repo, release_tag.as_deref());

                if let Some(path) = cached_extension(&slot) {
                    tracing::debug!("Cache hit for {} at {}", repo, path.display());
                    return Ok(Resolution::Ready { path, cached: true });
                }
                if slot.exists() {
                    tracing::warn!("Cached copy of {} is unusable, fetching again", repo);
                }

                let mut report_download = |fraction: f64| {
                    on_progress(ProgressEvent::Download {
                        index,
                        total,
                        descriptor,
                        fraction,
                    })
                };
                let path = self.fetcher.fetch(
                    repo,
                    release_tag.as_deref(),
                    &slot,
                    &mut report_download,
                )?;
                extension::validate(&path)?;
                Ok(Resolution::Ready {
                    path,
                    cached: false,
                })
            }
            ExtensionSource::Store { id } => Ok(Resolution::Manual {
                store_id: id.clone(),
            }),
        }
    }

    /// Entries sharing a name and version still get their own directory
    fn bundled_target(
        &self,
        pack: &Pack,
        index: usize,
        descriptor: &ExtensionDescriptor,
    ) -> PathBuf {
        let version = descriptor.version.as_deref().unwrap_or("0");
        self.settings.bundled_cache_dir().join(slug(&pack.name)).join(format!(
            "{}-{}-{}",
            index,
            slug(&descriptor.name),
            slug(version)
        ))
    }

    fn github_slot(&self, repo: &RepoRef, tag: Option<&str>) -> PathBuf {
        self.settings
            .github_cache_dir()
            .join(slug(&repo.owner))
            .join(slug(&repo.name))
            .join(tag.map(slug).unwrap_or_else(|| "latest".to_string()))
    }
}

/// A cache slot counts as a hit only if it still holds a valid extension
fn cached_extension(slot: &Path) -> Option<PathBuf> {
    if !slot.is_dir() {
        return None;
    }
    let root = extension::locate_root(slot, CACHE_SEARCH_DEPTH)?;
    extension::validate(&root).ok()?;
    Some(root)
}

/// Filesystem-safe, deterministic directory name
pub(crate) fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }

    let trimmed = out.trim_matches(|c| c == '-' || c == '.');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::ExclusionPolicy;
    use crate::extension::MANIFEST_FILE;
    use crate::pack::Author;
    use std::cell::RefCell;
    use std::fs;

    const MANIFEST: &str = r#"{"manifest_version": 3, "name": "E", "version": "1.0"}"#;

    /// Writes a valid extension under `dest/<repo>-main/` and counts calls
    struct FakeFetcher {
        calls: RefCell<usize>,
        fail_with: Option<FetchError>,
    }

    impl FakeFetcher {
        fn working() -> Self {
            Self {
                calls: RefCell::new(0),
                fail_with: None,
            }
        }

        fn failing(err: FetchError) -> Self {
            Self {
                calls: RefCell::new(0),
                fail_with: Some(err),
            }
        }
    }

    impl ReleaseFetcher for FakeFetcher {
        fn fetch(
            &self,
            repo: &RepoRef,
            _tag: Option<&str>,
            dest: &Path,
            progress: &mut dyn FnMut(f64),
        ) -> Result<PathBuf, FetchError> {
            *self.calls.borrow_mut() += 1;
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            let root = dest.join(format!("{}-main", repo.name));
            fs::create_dir_all(&root).unwrap();
            fs::write(root.join(MANIFEST_FILE), MANIFEST).unwrap();
            progress(0.5);
            progress(1.0);
            Ok(root)
        }
    }

    fn make_extension(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), MANIFEST).unwrap();
    }

    fn local(name: &str, path: &Path) -> ExtensionDescriptor {
        ExtensionDescriptor::new(
            name,
            ExtensionSource::Local {
                path: path.to_path_buf(),
            },
        )
    }

    fn github(name: &str, tag: Option<&str>) -> ExtensionDescriptor {
        ExtensionDescriptor::new(
            name,
            ExtensionSource::Github {
                repo: RepoRef::new("octo", name),
                release_tag: tag.map(str::to_string),
            },
        )
    }

    fn store(name: &str, id: &str) -> ExtensionDescriptor {
        ExtensionDescriptor::new(name, ExtensionSource::Store { id: id.to_string() })
    }

    #[test]
    fn test_one_missing_local_does_not_block_the_rest() {
        let home = tempfile::tempdir().unwrap();
        let exts = tempfile::tempdir().unwrap();
        let (a, b, c) = (
            exts.path().join("a"),
            exts.path().join("b"),
            exts.path().join("c"),
        );
        make_extension(&a);
        make_extension(&b);
        make_extension(&c);
        fs::remove_dir_all(&b).unwrap();

        let pack = Pack::new(
            "three",
            "",
            Author::default(),
            vec![local("a", &a), local("b", &b), local("c", &c)],
        );
        let settings = Settings::rooted(home.path());
        let fetcher = FakeFetcher::working();
        let report = Resolver::new(&settings, &fetcher).resolve(&pack, &mut |_| {});

        assert_eq!(report.ready.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].name, "b");
        assert_eq!(report.directories(), vec![a, c]);
    }

    #[test]
    fn test_store_entries_need_manual_install() {
        let home = tempfile::tempdir().unwrap();
        let pack = Pack::new(
            "store only",
            "",
            Author::default(),
            vec![store("one", "aaaa"), store("two", "bbbb")],
        );
        let settings = Settings::rooted(home.path());
        let fetcher = FakeFetcher::working();
        let report = Resolver::new(&settings, &fetcher).resolve(&pack, &mut |_| {});

        assert!(report.ready.is_empty());
        assert!(report.errors.is_empty());
        assert_eq!(report.manual.len(), 2);
        assert_eq!(
            report.manual[1].url,
            "https://chromewebstore.google.com/detail/bbbb"
        );
    }

    #[test]
    fn test_bundled_entries_are_extracted_into_cache() {
        let home = tempfile::tempdir().unwrap();
        let source = tempfile::tempdir().unwrap();
        make_extension(source.path());
        fs::write(source.path().join("content.js"), "alert(1)").unwrap();

        let descriptor = bundle::bundle(source.path(), &ExclusionPolicy::default()).unwrap();
        let pack = Pack::new("My Pack!", "", Author::default(), vec![descriptor]);
        let settings = Settings::rooted(home.path());
        let fetcher = FakeFetcher::working();
        let resolver = Resolver::new(&settings, &fetcher);

        let report = resolver.resolve(&pack, &mut |_| {});
        assert_eq!(report.ready.len(), 1);
        let path = &report.ready[0].path;
        assert!(path.starts_with(settings.bundled_cache_dir().join("my-pack")));
        assert_eq!(fs::read_to_string(path.join("content.js")).unwrap(), "alert(1)");

        // stale files from a previous extraction are cleared
        fs::write(path.join("stale.js"), "old").unwrap();
        let again = resolver.resolve(&pack, &mut |_| {});
        assert_eq!(again.ready[0].path, *path);
        assert!(!path.join("stale.js").exists());
    }

    #[test]
    fn test_same_named_bundles_get_separate_directories() {
        let home = tempfile::tempdir().unwrap();
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        for (dir, body) in [(first.path(), "first"), (second.path(), "second")] {
            fs::write(
                dir.join(MANIFEST_FILE),
                r#"{"manifest_version": 3, "name": "Same", "version": "1.0"}"#,
            )
            .unwrap();
            fs::write(dir.join("content.js"), body).unwrap();
        }

        let policy = ExclusionPolicy::default();
        let pack = Pack::new(
            "p",
            "",
            Author::default(),
            vec![
                bundle::bundle(first.path(), &policy).unwrap(),
                bundle::bundle(second.path(), &policy).unwrap(),
            ],
        );
        let settings = Settings::rooted(home.path());
        let fetcher = FakeFetcher::working();
        let report = Resolver::new(&settings, &fetcher).resolve(&pack, &mut |_| {});

        assert_eq!(report.ready.len(), 2);
        assert_ne!(report.ready[0].path, report.ready[1].path);
        assert_eq!(
            fs::read_to_string(report.ready[0].path.join("content.js")).unwrap(),
            "first"
        );
        assert_eq!(
            fs::read_to_string(report.ready[1].path.join("content.js")).unwrap(),
            "second"
        );
    }

    #[test]
    fn test_github_cache_hit_skips_fetch() {
        let home = tempfile::tempdir().unwrap();
        let settings = Settings::rooted(home.path());
        let fetcher = FakeFetcher::working();
        let resolver = Resolver::new(&settings, &fetcher);
        let pack = Pack::new("gh", "", Author::default(), vec![github("tool", Some("v1.2.0"))]);

        let mut downloads = Vec::new();
        let first = resolver.resolve(&pack, &mut |event| {
            if let ProgressEvent::Download { fraction, .. } = event {
                downloads.push(fraction);
            }
        });
        assert_eq!(first.ready.len(), 1);
        assert!(!first.ready[0].cached);
        assert_eq!(downloads, vec![0.5, 1.0]);

        let second = resolver.resolve(&pack, &mut |_| {});
        assert!(second.ready[0].cached);
        assert_eq!(second.ready[0].path, first.ready[0].path);
        assert_eq!(*fetcher.calls.borrow(), 1);
    }

    #[test]
    fn test_invalid_cache_entry_is_refetched() {
        let home = tempfile::tempdir().unwrap();
        let settings = Settings::rooted(home.path());
        let slot = settings
            .github_cache_dir()
            .join("octo")
            .join("tool")
            .join("latest");
        fs::create_dir_all(&slot).unwrap();
        fs::write(slot.join(MANIFEST_FILE), "{ broken").unwrap();

        let fetcher = FakeFetcher::working();
        let pack = Pack::new("gh", "", Author::default(), vec![github("tool", None)]);
        let report = Resolver::new(&settings, &fetcher).resolve(&pack, &mut |_| {});

        assert_eq!(*fetcher.calls.borrow(), 1);
        assert_eq!(report.ready.len(), 1);
        assert!(!report.ready[0].cached);
    }

    #[test]
    fn test_fetch_failures_carry_hints() {
        let home = tempfile::tempdir().unwrap();
        let settings = Settings::rooted(home.path());
        let fetcher = FakeFetcher::failing(FetchError::RateLimited { reset_at: None });
        let pack = Pack::new(
            "mixed",
            "",
            Author::default(),
            vec![github("tool", None), store("s", "cccc")],
        );

        let mut events = Vec::new();
        let report = Resolver::new(&settings, &fetcher).resolve(&pack, &mut |event| {
            if let ProgressEvent::Finished { index, ok, .. } = event {
                events.push((index, ok));
            }
        });

        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].hint.as_deref().unwrap().contains("GITHUB_TOKEN"));
        assert_eq!(report.manual.len(), 1);
        assert_eq!(events, vec![(0, false), (1, true)]);
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("My Pack!"), "my-pack");
        assert_eq!(slug("v1.2.0"), "v1.2.0");
        assert_eq!(slug("../.."), "unnamed");
        assert_eq!(slug("a  b"), "a-b");
    }
}
