use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// Schema version stamped on newly created packs
pub const CURRENT_SCHEMA_VERSION: u64 = 3;

/// Oldest schema version still readable; upgraded transparently on read
pub const LEGACY_SCHEMA_VERSION: u64 = 2;

pub const DEFAULT_PACK_VERSION: &str = "1.0.0";

fn default_pack_version() -> String {
    DEFAULT_PACK_VERSION.to_string()
}

/// Top-level `.extpack` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pack {
    pub v: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: Author,
    #[serde(default = "default_pack_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub created: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    pub extensions: Vec<ExtensionDescriptor>,
}

impl Pack {
    /// Build a pack at the current schema version.
    ///
    /// Nothing is validated here; run `schema::validate` (or write the pack,
    /// which validates) before handing it to anyone else.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        author: Author,
        extensions: Vec<ExtensionDescriptor>,
    ) -> Self {
        Self {
            v: CURRENT_SCHEMA_VERSION,
            name: name.into(),
            description: description.into(),
            author,
            version: default_pack_version(),
            tags: BTreeSet::new(),
            created: chrono::Utc::now().to_rfc3339(),
            updated: None,
            extensions,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Default file name for this pack, e.g. `work-tools.extpack`
    pub fn file_name(&self) -> String {
        format!(
            "{}.{}",
            crate::install::slug(&self.name),
            super::PACK_FILE_EXTENSION
        )
    }

    /// Sum of encoded bundle sizes across all bundled extensions
    pub fn bundled_size(&self) -> usize {
        self.extensions
            .iter()
            .map(ExtensionDescriptor::bundle_size)
            .sum()
    }
}

/// Pack author, either a bare name or a name with a GitHub handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Name(String),
    Profile {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        github: Option<String>,
    },
}

impl Author {
    pub fn name(&self) -> &str {
        match self {
            Author::Name(name) => name,
            Author::Profile { name, .. } => name,
        }
    }

    pub fn github(&self) -> Option<&str> {
        match self {
            Author::Name(_) => None,
            Author::Profile { github, .. } => github.as_deref(),
        }
    }
}

impl Default for Author {
    fn default() -> Self {
        Author::Name(String::new())
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.github() {
            Some(handle) => write!(f, "{} (@{})", self.name(), handle),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// The four descriptor shapes a pack can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionKind {
    Local,
    Github,
    Store,
    Bundled,
}

impl ExtensionKind {
    pub const ALL: [ExtensionKind; 4] = [
        ExtensionKind::Local,
        ExtensionKind::Github,
        ExtensionKind::Store,
        ExtensionKind::Bundled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionKind::Local => "local",
            ExtensionKind::Github => "github",
            ExtensionKind::Store => "store",
            ExtensionKind::Bundled => "bundled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extension entry in a pack.
///
/// Metadata shared by every shape lives here; the `type` tag and the fields
/// only that shape requires live in [`ExtensionSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionDescriptor {
    #[serde(flatten)]
    pub source: ExtensionSource,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "manifestVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub manifest_version: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub permissions: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icons: Option<BTreeMap<String, String>>,
}

impl ExtensionDescriptor {
    /// Descriptor carrying only a name; metadata can be filled in afterwards
    pub fn new(name: impl Into<String>, source: ExtensionSource) -> Self {
        Self {
            source,
            name: name.into(),
            version: None,
            description: None,
            manifest_version: None,
            permissions: BTreeSet::new(),
            icons: None,
        }
    }

    pub fn kind(&self) -> ExtensionKind {
        self.source.kind()
    }

    /// Encoded size of embedded files, zero for non-bundled entries
    pub fn bundle_size(&self) -> usize {
        match &self.source {
            ExtensionSource::Bundled { files } => files.encoded_size(),
            _ => 0,
        }
    }

    /// Short human-readable description of where this extension comes from
    pub fn display_source(&self) -> String {
        match &self.source {
            ExtensionSource::Local { path } => path.display().to_string(),
            ExtensionSource::Github { repo, release_tag } => match release_tag {
                Some(tag) => format!("{}@{}", repo, tag),
                None => repo.to_string(),
            },
            ExtensionSource::Store { id } => id.clone(),
            ExtensionSource::Bundled { files } => format!("{} embedded file(s)", files.len()),
        }
    }
}

/// Type-specific part of a descriptor, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExtensionSource {
    Local {
        path: PathBuf,
    },
    Github {
        repo: RepoRef,
        #[serde(rename = "releaseTag", default, skip_serializing_if = "Option::is_none")]
        release_tag: Option<String>,
    },
    Store {
        id: String,
    },
    Bundled {
        files: BundledFiles,
    },
}

impl ExtensionSource {
    pub fn kind(&self) -> ExtensionKind {
        match self {
            ExtensionSource::Local { .. } => ExtensionKind::Local,
            ExtensionSource::Github { .. } => ExtensionKind::Github,
            ExtensionSource::Store { .. } => ExtensionKind::Store,
            ExtensionSource::Bundled { .. } => ExtensionKind::Bundled,
        }
    }
}

/// GitHub repository reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `owner/name`
    pub fn parse(value: &str) -> Option<Self> {
        let (owner, name) = value.trim().split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Relative path (always `/`-separated) to base64 text of gzip-compressed bytes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundledFiles(BTreeMap<String, String>);

impl BundledFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relative_path: impl Into<String>, encoded: impl Into<String>) {
        self.0.insert(relative_path.into(), encoded.into());
    }

    pub fn get(&self, relative_path: &str) -> Option<&str> {
        self.0.get(relative_path).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of encoded blob lengths. Display only, not an integrity check.
    pub fn encoded_size(&self) -> usize {
        self.0.values().map(String::len).sum()
    }
}
