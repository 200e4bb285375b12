//! Tag cache: the persisted set of known dataset tags, refreshed on demand from every portal.
//!
//! File format: `{ "tags": [string, ...] }`, sorted. A refresh fully replaces the set (stale
//! tags are dropped) and the file is replaced atomically (temp file + rename). The in-memory
//! write lock is held across the file write, so memory and disk hold the same set.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::portal::{listing_url, PortalClient, PortalRegistry};

#[derive(Debug, Error)]
pub enum TagStoreError {
    #[error("tag store io ({path}): {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("tag store json ({path}): {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TagFile {
    #[serde(default)]
    tags: Vec<String>,
}

/// Known tags, in memory and on disk.
///
/// **Interaction**: Read by `DatasetFinder` for tag validation; replaced by [`refresh_tags`].
pub struct TagStore {
    path: PathBuf,
    tags: RwLock<BTreeSet<String>>,
}

impl TagStore {
    /// Opens the store at `path`. A missing file yields an empty set.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, TagStoreError> {
        let path = path.into();
        let tags = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let file: TagFile =
                    serde_json::from_str(&content).map_err(|source| TagStoreError::Json {
                        path: path.display().to_string(),
                        source,
                    })?;
                file.tags.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(source) => {
                return Err(TagStoreError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Ok(Self {
            path,
            tags: RwLock::new(tags),
        })
    }

    /// Store seeded with `tags` in memory; nothing is written until [`TagStore::replace`].
    pub fn with_tags<I, S>(path: impl Into<PathBuf>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into(),
            tags: RwLock::new(tags.into_iter().map(Into::into).collect()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Exact, case-sensitive membership.
    pub async fn contains(&self, tag: &str) -> bool {
        self.tags.read().await.contains(tag)
    }

    /// All known tags, sorted.
    pub async fn all(&self) -> Vec<String> {
        self.tags.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.tags.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tags.read().await.is_empty()
    }

    /// Replaces the whole set: writes the file atomically, then swaps the in-memory set.
    /// Readers wait until both are done; a failed write leaves the old set in place.
    pub async fn replace(&self, tags: BTreeSet<String>) -> Result<(), TagStoreError> {
        let file = TagFile {
            tags: tags.iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| TagStoreError::Json {
            path: self.path.display().to_string(),
            source,
        })?;
        let mut current = self.tags.write().await;
        write_atomic(&self.path, json.as_bytes()).await?;
        *current = tags;
        Ok(())
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), TagStoreError> {
    let io_err = |source| TagStoreError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tags.json".to_string());
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));
    tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
    if let Err(source) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(io_err(source));
    }
    Ok(())
}

/// Outcome of one tag refresh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Size of the new tag set.
    pub tag_count: usize,
    /// Listing pages fetched across all portals.
    pub pages: usize,
    /// Portals whose pagination stopped on an error.
    pub failed_portals: Vec<String>,
}

/// Crawls every portal's dataset listing and replaces the stored tag set with the union of
/// all `tags` fields.
///
/// A failing page aborts only that portal's loop; the refresh always writes what was collected.
pub async fn refresh_tags(
    client: &PortalClient,
    registry: &PortalRegistry,
    store: &TagStore,
) -> Result<RefreshReport, TagStoreError> {
    let mut tags = BTreeSet::new();
    let mut report = RefreshReport::default();

    for root in registry.roots() {
        let mut next = match listing_url(root, client.format()) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(portal = %root, error = %e, "tag refresh skipped portal");
                report.failed_portals.push(root.clone());
                continue;
            }
        };
        let mut visited = HashSet::new();
        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                warn!(portal = %root, url = %url, "next_page repeats, stopping");
                break;
            }
            match client.fetch_page(&url).await {
                Ok(page) => {
                    report.pages += 1;
                    for dataset in page.data {
                        tags.extend(dataset.tags);
                    }
                    next = page.next_page.filter(|n| !n.is_empty());
                }
                Err(e) => {
                    warn!(portal = %root, error = %e, "tag refresh aborted for portal");
                    report.failed_portals.push(root.clone());
                    break;
                }
            }
        }
    }

    report.tag_count = tags.len();
    store.replace(tags).await?;
    info!(
        tags = report.tag_count,
        pages = report.pages,
        failed = report.failed_portals.len(),
        "tag set refreshed"
    );
    Ok(report)
}

/// Up to `limit` known tags resembling `query`: tags containing it (case-insensitive) first,
/// then tags sharing its first three characters.
pub fn closest_tags(query: &str, known: &[String], limit: usize) -> Vec<String> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Vec::new();
    }
    let prefix: String = q.chars().take(3).collect();
    let containing = known.iter().filter(|t| {
        let t = t.to_lowercase();
        t.contains(&q) || q.contains(&t)
    });
    let sharing_prefix = known
        .iter()
        .filter(|t| t.to_lowercase().starts_with(&prefix));
    let mut out: Vec<String> = Vec::new();
    for tag in containing.chain(sharing_prefix) {
        if out.len() == limit {
            break;
        }
        if !out.contains(tag) {
            out.push(tag.clone());
        }
    }
    out
}
