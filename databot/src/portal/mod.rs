//! uData portal API: response types, URL building and paginated fetches.
//!
//! - Search: `GET {root}/api/1/datasets/?tag={tag}&format={fmt}`
//! - Listing (tag refresh): `GET {root}/api/1/datasets/?format={fmt}`
//! - Liveness: HEAD on the resource URL, 200 means live.
//!
//! Pagination follows the `next_page` field until it is null or absent.

mod http;
mod registry;

pub use http::{HttpClient, MockHttpClient, ReqwestHttpClient};
pub use registry::{PortalRegistry, RegistryError};

use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Error from one portal call. Always contained by the caller (logged, unit of work skipped).
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("cannot decode response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("invalid portal url: {0}")]
    InvalidUrl(String),
}

impl PortalError {
    pub(crate) fn transport(url: &str, err: impl Display) -> Self {
        PortalError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// One page of the datasets endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DatasetPage {
    #[serde(default)]
    pub data: Vec<PortalDataset>,
    #[serde(default)]
    pub next_page: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PortalDataset {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub acronym: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub organization: Option<PortalOrganization>,
    #[serde(default)]
    pub resources: Vec<PortalResource>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PortalOrganization {
    #[serde(default)]
    pub acronym: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PortalResource {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub url: String,
}

impl PortalDataset {
    /// First resource whose format equals `format` (ASCII case-insensitive). Later matches are ignored.
    pub fn first_resource_with_format(&self, format: &str) -> Option<&PortalResource> {
        self.resources.iter().find(|r| {
            r.format
                .as_deref()
                .is_some_and(|f| f.eq_ignore_ascii_case(format))
        })
    }

    /// Organization label: acronym, else name.
    pub fn organization_label(&self) -> Option<String> {
        let org = self.organization.as_ref()?;
        org.acronym
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| org.name.clone().filter(|s| !s.trim().is_empty()))
    }
}

fn datasets_endpoint(root: &str) -> String {
    format!("{}/api/1/datasets/", root.trim_end_matches('/'))
}

/// Search URL for one portal: `{root}/api/1/datasets/?tag={tag}&format={fmt}`.
pub fn search_url(root: &str, tag: &str, format: &str) -> Result<String, PortalError> {
    url::Url::parse_with_params(&datasets_endpoint(root), &[("tag", tag), ("format", format)])
        .map(String::from)
        .map_err(|e| PortalError::InvalidUrl(format!("{}: {}", root, e)))
}

/// Listing URL used by tag refresh: `{root}/api/1/datasets/?format={fmt}`.
pub fn listing_url(root: &str, format: &str) -> Result<String, PortalError> {
    url::Url::parse_with_params(&datasets_endpoint(root), &[("format", format)])
        .map(String::from)
        .map_err(|e| PortalError::InvalidUrl(format!("{}: {}", root, e)))
}

/// Portal API client over an [`HttpClient`].
///
/// **Interaction**: Used by `DatasetFinder` (search + probe) and `refresh_tags` (listing).
#[derive(Clone)]
pub struct PortalClient {
    http: Arc<dyn HttpClient>,
    format: String,
    search_max_pages: usize,
    probe_timeout: Duration,
}

impl PortalClient {
    pub fn new(http: Arc<dyn HttpClient>, format: impl Into<String>) -> Self {
        Self {
            http,
            format: format.into(),
            search_max_pages: 5,
            probe_timeout: Duration::from_secs(3),
        }
    }

    pub fn with_search_max_pages(mut self, pages: usize) -> Self {
        self.search_max_pages = pages.max(1);
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Wanted resource format (e.g. `csv`).
    pub fn format(&self) -> &str {
        &self.format
    }

    /// GET one page and decode it.
    pub async fn fetch_page(&self, url: &str) -> Result<DatasetPage, PortalError> {
        let body = self.http.get(url).await?;
        serde_json::from_str(&body).map_err(|e| PortalError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Datasets tagged `tag` on one portal, following `next_page` up to the page limit.
    ///
    /// A failing first page is an error; a failing later page ends pagination with what was
    /// already fetched.
    pub async fn search(&self, root: &str, tag: &str) -> Result<Vec<PortalDataset>, PortalError> {
        let first = search_url(root, tag, &self.format)?;
        let mut page = self.fetch_page(&first).await?;
        let mut datasets = std::mem::take(&mut page.data);
        let mut pages = 1;
        let mut seen = HashSet::from([first]);
        while let Some(next) = page.next_page.take().filter(|n| !n.is_empty()) {
            if pages >= self.search_max_pages || !seen.insert(next.clone()) {
                break;
            }
            match self.fetch_page(&next).await {
                Ok(mut p) => {
                    datasets.append(&mut p.data);
                    page = p;
                    pages += 1;
                }
                Err(e) => {
                    warn!(portal = %root, error = %e, "search pagination stopped");
                    break;
                }
            }
        }
        debug!(portal = %root, tag = %tag, datasets = datasets.len(), pages, "portal search");
        Ok(datasets)
    }

    /// HEAD probe with the short fixed timeout. Any failure counts as "not live".
    pub async fn is_live(&self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        match self.http.head_status(url, self.probe_timeout).await {
            Ok(200) => true,
            Ok(status) => {
                debug!(url = %url, status, "resource not live");
                false
            }
            Err(e) => {
                warn!(url = %url, error = %e, "resource probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_tag_and_format() {
        assert_eq!(
            search_url("https://data.public.lu/", "health", "csv").unwrap(),
            "https://data.public.lu/api/1/datasets/?tag=health&format=csv"
        );
        assert_eq!(
            search_url("https://p.example", "air quality", "csv").unwrap(),
            "https://p.example/api/1/datasets/?tag=air+quality&format=csv"
        );
    }

    #[test]
    fn listing_url_has_no_tag() {
        assert_eq!(
            listing_url("https://p.example", "csv").unwrap(),
            "https://p.example/api/1/datasets/?format=csv"
        );
    }

    #[test]
    fn invalid_root_is_reported() {
        assert!(matches!(
            search_url("not a url", "x", "csv"),
            Err(PortalError::InvalidUrl(_))
        ));
    }

    #[test]
    fn first_resource_with_format_takes_first_match_only() {
        let ds: PortalDataset = serde_json::from_value(serde_json::json!({
            "id": "d1",
            "title": "T",
            "resources": [
                {"format": "pdf", "url": "http://x/a.pdf"},
                {"format": "CSV", "url": "http://x/first.csv"},
                {"format": "csv", "url": "http://x/second.csv"}
            ]
        }))
        .unwrap();
        let r = ds.first_resource_with_format("csv").unwrap();
        assert_eq!(r.url, "http://x/first.csv");
        assert!(ds.first_resource_with_format("json").is_none());
    }

    #[test]
    fn page_tolerates_nulls_and_missing_fields() {
        let page: DatasetPage = serde_json::from_str(
            r#"{"data":[{"title":null,"description":null,"organization":null}],"next_page":null}"#,
        )
        .unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(page.next_page.is_none());
        assert!(page.data[0].organization_label().is_none());
    }

    #[tokio::test]
    async fn search_follows_next_page_up_to_limit() {
        let p1 = search_url("https://p.example", "t", "csv").unwrap();
        let http = MockHttpClient::new()
            .with_get(
                p1.clone(),
                r#"{"data":[{"id":"a"}],"next_page":"https://p.example/page2"}"#,
            )
            .with_get(
                "https://p.example/page2",
                r#"{"data":[{"id":"b"}],"next_page":"https://p.example/page3"}"#,
            )
            .with_get(
                "https://p.example/page3",
                r#"{"data":[{"id":"c"}],"next_page":null}"#,
            );
        let client = PortalClient::new(Arc::new(http), "csv").with_search_max_pages(2);
        let datasets = client.search("https://p.example", "t").await.unwrap();
        let ids: Vec<_> = datasets.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn is_live_only_for_200() {
        let http = MockHttpClient::new()
            .with_head("http://x/ok.csv", 200)
            .with_head("http://x/moved.csv", 301);
        let client = PortalClient::new(Arc::new(http), "csv");
        assert!(client.is_live("http://x/ok.csv").await);
        assert!(!client.is_live("http://x/moved.csv").await);
        assert!(!client.is_live("").await);
    }
}
