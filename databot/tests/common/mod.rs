//! Shared fixtures: portal pages and a finder over a mock HTTP client.

#![allow(dead_code)]

use std::sync::Arc;

use databot::portal::search_url;
use databot::{DatasetFinder, MockHttpClient, PortalClient, PortalRegistry, TagStore};
use serde_json::{json, Value};

pub const PORTAL_A: &str = "https://a.example";
pub const PORTAL_B: &str = "https://b.example";

/// One dataset whose only resource has `format` and lives at `url`.
pub fn dataset(id: &str, format: &str, url: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Dataset {}", id),
        "description": format!("About {}", id),
        "organization": {"acronym": "ORG"},
        "resources": [
            {"format": format, "title": "file", "created_at": "2021-03-04T05:06:07", "url": url}
        ],
        "tags": ["health"]
    })
}

pub fn page(data: Vec<Value>, next_page: Option<&str>) -> String {
    json!({"data": data, "next_page": next_page}).to_string()
}

/// `n` csv datasets on one page, with resource URLs `{root}/files/{i}.csv`.
pub fn csv_page(root: &str, n: usize) -> String {
    let data = (0..n)
        .map(|i| dataset(&i.to_string(), "csv", &format!("{}/files/{}.csv", root, i)))
        .collect();
    page(data, None)
}

/// Mock answering the `health` search on `root` with `n` live csv datasets.
pub fn live_portal(http: MockHttpClient, root: &str, n: usize) -> MockHttpClient {
    let mut http = http.with_get(search_url(root, "health", "csv").unwrap(), csv_page(root, n));
    for i in 0..n {
        http = http.with_head(format!("{}/files/{}.csv", root, i), 200);
    }
    http
}

pub fn finder(http: Arc<MockHttpClient>, roots: &[&str], tags: &[&str]) -> DatasetFinder {
    DatasetFinder::new(
        PortalClient::new(http, "csv"),
        PortalRegistry::new(roots.iter().copied()),
        Arc::new(TagStore::with_tags("unused-tags.json", tags.iter().copied())),
    )
}
