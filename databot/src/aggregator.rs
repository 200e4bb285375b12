//! Portal aggregator: `find_datasets(tag)` across every configured portal.
//!
//! 1. The tag must be in the tag cache (exact, case-sensitive); otherwise no portal is queried.
//! 2. Each portal is searched; per dataset only the first resource in the wanted format is
//!    considered, and it is accepted only if its URL answers 200 to a HEAD probe.
//! 3. Optionally, title and description are synthesized by the LLM (raw metadata on empty output).
//! 4. An empty combined result is `NoLiveResults`.
//!
//! A failing portal or resource never fails the call; it is logged and skipped.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::dataset::{display_date, DatasetRecord, UNKNOWN_ORGANIZATION};
use crate::llm::LlmClient;
use crate::portal::{PortalClient, PortalDataset, PortalRegistry, PortalResource};
use crate::prompts;
use crate::tags::{refresh_tags, RefreshReport, TagStore, TagStoreError};

/// Outcome of a discovery request that produced no records.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FindError {
    /// Tag not in the cache. `known` is the full sorted tag list, for suggestions.
    #[error("unknown tag '{tag}'")]
    UnknownTag { tag: String, known: Vec<String> },
    /// Tag is known but no portal returned a live resource in the wanted format.
    #[error("no live {format} resource found for tag '{tag}'")]
    NoLiveResults { tag: String, format: String },
}

/// Multi-portal dataset search.
///
/// **Interaction**: Owned by the bot services; called from the dataset request body.
pub struct DatasetFinder {
    portals: PortalClient,
    registry: PortalRegistry,
    tags: Arc<TagStore>,
    llm: Option<Arc<dyn LlmClient>>,
}

impl DatasetFinder {
    pub fn new(portals: PortalClient, registry: PortalRegistry, tags: Arc<TagStore>) -> Self {
        Self {
            portals,
            registry,
            tags,
            llm: None,
        }
    }

    /// Enables title/description synthesis with `llm`.
    pub fn with_enrichment(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn tags(&self) -> &Arc<TagStore> {
        &self.tags
    }

    pub fn registry(&self) -> &PortalRegistry {
        &self.registry
    }

    /// Re-crawls every portal and replaces the tag cache.
    pub async fn refresh_tags(&self) -> Result<RefreshReport, TagStoreError> {
        refresh_tags(&self.portals, &self.registry, &self.tags).await
    }

    pub async fn find_datasets(&self, tag: &str) -> Result<Vec<DatasetRecord>, FindError> {
        if !self.tags.contains(tag).await {
            debug!(tag = %tag, "tag not in cache");
            return Err(FindError::UnknownTag {
                tag: tag.to_string(),
                known: self.tags.all().await,
            });
        }

        let mut records = Vec::new();
        for root in self.registry.roots() {
            let datasets = match self.portals.search(root, tag).await {
                Ok(d) => d,
                Err(e) => {
                    warn!(portal = %root, tag = %tag, error = %e, "portal skipped");
                    continue;
                }
            };
            for dataset in &datasets {
                let Some(resource) = dataset.first_resource_with_format(self.portals.format())
                else {
                    continue;
                };
                if !self.portals.is_live(&resource.url).await {
                    continue;
                }
                records.push(self.to_record(root, dataset, resource).await);
            }
        }

        if records.is_empty() {
            return Err(FindError::NoLiveResults {
                tag: tag.to_string(),
                format: self.portals.format().to_string(),
            });
        }
        debug!(tag = %tag, records = records.len(), "datasets found");
        Ok(records)
    }

    async fn to_record(
        &self,
        root: &str,
        dataset: &PortalDataset,
        resource: &PortalResource,
    ) -> DatasetRecord {
        let raw_title = dataset.title.clone().unwrap_or_default();
        let raw_description = dataset.description.clone().unwrap_or_default();
        let (title, description) = match &self.llm {
            Some(llm) => (
                synthesize(llm.as_ref(), &prompts::title_prompt(dataset, resource), raw_title)
                    .await,
                synthesize(
                    llm.as_ref(),
                    &prompts::description_prompt(dataset, resource),
                    raw_description,
                )
                .await,
            ),
            None => (raw_title, raw_description),
        };
        DatasetRecord {
            source: root.to_string(),
            title,
            date: resource
                .created_at
                .as_deref()
                .map(display_date)
                .unwrap_or_default(),
            description,
            organization: dataset
                .organization_label()
                .unwrap_or_else(|| UNKNOWN_ORGANIZATION.to_string()),
            url: resource.url.clone(),
        }
    }
}

/// LLM output trimmed; `raw` when the output is empty or the call failed.
async fn synthesize(llm: &dyn LlmClient, prompt: &str, raw: String) -> String {
    match llm.predict(prompt).await {
        Ok(out) if !out.trim().is_empty() => out.trim().to_string(),
        Ok(_) => raw,
        Err(e) => {
            warn!(error = %e, "enrichment failed, keeping raw metadata");
            raw
        }
    }
}
