//! Wires settings into a ready [`OpenDataBot`]: registry, tag store, portal client, LLM and
//! intent classifier.

use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use env_config::{BotSettings, ClassifierKind};
use thiserror::Error;
use tracing::info;

use crate::aggregator::DatasetFinder;
use crate::bot::{BotServices, OpenDataBot};
use crate::dialogue::{CompileError, IntentClassifier, LlmIntentClassifier, SimpleIntentClassifier};
use crate::llm::{ChatOpenAI, LlmClient};
use crate::portal::{HttpClient, PortalClient, PortalRegistry, RegistryError, ReqwestHttpClient};
use crate::tags::{TagStore, TagStoreError};

/// Error while assembling the bot at startup.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Tags(#[from] TagStoreError),
    #[error("dialogue: {0}")]
    Dialogue(#[from] CompileError),
}

/// OpenAI-compatible chat client for `settings.model`.
pub fn openai_from_settings(settings: &BotSettings) -> ChatOpenAI {
    match &settings.openai_base_url {
        Some(base) => ChatOpenAI::with_config(
            OpenAIConfig::new().with_api_base(base.clone()),
            settings.model.clone(),
        ),
        None => ChatOpenAI::new(settings.model.clone()),
    }
    .with_temperature(0.2)
}

/// Portal search stack (client, registry, tag store) without the dialogue.
pub async fn build_finder(
    settings: &BotSettings,
    http: Arc<dyn HttpClient>,
    llm: Option<Arc<dyn LlmClient>>,
) -> Result<DatasetFinder, AppError> {
    let registry = PortalRegistry::load(&settings.portals_file)?;
    let tags = Arc::new(TagStore::open(&settings.tags_file).await?);
    info!(
        portals = registry.roots().len(),
        tags = tags.len().await,
        format = %settings.format,
        "portal search ready"
    );
    let portals = PortalClient::new(http, settings.format.clone())
        .with_search_max_pages(settings.search_max_pages)
        .with_probe_timeout(settings.probe_timeout);
    let finder = DatasetFinder::new(portals, registry, tags);
    Ok(match llm {
        Some(llm) if settings.enrich => finder.with_enrichment(llm),
        _ => finder,
    })
}

/// Bot over explicit LLM and HTTP implementations.
pub async fn build_bot_with(
    settings: &BotSettings,
    llm: Arc<dyn LlmClient>,
    http: Arc<dyn HttpClient>,
) -> Result<OpenDataBot, AppError> {
    let finder = build_finder(settings, http, Some(llm.clone())).await?;
    let classifier: Arc<dyn IntentClassifier> = match settings.classifier {
        ClassifierKind::Llm => Arc::new(LlmIntentClassifier::new(llm.clone())),
        ClassifierKind::Simple => Arc::new(SimpleIntentClassifier::new()),
    };
    let services = BotServices::new(finder, llm)
        .with_refinement(settings.refine_threshold, settings.refine_limit);
    Ok(OpenDataBot::new(
        services,
        classifier,
        settings.intent_threshold,
    )?)
}

/// Bot over the OpenAI-compatible API and real HTTP.
pub async fn build_bot(settings: &BotSettings) -> Result<OpenDataBot, AppError> {
    build_bot_with(
        settings,
        Arc::new(openai_from_settings(settings)),
        Arc::new(ReqwestHttpClient::new()),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::portal::MockHttpClient;

    #[tokio::test]
    async fn build_bot_with_reads_registry_and_tags() {
        let dir = tempfile::tempdir().unwrap();
        let portals = dir.path().join("portals.json");
        let tags = dir.path().join("tags.json");
        std::fs::write(&portals, r#"{"udata_root": ["https://a.example"]}"#).unwrap();
        std::fs::write(&tags, r#"{"tags": ["health"]}"#).unwrap();
        let settings = BotSettings {
            portals_file: portals,
            tags_file: tags,
            classifier: ClassifierKind::Simple,
            ..BotSettings::default()
        };
        let bot = build_bot_with(
            &settings,
            Arc::new(MockLlm::fixed("hi")),
            Arc::new(MockHttpClient::new()),
        )
        .await
        .unwrap();
        let finder = bot.services().finder();
        assert_eq!(finder.registry().roots(), ["https://a.example".to_string()]);
        assert!(finder.tags().contains("health").await);
    }

    #[tokio::test]
    async fn missing_registry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = BotSettings {
            portals_file: dir.path().join("nope.json"),
            tags_file: dir.path().join("tags.json"),
            ..BotSettings::default()
        };
        let err = build_finder(&settings, Arc::new(MockHttpClient::new()), None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Registry(RegistryError::Read { .. })));
    }
}
