//! Typed bot settings read from the environment (after [`crate::load_and_apply`]).
//!
//! Every setting has a default; unparseable values fall back to it.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Which intent classifier the bot uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassifierKind {
    /// LLM with intent and entity descriptions.
    Llm,
    /// Training-sentence matching, no network.
    Simple,
}

impl FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llm" => Ok(ClassifierKind::Llm),
            "simple" => Ok(ClassifierKind::Simple),
            other => Err(format!("unknown classifier '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BotSettings {
    /// `DATABOT_PORTALS_FILE`: portal registry `{ "udata_root": [...] }`.
    pub portals_file: PathBuf,
    /// `DATABOT_TAGS_FILE`: persisted tag set `{ "tags": [...] }`.
    pub tags_file: PathBuf,
    /// `DATABOT_FORMAT`: wanted resource format.
    pub format: String,
    /// `DATABOT_REFINE_THRESHOLD`: result sets larger than this are refined.
    pub refine_threshold: usize,
    /// `DATABOT_REFINE_LIMIT`: records kept by refinement.
    pub refine_limit: usize,
    /// `DATABOT_SEARCH_MAX_PAGES`: search pages followed per portal.
    pub search_max_pages: usize,
    /// `DATABOT_PROBE_TIMEOUT_MS`: HEAD probe timeout.
    pub probe_timeout: Duration,
    /// `DATABOT_ENRICH`: LLM title/description synthesis.
    pub enrich: bool,
    /// `DATABOT_INTENT_THRESHOLD`: minimum prediction score.
    pub intent_threshold: f32,
    /// `DATABOT_CLASSIFIER`: `llm` or `simple`.
    pub classifier: ClassifierKind,
    /// `DATABOT_MODEL`: chat model name.
    pub model: String,
    /// `OPENAI_BASE_URL`: OpenAI-compatible endpoint; provider default when unset.
    pub openai_base_url: Option<String>,
    /// `DATABOT_WS_ADDR`: WebSocket listen address.
    pub ws_addr: String,
    /// `DATABOT_LOG_DIR`: daily log files go here when set.
    pub log_dir: Option<PathBuf>,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            portals_file: PathBuf::from("portals.json"),
            tags_file: PathBuf::from("datasets_tags.json"),
            format: "csv".to_string(),
            refine_threshold: 10,
            refine_limit: 10,
            search_max_pages: 5,
            probe_timeout: Duration::from_millis(3000),
            enrich: true,
            intent_threshold: 0.5,
            classifier: ClassifierKind::Llm,
            model: "gpt-4o-mini".to_string(),
            openai_base_url: None,
            ws_addr: "127.0.0.1:8764".to_string(),
            log_dir: None,
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn text<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    text(lookup, key).and_then(|v| v.parse().ok())
}

impl BotSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup (the process env in [`BotSettings::from_env`]).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let lookup = &lookup;

        Self {
            portals_file: text(lookup, "DATABOT_PORTALS_FILE")
                .map(PathBuf::from)
                .unwrap_or(default.portals_file),
            tags_file: text(lookup, "DATABOT_TAGS_FILE")
                .map(PathBuf::from)
                .unwrap_or(default.tags_file),
            format: text(lookup, "DATABOT_FORMAT").unwrap_or(default.format),
            refine_threshold: parsed(lookup, "DATABOT_REFINE_THRESHOLD")
                .unwrap_or(default.refine_threshold),
            refine_limit: parsed(lookup, "DATABOT_REFINE_LIMIT")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(default.refine_limit),
            search_max_pages: parsed(lookup, "DATABOT_SEARCH_MAX_PAGES")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(default.search_max_pages),
            probe_timeout: parsed(lookup, "DATABOT_PROBE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(default.probe_timeout),
            enrich: text(lookup, "DATABOT_ENRICH")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(default.enrich),
            intent_threshold: parsed(lookup, "DATABOT_INTENT_THRESHOLD")
                .filter(|t: &f32| (0.0..=1.0).contains(t))
                .unwrap_or(default.intent_threshold),
            classifier: parsed(lookup, "DATABOT_CLASSIFIER").unwrap_or(default.classifier),
            model: text(lookup, "DATABOT_MODEL").unwrap_or(default.model),
            openai_base_url: text(lookup, "OPENAI_BASE_URL"),
            ws_addr: text(lookup, "DATABOT_WS_ADDR").unwrap_or(default.ws_addr),
            log_dir: text(lookup, "DATABOT_LOG_DIR").map(PathBuf::from),
        }
    }
}
