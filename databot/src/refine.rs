//! Refinement: narrow an over-large result set to the records most relevant to a free-text
//! request, using one LLM ranking call.
//!
//! The LLM answer is free text; URLs are pulled out with a permissive regex and matched back to
//! records by exact string. When nothing matches (or the call fails) the first `limit` records
//! are returned and `Refined::ranked` is false.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::dataset::DatasetRecord;
use crate::llm::LlmClient;
use crate::prompts;

/// Result of a refinement round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Refined {
    /// At most `limit` records, each taken from the input list.
    pub records: Vec<DatasetRecord>,
    /// False when the LLM ranking could not be used and the input order was kept.
    pub ranked: bool,
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s"'<>`|\]\)]+"#).expect("valid url regex"))
}

/// URLs in `text`, in order of appearance, with trailing sentence punctuation stripped.
pub fn extract_urls(text: &str) -> Vec<String> {
    url_regex()
        .find_iter(text)
        .map(|m| {
            m.as_str()
                .trim_end_matches(['.', ',', ';', ':', '!', '?'])
                .to_string()
        })
        .collect()
}

/// Records whose URL appears in `urls`, in `urls` order, de-duplicated, at most `limit`.
pub fn match_records(
    urls: &[String],
    records: &[DatasetRecord],
    limit: usize,
) -> Vec<DatasetRecord> {
    let mut seen = HashSet::new();
    urls.iter()
        .filter(|u| seen.insert(u.as_str()))
        .filter_map(|u| records.iter().find(|r| &r.url == u))
        .take(limit)
        .cloned()
        .collect()
}

/// Asks the LLM to pick the `limit` records most relevant to `request`.
pub async fn narrow(
    llm: &dyn LlmClient,
    records: &[DatasetRecord],
    request: &str,
    limit: usize,
) -> Refined {
    let fallback = || Refined {
        records: records.iter().take(limit).cloned().collect(),
        ranked: false,
    };
    let answer = match llm
        .predict(&prompts::ranking_prompt(request, records, limit))
        .await
    {
        Ok(a) => a,
        Err(e) => {
            warn!(error = %e, "ranking call failed");
            return fallback();
        }
    };
    let selected = match_records(&extract_urls(&answer), records, limit);
    debug!(candidates = records.len(), selected = selected.len(), "refinement ranked");
    if selected.is_empty() {
        warn!("ranking answer matched no candidate url");
        return fallback();
    }
    Refined {
        records: selected,
        ranked: true,
    }
}
