//! Terminal rendering of bot replies.

use databot::{DatasetRecord, Reply};

/// Max characters of a dataset description shown in the terminal.
const DESCRIPTION_MAX_LEN: usize = 160;

/// Truncates `s` to at most `max` chars. When truncated, appends `...` (total length = max).
/// Uses character boundaries for safe UTF-8 handling.
pub fn truncate_message(s: &str, max: usize) -> String {
    const SUFFIX: &str = "...";
    let suffix_len = 3;
    if max <= suffix_len {
        return s.chars().take(max).collect();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    format!(
        "{}{}",
        s.chars().take(max - suffix_len).collect::<String>(),
        SUFFIX
    )
}

/// Numbered list: title, organization and date, description, URL.
pub fn render_datasets(records: &[DatasetRecord]) -> String {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut block = format!("{:>2}. {} ({}", i + 1, r.title, r.organization);
            if !r.date.is_empty() {
                block.push_str(&format!(", {}", r.date));
            }
            block.push(')');
            let description = r.description.split_whitespace().collect::<Vec<_>>().join(" ");
            if !description.is_empty() {
                block.push_str(&format!(
                    "\n    {}",
                    truncate_message(&description, DESCRIPTION_MAX_LEN)
                ));
            }
            block.push_str(&format!("\n    {}", r.url));
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_reply(reply: &Reply) -> String {
    match reply {
        Reply::Text(text) => text.clone(),
        Reply::Datasets(records) => render_datasets(records),
        Reply::Options(options) => format!("  [{}]", options.join(" | ")),
    }
}
