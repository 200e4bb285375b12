//! Prompt templates for every LLM call the bot makes.

use crate::dataset::DatasetRecord;
use crate::dialogue::Intent;
use crate::portal::{PortalDataset, PortalResource};

fn or_empty(s: &Option<String>) -> &str {
    s.as_deref().unwrap_or("")
}

fn dataset_context(dataset: &PortalDataset, resource: &PortalResource) -> String {
    format!(
        "Dataset title: {}\nDataset acronym: {}\nDataset description: {}\nResource title: {}\nResource description: {}",
        or_empty(&dataset.title),
        or_empty(&dataset.acronym),
        or_empty(&dataset.description),
        or_empty(&resource.title),
        or_empty(&resource.description),
    )
}

pub fn title_prompt(dataset: &PortalDataset, resource: &PortalResource) -> String {
    format!(
        "You name open-data files. Using the metadata below, write a short, human readable title \
         (at most 10 words) for this file. Answer with the title only.\n\n{}",
        dataset_context(dataset, resource)
    )
}

pub fn description_prompt(dataset: &PortalDataset, resource: &PortalResource) -> String {
    format!(
        "You describe open-data files. Using the metadata below, write a description of this file \
         in at most 3 sentences, in English. Answer with the description only.\n\n{}",
        dataset_context(dataset, resource)
    )
}

/// Ranking prompt for the refinement turn; asks for URLs only, most relevant first.
pub fn ranking_prompt(request: &str, records: &[DatasetRecord], limit: usize) -> String {
    let listing: Vec<String> = records
        .iter()
        .map(|r| format!("- {} | {} | {}", r.url, r.title, r.description))
        .collect();
    format!(
        "A user is looking for datasets. Their request: \"{}\".\n\
         Here are candidate datasets, one per line as `url | title | description`:\n{}\n\n\
         Select at most {} datasets that best match the request and list their URLs, \
         one per line, most relevant first. Copy the URLs exactly. Do not add anything else.",
        request,
        listing.join("\n"),
        limit
    )
}

pub fn greeting_prompt() -> &'static str {
    "You are a helpful assistant that helps users find open datasets. Start the conversation \
     with a short (2-15 words) greetings message. Make it original."
}

pub fn smalltalk_prompt(message: &str) -> String {
    format!(
        "You are being used within an intent-based chatbot. Your goal is to help the user browse \
         data websites to find relevant datasets for their needs. This answer is generated because \
         the user attempted to make small talk or to ask a question that has nothing to do with the \
         aim of the chatbot. Generate a message similar to 'That seems very interesting, but my \
         purpose is to help you find datasets relevant to your needs, not this.', based on the user \
         message: {}",
        message
    )
}

pub fn fallback_prompt(message: &str) -> String {
    format!(
        "You are being used within an intent-based chatbot. The chatbot triggered the fallback \
         mechanism because no intent was recognized from the user input. Generate a message similar \
         to 'Sorry, I don't know the answer', based on the user message: {}",
        message
    )
}

/// Classification prompt: intent descriptions plus parameter (entity) descriptions; the answer
/// is a single JSON object.
pub fn classification_prompt(intents: &[Intent], message: &str) -> String {
    let mut lines = Vec::new();
    for intent in intents {
        lines.push(format!("- {}: {}", intent.name, intent.description));
        for p in &intent.parameters {
            lines.push(format!(
                "    parameter `{}`: {}",
                p.name, p.entity_description
            ));
        }
    }
    format!(
        "Classify the user message into one of these intents:\n{}\n\n\
         Answer with one JSON object and nothing else: \
         {{\"intent\": \"<intent name or null>\", \"score\": <0..1>, \"parameters\": {{\"<name>\": \"<value or null>\"}}}}.\n\
         Use null when no intent applies.\n\nUser message: {}",
        lines.join("\n"),
        message
    )
}
