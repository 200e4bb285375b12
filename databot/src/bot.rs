//! The open-data assistant: intents, states, bodies and wiring.
//!
//! ```text
//! greetings_state (initial)
//!   hello_intent            -> greetings_state
//!   smalltalk_intent        -> smalltalk_state        -> greetings_state
//!   dataset_request_intent  -> dataset_request_state
//!                                needs_refinement == true -> awaiting_refinement_state
//!                                                              any input -> refine_state -> greetings_state
//!                                otherwise                -> greetings_state
//! refresh_tags_intent (global) -> refresh_tags_state -> back to the previous state
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::aggregator::{DatasetFinder, FindError};
use crate::channel::{reply_channel, ReplyReceiver};
use crate::dataset::DatasetRecord;
use crate::dialogue::{
    Body, CompileError, Dialogue, DialogueBuilder, Intent, IntentClassifier, State,
};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts;
use crate::refine;
use crate::session::Session;
use crate::tags::closest_tags;

pub const HELLO_INTENT: &str = "hello_intent";
pub const SMALLTALK_INTENT: &str = "smalltalk_intent";
pub const DATASET_REQUEST_INTENT: &str = "dataset_request_intent";
pub const REFRESH_TAGS_INTENT: &str = "refresh_tags_intent";

pub const GREETINGS_STATE: &str = "greetings_state";
pub const SMALLTALK_STATE: &str = "smalltalk_state";
pub const DATASET_REQUEST_STATE: &str = "dataset_request_state";
pub const AWAITING_REFINEMENT_STATE: &str = "awaiting_refinement_state";
pub const REFINE_STATE: &str = "refine_state";
pub const REFRESH_TAGS_STATE: &str = "refresh_tags_state";

/// Session variables.
pub const GREETED: &str = "greeted";
pub const TAG_HINT_SHOWN: &str = "tag_hint_shown";
pub const NEEDS_REFINEMENT: &str = "needs_refinement";
pub const PENDING_DATASETS: &str = "pending_datasets";

/// Intent parameter holding the requested tag.
pub const TOPIC: &str = "topic";

const SUGGESTION_LIMIT: usize = 5;

const GREETING_TEXT: &str = "Hello! I can help you find open datasets. Which topic interests you?";
const SMALLTALK_TEXT: &str = "That seems very interesting, but my purpose is to help you find \
                              datasets relevant to your needs, not this.";
const FALLBACK_TEXT: &str = "Sorry, I don't know the answer to that. Try asking me for a dataset \
                             about a topic.";
const MISSING_TOPIC_TEXT: &str = "Sorry, it seems this tag isn't actually a word.";
const TAG_HINT_LONG: &str = "Tags come from a local list that is only updated on request. If you \
                             think this tag exists on the portals, say \"refresh tags\" and I will \
                             download the current list (this can take a while).";
const TAG_HINT_SHORT: &str = "Say \"refresh tags\" to update the tag list.";

/// The assistant's intents.
pub fn intents() -> Vec<Intent> {
    vec![
        Intent::new(HELLO_INTENT, "The user greets you").with_sentences([
            "hello",
            "hi",
            "hey",
            "good morning",
            "good evening",
        ]),
        Intent::new(
            SMALLTALK_INTENT,
            "The user is trying to talk about random things that are not related to datasets, \
             which are out of your purpose. The questions can be extremely varied.",
        )
        .with_sentences([
            "how are you doing",
            "do you want to chat",
            "what is your favorite color",
            "give me a cooking recipe",
            "help me solve this math problem",
        ]),
        Intent::new(
            DATASET_REQUEST_INTENT,
            "The user asks for a dataset about a specific topic",
        )
        .with_sentences([
            "What database talks about TOPIC",
            "Can you give me a TOPIC dataset",
            "I would like to see datas on TOPIC",
            "Find datasets about TOPIC",
        ])
        .with_parameter(
            TOPIC,
            "TOPIC",
            "word_entity",
            "a string of letters with meaning. This entity does not include nonsensical \
             string of letters",
        ),
        Intent::new(
            REFRESH_TAGS_INTENT,
            "The user asks to refresh, update or reload the list of known dataset tags",
        )
        .with_sentences(["refresh tags", "refresh the tags", "update the tag list"]),
    ]
}

/// Shared services the bodies call into.
///
/// **Interaction**: Built by `app::build_bot`; shared read-only by every session.
pub struct BotServices {
    finder: DatasetFinder,
    llm: Arc<dyn LlmClient>,
    refine_threshold: usize,
    refine_limit: usize,
}

impl BotServices {
    pub fn new(finder: DatasetFinder, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            finder,
            llm,
            refine_threshold: 10,
            refine_limit: 10,
        }
    }

    /// Result sets larger than `threshold` go through refinement, which keeps `limit` records.
    pub fn with_refinement(mut self, threshold: usize, limit: usize) -> Self {
        self.refine_threshold = threshold;
        self.refine_limit = limit.max(1);
        self
    }

    pub fn finder(&self) -> &DatasetFinder {
        &self.finder
    }

    pub fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    /// LLM text for `prompt`, or `default` when the call fails or returns blank.
    async fn generate(&self, prompt: &str, default: &str) -> String {
        self.generate_in_context(&[], prompt, default).await
    }

    /// Like [`Self::generate`], with earlier conversation messages sent ahead of the prompt.
    async fn generate_in_context(
        &self,
        context: &[Message],
        prompt: &str,
        default: &str,
    ) -> String {
        let mut messages = context.to_vec();
        messages.push(Message::user(prompt));
        match self.llm.invoke(&messages).await {
            Ok(response) if !response.content.trim().is_empty() => {
                response.content.trim().to_string()
            }
            Ok(_) => default.to_string(),
            Err(e) => {
                warn!(error = %e, "llm reply failed, using fixed text");
                default.to_string()
            }
        }
    }
}

struct GreetingsBody(Arc<BotServices>);

#[async_trait]
impl Body for GreetingsBody {
    async fn run(&self, session: &mut Session) {
        if session.get_bool(GREETED) != Some(true) {
            session.set(GREETED, true);
            let text = self.0.generate(prompts::greeting_prompt(), GREETING_TEXT).await;
            session.reply(text);
            session.reply_options(["Can you give me a health dataset", "Refresh tags"]);
            return;
        }
        let said_hello = session
            .prediction()
            .map_or(false, |p| p.intent == HELLO_INTENT);
        if said_hello {
            session.reply("Hello again! Tell me a topic and I will look for datasets.");
        }
    }
}

struct SmalltalkBody(Arc<BotServices>);

#[async_trait]
impl Body for SmalltalkBody {
    async fn run(&self, session: &mut Session) {
        let message = session.message().unwrap_or_default().to_string();
        let context = session.context().to_vec();
        let text = self
            .0
            .generate_in_context(&context, &prompts::smalltalk_prompt(&message), SMALLTALK_TEXT)
            .await;
        session.reply(text);
    }
}

struct DatasetRequestBody(Arc<BotServices>);

impl DatasetRequestBody {
    fn unknown_tag(session: &mut Session, tag: &str, known: &[String]) {
        let suggestions = closest_tags(tag, known, SUGGESTION_LIMIT);
        if suggestions.is_empty() {
            session.reply(format!("Sorry, '{}' is not a tag I know.", tag));
        } else {
            session.reply(format!(
                "Sorry, '{}' is not a tag I know. Did you mean: {}?",
                tag,
                suggestions.join(", ")
            ));
            session.reply_options(
                suggestions
                    .iter()
                    .map(|t| format!("Can you give me a {} dataset", t)),
            );
        }
        if session.get_bool(TAG_HINT_SHOWN) == Some(true) {
            session.reply(TAG_HINT_SHORT);
        } else {
            session.set(TAG_HINT_SHOWN, true);
            session.reply(TAG_HINT_LONG);
        }
    }
}

#[async_trait]
impl Body for DatasetRequestBody {
    async fn run(&self, session: &mut Session) {
        session.remove(NEEDS_REFINEMENT);
        let topic = session
            .prediction()
            .and_then(|p| p.parameter(TOPIC))
            .map(str::to_string);
        let Some(topic) = topic else {
            session.reply(MISSING_TOPIC_TEXT);
            return;
        };

        let services = &self.0;
        match services.finder.find_datasets(&topic).await {
            Err(FindError::UnknownTag { tag, known }) => Self::unknown_tag(session, &tag, &known),
            Err(FindError::NoLiveResults { tag, format }) => session.reply(format!(
                "Sorry, no reachable {} file was found for the tag '{}'. The tag list may be out \
                 of date: say \"refresh tags\" to update it.",
                format, tag
            )),
            Ok(records) if records.len() <= services.refine_threshold => {
                session.reply(format!(
                    "I found {} datasets mentioning {}.",
                    records.len(),
                    topic
                ));
                session.reply_datasets(records);
            }
            Ok(records) => {
                session.reply(format!(
                    "I found {} datasets mentioning {}. That is a lot: tell me more about what \
                     you need (period, place, organization...) and I will pick the {} most \
                     relevant ones.",
                    records.len(),
                    topic,
                    services.refine_limit
                ));
                session.set(PENDING_DATASETS, records);
                session.set(NEEDS_REFINEMENT, true);
            }
        }
    }
}

struct RefineBody(Arc<BotServices>);

#[async_trait]
impl Body for RefineBody {
    async fn run(&self, session: &mut Session) {
        session.remove(NEEDS_REFINEMENT);
        let pending: Vec<DatasetRecord> = session
            .get_datasets(PENDING_DATASETS)
            .map(<[DatasetRecord]>::to_vec)
            .unwrap_or_default();
        session.remove(PENDING_DATASETS);
        if pending.is_empty() {
            session.reply("There is nothing to refine. Ask me for a dataset first.");
            return;
        }

        let request = session.message().unwrap_or_default().to_string();
        let services = &self.0;
        let refined = refine::narrow(
            services.llm.as_ref(),
            &pending,
            &request,
            services.refine_limit,
        )
        .await;
        if refined.ranked {
            session.reply(format!(
                "Here are the {} datasets that best match your request.",
                refined.records.len()
            ));
        } else {
            session.reply(format!(
                "I could not rank the datasets against your request, here are the first {}.",
                refined.records.len()
            ));
        }
        session.reply_datasets(refined.records);
    }
}

struct RefreshTagsBody(Arc<BotServices>);

#[async_trait]
impl Body for RefreshTagsBody {
    async fn run(&self, session: &mut Session) {
        session.reply("Refreshing the tag list, this can take a while...");
        match self.0.finder.refresh_tags().await {
            Ok(report) if report.failed_portals.is_empty() => {
                session.reply(format!("Tag list updated: {} tags known.", report.tag_count));
            }
            Ok(report) => session.reply(format!(
                "Tag list updated: {} tags known. Some portals could not be read: {}.",
                report.tag_count,
                report.failed_portals.join(", ")
            )),
            Err(e) => {
                warn!(error = %e, "tag refresh failed");
                session.reply("Sorry, the tag list could not be updated.");
            }
        }
    }
}

struct FallbackBody(Arc<BotServices>);

#[async_trait]
impl Body for FallbackBody {
    async fn run(&self, session: &mut Session) {
        let message = session.message().unwrap_or_default().to_string();
        let context = session.context().to_vec();
        let text = self
            .0
            .generate_in_context(&context, &prompts::fallback_prompt(&message), FALLBACK_TEXT)
            .await;
        session.reply(text);
    }
}

/// Builds the assistant's dialogue over `services`.
pub fn build_dialogue(
    services: Arc<BotServices>,
    classifier: Arc<dyn IntentClassifier>,
    intent_threshold: f32,
) -> Result<Dialogue, CompileError> {
    let mut b = DialogueBuilder::new()
        .with_classifier(classifier)
        .with_intent_threshold(intent_threshold);
    for intent in intents() {
        b.add_intent(intent);
    }
    b.add_state(
        State::new(GREETINGS_STATE)
            .initial()
            .with_body(Arc::new(GreetingsBody(services.clone()))),
    )
    .add_state(State::new(SMALLTALK_STATE).with_body(Arc::new(SmalltalkBody(services.clone()))))
    .add_state(
        State::new(DATASET_REQUEST_STATE)
            .with_body(Arc::new(DatasetRequestBody(services.clone()))),
    )
    .add_state(State::new(AWAITING_REFINEMENT_STATE))
    .add_state(State::new(REFINE_STATE).with_body(Arc::new(RefineBody(services.clone()))))
    .add_state(
        State::new(REFRESH_TAGS_STATE)
            .global()
            .with_body(Arc::new(RefreshTagsBody(services.clone()))),
    );

    b.on_intent(GREETINGS_STATE, HELLO_INTENT, GREETINGS_STATE)
        .on_intent(GREETINGS_STATE, SMALLTALK_INTENT, SMALLTALK_STATE)
        .on_intent(GREETINGS_STATE, DATASET_REQUEST_INTENT, DATASET_REQUEST_STATE)
        .go_to(SMALLTALK_STATE, GREETINGS_STATE)
        .when_var_equals(
            DATASET_REQUEST_STATE,
            NEEDS_REFINEMENT,
            true,
            AWAITING_REFINEMENT_STATE,
        )
        .go_to(DATASET_REQUEST_STATE, GREETINGS_STATE)
        .on_any_input(AWAITING_REFINEMENT_STATE, REFINE_STATE)
        .go_to(REFINE_STATE, GREETINGS_STATE)
        .global_on_intent(REFRESH_TAGS_INTENT, REFRESH_TAGS_STATE)
        .set_fallback(Arc::new(FallbackBody(services)));
    b.compile()
}

/// The assistant: compiled dialogue plus its services.
///
/// One instance serves every session; sessions are created with [`OpenDataBot::new_session`].
pub struct OpenDataBot {
    dialogue: Dialogue,
    services: Arc<BotServices>,
}

impl OpenDataBot {
    pub fn new(
        services: BotServices,
        classifier: Arc<dyn IntentClassifier>,
        intent_threshold: f32,
    ) -> Result<Self, CompileError> {
        let services = Arc::new(services);
        let dialogue = build_dialogue(services.clone(), classifier, intent_threshold)?;
        info!(intents = dialogue.intents().len(), "dialogue compiled");
        Ok(Self { dialogue, services })
    }

    pub fn dialogue(&self) -> &Dialogue {
        &self.dialogue
    }

    pub fn services(&self) -> &BotServices {
        &self.services
    }

    /// A fresh session and the receiving end of its replies.
    pub fn new_session(&self, id: impl Into<String>) -> (Session, ReplyReceiver) {
        let (tx, rx) = reply_channel();
        (Session::new(id, tx), rx)
    }

    /// Enters the initial state (greeting).
    pub async fn start(&self, session: &mut Session) {
        self.dialogue.start(session).await;
    }

    pub async fn handle_message(&self, session: &mut Session, text: &str) {
        self.dialogue.advance(session, text).await;
    }
}
