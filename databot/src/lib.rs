//! # databot
//!
//! An intent-driven assistant that finds open-data datasets across uData-style portals.
//!
//! ## Flow
//!
//! A user message is classified into an intent ([`IntentClassifier`]); the [`Dialogue`] picks a
//! transition (global rules first, then the current state's rules), runs the target state's
//! body and follows event-less rules until the session rests. Bodies reply through the
//! session's [`ReplySender`]; the presentation layer drains the matching [`ReplyReceiver`].
//!
//! ## Main modules
//!
//! - [`dialogue`]: [`DialogueBuilder`], [`Dialogue`], [`State`], [`Intent`], classifiers.
//! - [`session`]: [`Session`], [`SessionValue`].
//! - [`channel`]: [`Reply`], [`reply_channel`].
//! - [`aggregator`]: [`DatasetFinder::find_datasets`], [`FindError`].
//! - [`portal`]: portal API client, [`HttpClient`], [`PortalRegistry`].
//! - [`tags`]: [`TagStore`], [`refresh_tags`].
//! - [`refine`]: LLM narrowing of large result sets.
//! - [`bot`]: the assistant's states and bodies, [`OpenDataBot`].
//! - [`app`]: building the bot from [`env_config::BotSettings`].
//! - [`llm`]: [`LlmClient`], [`MockLlm`], [`ChatOpenAI`].
//! - [`protocol`]: WebSocket request/response types.

pub mod aggregator;
pub mod app;
pub mod bot;
pub mod channel;
pub mod dataset;
pub mod dialogue;
pub mod llm;
pub mod message;
pub mod portal;
pub mod prompts;
pub mod protocol;
pub mod refine;
pub mod session;
pub mod tags;

pub use aggregator::{DatasetFinder, FindError};
pub use app::{build_bot, build_bot_with, build_finder, openai_from_settings, AppError};
pub use bot::{BotServices, OpenDataBot};
pub use channel::{reply_channel, Outgoing, Reply, ReplyReceiver, ReplySender};
pub use dataset::DatasetRecord;
pub use dialogue::{
    Body, CompileError, Dialogue, DialogueBuilder, FnBody, Intent, IntentClassifier,
    IntentPrediction, LlmIntentClassifier, SimpleIntentClassifier, State,
};
pub use llm::{ChatOpenAI, LlmClient, LlmError, MockLlm};
pub use message::Message;
pub use portal::{HttpClient, MockHttpClient, PortalClient, PortalError, PortalRegistry, ReqwestHttpClient};
pub use protocol::{ClientRequest, ServerResponse};
pub use session::{Session, SessionValue};
pub use tags::{refresh_tags, RefreshReport, TagStore};
