//! Per-conversation state: current dialogue state, variables, history, last prediction and the
//! reply channel.
//!
//! A session is owned by exactly one task (one connection); nothing here is shared.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::channel::{Reply, ReplySender};
use crate::dataset::DatasetRecord;
use crate::dialogue::IntentPrediction;
use crate::message::Message;

/// Messages kept in [`Session::history`]; older ones are dropped.
pub const HISTORY_LIMIT: usize = 10;

/// Value stored in a session variable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Datasets(Vec<DatasetRecord>),
}

impl From<bool> for SessionValue {
    fn from(v: bool) -> Self {
        SessionValue::Bool(v)
    }
}

impl From<i64> for SessionValue {
    fn from(v: i64) -> Self {
        SessionValue::Int(v)
    }
}

impl From<String> for SessionValue {
    fn from(v: String) -> Self {
        SessionValue::Str(v)
    }
}

impl From<&str> for SessionValue {
    fn from(v: &str) -> Self {
        SessionValue::Str(v.to_string())
    }
}

impl From<Vec<DatasetRecord>> for SessionValue {
    fn from(v: Vec<DatasetRecord>) -> Self {
        SessionValue::Datasets(v)
    }
}

/// One user's conversation.
#[derive(Debug)]
pub struct Session {
    id: String,
    current: String,
    /// State to resume after a global state finishes.
    return_to: Option<String>,
    vars: HashMap<String, SessionValue>,
    history: Vec<Message>,
    message: Option<String>,
    prediction: Option<IntentPrediction>,
    replies: ReplySender,
}

impl Session {
    pub fn new(id: impl Into<String>, replies: ReplySender) -> Self {
        Self {
            id: id.into(),
            current: String::new(),
            return_to: None,
            vars: HashMap::new(),
            history: Vec::new(),
            message: None,
            prediction: None,
            replies,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the current dialogue state (empty before `Dialogue::start`).
    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn get(&self, key: &str) -> Option<&SessionValue> {
        self.vars.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SessionValue>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<SessionValue> {
        self.vars.remove(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.vars.get(key) {
            Some(SessionValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.vars.get(key) {
            Some(SessionValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.vars.get(key) {
            Some(SessionValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_datasets(&self, key: &str) -> Option<&[DatasetRecord]> {
        match self.vars.get(key) {
            Some(SessionValue::Datasets(d)) => Some(d),
            _ => None,
        }
    }

    /// Last user message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Last accepted prediction (`None` when nothing matched or the score was too low).
    pub fn prediction(&self) -> Option<&IntentPrediction> {
        self.prediction.as_ref()
    }

    /// Last [`HISTORY_LIMIT`] messages, oldest first.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// History before the message being handled, for use as LLM context.
    pub fn context(&self) -> &[Message] {
        match (self.history.split_last(), self.message.as_deref()) {
            (Some((Message::User(last), earlier)), Some(current)) if last == current => earlier,
            _ => self.history.as_slice(),
        }
    }

    pub fn reply(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.remember(Message::assistant(text.clone()));
        self.send(Reply::Text(text));
    }

    pub fn reply_datasets(&mut self, records: Vec<DatasetRecord>) {
        self.remember(Message::assistant(format!("[{} datasets]", records.len())));
        self.send(Reply::Datasets(records));
    }

    pub fn reply_options<I, S>(&mut self, options: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(Reply::Options(options.into_iter().map(Into::into).collect()));
    }

    /// Forgets variables, history and the last prediction; the dialogue restarts on next `start`.
    pub fn reset(&mut self) {
        self.current.clear();
        self.return_to = None;
        self.vars.clear();
        self.history.clear();
        self.message = None;
        self.prediction = None;
    }

    fn remember(&mut self, message: Message) {
        self.history.push(message);
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }

    fn send(&self, reply: Reply) {
        if !self.replies.send(&self.current, reply) {
            tracing::debug!(session = %self.id, "reply dropped, receiver closed");
        }
    }

    pub(crate) fn set_current(&mut self, state: &str) {
        self.current.clear();
        self.current.push_str(state);
    }

    pub(crate) fn set_return_to(&mut self, state: Option<String>) {
        self.return_to = state;
    }

    pub(crate) fn take_return_to(&mut self) -> Option<String> {
        self.return_to.take()
    }

    pub(crate) fn set_prediction(&mut self, prediction: Option<IntentPrediction>) {
        self.prediction = prediction;
    }

    pub(crate) fn record_user_message(&mut self, text: &str) {
        self.remember(Message::user(text));
        self.message = Some(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::reply_channel;

    #[test]
    fn typed_getters_ignore_other_variants() {
        let (tx, _rx) = reply_channel();
        let mut s = Session::new("s", tx);
        s.set("greeted", true);
        s.set("count", 3i64);
        s.set("topic", "health");
        assert_eq!(s.get_bool("greeted"), Some(true));
        assert_eq!(s.get_int("count"), Some(3));
        assert_eq!(s.get_str("topic"), Some("health"));
        assert_eq!(s.get_bool("topic"), None);
        assert!(s.get_datasets("topic").is_none());
        assert_eq!(s.remove("topic"), Some(SessionValue::Str("health".into())));
        assert!(s.get("topic").is_none());
    }

    #[test]
    fn replies_are_tagged_with_current_state_and_logged() {
        let (tx, mut rx) = reply_channel();
        let mut s = Session::new("s", tx);
        s.set_current("greetings_state");
        s.record_user_message("hi");
        s.reply("hello!");
        s.reply_datasets(Vec::new());
        s.reply_options(["a", "b"]);

        let out = rx.drain();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|o| o.state == "greetings_state"));
        assert_eq!(out[0].reply, Reply::Text("hello!".into()));
        assert_eq!(
            out[2].reply,
            Reply::Options(vec!["a".into(), "b".into()])
        );
        let contents: Vec<_> = s.history().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["hi", "hello!", "[0 datasets]"]);
        assert_eq!(s.message(), Some("hi"));
    }

    #[test]
    fn reset_clears_everything_but_identity() {
        let (tx, _rx) = reply_channel();
        let mut s = Session::new("s", tx);
        s.set_current("x");
        s.set("greeted", true);
        s.record_user_message("hi");
        s.reset();
        assert_eq!(s.id(), "s");
        assert_eq!(s.current(), "");
        assert!(s.get("greeted").is_none());
        assert!(s.history().is_empty());
    }

    /// **Scenario**: A long conversation keeps only the newest messages.
    #[test]
    fn history_is_capped() {
        let (tx, _rx) = reply_channel();
        let mut s = Session::new("s", tx);
        for i in 0..1000 {
            s.record_user_message(&format!("q{}", i));
            s.reply(format!("a{}", i));
        }
        assert_eq!(s.history().len(), HISTORY_LIMIT);
        assert_eq!(s.history().first().unwrap().content(), "q995");
        assert_eq!(s.history().last().unwrap().content(), "a999");
    }

    #[test]
    fn context_excludes_the_message_being_handled() {
        let (tx, _rx) = reply_channel();
        let mut s = Session::new("s", tx);
        assert!(s.context().is_empty());
        s.record_user_message("hi");
        s.reply("hello!");
        s.record_user_message("how are you?");
        let contents: Vec<_> = s.context().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["hi", "hello!"]);

        s.reply("fine");
        assert_eq!(s.context().len(), 4);
    }

    #[test]
    fn untagged_values_serialize_plainly() {
        assert_eq!(serde_json::to_value(SessionValue::Bool(true)).unwrap(), serde_json::json!(true));
        assert_eq!(serde_json::to_value(SessionValue::Int(2)).unwrap(), serde_json::json!(2));
    }
}
