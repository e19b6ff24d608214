//! Rule-based clinic assistant.
//!
//! Answers free-text questions about the practice by matching keywords to a
//! fixed set of intents and rendering French templates from the store's
//! derived views. No language model or external service is involved.

pub mod format;
pub mod intents;
pub mod responses;

pub use format::{format_currency, format_short_date};
pub use intents::{classify, Intent};
pub use responses::GREETING;

use mediplan_core::Store;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Assistant errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssistantError {
    #[error("Empty query")]
    EmptyQuery,
}

pub type AssistantResult<T> = Result<T, AssistantError>;

/// Read-only view of a store that answers questions.
pub struct Assistant<'a> {
    store: &'a Store,
}

impl<'a> Assistant<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Answer immediately.
    pub fn respond(&self, query: &str) -> String {
        let intent = classify(query);
        debug!(?intent, "assistant query");
        responses::render(intent, self.store)
    }

    /// Answer after the configured reply delay, waited on the store clock.
    pub fn reply(&self, query: &str) -> String {
        self.store
            .clock()
            .sleep(self.store.config().assistant_reply_delay());
        self.respond(query)
    }
}

/// Who wrote a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: u64,
    #[serde(rename = "type")]
    pub speaker: Speaker,
    pub content: String,
}

/// A chat log, opened with [`GREETING`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
    next_id: u64,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        let mut conversation = Self {
            turns: Vec::new(),
            next_id: 1,
        };
        conversation.push(Speaker::Bot, GREETING.to_string());
        conversation
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Record `query`, then the assistant's delayed reply. Blank queries are
    /// rejected and leave the log unchanged.
    pub fn ask(&mut self, assistant: &Assistant<'_>, query: &str) -> AssistantResult<&Turn> {
        if query.trim().is_empty() {
            return Err(AssistantError::EmptyQuery);
        }
        self.push(Speaker::User, query.to_string());
        let answer = assistant.reply(query);
        Ok(self.push(Speaker::Bot, answer))
    }

    fn push(&mut self, speaker: Speaker, content: String) -> &Turn {
        let id = self.next_id;
        self.next_id += 1;
        self.turns.push(Turn {
            id,
            speaker,
            content,
        });
        &self.turns[self.turns.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use mediplan_core::clock::{Clock, ManualClock};
    use mediplan_core::config::StoreConfig;
    use mediplan_core::db::MemoryBackend;

    use super::*;

    fn store(clock: &ManualClock) -> Store {
        Store::open(
            Box::new(MemoryBackend::new()),
            StoreConfig::default(),
            Arc::new(clock.clone()),
        )
    }

    #[test]
    fn test_reply_waits_on_store_clock() {
        let clock = ManualClock::on(NaiveDate::from_ymd_opt(2025, 1, 13).unwrap());
        let store = store(&clock);
        let start = clock.now();

        let answer = Assistant::new(&store).reply("aide");
        assert!(answer.starts_with("🤖"));
        assert_eq!(clock.now() - start, chrono::Duration::milliseconds(800));
    }

    #[test]
    fn test_respond_does_not_wait() {
        let clock = ManualClock::on(NaiveDate::from_ymd_opt(2025, 1, 13).unwrap());
        let store = store(&clock);
        let start = clock.now();

        Assistant::new(&store).respond("aide");
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_conversation_log() {
        let clock = ManualClock::on(NaiveDate::from_ymd_opt(2025, 1, 13).unwrap());
        let store = store(&clock);
        let assistant = Assistant::new(&store);
        let mut conversation = Conversation::new();

        assert_eq!(conversation.turns().len(), 1);
        assert_eq!(conversation.turns()[0].content, GREETING);

        let reply = conversation.ask(&assistant, "help").unwrap().clone();
        assert_eq!(reply.speaker, Speaker::Bot);
        assert_eq!(reply.id, 3);

        assert_eq!(
            conversation.ask(&assistant, "   "),
            Err(AssistantError::EmptyQuery)
        );
        let speakers: Vec<Speaker> = conversation.turns().iter().map(|t| t.speaker).collect();
        assert_eq!(speakers, vec![Speaker::Bot, Speaker::User, Speaker::Bot]);
    }

    #[test]
    fn test_turn_wire_format() {
        let conversation = Conversation::new();
        let json = serde_json::to_value(&conversation.turns()[0]).unwrap();
        assert_eq!(json["type"], "bot");
        assert_eq!(json["id"], 1);
    }
}
