//! In-memory, per-conversation rolling history.
//!
//! Nothing here survives a restart: the store lives for the life of the
//! process and a new process starts with every conversation empty.

use std::{collections::HashMap, fmt, sync::Arc};

use log::debug;
use poise::serenity_prelude::{ChannelId, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::types::{MessageRole, Turn};

/// Key distinguishing independent histories.
///
/// One history per user per channel. A DM channel belongs to exactly one user,
/// so DMs are effectively keyed by user alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    #[must_use]
    pub fn new(user_id: UserId, channel_id: ChannelId) -> Self {
        Self(format!("{channel_id}:{user_id}"))
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Default)]
struct History {
    turns: Vec<Turn>,
    /// Set once the history has been removed from the store by `clear`.
    retired: bool,
}

type Slot = Arc<Mutex<History>>;

/// Process-wide map from conversation id to its capped turn sequence.
///
/// Each conversation has its own async lock so that turns for one
/// conversation are serialized while different conversations proceed
/// concurrently.
#[derive(Debug)]
pub struct HistoryStore {
    cap: usize,
    conversations: Mutex<HashMap<ConversationId, Slot>>,
}

impl HistoryStore {
    /// Create an empty store keeping at most `cap` turns per conversation.
    ///
    /// A cap of zero is treated as one.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            conversations: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Acquire exclusive access to a conversation, creating it if absent.
    ///
    /// The returned guard serializes all other access to the same
    /// conversation until it is dropped.
    pub async fn lock(&self, id: &ConversationId) -> ConversationGuard {
        loop {
            let slot = {
                let mut conversations = self.conversations.lock().await;
                Arc::clone(conversations.entry(id.clone()).or_default())
            };

            let history = slot.lock_owned().await;
            // Lost a race with `clear`; pick up the fresh slot instead.
            if !history.retired {
                return ConversationGuard {
                    cap: self.cap,
                    history,
                };
            }
        }
    }

    /// Snapshot of the conversation's turns, registering an empty history if absent.
    pub async fn get_or_create(&self, id: &ConversationId) -> Vec<Turn> {
        self.lock(id).await.turns().to_vec()
    }

    /// Append a turn, evicting the oldest turns beyond the cap.
    pub async fn append(&self, id: &ConversationId, role: MessageRole, text: impl Into<String>) {
        self.lock(id).await.append(role, text);
    }

    /// Remove the conversation entirely.
    ///
    /// Waits for any in-flight exchange on the same conversation to finish.
    pub async fn clear(&self, id: &ConversationId) {
        let Some(slot) = self.conversations.lock().await.get(id).cloned() else {
            return;
        };

        let mut history = slot.lock().await;
        history.turns.clear();
        history.retired = true;

        let mut conversations = self.conversations.lock().await;
        if conversations
            .get(id)
            .is_some_and(|current| Arc::ptr_eq(current, &slot))
        {
            conversations.remove(id);
        }
        debug!("Cleared history for conversation {id}");
    }

    /// Number of conversations currently held in memory.
    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.conversations.lock().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Exclusive handle on one conversation's history.
pub struct ConversationGuard {
    cap: usize,
    history: OwnedMutexGuard<History>,
}

impl ConversationGuard {
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.history.turns
    }

    /// Append a turn, then drop turns from the front until the cap holds.
    pub fn append(&mut self, role: MessageRole, text: impl Into<String>) {
        let turns = &mut self.history.turns;
        turns.push(Turn::new(role, text));
        if turns.len() > self.cap {
            let excess = turns.len() - self.cap;
            turns.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn id(value: &str) -> ConversationId {
        ConversationId::from(value)
    }

    async fn contents(store: &HistoryStore, conversation: &ConversationId) -> Vec<String> {
        let turns = store.get_or_create(conversation).await;
        turns.into_iter().map(|turn| turn.content).collect()
    }

    #[test]
    fn conversation_id_combines_channel_and_user() {
        let id = ConversationId::new(UserId::new(42), ChannelId::new(7));
        assert_eq!(id.to_string(), "7:42");
    }

    #[tokio::test]
    async fn unseen_conversation_is_empty() {
        let store = HistoryStore::new(5);
        assert!(store.get_or_create(&id("new")).await.is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn keeps_most_recent_turns_in_order() {
        for appended in 0..8usize {
            let store = HistoryStore::new(3);
            let conversation = id("fifo");
            for i in 0..appended {
                let text = i.to_string();
                store.append(&conversation, MessageRole::User, text).await;
            }

            let expected: Vec<String> = (appended.saturating_sub(3)..appended)
                .map(|i| i.to_string())
                .collect();
            assert_eq!(contents(&store, &conversation).await, expected);
        }
    }

    #[tokio::test]
    async fn clear_starts_fresh() {
        let store = HistoryStore::new(4);
        let key = id("reset-me");
        store.append(&key, MessageRole::User, "hello").await;
        store.append(&key, MessageRole::Assistant, "hi").await;

        store.clear(&key).await;

        assert!(store.is_empty().await);
        assert!(store.get_or_create(&key).await.is_empty());
    }

    #[tokio::test]
    async fn clear_of_unknown_conversation_is_a_no_op() {
        let store = HistoryStore::new(4);
        store.clear(&id("ghost")).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn conversations_are_isolated() {
        let store = HistoryStore::new(4);
        store.append(&id("a"), MessageRole::User, "for a").await;
        store.append(&id("b"), MessageRole::User, "for b").await;
        store.clear(&id("a")).await;

        assert!(store.get_or_create(&id("a")).await.is_empty());
        assert_eq!(contents(&store, &id("b")).await, ["for b"]);
    }

    #[tokio::test]
    async fn guard_serializes_exchanges_on_one_conversation() {
        let store = Arc::new(HistoryStore::new(10));
        let conversation = id("busy");

        let mut first = store.lock(&conversation).await;
        first.append(MessageRole::User, "first question");

        let second = tokio::spawn({
            let store = Arc::clone(&store);
            let conversation = conversation.clone();
            async move {
                let mut guard = store.lock(&conversation).await;
                guard.append(MessageRole::User, "second question");
                guard.append(MessageRole::Assistant, "second answer");
            }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        first.append(MessageRole::Assistant, "first answer");
        drop(first);
        second.await.expect("second exchange panicked");

        assert_eq!(
            contents(&store, &conversation).await,
            [
                "first question",
                "first answer",
                "second question",
                "second answer"
            ]
        );
    }

    #[tokio::test]
    async fn clear_waits_for_in_flight_exchange() {
        let store = Arc::new(HistoryStore::new(10));
        let conversation = id("racing");

        let mut guard = store.lock(&conversation).await;
        guard.append(MessageRole::User, "question");

        let reset = tokio::spawn({
            let store = Arc::clone(&store);
            let conversation = conversation.clone();
            async move { store.clear(&conversation).await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        guard.append(MessageRole::Assistant, "answer");
        drop(guard);
        reset.await.expect("reset panicked");

        assert!(store.get_or_create(&conversation).await.is_empty());
    }

    #[tokio::test]
    async fn exchange_queued_behind_clear_starts_a_fresh_history() {
        let store = Arc::new(HistoryStore::new(10));
        let conversation = id("queued");

        let mut guard = store.lock(&conversation).await;
        guard.append(MessageRole::User, "old question");

        let reset = tokio::spawn({
            let store = Arc::clone(&store);
            let conversation = conversation.clone();
            async move { store.clear(&conversation).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let next = tokio::spawn({
            let store = Arc::clone(&store);
            let conversation = conversation.clone();
            async move {
                let mut guard = store.lock(&conversation).await;
                guard.append(MessageRole::User, "new");
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        reset.await.expect("reset panicked");
        next.await.expect("queued exchange panicked");

        assert_eq!(contents(&store, &conversation).await, ["new"]);
        assert_eq!(store.len().await, 1);
    }
}
