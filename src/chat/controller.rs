//! Top-level chat controller.
//!
//! The controller is the owner the registry and consumer hang off of: it
//! holds the per-session message cache and implements the snapshot/restore
//! contract when the active session changes. The consumer is bound to exactly
//! one session at a time; the cache holds every other session's history.

use std::collections::HashMap;

use crate::chat::session::{Session, SessionRegistry};
use crate::client::BackendClient;
use crate::consumer::StreamConsumer;
use crate::render::Renderer;
use crate::types::ChatMessage;

/// Owns the session registry, the stream consumer, and the side cache of
/// message histories keyed by session id.
pub struct ChatController {
    registry: SessionRegistry,
    consumer: StreamConsumer,
    cache: HashMap<String, Vec<ChatMessage>>,
}

impl ChatController {
    /// Creates a controller with a fresh registry and an empty consumer.
    pub fn new() -> Self {
        Self {
            registry: SessionRegistry::new(),
            consumer: StreamConsumer::new(),
            cache: HashMap::new(),
        }
    }

    /// All sessions, newest-created-first.
    pub fn sessions(&self) -> &[Session] {
        self.registry.sessions()
    }

    /// The active session.
    pub fn active(&self) -> &Session {
        self.registry.active()
    }

    /// The active session's message history.
    pub fn messages(&self) -> &[ChatMessage] {
        self.consumer.messages()
    }

    /// True while a turn is in flight.
    pub fn is_loading(&self) -> bool {
        self.consumer.is_loading()
    }

    /// The tool the backend is currently running, if any.
    pub fn active_tool(&self) -> Option<&str> {
        self.consumer.active_tool()
    }

    /// Sends a user message on the active session.
    ///
    /// Applies auto-titling from the first user message, then delegates to
    /// the consumer. Returns false when the send was a no-op (blank text or a
    /// turn already in flight).
    pub async fn send(
        &mut self,
        client: &BackendClient,
        text: &str,
        renderer: &mut dyn Renderer,
    ) -> bool {
        let text = text.trim();
        if text.is_empty() || self.consumer.is_loading() {
            return false;
        }
        self.registry.auto_title(text);
        let session_id = self.registry.active().id.clone();
        self.consumer
            .send_message(client, &session_id, text, renderer)
            .await
    }

    /// Creates a new session, snapshots the outgoing one, and starts fresh.
    pub fn new_session(&mut self) -> &Session {
        self.snapshot_active();
        self.consumer.clear_messages();
        self.registry.create_session()
    }

    /// Switches the active session, snapshotting the outgoing session's
    /// messages and restoring the incoming session's cached history.
    ///
    /// Returns false (and changes nothing) if the id is unknown.
    pub fn switch_session(&mut self, id: &str) -> bool {
        if !self.registry.contains(id) {
            return false;
        }
        if self.registry.active_id() == id {
            return true;
        }
        self.snapshot_active();
        self.registry.switch_session(id);
        let restored = self.cache.remove(id).unwrap_or_default();
        self.consumer.restore_messages(restored);
        true
    }

    /// Deletes a session, dropping its cached history.
    ///
    /// If the deleted session was active, the consumer is rebound to whatever
    /// the registry activates next (a remaining session, or the fresh
    /// replacement when the list would have become empty).
    pub fn delete_session(&mut self, id: &str) {
        let was_active = self.registry.active_id() == id;
        self.cache.remove(id);
        self.registry.delete_session(id);

        if was_active {
            let next = self.registry.active_id().to_string();
            let restored = self.cache.remove(&next).unwrap_or_default();
            self.consumer.restore_messages(restored);
        }
    }

    /// Clears the active session's message history.
    pub fn clear_messages(&mut self) {
        self.cache.remove(self.registry.active_id());
        self.consumer.clear_messages();
    }

    /// Snapshots the consumer's messages into the cache under the active id.
    fn snapshot_active(&mut self) {
        let id = self.registry.active_id().to_string();
        let messages = self.consumer.take_messages();
        self.cache.insert(id, messages);
    }
}

impl Default for ChatController {
    fn default() -> Self {
        Self::new()
    }
}
