//! In-memory session registry.
//!
//! The registry owns the list of chat sessions and the active-id pointer.
//! It never holds message history; that lives with the stream consumer and
//! the controller's side cache.

use time::OffsetDateTime;

/// Title of the session created at startup.
pub const INITIAL_TITLE: &str = "Welcome to Finance AI";

/// Placeholder title for sessions created after startup.
pub const DEFAULT_TITLE: &str = "New Analysis";

/// Maximum title length derived from a user message, in characters.
const TITLE_MAX_CHARS: usize = 40;

/// A chat session: an opaque time-derived id and a display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque unique identifier.
    pub id: String,
    /// Display title. Starts as a placeholder and is overwritten once by the
    /// first user message.
    pub title: String,
}

/// The list of sessions, ordered newest-created-first, plus the active id.
///
/// Invariant: never empty after construction. Deleting the last remaining
/// session immediately creates a fresh replacement.
pub struct SessionRegistry {
    sessions: Vec<Session>,
    active_id: String,
}

impl SessionRegistry {
    /// Creates a registry with one initial session, which is active.
    pub fn new() -> Self {
        let mut registry = Self {
            sessions: Vec::new(),
            active_id: String::new(),
        };
        let id = registry.generate_id();
        registry.sessions.push(Session {
            id: id.clone(),
            title: INITIAL_TITLE.to_string(),
        });
        registry.active_id = id;
        registry
    }

    /// All sessions, newest-created-first.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// The id of the active session.
    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// The active session.
    pub fn active(&self) -> &Session {
        self.sessions
            .iter()
            .find(|s| s.id == self.active_id)
            .unwrap_or(&self.sessions[0])
    }

    /// Returns true if a session with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.iter().any(|s| s.id == id)
    }

    /// Creates a new session at the front of the list and makes it active.
    pub fn create_session(&mut self) -> &Session {
        let id = self.generate_id();
        self.sessions.insert(
            0,
            Session {
                id: id.clone(),
                title: DEFAULT_TITLE.to_string(),
            },
        );
        self.active_id = id;
        &self.sessions[0]
    }

    /// Removes a session.
    ///
    /// If the deleted session was active, the first remaining session becomes
    /// active. If the list would become empty, a fresh session is created and
    /// activated instead.
    pub fn delete_session(&mut self, id: &str) {
        self.sessions.retain(|s| s.id != id);

        if self.sessions.is_empty() {
            self.create_session();
        } else if self.active_id == id {
            self.active_id = self.sessions[0].id.clone();
        }
    }

    /// Changes the active session. Returns false if the id is unknown.
    pub fn switch_session(&mut self, id: &str) -> bool {
        if self.contains(id) {
            self.active_id = id.to_string();
            true
        } else {
            false
        }
    }

    /// Titles the active session from its first user message.
    ///
    /// Only fires while the title is still a placeholder: the title becomes a
    /// 40-character prefix of `text`, with a trailing `...` when truncated.
    /// Idempotent once a real title is set.
    pub fn auto_title(&mut self, text: &str) {
        let active_id = self.active_id.clone();
        if let Some(session) = self.sessions.iter_mut().find(|s| s.id == active_id)
            && (session.title == INITIAL_TITLE || session.title == DEFAULT_TITLE)
        {
            session.title = truncate_title(text);
        }
    }

    /// Generates an id distinct from every existing session's id.
    fn generate_id(&self) -> String {
        let mut stamp = OffsetDateTime::now_utc().unix_timestamp_nanos();
        loop {
            let id = stamp.to_string();
            if !self.sessions.iter().any(|s| s.id == id) {
                return id;
            }
            stamp += 1;
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_title(text: &str) -> String {
    let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
    if text.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_one_active_session() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.sessions().len(), 1);
        assert_eq!(registry.active().title, INITIAL_TITLE);
        assert_eq!(registry.active().id, registry.active_id());
    }

    #[test]
    fn create_twice_yields_distinct_ids_newest_first() {
        let mut registry = SessionRegistry::new();
        let first = registry.create_session().id.clone();
        let second = registry.create_session().id.clone();

        assert_ne!(first, second);
        assert_eq!(registry.sessions()[0].id, second);
        assert_eq!(registry.sessions()[1].id, first);
        assert_eq!(registry.active_id(), second);
    }

    #[test]
    fn deleting_last_session_creates_fresh_replacement() {
        let mut registry = SessionRegistry::new();
        let only = registry.active().id.clone();
        registry.delete_session(&only);

        assert_eq!(registry.sessions().len(), 1);
        assert_ne!(registry.active().id, only);
        assert_eq!(registry.active().title, DEFAULT_TITLE);
    }

    #[test]
    fn deleting_active_session_activates_first_remaining() {
        let mut registry = SessionRegistry::new();
        let original = registry.active().id.clone();
        let newer = registry.create_session().id.clone();

        registry.delete_session(&newer);
        assert_eq!(registry.active_id(), original);
        assert_eq!(registry.sessions().len(), 1);
    }

    #[test]
    fn deleting_inactive_session_keeps_active() {
        let mut registry = SessionRegistry::new();
        let original = registry.active().id.clone();
        let newer = registry.create_session().id.clone();

        registry.delete_session(&original);
        assert_eq!(registry.active_id(), newer);
    }

    #[test]
    fn switch_to_unknown_id_is_rejected() {
        let mut registry = SessionRegistry::new();
        let active = registry.active().id.clone();
        assert!(!registry.switch_session("no-such-id"));
        assert_eq!(registry.active_id(), active);
    }

    #[test]
    fn auto_title_truncates_long_messages() {
        let mut registry = SessionRegistry::new();
        let message = "a".repeat(50);
        registry.auto_title(&message);

        let expected = format!("{}...", "a".repeat(40));
        assert_eq!(registry.active().title, expected);

        // A second user message does not retitle.
        registry.auto_title("something else entirely");
        assert_eq!(registry.active().title, expected);
    }

    #[test]
    fn auto_title_short_message_is_used_verbatim() {
        let mut registry = SessionRegistry::new();
        registry.create_session();
        registry.auto_title("Compare AAPL and MSFT");
        assert_eq!(registry.active().title, "Compare AAPL and MSFT");
    }

    #[test]
    fn auto_title_counts_characters_not_bytes() {
        let mut registry = SessionRegistry::new();
        let message = "\u{e9}".repeat(41);
        registry.auto_title(&message);
        let title = registry.active().title.clone();
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 43);
    }
}
