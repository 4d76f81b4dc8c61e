//! Registry of live sessions keyed by their join code.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use rand::Rng;
use tokio::sync::Mutex;

use crate::state::session::{Question, Session};

/// A session behind its lock, shareable with timer tasks.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Join codes avoid characters that read ambiguously on a projected screen.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 6;

/// Maps join codes to live sessions.
///
/// This is the only cross-connection shared structure besides the connection
/// registry. Handles are cloned out of the map before any await, so no map
/// guard is ever held across a suspension point.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionHandle>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh lobby session, allocating an unused join code.
    pub fn create(&self, name: String, questions: Vec<Question>) -> (String, SessionHandle) {
        loop {
            let code = generate_code();
            match self.sessions.entry(code.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let session = Arc::new(Mutex::new(Session::new(
                        code.clone(),
                        name,
                        questions,
                    )));
                    slot.insert(session.clone());
                    return (code, session);
                }
            }
        }
    }

    /// Look up a session by join code (case-insensitive).
    pub fn get(&self, code: &str) -> Option<SessionHandle> {
        let code = normalize(code);
        self.sessions.get(&code).map(|entry| entry.value().clone())
    }

    /// Remove a session, returning its handle if it was present.
    pub fn remove(&self, code: &str) -> Option<SessionHandle> {
        let code = normalize(code);
        self.sessions.remove(&code).map(|(_, handle)| handle)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions() -> Vec<Question> {
        vec![Question {
            text: "2 + 2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "22".into()],
            correct_index: 1,
        }]
    }

    #[test]
    fn created_sessions_are_retrievable_case_insensitively() {
        let registry = SessionRegistry::new();
        let (code, _) = registry.create("Maths".into(), questions());
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(registry.get(&code).is_some());
        assert!(registry.get(&code.to_ascii_lowercase()).is_some());
        assert!(registry.get(" nosuch ").is_none());
    }

    #[test]
    fn remove_deletes_the_session() {
        let registry = SessionRegistry::new();
        let (code, _) = registry.create("Maths".into(), questions());
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(&code).is_some());
        assert!(registry.is_empty());
        assert!(registry.remove(&code).is_none());
    }

    #[test]
    fn codes_use_the_unambiguous_alphabet() {
        for _ in 0..100 {
            let code = generate_code();
            assert!(
                code.bytes().all(|byte| CODE_ALPHABET.contains(&byte)),
                "unexpected character in `{code}`"
            );
        }
    }
}
