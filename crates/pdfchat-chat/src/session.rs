//! Session identifier to transcript mapping.
//!
//! Each session owns one transcript behind its own async mutex. The map lock
//! is only held long enough to find or insert a session, so turns in different
//! sessions never wait on each other, while turns in one session run one at a
//! time in the order they acquired the lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use pdfchat_core::types::{Transcript, Turn};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::ChatError;

type SessionHandle = Arc<Mutex<Transcript>>;

/// Trim a session id and reject it if nothing is left.
pub fn normalize_session_id(session_id: &str) -> Result<&str, ChatError> {
    let trimmed = session_id.trim();
    if trimmed.is_empty() {
        Err(ChatError::InvalidSessionId)
    } else {
        Ok(trimmed)
    }
}

/// Process-wide store of session transcripts.
///
/// Sessions are created lazily on first reference and never removed. Cloning
/// the store yields another handle to the same sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, session_id: &str) -> Result<SessionHandle, ChatError> {
        let id = normalize_session_id(session_id)?;

        {
            let sessions = self
                .sessions
                .read()
                .map_err(|e| ChatError::Storage(format!("session lock poisoned: {}", e)))?;
            if let Some(handle) = sessions.get(id) {
                return Ok(Arc::clone(handle));
            }
        }

        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| ChatError::Storage(format!("session lock poisoned: {}", e)))?;
        let handle = sessions.entry(id.to_string()).or_insert_with(|| {
            debug!(session = id, "Session created");
            Arc::new(Mutex::new(Transcript::new()))
        });
        Ok(Arc::clone(handle))
    }

    /// Return a copy of the session's transcript, creating it if needed.
    pub async fn get_or_create(&self, session_id: &str) -> Result<Transcript, ChatError> {
        let handle = self.handle(session_id)?;
        let transcript = handle.lock().await;
        Ok(transcript.clone())
    }

    /// Record a completed turn at the end of the session's transcript.
    pub async fn append(
        &self,
        session_id: &str,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<(), ChatError> {
        let mut transcript = self.lock(session_id).await?;
        transcript.push(Turn::new(question, answer));
        Ok(())
    }

    /// Take the session's exclusive region.
    ///
    /// While the guard is alive no other turn in this session can start.
    pub async fn lock(&self, session_id: &str) -> Result<OwnedMutexGuard<Transcript>, ChatError> {
        let handle = self.handle(session_id)?;
        Ok(handle.lock_owned().await)
    }

    /// Return the session's transcript without creating it.
    pub async fn find(&self, session_id: &str) -> Result<Option<Transcript>, ChatError> {
        let id = normalize_session_id(session_id)?;
        let handle = {
            let sessions = self
                .sessions
                .read()
                .map_err(|e| ChatError::Storage(format!("session lock poisoned: {}", e)))?;
            sessions.get(id).map(Arc::clone)
        };
        match handle {
            Some(handle) => Ok(Some(handle.lock().await.clone())),
            None => Ok(None),
        }
    }

    /// Copy every transcript, waiting for in-flight turns to finish.
    pub async fn snapshot(&self) -> Result<BTreeMap<String, Transcript>, ChatError> {
        let handles = self.handles()?;
        let mut out = BTreeMap::new();
        for (id, handle) in handles {
            let transcript = handle.lock().await.clone();
            out.insert(id, transcript);
        }
        Ok(out)
    }

    /// Copy every transcript that is not currently mid-turn.
    ///
    /// Never waits, so it is safe to call while holding a session lock.
    pub fn try_snapshot(&self) -> Result<BTreeMap<String, Option<Transcript>>, ChatError> {
        let handles = self.handles()?;
        Ok(handles
            .into_iter()
            .map(|(id, handle)| {
                let transcript = handle.try_lock().ok().map(|t| t.clone());
                (id, transcript)
            })
            .collect())
    }

    pub fn session_ids(&self) -> Result<Vec<String>, ChatError> {
        let mut ids: Vec<String> = self.handles()?.into_iter().map(|(id, _)| id).collect();
        ids.sort();
        Ok(ids)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn handles(&self) -> Result<Vec<(String, SessionHandle)>, ChatError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| ChatError::Storage(format!("session lock poisoned: {}", e)))?;
        Ok(sessions
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_session_id() {
        assert_eq!(normalize_session_id("  abc ").unwrap(), "abc");
        assert!(matches!(
            normalize_session_id(""),
            Err(ChatError::InvalidSessionId)
        ));
        assert!(matches!(
            normalize_session_id(" \t\n"),
            Err(ChatError::InvalidSessionId)
        ));
    }

    #[tokio::test]
    async fn test_get_or_create_is_lazy() {
        let store = SessionStore::new();
        assert!(store.is_empty());

        let transcript = store.get_or_create("default_session").await.unwrap();
        assert!(transcript.is_empty());
        assert_eq!(store.len(), 1);

        store.get_or_create("default_session").await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let store = SessionStore::new();
        store.append("s", "q1", "a1").await.unwrap();
        store.append("s", "q2", "a2").await.unwrap();
        store.append("s", "q3", "a3").await.unwrap();

        let transcript = store.get_or_create("s").await.unwrap();
        let questions: Vec<&str> = transcript
            .turns()
            .iter()
            .map(|t| t.question.as_str())
            .collect();
        assert_eq!(questions, vec!["q1", "q2", "q3"]);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        store.append("A", "secret question", "secret answer").await.unwrap();

        let b = store.get_or_create("B").await.unwrap();
        assert!(b.is_empty());
        assert_eq!(store.get_or_create("A").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ids_are_trimmed() {
        let store = SessionStore::new();
        store.append("  padded  ", "q", "a").await.unwrap();
        assert_eq!(store.get_or_create("padded").await.unwrap().len(), 1);
        assert_eq!(store.session_ids().unwrap(), vec!["padded".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_id_rejected_everywhere() {
        let store = SessionStore::new();
        assert!(matches!(
            store.get_or_create(" ").await,
            Err(ChatError::InvalidSessionId)
        ));
        assert!(matches!(
            store.append("", "q", "a").await,
            Err(ChatError::InvalidSessionId)
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_find_does_not_create() {
        let store = SessionStore::new();
        assert!(store.find("ghost").await.unwrap().is_none());
        assert!(store.is_empty());

        store.append("real", "q", "a").await.unwrap();
        assert_eq!(store.find("real").await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_sorted_copy() {
        let store = SessionStore::new();
        store.append("zeta", "q", "a").await.unwrap();
        store.append("alpha", "q", "a").await.unwrap();

        let snapshot = store.snapshot().await.unwrap();
        let ids: Vec<&String> = snapshot.keys().collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_try_snapshot_skips_locked_session() {
        let store = SessionStore::new();
        store.append("busy", "q", "a").await.unwrap();
        store.append("idle", "q", "a").await.unwrap();

        let _guard = store.lock("busy").await.unwrap();
        let snapshot = store.try_snapshot().unwrap();
        assert!(snapshot["busy"].is_none());
        assert_eq!(snapshot["idle"].as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lock_serializes_same_session() {
        let store = SessionStore::new();
        let mut guard = store.lock("s").await.unwrap();

        let other = store.clone();
        let waiter = tokio::spawn(async move {
            other.append("s", "second", "2").await.unwrap();
        });

        tokio::task::yield_now().await;
        guard.push(Turn::new("first", "1"));
        drop(guard);
        waiter.await.unwrap();

        let transcript = store.get_or_create("s").await.unwrap();
        assert_eq!(transcript.turns()[0].question, "first");
        assert_eq!(transcript.turns()[1].question, "second");
    }
}
