//! In-memory session store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use recque_core::error::StoreError;
use recque_core::model::{SessionState, SessionSummary};
use recque_core::traits::SessionStore;

/// Keeps sessions in a map; everything is lost when the process exits.
/// Useful for tests and for `--no-save` runs.
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<Uuid, SessionState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(state.id, state.clone());
        Ok(())
    }

    async fn load(&self, session_id: Uuid) -> Result<SessionState, StoreError> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&session_id)
            .cloned()
            .ok_or(StoreError::NotFound(session_id))
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, StoreError> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(SessionState::summary)
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn delete(&self, session_id: Uuid) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&session_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recque_core::model::SkillTrack;

    fn session() -> SessionState {
        SessionState::new(SkillTrack::new("topic", vec!["skill".into()]).unwrap())
    }

    #[tokio::test]
    async fn save_load_delete() {
        let store = MemoryStore::new();
        let state = session();

        store.save(&state).await.unwrap();
        assert_eq!(store.load(state.id).await.unwrap().id, state.id);
        assert_eq!(store.list().await.unwrap().len(), 1);

        store.delete(state.id).await.unwrap();
        assert!(matches!(
            store.load(state.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(store.load(id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(id).await, Err(StoreError::NotFound(_))));
    }
}
