//! File-per-session JSON store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use recque_core::error::StoreError;
use recque_core::model::{SessionState, SessionSummary};
use recque_core::traits::SessionStore;

/// Stores each session as `<id>.json` in a directory.
///
/// Saves write to a temp file and rename into place, so a crash mid-write
/// leaves the previous snapshot intact rather than a truncated file.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn session_path(&self, session_id: Uuid) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }
}

fn io_error(e: std::io::Error) -> StoreError {
    StoreError::Io(e.to_string())
}

#[async_trait]
impl SessionStore for JsonFileStore {
    async fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(io_error)?;

        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let path = self.session_path(state.id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await.map_err(io_error)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_error)?;
        tracing::debug!(session_id = %state.id, path = %path.display(), "session saved");
        Ok(())
    }

    async fn load(&self, session_id: Uuid) -> Result<SessionState, StoreError> {
        let path = self.session_path(session_id);
        let json = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StoreError::NotFound(session_id)
            } else {
                io_error(e)
            }
        })?;
        serde_json::from_str(&json).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(io_error(e)),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_summary(&path).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    // A corrupt file should not hide the healthy sessions.
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable session file");
                }
            }
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn delete(&self, session_id: Uuid) -> Result<(), StoreError> {
        tokio::fs::remove_file(self.session_path(session_id))
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    StoreError::NotFound(session_id)
                } else {
                    io_error(e)
                }
            })
    }
}

async fn read_summary(path: &Path) -> Result<SessionSummary, StoreError> {
    let json = tokio::fs::read_to_string(path).await.map_err(io_error)?;
    let state: SessionState =
        serde_json::from_str(&json).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(state.summary())
}
