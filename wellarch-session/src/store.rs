//! File-backed session storage
//!
//! One pretty-printed JSON file per session, named `<id>.json`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::session::Session;

const SESSION_EXTENSION: &str = "json";

/// Directory of persisted review sessions
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            Error::Storage(format!(
                "failed to create session dir {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    /// Open the store under the user's data directory
    pub async fn open_default() -> Result<Self> {
        Self::open(wellarch_paths::sessions_dir()).await
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create and persist a new empty session
    pub async fn create(&self, name: impl Into<String>) -> Result<Session> {
        let session = Session::new(name);
        self.write(&session).await?;
        debug!(id = %session.id, name = %session.name, "created session");
        Ok(session)
    }

    /// Persist `session`, bumping its `updated_at`
    pub async fn save(&self, session: &mut Session) -> Result<()> {
        let path = self.path_for(&session.id)?;
        session.updated_at = Utc::now().max(session.created_at);
        self.write_to(&path, session).await
    }

    /// Load a session by id
    pub async fn load(&self, id: &str) -> Result<Session> {
        let path = self.path_for(id)?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(id.to_string()));
            }
            Err(e) => {
                return Err(Error::Storage(format!(
                    "failed to read session {}: {}",
                    id, e
                )));
            }
        };
        serde_json::from_str(&content).map_err(|source| Error::Corrupt {
            path: path.display().to_string(),
            source,
        })
    }

    /// All readable sessions, oldest first
    ///
    /// Files that fail to parse are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<Session>> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(|e| {
            Error::Storage(format!("failed to list sessions: {}", e))
        })?;

        let mut sessions = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::Storage(format!("failed to list sessions: {}", e)))?
        {
            let path = entry.path();
            let Some(id) = session_id_of(&path) else {
                continue;
            };
            match self.load(&id).await {
                Ok(session) => sessions.push(session),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable session"),
            }
        }

        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(sessions)
    }

    /// Delete a session by id
    pub async fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(id, "deleted session");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(id.to_string()))
            }
            Err(e) => Err(Error::Storage(format!(
                "failed to delete session {}: {}",
                id, e
            ))),
        }
    }

    /// Only UUIDs are accepted, so an id can never name a path outside the store.
    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let uuid = Uuid::parse_str(id).map_err(|_| Error::InvalidId(id.to_string()))?;
        Ok(self
            .dir
            .join(format!("{}.{}", uuid.hyphenated(), SESSION_EXTENSION)))
    }

    async fn write(&self, session: &Session) -> Result<()> {
        let path = self.path_for(&session.id)?;
        self.write_to(&path, session).await
    }

    async fn write_to(&self, path: &Path, session: &Session) -> Result<()> {
        let content = serde_json::to_string_pretty(session).map_err(|e| {
            Error::Storage(format!("failed to serialize session {}: {}", session.id, e))
        })?;
        fs::write(path, content).await.map_err(|e| {
            Error::Storage(format!("failed to write session {}: {}", session.id, e))
        })
    }
}

fn session_id_of(path: &Path) -> Option<String> {
    if path.extension()? != SESSION_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    Uuid::parse_str(stem).ok().map(|_| stem.to_string())
}
