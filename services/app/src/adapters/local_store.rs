//! services/app/src/adapters/local_store.rs
//!
//! A small key/value JSON document on disk. It backs notebooks when no database is
//! configured, per-user file history, and the signed-in session token.

use async_trait::async_trait;
use chrono::Utc;
use dream_path_core::domain::LOCAL_ID_PREFIX;
use dream_path_core::ports::{HistoryStore, NotebookStore, PortError, PortResult};
use dream_path_core::{HistoryItem, NewNotebook, Notebook, NotebookId, NotebookUpdate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

pub const STORE_FILE_NAME: &str = "local_store.json";
pub const NOTEBOOKS_KEY: &str = "dreampath_notebooks";
pub const SESSION_KEY: &str = "auth_session";
const LOCAL_OWNER: &str = "local";

fn history_key(user_id: Uuid) -> String {
    format!("fileHistory_{}", user_id)
}

fn io_error(context: &str, path: &Path, e: impl std::fmt::Display) -> PortError {
    PortError::Unexpected(format!("{} {}: {}", context, path.display(), e))
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct LocalStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the document.
    lock: Mutex<()>,
}

impl LocalStore {
    /// Creates a store kept in `STORE_FILE_NAME` under `data_dir`. Nothing is touched on
    /// disk until the first write.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(STORE_FILE_NAME),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> PortResult<Map<String, Value>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Map::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| io_error("Corrupt local store", &self.path, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(io_error("Failed to read", &self.path, e)),
        }
    }

    async fn write_document(&self, document: &Map<String, Value>) -> PortResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("Failed to create", parent, e))?;
        }
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes)
            .await
            .map_err(|e| io_error("Failed to write", &staging, e))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| io_error("Failed to replace", &self.path, e))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> PortResult<Option<T>> {
        let _guard = self.lock.lock().await;
        let document = self.read_document().await?;
        document
            .get(key)
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| PortError::Unexpected(format!("Malformed value for {}: {}", key, e)))
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> PortResult<()> {
        let value = serde_json::to_value(value).map_err(|e| PortError::Unexpected(e.to_string()))?;
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        document.insert(key.to_string(), value);
        self.write_document(&document).await?;
        debug!(key, "Local store updated");
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> PortResult<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        if document.remove(key).is_some() {
            self.write_document(&document).await?;
        }
        Ok(())
    }

    /// Runs `edit` on the notebook list under one lock and persists the result.
    async fn edit_notebooks<R>(
        &self,
        edit: impl FnOnce(&mut Vec<Notebook>) -> PortResult<R>,
    ) -> PortResult<R> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        let mut notebooks: Vec<Notebook> = match document.get(NOTEBOOKS_KEY) {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| PortError::Unexpected(format!("Malformed notebooks: {}", e)))?,
            None => Vec::new(),
        };
        let outcome = edit(&mut notebooks)?;
        let value =
            serde_json::to_value(&notebooks).map_err(|e| PortError::Unexpected(e.to_string()))?;
        document.insert(NOTEBOOKS_KEY.to_string(), value);
        self.write_document(&document).await?;
        Ok(outcome)
    }
}

fn new_local_id() -> NotebookId {
    let nonce = Uuid::new_v4().simple().to_string();
    NotebookId(format!(
        "{}{}_{}",
        LOCAL_ID_PREFIX,
        Utc::now().timestamp_millis(),
        &nonce[..8]
    ))
}

//=========================================================================================
// `NotebookStore` Trait Implementation
//=========================================================================================

// The fallback store is single-user: owners are ignored and every entry belongs to "local".
#[async_trait]
impl NotebookStore for LocalStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn create_notebook(
        &self,
        _owner: Option<Uuid>,
        input: NewNotebook,
    ) -> PortResult<Notebook> {
        let now = Utc::now();
        let notebook = Notebook {
            id: new_local_id(),
            owner_id: LOCAL_OWNER.to_string(),
            title: input.title,
            content: input.content,
            file_name: input.file_name,
            created_at: now,
            updated_at: now,
        };
        let created = notebook.clone();
        self.edit_notebooks(move |notebooks| {
            notebooks.insert(0, notebook);
            Ok(())
        })
        .await?;
        Ok(created)
    }

    async fn list_notebooks(&self, _owner: Option<Uuid>) -> PortResult<Vec<Notebook>> {
        let mut notebooks: Vec<Notebook> = self.get(NOTEBOOKS_KEY).await?.unwrap_or_default();
        notebooks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notebooks)
    }

    async fn get_notebook(&self, _owner: Option<Uuid>, id: &NotebookId) -> PortResult<Notebook> {
        let notebooks: Vec<Notebook> = self.get(NOTEBOOKS_KEY).await?.unwrap_or_default();
        notebooks
            .into_iter()
            .find(|n| &n.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Notebook {} not found", id)))
    }

    async fn update_notebook(
        &self,
        _owner: Option<Uuid>,
        id: &NotebookId,
        changes: NotebookUpdate,
    ) -> PortResult<Notebook> {
        self.edit_notebooks(|notebooks| {
            let notebook = notebooks
                .iter_mut()
                .find(|n| &n.id == id)
                .ok_or_else(|| PortError::NotFound(format!("Notebook {} not found", id)))?;
            changes.apply_to(notebook, Utc::now());
            Ok(notebook.clone())
        })
        .await
    }

    async fn delete_notebook(&self, _owner: Option<Uuid>, id: &NotebookId) -> PortResult<()> {
        self.edit_notebooks(|notebooks| {
            notebooks.retain(|n| &n.id != id);
            Ok(())
        })
        .await
    }
}

//=========================================================================================
// `HistoryStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl HistoryStore for LocalStore {
    async fn load_history(&self, user_id: Uuid) -> PortResult<Vec<HistoryItem>> {
        Ok(self.get(&history_key(user_id)).await?.unwrap_or_default())
    }

    async fn save_history(&self, user_id: Uuid, items: &[HistoryItem]) -> PortResult<()> {
        self.set(&history_key(user_id), &items).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().join("nested"));
        (dir, store)
    }

    fn new_notebook(title: &str) -> NewNotebook {
        NewNotebook {
            title: title.to_string(),
            content: format!("{} content", title),
            file_name: Some(format!("{}.txt", title)),
        }
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let (_dir, store) = store();
        assert!(store.list_notebooks(None).await.unwrap().is_empty());
        assert_eq!(store.get::<String>(SESSION_KEY).await.unwrap(), None);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn notebooks_round_trip_with_local_ids() {
        let (_dir, store) = store();
        let first = store.create_notebook(None, new_notebook("cells")).await.unwrap();
        let second = store.create_notebook(None, new_notebook("atoms")).await.unwrap();

        assert!(first.id.is_local());
        assert_ne!(first.id, second.id);
        assert_eq!(first.owner_id, "local");

        let fetched = store.get_notebook(None, &first.id).await.unwrap();
        assert_eq!(fetched, first);
        assert_eq!(store.list_notebooks(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_bumps_timestamp_and_reorders() {
        let (_dir, store) = store();
        let first = store.create_notebook(None, new_notebook("cells")).await.unwrap();
        let _second = store.create_notebook(None, new_notebook("atoms")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let updated = store
            .update_notebook(
                None,
                &first.id,
                NotebookUpdate {
                    title: Some("Cell biology".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Cell biology");
        assert_eq!(updated.content, first.content);
        assert!(updated.updated_at > first.updated_at);
        assert_eq!(store.list_notebooks(None).await.unwrap()[0].id, first.id);
    }

    #[tokio::test]
    async fn delete_and_missing_ids() {
        let (_dir, store) = store();
        let notebook = store.create_notebook(None, new_notebook("cells")).await.unwrap();
        store.delete_notebook(None, &notebook.id).await.unwrap();

        assert!(matches!(
            store.get_notebook(None, &notebook.id).await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            store
                .update_notebook(None, &notebook.id, NotebookUpdate::default())
                .await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn history_is_keyed_per_user() {
        let (_dir, store) = store();
        let ada = Uuid::new_v4();
        let grace = Uuid::new_v4();
        let items = vec![HistoryItem {
            file_name: "cells.txt".into(),
            content: "Cells.".into(),
        }];

        store.save_history(ada, &items).await.unwrap();

        assert_eq!(store.load_history(ada).await.unwrap(), items);
        assert!(store.load_history(grace).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn values_survive_a_new_handle() {
        let (dir, store) = store();
        store.set(SESSION_KEY, &"token-123").await.unwrap();

        let reopened = LocalStore::new(dir.path().join("nested"));
        assert_eq!(
            reopened.get::<String>(SESSION_KEY).await.unwrap().as_deref(),
            Some("token-123")
        );

        reopened.remove(SESSION_KEY).await.unwrap();
        assert_eq!(store.get::<String>(SESSION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_document_is_an_error() {
        let (dir, store) = store();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(store.path(), b"{not json").unwrap();
        assert!(store.list_notebooks(None).await.is_err());
    }
}
