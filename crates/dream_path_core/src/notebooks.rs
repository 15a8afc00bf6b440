//! crates/dream_path_core/src/notebooks.rs
//!
//! The notebook façade used by the client. Reads degrade to empty results when the
//! store fails; writes propagate their error to the caller.

use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{NewNotebook, Notebook, NotebookId, NotebookUpdate};
use crate::ports::{NotebookStore, PortResult};

pub const UNTITLED_NOTEBOOK: &str = "Untitled Notebook";

#[derive(Clone)]
pub struct NotebookLibrary {
    store: Arc<dyn NotebookStore>,
}

impl NotebookLibrary {
    pub fn new(store: Arc<dyn NotebookStore>) -> Self {
        Self { store }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub async fn list(&self, owner: Option<Uuid>) -> Vec<Notebook> {
        match self.store.list_notebooks(owner).await {
            Ok(notebooks) => notebooks,
            Err(e) => {
                error!(backend = self.backend_name(), "Error fetching notebooks: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn get(&self, owner: Option<Uuid>, id: &NotebookId) -> Option<Notebook> {
        match self.store.get_notebook(owner, id).await {
            Ok(notebook) => Some(notebook),
            Err(e) => {
                error!(backend = self.backend_name(), %id, "Error fetching notebook: {}", e);
                None
            }
        }
    }

    pub async fn create(&self, owner: Option<Uuid>, input: NewNotebook) -> PortResult<Notebook> {
        self.store.create_notebook(owner, input).await
    }

    /// Saves freshly ingested file content. Blank content is not saved.
    pub async fn save_upload(
        &self,
        owner: Option<Uuid>,
        file_name: &str,
        content: &str,
    ) -> PortResult<Option<Notebook>> {
        if content.trim().is_empty() {
            return Ok(None);
        }
        let title = if file_name.trim().is_empty() {
            UNTITLED_NOTEBOOK.to_string()
        } else {
            file_name.to_string()
        };
        let notebook = self
            .create(
                owner,
                NewNotebook {
                    title,
                    content: content.to_string(),
                    file_name: Some(file_name.to_string()),
                },
            )
            .await?;
        info!(id = %notebook.id, backend = self.backend_name(), "Saved upload as notebook");
        Ok(Some(notebook))
    }

    pub async fn update(
        &self,
        owner: Option<Uuid>,
        id: &NotebookId,
        changes: NotebookUpdate,
    ) -> PortResult<Notebook> {
        self.store.update_notebook(owner, id, changes).await
    }

    pub async fn delete(&self, owner: Option<Uuid>, id: &NotebookId) -> PortResult<()> {
        self.store.delete_notebook(owner, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortError;
    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Mutex;

    /// Records created notebooks; every read fails.
    #[derive(Default)]
    struct FlakyStore {
        created: Mutex<Vec<Notebook>>,
    }

    #[async_trait]
    impl NotebookStore for FlakyStore {
        fn backend_name(&self) -> &'static str {
            "flaky"
        }

        async fn create_notebook(
            &self,
            owner: Option<Uuid>,
            input: NewNotebook,
        ) -> PortResult<Notebook> {
            let now = Utc::now();
            let notebook = Notebook {
                id: NotebookId::from(Uuid::new_v4()),
                owner_id: owner.map(|o| o.to_string()).unwrap_or_default(),
                title: input.title,
                content: input.content,
                file_name: input.file_name,
                created_at: now,
                updated_at: now,
            };
            self.created.lock().await.push(notebook.clone());
            Ok(notebook)
        }

        async fn list_notebooks(&self, _owner: Option<Uuid>) -> PortResult<Vec<Notebook>> {
            Err(PortError::Transport("connection refused".into()))
        }

        async fn get_notebook(&self, _owner: Option<Uuid>, id: &NotebookId) -> PortResult<Notebook> {
            Err(PortError::NotFound(id.to_string()))
        }

        async fn update_notebook(
            &self,
            _owner: Option<Uuid>,
            _id: &NotebookId,
            _changes: NotebookUpdate,
        ) -> PortResult<Notebook> {
            Err(PortError::Unauthorized)
        }

        async fn delete_notebook(&self, _owner: Option<Uuid>, _id: &NotebookId) -> PortResult<()> {
            Err(PortError::Unauthorized)
        }
    }

    #[tokio::test]
    async fn reads_degrade_and_writes_propagate() {
        let library = NotebookLibrary::new(Arc::new(FlakyStore::default()));
        let id = NotebookId::from("missing");

        assert!(library.list(None).await.is_empty());
        assert!(library.get(None, &id).await.is_none());
        assert_eq!(
            library.update(None, &id, NotebookUpdate::default()).await,
            Err(PortError::Unauthorized)
        );
        assert!(library.delete(None, &id).await.is_err());
    }

    #[tokio::test]
    async fn uploads_are_saved_with_file_name_title() {
        let store = Arc::new(FlakyStore::default());
        let library = NotebookLibrary::new(store.clone());

        let saved = library.save_upload(None, "cells.txt", "Cells divide.").await.unwrap();
        assert_eq!(saved.unwrap().title, "cells.txt");

        let untitled = library.save_upload(None, " ", "Content").await.unwrap();
        assert_eq!(untitled.unwrap().title, UNTITLED_NOTEBOOK);

        assert!(library.save_upload(None, "blank.txt", "  \n").await.unwrap().is_none());
        assert_eq!(store.created.lock().await.len(), 2);
    }
}
