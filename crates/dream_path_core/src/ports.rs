//! crates/dream_path_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    HistoryItem, NewNotebook, Notebook, NotebookId, NotebookUpdate, User, UserCredentials,
    UserMetadata,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// The adapter is missing a credential or setting it needs before doing any I/O.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The remote service answered with a non-success status.
    #[error("Provider error: {status} - {body}")]
    Provider { status: u16, body: String },
    /// The remote service could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Sends a single user prompt and returns the raw completion text.
    async fn complete(&self, prompt: &str) -> PortResult<String>;
}

#[async_trait]
pub trait ImageLookupService: Send + Sync {
    /// Returns a best-effort image URL for a concept. Never fails.
    async fn image_for(&self, term: &str) -> String;
}

/// Splits a paginated document into per-page text.
pub trait PageExtractor: Send + Sync {
    /// Fails only when the document as a whole cannot be opened. Each page carries
    /// its own result so a single unreadable page does not lose the others.
    fn extract_pages(&self, bytes: &[u8]) -> PortResult<Vec<PortResult<String>>>;
}

#[async_trait]
pub trait NotebookStore: Send + Sync {
    /// A human-readable name for logs (e.g. "postgres", "local").
    fn backend_name(&self) -> &'static str;

    async fn create_notebook(&self, owner: Option<Uuid>, input: NewNotebook)
        -> PortResult<Notebook>;

    /// Lists the owner's notebooks, most recently updated first.
    async fn list_notebooks(&self, owner: Option<Uuid>) -> PortResult<Vec<Notebook>>;

    async fn get_notebook(&self, owner: Option<Uuid>, id: &NotebookId) -> PortResult<Notebook>;

    async fn update_notebook(
        &self,
        owner: Option<Uuid>,
        id: &NotebookId,
        changes: NotebookUpdate,
    ) -> PortResult<Notebook>;

    async fn delete_notebook(&self, owner: Option<Uuid>, id: &NotebookId) -> PortResult<()>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn load_history(&self, user_id: Uuid) -> PortResult<Vec<HistoryItem>>;

    async fn save_history(&self, user_id: Uuid, items: &[HistoryItem]) -> PortResult<()>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    // --- Auth Methods ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        metadata: &UserMetadata,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owning user id if the session exists and has not expired.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}
