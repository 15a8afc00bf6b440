//! services/app/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `NotebookStore` and `AccountStore` ports from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dream_path_core::ports::{AccountStore, NotebookStore, PortError, PortResult};
use dream_path_core::{
    NewNotebook, Notebook, NotebookId, NotebookUpdate, User, UserCredentials, UserMetadata,
};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Notebook rows are always scoped to a signed-in owner.
fn require_owner(owner: Option<Uuid>) -> PortResult<Uuid> {
    owner.ok_or(PortError::Unauthorized)
}

/// Local ids (and anything else that is not a UUID) can never exist in the database.
fn parse_notebook_id(id: &NotebookId) -> PortResult<Uuid> {
    Uuid::parse_str(id.as_str())
        .map_err(|_| PortError::NotFound(format!("Notebook {} not found", id)))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct NotebookRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    content: String,
    file_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl NotebookRecord {
    fn to_domain(self) -> Notebook {
        Notebook {
            id: NotebookId::from(self.id),
            owner_id: self.user_id.to_string(),
            title: self.title,
            content: self.content,
            file_name: self.file_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    metadata: Json<UserMetadata>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User::from_identity(self.id, Some(&self.email), &self.metadata.0)
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.id,
            email: self.email,
            hashed_password: self.password_hash,
        }
    }
}

const NOTEBOOK_COLUMNS: &str = "id, user_id, title, content, file_name, created_at, updated_at";

//=========================================================================================
// `NotebookStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl NotebookStore for DbAdapter {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn create_notebook(
        &self,
        owner: Option<Uuid>,
        input: NewNotebook,
    ) -> PortResult<Notebook> {
        let user_id = require_owner(owner)?;
        let record = sqlx::query_as::<_, NotebookRecord>(&format!(
            "INSERT INTO notebooks (id, user_id, title, content, file_name) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {NOTEBOOK_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.file_name)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_notebooks(&self, owner: Option<Uuid>) -> PortResult<Vec<Notebook>> {
        let Some(user_id) = owner else {
            return Ok(Vec::new());
        };
        let records = sqlx::query_as::<_, NotebookRecord>(&format!(
            "SELECT {NOTEBOOK_COLUMNS} FROM notebooks WHERE user_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let notebooks = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(notebooks)
    }

    async fn get_notebook(&self, owner: Option<Uuid>, id: &NotebookId) -> PortResult<Notebook> {
        let user_id = require_owner(owner)?;
        let notebook_id = parse_notebook_id(id)?;
        let record = sqlx::query_as::<_, NotebookRecord>(&format!(
            "SELECT {NOTEBOOK_COLUMNS} FROM notebooks WHERE id = $1 AND user_id = $2"
        ))
        .bind(notebook_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Notebook {} not found", id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn update_notebook(
        &self,
        owner: Option<Uuid>,
        id: &NotebookId,
        changes: NotebookUpdate,
    ) -> PortResult<Notebook> {
        let user_id = require_owner(owner)?;
        let notebook_id = parse_notebook_id(id)?;
        let record = sqlx::query_as::<_, NotebookRecord>(&format!(
            "UPDATE notebooks SET \
                 title = COALESCE($3, title), \
                 content = COALESCE($4, content), \
                 file_name = COALESCE($5, file_name), \
                 updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING {NOTEBOOK_COLUMNS}"
        ))
        .bind(notebook_id)
        .bind(user_id)
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(&changes.file_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Notebook {} not found", id)))?;
        Ok(record.to_domain())
    }

    async fn delete_notebook(&self, owner: Option<Uuid>, id: &NotebookId) -> PortResult<()> {
        let user_id = require_owner(owner)?;
        let notebook_id = parse_notebook_id(id)?;
        let result = sqlx::query("DELETE FROM notebooks WHERE id = $1 AND user_id = $2")
            .bind(notebook_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Notebook {} not found", id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `AccountStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AccountStore for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        metadata: &UserMetadata,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, email, password_hash, metadata) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, metadata",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .bind(Json(metadata))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Unexpected(format!("An account for {} already exists", email))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, metadata FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_ids_never_reach_the_database() {
        let err = parse_notebook_id(&NotebookId::from("local_1700000000000_ab12cd34")).unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));

        let id = Uuid::new_v4();
        assert_eq!(parse_notebook_id(&NotebookId::from(id)).unwrap(), id);
    }

    #[test]
    fn notebook_writes_need_an_owner() {
        assert_eq!(require_owner(None), Err(PortError::Unauthorized));
    }

    #[test]
    fn user_records_use_the_display_name_chain() {
        let record = UserRecord {
            id: Uuid::nil(),
            email: "lin@example.com".into(),
            metadata: Json(UserMetadata::default()),
        };
        assert_eq!(record.to_domain().name, "lin");
    }
}
