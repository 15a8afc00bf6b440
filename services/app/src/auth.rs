//! services/app/src/auth.rs
//!
//! Email/password accounts: sign-up, sign-in, sign-out and the current user.
//! Accounts live in the `AccountStore`; the active session token is kept in the
//! local store so that it survives between invocations of the CLI.

use crate::adapters::local_store::{LocalStore, SESSION_KEY};
use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use dream_path_core::ports::{AccountStore, PortError};
use dream_path_core::{User, UserMetadata};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const SESSION_LIFETIME_DAYS: i64 = 30;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            AppError::Internal("Failed to hash password".to_string())
        })
}

pub fn verify_password(password: &str, hashed: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hashed).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        AppError::Internal("Authentication error".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Auth(format!("'{}' is not a valid email address", email)));
    }
    Ok(email)
}

pub struct AuthManager {
    accounts: Arc<dyn AccountStore>,
    sessions: Arc<LocalStore>,
}

impl AuthManager {
    pub fn new(accounts: Arc<dyn AccountStore>, sessions: Arc<LocalStore>) -> Self {
        Self { accounts, sessions }
    }

    /// Creates an account and signs it in.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> AppResult<User> {
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(AppError::Auth("A password is required".to_string()));
        }

        let password_hash = hash_password(password)?;
        let metadata = UserMetadata {
            full_name: full_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            ..Default::default()
        };
        let user = self
            .accounts
            .create_user_with_email(&email, &password_hash, &metadata)
            .await?;

        self.start_session(user.id).await?;
        info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<User> {
        let email = normalize_email(email)?;
        let credentials = match self.accounts.get_user_by_email(&email).await {
            Ok(credentials) => credentials,
            Err(PortError::NotFound(_)) => {
                return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        if !verify_password(password, &credentials.hashed_password)? {
            return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
        }

        self.start_session(credentials.user_id).await?;
        let user = self.accounts.get_user(credentials.user_id).await?;
        info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    /// Ends the session. The local token is always cleared, even if the backend
    /// could not be reached.
    pub async fn sign_out(&self) -> AppResult<()> {
        if let Some(token) = self.sessions.get::<String>(SESSION_KEY).await? {
            if let Err(e) = self.accounts.delete_auth_session(&token).await {
                error!("Error signing out: {}", e);
            }
        }
        self.sessions.remove(SESSION_KEY).await?;
        Ok(())
    }

    /// Resolves the stored token to a user. Expired or unknown tokens are dropped.
    pub async fn current_user(&self) -> Option<User> {
        let token = match self.sessions.get::<String>(SESSION_KEY).await {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                error!("Failed to read the session token: {}", e);
                return None;
            }
        };

        let user_id = match self.accounts.validate_auth_session(&token).await {
            Ok(user_id) => user_id,
            Err(PortError::Unauthorized) => {
                warn!("Stored session has expired; signing out");
                if let Err(e) = self.sessions.remove(SESSION_KEY).await {
                    error!("Failed to clear the session token: {}", e);
                }
                return None;
            }
            Err(e) => {
                error!("Failed to validate session: {}", e);
                return None;
            }
        };

        match self.accounts.get_user(user_id).await {
            Ok(user) => Some(user),
            Err(e) => {
                error!("Failed to load user {}: {}", user_id, e);
                None
            }
        }
    }

    async fn start_session(&self, user_id: Uuid) -> AppResult<()> {
        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::days(SESSION_LIFETIME_DAYS);
        self.accounts
            .create_auth_session(&token, user_id, expires_at)
            .await?;
        self.sessions.set(SESSION_KEY, &token).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use dream_path_core::ports::PortResult;
    use dream_path_core::UserCredentials;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemoryAccounts {
        users: Mutex<Vec<(UserCredentials, UserMetadata)>>,
        sessions: Mutex<HashMap<String, (Uuid, DateTime<Utc>)>>,
    }

    #[async_trait]
    impl AccountStore for MemoryAccounts {
        async fn create_user_with_email(
            &self,
            email: &str,
            hashed_password: &str,
            metadata: &UserMetadata,
        ) -> PortResult<User> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|(c, _)| c.email == email) {
                return Err(PortError::Unexpected("duplicate".into()));
            }
            let credentials = UserCredentials {
                user_id: Uuid::new_v4(),
                email: email.to_string(),
                hashed_password: hashed_password.to_string(),
            };
            let user = User::from_identity(credentials.user_id, Some(email), metadata);
            users.push((credentials, metadata.clone()));
            Ok(user)
        }

        async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|(c, _)| c.email == email)
                .map(|(c, _)| c.clone())
                .ok_or_else(|| PortError::NotFound(email.to_string()))
        }

        async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|(c, _)| c.user_id == user_id)
                .map(|(c, m)| User::from_identity(c.user_id, Some(&c.email), m))
                .ok_or_else(|| PortError::NotFound(user_id.to_string()))
        }

        async fn create_auth_session(
            &self,
            session_id: &str,
            user_id: Uuid,
            expires_at: DateTime<Utc>,
        ) -> PortResult<()> {
            self.sessions
                .lock()
                .unwrap()
                .insert(session_id.to_string(), (user_id, expires_at));
            Ok(())
        }

        async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
            match self.sessions.lock().unwrap().get(session_id) {
                Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
                _ => Err(PortError::Unauthorized),
            }
        }

        async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
            self.sessions.lock().unwrap().remove(session_id);
            Ok(())
        }
    }

    fn manager() -> (TempDir, Arc<MemoryAccounts>, AuthManager) {
        let dir = TempDir::new().unwrap();
        let accounts = Arc::new(MemoryAccounts::default());
        let sessions = Arc::new(LocalStore::new(dir.path()));
        let manager = AuthManager::new(accounts.clone(), sessions);
        (dir, accounts, manager)
    }

    #[test]
    fn password_hashes_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[tokio::test]
    async fn sign_up_signs_in_with_full_name() {
        let (_dir, _accounts, auth) = manager();
        let user = auth
            .sign_up(" Ada@Example.com ", "pw", Some("Ada Lovelace"))
            .await
            .unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(auth.current_user().await, Some(user));
    }

    #[tokio::test]
    async fn sign_in_checks_the_password() {
        let (_dir, _accounts, auth) = manager();
        auth.sign_up("grace@example.com", "pw", None).await.unwrap();
        auth.sign_out().await.unwrap();
        assert_eq!(auth.current_user().await, None);

        let err = auth.sign_in("grace@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
        let err = auth.sign_in("nobody@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));

        let user = auth.sign_in("grace@example.com", "pw").await.unwrap();
        assert_eq!(user.name, "grace");
        assert_eq!(auth.current_user().await.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn expired_sessions_are_dropped() {
        let (_dir, accounts, auth) = manager();
        auth.sign_up("lin@example.com", "pw", None).await.unwrap();
        for (_, expires_at) in accounts.sessions.lock().unwrap().values_mut() {
            *expires_at = Utc::now() - Duration::days(1);
        }
        assert_eq!(auth.current_user().await, None);
        assert_eq!(auth.sessions.get::<String>(SESSION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let (_dir, _accounts, auth) = manager();
        assert!(matches!(
            auth.sign_up("not-an-email", "pw", None).await,
            Err(AppError::Auth(_))
        ));
    }
}
