//! API users and token authentication.

use std::sync::Arc;

use autoparc_core::{User, UserId, UserRole};
use autoparc_storage::Storage;
use tracing::{debug, info};

use crate::error::{required_text, Result};

/// User administration.
#[derive(Clone)]
pub struct UserService {
    storage: Arc<dyn Storage>,
}

fn new_token() -> String {
    format!(
        "ap_{}{}",
        ulid::Ulid::new().to_string().to_lowercase(),
        ulid::Ulid::new().to_string().to_lowercase()
    )
}

impl UserService {
    /// Create a service over `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Create an active user with a fresh API token. The returned user is
    /// the only place the token is shown.
    pub async fn create(&self, name: &str, email: &str, role: UserRole) -> Result<User> {
        let user = User {
            id: UserId::new(),
            name: required_text(Some(name), "name")?,
            email: required_text(Some(email), "email")?,
            role,
            active: true,
            api_token: new_token(),
            created_at: chrono::Utc::now(),
        };
        self.storage.save_user(&user).await?;
        info!("Created user {} ({})", user.id, user.role.as_str());
        Ok(user)
    }

    /// All users, tokens redacted.
    pub async fn list(&self) -> Result<Vec<User>> {
        let users = self.storage.list_users().await?;
        Ok(users.iter().map(User::without_token).collect())
    }

    /// Active user owning `token`, if any.
    pub async fn authenticate(&self, token: &str) -> Result<Option<User>> {
        if token.is_empty() {
            return Ok(None);
        }
        let user = self.storage.find_user_by_token(token).await?;
        match user {
            Some(user) if user.active => Ok(Some(user)),
            Some(user) => {
                debug!("Rejected token of inactive user {}", user.id);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
