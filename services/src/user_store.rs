//! In-process user store collaborator.
//!
//! The wider product persists users in Postgres; this crate only carries
//! the contract the core depends on: an idempotent upsert keyed by email.
//! Swapping in a real database implementation does not change callers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Profile data captured at sign-in.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub username: String,
}

/// Stored user record.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Idempotent user table keyed by email.
#[derive(Default)]
pub struct UserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the user unless a record with the same email already exists.
    ///
    /// Calling this repeatedly with the same email is a no-op; the first
    /// record wins.
    pub async fn create_user_if_absent(&self, user: NewUser) {
        let mut users = self.users.write().await;
        users.entry(user.email.clone()).or_insert_with(|| UserRecord {
            name: user.name,
            email: user.email,
            image: user.image,
            username: user.username,
            created_at: Utc::now(),
        });
    }

    /// Looks up a user by email.
    pub async fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        self.users.read().await.get(email).cloned()
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str, name: &str) -> NewUser {
        NewUser {
            name: name.into(),
            email: email.into(),
            image: None,
            username: name.to_ascii_lowercase(),
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_by_email() {
        let store = UserStore::new();

        store.create_user_if_absent(user("a@example.com", "First")).await;
        store.create_user_if_absent(user("a@example.com", "Second")).await;

        assert_eq!(store.len().await, 1);
        let record = store.find_by_email("a@example.com").await.unwrap();
        assert_eq!(record.name, "First");
    }

    #[tokio::test]
    async fn distinct_emails_create_distinct_records() {
        let store = UserStore::new();

        store.create_user_if_absent(user("a@example.com", "A")).await;
        store.create_user_if_absent(user("b@example.com", "B")).await;

        assert_eq!(store.len().await, 2);
    }
}
