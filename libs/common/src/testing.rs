//! In-memory stores for tests
//!
//! Enable with `common = { features = ["testing"] }` in dev-dependencies.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{
    error::{DatabaseError, DatabaseResult},
    identity::{NewUser, User, UserId, UserStore},
    session::SessionStore,
};

/// Users kept in a map, with the same unique-username rule as the table
#[derive(Default, Clone)]
pub struct MemoryUserStore {
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl MemoryUserStore {
    /// Seed a user directly; the only way to get an admin.
    pub fn insert(&self, username: &str, is_admin: bool) -> User {
        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            password_hash: String::new(),
            is_admin,
            created_at: Utc::now(),
        };
        self.lock().insert(user.id, user.clone());
        user
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, User>> {
        self.users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> DatabaseResult<Option<User>> {
        Ok(self.lock().get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        Ok(self
            .lock()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut users = self.lock();
        if users.values().any(|u| u.username == new_user.username) {
            return Err(DatabaseError::UniqueViolation(
                "users_username_key".to_string(),
            ));
        }

        let user = User {
            id: UserId::new(),
            username: new_user.username.clone(),
            password_hash: new_user.password_hash.clone(),
            is_admin: false,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn ensure(&self, new_user: &NewUser) -> DatabaseResult<User> {
        if let Some(existing) = self.find_by_username(&new_user.username).await? {
            return Ok(existing);
        }
        self.create(new_user).await
    }
}

/// Sessions kept in a map, never expiring
#[derive(Default, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<String, UserId>>>,
}

impl MemorySessionStore {
    pub fn contains(&self, token: &str) -> bool {
        self.lock().contains_key(token)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, UserId>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token: &str) -> DatabaseResult<Option<UserId>> {
        Ok(self.lock().get(token).copied())
    }

    async fn save(&self, token: &str, user_id: UserId) -> DatabaseResult<()> {
        self.lock().insert(token.to_string(), user_id);
        Ok(())
    }

    async fn clear(&self, token: &str) -> DatabaseResult<()> {
        self.lock().remove(token);
        Ok(())
    }
}
