//! Auth Gate: session token → live user, and the admin role check

use std::sync::Arc;
use tracing::{error, warn};

use crate::{
    error::{ServiceError, ServiceResult},
    identity::{User, UserId, UserStore},
    session::SessionStore,
};

/// Resolves session tokens to users and enforces the admin role
#[derive(Clone)]
pub struct AuthGate {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
}

impl AuthGate {
    pub fn new(sessions: Arc<dyn SessionStore>, users: Arc<dyn UserStore>) -> Self {
        Self { sessions, users }
    }

    /// Resolve a token to the live user it is bound to.
    ///
    /// Missing tokens, unknown tokens and sessions whose user no longer
    /// exists all fail with `Unauthenticated`.
    pub async fn resolve(&self, token: Option<&str>) -> ServiceResult<User> {
        let token = token.ok_or(ServiceError::Unauthenticated)?;

        let user_id = self
            .sessions
            .load(token)
            .await
            .map_err(|e| {
                error!("Failed to load session: {}", e);
                ServiceError::from(e)
            })?
            .ok_or(ServiceError::Unauthenticated)?;

        match self.users.find_by_id(user_id).await? {
            Some(user) => Ok(user),
            None => {
                warn!("Session refers to missing user {}", user_id);
                Err(ServiceError::Unauthenticated)
            }
        }
    }

    /// `authenticate(sessionToken) → UserID`
    pub async fn authenticate(&self, token: Option<&str>) -> ServiceResult<UserId> {
        self.resolve(token).await.map(|user| user.id)
    }

    /// Re-fetch the actor and require the admin flag.
    ///
    /// An actor that vanished since authentication is treated as not an admin.
    pub async fn require_admin(&self, actor: UserId) -> ServiceResult<User> {
        match self.users.find_by_id(actor).await? {
            Some(user) if user.is_admin => Ok(user),
            _ => {
                warn!("Rejected admin-only operation for user {}", actor);
                Err(ServiceError::Forbidden)
            }
        }
    }
}
