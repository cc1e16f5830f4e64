//! Credential flows: signup, login, guest login, logout, current user

use std::sync::Arc;

use common::{
    error::{ServiceError, ServiceResult},
    gate::AuthGate,
    identity::{NewUser, PublicUser, User, UserId, UserStore, normalize_username},
    password::{hash_password, verify_password},
    session::{SessionStore, generate_token},
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::validation::{validate_password, validate_username};

/// Reserved account shared by every guest session
pub const GUEST_USERNAME: &str = "guest";

/// Stored as the guest's password hash. Not a PHC string, so no password
/// ever verifies against it.
const GUEST_CREDENTIAL: &str = "!guest-login-only";

/// Username/password pair as submitted by a client
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    fn normalized(&self) -> (String, &str) {
        (normalize_username(&self.username), self.password.trim())
    }
}

/// Account operations over the identity and session stores
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    gate: AuthGate,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, sessions: Arc<dyn SessionStore>) -> Self {
        let gate = AuthGate::new(sessions.clone(), users.clone());
        Self {
            users,
            sessions,
            gate,
        }
    }

    /// Register a new user and return its public fields
    pub async fn signup(&self, credentials: &Credentials) -> ServiceResult<PublicUser> {
        let (username, password) = credentials.normalized();
        info!("Signup attempt for user: {}", username);

        validate_username(&username).map_err(ServiceError::Validation)?;
        validate_password(password).map_err(ServiceError::Validation)?;

        if username == GUEST_USERNAME || self.users.find_by_username(&username).await?.is_some() {
            warn!("Signup rejected, username '{}' already taken", username);
            return Err(ServiceError::Conflict("Username already taken".to_string()));
        }

        let password_hash = hash_password(password).map_err(|e| {
            error!("Failed to hash password for {}: {}", username, e);
            ServiceError::Validation("Password could not be processed".to_string())
        })?;

        // A concurrent signup can still win the race; the unique index
        // turns that into a Conflict.
        let user = self
            .users
            .create(&NewUser {
                username,
                password_hash,
            })
            .await
            .map_err(|e| match ServiceError::from(e) {
                ServiceError::Conflict(_) => {
                    ServiceError::Conflict("Username already taken".to_string())
                }
                other => other,
            })?;

        info!("User '{}' created with ID {}", user.username, user.id);
        Ok(PublicUser::from(&user))
    }

    /// Verify credentials and open a session; returns the session token
    pub async fn login(&self, credentials: &Credentials) -> ServiceResult<String> {
        let (username, password) = credentials.normalized();

        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let user = match self.users.find_by_username(&username).await? {
            Some(user) if verify_password(&user.password_hash, password) => user,
            _ => {
                warn!("Login failed for user '{}'", username);
                return Err(ServiceError::Unauthenticated);
            }
        };

        let token = self.open_session(user.id).await?;
        info!("User '{}' logged in", user.username);
        Ok(token)
    }

    /// Make sure the guest account exists, then open a session for it
    pub async fn guest_login(&self) -> ServiceResult<String> {
        let guest = self
            .users
            .ensure(&NewUser {
                username: GUEST_USERNAME.to_string(),
                password_hash: GUEST_CREDENTIAL.to_string(),
            })
            .await?;

        let token = self.open_session(guest.id).await?;
        info!("Guest session opened for user {}", guest.id);
        Ok(token)
    }

    /// Drop the session bound to `token`, if any
    pub async fn logout(&self, token: Option<&str>) -> ServiceResult<()> {
        if let Some(token) = token {
            self.sessions.clear(token).await?;
        }
        info!("User logged out");
        Ok(())
    }

    /// The live user behind `token`
    pub async fn current_user(&self, token: Option<&str>) -> ServiceResult<User> {
        self.gate.resolve(token).await
    }

    async fn open_session(&self, user_id: UserId) -> ServiceResult<String> {
        let token = generate_token();
        self.sessions.save(&token, user_id).await.map_err(|e| {
            error!("Failed to save session for user {}: {}", user_id, e);
            ServiceError::from(e)
        })?;
        Ok(token)
    }
}
