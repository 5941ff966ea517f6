use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::storage::{KeyValueStore, StorageError, USER_KEY, load_json, store_json};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_USERNAME_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    fn mock(email: &str, username: Option<&str>) -> Self {
        let local_part = email.split('@').next().unwrap_or(email);
        let username = username
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(local_part);
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            avatar: Some(format!("https://i.pravatar.cc/150?u={email}")),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid email address {0:?}")]
    InvalidEmail(String),
    #[error("Password must not be empty")]
    MissingPassword,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Username must be at least 3 characters")]
    UsernameTooShort,
    #[error("Failed to persist session: {0}")]
    Storage(#[from] StorageError),
}

/// The signed-in user, mirrored into the key-value store. Login and signup
/// are mocked: they wait for `delay` and always succeed for well-formed input.
pub struct AuthSession<S: ?Sized> {
    store: Arc<S>,
    user: Option<User>,
    delay: Duration,
}

impl<S: KeyValueStore + ?Sized> AuthSession<S> {
    /// Picks up a user saved by an earlier run.
    pub fn restore(store: Arc<S>, delay: Duration) -> Result<Self, AuthError> {
        let user = match load_json::<User, _>(store.as_ref(), USER_KEY) {
            Ok(user) => user,
            Err(StorageError::Json(err)) => {
                tracing::warn!("Discarding unreadable saved user: {err}");
                None
            }
            Err(err) => return Err(err.into()),
        };
        if let Some(user) = &user {
            tracing::info!("Restored session for {}", user.username);
        }
        Ok(Self { store, user, delay })
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&User, AuthError> {
        validate(email, password)?;
        tokio::time::sleep(self.delay).await;
        self.sign_in(User::mock(email.trim(), None))
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn signup(
        &mut self,
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> Result<&User, AuthError> {
        validate(email, password)?;
        validate_username(username)?;
        tokio::time::sleep(self.delay).await;
        self.sign_in(User::mock(email.trim(), username))
    }

    pub fn logout(&mut self) -> Result<(), AuthError> {
        if let Some(user) = self.user.take() {
            tracing::info!("Signed out {}", user.username);
        }
        self.store.remove(USER_KEY)?;
        Ok(())
    }

    fn sign_in(&mut self, user: User) -> Result<&User, AuthError> {
        store_json(self.store.as_ref(), USER_KEY, &user)?;
        tracing::info!("Signed in as {}", user.username);
        Ok(self.user.insert(user))
    }
}

fn validate(email: &str, password: &str) -> Result<(), AuthError> {
    let email = email.trim();
    let well_formed = !email.contains(char::is_whitespace)
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && domain
                    .char_indices()
                    .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
        });
    if !well_formed {
        return Err(AuthError::InvalidEmail(email.to_string()));
    }
    if password.is_empty() {
        return Err(AuthError::MissingPassword);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }
    Ok(())
}

/// A blank username falls back to the email's local part; any other must be
/// long enough.
fn validate_username(username: Option<&str>) -> Result<(), AuthError> {
    match username.map(str::trim) {
        Some(name) if !name.is_empty() && name.chars().count() < MIN_USERNAME_LEN => {
            Err(AuthError::UsernameTooShort)
        }
        _ => Ok(()),
    }
}
