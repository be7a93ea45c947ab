//! The demo account directory.
//!
//! This is deliberately demo-grade: accounts live in the shared state
//! store and passwords are compared in the clear. It exists so that
//! the per-user stores have a real user identity to key on, not to be
//! a credential system.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use study_assistant_store::{StateStore, StoreError};
use thiserror::Error;
use uuid::Uuid;

const USERS_KEY: &str = "library_users";

/// Errors from the account directory.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Sign-up was attempted with an email that is already registered.
    #[error("an account with this email already exists")]
    EmailTaken,
    /// The email/password pair did not match any account.
    #[error("invalid email or password")]
    InvalidCredentials,
    /// The directory blob could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A signed-in user, with no credential material attached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// The unique identifier of this user.
    pub id: Uuid,
    /// The sign-in email address.
    pub email: String,
    /// The display name.
    pub name: String,
    /// The self-reported education level.
    pub education_level: String,
    /// The subjects the user studies.
    pub subjects: Vec<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// The input for creating an account.
#[derive(Clone, Debug)]
pub struct NewUser {
    /// The sign-in email address.
    pub email: String,
    /// The password, kept in the clear by the directory.
    pub password: String,
    /// The display name.
    pub name: String,
    /// The self-reported education level.
    pub education_level: String,
    /// The subjects the user studies.
    pub subjects: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: Uuid,
    email: String,
    password: String,
    name: String,
    education_level: String,
    subjects: Vec<String>,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            education_level: self.education_level.clone(),
            subjects: self.subjects.clone(),
            created_at: self.created_at,
        }
    }
}

/// The account directory, persisted as one blob in the state store.
pub struct UserDirectory {
    state: Arc<dyn StateStore>,
}

impl UserDirectory {
    /// Creates a directory over the given state store.
    #[inline]
    pub fn new(state: Arc<dyn StateStore>) -> Self {
        Self { state }
    }

    /// Registers a new account and returns its profile.
    pub fn sign_up(&self, new_user: NewUser) -> Result<UserProfile, AuthError> {
        let mut users = self.load_users()?;
        if users.iter().any(|user| user.email == new_user.email) {
            return Err(AuthError::EmailTaken);
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            email: new_user.email,
            password: new_user.password,
            name: new_user.name,
            education_level: new_user.education_level,
            subjects: new_user.subjects,
            created_at: Utc::now(),
        };
        let profile = record.profile();
        users.push(record);
        self.save_users(&users)?;
        Ok(profile)
    }

    /// Checks a credential pair and returns the matching profile.
    pub fn log_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, AuthError> {
        let users = self.load_users()?;
        users
            .iter()
            .find(|user| user.email == email && user.password == password)
            .map(UserRecord::profile)
            .ok_or(AuthError::InvalidCredentials)
    }

    fn load_users(&self) -> Result<Vec<UserRecord>, AuthError> {
        let users = match self.state.load(USERS_KEY)? {
            Some(blob) => {
                serde_json::from_str(&blob).map_err(StoreError::from)?
            }
            None => vec![],
        };
        Ok(users)
    }

    fn save_users(&self, users: &[UserRecord]) -> Result<(), AuthError> {
        let blob = serde_json::to_string(users).map_err(StoreError::from)?;
        self.state.save(USERS_KEY, &blob)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use study_assistant_store::MemoryStore;

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: "hunter2".to_string(),
            name: "Alex".to_string(),
            education_level: "GCSE".to_string(),
            subjects: vec!["Biology".to_string()],
        }
    }

    #[test]
    fn test_sign_up_then_log_in() {
        let directory = UserDirectory::new(Arc::new(MemoryStore::new()));
        let profile = directory.sign_up(new_user("alex@example.com")).unwrap();
        assert_eq!(profile.email, "alex@example.com");

        let logged_in =
            directory.log_in("alex@example.com", "hunter2").unwrap();
        assert_eq!(logged_in, profile);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let directory = UserDirectory::new(Arc::new(MemoryStore::new()));
        directory.sign_up(new_user("alex@example.com")).unwrap();
        assert!(matches!(
            directory.sign_up(new_user("alex@example.com")),
            Err(AuthError::EmailTaken)
        ));
    }

    #[test]
    fn test_wrong_credentials_rejected() {
        let directory = UserDirectory::new(Arc::new(MemoryStore::new()));
        directory.sign_up(new_user("alex@example.com")).unwrap();
        assert!(matches!(
            directory.log_in("alex@example.com", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            directory.log_in("nobody@example.com", "hunter2"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_profile_blob_has_no_password_field() {
        let directory = UserDirectory::new(Arc::new(MemoryStore::new()));
        let profile = directory.sign_up(new_user("alex@example.com")).unwrap();
        let value = serde_json::to_value(&profile).unwrap();
        assert!(value.as_object().unwrap().get("password").is_none());
    }
}
