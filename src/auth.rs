use crate::errors::ApiError;
use crate::types::DocumentId;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Publisher,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "publisher" => Some(Role::Publisher),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Publisher => "publisher",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated identity attached to a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: DocumentId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Role gate: passes iff the identity's role is in the allowed set.
pub fn authorize(user: &AuthUser, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "user role {} is not authorized to access this route",
            user.role
        )))
    }
}

/// The single ownership-or-role predicate: the requester owns the resource
/// or holds the admin role. Handlers call this instead of re-implementing
/// the policy.
#[must_use]
pub fn owns_or_elevated(user: &AuthUser, owner: Option<&str>) -> bool {
    if user.role == Role::Admin {
        return true;
    }
    owner.is_some_and(|o| o == user.id.to_string())
}

/// Guard form of [`owns_or_elevated`] for use with `?`.
pub fn require_ownership(user: &AuthUser, owner: Option<&str>, what: &str) -> Result<(), ApiError> {
    if owns_or_elevated(user, owner) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!("not authorized to modify this {what}")))
    }
}

/// Opaque bearer tokens mapped to user ids. Tokens live for the process
/// lifetime; anything richer is out of scope.
#[derive(Default)]
pub struct Sessions {
    tokens: RwLock<HashMap<String, DocumentId>>,
}

impl Sessions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh token for the user and returns it.
    pub fn issue(&self, user: DocumentId) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.tokens.write().insert(token.clone(), user);
        token
    }

    pub fn resolve(&self, token: &str) -> Option<DocumentId> {
        self.tokens.read().get(token).copied()
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.write().remove(token).is_some()
    }
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::BadRequest(format!("could not hash password: {e}")))
}

#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else { return false };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}
