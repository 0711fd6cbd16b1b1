//! User domain model.
//!
//! # Responsibility
//! - Define the canonical user record stored in the `users` table.
//! - Validate field constraints before any SQL mutation.
//!
//! # Invariants
//! - `id` is assigned by the store on insert and never changes afterwards.
//! - `age` is non-negative; the increment workflow only ever raises it.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable store-assigned identifier for a user row.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type UserId = i64;

/// Canonical user record as persisted in the store.
///
/// `name` and `email` are opaque to the increment workflow; only `age` is
/// ever mutated by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned row id.
    pub id: UserId,
    /// Display name. Must be non-empty.
    pub name: String,
    /// Contact address. Not unique; multiple users may share one.
    pub email: String,
    /// Age in years. Non-negative.
    pub age: i64,
}

/// Insert shape for a user before the store has assigned an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: i64,
}

impl NewUser {
    /// Creates an insert shape from caller-provided fields.
    ///
    /// Validation is deferred to `validate()`, which repositories call
    /// before persisting.
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: i64) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    /// Checks field constraints prior to persistence.
    ///
    /// # Errors
    /// - `EmptyName` when `name` is empty or whitespace-only.
    /// - `InvalidEmail` when `email` lacks an `@`.
    /// - `NegativeAge` when `age < 0`.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.name.trim().is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        if !self.email.contains('@') {
            return Err(UserValidationError::InvalidEmail {
                email: self.email.clone(),
            });
        }
        validate_age(self.age)
    }
}

/// Checks the age constraint shared by insert and update paths.
pub fn validate_age(age: i64) -> Result<(), UserValidationError> {
    if age < 0 {
        return Err(UserValidationError::NegativeAge { age });
    }
    Ok(())
}

/// Field-level constraint violation for user data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyName,
    InvalidEmail { email: String },
    NegativeAge { age: i64 },
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "user name must not be empty"),
            Self::InvalidEmail { email } => write!(f, "invalid email address `{email}`"),
            Self::NegativeAge { age } => write!(f, "user age must be non-negative, got {age}"),
        }
    }
}

impl Error for UserValidationError {}
