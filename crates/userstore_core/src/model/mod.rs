//! Domain model for the user store.
//!
//! # Responsibility
//! - Define the canonical user record and its insert shape.
//! - Own field-level validation rules enforced before persistence.
//!
//! # Invariants
//! - Every persisted user is identified by a store-assigned `UserId`.
//! - `age` is never negative in a validated record.

pub mod user;
