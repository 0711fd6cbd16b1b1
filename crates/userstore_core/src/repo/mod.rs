//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data-access contract consumed by the increment workflow.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must validate user data before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod user_repo;
