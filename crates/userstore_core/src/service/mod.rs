//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own the transactional age-increment workflow.

pub mod user_service;
