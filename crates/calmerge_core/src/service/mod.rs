//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers (CLI, tests) decoupled from storage details.

pub mod event_service;
pub mod user_service;
