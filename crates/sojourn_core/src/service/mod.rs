//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own input validation (titles, ratings, periods, timezones) so
//!   repositories can assume well-formed writes.
//! - Keep UI layers decoupled from storage details.

pub mod account_service;
pub mod goal_service;
pub mod note_service;
pub mod performance_service;
pub mod retro_service;
pub mod task_service;
pub mod timeline_service;
