//! Domain records persisted by the Sojournii core.
//!
//! # Responsibility
//! - Define canonical read models and status enums, one file per entity
//!   family.
//! - Keep rich-text fields as three mirrors (`plain`, `html`, `json`)
//!   shared through [`content::RichText`].
//!
//! # Invariants
//! - Every user-owned record carries its owner's `user_uuid`.
//! - Status enums serialize with stable snake_case names matching storage.

pub mod adoption;
pub mod content;
pub mod goal;
pub mod note;
pub mod performance;
pub mod retro;
pub mod task;
pub mod timeline;
pub mod user;
