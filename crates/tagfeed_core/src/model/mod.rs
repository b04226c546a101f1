//! Domain model for tag groups, authors and ingested posts.
//!
//! # Responsibility
//! - Define the records shared by repositories, services and callers.
//! - Validate write models before they reach storage.
//!
//! # Invariants
//! - A post's `external_id` is unique across all tag groups.
//! - A post belongs to exactly one tag group and never moves.

pub mod post;
pub mod tag_group;
pub mod user;
