//! Link metadata collaborator.
//!
//! # Responsibility
//! - Unwrap shortened links and fetch page titles for display.
//!
//! # Invariants
//! - Resolution never fails: every error falls back to the original url.
//! - Ingestion does not depend on this module.

pub mod resolver;

pub use resolver::{extract_title, HttpLinkResolver, LinkInfo, LinkResolver};
