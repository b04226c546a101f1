//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate repositories and the search API into ingestion, feed and
//!   administration use-cases.
//! - Stay storage-agnostic: every service is generic over its seams.

pub mod feed_service;
pub mod ingest_service;
pub mod tag_group_service;
