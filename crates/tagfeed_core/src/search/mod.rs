//! Search API seam: query construction and candidate fetching.
//!
//! # Responsibility
//! - Turn tag groups into per-term search queries.
//! - Execute queries against the external search API with a timeout.
//!
//! # Invariants
//! - Fetch failures surface as [`FetchError`] and are owned by the query
//!   that produced them.

pub mod client;
pub mod query;

pub use client::{
    FetchError, FetchResult, HttpSearchClient, RawPost, SearchApi, SearchClientConfig,
};
pub use query::{build_queries, build_queries_for_group, QueryOptions, SearchQuery};
