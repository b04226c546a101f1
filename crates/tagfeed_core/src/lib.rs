//! Core of tagfeed: tag-group post aggregation with global deduplication.
//!
//! Posts surfaced by per-tag search queries are stored once, under the first
//! tag group that matched them, and served back newest-first in pages.

pub mod config;
pub mod db;
pub mod link;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{ConfigError, FeedConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::post::{NewPost, Post, PostId, PostValidationError};
pub use model::tag_group::{Tag, TagGroup, TagGroupId, TagGroupValidationError};
pub use model::user::{User, UserId};
pub use repo::post_repo::{InsertOutcome, PostListQuery, PostRepository, SqlitePostRepository};
pub use repo::tag_group_repo::{SqliteTagGroupRepository, TagGroupRepository};
pub use repo::user_repo::{SqliteUserDirectory, UserDirectory};
pub use repo::{RepoError, RepoResult};
pub use search::{
    build_queries, build_queries_for_group, FetchError, FetchResult, HttpSearchClient,
    QueryOptions, RawPost, SearchApi, SearchClientConfig, SearchQuery,
};
pub use service::feed_service::{FeedPage, FeedService, DEFAULT_FEED_PAGE_SIZE};
pub use service::ingest_service::{
    CycleFailure, CycleReport, FailureStage, IngestOutcome, IngestService, SkipReason,
};
pub use service::tag_group_service::{TagGroupService, TagGroupServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
