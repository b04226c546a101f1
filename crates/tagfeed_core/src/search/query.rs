//! Query builder for tag groups.
//!
//! # Invariants
//! - One query per tag, in tag order; a group without tags yields none.
//! - Every query of a group shares the same lower bound: the external id of
//!   the group's most recent stored post, or none for an empty group.

use crate::model::tag_group::TagGroup;
use crate::repo::post_repo::PostRepository;
use crate::repo::RepoResult;
use serde::{Deserialize, Serialize};

/// One search request against the external API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub term: String,
    /// Result language filter, e.g. `pt`.
    pub language: String,
    pub page_size: u32,
    /// Only results newer than this external id.
    pub since_id: Option<String>,
}

/// Fixed parameters applied to every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub language: String,
    pub page_size: u32,
}

/// Builds the queries for `group` given an already resolved lower bound.
pub fn build_queries(
    group: &TagGroup,
    since_id: Option<&str>,
    options: &QueryOptions,
) -> Vec<SearchQuery> {
    group
        .terms()
        .map(|term| SearchQuery {
            term: term.to_string(),
            language: options.language.clone(),
            page_size: options.page_size,
            since_id: since_id.map(str::to_string),
        })
        .collect()
}

/// Builds the queries for `group`, looking up its most recent post.
///
/// Read-only; the store is not consulted for groups without tags.
pub fn build_queries_for_group<P: PostRepository + ?Sized>(
    posts: &P,
    group: &TagGroup,
    options: &QueryOptions,
) -> RepoResult<Vec<SearchQuery>> {
    if !group.has_tags() {
        return Ok(Vec::new());
    }
    let latest = posts.most_recent_post(group.id)?;
    Ok(build_queries(
        group,
        latest.as_ref().map(|post| post.external_id.as_str()),
        options,
    ))
}
