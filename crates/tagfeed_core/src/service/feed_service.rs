//! Feed retrieval, pagination and counting per tag group.
//!
//! # Invariants
//! - Pages are 1-indexed; `None` and `0` both mean the first page.
//! - Order is newest `created_at` first, insertion order among ties.
//! - A page past the end is empty, not an error.

use crate::model::post::Post;
use crate::model::tag_group::TagGroupId;
use crate::repo::post_repo::{PostListQuery, PostRepository};
use crate::repo::RepoResult;

/// Page size used by the reference feed view.
pub const DEFAULT_FEED_PAGE_SIZE: u32 = 4;
pub const FEED_PAGE_SIZE_MAX: u32 = 50;

/// One page of a group's feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPage {
    pub items: Vec<Post>,
    /// Effective 1-indexed page number.
    pub page: u32,
    pub page_size: u32,
}

/// Read-side facade over the post store.
pub struct FeedService<P: PostRepository> {
    posts: P,
    page_size: u32,
}

impl<P: PostRepository> FeedService<P> {
    /// Creates a feed with the reference page size.
    pub fn new(posts: P) -> Self {
        Self::with_page_size(posts, DEFAULT_FEED_PAGE_SIZE)
    }

    /// Creates a feed with a custom page size (`0` falls back to the
    /// default, values above [`FEED_PAGE_SIZE_MAX`] are capped).
    pub fn with_page_size(posts: P, page_size: u32) -> Self {
        Self {
            posts,
            page_size: normalize_page_size(page_size),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns one page of `tag_group_id`'s posts.
    pub fn list_posts(&self, tag_group_id: TagGroupId, page: Option<u32>) -> RepoResult<FeedPage> {
        let page = normalize_page(page);
        let query = PostListQuery {
            tag_group_id,
            limit: self.page_size,
            offset: u64::from(page - 1) * u64::from(self.page_size),
        };
        let items = self.posts.list_posts(&query)?;
        Ok(FeedPage {
            items,
            page,
            page_size: self.page_size,
        })
    }

    /// Returns the group's newest post, the lower bound for its next queries.
    pub fn most_recent_post(&self, tag_group_id: TagGroupId) -> RepoResult<Option<Post>> {
        self.posts.most_recent_post(tag_group_id)
    }

    pub fn count_posts(&self, tag_group_id: TagGroupId) -> RepoResult<u64> {
        self.posts.count_posts(tag_group_id)
    }

    /// Number of pages needed to show every post of the group.
    pub fn page_count(&self, tag_group_id: TagGroupId) -> RepoResult<u64> {
        let total = self.posts.count_posts(tag_group_id)?;
        Ok(total.div_ceil(u64::from(self.page_size)))
    }
}

/// Maps an optional 1-indexed page to an effective page number.
pub fn normalize_page(page: Option<u32>) -> u32 {
    match page {
        None | Some(0) => 1,
        Some(value) => value,
    }
}

/// Clamps a configured page size into `1..=FEED_PAGE_SIZE_MAX`.
pub fn normalize_page_size(page_size: u32) -> u32 {
    match page_size {
        0 => DEFAULT_FEED_PAGE_SIZE,
        value if value > FEED_PAGE_SIZE_MAX => FEED_PAGE_SIZE_MAX,
        value => value,
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_page, normalize_page_size, DEFAULT_FEED_PAGE_SIZE};

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(normalize_page(None), 1);
        assert_eq!(normalize_page(Some(0)), 1);
        assert_eq!(normalize_page(Some(3)), 3);
    }

    #[test]
    fn page_size_defaults_and_caps() {
        assert_eq!(normalize_page_size(0), DEFAULT_FEED_PAGE_SIZE);
        assert_eq!(normalize_page_size(500), 50);
        assert_eq!(normalize_page_size(10), 10);
    }
}
