//! Post store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Atomic create-if-absent keyed by the global `external_id`.
//! - Per-group recency listing, most-recent lookup and counting.
//!
//! # Invariants
//! - Existence checks are global, never scoped to a tag group.
//! - Listing order is `created_at DESC, id ASC`: newest first, earlier
//!   insertion first among equal timestamps.
//! - `most_recent_post` returns the first row of that same order.

use crate::model::post::{NewPost, Post, PostId};
use crate::model::tag_group::TagGroupId;
use crate::model::user::User;
use crate::repo::{ensure_schema, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const POST_SELECT_SQL: &str = "SELECT
    p.id AS id,
    p.external_id AS external_id,
    p.text AS text,
    p.tag_group_id AS tag_group_id,
    p.created_at AS created_at,
    u.id AS user_id,
    u.external_id AS user_external_id,
    u.image_url AS user_image_url
FROM posts p
INNER JOIN users u ON u.id = p.user_id";

const RECENCY_ORDER_SQL: &str = "ORDER BY p.created_at DESC, p.id ASC";

/// Outcome of a create-if-absent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(PostId),
    /// Another row already owns the external id.
    AlreadyExists,
}

/// Page window over one tag group's posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostListQuery {
    pub tag_group_id: TagGroupId,
    pub limit: u32,
    pub offset: u64,
}

/// Global post store.
pub trait PostRepository {
    /// Whether any group already stores `external_id`.
    fn post_exists(&self, external_id: &str) -> RepoResult<bool>;
    /// Inserts unless the external id is taken; never updates.
    fn insert_post_if_absent(&self, post: &NewPost) -> RepoResult<InsertOutcome>;
    fn find_post(&self, external_id: &str) -> RepoResult<Option<Post>>;
    fn list_posts(&self, query: &PostListQuery) -> RepoResult<Vec<Post>>;
    fn most_recent_post(&self, tag_group_id: TagGroupId) -> RepoResult<Option<Post>>;
    fn count_posts(&self, tag_group_id: TagGroupId) -> RepoResult<u64>;
}

/// SQLite-backed post store.
pub struct SqlitePostRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            "posts",
            &[
                "id",
                "external_id",
                "text",
                "user_id",
                "tag_group_id",
                "created_at",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn post_exists(&self, external_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE external_id = ?1);",
            [external_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn insert_post_if_absent(&self, post: &NewPost) -> RepoResult<InsertOutcome> {
        post.validate()?;

        let changed = self.conn.execute(
            "INSERT INTO posts (external_id, text, user_id, tag_group_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(external_id) DO NOTHING;",
            params![
                post.external_id.as_str(),
                post.text.as_str(),
                post.user_id,
                post.tag_group_id,
                post.created_at,
            ],
        )?;

        if changed == 0 {
            return Ok(InsertOutcome::AlreadyExists);
        }
        Ok(InsertOutcome::Inserted(self.conn.last_insert_rowid()))
    }

    fn find_post(&self, external_id: &str) -> RepoResult<Option<Post>> {
        let post = self
            .conn
            .query_row(
                &format!("{POST_SELECT_SQL} WHERE p.external_id = ?1;"),
                [external_id],
                parse_post_row,
            )
            .optional()?;
        Ok(post)
    }

    fn list_posts(&self, query: &PostListQuery) -> RepoResult<Vec<Post>> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }

        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&format!(
            "{POST_SELECT_SQL}
             WHERE p.tag_group_id = ?1
             {RECENCY_ORDER_SQL}
             LIMIT ?2 OFFSET ?3;"
        ))?;
        let mut rows = stmt.query(params![
            query.tag_group_id,
            i64::from(query.limit),
            offset
        ])?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(row)?);
        }
        Ok(posts)
    }

    fn most_recent_post(&self, tag_group_id: TagGroupId) -> RepoResult<Option<Post>> {
        let post = self
            .conn
            .query_row(
                &format!(
                    "{POST_SELECT_SQL}
                     WHERE p.tag_group_id = ?1
                     {RECENCY_ORDER_SQL}
                     LIMIT 1;"
                ),
                [tag_group_id],
                parse_post_row,
            )
            .optional()?;
        Ok(post)
    }

    fn count_posts(&self, tag_group_id: TagGroupId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE tag_group_id = ?1;",
            [tag_group_id],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn parse_post_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get("id")?,
        external_id: row.get("external_id")?,
        text: row.get("text")?,
        author: User {
            id: row.get("user_id")?,
            external_id: row.get("user_external_id")?,
            image_url: row.get("user_image_url")?,
        },
        tag_group_id: row.get("tag_group_id")?,
        created_at: row.get("created_at")?,
    })
}
