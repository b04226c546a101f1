//! User directory: find-or-create of local authors.
//!
//! # Invariants
//! - At most one row per `external_id`, enforced by a unique key, so
//!   concurrent workers resolving the same author converge on one user.
//! - An existing user's `image_url` is never overwritten.

use crate::model::user::User;
use crate::repo::{ensure_schema, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Resolves external author ids to local users.
pub trait UserDirectory {
    /// Returns the user for `external_id`, creating it on first sight.
    fn find_or_create_user(
        &self,
        external_id: &str,
        image_url: Option<&str>,
    ) -> RepoResult<User>;
    fn find_user(&self, external_id: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user directory.
pub struct SqliteUserDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserDirectory<'conn> {
    /// Constructs a directory from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(conn, "users", &["id", "external_id", "image_url"])?;
        Ok(Self { conn })
    }
}

impl UserDirectory for SqliteUserDirectory<'_> {
    fn find_or_create_user(
        &self,
        external_id: &str,
        image_url: Option<&str>,
    ) -> RepoResult<User> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Err(RepoError::InvalidData(
                "user external id cannot be blank".to_string(),
            ));
        }

        self.conn.execute(
            "INSERT INTO users (external_id, image_url)
             VALUES (?1, ?2)
             ON CONFLICT(external_id) DO NOTHING;",
            params![external_id, image_url],
        )?;

        self.find_user(external_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "user `{external_id}` missing right after find-or-create"
            ))
        })
    }

    fn find_user(&self, external_id: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, external_id, image_url FROM users WHERE external_id = ?1;",
                [external_id.trim()],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        external_id: row.get("external_id")?,
        image_url: row.get("image_url")?,
    })
}
