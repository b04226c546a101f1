//! Repository layer: data access contracts and their SQLite implementations.
//!
//! # Responsibility
//! - Define the persistence seams the services depend on (tag group
//!   registry, user directory, post store), each replaceable by a fake.
//! - Keep SQL inside this module.
//!
//! # Invariants
//! - Post creation is create-if-absent on `external_id`; a conflict is a
//!   result value, never an error.
//! - User creation is find-or-create on `external_id`.

use crate::db::DbError;
use crate::model::post::PostValidationError;
use crate::model::tag_group::{TagGroupId, TagGroupValidationError};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod post_repo;
pub mod tag_group_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every store.
#[derive(Debug)]
pub enum RepoError {
    InvalidPost(PostValidationError),
    InvalidTagGroup(TagGroupValidationError),
    Db(DbError),
    TagGroupNotFound(TagGroupId),
    DuplicateTagGroup(String),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPost(err) => write!(f, "{err}"),
            Self::InvalidTagGroup(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::TagGroupNotFound(id) => write!(f, "tag group not found: {id}"),
            Self::DuplicateTagGroup(name) => write!(f, "tag group already exists: `{name}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "connection is not migrated: missing table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "connection is not migrated: missing column `{table}.{column}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPost(err) => Some(err),
            Self::InvalidTagGroup(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PostValidationError> for RepoError {
    fn from(value: PostValidationError) -> Self {
        Self::InvalidPost(value)
    }
}

impl From<TagGroupValidationError> for RepoError {
    fn from(value: TagGroupValidationError) -> Self {
        Self::InvalidTagGroup(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Fails fast when a repository is handed a connection that skipped
/// migrations.
pub(crate) fn ensure_schema(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }
    for &column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
