//! Versioned schema for the tagfeed store.
//!
//! Version 1 holds the tag group registry (`tag_groups`, `tags`). Version 2
//! adds `users` and `posts`, with the UNIQUE `external_id` keys ingestion
//! relies on and the `(tag_group_id, created_at DESC, id)` feed index.
//!
//! The stored version lives in `PRAGMA user_version`; a partially migrated
//! database picks up from its stored version.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "tag_groups",
        sql: include_str!("0001_tag_groups.sql"),
    },
    Migration {
        version: 2,
        name: "users_posts",
        sql: include_str!("0002_users_posts.sql"),
    },
];

/// Schema version a fresh database ends up at.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Migrates `conn` to [`latest_version`] in a single transaction.
///
/// Fails with [`DbError::UnsupportedSchemaVersion`] for stores written by a
/// newer tagfeed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let stored = stored_version(conn)?;
    let latest = latest_version();

    if stored > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: stored,
            latest_supported: latest,
        });
    }
    if stored == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > stored) {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    Ok(())
}

fn stored_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
