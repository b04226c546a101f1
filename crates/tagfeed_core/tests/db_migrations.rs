use rusqlite::Connection;
use tagfeed_core::db::migrations::latest_version;
use tagfeed_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["tag_groups", "tags", "users", "posts"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn reopening_file_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tagfeed.db");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    assert_table_exists(&second, "posts");
}

#[test]
fn database_at_older_version_is_upgraded_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v1.db");

    let conn = open_db(&path).unwrap();
    conn.execute_batch(
        "INSERT INTO tag_groups (name) VALUES ('Ruby');
         DROP TABLE posts;
         DROP TABLE users;
         PRAGMA user_version = 1;",
    )
    .unwrap();
    drop(conn);

    let upgraded = open_db(&path).unwrap();
    assert_eq!(schema_version(&upgraded), latest_version());
    assert_table_exists(&upgraded, "users");
    assert_table_exists(&upgraded, "posts");
    let groups: i64 = upgraded
        .query_row("SELECT COUNT(*) FROM tag_groups;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(groups, 1);
}

#[test]
fn database_with_newer_schema_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn posts_external_id_is_unique_at_storage_level() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO tag_groups (name) VALUES ('Ruby');
         INSERT INTO users (external_id) VALUES ('@lucasas');
         INSERT INTO posts (external_id, text, user_id, tag_group_id, created_at)
         VALUES ('123456', 'Um tweet', 1, 1, 0);",
    )
    .unwrap();

    let duplicate = conn.execute(
        "INSERT INTO posts (external_id, text, user_id, tag_group_id, created_at)
         VALUES ('123456', 'again', 1, 1, 0);",
        [],
    );
    assert!(duplicate.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
