//! Tag group registry contracts and SQLite implementation.
//!
//! # Responsibility
//! - Enumerate configured tag groups with their ordered terms.
//! - Create and delete groups as one atomic unit with their tags.
//!
//! # Invariants
//! - Group names are unique.
//! - Tags are returned in `position` order; groups in name order.
//! - Deleting a group cascades to its tags and posts.

use crate::model::tag_group::{
    normalize_group_name, normalize_terms, Tag, TagGroup, TagGroupId,
};
use crate::repo::{ensure_schema, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Registry of tag groups.
pub trait TagGroupRepository {
    /// Creates a group and its terms in one transaction.
    fn create_tag_group(&self, name: &str, terms: &[String]) -> RepoResult<TagGroup>;
    /// Lists every group, tags included.
    fn list_tag_groups(&self) -> RepoResult<Vec<TagGroup>>;
    fn get_tag_group(&self, id: TagGroupId) -> RepoResult<Option<TagGroup>>;
    fn find_tag_group_by_name(&self, name: &str) -> RepoResult<Option<TagGroup>>;
    fn delete_tag_group(&self, id: TagGroupId) -> RepoResult<()>;
}

/// SQLite-backed tag group registry.
pub struct SqliteTagGroupRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagGroupRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(conn, "tag_groups", &["id", "name"])?;
        ensure_schema(conn, "tags", &["id", "tag_group_id", "term", "position"])?;
        Ok(Self { conn })
    }

    fn load_group(&self, id: TagGroupId, name: String) -> RepoResult<TagGroup> {
        Ok(TagGroup {
            id,
            name,
            tags: load_tags_for_group(self.conn, id)?,
        })
    }
}

impl TagGroupRepository for SqliteTagGroupRepository<'_> {
    fn create_tag_group(&self, name: &str, terms: &[String]) -> RepoResult<TagGroup> {
        let name = normalize_group_name(name)?;
        let terms = normalize_terms(terms)?;

        let tx = self.conn.unchecked_transaction()?;
        let taken: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM tag_groups WHERE name = ?1);",
            [name.as_str()],
            |row| row.get(0),
        )?;
        if taken == 1 {
            return Err(RepoError::DuplicateTagGroup(name));
        }

        tx.execute("INSERT INTO tag_groups (name) VALUES (?1);", [name.as_str()])?;
        let group_id = tx.last_insert_rowid();
        for (position, term) in terms.iter().enumerate() {
            tx.execute(
                "INSERT INTO tags (tag_group_id, term, position) VALUES (?1, ?2, ?3);",
                params![group_id, term.as_str(), position as i64],
            )?;
        }
        tx.commit()?;

        self.load_group(group_id, name)
    }

    fn list_tag_groups(&self) -> RepoResult<Vec<TagGroup>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tag_groups ORDER BY name ASC, id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next()? {
            groups.push(self.load_group(row.get("id")?, row.get("name")?)?);
        }
        Ok(groups)
    }

    fn get_tag_group(&self, id: TagGroupId) -> RepoResult<Option<TagGroup>> {
        let name: Option<String> = self
            .conn
            .query_row("SELECT name FROM tag_groups WHERE id = ?1;", [id], |row| {
                row.get(0)
            })
            .optional()?;
        name.map(|name| self.load_group(id, name)).transpose()
    }

    fn find_tag_group_by_name(&self, name: &str) -> RepoResult<Option<TagGroup>> {
        let found: Option<(TagGroupId, String)> = self
            .conn
            .query_row(
                "SELECT id, name FROM tag_groups WHERE name = ?1;",
                [name.trim()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        found.map(|(id, name)| self.load_group(id, name)).transpose()
    }

    fn delete_tag_group(&self, id: TagGroupId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tag_groups WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::TagGroupNotFound(id));
        }
        Ok(())
    }
}

fn load_tags_for_group(conn: &Connection, group_id: TagGroupId) -> RepoResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT id, term, position
         FROM tags
         WHERE tag_group_id = ?1
         ORDER BY position ASC, id ASC;",
    )?;
    let mut rows = stmt.query([group_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let position: i64 = row.get("position")?;
        let position = u32::try_from(position).map_err(|_| {
            RepoError::InvalidData(format!("invalid position `{position}` in tags.position"))
        })?;
        tags.push(Tag {
            id: row.get("id")?,
            term: row.get("term")?,
            position,
        });
    }
    Ok(tags)
}
