use rusqlite::Connection;
use tagfeed_core::db::open_db_in_memory;
use tagfeed_core::{
    FetchResult, IngestOutcome, IngestService, InsertOutcome, NewPost, Post, PostListQuery,
    PostRepository, PostValidationError, QueryOptions, RawPost, RepoError, RepoResult, SearchApi,
    SearchQuery, SkipReason, SqlitePostRepository, SqliteTagGroupRepository, SqliteUserDirectory,
    TagGroup, TagGroupId, TagGroupRepository, UserDirectory,
};

struct NoSearch;

impl SearchApi for NoSearch {
    fn search(&self, _query: &SearchQuery) -> FetchResult<Vec<RawPost>> {
        Ok(Vec::new())
    }
}

fn options() -> QueryOptions {
    QueryOptions {
        language: "pt".to_string(),
        page_size: 100,
    }
}

fn engine(
    conn: &Connection,
) -> IngestService<
    SqliteTagGroupRepository<'_>,
    SqliteUserDirectory<'_>,
    SqlitePostRepository<'_>,
    NoSearch,
> {
    IngestService::new(
        SqliteTagGroupRepository::try_new(conn).unwrap(),
        SqliteUserDirectory::try_new(conn).unwrap(),
        SqlitePostRepository::try_new(conn).unwrap(),
        NoSearch,
        options(),
    )
}

fn group(conn: &Connection, name: &str) -> TagGroup {
    SqliteTagGroupRepository::try_new(conn)
        .unwrap()
        .create_tag_group(name, &[format!("#{}", name.to_lowercase())])
        .unwrap()
}

fn candidate(id: &str) -> RawPost {
    RawPost {
        id: id.to_string(),
        text: "Um tweet".to_string(),
        author_id: "@lucasas".to_string(),
        author_image_url: Some("foto.png".to_string()),
        created_at: 1_700_000_000_000,
    }
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn new_candidate_is_stored_with_its_author() {
    let conn = open_db_in_memory().unwrap();
    let java = group(&conn, "Java");
    let engine = engine(&conn);

    let outcome = engine.ingest_candidate(&candidate("123456"), java.id).unwrap();
    assert!(matches!(outcome, IngestOutcome::Created(_)));

    let posts = SqlitePostRepository::try_new(&conn).unwrap();
    let stored = posts.find_post("123456").unwrap().unwrap();
    assert_eq!(stored.text, "Um tweet");
    assert_eq!(stored.tag_group_id, java.id);
    assert_eq!(stored.created_at, 1_700_000_000_000);
    assert_eq!(stored.author.external_id, "@lucasas");
    assert_eq!(stored.author.image_url.as_deref(), Some("foto.png"));
}

#[test]
fn ingesting_same_candidate_repeatedly_stores_one_post() {
    let conn = open_db_in_memory().unwrap();
    let java = group(&conn, "Java");
    let engine = engine(&conn);

    let first = engine.ingest_candidate(&candidate("123456"), java.id).unwrap();
    assert!(matches!(first, IngestOutcome::Created(_)));
    for _ in 0..3 {
        let again = engine.ingest_candidate(&candidate("123456"), java.id).unwrap();
        assert_eq!(again, IngestOutcome::Skipped(SkipReason::AlreadyStored));
    }

    assert_eq!(count_rows(&conn, "posts"), 1);
    assert_eq!(count_rows(&conn, "users"), 1);
}

#[test]
fn padded_external_id_matches_the_stored_post() {
    let conn = open_db_in_memory().unwrap();
    let java = group(&conn, "Java");
    let engine = engine(&conn);

    let first = engine.ingest_candidate(&candidate("123"), java.id).unwrap();
    assert!(matches!(first, IngestOutcome::Created(_)));
    let padded = engine.ingest_candidate(&candidate(" 123 "), java.id).unwrap();
    assert_eq!(padded, IngestOutcome::Skipped(SkipReason::AlreadyStored));

    assert_eq!(count_rows(&conn, "posts"), 1);
    let posts = SqlitePostRepository::try_new(&conn).unwrap();
    assert!(posts.find_post("123").unwrap().is_some());
}

#[test]
fn padded_external_id_is_stored_trimmed() {
    let conn = open_db_in_memory().unwrap();
    let java = group(&conn, "Java");
    let engine = engine(&conn);

    engine.ingest_candidate(&candidate("\t99 "), java.id).unwrap();
    let again = engine.ingest_candidate(&candidate("99"), java.id).unwrap();

    assert_eq!(again, IngestOutcome::Skipped(SkipReason::AlreadyStored));
    let posts = SqlitePostRepository::try_new(&conn).unwrap();
    assert_eq!(posts.find_post("99").unwrap().unwrap().external_id, "99");
}

#[test]
fn post_stored_under_one_group_is_not_duplicated_into_another() {
    let conn = open_db_in_memory().unwrap();
    let java = group(&conn, "Java");
    let ruby = group(&conn, "Ruby");
    let engine = engine(&conn);

    engine.ingest_candidate(&candidate("123456"), ruby.id).unwrap();
    let outcome = engine.ingest_candidate(&candidate("123456"), java.id).unwrap();
    assert_eq!(outcome, IngestOutcome::Skipped(SkipReason::AlreadyStored));

    let posts = SqlitePostRepository::try_new(&conn).unwrap();
    assert_eq!(posts.count_posts(ruby.id).unwrap(), 1);
    assert_eq!(posts.count_posts(java.id).unwrap(), 0);
    assert_eq!(posts.find_post("123456").unwrap().unwrap().tag_group_id, ruby.id);
}

#[test]
fn known_author_is_reused_and_keeps_first_avatar() {
    let conn = open_db_in_memory().unwrap();
    let java = group(&conn, "Java");
    let engine = engine(&conn);

    engine.ingest_candidate(&candidate("1"), java.id).unwrap();
    let mut second = candidate("2");
    second.author_image_url = Some("new.png".to_string());
    engine.ingest_candidate(&second, java.id).unwrap();

    assert_eq!(count_rows(&conn, "users"), 1);
    let users = SqliteUserDirectory::try_new(&conn).unwrap();
    let author = users.find_user("@lucasas").unwrap().unwrap();
    assert_eq!(author.image_url.as_deref(), Some("foto.png"));
}

#[test]
fn blank_external_id_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let java = group(&conn, "Java");
    let engine = engine(&conn);

    let err = engine.ingest_candidate(&candidate("  "), java.id).unwrap_err();
    assert!(matches!(
        err,
        RepoError::InvalidPost(PostValidationError::BlankExternalId)
    ));
    assert_eq!(count_rows(&conn, "users"), 0);
    assert_eq!(count_rows(&conn, "posts"), 0);
}

/// Post store whose existence check always misses, as if another worker
/// committed between check and insert.
struct StaleExistenceCheck<'conn> {
    inner: SqlitePostRepository<'conn>,
}

impl PostRepository for StaleExistenceCheck<'_> {
    fn post_exists(&self, _external_id: &str) -> RepoResult<bool> {
        Ok(false)
    }

    fn insert_post_if_absent(&self, post: &NewPost) -> RepoResult<InsertOutcome> {
        self.inner.insert_post_if_absent(post)
    }

    fn find_post(&self, external_id: &str) -> RepoResult<Option<Post>> {
        self.inner.find_post(external_id)
    }

    fn list_posts(&self, query: &PostListQuery) -> RepoResult<Vec<Post>> {
        self.inner.list_posts(query)
    }

    fn most_recent_post(&self, tag_group_id: TagGroupId) -> RepoResult<Option<Post>> {
        self.inner.most_recent_post(tag_group_id)
    }

    fn count_posts(&self, tag_group_id: TagGroupId) -> RepoResult<u64> {
        self.inner.count_posts(tag_group_id)
    }
}

#[test]
fn unique_key_conflict_is_reported_as_skip() {
    let conn = open_db_in_memory().unwrap();
    let java = group(&conn, "Java");
    let ruby = group(&conn, "Ruby");
    let engine = IngestService::new(
        SqliteTagGroupRepository::try_new(&conn).unwrap(),
        SqliteUserDirectory::try_new(&conn).unwrap(),
        StaleExistenceCheck {
            inner: SqlitePostRepository::try_new(&conn).unwrap(),
        },
        NoSearch,
        options(),
    );

    let first = engine.ingest_candidate(&candidate("777"), java.id).unwrap();
    assert!(matches!(first, IngestOutcome::Created(_)));
    let second = engine.ingest_candidate(&candidate("777"), ruby.id).unwrap();
    assert_eq!(second, IngestOutcome::Skipped(SkipReason::LostRace));

    assert_eq!(count_rows(&conn, "posts"), 1);
    let posts = SqlitePostRepository::try_new(&conn).unwrap();
    assert_eq!(posts.find_post("777").unwrap().unwrap().tag_group_id, java.id);
}
