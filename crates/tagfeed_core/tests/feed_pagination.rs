use rusqlite::Connection;
use tagfeed_core::db::open_db_in_memory;
use tagfeed_core::{
    FeedService, NewPost, PostRepository, SqlitePostRepository, SqliteTagGroupRepository,
    SqliteUserDirectory, TagGroupId, TagGroupRepository, UserDirectory,
};

fn group(conn: &Connection, name: &str) -> TagGroupId {
    SqliteTagGroupRepository::try_new(conn)
        .unwrap()
        .create_tag_group(name, &["#tag".to_string()])
        .unwrap()
        .id
}

fn store(conn: &Connection, tag_group_id: TagGroupId, external_id: &str, created_at: i64) {
    let author = SqliteUserDirectory::try_new(conn)
        .unwrap()
        .find_or_create_user("@author", None)
        .unwrap();
    SqlitePostRepository::try_new(conn)
        .unwrap()
        .insert_post_if_absent(&NewPost {
            external_id: external_id.to_string(),
            text: format!("post {external_id}"),
            user_id: author.id,
            tag_group_id,
            created_at,
        })
        .unwrap();
}

fn ids(posts: &[tagfeed_core::Post]) -> Vec<&str> {
    posts.iter().map(|post| post.external_id.as_str()).collect()
}

#[test]
fn fifteen_posts_paginate_newest_first_by_four() {
    let conn = open_db_in_memory().unwrap();
    let java = group(&conn, "Java");
    for idx in 0..15 {
        store(&conn, java, &format!("p{idx}"), 1_000 + idx);
    }
    let feed = FeedService::new(SqlitePostRepository::try_new(&conn).unwrap());

    let first = feed.list_posts(java, None).unwrap();
    assert_eq!(first.page, 1);
    assert_eq!(ids(&first.items), vec!["p14", "p13", "p12", "p11"]);

    let second = feed.list_posts(java, Some(2)).unwrap();
    assert_eq!(ids(&second.items), vec!["p10", "p9", "p8", "p7"]);
    assert!(second.items.iter().all(|post| post.tag_group_id == java));

    let fourth = feed.list_posts(java, Some(4)).unwrap();
    assert_eq!(ids(&fourth.items), vec!["p2", "p1", "p0"]);

    assert!(feed.list_posts(java, Some(5)).unwrap().items.is_empty());
    assert_eq!(feed.page_count(java).unwrap(), 4);
}

#[test]
fn tied_timestamps_fall_back_to_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let java = group(&conn, "Java");
    for idx in 0..15 {
        store(&conn, java, &format!("p{idx}"), 5_000);
    }
    let feed = FeedService::new(SqlitePostRepository::try_new(&conn).unwrap());

    let second = feed.list_posts(java, Some(2)).unwrap();
    assert_eq!(ids(&second.items), vec!["p4", "p5", "p6", "p7"]);
    assert_eq!(feed.list_posts(java, Some(4)).unwrap().items.len(), 3);
}

#[test]
fn order_follows_timestamps_not_insertion() {
    let conn = open_db_in_memory().unwrap();
    let java = group(&conn, "Java");
    store(&conn, java, "older", 1_000);
    store(&conn, java, "newest", 3_000);
    store(&conn, java, "middle", 2_000);
    let feed = FeedService::new(SqlitePostRepository::try_new(&conn).unwrap());

    let page = feed.list_posts(java, Some(1)).unwrap();
    assert_eq!(ids(&page.items), vec!["newest", "middle", "older"]);
}

#[test]
fn listing_and_counting_are_scoped_to_the_group() {
    let conn = open_db_in_memory().unwrap();
    let java = group(&conn, "Java");
    let ruby = group(&conn, "Ruby");
    store(&conn, java, "j1", 1);
    store(&conn, ruby, "r1", 2);
    for idx in 0..14 {
        store(&conn, java, &format!("j-extra-{idx}"), 10 + idx);
    }
    let feed = FeedService::new(SqlitePostRepository::try_new(&conn).unwrap());

    assert_eq!(feed.count_posts(java).unwrap(), 15);
    assert_eq!(feed.count_posts(ruby).unwrap(), 1);
    assert_eq!(ids(&feed.list_posts(ruby, None).unwrap().items), vec!["r1"]);
}

#[test]
fn most_recent_post_is_newest_or_none() {
    let conn = open_db_in_memory().unwrap();
    let group_id = group(&conn, "A Group");
    let feed = FeedService::new(SqlitePostRepository::try_new(&conn).unwrap());
    assert!(feed.most_recent_post(group_id).unwrap().is_none());

    store(&conn, group_id, "last", 10_000);
    store(&conn, group_id, "first", 5_000);

    let latest = feed.most_recent_post(group_id).unwrap().unwrap();
    assert_eq!(latest.external_id, "last");
}

#[test]
fn custom_page_size_is_applied() {
    let conn = open_db_in_memory().unwrap();
    let java = group(&conn, "Java");
    for idx in 0..7 {
        store(&conn, java, &format!("p{idx}"), idx);
    }
    let feed = FeedService::with_page_size(SqlitePostRepository::try_new(&conn).unwrap(), 5);

    assert_eq!(feed.page_size(), 5);
    assert_eq!(feed.list_posts(java, Some(1)).unwrap().items.len(), 5);
    assert_eq!(feed.list_posts(java, Some(2)).unwrap().items.len(), 2);
}
