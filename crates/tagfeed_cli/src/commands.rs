use anyhow::{Context, Result};
use log::info;
use rusqlite::Connection;
use tagfeed_core::db::open_db;
use tagfeed_core::link::{HttpLinkResolver, LinkResolver};
use tagfeed_core::{
    init_logging, FeedConfig, FeedService, HttpSearchClient, IngestService, SqlitePostRepository,
    SqliteTagGroupRepository, SqliteUserDirectory, TagGroup, TagGroupService,
};

use crate::cli::{Commands, FeedArgs, GroupsCommand};

pub fn run(command: Commands) -> Result<()> {
    let config = FeedConfig::from_env().context("invalid TAGFEED_* environment")?;
    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, log_dir).context("logging setup failed")?;
    }

    match command {
        Commands::Groups(args) => run_groups(&open(&config)?, args.command),
        Commands::Ingest => run_ingest(&open(&config)?, &config),
        Commands::Feed(args) => run_feed(&open(&config)?, &config, args),
        Commands::Count(args) => {
            let conn = open(&config)?;
            let group = require_group(&conn, &args.group)?;
            let feed = FeedService::new(SqlitePostRepository::try_new(&conn)?);
            println!("{}", feed.count_posts(group.id)?);
            Ok(())
        }
        Commands::Resolve(args) => {
            let resolver = HttpLinkResolver::new(config.link_timeout_ms)?;
            println!("{}", serde_json::to_string_pretty(&resolver.resolve(&args.url))?);
            Ok(())
        }
    }
}

fn open(config: &FeedConfig) -> Result<Connection> {
    open_db(&config.db_path)
        .with_context(|| format!("cannot open database `{}`", config.db_path.display()))
}

fn run_groups(conn: &Connection, command: GroupsCommand) -> Result<()> {
    let service = TagGroupService::new(SqliteTagGroupRepository::try_new(conn)?);
    match command {
        GroupsCommand::Add { name, terms } => {
            let group = service.create_group(&name, &terms)?;
            info!(
                "event=group_create module=cli status=ok tag_group_id={} tags={}",
                group.id,
                group.tags.len()
            );
            print_group(&group);
        }
        GroupsCommand::List => {
            for group in service.list_groups()? {
                print_group(&group);
            }
        }
        GroupsCommand::Remove { name } => {
            service.remove_group(&name)?;
            info!("event=group_remove module=cli status=ok");
            println!("removed {name}");
        }
    }
    Ok(())
}

fn run_ingest(conn: &Connection, config: &FeedConfig) -> Result<()> {
    let search = HttpSearchClient::new(config.search_client_config())?;
    let engine = IngestService::new(
        SqliteTagGroupRepository::try_new(conn)?,
        SqliteUserDirectory::try_new(conn)?,
        SqlitePostRepository::try_new(conn)?,
        search,
        config.query_options(),
    );
    let report = engine.run_cycle()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_feed(conn: &Connection, config: &FeedConfig, args: FeedArgs) -> Result<()> {
    let group = require_group(conn, &args.group)?;
    let feed = FeedService::with_page_size(
        SqlitePostRepository::try_new(conn)?,
        config.feed_page_size,
    );
    let page = feed.list_posts(group.id, Some(args.page))?;
    println!(
        "{} page {}/{}",
        group.name,
        page.page,
        feed.page_count(group.id)?.max(1)
    );
    for post in &page.items {
        println!(
            "{} {} {}: {}",
            post.created_at, post.external_id, post.author.external_id, post.text
        );
    }
    Ok(())
}

fn require_group(conn: &Connection, name: &str) -> Result<TagGroup> {
    let service = TagGroupService::new(SqliteTagGroupRepository::try_new(conn)?);
    Ok(service.require_group(name)?)
}

fn print_group(group: &TagGroup) {
    let terms: Vec<&str> = group.terms().collect();
    println!("{}\t{}\t{}", group.id, group.name, terms.join(" "));
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::cli::{Commands, GroupArg, UrlArg};

    #[test]
    fn resolve_does_not_need_a_database() {
        let dir = tempfile::tempdir().unwrap();
        let unopenable = dir.path().join("missing").join("tagfeed.sqlite3");
        std::env::set_var("TAGFEED_DB_PATH", &unopenable);

        let resolved = run(Commands::Resolve(UrlArg {
            url: "not a url".to_string(),
        }));
        assert!(resolved.is_ok(), "resolve failed: {resolved:?}");

        let counted = run(Commands::Count(GroupArg {
            group: "Ruby".to_string(),
        }));
        assert!(counted.is_err());
    }
}
