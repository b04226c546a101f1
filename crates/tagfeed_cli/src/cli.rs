use clap::{Args, Parser, Subcommand};

/// Aggregates social posts per tag group. Settings come from `TAGFEED_*`
/// environment variables.
#[derive(Debug, Parser)]
#[command(name = "tagfeed", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage tag groups.
    Groups(GroupsArgs),
    /// Run one ingestion cycle over every tag group.
    Ingest,
    /// Show one page of a group's posts, newest first.
    Feed(FeedArgs),
    /// Print how many posts a group holds.
    Count(GroupArg),
    /// Unwrap a link and fetch its page title.
    Resolve(UrlArg),
}

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    Add {
        name: String,
        /// Search terms, e.g. `#rust`.
        #[arg(allow_hyphen_values = true)]
        terms: Vec<String>,
    },
    List,
    Remove {
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct FeedArgs {
    pub group: String,
    /// 1-indexed page.
    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Debug, Args)]
pub struct GroupArg {
    pub group: String,
}

#[derive(Debug, Args)]
pub struct UrlArg {
    pub url: String,
}
