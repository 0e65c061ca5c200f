use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the taggable binary.
#[derive(Debug, Parser)]
#[command(
    name = "taggable",
    version,
    about = "Manage entity tags in a SQLite database"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "TAGGABLE_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the tagged entity table.
    #[arg(long = "entity-table", value_name = "TABLE", global = true)]
    pub entity_table: Option<String>,

    /// Toggle the in-memory tag cache.
    #[arg(
        long = "cache",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub cache_enabled: Option<bool>,

    /// Fail on unknown tags instead of creating them.
    #[arg(long = "strict", action = clap::ArgAction::SetTrue, global = true)]
    pub strict: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the tags of one entity.
    Show(EntityArgs),
    /// Replace the tags of one entity.
    Set(TagArgs),
    /// Add tags to one entity.
    Add(TagArgs),
    /// Remove tags from one entity.
    Remove(TagArgs),
    /// Remove every tag from one entity.
    Clear(EntityArgs),
    /// Drop the tag bindings of a deleted entity.
    Delete(EntityArgs),
    /// List every tag name.
    All,
    /// List tags with usage counts.
    Counts(CountsArgs),
    /// Print ids of entities carrying every listed tag.
    Find(FindArgs),
}

#[derive(Debug, Args, Clone)]
pub struct EntityArgs {
    /// Primary key of the entity.
    pub id: i64,
}

#[derive(Debug, Args, Clone)]
pub struct TagArgs {
    /// Primary key of the entity.
    pub id: i64,

    /// Comma-separated tag names.
    pub tags: String,

    /// Treat the entity as freshly inserted (no existing bindings).
    #[arg(long = "new", action = clap::ArgAction::SetTrue)]
    pub new_record: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CountsArgs {
    /// Hide tags used fewer times than this.
    #[arg(long = "min", value_name = "COUNT", default_value_t = 1)]
    pub min: i64,
}

#[derive(Debug, Args, Clone)]
pub struct FindArgs {
    /// Comma-separated tag names; entities must carry all of them.
    pub tags: String,
}
