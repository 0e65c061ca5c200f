//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::str::FromStr;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheConfig;
use crate::domain::schema::{Placeholder, TagSchema, TaggingOptions};

mod cli;

pub use cli::{CliArgs, Command, CountsArgs, EntityArgs, FindArgs, Overrides, TagArgs};

const LOCAL_CONFIG_BASENAME: &str = "taggable";
const ENV_PREFIX: &str = "TAGGABLE";
const DEFAULT_DATABASE_URL: &str = "sqlite://taggable.db";
const DEFAULT_ENTITY_TABLE: &str = "Post";

/// Registry id of the in-process cache bound when `cache.enabled` is set.
/// Tagging uses it unless `tagging.cache_id` names another cache.
pub const MEMORY_CACHE_ID: &str = "memory";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheConfig,
    pub tagging: TaggingSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct TaggingSettings {
    pub entity_table: String,
    pub options: TaggingOptions,
}

impl TaggingSettings {
    /// Resolved schema for the configured entity table.
    pub fn schema(&self) -> Result<TagSchema, crate::domain::error::DomainError> {
        TagSchema::resolve(&self.entity_table, &self.options)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder =
        Config::builder().add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Parse CLI arguments and resolve settings, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    tagging: RawTaggingSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(table) = overrides.entity_table.as_ref() {
            self.tagging.entity_table = Some(table.clone());
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if overrides.strict {
            self.tagging.create_tags_automatically = Some(false);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            database,
            cache,
            tagging,
        } = raw;

        let settings = Self {
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database),
            cache: build_cache_settings(cache)?,
            tagging: build_tagging_settings(tagging)?,
        };

        settings
            .tagging
            .schema()
            .map_err(|err| LoadError::invalid("tagging", err.to_string()))?;

        Ok(settings)
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::WARN,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> DatabaseSettings {
    let url = database
        .url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

    DatabaseSettings { url }
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheConfig, LoadError> {
    let defaults = CacheConfig::default();

    let capacity = match cache.capacity {
        Some(0) => {
            return Err(LoadError::invalid(
                "cache.capacity",
                "must be greater than zero",
            ));
        }
        Some(value) => usize::try_from(value)
            .map_err(|_| LoadError::invalid("cache.capacity", "value exceeds supported range"))?,
        None => defaults.capacity,
    };

    Ok(CacheConfig {
        enabled: cache.enabled.unwrap_or(defaults.enabled),
        capacity,
    })
}

fn build_tagging_settings(tagging: RawTaggingSettings) -> Result<TaggingSettings, LoadError> {
    let entity_table = tagging
        .entity_table
        .unwrap_or_else(|| DEFAULT_ENTITY_TABLE.to_string());

    let cache_id = tagging.cache_id.unwrap_or_else(|| MEMORY_CACHE_ID.to_string());

    let placeholders = tagging
        .placeholders
        .map(|value| parse_placeholder(&value))
        .transpose()?;

    Ok(TaggingSettings {
        entity_table,
        options: TaggingOptions {
            entity_pk: tagging.entity_pk,
            tag_table: tagging.tag_table,
            tag_binding_table: tagging.tag_binding_table,
            tag_binding_table_tag_id: tagging.tag_binding_table_tag_id,
            tag_table_name: tagging.tag_table_name,
            tag_table_count: tagging.tag_table_count,
            model_table_fk: tagging.model_table_fk,
            create_tags_automatically: tagging.create_tags_automatically,
            cache_id: Some(cache_id),
            placeholders,
        },
    })
}

fn parse_placeholder(value: &str) -> Result<Placeholder, LoadError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "question" => Ok(Placeholder::Question),
        "dollar" => Ok(Placeholder::Dollar),
        other => Err(LoadError::invalid(
            "tagging.placeholders",
            format!("expected `question` or `dollar`, got `{other}`"),
        )),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    capacity: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawTaggingSettings {
    entity_table: Option<String>,
    entity_pk: Option<String>,
    tag_table: Option<String>,
    tag_binding_table: Option<String>,
    tag_binding_table_tag_id: Option<String>,
    tag_table_name: Option<String>,
    tag_table_count: Option<String>,
    model_table_fk: Option<String>,
    create_tags_automatically: Option<bool>,
    cache_id: Option<String>,
    placeholders: Option<String>,
}
