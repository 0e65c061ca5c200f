//! Per-entity-type tagging schema.
//!
//! `TaggingOptions` is the raw, partially-filled configuration as it arrives
//! from a settings file or host code. `TagSchema::resolve` fills the defaults
//! (some derived from the entity table name) and validates every identifier.

use serde::Deserialize;

use super::error::DomainError;

const DEFAULT_ENTITY_PK: &str = "id";
const DEFAULT_TAG_TABLE: &str = "Tag";
const DEFAULT_BINDING_TAG_ID: &str = "tagId";
const DEFAULT_TAG_NAME_COLUMN: &str = "name";
const BINDING_TABLE_SUFFIX: &str = "Tag";
const MODEL_FK_SUFFIX: &str = "Id";

/// Primary key column of the tag table.
pub const TAG_ID_COLUMN: &str = "id";

/// Parameter marker style understood by the target store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placeholder {
    /// `?` markers (SQLite, MySQL).
    #[default]
    Question,
    /// `$1, $2, …` markers (PostgreSQL).
    Dollar,
}

/// Raw per-entity-type options; every field falls back to a default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaggingOptions {
    /// Primary key column of the entity table. Defaults to `id`.
    pub entity_pk: Option<String>,
    /// Tag table name. Defaults to `Tag`.
    pub tag_table: Option<String>,
    /// Junction table. Defaults to `{EntityTable}Tag`.
    pub tag_binding_table: Option<String>,
    /// Junction column holding the tag id. Defaults to `tagId`.
    pub tag_binding_table_tag_id: Option<String>,
    /// Tag table column holding the display name. Defaults to `name`.
    pub tag_table_name: Option<String>,
    /// Denormalized usage counter column; unset means counts are computed.
    pub tag_table_count: Option<String>,
    /// Junction column holding the entity id. Defaults to `{entityTable}Id`.
    pub model_table_fk: Option<String>,
    /// Create unknown tags on save instead of failing. Defaults to `true`.
    pub create_tags_automatically: Option<bool>,
    /// Identifier of the cache instance to bind. Empty means no cache.
    pub cache_id: Option<String>,
    pub placeholders: Option<Placeholder>,
}

/// Fully resolved table and column names for one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSchema {
    entity_table: String,
    entity_pk: String,
    tag_table: String,
    binding_table: String,
    binding_tag_id: String,
    tag_name: String,
    count_column: Option<String>,
    model_fk: String,
    create_tags_automatically: bool,
    cache_id: String,
    placeholders: Placeholder,
}

impl TagSchema {
    /// Resolve all defaults for the entity table and validate identifiers.
    pub fn resolve(entity_table: &str, options: &TaggingOptions) -> Result<Self, DomainError> {
        let entity_table = identifier("entity_table", entity_table)?;
        let entity_pk = identifier(
            "entity_pk",
            options.entity_pk.as_deref().unwrap_or(DEFAULT_ENTITY_PK),
        )?;

        let tag_table = identifier(
            "tag_table",
            options.tag_table.as_deref().unwrap_or(DEFAULT_TAG_TABLE),
        )?;
        let binding_table = match options.tag_binding_table.as_deref() {
            Some(name) => identifier("tag_binding_table", name)?,
            None => format!("{entity_table}{BINDING_TABLE_SUFFIX}"),
        };
        let binding_tag_id = identifier(
            "tag_binding_table_tag_id",
            options
                .tag_binding_table_tag_id
                .as_deref()
                .unwrap_or(DEFAULT_BINDING_TAG_ID),
        )?;
        let tag_name = identifier(
            "tag_table_name",
            options
                .tag_table_name
                .as_deref()
                .unwrap_or(DEFAULT_TAG_NAME_COLUMN),
        )?;
        let count_column = options
            .tag_table_count
            .as_deref()
            .map(|name| identifier("tag_table_count", name))
            .transpose()?;
        let model_fk = match options.model_table_fk.as_deref() {
            Some(name) => identifier("model_table_fk", name)?,
            None => format!("{}{MODEL_FK_SUFFIX}", lower_first(&entity_table)),
        };

        Ok(Self {
            entity_table,
            entity_pk,
            tag_table,
            binding_table,
            binding_tag_id,
            tag_name,
            count_column,
            model_fk,
            create_tags_automatically: options.create_tags_automatically.unwrap_or(true),
            cache_id: options.cache_id.clone().unwrap_or_default(),
            placeholders: options.placeholders.unwrap_or_default(),
        })
    }

    /// Schema with every option at its default.
    pub fn for_table(entity_table: &str) -> Result<Self, DomainError> {
        Self::resolve(entity_table, &TaggingOptions::default())
    }

    pub fn entity_table(&self) -> &str {
        &self.entity_table
    }

    /// Key column of the entity table, joined against the binding table.
    pub fn entity_pk(&self) -> &str {
        &self.entity_pk
    }

    pub fn tag_table(&self) -> &str {
        &self.tag_table
    }

    pub fn binding_table(&self) -> &str {
        &self.binding_table
    }

    pub fn binding_tag_id(&self) -> &str {
        &self.binding_tag_id
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn tag_id(&self) -> &str {
        TAG_ID_COLUMN
    }

    pub fn count_column(&self) -> Option<&str> {
        self.count_column.as_deref()
    }

    pub fn model_fk(&self) -> &str {
        &self.model_fk
    }

    pub fn create_tags_automatically(&self) -> bool {
        self.create_tags_automatically
    }

    pub fn cache_id(&self) -> &str {
        &self.cache_id
    }

    pub fn placeholders(&self) -> Placeholder {
        self.placeholders
    }
}

fn identifier(option: &'static str, value: &str) -> Result<String, DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid_identifier(option, "must not be empty"));
    }
    if value.trim() != value {
        return Err(DomainError::invalid_identifier(
            option,
            format!("`{value}` has surrounding whitespace"),
        ));
    }
    if value.contains('\0') {
        return Err(DomainError::invalid_identifier(
            option,
            "must not contain NUL characters",
        ));
    }
    Ok(value.to_string())
}

fn lower_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
