//! Cache key derivation.
//!
//! Per-entity keys embed every schema name that shapes the stored tag list,
//! so changing any of them yields a different key instead of a stale hit.
//! Aggregate keys are scoped by entity table only. Names are escaped so a
//! `:` inside one can never shift the segment boundaries.

use std::fmt::{self, Write as _};

use crate::domain::schema::TagSchema;

const PREFIX: &str = "taggable";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Tag names bound to one entity.
    EntityTags {
        entity_table: String,
        tag_table: String,
        binding_table: String,
        model_fk: String,
        binding_tag_id: String,
        entity_id: i64,
    },
    /// Every tag name of the entity type.
    AllTags { entity_table: String },
    /// Every tag name with its usage count.
    AllTagsWithCount { entity_table: String },
}

impl CacheKey {
    pub fn entity_tags(schema: &TagSchema, entity_id: i64) -> Self {
        Self::EntityTags {
            entity_table: schema.entity_table().to_string(),
            tag_table: schema.tag_table().to_string(),
            binding_table: schema.binding_table().to_string(),
            model_fk: schema.model_fk().to_string(),
            binding_tag_id: schema.binding_tag_id().to_string(),
            entity_id,
        }
    }

    pub fn all_tags(schema: &TagSchema) -> Self {
        Self::AllTags {
            entity_table: schema.entity_table().to_string(),
        }
    }

    pub fn all_tags_with_count(schema: &TagSchema) -> Self {
        Self::AllTagsWithCount {
            entity_table: schema.entity_table().to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntityTags {
                entity_table,
                tag_table,
                binding_table,
                model_fk,
                binding_tag_id,
                entity_id,
            } => write!(
                f,
                "{PREFIX}:{}:{}:{}:{}:{}:{entity_id}",
                Segment(entity_table),
                Segment(tag_table),
                Segment(binding_table),
                Segment(model_fk),
                Segment(binding_tag_id)
            ),
            Self::AllTags { entity_table } => write!(f, "{PREFIX}:{}:all", Segment(entity_table)),
            Self::AllTagsWithCount { entity_table } => {
                write!(f, "{PREFIX}:{}:all-with-count", Segment(entity_table))
            }
        }
    }
}

/// Percent-escapes `%` and `:` in one key segment.
struct Segment<'a>(&'a str);

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '%' => f.write_str("%25")?,
                ':' => f.write_str("%3A")?,
                _ => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::TaggingOptions;

    #[test]
    fn entity_key_is_deterministic() {
        let schema = TagSchema::for_table("Post").expect("schema");
        let key1 = CacheKey::entity_tags(&schema, 42);
        let key2 = CacheKey::entity_tags(&schema, 42);
        assert_eq!(key1, key2);
        assert_eq!(
            key1.to_string(),
            "taggable:Post:Tag:PostTag:postId:tagId:42"
        );
    }

    #[test]
    fn schema_change_changes_entity_key() {
        let default = TagSchema::for_table("Post").expect("schema");
        let custom = TagSchema::resolve(
            "Post",
            &TaggingOptions {
                tag_binding_table: Some("post_tags".into()),
                ..Default::default()
            },
        )
        .expect("schema");

        assert_ne!(
            CacheKey::entity_tags(&default, 1).to_string(),
            CacheKey::entity_tags(&custom, 1).to_string()
        );
    }

    #[test]
    fn separators_inside_names_cannot_collide() {
        let left = TagSchema::resolve(
            "a:b",
            &TaggingOptions {
                tag_table: Some("c".into()),
                ..Default::default()
            },
        )
        .expect("schema");
        let right = TagSchema::resolve(
            "a",
            &TaggingOptions {
                tag_table: Some("b:c".into()),
                tag_binding_table: Some("a:bTag".into()),
                model_table_fk: Some("a:bId".into()),
                ..Default::default()
            },
        )
        .expect("schema");

        let left_key = CacheKey::entity_tags(&left, 1).to_string();
        let right_key = CacheKey::entity_tags(&right, 1).to_string();
        assert_eq!(left_key, "taggable:a%3Ab:c:a%3AbTag:a%3AbId:tagId:1");
        assert_ne!(left_key, right_key);

        let escaped = TagSchema::for_table("Post%3A").expect("schema");
        let colon = TagSchema::for_table("Post:").expect("schema");
        assert_ne!(
            CacheKey::all_tags(&escaped).to_string(),
            CacheKey::all_tags(&colon).to_string()
        );
    }

    #[test]
    fn aggregate_keys_are_distinct() {
        let schema = TagSchema::for_table("Post").expect("schema");
        assert_eq!(CacheKey::all_tags(&schema).to_string(), "taggable:Post:all");
        assert_eq!(
            CacheKey::all_tags_with_count(&schema).to_string(),
            "taggable:Post:all-with-count"
        );
    }
}
