//! Cross-entity tag listings served through the cache.
//!
//! Readers only fill the cache; entries are invalidated by the engine when a
//! tag is created or bindings change.

use serde::{Deserialize, Serialize};

use crate::cache::CacheKey;

use super::context::TaggingContext;
use super::error::TaggingError;
use super::executor::{Row, StorageError};
use super::statement::SqlValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub count: i64,
}

impl TagCount {
    pub fn new(name: impl Into<String>, count: i64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }

    fn from_row(row: &Row) -> Result<Self, StorageError> {
        let name = row
            .get("name")
            .and_then(SqlValue::as_str)
            .ok_or_else(|| StorageError::decode("tag count row without a text `name`"))?;
        let count = match row.get("count") {
            Some(SqlValue::Null) | None => 0,
            Some(value) => match value.as_i64() {
                Some(count) => count,
                None => {
                    let message = format!("count of `{name}` is not an integer");
                    return Err(StorageError::decode(message));
                }
            },
        };
        Ok(Self::new(name, count))
    }
}

#[derive(Clone)]
pub struct AggregateTagReader {
    ctx: TaggingContext,
}

impl AggregateTagReader {
    pub fn new(ctx: TaggingContext) -> Self {
        Self { ctx }
    }

    /// Every tag name in the tag table.
    pub fn all_tags(&self) -> Result<Vec<String>, TaggingError> {
        let key = CacheKey::all_tags(self.ctx.schema());
        if let Some(names) = self.ctx.cache().get::<Vec<String>>(&key) {
            return Ok(names);
        }

        let names: Vec<String> = self
            .ctx
            .db()
            .column(&self.ctx.statements().all_tag_names())?
            .into_iter()
            .filter_map(SqlValue::into_text)
            .collect();

        self.ctx.cache().set(&key, &names);
        Ok(names)
    }

    /// Every tag with its usage count. Reads the count column when one is
    /// configured; otherwise counts bindings, which leaves out unused tags.
    pub fn all_tags_with_count(&self) -> Result<Vec<TagCount>, TaggingError> {
        let key = CacheKey::all_tags_with_count(self.ctx.schema());
        if let Some(counts) = self.ctx.cache().get::<Vec<TagCount>>(&key) {
            return Ok(counts);
        }

        let counts = self
            .ctx
            .db()
            .rows(&self.ctx.statements().tag_counts())?
            .iter()
            .map(TagCount::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        self.ctx.cache().set(&key, &counts);
        Ok(counts)
    }
}

/// Keep tags used at least `min` times.
pub fn with_min_count(counts: Vec<TagCount>, min: i64) -> Vec<TagCount> {
    counts.into_iter().filter(|tag| tag.count >= min).collect()
}

pub fn sort_by_name(counts: &mut [TagCount]) {
    counts.sort_by(|a, b| a.name.cmp(&b.name));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_count_filters_below_threshold() {
        let counts = vec![
            TagCount::new("red", 2),
            TagCount::new("blue", 0),
            TagCount::new("green", 1),
        ];

        let kept = with_min_count(counts, 1);
        assert_eq!(
            kept,
            vec![TagCount::new("red", 2), TagCount::new("green", 1)]
        );
    }

    #[test]
    fn sorts_by_name() {
        let mut counts = vec![TagCount::new("b", 1), TagCount::new("a", 5)];
        sort_by_name(&mut counts);
        assert_eq!(counts[0].name, "a");
    }

    #[test]
    fn rows_decode_name_and_count() {
        let row = Row::new(vec![
            ("name".into(), SqlValue::Text("red".into())),
            ("count".into(), SqlValue::Integer(3)),
        ]);
        let decoded = TagCount::from_row(&row).expect("row");
        assert_eq!(decoded, TagCount::new("red", 3));

        let missing_name = Row::new(vec![("count".into(), SqlValue::Integer(3))]);
        assert!(TagCount::from_row(&missing_name).is_err());
    }

    #[test]
    fn serializes_as_name_count_pairs() {
        let json = serde_json::to_string(&TagCount::new("red", 2)).expect("json");
        assert_eq!(json, r#"{"name":"red","count":2}"#);
    }
}
