use std::sync::Arc;

use crate::cache::{CacheKey, TagCache, TypedCache};
use crate::domain::entity::Taggable;
use crate::domain::schema::TagSchema;

use super::aggregate::AggregateTagReader;
use super::engine::TaggingEngine;
use super::executor::{QueryExecutor, StorageError};
use super::filter::TagQueryBuilder;
use super::statements::TagStatements;

/// Creates tag rows that do not exist yet and returns their id.
pub trait TagFactory: Send + Sync {
    fn create_tag(
        &self,
        db: &dyn QueryExecutor,
        schema: &TagSchema,
        name: &str,
    ) -> Result<i64, StorageError>;
}

/// Inserts the tag row directly and reads back the generated id.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlTagFactory;

impl TagFactory for SqlTagFactory {
    fn create_tag(
        &self,
        db: &dyn QueryExecutor,
        schema: &TagSchema,
        name: &str,
    ) -> Result<i64, StorageError> {
        db.execute(&TagStatements::new(schema).insert_tag(name))?;
        db.last_insert_id()
    }
}

/// Collaborators shared by every engine and reader of one entity type.
#[derive(Clone)]
pub struct TaggingContext {
    schema: Arc<TagSchema>,
    db: Arc<dyn QueryExecutor>,
    cache: TypedCache,
    factory: Arc<dyn TagFactory>,
}

impl TaggingContext {
    pub fn new(schema: TagSchema, db: Arc<dyn QueryExecutor>, cache: Arc<dyn TagCache>) -> Self {
        Self {
            schema: Arc::new(schema),
            db,
            cache: TypedCache::new(cache),
            factory: Arc::new(SqlTagFactory),
        }
    }

    pub fn with_factory(mut self, factory: Arc<dyn TagFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn schema(&self) -> &TagSchema {
        &self.schema
    }

    pub(crate) fn db(&self) -> &dyn QueryExecutor {
        self.db.as_ref()
    }

    pub(crate) fn cache(&self) -> &TypedCache {
        &self.cache
    }

    pub(crate) fn statements(&self) -> TagStatements<'_> {
        TagStatements::new(&self.schema)
    }

    pub(crate) fn create_tag(&self, name: &str) -> Result<i64, StorageError> {
        self.factory.create_tag(self.db(), &self.schema, name)
    }

    /// Id of the tag named `name`, if the row exists.
    pub fn find_tag_id(&self, name: &str) -> Result<Option<i64>, StorageError> {
        let value = self.db.scalar(&self.statements().find_tag_id(name))?;
        match value {
            None => Ok(None),
            Some(value) if value.is_null() => Ok(None),
            Some(value) => match value.as_i64() {
                Some(id) => Ok(Some(id)),
                None => {
                    let message = format!("tag id for `{name}` is not an integer");
                    Err(StorageError::decode(message))
                }
            },
        }
    }

    pub fn reset_all_tags_cache(&self) {
        self.cache.delete(&CacheKey::all_tags(&self.schema));
    }

    pub fn reset_all_tags_with_count_cache(&self) {
        self.cache
            .delete(&CacheKey::all_tags_with_count(&self.schema));
    }

    /// A fresh engine bound to `entity`.
    pub fn engine<E: Taggable>(&self, entity: E) -> TaggingEngine<E> {
        TaggingEngine::new(self.clone(), entity)
    }

    pub fn reader(&self) -> AggregateTagReader {
        AggregateTagReader::new(self.clone())
    }

    pub fn query_builder(&self) -> TagQueryBuilder {
        TagQueryBuilder::new(Arc::clone(&self.schema))
    }
}
