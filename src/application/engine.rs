//! Tag-set lifecycle for one entity instance.
//!
//! The engine is built for a single entity and keeps that entity's tags in
//! memory, loads them lazily (cache first, then storage) and reconciles
//! storage on `save`. A save rewrites every binding of the entity: old
//! bindings and their counts go first, then each tag is resolved or created
//! and bound again. Whether a save writes at all is decided by diffing
//! against the last persisted snapshot.
//!
//! Calls are blocking and issue several dependent writes; run `save` and
//! `delete` inside the caller's transaction.

use metrics::counter;
use tracing::{debug, info};

use crate::cache::CacheKey;
use crate::domain::entity::Taggable;
use crate::domain::tag_set::{TagSet, parse_tag_list};

use super::context::TaggingContext;
use super::error::TaggingError;
use super::statement::SqlValue;

/// What a call to [`TaggingEngine::save`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing changed since the last load or save; no statement was issued.
    Skipped,
    Written,
}

impl SaveOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Written => "written",
        }
    }
}

pub struct TaggingEngine<E> {
    ctx: TaggingContext,
    entity: E,
    tags: TagSet,
    /// Whether `tags.current()` reflects the entity, via load or explicit set.
    loaded: bool,
}

impl<E: Taggable> TaggingEngine<E> {
    pub fn new(ctx: TaggingContext, entity: E) -> Self {
        Self {
            ctx,
            entity,
            tags: TagSet::new(),
            loaded: false,
        }
    }

    pub fn context(&self) -> &TaggingContext {
        &self.ctx
    }

    pub fn entity(&self) -> &E {
        &self.entity
    }

    /// Host-side lifecycle changes, e.g. an insert that just completed.
    pub fn entity_mut(&mut self) -> &mut E {
        &mut self.entity
    }

    pub fn tag_set(&self) -> &TagSet {
        &self.tags
    }

    /// Replace the tag set without touching storage.
    pub fn set_tags<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.replace(names);
        self.loaded = true;
        self
    }

    /// `set_tags` for a comma-separated list.
    pub fn set_tag_list(&mut self, list: &str) -> &mut Self {
        self.set_tags(parse_tag_list(list))
    }

    pub fn add_tags<I, S>(&mut self, names: I) -> Result<&mut Self, TaggingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.load()?;
        self.tags.extend(names);
        Ok(self)
    }

    pub fn add_tag_list(&mut self, list: &str) -> Result<&mut Self, TaggingError> {
        self.add_tags(parse_tag_list(list))
    }

    pub fn remove_tags<I, S>(&mut self, names: I) -> Result<&mut Self, TaggingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.load()?;
        self.tags.remove(names);
        Ok(self)
    }

    pub fn remove_tag_list(&mut self, list: &str) -> Result<&mut Self, TaggingError> {
        self.remove_tags(parse_tag_list(list))
    }

    pub fn remove_all_tags(&mut self) -> Result<&mut Self, TaggingError> {
        self.load()?;
        self.tags.clear();
        Ok(self)
    }

    pub fn tags(&mut self) -> Result<&[String], TaggingError> {
        self.load()?;
        Ok(self.tags.current())
    }

    /// True iff every requested name is among the entity's tags.
    pub fn has_tags<I, S>(&mut self, names: I) -> Result<bool, TaggingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.load()?;
        Ok(self.tags.contains_all(names))
    }

    /// Tags joined by `", "`.
    pub fn tags_display(&mut self) -> Result<String, TaggingError> {
        self.load()?;
        Ok(self.tags.to_string())
    }

    /// Persist the tag set after the entity itself was saved.
    pub fn save(&mut self) -> Result<SaveOutcome, TaggingError> {
        self.check_entity()?;

        let schema = self.ctx.schema();
        let is_new = self.entity.is_new_record();

        if !self.loaded || !self.tags.needs_save(is_new) {
            counter!("taggable_saves_total", "outcome" => SaveOutcome::Skipped.as_str())
                .increment(1);
            debug!(
                entity_table = self.entity.table_name(),
                entity_id = ?self.entity.primary_key(),
                "Tag set unchanged, skipping save"
            );
            return Ok(SaveOutcome::Skipped);
        }

        let entity_id = self.entity_id()?;

        if !schema.create_tags_automatically() {
            for name in self.tags.current() {
                if self.ctx.find_tag_id(name)?.is_none() {
                    return Err(TaggingError::unknown_tag(name.as_str()));
                }
            }
        }

        if !is_new {
            self.unbind(entity_id)?;
        }

        let statements = self.ctx.statements();
        for name in self.tags.current() {
            let tag_id = match self.ctx.find_tag_id(name)? {
                Some(id) => id,
                None => {
                    let id = self.ctx.create_tag(name)?;
                    self.ctx.reset_all_tags_cache();
                    self.ctx.reset_all_tags_with_count_cache();
                    counter!("taggable_tags_created_total").increment(1);
                    info!(
                        entity_table = schema.entity_table(),
                        tag = %name,
                        tag_id = id,
                        "Created tag"
                    );
                    id
                }
            };
            self.ctx
                .db()
                .execute(&statements.insert_binding(entity_id, tag_id))?;
        }

        if !self.tags.is_empty()
            && let Some(statement) = statements.update_counts(entity_id, 1)
        {
            self.ctx.db().execute(&statement)?;
        }

        self.ctx.reset_all_tags_with_count_cache();
        self.ctx.cache().set(
            &CacheKey::entity_tags(schema, entity_id),
            self.tags.current(),
        );

        let bound = self.tags.len();
        self.tags.mark_persisted();

        counter!("taggable_saves_total", "outcome" => SaveOutcome::Written.as_str()).increment(1);
        info!(
            entity_table = schema.entity_table(),
            entity_id,
            tags = bound,
            "Saved tags"
        );
        Ok(SaveOutcome::Written)
    }

    /// Drop every binding of the entity after the entity itself was deleted.
    pub fn delete(&mut self) -> Result<(), TaggingError> {
        self.check_entity()?;
        let entity_id = self.entity_id()?;

        self.unbind(entity_id)?;

        self.ctx
            .cache()
            .delete(&CacheKey::entity_tags(self.ctx.schema(), entity_id));
        self.ctx.reset_all_tags_with_count_cache();

        self.tags = TagSet::from_persisted(Vec::<String>::new());
        self.loaded = true;

        info!(
            entity_table = self.ctx.schema().entity_table(),
            entity_id, "Deleted tag bindings"
        );
        Ok(())
    }

    fn load(&mut self) -> Result<(), TaggingError> {
        if self.loaded {
            return Ok(());
        }
        self.check_entity()?;

        let names = match self.entity.primary_key() {
            Some(id) if !self.entity.is_new_record() => self.fetch(id)?,
            _ => Vec::new(),
        };

        self.tags = TagSet::from_persisted(names);
        self.loaded = true;
        Ok(())
    }

    fn fetch(&self, entity_id: i64) -> Result<Vec<String>, TaggingError> {
        let key = CacheKey::entity_tags(self.ctx.schema(), entity_id);
        if let Some(names) = self.ctx.cache().get::<Vec<String>>(&key) {
            return Ok(names);
        }

        let names: Vec<String> = self
            .ctx
            .db()
            .column(&self.ctx.statements().entity_tag_names(entity_id))?
            .into_iter()
            .filter_map(SqlValue::into_text)
            .collect();

        self.ctx.cache().set(&key, &names);
        Ok(names)
    }

    /// Decrement counts, then delete the bindings they were counted from.
    fn unbind(&self, entity_id: i64) -> Result<(), TaggingError> {
        let statements = self.ctx.statements();
        if let Some(statement) = statements.update_counts(entity_id, -1) {
            self.ctx.db().execute(&statement)?;
        }
        self.ctx
            .db()
            .execute(&statements.delete_bindings(entity_id))?;
        Ok(())
    }

    /// The entity must belong to the table the context was configured for.
    fn check_entity(&self) -> Result<(), TaggingError> {
        let expected = self.ctx.schema().entity_table();
        let found = self.entity.table_name();
        if found != expected {
            return Err(TaggingError::entity_mismatch(expected, found));
        }
        Ok(())
    }

    fn entity_id(&self) -> Result<i64, TaggingError> {
        self.entity
            .primary_key()
            .ok_or_else(|| TaggingError::missing_primary_key(self.entity.table_name()))
    }
}
