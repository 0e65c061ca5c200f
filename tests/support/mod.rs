//! Shared SQLite fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use taggable::cache::{MemoryCache, NullCache, TagCache};
use taggable::infra::sqlite::SqliteExecutor;
use taggable::{
    EntityRef, QueryExecutor, Row, SqlValue, Statement, StorageError, TagSchema, TaggingContext,
    TaggingOptions,
};

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE "Post" ("id" INTEGER PRIMARY KEY, "title" TEXT NOT NULL DEFAULT '');
CREATE TABLE "Tag" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "name" TEXT NOT NULL UNIQUE,
    "count" INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE "PostTag" (
    "postId" INTEGER NOT NULL,
    "tagId" INTEGER NOT NULL,
    PRIMARY KEY ("postId", "tagId")
);
"#;

const BOUND_TAGS_SQL: &str = r#"
SELECT t."name" FROM "Tag" t
JOIN "PostTag" et ON t."id" = et."tagId"
WHERE et."postId" = ?
"#;

/// Passes statements through to SQLite and counts them.
pub struct CountingExecutor {
    inner: SqliteExecutor,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingExecutor {
    pub fn inner(&self) -> &SqliteExecutor {
        &self.inner
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl QueryExecutor for CountingExecutor {
    fn scalar(&self, statement: &Statement) -> Result<Option<SqlValue>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.scalar(statement)
    }

    fn column(&self, statement: &Statement) -> Result<Vec<SqlValue>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.column(statement)
    }

    fn rows(&self, statement: &Statement) -> Result<Vec<Row>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.rows(statement)
    }

    fn execute(&self, statement: &Statement) -> Result<u64, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(statement)
    }

    fn last_insert_id(&self) -> Result<i64, StorageError> {
        self.inner.last_insert_id()
    }
}

pub struct Harness {
    pub db: Arc<CountingExecutor>,
    pub cache: Arc<dyn TagCache>,
    pub ctx: TaggingContext,
}

impl Harness {
    /// Post tagging with a memory cache and computed counts.
    pub fn new() -> Self {
        Self::with_options(TaggingOptions::default(), Arc::new(MemoryCache::default()))
    }

    /// Post tagging that maintains the `count` column.
    pub fn counted() -> Self {
        Self::with_options(
            TaggingOptions {
                tag_table_count: Some("count".into()),
                ..Default::default()
            },
            Arc::new(MemoryCache::default()),
        )
    }

    pub fn uncached() -> Self {
        Self::with_options(TaggingOptions::default(), Arc::new(NullCache))
    }

    pub fn with_options(options: TaggingOptions, cache: Arc<dyn TagCache>) -> Self {
        let inner = SqliteExecutor::in_memory().expect("in-memory database");
        inner.execute_script(SCHEMA_SQL).expect("schema");

        let db = Arc::new(CountingExecutor {
            inner,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        });
        let schema = TagSchema::resolve("Post", &options).expect("schema");
        let ctx = TaggingContext::new(schema, db.clone(), cache.clone());

        Self { db, cache, ctx }
    }

    /// Insert a post row and return it as a stored entity.
    pub fn post(&self, id: i64, title: &str) -> EntityRef {
        self.db
            .inner()
            .execute(&Statement {
                sql: r#"INSERT INTO "Post" ("id", "title") VALUES (?, ?)"#.into(),
                params: vec![SqlValue::Integer(id), SqlValue::from(title)],
            })
            .expect("insert post");
        EntityRef::stored("Post", id)
    }

    /// Tag names bound to `id`, read straight from the binding table.
    pub fn bound_tags(&self, id: i64) -> Vec<String> {
        let mut names: Vec<String> = self
            .db
            .inner()
            .column(&Statement {
                sql: BOUND_TAGS_SQL.into(),
                params: vec![SqlValue::Integer(id)],
            })
            .expect("bindings")
            .into_iter()
            .filter_map(SqlValue::into_text)
            .collect();
        names.sort();
        names
    }

    pub fn tag_rows(&self) -> i64 {
        self.db
            .inner()
            .scalar(&Statement {
                sql: r#"SELECT COUNT(*) FROM "Tag""#.into(),
                params: Vec::new(),
            })
            .expect("count")
            .and_then(|value| value.as_i64())
            .unwrap_or_default()
    }

    pub fn tag_and_save(&self, entity: &EntityRef, tags: &[&str]) {
        let mut engine = self.ctx.engine(entity);
        engine.set_tags(tags.iter().copied());
        engine.save().expect("save");
    }
}

pub fn sorted<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
    names.sort();
    names
}
