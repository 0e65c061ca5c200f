mod support;

use std::sync::Arc;

use support::{Harness, sorted};
use taggable::cache::{CacheError, NullCache, TagCache};
use taggable::{
    EntityRef, QueryExecutor, SaveOutcome, SqlFragment, StorageError, TagFactory, TagSchema,
    TaggingError, TaggingOptions,
};

fn strict_harness() -> Harness {
    Harness::with_options(
        TaggingOptions {
            create_tags_automatically: Some(false),
            ..Default::default()
        },
        Arc::new(NullCache),
    )
}

#[test]
fn duplicate_and_padded_names_collapse() {
    let h = Harness::new();
    let post = h.post(1, "first");

    let mut engine = h.ctx.engine(&post);
    engine.set_tags(["a", "a", " a "]);
    assert_eq!(engine.tags().expect("tags"), ["a"]);

    engine.save().expect("save");
    assert_eq!(h.bound_tags(1), ["a"]);
}

#[test]
fn saved_tags_round_trip_through_storage() {
    let h = Harness::uncached();
    let post = h.post(1, "first");

    let mut engine = h.ctx.engine(&post);
    engine.set_tag_list("rust, sql, cache");
    assert_eq!(engine.save().expect("save"), SaveOutcome::Written);

    let mut reloaded = h.ctx.engine(&post);
    assert_eq!(
        sorted(reloaded.tags().expect("tags").to_vec()),
        sorted(["cache", "rust", "sql"])
    );
    assert!(reloaded.has_tags(["sql", " rust"]).expect("has"));
    assert!(!reloaded.has_tags(["sql", "go"]).expect("has"));
}

#[test]
fn unchanged_tag_set_issues_no_writes() {
    let h = Harness::new();
    let post = h.post(1, "first");
    h.tag_and_save(&post, &["red", "blue"]);

    let mut engine = h.ctx.engine(&post);
    engine.add_tags(["green"]).expect("add");
    engine.remove_tags(["green"]).expect("remove");

    let writes = h.db.writes();
    assert_eq!(engine.save().expect("save"), SaveOutcome::Skipped);
    assert_eq!(h.db.writes(), writes);

    // A second save right after a written one is also a no-op.
    engine.add_tags(["green"]).expect("add");
    assert_eq!(engine.save().expect("save"), SaveOutcome::Written);
    let writes = h.db.writes();
    assert_eq!(engine.save().expect("save"), SaveOutcome::Skipped);
    assert_eq!(h.db.writes(), writes);
}

#[test]
fn retained_tags_are_rebound_without_conflicts() {
    let h = Harness::new();
    let post = h.post(1, "first");
    h.tag_and_save(&post, &["a", "b"]);

    let mut engine = h.ctx.engine(&post);
    engine.set_tags(["b", "c"]);
    engine.save().expect("save");

    assert_eq!(h.bound_tags(1), ["b", "c"]);
    assert_eq!(h.tag_rows(), 3);
}

#[test]
fn existing_tags_are_reused() {
    let h = Harness::new();
    let first = h.post(1, "first");
    let second = h.post(2, "second");

    h.tag_and_save(&first, &["red"]);
    h.tag_and_save(&second, &["red"]);

    assert_eq!(h.tag_rows(), 1);
    assert_eq!(h.bound_tags(2), ["red"]);
}

#[test]
fn strict_mode_rejects_unknown_tags_before_writing() {
    let h = strict_harness();
    let post = h.post(1, "first");

    let mut engine = h.ctx.engine(&post);
    engine.set_tags(["nonexistent"]);
    let err = engine.save().expect_err("unknown tag");

    match err {
        TaggingError::UnknownTag { name } => assert_eq!(name, "nonexistent"),
        other => panic!("expected an unknown tag error, got {other:?}"),
    }
    assert_eq!(h.db.writes(), 0);
    assert!(h.bound_tags(1).is_empty());
    assert_eq!(h.tag_rows(), 0);
}

#[test]
fn strict_mode_accepts_existing_tags() {
    let h = strict_harness();
    h.db
        .inner()
        .execute_script(r#"INSERT INTO "Tag" ("name") VALUES ('known');"#)
        .expect("seed tag");
    let post = h.post(1, "first");

    let mut engine = h.ctx.engine(&post);
    engine.set_tags(["known"]);
    engine.save().expect("save");
    assert_eq!(h.bound_tags(1), ["known"]);
}

#[test]
fn new_records_only_insert() {
    let h = Harness::new();
    h.post(5, "fresh");

    let mut engine = h.ctx.engine(EntityRef::inserted("Post", 5));
    engine.set_tags(Vec::<String>::new());
    assert_eq!(engine.save().expect("save"), SaveOutcome::Skipped);

    engine.set_tags(["x", "y"]);
    assert_eq!(engine.save().expect("save"), SaveOutcome::Written);
    assert_eq!(h.bound_tags(5), ["x", "y"]);

    engine.entity_mut().mark_persisted();
    engine.remove_tags(["x"]).expect("remove");
    engine.save().expect("save");
    assert_eq!(h.bound_tags(5), ["y"]);
}

#[test]
fn clearing_tags_removes_every_binding() {
    let h = Harness::new();
    let post = h.post(1, "first");
    h.tag_and_save(&post, &["a", "b"]);

    let mut engine = h.ctx.engine(&post);
    engine.remove_all_tags().expect("clear");
    assert_eq!(engine.save().expect("save"), SaveOutcome::Written);

    assert!(h.bound_tags(1).is_empty());
    assert_eq!(h.tag_rows(), 2);
}

#[test]
fn delete_drops_bindings_and_cached_tags() {
    let h = Harness::new();
    let post = h.post(1, "first");
    h.tag_and_save(&post, &["a", "b"]);

    let mut engine = h.ctx.engine(&post);
    engine.delete().expect("delete");
    assert!(h.bound_tags(1).is_empty());
    assert!(engine.tags().expect("tags").is_empty());

    let mut fresh = h.ctx.engine(&post);
    assert!(fresh.tags().expect("tags").is_empty());
}

#[test]
fn save_writes_through_to_the_entity_cache() {
    let h = Harness::new();
    let post = h.post(1, "first");
    h.tag_and_save(&post, &["red", "blue"]);

    let reads = h.db.reads();
    let mut engine = h.ctx.engine(&post);
    assert_eq!(engine.tags().expect("tags"), ["red", "blue"]);
    assert_eq!(h.db.reads(), reads);
}

#[test]
fn failed_transaction_leaves_no_bindings() {
    let h = Harness::new();
    let post = h.post(1, "first");

    let result: Result<(), TaggingError> = h.db.inner().transaction(|_| {
        let mut engine = h.ctx.engine(&post);
        engine.set_tags(["a", "b"]);
        engine.save()?;
        Err(TaggingError::from(StorageError::query("update failed")))
    });

    assert!(result.is_err());
    assert!(h.bound_tags(1).is_empty());
    assert_eq!(h.tag_rows(), 0);
}

#[test]
fn entity_of_another_table_is_rejected() {
    let h = Harness::new();
    h.post(1, "first");

    let mut engine = h.ctx.engine(EntityRef::stored("Comment", 1));
    engine.set_tags(["red"]);
    let err = engine.save().expect_err("foreign table");

    assert!(matches!(err, TaggingError::EntityMismatch { .. }));
    let err = engine.delete().expect_err("foreign table");
    assert!(matches!(err, TaggingError::EntityMismatch { .. }));
    assert_eq!(h.db.writes(), 0);
    assert!(h.bound_tags(1).is_empty());
}

#[test]
fn engine_writes_only_its_own_entity() {
    let h = Harness::new();
    let first = h.post(1, "first");
    let second = h.post(2, "second");
    h.tag_and_save(&first, &["a"]);

    let mut engine = h.ctx.engine(&first);
    engine.add_tags(["b"]).expect("add");
    let mut other = h.ctx.engine(&second);
    other.add_tags(["c"]).expect("add");

    other.save().expect("save");
    engine.save().expect("save");

    assert_eq!(h.bound_tags(1), ["a", "b"]);
    assert_eq!(h.bound_tags(2), ["c"]);
    assert_eq!(engine.entity().id, Some(1));
}

struct BrokenCache;

impl TagCache for BrokenCache {
    fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    fn set(&self, _key: &str, _value: String) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }
}

#[test]
fn unavailable_cache_falls_back_to_storage() {
    let h = Harness::with_options(TaggingOptions::default(), Arc::new(BrokenCache));
    let post = h.post(1, "first");
    h.tag_and_save(&post, &["red"]);

    let mut engine = h.ctx.engine(&post);
    assert_eq!(engine.tags().expect("tags"), ["red"]);
    assert_eq!(h.ctx.reader().all_tags().expect("all"), ["red"]);
}

#[test]
fn custom_factory_creates_tags() {
    struct PrefixedFactory;

    impl TagFactory for PrefixedFactory {
        fn create_tag(
            &self,
            db: &dyn QueryExecutor,
            schema: &TagSchema,
            name: &str,
        ) -> Result<i64, StorageError> {
            let id = 100 + name.len() as i64;
            let mut insert = SqlFragment::sql("INSERT INTO ");
            insert
                .push_ident(schema.tag_table())
                .push(" (")
                .push_ident("id")
                .push(", ")
                .push_ident(schema.tag_name())
                .push(") VALUES (")
                .push_bind(id)
                .push(", ")
                .push_bind(name)
                .push(")");
            db.execute(&insert.build(schema.placeholders()))?;
            Ok(id)
        }
    }

    let h = Harness::new();
    let ctx = h.ctx.clone().with_factory(Arc::new(PrefixedFactory));
    let post = h.post(1, "first");

    let mut engine = ctx.engine(&post);
    engine.set_tags(["abc"]);
    engine.save().expect("save");

    assert_eq!(ctx.find_tag_id("abc").expect("lookup"), Some(103));
    assert_eq!(h.bound_tags(1), ["abc"]);
}

#[test]
fn unsaved_entity_cannot_be_saved() {
    let h = Harness::new();
    let mut engine = h.ctx.engine(EntityRef::unsaved("Post"));
    engine.set_tags(["a"]);

    let err = engine.save().expect_err("no primary key");
    assert!(matches!(err, TaggingError::MissingPrimaryKey { .. }));
}
