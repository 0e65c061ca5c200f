mod support;

use std::collections::HashSet;

use metrics_util::debugging::DebuggingRecorder;
use support::Harness;
use taggable::cache::TagCache;
use taggable::infra::telemetry;

#[test]
fn tagging_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    let h = Harness::new();
    let post = h.post(1, "metrics");

    // Miss on load, then a created tag and a written save.
    let mut engine = h.ctx.engine(&post);
    engine.add_tags(["observed"]).expect("add");
    engine.save().expect("save");
    // Nothing changed since the save.
    engine.save().expect("skip");

    // Hit on the entity cache entry written by the save.
    h.ctx.engine(&post).tags().expect("tags");

    // Corrupt entry: counted as a miss, not an error.
    h.cache
        .set("taggable:Post:all", "not json".into())
        .expect("raw set");
    h.ctx.reader().all_tags().expect("all");

    let snapshot = snapshotter.snapshot().into_vec();
    let names: HashSet<String> = snapshot
        .iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for metric in [
        "taggable_cache_hit_total",
        "taggable_cache_miss_total",
        "taggable_tags_created_total",
        "taggable_saves_total",
    ] {
        assert!(names.contains(metric), "missing metric: {metric}");
    }

    let outcomes: HashSet<String> = snapshot
        .iter()
        .filter(|(composite_key, _, _, _)| composite_key.key().name() == "taggable_saves_total")
        .flat_map(|(composite_key, _, _, _)| {
            composite_key
                .key()
                .labels()
                .filter(|label| label.key() == "outcome")
                .map(|label| label.value().to_string())
                .collect::<Vec<_>>()
        })
        .collect();
    assert_eq!(
        outcomes,
        HashSet::from(["written".to_string(), "skipped".to_string()])
    );
}
