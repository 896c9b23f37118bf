mod common;

use common::{test_config, MemoryStore, TestPayloads};
use iiif_bench_runner::prelude::*;
use pretty_assertions::assert_eq;

fn step(manifests: u64, canvases: u64) -> Step {
    Step {
        manifests,
        canvases,
    }
}

#[test]
fn full_step_records_every_phase_and_purges() {
    let store = MemoryStore::full_caps();
    let payloads = TestPayloads::default();
    let dir = tempfile::tempdir().unwrap();

    let path = run(
        &store,
        &payloads,
        &[step(8, 4)],
        &test_config(dir.path().to_path_buf()),
    )
    .unwrap()
    .expect("log path");

    let log = BenchmarkLog::load(&path).unwrap();
    assert_eq!(log.results.len(), 1);

    let step_log = &log.results[0];
    for phase in Phase::ALL {
        assert!(
            step_log.duration(phase).is_some(),
            "phase {} should have completed",
            phase
        );
    }
    for operation in [
        "get_annotation_list",
        "get_annotation",
        "insert_manifest",
        "insert_annotation",
        "insert_annotation_list",
        "update_annotation",
    ] {
        assert!(
            step_log.averages.contains_key(operation),
            "missing average for {}",
            operation
        );
    }

    let state = store.state.lock();
    assert_eq!(state.purge_count, 1);
    assert!(state.manifests.is_empty(), "purge should leave no manifests");
    assert!(
        state.annotations.is_empty(),
        "purge should leave no annotations"
    );
    // 8 manifests x 4 canvases at ratio 0.5 -> 16 annotated canvases, but the
    // update benchmark is bounded by the 5 configured iterations.
    assert_eq!(state.update_count, 5);
}

#[test]
fn sampling_matches_rounded_ratio_without_duplicates() {
    // Bulk list inserts only happen during Populate with these capabilities,
    // so the set of list-inserted canvases is exactly the Populate sample.
    let store = MemoryStore::new(Capabilities::default());
    let payloads = TestPayloads::default();
    let dir = tempfile::tempdir().unwrap();

    let mut config = test_config(dir.path().to_path_buf());
    config.sample_ratio = 0.77;

    run(&store, &payloads, &[step(8, 4)], &config).unwrap();

    let state = store.state.lock();
    // round(32 * 0.77) = 25
    assert_eq!(state.list_inserted_canvases.len(), 25);
    assert!(!state.duplicate_list_insert, "a canvas was sampled twice");
}

#[test]
fn bare_count_partitioning_truncates_to_full_chunks() {
    let store = MemoryStore::full_caps();
    let payloads = TestPayloads::default();
    let dir = tempfile::tempdir().unwrap();

    // iterations = 0 keeps the write benchmark from inserting extra
    // manifests, so the purge sees exactly what Populate created.
    let mut config = test_config(dir.path().to_path_buf());
    config.iterations = 0;

    let path = run(&store, &payloads, &[step(10, 2)], &config)
        .unwrap()
        .expect("log path");

    // 10 manifests over 4 workers dispatches 2 * 4 = 8 inserts, not 10.
    // Asserting 8 pins the intentional truncation of bare-count splitting;
    // if this starts failing with 10, the partitioning semantics changed.
    let state = store.state.lock();
    assert_eq!(state.manifests_at_purge, 8);

    let log = BenchmarkLog::load(&path).unwrap();
    let step_log = &log.results[0];
    assert!(step_log.duration(Phase::Populate).is_some());
    assert!(step_log.duration(Phase::Read).is_none());
    assert!(step_log.duration(Phase::Write).is_none());
    assert!(step_log.duration(Phase::Update).is_none());
    assert!(step_log.duration(Phase::Purge).is_some());
}

#[test]
fn failed_populate_still_purges_and_logs_a_partial_step() {
    let store = MemoryStore::full_caps().fail_manifest_inserts();
    let payloads = TestPayloads::default();
    let dir = tempfile::tempdir().unwrap();

    let path = run(
        &store,
        &payloads,
        &[step(8, 4)],
        &test_config(dir.path().to_path_buf()),
    )
    .unwrap()
    .expect("log path");

    let log = BenchmarkLog::load(&path).unwrap();
    assert_eq!(log.results.len(), 1, "the partial step is still recorded");

    let step_log = &log.results[0];
    assert!(step_log.duration(Phase::Populate).is_none());
    assert!(step_log.duration(Phase::Read).is_none());
    assert!(step_log.duration(Phase::Purge).is_some());

    assert_eq!(store.state.lock().purge_count, 1);
}

#[test]
fn item_failures_are_counted_not_propagated() {
    let store = MemoryStore::full_caps().flaky_manifest_inserts();
    let payloads = TestPayloads::default();
    let dir = tempfile::tempdir().unwrap();

    let path = run(
        &store,
        &payloads,
        &[step(8, 4)],
        &test_config(dir.path().to_path_buf()),
    )
    .unwrap()
    .expect("log path");

    let log = BenchmarkLog::load(&path).unwrap();
    let step_log = &log.results[0];

    // Half the Populate inserts failed, but the phase itself completed with
    // the successful half.
    assert!(step_log.duration(Phase::Populate).is_some());
    assert!(step_log.duration(Phase::Read).is_some());
    assert!(step_log.duration(Phase::Purge).is_some());
}
