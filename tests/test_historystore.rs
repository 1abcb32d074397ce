mod common;
use benchtrail::exceptions::BenchError;
use benchtrail::historystore::store::{AppendOutcome, HistoryStore, PrunePolicy};
use common::{at, make_run, sha};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_open_missing_file_is_empty_store() {
    let temp = tempdir().unwrap();

    // GIVEN a path that does not exist
    let path = temp.path().join("dev/bench/data.js");

    // WHEN opened
    let store = HistoryStore::open(&path).unwrap();

    // THEN the store is empty and nothing was created on disk
    assert!(store.is_empty());
    assert_eq!(store.groups().count(), 0);
    assert!(!path.exists());
}

#[test]
fn test_open_blank_file_is_empty_store() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("data.json");
    fs::write(&path, "  \n").unwrap();

    let store = HistoryStore::open(&path).unwrap();

    assert!(store.is_empty());
}

#[test]
fn test_first_run_creates_group_and_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("dev/bench/data.js");

    // GIVEN an empty store
    let mut store = HistoryStore::open(&path).unwrap();

    // WHEN the first run is appended and saved
    let outcome = store.append("Suite", make_run(&sha(1), 0, &[("parse", 500_000.0, 2_000.0)]));
    store.save().unwrap();

    // THEN it lands at position 0 of a new group
    assert_eq!(outcome, AppendOutcome::Inserted { position: 0 });

    // AND the file is written in script form and reads back
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("window.BENCHMARK_DATA = {"));
    let reopened = HistoryStore::open(&path).unwrap();
    assert_eq!(reopened.runs("Suite").len(), 1);
    assert_eq!(reopened.runs("Suite")[0].commit.id, sha(1));
}

#[test]
fn test_runs_stay_ordered_when_submitted_out_of_order() {
    let temp = tempdir().unwrap();
    let mut store = HistoryStore::open(temp.path().join("data.json")).unwrap();

    // GIVEN runs at t=0 and t=20
    store.append("Suite", make_run(&sha(1), 0, &[("a", 1.0, 0.0)]));
    store.append("Suite", make_run(&sha(3), 20, &[("a", 3.0, 0.0)]));

    // WHEN a run recorded at t=10 arrives late
    let outcome = store.append("Suite", make_run(&sha(2), 10, &[("a", 2.0, 0.0)]));

    // THEN it is inserted between them
    assert_eq!(outcome, AppendOutcome::Inserted { position: 1 });
    let ids: Vec<_> = store.runs("Suite").iter().map(|r| r.commit.id.clone()).collect();
    assert_eq!(ids, vec![sha(1), sha(2), sha(3)]);
}

#[test]
fn test_equal_timestamps_keep_arrival_order() {
    let temp = tempdir().unwrap();
    let mut store = HistoryStore::open(temp.path().join("data.json")).unwrap();

    store.append("Suite", make_run(&sha(1), 5, &[("a", 1.0, 0.0)]));
    let outcome = store.append("Suite", make_run(&sha(2), 5, &[("a", 2.0, 0.0)]));

    assert_eq!(outcome, AppendOutcome::Inserted { position: 1 });
    assert_eq!(store.runs("Suite")[1].commit.id, sha(2));
}

#[test]
fn test_identical_resubmission_is_a_noop() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("data.js");
    let run = make_run(&sha(1), 0, &[("a", 100.0, 1.0), ("b", 200.0, 2.0)]);

    // GIVEN a saved store holding one run
    let mut store = HistoryStore::open(&path).unwrap();
    store.append("Suite", run.clone());
    store.save().unwrap();
    let before = fs::read(&path).unwrap();

    // WHEN the same run is submitted again, later and with benches reordered
    let mut again = run.clone();
    again.recorded_at = at(60);
    again.benches.reverse();
    let mut store = HistoryStore::open(&path).unwrap();
    let outcome = store.append("Suite", again);

    // THEN nothing changes
    assert_eq!(outcome, AppendOutcome::Unchanged);
    assert!(!outcome.is_changed());
    assert_eq!(store.runs("Suite").len(), 1);
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_commit_id_comparison_ignores_case() {
    let temp = tempdir().unwrap();
    let mut store = HistoryStore::open(temp.path().join("data.json")).unwrap();
    let id = "ABCDEF0123456789ABCDEF0123456789ABCDEF01";

    store.append("Suite", make_run(id, 0, &[("a", 1.0, 0.0)]));
    let outcome = store.append(
        "Suite",
        make_run(&id.to_ascii_lowercase(), 0, &[("a", 1.0, 0.0)]),
    );

    assert_eq!(outcome, AppendOutcome::Unchanged);
    assert!(store.commit_exists(&id.to_ascii_lowercase()));
}

#[test]
fn test_divergent_resubmission_replaces_and_warns() {
    let temp = tempdir().unwrap();
    let mut store = HistoryStore::open(temp.path().join("data.json")).unwrap();

    // GIVEN a commit recorded with two benchmarks
    store.append("Suite", make_run(&sha(1), 0, &[("a", 100.0, 1.0), ("b", 50.0, 1.0)]));
    store.append("Suite", make_run(&sha(2), 10, &[("a", 100.0, 1.0)]));

    // WHEN the first commit is resubmitted with a changed and an added benchmark
    let outcome = store.append(
        "Suite",
        make_run(&sha(1), 20, &[("a", 120.0, 1.0), ("c", 7.0, 0.0)]),
    );

    // THEN the earlier submission is replaced by the new one, at its new position
    let AppendOutcome::Replaced { position, warning } = &outcome else {
        panic!("expected a replacement, got {:?}", outcome);
    };
    assert_eq!(*position, 1);
    assert_eq!(store.runs("Suite").len(), 2);
    assert_eq!(store.runs("Suite")[1].commit.id, sha(1));

    // AND the warning names the differences
    assert_eq!(warning.added, vec!["c"]);
    assert_eq!(warning.removed, vec!["b"]);
    assert_eq!(warning.changed, vec!["a"]);
    assert!(warning.to_string().contains("resubmitted"));
}

#[test]
fn test_same_commit_from_another_tool_is_a_separate_run() {
    let temp = tempdir().unwrap();
    let mut store = HistoryStore::open(temp.path().join("data.json")).unwrap();

    store.append("Suite", make_run(&sha(1), 0, &[("a", 1.0, 0.0)]));
    let mut other = make_run(&sha(1), 1, &[("a", 5.0, 0.0)]);
    other.tool = "customSmallerIsBetter".into();
    let outcome = store.append("Suite", other);

    assert_eq!(outcome, AppendOutcome::Inserted { position: 1 });
    assert_eq!(store.runs("Suite").len(), 2);
    assert_eq!(
        store.find_run("Suite", &sha(1), Some("cargo")).map(|(i, _)| i),
        Some(0)
    );
    assert_eq!(store.find_run("Suite", &sha(1), None).map(|(i, _)| i), Some(1));
}

#[test]
fn test_groups_are_independent() {
    let temp = tempdir().unwrap();
    let mut store = HistoryStore::open(temp.path().join("data.json")).unwrap();

    store.append("Suite A", make_run(&sha(1), 0, &[("a", 1.0, 0.0)]));
    store.append("Suite B", make_run(&sha(1), 0, &[("a", 2.0, 0.0)]));

    assert_eq!(store.groups().collect::<Vec<_>>(), vec!["Suite A", "Suite B"]);
    assert_eq!(store.runs("Suite A")[0].benches[0].value, 1.0);
    assert_eq!(store.runs("Suite B")[0].benches[0].value, 2.0);
    assert!(store.runs("Suite C").is_empty());
}

#[test]
fn test_commit_exists_across_groups() {
    let temp = tempdir().unwrap();
    let mut store = HistoryStore::open(temp.path().join("data.json")).unwrap();

    store.append("Suite B", make_run(&sha(7), 0, &[("a", 1.0, 0.0)]));

    assert!(store.commit_exists(&sha(7)));
    assert!(!store.commit_exists(&sha(8)));
}

#[test]
fn test_series_skips_runs_without_the_benchmark() {
    let temp = tempdir().unwrap();
    let mut store = HistoryStore::open(temp.path().join("data.json")).unwrap();

    store.append("Suite", make_run(&sha(1), 0, &[("a", 1.0, 0.0), ("b", 10.0, 0.0)]));
    store.append("Suite", make_run(&sha(2), 10, &[("a", 2.0, 0.0)]));
    store.append("Suite", make_run(&sha(3), 20, &[("a", 3.0, 0.0), ("b", 30.0, 0.0)]));

    let series = store.series("Suite", "b");
    let values: Vec<f64> = series.points().iter().map(|p| p.measurement.value).collect();

    assert_eq!(series.name(), "b");
    assert_eq!(values, vec![10.0, 30.0]);
    assert_eq!(series.latest().unwrap().run.commit.id, sha(3));
    assert_eq!(store.benchmark_names("Suite"), vec!["a", "b"]);
    assert!(store.series("Suite", "missing").is_empty());
}

#[test]
fn test_unreadable_store_is_refused() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("data.js");

    // GIVEN a store file that is not a history document
    fs::write(&path, "window.BENCHMARK_DATA = {\"entries\": [1, 2]}").unwrap();

    // WHEN opened
    let err = HistoryStore::open(&path).unwrap_err();

    // THEN it is a schema error and the file is untouched
    assert!(matches!(err, BenchError::Schema(_)));
    assert_eq!(err.exit_code(), 65);
    assert!(err.to_string().contains("Refusing to modify"));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "window.BENCHMARK_DATA = {\"entries\": [1, 2]}"
    );
}

#[test]
fn test_unsorted_legacy_group_is_reordered_on_open() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("data.json");

    // GIVEN a document whose runs are out of order
    let mut store = HistoryStore::open(&path).unwrap();
    store.append("Suite", make_run(&sha(1), 0, &[("a", 1.0, 0.0)]));
    store.append("Suite", make_run(&sha(2), 10, &[("a", 2.0, 0.0)]));
    let mut data = store.into_data();
    data.entries.get_mut("Suite").unwrap().reverse();
    HistoryStore::from_data(&path, data).save().unwrap();

    // WHEN opened
    let store = HistoryStore::open(&path).unwrap();

    // THEN runs come back ascending by date
    assert_eq!(store.runs("Suite")[0].commit.id, sha(1));
    assert_eq!(store.runs("Suite")[1].commit.id, sha(2));
}

#[cfg(unix)]
#[test]
fn test_save_keeps_existing_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempdir().unwrap();
    let path = temp.path().join("data.js");

    let mut store = HistoryStore::open(&path).unwrap();
    store.append("Suite", make_run(&sha(1), 0, &[("a", 1.0, 0.0)]));
    store.save().unwrap();
    assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o644);

    // GIVEN the file was made group-writable
    fs::set_permissions(&path, fs::Permissions::from_mode(0o664)).unwrap();

    // WHEN the store is saved again
    let mut store = HistoryStore::open(&path).unwrap();
    store.append("Suite", make_run(&sha(2), 10, &[("a", 1.0, 0.0)]));
    store.save().unwrap();

    // THEN the mode survives the atomic replace
    assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o664);
}

#[test]
fn test_prune_by_count_keeps_newest_runs() {
    let temp = tempdir().unwrap();
    let mut store = HistoryStore::open(temp.path().join("data.json")).unwrap();
    for i in 0..5 {
        store.append("Suite", make_run(&sha(i), i as i64 * 10, &[("a", 1.0, 0.0)]));
    }

    let removed = store.prune(
        &PrunePolicy {
            max_age: None,
            max_count: Some(2),
        },
        at(100),
    );

    assert_eq!(removed.len(), 3);
    assert_eq!(removed[0].commit_id, sha(0));
    let ids: Vec<_> = store.runs("Suite").iter().map(|r| r.commit.id.clone()).collect();
    assert_eq!(ids, vec![sha(3), sha(4)]);
}

#[test]
fn test_prune_by_age_keeps_emptied_group() {
    let temp = tempdir().unwrap();
    let mut store = HistoryStore::open(temp.path().join("data.json")).unwrap();
    store.append("Old", make_run(&sha(1), 0, &[("a", 1.0, 0.0)]));
    store.append("Fresh", make_run(&sha(2), 3_600, &[("a", 1.0, 0.0)]));

    // WHEN runs older than 30 minutes before t=1h are pruned
    let removed = store.prune(
        &PrunePolicy {
            max_age: Some(time::Duration::minutes(30)),
            max_count: None,
        },
        at(3_600),
    );

    // THEN only the old run goes and its group remains
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].group, "Old");
    assert!(store.runs("Old").is_empty());
    assert_eq!(store.groups().count(), 2);
    assert_eq!(store.runs("Fresh").len(), 1);
}

#[test]
fn test_empty_prune_policy_removes_nothing() {
    let temp = tempdir().unwrap();
    let mut store = HistoryStore::open(temp.path().join("data.json")).unwrap();
    store.append("Suite", make_run(&sha(1), 0, &[("a", 1.0, 0.0)]));

    let policy = PrunePolicy::default();

    assert!(policy.is_empty());
    assert!(store.prune(&policy, at(1_000_000)).is_empty());
    assert_eq!(store.len(), 1);
}
