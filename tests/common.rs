use benchtrail::models::{Commit, CommitTime, Extensions, Measurement, Person, RunRecord};
use std::path::Path;
use time::OffsetDateTime;

/// A deterministic 40-character hex commit id derived from `seed`.
#[allow(dead_code)]
pub fn sha(seed: u32) -> String {
    format!("{:08x}", seed).repeat(5)
}

#[allow(dead_code)]
pub fn at(seconds: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_700_000_000 + seconds).unwrap()
}

#[allow(dead_code)]
pub fn make_commit(id: &str) -> Commit {
    let person = Person {
        email: Some(Some("dev@example.com".into())),
        name: Some(Some("Dev".into())),
        username: Some(Some("dev".into())),
        extra: Extensions::new(),
    };
    Commit {
        author: person.clone(),
        committer: person,
        distinct: Some(Some(true)),
        id: id.to_string(),
        message: Some(Some(format!("commit {}", id))),
        timestamp: CommitTime::new(at(0)).unwrap(),
        tree_id: None,
        url: Some(Some(format!("https://example.com/repo/commit/{}", id))),
        extra: Extensions::new(),
    }
}

/// A cargo run recorded at `at(seconds)` with `(name, value, variability)` readings in ns/iter.
#[allow(dead_code)]
pub fn make_run(commit_id: &str, seconds: i64, benches: &[(&str, f64, f64)]) -> RunRecord {
    make_run_with(commit_id, seconds, "cargo", "ns/iter", benches)
}

#[allow(dead_code)]
pub fn make_run_with(
    commit_id: &str,
    seconds: i64,
    tool: &str,
    unit: &str,
    benches: &[(&str, f64, f64)],
) -> RunRecord {
    RunRecord {
        commit: make_commit(commit_id),
        recorded_at: at(seconds),
        tool: tool.to_string(),
        benches: benches
            .iter()
            .map(|(name, value, variability)| Measurement::new(*name, *value, *variability, unit))
            .collect(),
        extra: Extensions::new(),
    }
}

/// Writes a run document as `benchtrail ingest --run` expects it.
#[allow(dead_code)]
pub fn write_run_file(dir: &Path, file_name: &str, run: &RunRecord) -> std::path::PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, serde_json::to_string_pretty(run).unwrap()).unwrap();
    path
}
