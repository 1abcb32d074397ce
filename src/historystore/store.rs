use crate::exceptions::BenchError;
use crate::export::{self, Format};
use crate::fs::{atomic_write_text, read_text_if_exists};
use crate::historystore::series::BenchmarkSeries;
use crate::models::{BenchmarkData, RunRecord};
use serde::Serialize;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// A commit was resubmitted by the same tool with a different measurement set.
/// The later submission is kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictWarning {
    pub group: String,
    pub commit_id: String,
    pub tool: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

impl ConflictWarning {
    fn between(group: &str, previous: &RunRecord, next: &RunRecord) -> Self {
        let added = next
            .benches
            .iter()
            .filter(|b| previous.bench(&b.name).is_none())
            .map(|b| b.name.clone())
            .collect();
        let removed = previous
            .benches
            .iter()
            .filter(|b| next.bench(&b.name).is_none())
            .map(|b| b.name.clone())
            .collect();
        let changed = next
            .benches
            .iter()
            .filter(|b| previous.bench(&b.name).is_some_and(|p| !p.same_reading(b)))
            .map(|b| b.name.clone())
            .collect();

        Self {
            group: group.to_string(),
            commit_id: next.commit.id.clone(),
            tool: next.tool.clone(),
            added,
            removed,
            changed,
        }
    }
}

impl std::fmt::Display for ConflictWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "commit {} ({}) in '{}' was resubmitted with different measurements; keeping the latest submission",
            short_id(&self.commit_id),
            self.tool,
            self.group
        )?;
        for (label, names) in [
            ("added", &self.added),
            ("removed", &self.removed),
            ("changed", &self.changed),
        ] {
            if !names.is_empty() {
                write!(f, " [{}: {}]", label, names.join(", "))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AppendOutcome {
    Inserted { position: usize },
    /// The identical run is already recorded.
    Unchanged,
    Replaced {
        position: usize,
        warning: ConflictWarning,
    },
}

impl AppendOutcome {
    pub fn conflict(&self) -> Option<&ConflictWarning> {
        match self {
            AppendOutcome::Replaced { warning, .. } => Some(warning),
            _ => None,
        }
    }

    pub fn is_changed(&self) -> bool {
        !matches!(self, AppendOutcome::Unchanged)
    }
}

/// Retention rules for `prune`. Unset rules remove nothing.
#[derive(Debug, Clone, Default)]
pub struct PrunePolicy {
    pub max_age: Option<time::Duration>,
    /// Newest runs to keep per group.
    pub max_count: Option<usize>,
}

impl PrunePolicy {
    pub fn is_empty(&self) -> bool {
        self.max_age.is_none() && self.max_count.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrunedRun {
    pub group: String,
    pub commit_id: String,
    pub tool: String,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

/// The benchmark history document bound to its file.
///
/// Runs inside every group are kept ascending by `recorded_at`.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    format: Format,
    data: BenchmarkData,
}

impl HistoryStore {
    /// Loads the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BenchError> {
        let path = path.into();
        let format = Format::from_path(&path);

        let mut data = match read_text_if_exists(&path)? {
            None => {
                debug!(path = %path.display(), "no store file yet, starting empty");
                BenchmarkData::empty("")
            }
            Some(text) if text.trim().is_empty() => {
                warn!(path = %path.display(), "store file is empty, treating it as a new store");
                BenchmarkData::empty("")
            }
            Some(text) => export::decode(&text).map_err(|e| match e {
                BenchError::Schema(msg) => BenchError::Schema(format!(
                    "{} could not be read ({}). Refusing to modify it; repair or move the file first.",
                    path.display(),
                    msg
                )),
                other => other,
            })?,
        };

        for (group, runs) in data.entries.iter_mut() {
            if !runs.is_sorted_by_key(|r| r.recorded_at) {
                warn!(group = %group, "runs were stored out of order; reordering by date");
                runs.sort_by_key(|r| r.recorded_at);
            }
        }

        debug!(
            path = %path.display(),
            groups = data.entries.len(),
            "store loaded"
        );

        Ok(Self { path, format, data })
    }

    /// A store that has not been read from disk; `save` writes it to `path`.
    pub fn from_data(path: impl Into<PathBuf>, data: BenchmarkData) -> Self {
        let path = path.into();
        let format = Format::from_path(&path);
        Self { path, format, data }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn data(&self) -> &BenchmarkData {
        &self.data
    }

    pub fn into_data(self) -> BenchmarkData {
        self.data
    }

    pub fn repo_url(&self) -> &str {
        self.data.repo_url.as_deref().unwrap_or_default()
    }

    pub fn set_repo_url(&mut self, repo_url: impl Into<String>) {
        self.data.repo_url = Some(repo_url.into());
    }

    /// The Unix epoch for a store that has never been stamped.
    pub fn last_update(&self) -> OffsetDateTime {
        self.data.last_update.unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    pub fn touch(&mut self, now: OffsetDateTime) {
        self.data.last_update = Some(now);
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.data.entries.keys().map(String::as_str)
    }

    pub fn runs(&self, group: &str) -> &[RunRecord] {
        self.data
            .entries
            .get(group)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total runs across all groups.
    pub fn len(&self) -> usize {
        self.data.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn commit_exists(&self, commit_id: &str) -> bool {
        self.data
            .entries
            .values()
            .flatten()
            .any(|r| r.commit.id.eq_ignore_ascii_case(commit_id))
    }

    /// Latest run of `commit_id` in `group`, optionally restricted to one tool.
    pub fn find_run(
        &self,
        group: &str,
        commit_id: &str,
        tool: Option<&str>,
    ) -> Option<(usize, &RunRecord)> {
        self.runs(group).iter().enumerate().rev().find(|(_, r)| {
            r.commit.id.eq_ignore_ascii_case(commit_id) && tool.is_none_or(|t| r.tool == t)
        })
    }

    pub fn series(&self, group: &str, name: &str) -> BenchmarkSeries<'_> {
        BenchmarkSeries::build(self.runs(group), name)
    }

    /// Distinct benchmark names in a group, in first-seen order.
    pub fn benchmark_names(&self, group: &str) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for bench in self.runs(group).iter().flat_map(|r| &r.benches) {
            if !names.contains(&bench.name.as_str()) {
                names.push(&bench.name);
            }
        }
        names
    }

    /// Inserts `run` at its chronological position within `group`.
    ///
    /// Resubmitting an identical run (same commit, tool and measurements) is a
    /// no-op. A divergent resubmission replaces the latest earlier one.
    pub fn append(&mut self, group: &str, run: RunRecord) -> AppendOutcome {
        let runs = self.data.entries.entry(group.to_string()).or_default();

        if runs.iter().any(|r| {
            r.is_same_submission(&run.commit.id, &run.tool) && r.same_measurements(&run)
        }) {
            return AppendOutcome::Unchanged;
        }

        let mut warning = None;
        if let Some(idx) = runs
            .iter()
            .rposition(|r| r.is_same_submission(&run.commit.id, &run.tool))
        {
            let replaced = runs.remove(idx);
            warning = Some(ConflictWarning::between(group, &replaced, &run));
        }

        let position = runs.partition_point(|r| r.recorded_at <= run.recorded_at);
        runs.insert(position, run);

        match warning {
            Some(warning) => AppendOutcome::Replaced { position, warning },
            None => AppendOutcome::Inserted { position },
        }
    }

    /// Removes runs outside the retention policy and returns what was removed.
    /// Groups are kept even when emptied so published group keys stay valid.
    pub fn prune(&mut self, policy: &PrunePolicy, now: OffsetDateTime) -> Vec<PrunedRun> {
        let cutoff = policy.max_age.map(|age| now - age);
        let mut removed = Vec::new();

        for (group, runs) in self.data.entries.iter_mut() {
            let excess = policy
                .max_count
                .map_or(0, |max| runs.len().saturating_sub(max));
            let mut index = 0;

            runs.retain(|run| {
                let too_old = cutoff.is_some_and(|c| run.recorded_at < c);
                let over_count = index < excess;
                index += 1;

                if too_old || over_count {
                    removed.push(PrunedRun {
                        group: group.clone(),
                        commit_id: run.commit.id.clone(),
                        tool: run.tool.clone(),
                        recorded_at: run.recorded_at,
                    });
                    false
                } else {
                    true
                }
            });
        }

        removed
    }

    /// Writes the whole document through an atomic replace.
    pub fn save(&self) -> Result<(), BenchError> {
        let text = export::encode(&self.data, self.format)?;
        atomic_write_text(&self.path, &text)?;
        info!(path = %self.path.display(), runs = self.len(), "store saved");
        Ok(())
    }
}

pub fn short_id(commit_id: &str) -> &str {
    commit_id.get(..7).unwrap_or(commit_id)
}
