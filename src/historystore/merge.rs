use crate::consts::DEFAULT_LOCK_TIMEOUT_MS;
use crate::exceptions::BenchError;
use crate::historystore::lock::StoreLock;
use crate::historystore::store::{AppendOutcome, HistoryStore, PrunePolicy, PrunedRun, short_id};
use crate::models::RunRecord;
use crate::validation::validate_run;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{info, warn};

/// Serializes every mutation of one store file behind its lock:
/// lock, reload, change, atomic write, unlock.
#[derive(Debug, Clone)]
pub struct Merger {
    path: PathBuf,
    lock_timeout: Duration,
    repo_url: Option<String>,
}

/// The outcome together with the store exactly as it was written, for
/// callers that need to read their own write.
#[derive(Debug)]
pub struct MergeResult {
    pub outcome: AppendOutcome,
    pub store: HistoryStore,
}

impl Merger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
            repo_url: None,
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn with_repo_url(mut self, repo_url: Option<String>) -> Self {
        self.repo_url = repo_url;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records `run` under `group`. Invalid runs are rejected before the lock is taken.
    pub fn append(&self, group: &str, run: RunRecord) -> Result<MergeResult, BenchError> {
        validate_run(group, &run)?;

        let commit_id = run.commit.id.clone();
        let tool = run.tool.clone();

        let _lock = StoreLock::acquire(&self.path, self.lock_timeout)?;
        let mut store = HistoryStore::open(&self.path)?;
        let outcome = store.append(group, run);

        if !outcome.is_changed() {
            info!(
                group,
                commit = short_id(&commit_id),
                tool = %tool,
                "run already recorded, store left untouched"
            );
            return Ok(MergeResult { outcome, store });
        }

        match &outcome {
            AppendOutcome::Unchanged => {}
            AppendOutcome::Inserted { position } => {
                info!(
                    group,
                    commit = short_id(&commit_id),
                    tool = %tool,
                    position,
                    "run recorded"
                );
            }
            AppendOutcome::Replaced { position, warning } => {
                warn!(position, "{}", warning);
            }
        }

        self.apply_repo_url(&mut store);
        store.touch(OffsetDateTime::now_utc());
        store.save()?;

        Ok(MergeResult { outcome, store })
    }

    /// Applies a retention policy under the lock. Writes only when something was removed.
    pub fn prune(&self, policy: &PrunePolicy, now: OffsetDateTime) -> Result<Vec<PrunedRun>, BenchError> {
        let _lock = StoreLock::acquire(&self.path, self.lock_timeout)?;
        let mut store = HistoryStore::open(&self.path)?;
        let removed = store.prune(policy, now);

        for run in &removed {
            info!(
                group = %run.group,
                commit = short_id(&run.commit_id),
                tool = %run.tool,
                recorded_at = %run.recorded_at,
                "pruned run"
            );
        }

        if !removed.is_empty() {
            store.touch(now);
            store.save()?;
        }

        Ok(removed)
    }

    fn apply_repo_url(&self, store: &mut HistoryStore) {
        let Some(url) = self.repo_url.as_deref() else {
            return;
        };
        if store.repo_url().is_empty() {
            store.set_repo_url(url);
        } else if store.repo_url() != url {
            warn!(
                stored = store.repo_url(),
                configured = url,
                "store belongs to a different repository URL; keeping the stored one"
            );
        }
    }
}
