use super::{CommandStatus, status_for};
use crate::config::Config;
use crate::console::render_report;
use crate::exceptions::BenchError;
use crate::historystore::store::HistoryStore;

#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub group: String,
    /// Defaults to the group's most recent run.
    pub commit: Option<String>,
    pub tool: Option<String>,
    pub json: bool,
    pub fail_on_regression: bool,
}

/// Classifies a recorded run against the history before it. Reads a snapshot
/// without taking the store lock.
pub fn run(config: &Config, opts: CheckOptions) -> Result<CommandStatus, BenchError> {
    let store = HistoryStore::open(&config.data_file)?;
    if store.runs(&opts.group).is_empty() {
        let known: Vec<&str> = store.groups().collect();
        return Err(BenchError::InvalidInput(format!(
            "Group '{}' has no recorded runs. Known groups: {}",
            opts.group,
            if known.is_empty() {
                "(none)".to_string()
            } else {
                known.join(", ")
            }
        )));
    }

    let detector = config.detector();
    let report = match &opts.commit {
        Some(commit) => detector.report(&store, &opts.group, commit, opts.tool.as_deref())?,
        None => detector.report_latest(&store, &opts.group)?,
    };

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render_report(&report));
    }

    Ok(status_for(&report, opts.fail_on_regression))
}
