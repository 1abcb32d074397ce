use super::{CommandStatus, read_input, status_for};
use crate::config::Config;
use crate::console::render_report;
use crate::consts::TOOL_CARGO;
use crate::exceptions::BenchError;
use crate::historystore::merge::Merger;
use crate::historystore::store::{AppendOutcome, ConflictWarning, short_id};
use crate::models::{Commit, Extensions, RunRecord, epoch_millis};
use crate::parsers::parse_output;
use crate::regression::RunReport;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub group: String,
    /// A complete run document.
    pub run_file: Option<PathBuf>,
    /// Commit provenance, used together with `output_file`.
    pub commit_file: Option<PathBuf>,
    /// Raw harness output, parsed according to `tool`.
    pub output_file: Option<PathBuf>,
    pub tool: Option<String>,
    pub json: bool,
    pub fail_on_regression: bool,
}

#[derive(Debug, Serialize)]
struct IngestResponse<'a> {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conflict: Option<&'a ConflictWarning>,
    report: &'a RunReport,
}

pub fn run(config: &Config, opts: IngestOptions) -> Result<CommandStatus, BenchError> {
    let run = build_run(&opts, OffsetDateTime::now_utc())?;
    let commit_id = run.commit.id.clone();
    let tool = run.tool.clone();

    let result = Merger::new(&config.data_file)
        .with_lock_timeout(config.lock_timeout())
        .with_repo_url(config.repo_url.clone())
        .append(&opts.group, run)?;

    let report = config
        .detector()
        .report(&result.store, &opts.group, &commit_id, Some(&tool))?;

    if opts.json {
        let (outcome, position) = match &result.outcome {
            AppendOutcome::Inserted { position } => ("inserted", Some(*position)),
            AppendOutcome::Unchanged => ("unchanged", None),
            AppendOutcome::Replaced { position, .. } => ("replaced", Some(*position)),
        };
        let response = IngestResponse {
            outcome,
            position,
            conflict: result.outcome.conflict(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        let short = short_id(&commit_id);
        match &result.outcome {
            AppendOutcome::Inserted { .. } => {
                println!("Recorded {} ({}) in '{}'.", short, tool, opts.group)
            }
            AppendOutcome::Unchanged => println!(
                "Run for {} ({}) is already recorded in '{}'; nothing changed.",
                short, tool, opts.group
            ),
            AppendOutcome::Replaced { .. } => println!(
                "Replaced the earlier submission for {} ({}) in '{}'.",
                short, tool, opts.group
            ),
        }
        println!("{}", render_report(&report));
    }

    Ok(status_for(&report, opts.fail_on_regression))
}

/// Assembles the run from either a run document or commit + harness output.
pub fn build_run(opts: &IngestOptions, now: OffsetDateTime) -> Result<RunRecord, BenchError> {
    match (&opts.run_file, &opts.commit_file) {
        (Some(run_file), None) => {
            if opts.output_file.is_some() {
                return Err(BenchError::InvalidInput(
                    "--output-file is only used together with --commit".into(),
                ));
            }
            read_run_document(run_file, opts.tool.as_deref(), now)
        }
        (None, Some(commit_file)) => {
            let output_file = opts.output_file.as_deref().ok_or_else(|| {
                BenchError::InvalidInput("--commit requires --output-file".into())
            })?;
            let commit: Commit = serde_json::from_str(&read_input(commit_file)?).map_err(|e| {
                BenchError::InvalidInput(format!(
                    "Invalid commit JSON in {}: {}",
                    commit_file.display(),
                    e
                ))
            })?;
            let tool = opts.tool.clone().unwrap_or_else(|| TOOL_CARGO.to_string());
            let benches = parse_output(&tool, &read_input(output_file)?)?;

            Ok(RunRecord {
                commit,
                recorded_at: now,
                tool,
                benches,
                extra: Extensions::new(),
            })
        }
        (Some(_), Some(_)) => Err(BenchError::InvalidInput(
            "--run and --commit cannot be used together".into(),
        )),
        (None, None) => Err(BenchError::InvalidInput(
            "Provide either --run <file> or --commit <file> with --output-file <file>".into(),
        )),
    }
}

/// A run document may omit `date` (stamped with the ingestion time) and
/// `tool` (taken from `--tool`).
fn read_run_document(path: &Path, tool: Option<&str>, now: OffsetDateTime) -> Result<RunRecord, BenchError> {
    let invalid = |detail: String| {
        BenchError::InvalidInput(format!("Invalid run JSON in {}: {}", path.display(), detail))
    };

    let mut doc: Value =
        serde_json::from_str(&read_input(path)?).map_err(|e| invalid(e.to_string()))?;
    let Some(object) = doc.as_object_mut() else {
        return Err(invalid("expected a JSON object".to_string()));
    };

    object
        .entry("date")
        .or_insert_with(|| Value::from(epoch_millis::to_millis(now)));
    if let Some(tool) = tool {
        object
            .entry("tool")
            .or_insert_with(|| Value::from(tool));
    }

    serde_json::from_value(doc).map_err(|e| invalid(e.to_string()))
}
