use crate::config::Config;
use crate::console::{format_date, new_table};
use crate::exceptions::BenchError;
use crate::historystore::store::{HistoryStore, short_id};
use comfy_table::{Cell, CellAlignment};
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub data_file: String,
    pub repo_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_update: OffsetDateTime,
    pub groups: Vec<GroupStatus>,
}

#[derive(Debug, Serialize)]
pub struct GroupStatus {
    pub name: String,
    pub runs: usize,
    pub benchmarks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_commit: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub latest_recorded_at: Option<OffsetDateTime>,
}

pub fn collect(store: &HistoryStore) -> StatusResponse {
    let groups = store
        .groups()
        .map(|name| {
            let runs = store.runs(name);
            let latest = runs.last();
            GroupStatus {
                name: name.to_string(),
                runs: runs.len(),
                benchmarks: store.benchmark_names(name).len(),
                latest_commit: latest.map(|r| r.commit.id.clone()),
                latest_recorded_at: latest.map(|r| r.recorded_at),
            }
        })
        .collect();

    StatusResponse {
        data_file: store.path().display().to_string(),
        repo_url: store.repo_url().to_string(),
        last_update: store.last_update(),
        groups,
    }
}

pub fn run(config: &Config, json_output: bool) -> Result<(), BenchError> {
    let store = HistoryStore::open(&config.data_file)?;
    let status = collect(&store);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Store:       {}", status.data_file);
    if !status.repo_url.is_empty() {
        println!("Repository:  {}", status.repo_url);
    }
    if status.groups.is_empty() {
        println!("No runs recorded yet.");
        return Ok(());
    }
    println!("Last update: {}", format_date(status.last_update));

    let mut table = new_table(&["Group", "Runs", "Benchmarks", "Latest"]);

    for group in &status.groups {
        let latest = match (&group.latest_commit, group.latest_recorded_at) {
            (Some(commit), Some(at)) => format!("{} ({})", short_id(commit), format_date(at)),
            _ => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(&group.name),
            Cell::new(group.runs).set_alignment(CellAlignment::Right),
            Cell::new(group.benchmarks).set_alignment(CellAlignment::Right),
            Cell::new(latest),
        ]);
    }

    println!("{}", table);
    Ok(())
}
