use crate::config::Config;
use crate::console::format_date;
use crate::exceptions::BenchError;
use crate::historystore::merge::Merger;
use crate::historystore::store::{HistoryStore, PrunePolicy, short_id};
use time::OffsetDateTime;

pub fn run(
    config: &Config,
    max_age_days: Option<u32>,
    max_count: Option<usize>,
    dry_run: bool,
) -> Result<(), BenchError> {
    let policy = PrunePolicy {
        max_age: max_age_days.map(|d| time::Duration::days(d.into())),
        max_count,
    };
    if policy.is_empty() {
        return Err(BenchError::InvalidInput(
            "Nothing to prune by: pass --max-age-days and/or --max-count".into(),
        ));
    }

    let now = OffsetDateTime::now_utc();
    let removed = if dry_run {
        let mut store = HistoryStore::open(&config.data_file)?;
        store.prune(&policy, now)
    } else {
        Merger::new(&config.data_file)
            .with_lock_timeout(config.lock_timeout())
            .prune(&policy, now)?
    };

    for run in &removed {
        println!(
            "{} {} {} ({})",
            if dry_run { "would remove" } else { "removed" },
            run.group,
            short_id(&run.commit_id),
            format_date(run.recorded_at)
        );
    }

    match (removed.len(), dry_run) {
        (0, _) => println!("No runs matched the retention policy."),
        (n, true) => println!("{} runs would be removed (dry run).", n),
        (n, false) => println!("Removed {} runs.", n),
    }

    Ok(())
}
