use crate::config::Config;
use crate::console::render_series;
use crate::exceptions::BenchError;
use crate::historystore::store::HistoryStore;

pub fn run(config: &Config, group: String, name: String, limit: Option<usize>) -> Result<(), BenchError> {
    let store = HistoryStore::open(&config.data_file)?;
    let series = store.series(&group, &name);

    if series.is_empty() {
        let known = store.benchmark_names(&group);
        return Err(BenchError::InvalidInput(format!(
            "No benchmark named '{}' in group '{}'. Known benchmarks: {}",
            name,
            group,
            if known.is_empty() {
                "(none)".to_string()
            } else {
                known.join(", ")
            }
        )));
    }

    println!("{} / {} ({} runs)", group, series.name(), series.len());
    println!("{}", render_series(&series, limit));
    Ok(())
}
