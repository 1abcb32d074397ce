use crate::config::Config;
use crate::exceptions::BenchError;
use crate::export::{Format, encode, export_file};
use crate::historystore::store::HistoryStore;
use std::path::PathBuf;

/// Writes the store in chart-page layout, to `output` or stdout.
///
/// Without an explicit format, a file target takes its format from the
/// extension and stdout gets bare JSON.
pub fn run(config: &Config, output: Option<PathBuf>, format: Option<Format>) -> Result<(), BenchError> {
    let store = HistoryStore::open(&config.data_file)?;

    match output {
        Some(path) => {
            let format = format.unwrap_or_else(|| Format::from_path(&path));
            export_file(store.data(), &path, format)?;
            eprintln!(
                "Exported {} runs to {} ({}).",
                store.len(),
                path.display(),
                format
            );
        }
        None => {
            print!("{}", encode(store.data(), format.unwrap_or(Format::Json))?);
        }
    }

    Ok(())
}
