pub mod check;
pub mod export;
pub mod ingest;
pub mod prune;
pub mod series;
pub mod status;

use crate::exceptions::BenchError;
use crate::regression::RunReport;
use std::io::Read;
use std::path::Path;

/// Result of a command that may ask the process to fail without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    RegressionsFound,
}

pub fn status_for(report: &RunReport, fail_on_regression: bool) -> CommandStatus {
    if fail_on_regression && report.has_regressions() {
        CommandStatus::RegressionsFound
    } else {
        CommandStatus::Success
    }
}

/// Reads a file, or stdin when the path is `-`.
pub fn read_input(path: &Path) -> Result<String, BenchError> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }

    std::fs::read_to_string(path).map_err(|e| {
        BenchError::InvalidInput(format!("Could not read {}: {}", path.display(), e))
    })
}
