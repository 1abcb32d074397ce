use crate::exceptions::BenchError;
use crate::models::{Measurement, RunRecord, UnitKind};
use std::collections::HashSet;

pub fn is_commit_id(id: &str) -> bool {
    id.len() == 40 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Checks a submitted run before it is allowed near the store.
/// Every problem is reported at once so a CI log shows the full picture.
pub fn validate_run(group: &str, run: &RunRecord) -> Result<(), BenchError> {
    let mut problems = Vec::new();

    if group.trim().is_empty() {
        problems.push("benchmark group name must not be empty".to_string());
    }
    if run.tool.trim().is_empty() {
        problems.push("tool must not be empty".to_string());
    }
    if !is_commit_id(&run.commit.id) {
        problems.push(format!(
            "commit id '{}' is not a 40-character hex SHA",
            run.commit.id
        ));
    }
    if run.benches.is_empty() {
        problems.push("run contains no measurements".to_string());
    }

    let mut seen = HashSet::new();
    for bench in &run.benches {
        if !seen.insert(bench.name.as_str()) {
            problems.push(format!("duplicate measurement name '{}'", bench.name));
        }
        problems.extend(measurement_problems(bench));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(BenchError::Validation(problems.join("; ")))
    }
}

fn measurement_problems(m: &Measurement) -> Vec<String> {
    let mut problems = Vec::new();
    let label = if m.name.trim().is_empty() {
        problems.push("measurement name must not be empty".to_string());
        "<unnamed>"
    } else {
        m.name.as_str()
    };

    if !m.value.is_finite() {
        problems.push(format!("'{}': value must be a finite number", label));
    } else if m.value < 0.0 && m.kind() != UnitKind::Custom {
        problems.push(format!(
            "'{}': {} value {} must not be negative",
            label,
            m.kind(),
            m.value
        ));
    }

    let variability = m.variability();
    if !variability.is_finite() || variability < 0.0 {
        problems.push(format!(
            "'{}': variability {} must be a non-negative finite number",
            label, variability
        ));
    }

    if m.unit.trim().is_empty() {
        problems.push(format!("'{}': unit must not be empty", label));
    }

    problems
}
