use crate::consts::{TOOL_CARGO, TOOL_CUSTOM_BIGGER_IS_BETTER, TOOL_CUSTOM_SMALLER_IS_BETTER};
use crate::exceptions::BenchError;
use crate::models::{Measurement, format_range};

pub const SUPPORTED_TOOLS: [&str; 3] = [
    TOOL_CARGO,
    TOOL_CUSTOM_SMALLER_IS_BETTER,
    TOOL_CUSTOM_BIGGER_IS_BETTER,
];

/// Turns one harness run's output into measurements.
pub fn parse_output(tool: &str, output: &str) -> Result<Vec<Measurement>, BenchError> {
    match tool {
        TOOL_CARGO => parse_cargo_output(output),
        TOOL_CUSTOM_SMALLER_IS_BETTER | TOOL_CUSTOM_BIGGER_IS_BETTER => parse_custom_output(output),
        other => Err(BenchError::InvalidInput(format!(
            "Unsupported tool '{}'. Supported tools: {}",
            other,
            SUPPORTED_TOOLS.join(", ")
        ))),
    }
}

/// libtest `cargo bench` output, and criterion's `--output-format bencher`:
///
/// ```text
/// test frame processing/whole ... bench:     8,459,380 ns/iter (+/- 9,153)
/// ```
pub fn parse_cargo_output(output: &str) -> Result<Vec<Measurement>, BenchError> {
    static RE: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
        regex::Regex::new(
            r"^test (.+?) \.\.\. bench:\s+([0-9][0-9,]*(?:\.[0-9]+)?) (\S+) \(\+/- ([0-9][0-9,]*(?:\.[0-9]+)?)\)",
        )
        .unwrap()
    });

    let mut measurements = Vec::new();
    for line in output.lines() {
        let Some(caps) = RE.captures(line.trim()) else {
            continue;
        };
        let value = parse_number(&caps[2])?;
        let deviation = parse_number(&caps[4])?;
        measurements.push(Measurement::new(caps[1].trim(), value, deviation, &caps[3]));
    }

    if measurements.is_empty() {
        return Err(BenchError::InvalidInput(
            "No benchmark results found in cargo bench output.".into(),
        ));
    }
    Ok(measurements)
}

/// A JSON array of `{name, value, unit, range?, variability?}` objects.
/// Extra keys (such as `extra`) are kept with the measurement.
pub fn parse_custom_output(output: &str) -> Result<Vec<Measurement>, BenchError> {
    let mut measurements: Vec<Measurement> = serde_json::from_str(output)
        .map_err(|e| BenchError::InvalidInput(format!("Invalid custom benchmark JSON: {}", e)))?;

    for m in &mut measurements {
        let variability = m.variability();
        m.variability = Some(variability);
        if m.range().is_none() {
            m.range = Some(Some(format_range(variability)));
        }
    }

    if measurements.is_empty() {
        return Err(BenchError::InvalidInput(
            "Custom benchmark JSON contains no measurements.".into(),
        ));
    }
    Ok(measurements)
}

fn parse_number(text: &str) -> Result<f64, BenchError> {
    text.replace(',', "")
        .parse()
        .map_err(|_| BenchError::InvalidInput(format!("Invalid number '{}' in benchmark output", text)))
}
