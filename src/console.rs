use crate::consts::ENV_COLUMNS;
use crate::historystore::series::BenchmarkSeries;
use crate::historystore::store::short_id;
use crate::models::display_number;
use crate::regression::{Classification, RunReport};
use comfy_table::presets::NOTHING;
use comfy_table::*;
use std::io::IsTerminal;
use time::OffsetDateTime;
use time::macros::format_description;

pub fn get_terminal_width() -> usize {
    static TERMINAL_WIDTH: std::sync::LazyLock<usize> = std::sync::LazyLock::new(|| {
        // 1. Check BENCHTRAIL_COLUMNS
        if let Ok(w) = std::env::var(ENV_COLUMNS).map(|s| s.parse().unwrap_or(0))
            && w > 0
        {
            return w;
        }

        // 2. Check COLUMNS
        if let Ok(w) = std::env::var("COLUMNS").map(|s| s.parse().unwrap_or(0))
            && w > 0
        {
            return w;
        }

        // 3. System TTY (Only called if env vars are missing)
        if is_stdout_terminal()
            && let Ok((w, _)) = crossterm::terminal::size()
        {
            return w as usize;
        }

        // 4. Default Fallback
        100
    });

    *TERMINAL_WIDTH
}

pub fn is_stdout_terminal() -> bool {
    std::io::stdout().is_terminal()
}

pub fn format_percent(delta: Option<f64>) -> String {
    match delta {
        Some(d) => format!("{:+.2}%", d * 100.0),
        None => "n/a".to_string(),
    }
}

pub fn format_reading(value: f64, variability: f64, unit: &str) -> String {
    format!(
        "{} {} (± {})",
        display_number(value),
        unit,
        display_number(variability)
    )
}

pub fn format_date(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_default()
}

fn classification_color(classification: Classification) -> Color {
    match classification {
        Classification::Improved => Color::Green,
        Classification::Stable => Color::Reset,
        Classification::Regressed => Color::Red,
        Classification::InsufficientHistory => Color::Grey,
    }
}

pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_width(get_terminal_width() as u16)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );
    table
}

pub fn render_report(report: &RunReport) -> String {
    let mut table = new_table(&["Benchmark", "Current", "Baseline", "Change", "Verdict"]);

    for verdict in &report.verdicts {
        let baseline = match &verdict.baseline {
            Some(b) => format!(
                "{} @ {}",
                format_reading(b.value, b.variability, &verdict.unit),
                short_id(&b.commit_id)
            ),
            None => "-".to_string(),
        };

        table.add_row(vec![
            Cell::new(&verdict.name),
            Cell::new(format_reading(verdict.value, verdict.variability, &verdict.unit)),
            Cell::new(baseline),
            Cell::new(format_percent(verdict.delta)).set_alignment(CellAlignment::Right),
            Cell::new(verdict.classification.to_string())
                .fg(classification_color(verdict.classification)),
        ]);
    }

    let summary = format!(
        "{} regressed, {} improved, {} stable, {} without history (threshold {}, baseline {})",
        report.count(Classification::Regressed),
        report.count(Classification::Improved),
        report.count(Classification::Stable),
        report.count(Classification::InsufficientHistory),
        format_percent(Some(report.threshold)).trim_start_matches('+'),
        report.baseline,
    );

    format!(
        "{} @ {} ({})\n{}\n{}",
        report.group,
        short_id(&report.commit_id),
        report.tool,
        table,
        summary
    )
}

pub fn render_series(series: &BenchmarkSeries<'_>, limit: Option<usize>) -> String {
    let mut table = new_table(&["Date", "Commit", "Value", "Change"]);

    let points = series.points();
    let skip = limit.map_or(0, |l| points.len().saturating_sub(l));

    for (i, point) in points.iter().enumerate().skip(skip) {
        let change = i
            .checked_sub(1)
            .map(|prev| points[prev].measurement)
            .filter(|prev| prev.unit == point.measurement.unit && prev.value != 0.0)
            .map(|prev| (point.measurement.value - prev.value) / prev.value);

        table.add_row(vec![
            Cell::new(format_date(point.run.recorded_at)),
            Cell::new(short_id(&point.run.commit.id)),
            Cell::new(format_reading(
                point.measurement.value,
                point.measurement.variability(),
                &point.measurement.unit,
            )),
            Cell::new(format_percent(change)).set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}
