use crate::consts::DEFAULT_THRESHOLD;
use crate::exceptions::BenchError;
use crate::historystore::series::BenchmarkSeries;
use crate::historystore::store::{HistoryStore, short_id};
use crate::models::{Measurement, Polarity, RunRecord};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Improved,
    Stable,
    Regressed,
    InsufficientHistory,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Improved => write!(f, "improved"),
            Classification::Stable => write!(f, "stable"),
            Classification::Regressed => write!(f, "regressed"),
            Classification::InsufficientHistory => write!(f, "insufficient_history"),
        }
    }
}

/// Which prior readings a new measurement is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum BaselineStrategy {
    /// The immediately preceding reading.
    #[default]
    Previous,
    /// Mean of up to `window` preceding readings.
    RollingMean { window: usize },
}

impl FromStr for BaselineStrategy {
    type Err = BenchError;

    /// `previous`, or `rolling:<window>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("previous") {
            return Ok(BaselineStrategy::Previous);
        }
        if let Some(window) = s.strip_prefix("rolling:")
            && let Ok(window) = window.trim().parse::<usize>()
            && window > 0
        {
            return Ok(BaselineStrategy::RollingMean { window });
        }
        Err(BenchError::InvalidInput(format!(
            "Invalid baseline '{}'. Use 'previous' or 'rolling:<N>' with N >= 1.",
            s
        )))
    }
}

impl std::fmt::Display for BaselineStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaselineStrategy::Previous => write!(f, "previous"),
            BaselineStrategy::RollingMean { window } => write!(f, "rolling:{}", window),
        }
    }
}

// --- Results ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Baseline {
    pub value: f64,
    pub variability: f64,
    /// Commit of the most recent reading that went into the baseline.
    pub commit_id: String,
    pub points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub name: String,
    pub unit: String,
    pub classification: Classification,
    pub value: f64,
    pub variability: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Baseline>,
    /// `(value - baseline) / baseline`. Undefined for a zero baseline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
    /// `(value - baseline) / |baseline|`, negated when lower is better, so positive is always better.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvement: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub group: String,
    pub commit_id: String,
    pub tool: String,
    pub threshold: f64,
    pub baseline: String,
    pub verdicts: Vec<Verdict>,
}

impl RunReport {
    pub fn count(&self, classification: Classification) -> usize {
        self.verdicts
            .iter()
            .filter(|v| v.classification == classification)
            .count()
    }

    pub fn has_regressions(&self) -> bool {
        self.count(Classification::Regressed) > 0
    }

    pub fn regressions(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts
            .iter()
            .filter(|v| v.classification == Classification::Regressed)
    }
}

// --- Detector ---

/// Classifies each measurement of a run against the runs recorded before it.
///
/// A change only counts when it is both larger than `threshold` (relative)
/// and larger than the combined variability of the two readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detector {
    threshold: f64,
    strategy: BaselineStrategy,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, BaselineStrategy::Previous)
    }
}

impl Detector {
    pub fn new(threshold: f64, strategy: BaselineStrategy) -> Self {
        Self {
            threshold,
            strategy,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn strategy(&self) -> BaselineStrategy {
        self.strategy
    }

    /// `history` holds the runs preceding `run`, oldest first.
    pub fn evaluate(&self, history: &[RunRecord], run: &RunRecord) -> Vec<Verdict> {
        run.benches
            .iter()
            .map(|m| {
                let series = BenchmarkSeries::build(history, &m.name);
                self.classify(&series, m, &run.tool)
            })
            .collect()
    }

    pub fn classify(&self, series: &BenchmarkSeries<'_>, current: &Measurement, tool: &str) -> Verdict {
        let polarity = Polarity::resolve(current.kind(), tool);
        let baseline = self.baseline(series, &current.unit);

        let (classification, delta) = match &baseline {
            None => (Classification::InsufficientHistory, None),
            Some(base) => self.compare(base, current, polarity),
        };
        let improvement = baseline
            .as_ref()
            .filter(|base| base.value != 0.0)
            .map(|base| {
                let change = (current.value - base.value) / base.value.abs();
                match polarity {
                    Polarity::LowerIsBetter => -change,
                    Polarity::HigherIsBetter => change,
                }
            });

        debug!(
            bench = %current.name,
            %classification,
            delta = ?delta,
            "classified measurement"
        );

        Verdict {
            name: current.name.clone(),
            unit: current.unit.clone(),
            classification,
            value: current.value,
            variability: current.variability(),
            baseline,
            delta,
            improvement,
        }
    }

    /// Classifies the latest run of `commit_id` in `group` against the runs before it.
    pub fn report(
        &self,
        store: &HistoryStore,
        group: &str,
        commit_id: &str,
        tool: Option<&str>,
    ) -> Result<RunReport, BenchError> {
        let (position, run) = store.find_run(group, commit_id, tool).ok_or_else(|| {
            BenchError::InvalidInput(format!(
                "No run for commit {} in group '{}'.",
                short_id(commit_id),
                group
            ))
        })?;

        Ok(self.build_report(group, &store.runs(group)[..position], run))
    }

    /// Classifies the most recent run of `group`.
    pub fn report_latest(&self, store: &HistoryStore, group: &str) -> Result<RunReport, BenchError> {
        let runs = store.runs(group);
        let (run, history) = runs.split_last().ok_or_else(|| {
            BenchError::InvalidInput(format!("Group '{}' has no recorded runs.", group))
        })?;

        Ok(self.build_report(group, history, run))
    }

    fn build_report(&self, group: &str, history: &[RunRecord], run: &RunRecord) -> RunReport {
        RunReport {
            group: group.to_string(),
            commit_id: run.commit.id.clone(),
            tool: run.tool.clone(),
            threshold: self.threshold,
            baseline: self.strategy.to_string(),
            verdicts: self.evaluate(history, run),
        }
    }

    fn baseline(&self, series: &BenchmarkSeries<'_>, unit: &str) -> Option<Baseline> {
        let window = match self.strategy {
            BaselineStrategy::Previous => 1,
            BaselineStrategy::RollingMean { window } => window.max(1),
        };

        let points: Vec<_> = series.recent_in_unit(unit).take(window).collect();
        let latest = points.first()?;
        let n = points.len() as f64;

        Some(Baseline {
            value: points.iter().map(|p| p.measurement.value).sum::<f64>() / n,
            variability: points.iter().map(|p| p.measurement.variability()).sum::<f64>() / n,
            commit_id: latest.run.commit.id.clone(),
            points: points.len(),
        })
    }

    fn compare(
        &self,
        baseline: &Baseline,
        current: &Measurement,
        polarity: Polarity,
    ) -> (Classification, Option<f64>) {
        let diff = current.value - baseline.value;
        let delta = (baseline.value != 0.0).then(|| diff / baseline.value);

        let noise_floor = current.variability() + baseline.variability;
        let beyond_threshold = delta.is_none_or(|d| d.abs() > self.threshold);
        if !(beyond_threshold && diff.abs() > noise_floor) {
            return (Classification::Stable, delta);
        }

        let worse = match polarity {
            Polarity::LowerIsBetter => diff > 0.0,
            Polarity::HigherIsBetter => diff < 0.0,
        };
        let classification = if worse {
            Classification::Regressed
        } else {
            Classification::Improved
        };
        (classification, delta)
    }
}
