use crate::models::{Measurement, RunRecord};

#[derive(Debug, Clone, Copy)]
pub struct SeriesPoint<'a> {
    pub run: &'a RunRecord,
    pub measurement: &'a Measurement,
}

/// Every reading of one benchmark name across a group's runs, oldest first.
///
/// Built on demand from the runs; the store never keeps it.
#[derive(Debug, Clone)]
pub struct BenchmarkSeries<'a> {
    name: String,
    points: Vec<SeriesPoint<'a>>,
}

impl<'a> BenchmarkSeries<'a> {
    pub fn build(runs: &'a [RunRecord], name: &str) -> Self {
        let points = runs
            .iter()
            .filter_map(|run| {
                run.bench(name)
                    .map(|measurement| SeriesPoint { run, measurement })
            })
            .collect();

        Self {
            name: name.to_string(),
            points,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[SeriesPoint<'a>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&SeriesPoint<'a>> {
        self.points.last()
    }

    /// Points recorded in `unit`, newest first. A benchmark that changed units
    /// starts a fresh comparable history.
    pub fn recent_in_unit<'s>(&'s self, unit: &'s str) -> impl Iterator<Item = &'s SeriesPoint<'a>> + 's {
        self.points
            .iter()
            .rev()
            .filter(move |p| p.measurement.unit == unit)
    }
}
