use crate::consts::{TOOL_CUSTOM_BIGGER_IS_BETTER, TOOL_CUSTOM_SMALLER_IS_BETTER};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Fields a record carried that this version does not know about. Written back verbatim.
pub type Extensions = Map<String, Value>;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Time,
    Throughput,
    Custom,
}

impl UnitKind {
    const TIME_UNITS: [&'static str; 12] = [
        "ps", "ns", "us", "µs", "μs", "ms", "s", "sec", "secs", "seconds", "min", "mins",
    ];
    const RATE_SUFFIXES: [&'static str; 6] = ["/s", "/sec", "/second", " per second", "ops", "hz"];

    /// Classifies a harness unit string such as `ns/iter` or `MiB/s`.
    pub fn classify(unit: &str) -> Self {
        let unit = unit.trim().to_lowercase();
        if Self::RATE_SUFFIXES.iter().any(|s| unit.ends_with(s)) {
            return UnitKind::Throughput;
        }

        let base = unit.split('/').next().unwrap_or_default().trim();
        if Self::TIME_UNITS.contains(&base) {
            UnitKind::Time
        } else {
            UnitKind::Custom
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitKind::Time => write!(f, "time"),
            UnitKind::Throughput => write!(f, "throughput"),
            UnitKind::Custom => write!(f, "custom"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    LowerIsBetter,
    HigherIsBetter,
}

impl Polarity {
    /// The custom tools state their direction explicitly; everything else follows the unit.
    pub fn resolve(kind: UnitKind, tool: &str) -> Self {
        match (kind, tool) {
            (_, TOOL_CUSTOM_BIGGER_IS_BETTER) => Polarity::HigherIsBetter,
            (_, TOOL_CUSTOM_SMALLER_IS_BETTER) => Polarity::LowerIsBetter,
            (UnitKind::Throughput, _) => Polarity::HigherIsBetter,
            (UnitKind::Time | UnitKind::Custom, _) => Polarity::LowerIsBetter,
        }
    }
}

// --- Stored records ---

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub email: Nullable<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub name: Nullable<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub username: Nullable<String>,
    #[serde(flatten)]
    pub extra: Extensions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub author: Person,
    pub committer: Person,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub distinct: Nullable<bool>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub message: Nullable<String>,
    pub timestamp: CommitTime,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub tree_id: Nullable<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub url: Nullable<String>,
    #[serde(flatten)]
    pub extra: Extensions,
}

impl Commit {
    /// Push events mark commits that were already on another branch as not distinct.
    pub fn is_distinct(&self) -> bool {
        self.distinct.flatten().unwrap_or(true)
    }
}

/// An RFC 3339 commit timestamp that is written back exactly as it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTime {
    at: OffsetDateTime,
    text: String,
}

impl CommitTime {
    pub fn new(at: OffsetDateTime) -> Result<Self, time::error::Format> {
        Ok(Self {
            text: at.format(&Rfc3339)?,
            at,
        })
    }

    pub fn parse(text: &str) -> Result<Self, time::error::Parse> {
        Ok(Self {
            at: OffsetDateTime::parse(text, &Rfc3339)?,
            text: text.to_string(),
        })
    }

    pub fn at(&self) -> OffsetDateTime {
        self.at
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Serialize for CommitTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for CommitTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    #[serde(serialize_with = "write_number")]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub range: Nullable<String>,
    pub unit: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "write_optional_number"
    )]
    pub variability: Option<f64>,
    #[serde(flatten)]
    pub extra: Extensions,
}

impl Measurement {
    pub fn new(name: impl Into<String>, value: f64, variability: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            range: Some(Some(format_range(variability))),
            unit: unit.into(),
            variability: Some(variability),
            extra: Extensions::new(),
        }
    }

    pub fn kind(&self) -> UnitKind {
        UnitKind::classify(&self.unit)
    }

    pub fn range(&self) -> Option<&str> {
        self.range.as_ref().and_then(|r| r.as_deref())
    }

    /// The raw variability when recorded, otherwise whatever the display range says.
    pub fn variability(&self) -> f64 {
        self.variability
            .or_else(|| self.range().and_then(parse_range))
            .unwrap_or(0.0)
    }

    /// Same benchmark reading, ignoring display-only and extension fields.
    pub fn same_reading(&self, other: &Measurement) -> bool {
        self.name == other.name
            && self.unit == other.unit
            && self.value == other.value
            && self.variability() == other.variability()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub commit: Commit,
    /// When the store ingested the run, not when the commit was made.
    #[serde(rename = "date", with = "epoch_millis")]
    pub recorded_at: OffsetDateTime,
    pub tool: String,
    pub benches: Vec<Measurement>,
    #[serde(flatten)]
    pub extra: Extensions,
}

impl RunRecord {
    pub fn bench(&self, name: &str) -> Option<&Measurement> {
        self.benches.iter().find(|b| b.name == name)
    }

    pub fn is_same_submission(&self, commit_id: &str, tool: &str) -> bool {
        self.commit.id.eq_ignore_ascii_case(commit_id) && self.tool == tool
    }

    /// Order-independent comparison of the measurement sets.
    pub fn same_measurements(&self, other: &RunRecord) -> bool {
        self.benches.len() == other.benches.len()
            && self
                .benches
                .iter()
                .all(|b| other.bench(&b.name).is_some_and(|o| o.same_reading(b)))
    }
}

/// The whole persisted document, in the layout chart renderers consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkData {
    #[serde(
        rename = "lastUpdate",
        default,
        skip_serializing_if = "Option::is_none",
        with = "epoch_millis::option"
    )]
    pub last_update: Option<OffsetDateTime>,
    #[serde(rename = "repoUrl", default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub entries: IndexMap<String, Vec<RunRecord>>,
    #[serde(flatten)]
    pub extra: Extensions,
}

impl BenchmarkData {
    pub fn empty(repo_url: impl Into<String>) -> Self {
        Self {
            last_update: None,
            repo_url: Some(repo_url.into()),
            entries: IndexMap::new(),
            extra: Extensions::new(),
        }
    }
}

// --- Helpers ---

pub mod epoch_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(at: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(to_millis(*at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        from_millis(millis).map_err(serde::de::Error::custom)
    }

    pub fn to_millis(at: OffsetDateTime) -> i64 {
        (at.unix_timestamp_nanos() / 1_000_000) as i64
    }

    pub fn from_millis(millis: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use time::OffsetDateTime;

        pub fn serialize<S: Serializer>(at: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
            match at {
                Some(at) => serializer.serialize_some(&super::to_millis(*at)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<OffsetDateTime>, D::Error> {
            Option::<i64>::deserialize(deserializer)?
                .map(super::from_millis)
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}

/// `None` when the key was absent, `Some(None)` when it held an explicit `null`.
pub type Nullable<T> = Option<Option<T>>;

pub mod nullable {
    use super::Nullable;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T: Serialize, S: Serializer>(value: &Nullable<T>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(Some(v)) => v.serialize(serializer),
            _ => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T: Deserialize<'de>, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Nullable<T>, D::Error> {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Renders a variability the way chart pages show it, e.g. `± 9153`.
pub fn format_range(variability: f64) -> String {
    format!("± {}", display_number(variability))
}

/// Reads the number back out of a display range (`± 9153`, `+/- 1,204.5`).
pub fn parse_range(range: &str) -> Option<f64> {
    static RE: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
        regex::Regex::new(r"^\s*(?:±|\+/-)?\s*([0-9][0-9,]*(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?)\s*$")
            .unwrap()
    });
    let caps = RE.captures(range)?;
    caps[1].replace(',', "").parse().ok()
}

pub fn display_number(value: f64) -> String {
    if is_integral(value) {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn is_integral(value: f64) -> bool {
    value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0
}

fn write_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if is_integral(*value) {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn write_optional_number<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => write_number(v, serializer),
        None => serializer.serialize_none(),
    }
}
