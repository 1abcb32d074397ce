pub const DEFAULT_DATA_FILE: &str = "dev/bench/data.js";

/// Assignment prefix used when the store is served as a script to chart pages.
pub const DATA_JS_PREFIX: &str = "window.BENCHMARK_DATA = ";

pub const LOCK_FILE_SUFFIX: &str = "lock";

pub const DEFAULT_THRESHOLD: f64 = 0.05;
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 30_000;
pub const LOCK_POLL_INTERVAL_MS: u64 = 50;

// --- Harness tools ---

pub const TOOL_CARGO: &str = "cargo";
pub const TOOL_CUSTOM_SMALLER_IS_BETTER: &str = "customSmallerIsBetter";
pub const TOOL_CUSTOM_BIGGER_IS_BETTER: &str = "customBiggerIsBetter";

// --- Environment ---

pub const ENV_CONFIG: &str = "BENCHTRAIL_CONFIG";
pub const ENV_DATA_FILE: &str = "BENCHTRAIL_DATA_FILE";
pub const ENV_LOG: &str = "BENCHTRAIL_LOG";
pub const ENV_LOG_FORMAT: &str = "BENCHTRAIL_LOG_FORMAT";
pub const ENV_COLUMNS: &str = "BENCHTRAIL_COLUMNS";
