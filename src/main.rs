use benchtrail::commands::CommandStatus;
use benchtrail::commands::check::CheckOptions;
use benchtrail::commands::ingest::IngestOptions;
use benchtrail::config::Config;
use benchtrail::exceptions::BenchError;
use benchtrail::export::Format;
use benchtrail::historystore::store::HistoryStore;
use benchtrail::regression::BaselineStrategy;
use clap::CommandFactory;
use clap::{Parser, Subcommand};
use clap_complete::ArgValueCompleter;
use clap_complete::CompletionCandidate;
use std::path::PathBuf;

// Use jemalloc on musl x86_64 for better performance
#[cfg(all(target_env = "musl", target_arch = "x86_64"))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Exit status when `--fail-on-regression` finds a regression.
const REGRESSION_EXIT_CODE: i32 = 3;

#[derive(Parser)]
#[command(
    name = "benchtrail",
    about = "Benchmark history for CI: record runs, flag regressions",
    long_about = None,
    version = env!("CARGO_PKG_VERSION"),
    long_version = concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\n",
        "Build Information:\n",
        "  Timestamp:         ", env!("VERGEN_BUILD_TIMESTAMP"), "\n",
        "  Target Triple:     ", env!("VERGEN_CARGO_TARGET_TRIPLE"), "\n",
        "\n",
        "Source Control:\n",
        "  Commit SHA:        ", env!("VERGEN_GIT_SHA"), "\n",
        "  Commit Timestamp:  ", env!("VERGEN_GIT_COMMIT_TIMESTAMP"), "\n",
        "  Branch:            ", env!("VERGEN_GIT_BRANCH"), "\n",
        "\n",
        "Compiler:\n",
        "  Rustc Version:     ", env!("VERGEN_RUSTC_SEMVER"), "\n",
        "  Rustc Channel:     ", env!("VERGEN_RUSTC_CHANNEL"), "\n",
        "  Host Triple:       ", env!("VERGEN_RUSTC_HOST_TRIPLE"), "\n"
    ),
    disable_help_subcommand = true
)]
struct Cli {
    /// JSON config file [env: BENCHTRAIL_CONFIG]
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// History store (.js or .json) [env: BENCHTRAIL_DATA_FILE]
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    data_file: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct DetectionArgs {
    /// Relative change that counts as significant (0.05 = 5%)
    #[arg(long)]
    threshold: Option<f64>,
    /// Baseline to compare against: `previous` or `rolling:<N>`
    #[arg(long)]
    baseline: Option<BaselineStrategy>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
    /// Exit with status 3 when any benchmark regressed
    #[arg(long)]
    fail_on_regression: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a benchmark run and classify it against history.
    ///
    /// Either pass a complete run document with --run, or the commit
    /// provenance with --commit and the raw harness output with --output-file.
    /// Use `-` to read either from stdin.
    Ingest {
        /// Benchmark group (suite) the run belongs to
        #[arg(short, long, add = ArgValueCompleter::new(group_completer))]
        group: String,
        /// Run document (JSON)
        #[arg(long, conflicts_with_all = ["commit", "output_file"], value_hint = clap::ValueHint::FilePath)]
        run: Option<PathBuf>,
        /// Commit provenance (JSON)
        #[arg(long, requires = "output_file", value_hint = clap::ValueHint::FilePath)]
        commit: Option<PathBuf>,
        /// Raw benchmark harness output
        #[arg(long, value_hint = clap::ValueHint::FilePath)]
        output_file: Option<PathBuf>,
        /// Benchmark tool: cargo, customSmallerIsBetter or customBiggerIsBetter
        #[arg(long)]
        tool: Option<String>,
        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Classify a recorded run [default: the group's latest].
    Check {
        #[arg(short, long, add = ArgValueCompleter::new(group_completer))]
        group: String,
        /// Commit id of the run to check
        #[arg(long)]
        commit: Option<String>,
        /// Restrict to runs recorded by this tool
        #[arg(long)]
        tool: Option<String>,
        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Show the recorded history of one benchmark.
    Series {
        #[arg(short, long, add = ArgValueCompleter::new(group_completer))]
        group: String,
        /// Benchmark name
        name: String,
        /// Only show the newest N points
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Summarize the store: groups, run counts, latest runs.
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Write the store in chart-page layout to a file or stdout.
    Export {
        /// Target file [default: stdout]
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// `js` or `json` [default: from the target extension, json on stdout]
        #[arg(long)]
        format: Option<Format>,
    },

    /// Remove old runs according to a retention policy.
    Prune {
        /// Remove runs recorded more than N days ago
        #[arg(long)]
        max_age_days: Option<u32>,
        /// Keep only the newest N runs per group
        #[arg(long)]
        max_count: Option<usize>,
        /// Report what would be removed without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Show instructions for enabling shell completions.
    Completions,
}

fn main() {
    clap_complete::CompleteEnv::with_factory(Cli::command).complete();

    let cli = Cli::parse();

    match run(cli) {
        Ok(CommandStatus::Success) => {}
        Ok(CommandStatus::RegressionsFound) => std::process::exit(REGRESSION_EXIT_CODE),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

fn run(cli: Cli) -> Result<CommandStatus, BenchError> {
    benchtrail::logging::init_logging(cli.verbose)?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_file) = cli.data_file {
        config.data_file = data_file;
    }

    match cli.command {
        Commands::Ingest {
            group,
            run,
            commit,
            output_file,
            tool,
            detection,
        } => {
            apply_detection(&mut config, &detection)?;
            benchtrail::commands::ingest::run(
                &config,
                IngestOptions {
                    group,
                    run_file: run,
                    commit_file: commit,
                    output_file,
                    tool,
                    json: detection.json,
                    fail_on_regression: detection.fail_on_regression,
                },
            )
        }
        Commands::Check {
            group,
            commit,
            tool,
            detection,
        } => {
            apply_detection(&mut config, &detection)?;
            benchtrail::commands::check::run(
                &config,
                CheckOptions {
                    group,
                    commit,
                    tool,
                    json: detection.json,
                    fail_on_regression: detection.fail_on_regression,
                },
            )
        }
        Commands::Series { group, name, limit } => {
            benchtrail::commands::series::run(&config, group, name, limit)
                .map(|_| CommandStatus::Success)
        }
        Commands::Status { json } => {
            benchtrail::commands::status::run(&config, json).map(|_| CommandStatus::Success)
        }
        Commands::Export { output, format } => {
            benchtrail::commands::export::run(&config, output, format)
                .map(|_| CommandStatus::Success)
        }
        Commands::Prune {
            max_age_days,
            max_count,
            dry_run,
        } => benchtrail::commands::prune::run(&config, max_age_days, max_count, dry_run)
            .map(|_| CommandStatus::Success),
        Commands::Completions => {
            println!(
                "Bash:\n\
                echo \"source <(COMPLETE=bash benchtrail)\" >> ~/.bashrc\n\
                \n\
                Elvish:\n\
                echo \"eval (E:COMPLETE=elvish benchtrail | slurp)\" >> ~/.elvish/rc.elv\n\
                \n\
                Fish:\n\
                echo \"COMPLETE=fish benchtrail | source\" >> ~/.config/fish/config.fish\n\
                \n\
                Zsh:\n\
                echo \"source <(COMPLETE=zsh benchtrail)\" >> ~/.zshrc\n"
            );
            Ok(CommandStatus::Success)
        }
    }
}

fn apply_detection(config: &mut Config, detection: &DetectionArgs) -> Result<(), BenchError> {
    if let Some(threshold) = detection.threshold {
        config.threshold = threshold;
    }
    if let Some(baseline) = detection.baseline {
        config.baseline = baseline;
    }
    config.validate()
}

fn group_completer(current: &std::ffi::OsStr) -> Vec<CompletionCandidate> {
    let Ok(config) = Config::load(None) else {
        return vec![];
    };
    let Ok(store) = HistoryStore::open(&config.data_file) else {
        return vec![];
    };

    let current_input = current.to_string_lossy();
    store
        .groups()
        .filter(|g| g.starts_with(current_input.as_ref()))
        .map(CompletionCandidate::new)
        .collect()
}
