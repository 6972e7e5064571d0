// ThreatLog - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation
// 3. Rule source resolution
// 4. Running the analysis and writing the requested outputs

use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use threatlog::app::analysis::{self, AnalysisOptions};
use threatlog::app::rule_mgr::{self, RuleSource};
use threatlog::core::{export, filter};
use threatlog::platform;
use threatlog::platform::config::AppConfig;
use threatlog::util;
use threatlog::util::constants;
use threatlog::util::error::{ExportError, ThreatLogError};

/// Threat Log Analyzer: parse auth/ssh logs and summarise suspicious activity.
#[derive(Parser, Debug)]
#[command(name = "tla", version, about)]
struct Cli {
    /// Path to auth.log / ssh log file.
    logfile: PathBuf,

    /// Output JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Show top N IPs/users [default: 10].
    #[arg(long, value_parser = clap::value_parser!(u32).range(
        constants::MIN_TOP_N as i64..=constants::MAX_TOP_N as i64
    ))]
    top: Option<u32>,

    /// Only include events within duration (e.g. 24h, 7d, 30m).
    #[arg(long)]
    since: Option<String>,

    /// Write HTML report to file.
    #[arg(long, value_name = "PATH")]
    html: Option<PathBuf>,

    /// Write CSV events to file.
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Write JSONL events to file.
    #[arg(long, value_name = "PATH")]
    jsonl: Option<PathBuf>,

    /// Path to a YAML or TOML rules file.
    #[arg(long, value_name = "PATH")]
    rules: Option<PathBuf>,

    /// Example lines kept per rule hit [default: 3].
    #[arg(long, value_parser = clap::value_parser!(u32).range(
        0..=constants::MAX_EXAMPLES_LIMIT as i64
    ))]
    max_examples: Option<u32>,

    /// Read configuration from this file instead of the platform location.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Config comes first so its log level can seed the subscriber.
    let (config, config_warnings, config_error) = match &cli.config {
        Some(path) => match platform::config::load_config_file(path) {
            Ok((config, warnings)) => (config, warnings, None),
            Err(e) => (AppConfig::default(), Vec::new(), Some(e)),
        },
        None => {
            let paths = platform::config::PlatformPaths::resolve();
            let (config, warnings) = platform::config::load_config(&paths.config_file());
            (config, warnings, None)
        }
    };

    util::logging::init(cli.debug, config.log_level.as_deref());

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "ThreatLog starting"
    );

    for warning in &config_warnings {
        tracing::warn!("{}", warning);
    }

    let result = match config_error {
        Some(e) => Err(ThreatLogError::from(e)),
        None => run(&cli, &config),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Run failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: &AppConfig) -> Result<(), ThreatLogError> {
    if !cli.logfile.is_file() {
        return Err(ThreatLogError::Io {
            path: cli.logfile.clone(),
            operation: "open log file",
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        });
    }

    // Validate the window before doing any work on the log.
    let since = cli
        .since
        .as_deref()
        .or(config.since.as_deref())
        .map(filter::parse_duration)
        .transpose()?;

    let explicit_rules = cli.rules.as_deref().or(config.rules_path.as_deref());
    let source = RuleSource::resolve(explicit_rules, Path::new("."))?;
    let rule_set = rule_mgr::load_rules(&source)?;

    let options = AnalysisOptions {
        top_n: cli.top.map_or(config.top_n, |n| n as usize),
        max_examples: cli.max_examples.map_or(config.max_examples, |n| n as usize),
        since,
        now: threatlog::core::timestamp::local_now(),
    };

    let result = analysis::analyze_file(&cli.logfile, &rule_set, &options)?;

    let stdout_path = Path::new("<stdout>");
    let stdout_err = |e| ExportError::Io {
        path: stdout_path.to_path_buf(),
        source: e,
    };
    let mut stdout = std::io::stdout().lock();
    if cli.json {
        export::export_report_json(&result.report, &mut stdout, stdout_path)?;
        writeln!(stdout).map_err(stdout_err)?;
    } else {
        writeln!(stdout, "{}", export::to_text(&result.report)).map_err(stdout_err)?;
    }
    stdout.flush().map_err(stdout_err)?;

    if let Some(path) = &cli.html {
        platform::fs::write_text(path, &export::to_html(&result.report))
            .map_err(|e| io_export_error(path, e))?;
        tracing::info!(path = %path.display(), "HTML report written");
    }

    if let Some(path) = &cli.csv {
        let writer = platform::fs::create_output(path).map_err(|e| io_export_error(path, e))?;
        let count = export::export_csv(&result.events, writer, path)?;
        tracing::info!(path = %path.display(), count, "CSV events written");
    }

    if let Some(path) = &cli.jsonl {
        let writer = platform::fs::create_output(path).map_err(|e| io_export_error(path, e))?;
        let count = export::export_jsonl(&result.events, writer, path)?;
        tracing::info!(path = %path.display(), count, "JSONL events written");
    }

    Ok(())
}

fn io_export_error(path: &Path, source: std::io::Error) -> ThreatLogError {
    ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
    .into()
}
