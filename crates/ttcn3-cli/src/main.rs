use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use ttcn3_core::errors::ConfigError;
use ttcn3_core::fs::ttcn3_files;
use ttcn3_core::project::{lookup, ConfigReport, ConfigResolver, ProjectConfig, MANIFEST_FILE};
use ttcn3_core::{BatchParseRunner, FileOutcome, RealFileSystem};

/// Keys printed by `ttcn3 show` when none are requested.
const DEFAULT_KEYS: [&str; 8] = [
    "name",
    "root",
    "source_dir",
    "sources",
    "imports",
    "parameters_file",
    "hooks_file",
    "lint_file",
];

/// TTCN-3 workbench - parse test suites and inspect their configuration
#[derive(Parser, Debug)]
#[command(name = "ttcn3")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse TTCN-3 files and report syntax errors
    Parse(ParseArgs),

    /// Show test suite configuration
    Show(ShowArgs),
}

#[derive(Args, Debug)]
struct ParseArgs {
    /// Files or directories to parse
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Trace parser activity
    #[arg(short, long)]
    trace: bool,

    /// Maximum number of parser threads
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Source files (default: the sources of ./package.yml)
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Print the configuration as JSON, with the presets of $NTT_PRESETS applied
    #[arg(long, conflicts_with = "sh")]
    json: bool,

    /// Print a shell script exporting the configuration
    #[arg(long)]
    sh: bool,

    /// Configuration keys to print, e.g. `-- name parameters.global`
    #[arg(last = true, value_name = "KEY")]
    keys: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // `parse -t` raises the level to trace
    let level = match &cli.command {
        Command::Parse(args) if args.trace => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Parse(args) => std::process::exit(parse(&args)),
        Command::Show(args) => show(&args),
    }
}

/// Parses every file and prints its diagnostics to stderr. Returns the
/// process exit code.
fn parse(args: &ParseArgs) -> i32 {
    let (files, missing) = ttcn3_files(&args.files);
    for (path, e) in &missing {
        eprintln!("{}: error: {}", path.display(), e);
    }

    let mut runner =
        BatchParseRunner::new(Arc::new(RealFileSystem::new())).with_trace(args.trace);
    if let Some(jobs) = args.jobs {
        runner = runner.with_max_threads(jobs);
    }
    let report = runner.run(&files);

    let mut diagnostics = 0;
    for result in report.results() {
        let path = result.path.display();
        match &result.outcome {
            FileOutcome::Parsed(tree) => {
                for diagnostic in tree.diagnostics() {
                    diagnostics += 1;
                    eprintln!(
                        "{}:{}:{}: {}: {}",
                        path,
                        diagnostic.span.line,
                        diagnostic.span.column,
                        diagnostic.level,
                        diagnostic.message
                    );
                }
            }
            FileOutcome::Failed(e) => eprintln!("{}: error: {}", path, e.source),
        }
    }

    info!(files = files.len(), diagnostics, "parse finished");
    if missing.is_empty() {
        report.exit_code()
    } else {
        1
    }
}

fn show(args: &ShowArgs) -> anyhow::Result<()> {
    let config = load_project(&args.files)?;
    let report_args = args
        .files
        .iter()
        .map(|f| f.display().to_string())
        .collect();
    let mut report = ConfigReport::new(report_args, config);

    if args.json {
        if !args.keys.is_empty() {
            bail!("command line option --json does not accept additional command line arguments");
        }
        apply_env_presets(&mut report)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if let Some(error) = report.error {
            bail!(error);
        }
        return Ok(());
    }

    if args.sh {
        if !args.keys.is_empty() {
            bail!("command line option --sh does not accept additional command line arguments");
        }
        print!("{}", report.to_shell_script());
        if let Some(error) = report.error {
            bail!(error);
        }
        return Ok(());
    }

    if !args.keys.is_empty() {
        for key in &args.keys {
            for value in lookup(&report.config, key)? {
                println!("{}", value);
            }
        }
        return Ok(());
    }

    for key in DEFAULT_KEYS {
        match lookup(&report.config, key) {
            Ok(values) if !values.is_empty() => {
                println!("NTT_{}=\"{}\"", key.to_uppercase(), values.join(" "));
            }
            Ok(_) | Err(ConfigError::KeyNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Files given on the command line form a loose project. Without files
/// the manifest of the current directory is used, if there is one.
fn load_project(files: &[PathBuf]) -> anyhow::Result<ProjectConfig> {
    if !files.is_empty() {
        return Ok(ProjectConfig::from_sources(files.to_vec()));
    }
    let cwd = std::env::current_dir()?;
    if cwd.join(MANIFEST_FILE).is_file() {
        Ok(ProjectConfig::from_file(&cwd)?)
    } else {
        debug!(dir = %cwd.display(), "no project manifest");
        Ok(ProjectConfig::from_sources(Vec::new()))
    }
}

/// Replaces the report's parameters with the overrides after the presets
/// named in `NTT_PRESETS`, and lists the effective parameters of every unit
/// of the sources under `execute`. Sources that could not be read become the
/// report's error unless it already has one.
fn apply_env_presets(report: &mut ConfigReport) -> anyhow::Result<()> {
    let presets = env_presets();
    let (sources, _) = ttcn3_files(&report.config.sources);
    let resolution = ConfigResolver::new(Arc::new(RealFileSystem::new())).resolve(
        &sources,
        &report.config.parameters,
        &presets,
    )?;

    if report.error.is_none() && !resolution.file_errors.is_empty() {
        let messages: Vec<String> = resolution.file_errors.iter().map(|e| e.to_string()).collect();
        report.error = Some(messages.join("\n"));
    }

    let parameters = &mut report.config.parameters;
    parameters.test_configs = resolution.test_configs;
    parameters.execute = resolution.execution.to_test_configs();
    Ok(())
}

fn env_presets() -> Vec<String> {
    match std::env::var_os("NTT_PRESETS") {
        Some(value) => std::env::split_paths(&value)
            .map(|p| p.to_string_lossy().into_owned())
            .filter(|p| !p.is_empty())
            .collect(),
        None => Vec::new(),
    }
}
