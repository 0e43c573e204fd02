use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use hashtab_cli::config::{AppConfig, ConfigManager};
use hashtab_cli::error::{self, ExitCode};
use hashtab_cli::file_discovery::{FileDiscoveryOptions, collect_inputs};
use hashtab_cli::orchestrators::{HashOptions, HashOrchestrator, HashRun};
use hashtab_cli::output::{OutputFormat, create_formatter};
use hashtab_cli::progress::{format_bytes, format_duration, format_throughput};
use hashtab_cli::terminal;
use hashtab_core::{AlgorithmRegistry, AlgorithmSelection, MatchState, TaskState};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hashtab")]
#[command(author, version, about = "Hash files with many algorithms at once, reading each file only once", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate hashes for files and directories
    Hash(HashArgs),

    /// List supported hash algorithms
    Algorithms {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args)]
struct HashArgs {
    /// Files or directories to hash
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Algorithm as name[:bits] (repeatable; defaults to hashing.default_algorithms)
    #[arg(short, long = "algorithm", value_name = "NAME[:BITS]")]
    algorithms: Vec<String>,

    /// Expected digest in hex, checked against every file (repeatable)
    #[arg(long = "expect", value_name = "HEX")]
    expected: Vec<String>,

    /// Output format (defaults to output.default_format)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Include patterns for directory contents (glob, repeatable)
    #[arg(short = 'i', long = "include", value_name = "PATTERN")]
    include_patterns: Vec<String>,

    /// Exclude patterns for directory contents (glob, repeatable, overrides includes)
    #[arg(short = 'e', long = "exclude", value_name = "PATTERN")]
    exclude_patterns: Vec<String>,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Disable progress bar display
    #[arg(long)]
    no_progress: bool,

    /// Read block size in bytes
    #[arg(long, value_name = "BYTES")]
    block_size: Option<usize>,

    /// Maximum number of blocks held in memory at once
    #[arg(long, value_name = "COUNT")]
    max_blocks: Option<usize>,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the configuration file path
    Path,

    /// Print the effective configuration as TOML
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key (e.g., core.block_size)
        key: String,
    },

    /// Set a configuration value in the configuration file
    Set {
        /// Configuration key (e.g., hashing.default_algorithms)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration values
    List,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on debug flag
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Debug)
            .filter_module("hashtab_core", log::LevelFilter::Debug)
            .filter_module("hashtab_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match run(cli.command).await {
        Ok(code) => code.into(),
        Err(e) => {
            eprint!("{}", error::format_for_user(&e, cli.debug));
            ExitCode::Failure.into()
        }
    }
}

async fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Hash(args) => {
            let config = ConfigManager::new()
                .load()
                .context("Failed to load configuration")?;
            hash_command(config, args).await
        }
        Commands::Algorithms { format } => {
            algorithms_command(format)?;
            Ok(ExitCode::Success)
        }
        Commands::Config { command } => {
            config_command(command)?;
            Ok(ExitCode::Success)
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(ExitCode::Success)
        }
    }
}

async fn hash_command(mut config: AppConfig, args: HashArgs) -> Result<ExitCode> {
    config.apply_cli_overrides(args.block_size, args.max_blocks);
    config
        .core
        .validate()
        .context("Invalid --block-size or --max-blocks")?;

    let use_color = terminal::use_color(config.output.color_enabled);
    colored::control::set_override(use_color);

    let selection = if args.algorithms.is_empty() {
        config.default_selection()?
    } else {
        AlgorithmSelection::from_names(&args.algorithms).context("Invalid --algorithm")?
    };

    let expected = args
        .expected
        .iter()
        .map(|digest| {
            hex::decode(digest.trim())
                .with_context(|| format!("--expect '{digest}' is not a hex digest"))
        })
        .collect::<Result<Vec<_>>>()?;

    let options = FileDiscoveryOptions::new()
        .with_include_patterns(args.include_patterns)
        .with_exclude_patterns(args.exclude_patterns)
        .with_recursive(args.recursive);
    let files = collect_inputs(&args.paths, &options)?;

    if files.is_empty() {
        eprintln!("{}", "No matching files found.".yellow());
        return Ok(ExitCode::Success);
    }
    log::debug!("Found {} file(s) to hash", files.len());

    let show_progress = !args.no_progress
        && config.output.progress_enabled
        && terminal::should_show_progress_by_default();

    let orchestrator = HashOrchestrator::new(config.core.clone());
    let run = orchestrator
        .run(
            &files,
            HashOptions {
                selection,
                expected,
                show_progress,
            },
        )
        .await?;

    let format = args.format.unwrap_or(config.output.default_format);
    let formatter = create_formatter(format, use_color);
    println!("{}", formatter.format_batch(&run.reports)?.trim_end());

    if format == OutputFormat::Text && terminal::is_interactive() {
        print_summary(&run);
    }

    Ok(ExitCode::for_reports(&run.reports))
}

fn print_summary(run: &HashRun) {
    let count = |state: TaskState| run.reports.iter().filter(|r| r.state == state).count();
    let failed = count(TaskState::Errored);
    let cancelled = count(TaskState::Cancelled);
    let matched = run.reports.iter().filter(|r| r.match_state.is_match()).count();
    let mismatched = run
        .reports
        .iter()
        .filter(|r| r.match_state == MatchState::AllMismatch)
        .count();

    eprintln!("\n{}", "Summary:".bold().green());
    eprintln!("Files: {}", run.reports.len());
    eprintln!("Total size: {}", format_bytes(run.total_bytes));
    eprintln!(
        "Time: {} ({:.2}s)",
        format_duration(run.elapsed),
        run.elapsed.as_secs_f64()
    );
    if let Some(throughput) = format_throughput(run.total_bytes, run.elapsed) {
        eprintln!("Throughput: {throughput}");
    }
    if matched + mismatched > 0 {
        eprintln!("Matched: {matched}, mismatched: {mismatched}");
    }
    if failed > 0 {
        eprintln!("{}", format!("Failed: {failed}").red());
    }
    if run.cancelled || cancelled > 0 {
        eprintln!("{}", format!("Cancelled: {cancelled}").yellow());
    }
    log::debug!(
        "Block pool: {} allocations, {} handoffs, peak {} outstanding",
        run.pool.allocations,
        run.pool.handoffs,
        run.pool.peak_outstanding
    );
}

fn algorithms_command(format: OutputFormat) -> Result<()> {
    let registry = AlgorithmRegistry::global();

    match format {
        OutputFormat::Text => {
            println!("{:<10} {:>6}  {:<8} {}", "NAME", "BITS", "SECURE", "PARAMETER");
            for algorithm in registry.list() {
                let parameter = algorithm.param_schema().map_or_else(String::new, |schema| {
                    format!("{} (default {}, max {})", schema.name, schema.default_bits, schema.max_bits)
                });
                println!(
                    "{:<10} {:>6}  {:<8} {}",
                    algorithm.id(),
                    algorithm.default_output_size() * 8,
                    if algorithm.is_secure() { "yes" } else { "no" },
                    parameter
                );
            }
        }
        OutputFormat::Json | OutputFormat::JsonLines => {
            let entries: Vec<_> = registry
                .list()
                .map(|algorithm| {
                    serde_json::json!({
                        "name": algorithm.id(),
                        "display_name": algorithm.display_name(),
                        "bits": algorithm.default_output_size() * 8,
                        "secure": algorithm.is_secure(),
                        "parameter": algorithm.param_schema().map(|schema| serde_json::json!({
                            "name": schema.name,
                            "default_bits": schema.default_bits,
                            "max_bits": schema.max_bits,
                        })),
                    })
                })
                .collect();
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in entries {
                    println!("{}", serde_json::to_string(&entry)?);
                }
            }
        }
    }

    Ok(())
}

fn config_command(command: ConfigCommand) -> Result<()> {
    let mut manager = ConfigManager::new();

    match command {
        ConfigCommand::Path => {
            println!("{}", manager.get_config_path().display());
        }
        ConfigCommand::Show => {
            print!("{}", manager.show()?);
        }
        ConfigCommand::Get { key } => {
            println!("{}", manager.get(&key)?);
        }
        ConfigCommand::Set { key, value } => {
            manager.set(&key, &value)?;
            eprintln!("{}", format!("Set {key} = {value}").green());
            eprintln!(
                "Configuration saved to: {}",
                manager.get_config_path().display()
            );
        }
        ConfigCommand::List => {
            eprintln!("Config file: {}", manager.get_config_path().display());
            for (key, value) in manager.list()? {
                println!("{} = {}", key.cyan(), value);
            }
        }
    }

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
