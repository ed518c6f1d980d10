use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use pubscraper::config::{find_config_file, get_config, load_config, ConfigFile};
use pubscraper::io::{export_to_path, read_author_names, write_csv, write_json, ExportFormat};
use pubscraper::pipeline::AggregateError;
use pubscraper::{Aggregator, Config, SourceRegistry, SourceType};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pubscraper - Collect publication metadata for a list of authors from multiple bibliographic APIs
#[derive(Parser, Debug)]
#[command(name = "pubscraper")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Collect publication metadata for a list of authors from multiple bibliographic APIs", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the configuration file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Export file format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FileFormat {
    Json,
    Csv,
}

impl From<FileFormat> for ExportFormat {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Json => ExportFormat::Json,
            FileFormat::Csv => ExportFormat::Csv,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Collect publications for a list of authors
    #[command(alias = "s")]
    Search(SearchArgs),

    /// List available sources
    #[command(alias = "ls")]
    Sources,

    /// Show the effective configuration or write a starter file
    Config {
        /// Write a default configuration file to this path
        #[arg(long)]
        init: Option<PathBuf>,
    },
}

/// A command-line option that cannot be honoured (exit code 2)
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct InvalidOption(String);

/// Exit status when the run is interrupted with Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

fn exit_status(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<InvalidOption>().is_some()
        || err.downcast_ref::<AggregateError>().is_some()
    {
        2
    } else {
        1
    }
}

fn load_configuration(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        load_config(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else {
        get_config()
    };

    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }

    Ok(config)
}

fn init_tracing(cli: &Cli, config: &Config) {
    let log_level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.logging.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("pubscraper={}", log_level)),
    );

    let format = cli.log_format.unwrap_or_else(|| {
        match config.logging.format.as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(1);
        }
    };

    init_tracing(&cli, &config);

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    match cli.command {
        Commands::Search(search) => search.run(&config).await,

        Commands::Sources => {
            let registry = SourceRegistry::from_config(&config)?;
            println!("Available sources ({}):\n", registry.len());
            for source in registry.all() {
                let offset = if source.supports_offset() {
                    "paginated"
                } else {
                    "single page"
                };
                println!(
                    "  {:<10} {:<10} {:<12} requires: {}",
                    source.id(),
                    source.name(),
                    offset,
                    source.required_fields().field_names().join(", ")
                );
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Config { init } => {
            match init {
                Some(path) => {
                    if path.exists() {
                        return Err(InvalidOption(format!(
                            "{} already exists",
                            path.display()
                        ))
                        .into());
                    }
                    ConfigFile::default().save(&path)?;
                    println!("Wrote default configuration to {}", path.display());
                }
                None => {
                    let rendered = toml::to_string_pretty(&config)
                        .context("Failed to render configuration")?;
                    print!("{}", rendered);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// File with author names (.txt, .csv or .json)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Author name (can be repeated)
    #[arg(long = "author", short = 'a')]
    authors: Vec<String>,

    /// Maximum number of valid publications per author and source
    #[arg(long, short = 'n', default_value_t = 10, allow_negative_numbers = true)]
    rows: i64,

    /// Comma-separated sources to query, or "all" (default: configured sources)
    #[arg(long, short)]
    source: Option<String>,

    /// Drop publications dated after this day (YYYY-MM-DD)
    #[arg(long)]
    cutoff: Option<String>,

    /// Output format (default: from the output extension, else JSON)
    #[arg(long, short, value_enum)]
    format: Option<FileFormat>,

    /// Output file (default: stdout)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl SearchArgs {
    /// Check every option before any file is read or request is made
    fn validate(&self, config: &Config) -> Result<(Vec<SourceType>, Option<NaiveDate>)> {
        if self.rows < 0 {
            return Err(InvalidOption(format!(
                "--rows must be non-negative (received {})",
                self.rows
            ))
            .into());
        }

        let sources = match &self.source {
            Some(list) => SourceType::parse_list(list),
            None => config.sources.enabled(),
        }
        .map_err(|e| InvalidOption(e.to_string()))?;

        if sources.is_empty() {
            return Err(InvalidOption("no sources selected".to_string()).into());
        }

        let cutoff = self
            .cutoff
            .as_deref()
            .map(|raw| {
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                    InvalidOption(format!("invalid cutoff date '{}', expected YYYY-MM-DD", raw))
                })
            })
            .transpose()?;

        if self.input.is_none() && self.authors.is_empty() {
            return Err(InvalidOption("no authors given: use --input or --author".to_string()).into());
        }

        Ok((sources, cutoff))
    }

    fn export_format(&self) -> ExportFormat {
        self.format
            .map(ExportFormat::from)
            .or_else(|| self.output.as_deref().and_then(ExportFormat::from_path))
            .unwrap_or_default()
    }

    async fn run(self, config: &Config) -> Result<ExitCode> {
        let (sources, cutoff) = self.validate(config)?;

        let mut names = self.authors.clone();
        if let Some(path) = &self.input {
            names.extend(read_author_names(path)?);
        }

        let aggregator = Aggregator::from_config(config)?;
        tracing::info!(
            "Querying {} for {} author names",
            sources
                .iter()
                .map(|source| source.name())
                .collect::<Vec<_>>()
                .join(", "),
            names.len()
        );

        let result = tokio::select! {
            result = aggregator.aggregate(&names, self.rows, &sources) => result?,
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("Interrupted, no output written");
                return Ok(ExitCode::from(EXIT_INTERRUPTED));
            }
        };

        let result = match cutoff {
            Some(cutoff) => result.with_cutoff(cutoff),
            None => result,
        };

        let format = self.export_format();
        match &self.output {
            Some(path) => export_to_path(&result, path, format)?,
            None => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                match format {
                    ExportFormat::Json => {
                        write_json(&result, &mut handle)?;
                        writeln!(handle)?;
                    }
                    ExportFormat::Csv => write_csv(&result, &mut handle)?,
                }
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}
