use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use toci::config::Config;
use toci::oci::client::OciClient;
use toci::oci::http::format_oci_error;
use toci::oci::{auth, identity};
use toci::query::{self, Query};
use toci::table::{self, ColumnType, Hydrate, Quals, Row};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Query OCI resources as tables
#[derive(Parser, Debug)]
#[command(name = "toci", version = toci::VERSION, about, long_about = None)]
struct Args {
    /// OCI config-file profile to use
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// OCI config file
    #[arg(long, global = true)]
    config_file: Option<PathBuf>,

    /// Region to query (repeatable, `*` for every subscribed region)
    #[arg(short, long = "region", global = true)]
    regions: Vec<String>,

    /// Compartment OCID to query (repeatable)
    #[arg(short, long = "compartment", global = true)]
    compartments: Vec<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available tables
    Tables,
    /// Describe the columns of a table
    Columns {
        table: String,
    },
    /// Query a table
    Query {
        table: String,
        /// Equality predicate `column=value` (repeatable)
        #[arg(short, long = "where", value_parser = parse_qual)]
        quals: Vec<(String, String)>,
        /// Comma-separated columns to return
        #[arg(short, long, value_delimiter = ',')]
        select: Vec<String>,
        /// Maximum number of rows
        #[arg(short, long)]
        limit: Option<u64>,
    },
    /// Show the effective configuration
    Config {
        /// Persist the effective configuration
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Jsonl,
    Yaml,
}

fn parse_qual(expr: &str) -> Result<(String, String), String> {
    Quals::parse_expr(expr).map_err(|e| e.to_string())
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("toci {} started with log level: {:?}", toci::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("toci").join("toci.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".toci").join("toci.log");
    }
    PathBuf::from("toci.log")
}

/// Layer CLI flags over the saved configuration
fn effective_config(args: &Args) -> Config {
    let mut config = Config::load();
    if args.profile.is_some() {
        config.profile = args.profile.clone();
    }
    if args.config_file.is_some() {
        config.config_file = args.config_file.clone();
    }
    if !args.regions.is_empty() {
        config.regions = args.regions.clone();
    }
    if !args.compartments.is_empty() {
        config.compartments = args.compartments.clone();
    }
    config
}

fn connect(config: &Config) -> Result<OciClient> {
    let Some(path) = config.effective_config_file() else {
        anyhow::bail!("No OCI config file found. Set OCI_CONFIG_FILE or use --config-file");
    };
    let profile_name = config.effective_profile();
    tracing::info!("Using profile {} from {}", profile_name, path.display());

    let profile = auth::load_profile(&path, &profile_name)?;
    OciClient::from_profile(&profile, config.retry_policy())
}

#[derive(Serialize)]
struct TableInfo {
    name: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
struct ColumnInfo {
    name: &'static str,
    #[serde(rename = "type")]
    kind: ColumnType,
    hydrate: Hydrate,
    description: &'static str,
}

fn print<T: Serialize>(format: OutputFormat, items: &[T]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, items)?;
            writeln!(stdout)?;
        }
        OutputFormat::Jsonl => {
            for item in items {
                serde_json::to_writer(&mut stdout, item)?;
                writeln!(stdout)?;
            }
        }
        OutputFormat::Yaml => serde_yaml::to_writer(&mut stdout, items)?,
    }
    Ok(())
}

async fn run_query(
    config: &Config,
    table: String,
    quals: Vec<(String, String)>,
    columns: Vec<String>,
    limit: Option<u64>,
) -> Result<Vec<Row>> {
    let client = connect(config)?;
    let matrix =
        identity::build_compartment_region_list(&client, &config.regions, &config.compartments)
            .await?;

    let query = Query {
        table,
        quals: quals.into_iter().collect(),
        columns,
        limit,
    };
    query::execute(&client, &matrix, &query, config.max_concurrency).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;
    let config = effective_config(&args);

    match args.command {
        Command::Tables => {
            let tables: Vec<TableInfo> = table::get_all_table_names()
                .into_iter()
                .filter_map(table::get_table)
                .map(|t| TableInfo {
                    name: t.name(),
                    description: t.description(),
                })
                .collect();
            print(args.output, &tables)
        }
        Command::Columns { table } => {
            let Some(table) = table::get_table(&table) else {
                anyhow::bail!("Unknown table: {}", table);
            };
            let columns: Vec<ColumnInfo> = table
                .columns()
                .iter()
                .map(|c| ColumnInfo {
                    name: c.name,
                    kind: c.kind,
                    hydrate: c.hydrate,
                    description: c.description,
                })
                .collect();
            print(args.output, &columns)
        }
        Command::Query {
            table,
            quals,
            select,
            limit,
        } => match run_query(&config, table, quals, select, limit).await {
            Ok(rows) => print(args.output, &rows),
            Err(e) => {
                tracing::error!("Query failed: {:?}", e);
                eprintln!("Error: {}", format_oci_error(&e));
                std::process::exit(1);
            }
        },
        Command::Config { save } => {
            if save {
                config.save()?;
            }
            print(args.output, std::slice::from_ref(&config))
        }
    }
}
