use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use function_cloudflare_nsg::resource::RunFunctionRequest;
use function_cloudflare_nsg::{server, Config, Function};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Composition function allowing Cloudflare IPv4 ranges through an Azure NSG
#[derive(Parser, Debug)]
#[command(name = "function-cloudflare-nsg", version, about, long_about = None)]
struct Args {
    /// Config file (JSON, or YAML by extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the address-range endpoint
    #[arg(long, global = true)]
    ranges_url: Option<String>,

    /// Override the per-request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Override the number of retries for transient fetch failures
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the function over HTTP
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        listen: Option<String>,
    },
    /// Run the function once against a request read from a file or stdin
    Run {
        /// Request file (JSON or YAML); stdin when omitted
        #[arg(short, long)]
        request: Option<PathBuf>,

        /// Response format
        #[arg(short, long, value_enum, default_value = "json")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
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

fn setup_logging(
    level: LogLevel,
    log_file: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match level.to_tracing_level() {
            Some(level) => {
                EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
            }
            None => return Ok(None),
        },
    };

    let (non_blocking, guard) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(log_file.is_none())
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    Ok(Some(guard))
}

fn effective_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;

    if let Some(url) = &args.ranges_url {
        config.ranges_url = url.clone();
    }
    if let Some(timeout) = args.timeout_secs {
        config.request_timeout_secs = timeout;
    }
    if let Some(retries) = args.max_retries {
        config.max_retries = retries;
    }
    if let Command::Serve { listen: Some(addr) } = &args.command {
        config.listen_addr = addr.clone();
    }

    config.validate()?;
    Ok(config)
}

fn read_request(path: Option<&Path>) -> Result<RunFunctionRequest> {
    let content = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read request {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("cannot read request from stdin")?;
            buf
        }
    };

    // JSON is a subset of YAML, but JSON errors are clearer when the input is JSON
    if content.trim_start().starts_with('{') {
        serde_json::from_str(&content).context("cannot parse request JSON")
    } else {
        serde_yaml::from_str(&content).context("cannot parse request YAML")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_file.as_deref())?;

    let config = effective_config(&args)?;
    tracing::info!("Using range endpoint: {}", config.ranges_url);

    let function = Function::new(&config)?;

    match &args.command {
        Command::Serve { .. } => {
            server::start(&config.listen_addr, Arc::new(function)).await?;
        }
        Command::Run { request, output } => {
            let req = read_request(request.as_deref())?;
            let rsp = function.run_function(&req).await;

            let rendered = match output {
                OutputFormat::Json => serde_json::to_string_pretty(&rsp)?,
                OutputFormat::Yaml => serde_yaml::to_string(&rsp)?,
            };
            println!("{rendered}");

            if rsp.is_fatal() {
                anyhow::bail!("function returned a fatal result");
            }
        }
    }

    Ok(())
}
