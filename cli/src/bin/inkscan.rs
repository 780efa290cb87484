use clap::{Parser, Subcommand};
use cli::{write_output, Job};
use color_eyre::eyre::Result;
use inkscan::{Cancellation, OutputFormat, ScanCommand, ScanConfig, ScanError, Scanner, Pipeline, VectorStyle};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Scan settings (.toml or .json); defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Abandon the scan after this many milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Also save the binarized bitmap as an image
    #[arg(long, global = true)]
    dump_bitmap: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an image as a character density matrix
    Matrix {
        #[arg(short, long)]
        input: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Describe ink regions line by line
    Vectors {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// relative | density (overrides the configured style)
        #[arg(long, value_parser = VectorStyle::from_str)]
        style: Option<VectorStyle>,
    },
    /// Export ink region boxes as GeoJSON
    Geojson {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a scan described by a job file
    Run {
        /// Path to the job file (.toml or .json)
        #[arg(short, long)]
        job: PathBuf,
    },
    /// Print the JSON schemas of the configuration, job file and commands
    Schema,
    /// Write the default configuration as TOML
    InitConfig {
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Everything one scan needs, owned so it can move onto a blocking thread
struct ScanRequest {
    input: PathBuf,
    command: ScanCommand,
    config: ScanConfig,
    dump_bitmap: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Matrix { input, output } => {
            let config = load_config(cli.config.as_deref())?;
            let request = cli.request(input, ScanCommand::CharMatrix, config);
            run_scan(request, cli.timeout_ms, output.as_deref()).await?;
        }
        Commands::Vectors { input, output, style } => {
            let config = load_config(cli.config.as_deref())?;
            let style = style.unwrap_or(config.vector_style);
            let request = cli.request(input, ScanCommand::Vectors { style }, config);
            run_scan(request, cli.timeout_ms, output.as_deref()).await?;
        }
        Commands::Geojson { input, output } => {
            let config = load_config(cli.config.as_deref())?;
            let request = cli.request(input, ScanCommand::GeoJson, config);
            run_scan(request, cli.timeout_ms, output.as_deref()).await?;
        }
        Commands::Run { job } => {
            let job = Job::from_file(job)?;
            info!("Job: {:?}", job);
            let config = job.scan_config();
            let command = match job.format {
                OutputFormat::CharMatrix => ScanCommand::CharMatrix,
                OutputFormat::Vectors => ScanCommand::Vectors { style: config.vector_style },
                OutputFormat::GeoJson => ScanCommand::GeoJson,
            };
            let request = cli.request(Path::new(&job.input), command, config);
            run_scan(request, cli.timeout_ms, job.output.as_deref().map(Path::new)).await?;
        }
        Commands::Schema => {
            let schemas = serde_json::json!({
                "config": ScanConfig::schema(),
                "job": schemars::schema_for!(Job),
                "commands": ScanCommand::schema(),
            });
            write_output(None, &format!("{}\n", serde_json::to_string_pretty(&schemas)?))?;
        }
        Commands::InitConfig { output } => {
            std::fs::write(output, ScanConfig::default().to_toml()?)?;
            info!("Default configuration written to {:?}", output);
        }
    }

    Ok(())
}

impl Cli {
    fn request(&self, input: &Path, command: ScanCommand, config: ScanConfig) -> ScanRequest {
        ScanRequest {
            input: input.to_path_buf(),
            command,
            config,
            dump_bitmap: self.dump_bitmap.clone(),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(path) => {
            let config = ScanConfig::from_file(path)?;
            info!("Loaded configuration from {:?}", path);
            Ok(config)
        }
        None => Ok(ScanConfig::default()),
    }
}

/// Scan on a blocking thread; Ctrl-C or the deadline trips the shared token
async fn run_scan(request: ScanRequest, timeout_ms: Option<u64>, output: Option<&Path>) -> Result<()> {
    let mut cancel = Cancellation::new();
    if let Some(ms) = timeout_ms {
        cancel = cancel.with_timeout(Duration::from_millis(ms));
    }

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling scan");
                cancel.cancel();
            }
        })
    };

    let input = request.input.clone();
    let scan = tokio::task::spawn_blocking(move || execute(request, cancel)).await?;
    interrupt.abort();

    let text = match scan {
        Err(ScanError::Cancelled) => {
            warn!("Scan of {:?} was cancelled", input);
            return Err(ScanError::Cancelled.into());
        }
        other => other?,
    };

    write_output(output, &text)?;
    if let Some(path) = output {
        info!("✅ Wrote {} bytes to {:?}", text.len(), path);
    }
    Ok(())
}

fn execute(request: ScanRequest, cancel: Cancellation) -> Result<String, ScanError> {
    let pipeline = Pipeline::from_config(&request.config)?.with_cancellation(cancel);
    info!("{}", pipeline.info());

    let mut scanner = Scanner::with_pipeline(pipeline);
    scanner.load_image(&request.input)?;

    match &request.dump_bitmap {
        Some(path) => scanner.execute_with_bitmap(request.command, |bitmap| {
            bitmap.to_gray_image().save(path)?;
            info!("Binarized bitmap saved to {:?}", path);
            Ok(())
        }),
        None => scanner.execute(request.command),
    }
}
