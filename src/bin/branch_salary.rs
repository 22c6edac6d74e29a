//! branch-salary - command-line interface for the Branch Salary Engine
//!
//! Commands:
//! - run: ingest the configured CSV sources, reconcile and load the warehouse
//! - serve: expose `POST /reconcile` over HTTP

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use branch_salary_engine::api::{AppState, create_router};
use branch_salary_engine::config::ConfigLoader;
use branch_salary_engine::error::EngineError;
use branch_salary_engine::sink::{MemoryWarehouse, SqliteWarehouse, WarehouseSink};
use branch_salary_engine::transform::run_job;

/// Reconcile time-clock punches into monthly labor cost per branch
#[derive(Parser)]
#[command(name = "branch-salary")]
#[command(version)]
#[command(about = "Reconcile punches into branch labor cost", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the batch job once
    Run {
        /// Configuration directory
        #[arg(short, long, default_value = "config/branch_salary")]
        config: PathBuf,

        /// Employee CSV, overriding the configured source
        #[arg(long)]
        employees: Option<PathBuf>,

        /// Timesheet CSV, overriding the configured source
        #[arg(long)]
        timesheets: Option<PathBuf>,

        /// SQLite database, overriding the configured warehouse
        #[arg(long)]
        warehouse: Option<PathBuf>,

        /// Reconcile without writing to the warehouse
        #[arg(long)]
        dry_run: bool,
    },

    /// Serve the reconcile endpoint
    Serve {
        /// Configuration directory
        #[arg(short, long, default_value = "config/branch_salary")]
        config: PathBuf,

        /// Listen address
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot encode job outcome: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Structural engine failures get a distinct code from runtime failures.
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Engine(_) => ExitCode::from(2),
            _ => ExitCode::FAILURE,
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("branch_salary_engine=info,branch_salary=info"));

    let is_json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if is_json {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let outcome = match cli.command {
        Commands::Run {
            config,
            employees,
            timesheets,
            warehouse,
            dry_run,
        } => cmd_run(config, employees, timesheets, warehouse, dry_run),
        Commands::Serve { config, addr } => cmd_serve(config, addr),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "branch-salary failed");
            eprintln!("Error: {}", err);
            err.exit_code()
        }
    }
}

fn cmd_run(
    config_dir: PathBuf,
    employees: Option<PathBuf>,
    timesheets: Option<PathBuf>,
    warehouse: Option<PathBuf>,
    dry_run: bool,
) -> Result<(), CliError> {
    let mut loader = ConfigLoader::load(&config_dir)?;

    let pipeline = loader.config_mut().pipeline_mut();
    if let Some(path) = employees {
        pipeline.sources.employees = path;
    }
    if let Some(path) = timesheets {
        pipeline.sources.timesheets = path;
    }
    if let Some(path) = warehouse {
        pipeline.warehouse.path = path;
    }

    let mut sink: Box<dyn WarehouseSink> = if dry_run {
        info!("Dry run: results are not written to the warehouse");
        Box::new(MemoryWarehouse::new())
    } else {
        Box::new(SqliteWarehouse::open(loader.warehouse())?)
    };

    let outcome = run_job(loader.config(), sink.as_mut())?;

    let json = serde_json::to_string_pretty(&outcome)?;
    println!("{}", json);
    Ok(())
}

fn cmd_serve(config_dir: PathBuf, addr: SocketAddr) -> Result<(), CliError> {
    let loader = ConfigLoader::load(&config_dir)?;
    let router = create_router(AppState::new(&loader));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| CliError::Bind { addr, source })?;
        info!(%addr, "Listening");
        axum::serve(listener, router).await?;
        Ok::<(), CliError>(())
    })
}
