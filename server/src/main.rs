use anyhow::Result;
use axum::Router;
use clap::Parser;
use dirsearch_core::dumps::DumpPaths;
use dirsearch_core::{EngineConfig, IndexManager};
use server::{build_app, warm_up};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Directory holding the four JSON dumps
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,
    /// Course/section catalog dump (overrides --data-dir)
    #[arg(long)]
    courses: Option<PathBuf>,
    /// Precomputed course search-index dump (overrides --data-dir)
    #[arg(long)]
    course_index: Option<PathBuf>,
    /// Employee directory dump (overrides --data-dir)
    #[arg(long)]
    employees: Option<PathBuf>,
    /// Precomputed employee search-index dump (overrides --data-dir)
    #[arg(long)]
    employee_index: Option<PathBuf>,
    /// JSON file with scoring overrides
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

impl Args {
    fn dump_paths(&self) -> DumpPaths {
        let defaults = DumpPaths::in_dir(&self.data_dir);
        DumpPaths {
            courses: self.courses.clone().unwrap_or(defaults.courses),
            course_index: self.course_index.clone().unwrap_or(defaults.course_index),
            employees: self.employees.clone().unwrap_or(defaults.employees),
            employee_index: self.employee_index.clone().unwrap_or(defaults.employee_index),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    let manager = Arc::new(IndexManager::from_dumps(args.dump_paths(), config));
    warm_up(Arc::clone(&manager));
    let app: Router = build_app(manager);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
