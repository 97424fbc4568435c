use anyhow::Result;
use axum::Router;
use clap::Parser;
use pagedex_core::IndexConfig;
use pagedex_server::build_app;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "pagedex-server")]
#[command(about = "Serve page-level tf-idf search over uploaded documents")]
struct Args {
    /// Index directory path
    #[arg(long, default_value = "./storage/index")]
    index: String,
    /// Optional JSON file with tokenizer, weighting and snippet settings
    #[arg(long)]
    config: Option<String>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = IndexConfig::load_or_default(args.config.as_deref())?;
    let app: Router = build_app(&args.index, config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
