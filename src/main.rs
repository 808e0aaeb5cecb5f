//! tiercache - Multi-Level Cache Operator Binary
//!
//! Validates cache configurations and runs a standalone cache instance that
//! exposes its statistics over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                      tiercache serve                       │
//! ├───────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐    ┌──────────────┐    ┌─────────────┐  │
//! │  │  YAML config │───▶│ MultiLevel   │───▶│ HTTP server │  │
//! │  │  (validated) │    │ Cache+sweep  │    │ /metrics    │  │
//! │  │              │    │              │    │ /health     │  │
//! │  └──────────────┘    └──────────────┘    └─────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tiercache::{CacheConfig, MultiLevelCache};

// =============================================================================
// CLI Arguments
// =============================================================================

/// tiercache - Multi-level in-process cache
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a YAML cache configuration and print its levels
    Check {
        /// Path to the configuration file
        config: PathBuf,
    },

    /// Run a cache instance serving /metrics and /health until Ctrl-C
    Serve {
        /// Path to the configuration file (defaults to the three-tier preset)
        #[arg(long, env = "TIERCACHE_CONFIG")]
        config: Option<PathBuf>,

        /// HTTP bind address
        #[arg(long, env = "TIERCACHE_ADDR", default_value = "0.0.0.0:8080")]
        addr: String,
    },
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    match args.command {
        Command::Check { config } => check(&config),
        Command::Serve { config, addr } => serve(config, &addr).await,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CacheConfig> {
    match path {
        Some(path) => CacheConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(CacheConfig::three_tier()),
    }
}

fn check(path: &Path) -> anyhow::Result<()> {
    let config = load_config(Some(path))?;

    let mut levels: Vec<_> = config.levels.iter().collect();
    levels.sort_by_key(|l| l.priority);

    println!("{:<16} {:>8} {:>12} {:>12}", "LEVEL", "PRIORITY", "TTL_MS", "MAX_SIZE");
    for level in levels {
        println!(
            "{:<16} {:>8} {:>12} {:>12}",
            level.name,
            level.priority,
            config.level_ttl_ms(level),
            level.max_size
        );
    }
    println!();
    println!(
        "compression: {} (threshold {} bytes), metrics: {}, sweep every {} ms",
        config.enable_compression,
        config.compression_threshold_bytes,
        config.enable_metrics,
        config.sweep_interval_ms
    );

    Ok(())
}

async fn serve(path: Option<PathBuf>, addr: &str) -> anyhow::Result<()> {
    let mut config = load_config(path.as_deref())?;
    // A served instance always exposes its metrics
    config.enable_metrics = true;

    info!("Starting tiercache");
    for level in &config.levels {
        info!(
            "  Level {}: priority {}, ttl {} ms, max {} entries",
            level.name,
            level.priority,
            config.level_ttl_ms(level),
            level.max_size
        );
    }

    let cache = Arc::new(MultiLevelCache::new(config)?);
    cache.start_expiry_sweep()?;

    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("Invalid server address: {}", addr))?;

    tokio::select! {
        result = run_http_server(addr, Arc::clone(&cache)) => {
            if let Err(e) = &result {
                error!("HTTP server error: {:#}", e);
            }
            result?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("Received Ctrl-C, shutting down");
        }
    }

    cache.shutdown();
    info!("tiercache shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse()?);

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }

    Ok(())
}

// =============================================================================
// HTTP Server
// =============================================================================

async fn run_http_server(addr: SocketAddr, cache: Arc<MultiLevelCache>) -> anyhow::Result<()> {
    use http_body_util::Full;
    use hyper::body::Bytes;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{header, Request, Response, StatusCode};
    use hyper_util::rt::TokioIo;
    use tokio::net::TcpListener;

    fn respond(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(body.into()));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, header::HeaderValue::from_static(content_type));
        response
    }

    async fn handler(
        req: Request<hyper::body::Incoming>,
        cache: Arc<MultiLevelCache>,
    ) -> std::result::Result<Response<Full<Bytes>>, std::convert::Infallible> {
        let response = match req.uri().path() {
            "/metrics" => match cache.encode_metrics() {
                Ok(text) => respond(StatusCode::OK, "text/plain; version=0.0.4", text),
                Err(e) => {
                    error!("Failed to encode metrics: {}", e);
                    respond(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", "metrics unavailable")
                }
            },
            "/health" | "/healthz" => match serde_json::to_vec(&cache.stats()) {
                Ok(body) => respond(StatusCode::OK, "application/json", body),
                Err(e) => {
                    error!("Failed to serialize stats: {}", e);
                    respond(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", "stats unavailable")
                }
            },
            _ => respond(StatusCode::NOT_FOUND, "text/plain", "not found"),
        };
        Ok(response)
    }

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server on {}", addr))?;

    info!("HTTP server listening on {}", addr);

    loop {
        let (stream, _) = listener.accept().await.context("HTTP server accept error")?;

        let io = TokioIo::new(stream);
        let cache = Arc::clone(&cache);

        tokio::spawn(async move {
            let service = service_fn(move |req| handler(req, Arc::clone(&cache)));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::error!("HTTP connection error: {}", e);
            }
        });
    }
}
