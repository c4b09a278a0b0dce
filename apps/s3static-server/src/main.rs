//! s3static server: multi-tenant static websites from S3-compatible buckets.
//!
//! Every request's host selects a bucket (by alias or by stripping a root
//! domain), and the path is served from that bucket with index/error document
//! fallbacks and optional directory listings.
//!
//! # Usage
//!
//! ```text
//! s3static-server --config /etc/s3static/config.toml
//! s3static-server --config config.toml --dump-alias
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `S3STATIC_LISTEN` | Bind address |
//! | `S3STATIC_ENDPOINT` | Object store endpoint |
//! | `S3STATIC_REGION` | Signing region |
//! | `S3STATIC_ACCESS_KEY` / `S3STATIC_SECRET_KEY` | Static credentials |
//! | `S3STATIC_SECURE` | Use https for bare endpoints |
//! | `S3STATIC_DOMAINS` | Comma-separated root domains |
//! | `LOG_LEVEL` | Log level filter |
//! | `RUST_LOG` | Fine-grained tracing filter (overrides everything else) |

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use s3static_core::{
    DomainResolver, ListingRenderer, ObjectStore, PathResolutionEngine, PolicyTable, SiteConfig,
};
use s3static_http::{HEALTH_PATH, StaticSiteService};
use s3static_s3::{S3ObjectStore, S3StoreConfig};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Filter directives that expose the S3 SDK's wire traffic.
const S3_DEBUG_DIRECTIVES: &str = "aws_smithy_runtime=trace,aws_sdk_s3=debug";

#[derive(Debug, Parser)]
#[command(name = "s3static-server", version)]
#[command(about = "Serve static websites from S3-compatible buckets", long_about = None)]
struct Cli {
    /// Configuration file (TOML, or JSON when the extension is `.json`)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Force debug logging
    #[arg(long)]
    debug: bool,

    /// Trace requests to the object store
    #[arg(long)]
    s3_debug: bool,

    /// Print the alias table as JSON and exit
    #[arg(long)]
    dump_alias: bool,

    /// Probe the running server's health endpoint and exit 0/1
    #[arg(long)]
    health_check: bool,
}

/// Compose the tracing filter from the configured level and CLI flags.
fn log_filter(log_level: &str, debug: bool, s3_debug: bool) -> String {
    let mut filter = if debug { "debug".to_owned() } else { log_level.to_owned() };
    if s3_debug {
        filter.push(',');
        filter.push_str(S3_DEBUG_DIRECTIVES);
    }
    filter
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise the composed filter. Logs go to stderr
/// so `--dump-alias` output stays clean.
fn init_tracing(filter: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(filter).with_context(|| format!("invalid log level filter: {filter}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve<S, R>(listener: TcpListener, service: StaticSiteService<S, R>) -> Result<()>
where
    S: ObjectStore + ?Sized,
    R: ListingRenderer + ?Sized,
{
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// The address the health probe connects to: the configured listen address
/// with an unspecified IP replaced by loopback.
fn health_check_addr(config_path: &Path) -> SocketAddr {
    let addr = SiteConfig::from_file(config_path)
        .and_then(|config| config.listen_addr())
        .unwrap_or_else(|_| SocketAddr::from((Ipv4Addr::UNSPECIFIED, 80)));
    let ip = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, addr.port())
}

/// Perform a health check by connecting to the server and requesting the health endpoint.
async fn run_health_check(addr: SocketAddr) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET {HEALTH_PATH} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Docker HEALTHCHECK.
    if cli.health_check {
        let healthy = run_health_check(health_check_addr(&cli.config)).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let config = SiteConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    init_tracing(&log_filter(&config.log_level, cli.debug, cli.s3_debug))?;

    let table = Arc::new(PolicyTable::from_config(&config));

    if cli.dump_alias {
        let aliases = table.dump_aliases().context("failed to serialize alias table")?;
        println!("{aliases}");
        return Ok(());
    }

    info!(
        endpoint = %config.endpoint,
        domains = ?table.domains(),
        policies = table.len(),
        trust_forwarded_host = config.trust_forwarded_host,
        version = VERSION,
        "starting s3static server",
    );

    let store = Arc::new(S3ObjectStore::connect(&S3StoreConfig::from(&config)).await);
    let engine = PathResolutionEngine::new(store).with_upstream_timeout(config.upstream_timeout());
    let resolver = Arc::new(DomainResolver::new(table, config.trust_forwarded_host));
    let service = StaticSiteService::new(resolver, engine);

    let addr = config.listen_addr().context("invalid listen address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
