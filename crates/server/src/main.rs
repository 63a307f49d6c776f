use clap::Parser;
use nearby::cache::MemoryPlacesCache;
use nearby::fetcher::NullUpstreamFetcher;
use nearby::prelude::{SearchConfig, SearchEngine};
use nearby_server::transport::run_server;
use nearby_server::ServerConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    port: Option<u16>,

    #[arg(long, default_value = "0.0.0.0")]
    host: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nearby_server=info,nearby=info,info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid server configuration: {e}"))?;

    let search_config = SearchConfig::default().with_max_recursion_level(config.max_recursion_level);

    if !config.places_api_credential_present() {
        info!(
            "{} is not set; upstream fetches will be unauthorized",
            config.places_api_key_env
        );
    }

    let addr: SocketAddr = format!("{}:{}", args.host, config.port).parse()?;
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl_c signal");
    };

    run_memory_backed(addr, search_config, shutdown).await
}

/// Runs the server with the in-process cache backend. The `redis-backend`
/// feature additionally compiles `nearby::cache::RedisPlacesCache`, which a
/// deployment wires in here in place of `MemoryPlacesCache` once a real
/// `REDIS_URL` is reachable; selecting between the two at startup is an
/// operational concern left to the deployment, not the engine.
async fn run_memory_backed(
    addr: SocketAddr,
    search_config: SearchConfig,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let cache = Arc::new(MemoryPlacesCache::new());
    let fetcher = Arc::new(NullUpstreamFetcher);
    let engine = Arc::new(SearchEngine::new(cache, fetcher, search_config));

    run_server(addr, engine, shutdown).await
}
