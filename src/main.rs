//! image-proxy - A caching image delivery proxy.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_proxy::{
    cache::{CacheStore, MemoryEngine},
    config::Config,
    proxy::ProxyService,
    server::{create_router, RouterConfig},
    source::{is_remote, FileSystemSource, HttpSource, ImageSource},
    transform::TransformPipeline,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("image-proxy v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!(
        "  Source: {} ({})",
        config.source,
        if is_remote(&config.source) {
            "remote origin"
        } else {
            "local directory"
        }
    );
    info!(
        "  Cache: {} engine, {}MB / {} entries, TTL {}s",
        config.cache_engine,
        config.cache_bytes / (1024 * 1024),
        config.cache_entries,
        config.cache_ttl_ms / 1000
    );
    info!("  JPEG quality: {}", config.jpeg_quality);
    for (format, optimizer) in [
        ("jpg", &config.jpg_optimizer),
        ("png", &config.png_optimizer),
        ("gif", &config.gif_optimizer),
        ("svg", &config.svg_optimizer),
    ] {
        if let Some(cmd) = optimizer {
            info!("  Optimizer ({}): {}", format, cmd);
        }
    }

    // Create the cache store
    let engine = Arc::new(MemoryEngine::with_capacity(
        config.cache_bytes,
        config.cache_entries,
    ));
    let cache = CacheStore::new(engine, config.cache_ttl());

    if let Err(e) = cache.start().await {
        error!("Failed to start cache engine: {}", e);
        return ExitCode::FAILURE;
    }

    // Create the transform pipeline
    let pipeline = TransformPipeline::new(config.pipeline_config());

    // Classify the source base and serve. ProxyService is generic over its
    // source backend, so each classification builds its own router.
    if is_remote(&config.source) {
        let client = match reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to build HTTP client: {}", e);
                return ExitCode::FAILURE;
            }
        };

        let source = match HttpSource::from_base(&config.source, client) {
            Ok(source) => source,
            Err(e) => {
                error!("Invalid source URL '{}': {}", config.source, e);
                return ExitCode::FAILURE;
            }
        };

        serve(&config, ProxyService::new(cache, source, pipeline)).await
    } else {
        let source = FileSystemSource::new(&config.source);
        serve(&config, ProxyService::new(cache, source, pipeline)).await
    }
}

/// Bind the listener and run the server until it exits.
async fn serve<S>(config: &Config, service: ProxyService<S>) -> ExitCode
where
    S: ImageSource + 'static,
{
    let router_config = RouterConfig::new().with_tracing(!config.no_tracing);
    let router = create_router(service, router_config);

    let addr = config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  Try: curl http://{}/health", addr);
    info!("  Fetch an image: curl http://{}/<filename>,w100", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "image_proxy=debug,tower_http=debug"
    } else {
        "image_proxy=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
