use std::{process, sync::Arc};

use fedcache::{
    application::{error::AppError, store::CachedStore},
    cache::{CacheKind, CacheRegistry},
    config,
    infra::{
        error::InfraError,
        http::{self, PageLimits, RouterState},
        memory::MemoryRepositories,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    match command {
        config::Command::Serve(_) => {
            telemetry::init(&settings.logging).map_err(AppError::from)?;
            run_serve(settings).await
        }
        config::Command::Caches => {
            print_cache_settings(&settings);
            Ok(())
        }
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let caches = Arc::new(CacheRegistry::init(settings.cache.clone())?);
    caches.start().await?;

    let repositories = Arc::new(MemoryRepositories::new());
    let store = CachedStore::new(
        caches.clone(),
        repositories.clone(),
        repositories.clone(),
        repositories,
    );
    let state = RouterState::new(
        store,
        settings.server.public_url.clone(),
        PageLimits {
            default: settings.pagination.default_limit,
            max: settings.pagination.max_limit,
        },
    );

    let result = serve_http(&settings, state).await;

    match tokio::time::timeout(settings.server.graceful_shutdown, caches.stop()).await {
        Ok(Ok(())) => info!("cache registry stopped"),
        Ok(Err(err)) => warn!(error = %err, "cache registry stop failed"),
        Err(_) => warn!(
            timeout_secs = settings.server.graceful_shutdown.as_secs(),
            "timed out waiting for cache sweeps to stop"
        ),
    }

    result
}

async fn serve_http(settings: &config::Settings, state: RouterState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, public_url = %settings.server.public_url, "listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            warn!(error = %err, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

fn print_cache_settings(settings: &config::Settings) {
    println!(
        "{:<20} {:>9} {:>9} {:>9} {:>9}",
        "cache", "max_size", "ttl_s", "sweep_s", "negative"
    );
    for kind in CacheKind::ALL {
        let cache = settings.cache.get(kind);
        println!(
            "{:<20} {:>9} {:>9} {:>9} {:>9}",
            kind.name(),
            cache.max_size,
            cache.ttl.as_secs(),
            cache.sweep_freq.as_secs(),
            cache.negative
        );
    }
}
