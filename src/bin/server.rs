use std::{fs::OpenOptions, net::SocketAddr, path::Path, process::ExitCode, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::{
    EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt,
};

use kakeibo_rs::{
    AppState, HttpMembershipOracle, ServerConfig, build_router, graceful_shutdown,
    logging_middleware,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServerConfig::parse();

    if let Err(error) = setup_logging(config.log_file.as_deref()) {
        eprintln!("Could not set up logging: {error}");
        return ExitCode::FAILURE;
    }

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("Server stopped with an error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let membership_oracle = HttpMembershipOracle::new(
        &config.user_service_url,
        &config.session_cookie_name,
        config.oracle_timeout(),
        config.oracle_max_idle_connections,
    )?;

    let connection = Connection::open(&config.db_path)?;
    let state = AppState::new(
        connection,
        config.sql_timeout(),
        &config.session_cookie_name,
        Arc::new(membership_oracle),
    )?;

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TimeoutLayer::new(config.request_timeout()));
    let router = add_tracing_layer(router);

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

fn setup_logging(log_file: Option<&Path>) -> Result<(), std::io::Error> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty().with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );

    let debug_log = match log_file {
        Some(path) => {
            let log_file = OpenOptions::new().create(true).append(true).open(path)?;

            Some(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(false)
                    .with_writer(Arc::new(log_file))
                    .with_filter(filter::LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
