use std::net::SocketAddr;
use std::time::Duration;

use collegium::router::init_router;
use collegium::state::init_app_state;
use collegium_observability::{init_metrics, init_tracing, metrics_app, shutdown_tracer};
use dotenvy::dotenv;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let metrics_handle = init_metrics();

    let pool = collegium_db::init_db_pool()
        .await
        .expect("Failed to connect to database");
    collegium_db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    match collegium_db::ensure_default_branch(&pool).await {
        Ok(id) => info!(branch.id = %id, "active branch available"),
        Err(e) => error!(error = %e, "failed to ensure default branch"),
    }

    let state = init_app_state(pool);
    let bind_address = state.server_config.bind_address();
    let reconciler = state.image_cleanup.clone().spawn_reconciler(
        Duration::from_secs(state.server_config.image_reconcile_interval_secs),
        state.server_config.image_reconcile_batch_size,
    );

    let mut app = init_router(state);
    if let Some(handle) = metrics_handle {
        app = app.merge(metrics_app(handle));
    }

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .expect("Failed to bind address");
    info!("🚀 Server running on http://{}", bind_address);
    info!("📚 Swagger UI available at http://{}/swagger-ui", bind_address);
    info!("📖 Scalar UI available at http://{}/scalar", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    reconciler.abort();
    shutdown_tracer().await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
