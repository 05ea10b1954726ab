//! HTTP and WebSocket front end for the herdtrace core.
//!
//! Routes:
//!
//! ```text
//! GET  /health
//! POST /api/treatments                      record a treatment
//! GET  /api/treatments                      role-scoped treatment list
//! GET  /api/treatments/drugs/search?q=      drug reference search
//! GET  /api/treatments/drugs/:name          drug reference lookup
//! GET  /api/consultation/vets/nearby        vets within a radius
//! POST /api/consultation/create             open + broadcast a consultation
//! PATCH /api/consultation/accept/:id        vet claims a consultation
//! PATCH /api/consultation/:id/status        direct status change
//! GET  /api/consultation/:id                single consultation
//! GET  /api/consultation/farmer/list        farmer's consultations
//! GET  /api/consultation/vet/list           vet's accepted consultations
//! GET  /api/alerts?unread=                  caller's alerts
//! PUT  /api/alerts/:id/read                 mark an alert read
//! POST /api/animals                         register an animal
//! GET  /api/animals/:id                     single animal
//! PUT  /api/vets/location                   vet position upsert
//! GET  /api/audit/verify/:hash              audit tamper check
//! GET  /ws?userId=&role=                    real-time event stream
//! ```
//!
//! Identity rides on `X-User-Id`/`X-User-Role` headers; the WebSocket takes
//! the same pair as query parameters. A background task re-runs the
//! withdrawal and overdose sweeps on a fixed interval.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, patch, post, put},
    Router,
};
use herdtrace_core::run_sweep;
use tokio::{net::TcpListener, signal, task, time::interval};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

use config::Config;
use error::AppError;
use routes::{
    alerts, animals, audit, consultations, drugs, health, treatments, vets, USER_ID_HEADER,
    USER_ROLE_HEADER,
};
use state::AppState;

pub async fn start_server(state: Arc<AppState>) -> anyhow::Result<()> {
    let app = app(state.clone());

    spawn_sweep(state.clone());

    let addr = state.config.addr.clone();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server running on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutting down");
    Ok(())
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health::check))
        .route(
            "/api/treatments",
            post(treatments::add).get(treatments::list),
        )
        .route("/api/treatments/drugs/search", get(drugs::search))
        .route("/api/treatments/drugs/:name", get(drugs::get_by_name))
        .route("/api/consultation/vets/nearby", get(consultations::nearby))
        .route("/api/consultation/create", post(consultations::create))
        .route("/api/consultation/accept/:id", patch(consultations::accept))
        .route(
            "/api/consultation/:id/status",
            patch(consultations::update_status),
        )
        .route("/api/consultation/:id", get(consultations::get_by_id))
        .route(
            "/api/consultation/farmer/list",
            get(consultations::farmer_list),
        )
        .route("/api/consultation/vet/list", get(consultations::vet_list))
        .route("/api/alerts", get(alerts::list))
        .route("/api/alerts/:id/read", put(alerts::mark_read))
        .route("/api/animals", post(animals::register))
        .route("/api/animals/:id", get(animals::get_by_id))
        .route("/api/vets/location", put(vets::update_location))
        .route("/api/audit/verify/:hash", get(audit::verify))
        .route("/ws", get(ws::ws_handler))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, USER_ID_HEADER, USER_ROLE_HEADER])
        .max_age(Duration::from_secs(60 * 60));

    match &config.cors_origin {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => cors.allow_origin(value),
            Err(_) => {
                warn!("Invalid HERDTRACE_CORS_ORIGIN {origin:?}, allowing any origin");
                cors.allow_origin(Any)
            }
        },
        None => cors.allow_origin(Any),
    }
}

/// Re-run the withdrawal and overdose sweeps for the life of the process.
/// The first run happens immediately on startup.
fn spawn_sweep(state: Arc<AppState>) {
    let period = Duration::from_secs(state.config.sweep_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            let state = state.clone();
            let outcome = task::spawn_blocking(move || {
                let db = state.db()?;
                run_sweep(&db, state.notifier.as_ref()).map_err(AppError::from)
            })
            .await;
            match outcome {
                Ok(Ok(stats)) => info!(
                    withdrawal_checked = stats.withdrawal_checked,
                    withdrawal_alerts = stats.withdrawal_alerts,
                    completed = stats.completed,
                    overdose_checked = stats.overdose_checked,
                    overdose_alerts = stats.overdose_alerts,
                    "sweep finished"
                ),
                Ok(Err(err)) => error!(error = %err, "sweep failed"),
                Err(err) => error!(error = %err, "sweep task panicked"),
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(err) => {
                error!(error = %err, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                error!(error = %err, "failed to install signal handler");
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
}
