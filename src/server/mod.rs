//! HTTP surface: axum router, CORS, request logging and graceful shutdown.
mod error;
mod routes;

pub use error::ApiError;
pub use routes::{Acknowledged, EmailQuery, LIVENESS_TEXT};

use axum::{
    Router,
    extract::Request,
    http::{Method, header::CONTENT_TYPE},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
};
use log::{error, info};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::service::VisaService;
use routes::{
    add_applied_visa_handler, add_visa_handler, applied_visas_handler, delete_applied_visa_handler,
    delete_visa_handler, get_visas_handler, latest_visas_handler, liveness_handler,
    my_added_visas_handler, update_visa_handler, visa_details_handler,
};

/// Build the application router over `service`.
pub fn router(service: VisaService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(liveness_handler))
        .route("/addVisa", post(add_visa_handler))
        .route("/getVisas", get(get_visas_handler))
        .route("/latestVisas", get(latest_visas_handler))
        .route("/visaDetails/{id}", get(visa_details_handler))
        .route("/myAddedVisas", get(my_added_visas_handler))
        .route("/myAddedVisas/update/{id}", patch(update_visa_handler))
        .route("/deleteVisa/{id}", delete(delete_visa_handler))
        .route("/appliedVisa", get(applied_visas_handler).post(add_applied_visa_handler))
        .route("/appliedVisa/{id}", delete(delete_applied_visa_handler))
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
        .with_state(service)
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let res = next.run(req).await;
    info!("{method} {path} -> {} ({:?})", res.status().as_u16(), started.elapsed());
    res
}

/// Bind `0.0.0.0:{port}` and serve until Ctrl-C or SIGTERM.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(cfg: &Config, service: VisaService) -> std::io::Result<()> {
    let address = cfg.listen_address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    serve_on(listener, service).await
}

/// Serve on an already bound listener.
///
/// # Errors
/// Returns an error if the server fails.
pub async fn serve_on(listener: TcpListener, service: VisaService) -> std::io::Result<()> {
    info!("Server running on {} (store: {})", listener.local_addr()?, service.store().backend());
    axum::serve(listener, router(service)).with_graceful_shutdown(shutdown_signal()).await?;
    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
