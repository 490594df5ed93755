//! Read-only admin API over the service board.
//!
//! ```text
//! GET /admin/status            host version, node id, service counts
//! GET /admin/services          every service status
//! GET /admin/services/{name}   one service status (404 if unknown)
//! ```
//!
//! All routes require `Authorization: Bearer <admin.api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::config::AdminConfig;
use crate::lifecycle::status::ServiceBoard;
use crate::lifecycle::ShutdownSignal;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub node_id: Arc<str>,
    pub board: ServiceBoard,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(node_id: &str, board: ServiceBoard, api_key: &str) -> Self {
        Self {
            node_id: Arc::from(node_id),
            board,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/services", get(get_services))
        .route("/admin/services/{name}", get(get_service))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the admin listener and serve until `shutdown` fires.
///
/// Binding happens before this returns, so a bad address is a startup error.
pub async fn serve(
    config: &AdminConfig,
    state: AdminState,
    mut shutdown: ShutdownSignal,
) -> std::io::Result<JoinHandle<()>> {
    let listener = TcpListener::bind(&config.bind_address).await?;
    let address = listener.local_addr()?;
    tracing::info!(address = %address, "Admin API listening");

    let router = setup_admin_router(state);
    Ok(tokio::spawn(async move {
        let server = axum::serve(listener, router).with_graceful_shutdown(async move {
            shutdown.recv().await;
        });
        if let Err(e) = server.await {
            tracing::error!(error = %e, "Admin API failed");
        }
        tracing::info!("Admin API stopped");
    }))
}
