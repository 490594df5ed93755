use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::lifecycle::status::{ServiceState, ServiceStatus};

#[derive(Serialize)]
pub struct HostStatus {
    pub version: &'static str,
    pub node_id: String,
    pub services: usize,
    pub running: usize,
    pub failed: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<HostStatus> {
    Json(HostStatus {
        version: env!("CARGO_PKG_VERSION"),
        node_id: state.node_id.to_string(),
        services: state.board.len(),
        running: state.board.count_in(ServiceState::Running),
        failed: state.board.count_in(ServiceState::Failed),
    })
}

pub async fn get_services(State(state): State<AdminState>) -> Json<Vec<ServiceStatus>> {
    Json(state.board.all())
}

pub async fn get_service(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Result<Json<ServiceStatus>, StatusCode> {
    state.board.get(&name).map(Json).ok_or(StatusCode::NOT_FOUND)
}
