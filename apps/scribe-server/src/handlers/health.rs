//! Health check endpoint.

use actix_web::{HttpResponse, web};
use scribe_core::StoreStatus;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub store: StoreStatus,
    pub posts: usize,
}

/// Health check endpoint - returns server and store status.
///
/// The process is healthy even while the store is loading or in error; the
/// store field tells the two apart.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.store.snapshot();

    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        store: snapshot.status,
        posts: snapshot.posts.len(),
    };

    HttpResponse::Ok().json(response)
}
