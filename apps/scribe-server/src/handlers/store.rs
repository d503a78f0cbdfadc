//! Content store status endpoint.

use actix_web::{HttpResponse, web};

use scribe_shared::dto::{FailedMutationResponse, StoreStatusResponse};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/store/status
pub async fn store_status(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let snapshot = state.store.snapshot();

    let failed_mutations = snapshot
        .failed_mutations
        .iter()
        .map(|f| FailedMutationResponse {
            kind: f.kind.to_string(),
            post_id: f.post_id.as_ref().map(ToString::to_string),
            error: f.error.clone(),
            at: f.at,
        })
        .collect();

    Ok(HttpResponse::Ok().json(StoreStatusResponse {
        status: snapshot.status.to_string(),
        loading: snapshot.is_loading(),
        error: snapshot.error.clone(),
        revision: snapshot.revision,
        post_count: snapshot.posts.len(),
        in_flight: snapshot.in_flight,
        failed_mutations,
    }))
}
