//! Search endpoints and the shared query state.

use actix_web::{HttpResponse, web};

use scribe_core::search::search;
use scribe_core::{SearchParams, SortMode};
use scribe_shared::dto::{QueryStateResponse, SearchQuery, SearchResponse, SetQueryRequest};

use super::parse_sort;
use super::posts::post_responses;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/search?q=&category=&sort=
///
/// Missing `q` and `category` fall back to the store's shared query state.
pub async fn search_posts(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let sort = parse_sort(query.sort.as_deref(), SortMode::Relevance)?;
    let snapshot = state.store.snapshot();

    let mut params = snapshot.search_params(sort);
    if let Some(q) = query.q {
        params.query = q;
    }
    if let Some(category) = query.category {
        params.category = Some(category).filter(|c| !c.is_empty());
    }

    let results = search(&snapshot.posts, &params);
    tracing::debug!(
        query = %params.query,
        category = ?params.category,
        sort = %params.sort,
        hits = results.len(),
        "Search"
    );

    let SearchParams {
        query,
        category,
        sort,
    } = params;
    Ok(HttpResponse::Ok().json(SearchResponse {
        query,
        category,
        sort: sort.to_string(),
        total: results.len(),
        results: post_responses(results),
    }))
}

/// PUT /api/search/query
///
/// Replaces both the query text and the selected category.
pub async fn set_query(
    state: web::Data<AppState>,
    body: web::Json<SetQueryRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    let snapshot = state.store.snapshot();

    let category = match request.category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(name) => Some(
            snapshot
                .categories
                .resolve(name)
                .map(String::from)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown category '{}'", name)))?,
        ),
    };

    state.store.set_search_query(request.query);
    state.store.set_selected_category(category);

    let updated = state.store.snapshot();
    Ok(HttpResponse::Ok().json(QueryStateResponse {
        query: updated.search_query,
        category: updated.selected_category,
    }))
}
