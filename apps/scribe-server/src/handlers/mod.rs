//! HTTP handlers and route configuration.

mod categories;
mod health;
mod posts;
mod search;
mod store;

#[cfg(all(test, feature = "auth"))]
mod tests;

use actix_web::{error, web};
use scribe_core::SortMode;

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_posts))
                    .route("", web::post().to(posts::create_post))
                    // Registered before "/{id}" so it is not taken for an id
                    .route("/featured", web::get().to(posts::featured_post))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}", web::put().to(posts::update_post))
                    .route("/{id}", web::delete().to(posts::delete_post)),
            )
            .route("/search", web::get().to(search::search_posts))
            .route("/search/query", web::put().to(search::set_query))
            .route("/categories", web::get().to(categories::list_categories))
            .route("/categories/{name}", web::get().to(categories::category_posts))
            .route("/store/status", web::get().to(store::store_status)),
    );
}

/// Malformed JSON bodies answer with the same problem document as other errors.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| error::Error::from(AppError::BadRequest(err.to_string())))
}

/// Parse an optional `sort` query parameter.
fn parse_sort(sort: Option<&str>, default: SortMode) -> Result<SortMode, AppError> {
    match sort.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value.parse().map_err(AppError::BadRequest),
        None => Ok(default),
    }
}
