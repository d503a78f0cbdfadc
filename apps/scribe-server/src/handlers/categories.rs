//! Category endpoints.

use actix_web::{HttpResponse, web};

use scribe_core::browse::{category_counts, posts_in_category};
use scribe_shared::dto::{CategoryPostsResponse, CategoryResponse};

use super::posts::post_responses;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/categories
///
/// Configured categories first, in configured order and including empty ones,
/// then any other category found on posts written by other clients.
pub async fn list_categories(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let snapshot = state.store.snapshot();
    let counts = category_counts(&snapshot.posts);

    let mut categories: Vec<CategoryResponse> = snapshot
        .categories
        .iter()
        .map(|name| CategoryResponse {
            name: name.to_string(),
            count: counts
                .iter()
                .find(|c| c.name == name)
                .map_or(0, |c| c.count),
        })
        .collect();

    categories.extend(
        counts
            .into_iter()
            .filter(|c| !snapshot.categories.contains(&c.name))
            .map(|c| CategoryResponse {
                name: c.name,
                count: c.count,
            }),
    );

    Ok(HttpResponse::Ok().json(categories))
}

/// GET /api/categories/{name}
pub async fn category_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let requested = path.into_inner();
    let snapshot = state.store.snapshot();
    let posts = posts_in_category(&snapshot.posts, &requested);

    let name = match snapshot.categories.resolve(&requested) {
        Some(name) => name.to_string(),
        None => match posts.first() {
            Some(post) => post.category.clone(),
            None => {
                return Err(AppError::NotFound(format!(
                    "Category {} not found",
                    requested
                )));
            }
        },
    };

    Ok(HttpResponse::Ok().json(CategoryPostsResponse {
        name,
        posts: post_responses(posts),
    }))
}
