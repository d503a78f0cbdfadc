//! Post handlers: listing, detail, and the write endpoints.

use actix_web::{HttpResponse, web};

use scribe_core::browse::{can_edit, featured_post as first_post, related_posts};
use scribe_core::domain::{Post, PostDraft, PostId};
use scribe_core::search::search;
use scribe_core::{SearchParams, SortMode};
use scribe_shared::ApiResponse;
use scribe_shared::dto::{
    CreatePostRequest, ListQuery, MutationAccepted, PostDetailResponse, PostResponse, TagsInput,
    UpdatePostRequest,
};

use super::parse_sort;
use crate::middleware::auth::{CurrentUser, OptionalUser};
use crate::middleware::error::{AppError, AppResult};
use crate::observability::RequestId;
use crate::state::AppState;

/// Related posts shown under a post.
const RELATED_LIMIT: usize = 3;

const ACCEPTED_MESSAGE: &str = "Accepted. Reads reflect the change after the next store sync.";

pub(crate) fn post_response(post: &Post) -> PostResponse {
    PostResponse {
        id: post.id.to_string(),
        title: post.title.clone(),
        content: post.content.clone(),
        excerpt: post.excerpt.clone(),
        category: post.category.clone(),
        tags: post.tags.clone(),
        image: post.image_url().to_string(),
        read_time: post.read_time.clone(),
        author: post.author.clone(),
        author_id: post.author_id.clone(),
        date: post.date,
    }
}

pub(crate) fn post_responses<'a>(posts: impl IntoIterator<Item = &'a Post>) -> Vec<PostResponse> {
    posts.into_iter().map(post_response).collect()
}

fn draft_from_request(req: CreatePostRequest) -> PostDraft {
    let tags = match req.tags {
        TagsInput::List(tags) => tags,
        TagsInput::Text(text) => PostDraft::parse_tags(&text),
    };

    PostDraft {
        title: req.title,
        content: req.content,
        excerpt: req.excerpt,
        category: req.category,
        tags,
        image: req.image,
        read_time: req.read_time,
    }
}

/// Look up `id` and check that `user` may change it.
fn owned_post(state: &AppState, user: &CurrentUser, id: &PostId) -> AppResult<Post> {
    let post = state
        .store
        .post(id)
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    if !can_edit(Some(&user.0), &post) {
        tracing::info!(post_id = %id, user_id = %user.0.user_id, "Edit refused, not the author");
        return Err(AppError::Forbidden);
    }
    Ok(post)
}

/// GET /api/posts?category=&sort=
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let sort = parse_sort(query.sort.as_deref(), SortMode::Date)?;
    let snapshot = state.store.snapshot();

    let mut params = SearchParams::default().sorted_by(sort);
    if let Some(name) = query.category {
        let canonical = snapshot
            .categories
            .resolve(&name)
            .map(String::from)
            .unwrap_or(name);
        params = params.with_category(canonical);
    }

    let posts = search(&snapshot.posts, &params);
    Ok(HttpResponse::Ok().json(post_responses(posts)))
}

/// GET /api/posts/featured
pub async fn featured_post(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let snapshot = state.store.snapshot();
    let post = first_post(&snapshot.posts)
        .ok_or_else(|| AppError::NotFound("No posts yet".to_string()))?;

    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// GET /api/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    user: OptionalUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = PostId::new(path.into_inner());
    let snapshot = state.store.snapshot();
    let post = snapshot
        .post(&id)
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: post_response(post),
        related: post_responses(related_posts(&snapshot.posts, post, RELATED_LIMIT)),
        can_edit: can_edit(user.0.as_ref(), post),
    }))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    request_id: RequestId,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let draft = draft_from_request(body.into_inner());
    let id = state.store.add_post(&user.0, draft).await?;

    tracing::debug!(request_id = %request_id, post_id = %id, "Create forwarded");
    Ok(HttpResponse::Accepted().json(ApiResponse::ok_with_message(
        MutationAccepted { id: id.to_string() },
        ACCEPTED_MESSAGE,
    )))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    request_id: RequestId,
    path: web::Path<String>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = PostId::new(path.into_inner());
    owned_post(&state, &user, &id)?;

    let draft = draft_from_request(body.into_inner());
    state.store.update_post(&user.0, &id, draft).await?;

    tracing::debug!(request_id = %request_id, post_id = %id, "Update forwarded");
    Ok(HttpResponse::Accepted().json(ApiResponse::ok_with_message(
        MutationAccepted { id: id.to_string() },
        ACCEPTED_MESSAGE,
    )))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    request_id: RequestId,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = PostId::new(path.into_inner());
    owned_post(&state, &user, &id)?;

    state.store.delete_post(&user.0, &id).await?;

    tracing::debug!(request_id = %request_id, post_id = %id, "Delete forwarded");
    Ok(HttpResponse::Accepted().json(ApiResponse::ok_with_message(
        MutationAccepted { id: id.to_string() },
        ACCEPTED_MESSAGE,
    )))
}
