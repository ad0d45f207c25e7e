//! Comment endpoints.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use marquee_core::domain::NewComment;
use marquee_infra::cache::{QueryKey, QueryOptions};
use marquee_shared::ApiResponse;
use marquee_shared::dto::NewCommentRequest;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/posts/{id}/comments
pub async fn list(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let post_id = path.into_inner();
    let key = QueryKey::Comments(post_id);

    let svc = state.comments.clone();
    state
        .cache
        .register(key.clone(), QueryOptions::detail(), move || {
            let svc = svc.clone();
            async move { svc.list_for_post(post_id).await }
        })
        .await;

    let comments = super::posts::fetch_listing(&state, &key).await;
    HttpResponse::Ok().json(ApiResponse::ok(comments))
}

/// POST /api/posts/{id}/comments (rate limited)
pub async fn create(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<NewCommentRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let req = body.into_inner();

    // Comments belong to exactly one existing post.
    if state.posts.get(post_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "post with id {post_id} not found"
        )));
    }

    let comment = state
        .comments
        .add(NewComment {
            post_id,
            author_name: req.author_name,
            author_email: req.author_email,
            author_image: req.author_image,
            content: req.content,
        })
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(comment)))
}
