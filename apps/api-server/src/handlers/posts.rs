//! Reader-facing post endpoints, served through the query cache.

use std::str::FromStr;

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use marquee_core::domain::Category;
use marquee_infra::cache::{QueryKey, QueryOptions};
use marquee_shared::ApiResponse;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Listing reads degrade to an empty page instead of failing the request;
/// the error is logged and the next read retries.
pub(super) async fn fetch_listing(state: &AppState, key: &QueryKey) -> serde_json::Value {
    match state.cache.fetch(key).await {
        Ok(posts) => posts,
        Err(e) => {
            tracing::error!(key = %key, error = %e, "Listing fetch failed");
            serde_json::Value::Array(Vec::new())
        }
    }
}

/// GET /api/posts - published posts.
pub async fn list_published(state: web::Data<AppState>) -> HttpResponse {
    let posts = fetch_listing(&state, &QueryKey::Posts).await;
    HttpResponse::Ok().json(ApiResponse::ok(posts))
}

/// GET /api/posts/featured
pub async fn list_featured(state: web::Data<AppState>) -> HttpResponse {
    let posts = fetch_listing(&state, &QueryKey::FeaturedPosts).await;
    HttpResponse::Ok().json(ApiResponse::ok(posts))
}

/// GET /api/posts/popular
pub async fn list_popular(state: web::Data<AppState>) -> HttpResponse {
    let posts = fetch_listing(&state, &QueryKey::PopularPosts).await;
    HttpResponse::Ok().json(ApiResponse::ok(posts))
}

/// GET /api/posts/category/{category}
pub async fn list_by_category(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let category =
        Category::from_str(&path.into_inner()).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let posts = fetch_listing(&state, &QueryKey::PostsByCategory(category)).await;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// GET /api/posts/{id}
///
/// Detail queries are registered on demand; absence is cached too, so a
/// hot 404 does not hammer the store.
pub async fn get_post(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let key = QueryKey::Post(id);

    let svc = state.posts.clone();
    state
        .cache
        .register(key.clone(), QueryOptions::detail(), move || {
            let svc = svc.clone();
            async move { svc.get(id).await }
        })
        .await;

    let post: Option<serde_json::Value> = state.cache.fetch(&key).await?;
    let post = post.ok_or_else(|| AppError::NotFound(format!("post with id {id} not found")))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}
