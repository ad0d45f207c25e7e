//! View counter endpoints.

use actix_web::{HttpRequest, HttpResponse, web};
use uuid::Uuid;

use marquee_infra::cache::{QueryKey, QueryOptions};
use marquee_shared::ApiResponse;
use marquee_shared::dto::{RecordViewRequest, ViewCountResponse};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/posts/{id}/views
pub async fn count(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let post_id = path.into_inner();
    let key = QueryKey::ViewCount(post_id);

    let svc = state.views.clone();
    state
        .cache
        .register(key.clone(), QueryOptions::detail(), move || {
            let svc = svc.clone();
            async move { svc.count(post_id).await }
        })
        .await;

    // A failed count read degrades to zero rather than failing the page.
    let count: u64 = match state.cache.fetch(&key).await {
        Ok(count) => count,
        Err(e) => {
            tracing::error!(post_id = %post_id, error = %e, "View count fetch failed");
            0
        }
    };
    HttpResponse::Ok().json(ApiResponse::ok(ViewCountResponse { post_id, count }))
}

/// POST /api/posts/{id}/views (rate limited)
///
/// Every call appends a row: reloads count as fresh views. A caller may
/// supply its own visitor token; otherwise the client address is used.
pub async fn record(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: HttpRequest,
    body: Option<web::Json<RecordViewRequest>>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    if state.posts.get(post_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "post with id {post_id} not found"
        )));
    }

    let viewer = body
        .and_then(|b| b.into_inner().viewer)
        .or_else(|| {
            req.connection_info()
                .realip_remote_addr()
                .map(str::to_owned)
        })
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let view = state.views.record(post_id, &viewer).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(view)))
}
