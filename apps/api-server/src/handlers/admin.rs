//! Admin endpoints; every route requires a valid session token.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use marquee_core::domain::{Post, seo};
use marquee_infra::cache::QueryKey;
use marquee_shared::ApiResponse;
use marquee_shared::dto::{CreatePostRequest, ScheduleRequest, SeoQuery, UpdatePostRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn display_name<'a>(requested: Option<&'a str>, identity: &'a Identity) -> &'a str {
    match requested {
        Some(name) if !name.trim().is_empty() => name,
        // Fall back to the mailbox name of the account email.
        _ => identity
            .email
            .split('@')
            .next()
            .unwrap_or(identity.email.as_str()),
    }
}

/// GET /api/admin/posts - all posts regardless of status.
pub async fn list_posts(state: web::Data<AppState>, _identity: Identity) -> HttpResponse {
    let posts = super::posts::fetch_listing(&state, &QueryKey::AdminPosts).await;
    HttpResponse::Ok().json(ApiResponse::ok(posts))
}

/// POST /api/admin/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let name = display_name(req.author_name.as_deref(), &identity).to_owned();

    let created = state
        .posts
        .create(req.draft, identity.user_id, &name)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(created)))
}

/// PUT /api/admin/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let req = body.into_inner();

    let updated = state
        .posts
        .update(id, req.patch, identity.user_id, req.author_name.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post with id {id} not found")))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(updated)))
}

/// DELETE /api/admin/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    if !state.posts.delete(id).await? {
        return Err(AppError::NotFound(format!("post with id {id} not found")));
    }

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/admin/posts/{id}/publish
pub async fn publish_post(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let published = state
        .posts
        .publish(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post with id {id} not found")))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(published)))
}

/// PUT /api/admin/posts/{id}/schedule
pub async fn schedule_post(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<ScheduleRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let scheduled = state
        .posts
        .reschedule(id, body.into_inner().scheduled_date)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post with id {id} not found")))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(scheduled)))
}

/// GET /api/admin/schedule - scheduled posts by slot.
pub async fn list_scheduled(
    state: web::Data<AppState>,
    _identity: Identity,
) -> AppResult<HttpResponse> {
    let scheduled = state.posts.list_scheduled().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(scheduled)))
}

/// GET /api/admin/seo?keyword=
pub async fn seo_report(
    state: web::Data<AppState>,
    _identity: Identity,
    query: web::Query<SeoQuery>,
) -> AppResult<HttpResponse> {
    let posts: Vec<Post> = state
        .posts
        .list()
        .await?
        .into_iter()
        .map(|entry| entry.post)
        .collect();

    let report = seo::analyze(&posts, query.keyword.as_deref());
    Ok(HttpResponse::Ok().json(ApiResponse::ok(report)))
}
