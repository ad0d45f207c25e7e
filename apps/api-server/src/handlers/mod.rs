//! HTTP handlers and route configuration.

mod admin;
mod auth;
mod comments;
mod health;
mod posts;
mod views;

use std::sync::Arc;

use actix_web::{guard, web};
use marquee_core::ports::RateLimiter;

use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes.
///
/// Anonymous write endpoints (login, comments, views) sit behind the rate
/// limiter; everything else is either a cached read or gated by `Identity`.
pub fn configure_routes(cfg: &mut web::ServiceConfig, limiter: Arc<dyn RateLimiter>) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .service(
                        web::resource("/login")
                            .route(web::post().to(auth::login))
                            .wrap(RateLimitMiddleware::new(limiter.clone())),
                    )
                    .route("/logout", web::post().to(auth::logout))
                    .route("/me", web::get().to(auth::me)),
            )
            // Reader routes, served through the query cache
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_published))
                    .route("/featured", web::get().to(posts::list_featured))
                    .route("/popular", web::get().to(posts::list_popular))
                    .route(
                        "/category/{category}",
                        web::get().to(posts::list_by_category),
                    )
                    .service(
                        web::resource("/{id}/comments")
                            .guard(guard::Post())
                            .route(web::post().to(comments::create))
                            .wrap(RateLimitMiddleware::new(limiter.clone())),
                    )
                    .route("/{id}/comments", web::get().to(comments::list))
                    .service(
                        web::resource("/{id}/views")
                            .guard(guard::Post())
                            .route(web::post().to(views::record))
                            .wrap(RateLimitMiddleware::new(limiter)),
                    )
                    .route("/{id}/views", web::get().to(views::count))
                    .route("/{id}", web::get().to(posts::get_post)),
            )
            // Admin routes, gated by the Identity extractor
            .service(
                web::scope("/admin")
                    .route("/posts", web::get().to(admin::list_posts))
                    .route("/posts", web::post().to(admin::create_post))
                    .route("/posts/{id}", web::put().to(admin::update_post))
                    .route("/posts/{id}", web::delete().to(admin::delete_post))
                    .route("/posts/{id}/publish", web::post().to(admin::publish_post))
                    .route("/posts/{id}/schedule", web::put().to(admin::schedule_post))
                    .route("/schedule", web::get().to(admin::list_scheduled))
                    .route("/seo", web::get().to(admin::seo_report)),
            ),
    );
}

#[cfg(test)]
mod tests;
