use actix_web::{App, test, web};
use serde_json::json;

use marquee_shared::dto::AuthResponse;

use crate::background::SchedulerConfig;
use crate::config::AppConfig;
use crate::handlers::configure_routes;
use crate::state::AppState;

async fn test_state() -> AppState {
    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: None,
        redis_url: None,
        scheduler: SchedulerConfig { enabled: false },
    };
    AppState::new(&config).await
}

macro_rules! test_app {
    ($state:expr) => {{
        let state = $state.clone();
        let limiter = state.limiter.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(move |cfg| configure_routes(cfg, limiter)),
        )
        .await
    }};
}

macro_rules! register_and_token {
    ($app:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "email": "editor@example.com",
                "password": "a-long-password"
            }))
            .to_request();
        let resp: AuthResponse = test::call_and_read_body_json(&$app, req).await;
        resp.access_token
    }};
}

#[actix_web::test]
async fn health_check_works() {
    let state = test_state().await;
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn admin_routes_require_a_token() {
    let state = test_state().await;
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/api/admin/posts").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let token = register_and_token!(app);
    let req = test::TestRequest::get()
        .uri("/api/admin/posts")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn login_and_me_roundtrip() {
    let state = test_state().await;
    let app = test_app!(state);

    let _ = register_and_token!(app);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({
            "email": "editor@example.com",
            "password": "a-long-password"
        }))
        .to_request();
    let resp: AuthResponse = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(("Authorization", format!("Bearer {}", resp.access_token)))
        .to_request();
    let me = test::call_service(&app, req).await;
    assert!(me.status().is_success());

    let body: serde_json::Value = test::read_body_json(me).await;
    assert_eq!(body["email"], "editor@example.com");
}

#[actix_web::test]
async fn login_with_wrong_password_is_rejected() {
    let state = test_state().await;
    let app = test_app!(state);

    let _ = register_and_token!(app);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({
            "email": "editor@example.com",
            "password": "not-the-password"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn published_post_shows_up_in_reader_listing() {
    let state = test_state().await;
    let app = test_app!(state);
    let token = register_and_token!(app);

    // Create a draft...
    let req = test::TestRequest::post()
        .uri("/api/admin/posts")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({
            "title": "The Mandalorian Returns",
            "excerpt": "A first look at the new season",
            "content": "Lots of beskar.",
            "category": "series",
            "image_url": "/covers/mando.jpg"
        }))
        .to_request();
    let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let post_id = created["data"]["id"].as_str().unwrap().to_owned();

    // ...which does not appear in the public listing...
    let req = test::TestRequest::get().uri("/api/posts").to_request();
    let listing: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listing["data"].as_array().unwrap().len(), 0);

    // ...until it is published and the change event lands.
    let req = test::TestRequest::post()
        .uri(&format!("/api/admin/posts/{post_id}/publish"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let req = test::TestRequest::get().uri("/api/posts").to_request();
    let listing: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let entries = listing["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"].as_str().unwrap(), post_id);
}

#[actix_web::test]
async fn unknown_category_is_a_bad_request() {
    let state = test_state().await;
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/posts/category/poetry")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn commenting_on_a_missing_post_is_not_found() {
    let state = test_state().await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/comments", uuid::Uuid::new_v4()))
        .set_json(json!({
            "author_name": "A Reader",
            "content": "Great piece!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}
