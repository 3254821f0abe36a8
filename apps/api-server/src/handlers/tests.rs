use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};
use uuid::Uuid;

use agora_infra::auth::JwtConfig;

use super::configure_routes;
use crate::observability::RequestIdMiddleware;
use crate::state::AppState;

fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "handler-test-secret".to_string(),
        ..JwtConfig::default()
    }
}

fn state() -> AppState {
    AppState::in_memory(jwt_config(), None)
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

/// Register and log in through the services, returning (id, bearer header).
async fn signup(state: &AppState, email: &str) -> (Uuid, String) {
    let user = state.auth.register(email, "pw1").await.unwrap();
    let outcome = state.auth.login(email, "pw1").await.unwrap();
    (user.id, format!("Bearer {}", outcome.token))
}

#[actix_web::test]
async fn test_health_check_carries_request_id() {
    let state = state();
    let app = init_app!(state);

    let res = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[actix_web::test]
async fn test_register_and_login_over_http() {
    let state = state();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({"email": "alice@x.io", "password": "pw1"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let user: Value = test::read_body_json(res).await;
    assert_eq!(user["email"], "alice@x.io");
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({"email": "alice@x.io", "password": "other"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({"email": "alice@x.io", "password": "pw1"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let auth: Value = test::read_body_json(res).await;
    assert_eq!(auth["token_type"], "bearer");
    assert_eq!(auth["id"], user["id"]);
    assert_eq!(auth["expires_in"], 1800);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", user["id"].as_str().unwrap()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_register_rejects_invalid_email() {
    let state = state();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({"email": "not-an-email", "password": "pw1"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_bad_credentials_are_forbidden_and_indistinguishable() {
    let state = state();
    signup(&state, "alice@x.io").await;
    let app = init_app!(state);

    let mut details = Vec::new();
    for (email, password) in [("alice@x.io", "wrong"), ("nobody@x.io", "pw1")] {
        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"email": email, "password": password}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(res).await;
        details.push(body["detail"].clone());
    }

    assert_eq!(details[0], "Invalid Credentials");
    assert_eq!(details[0], details[1]);
}

#[actix_web::test]
async fn test_protected_routes_require_a_valid_token() {
    let state = state();
    let app = init_app!(state);

    for auth in [None, Some("Bearer not-a-jwt"), Some("Basic abc")] {
        let mut req = test::TestRequest::get().uri("/api/posts");
        if let Some(value) = auth {
            req = req.insert_header((header::AUTHORIZATION, value));
        }
        let res = test::call_service(&app, req.to_request()).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["detail"], "Could not validate credentials");
    }
}

#[actix_web::test]
async fn test_post_and_vote_scenario() {
    let state = state();
    let (alice_id, alice) = signup(&state, "alice@x.io").await;
    let (_, bob) = signup(&state, "bob@x.io").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, alice.as_str()))
        .set_json(json!({"title": "Miami", "content": "great day"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let post: Value = test::read_body_json(res).await;
    assert_eq!(post["published"], true);
    assert_eq!(post["owner_id"], alice_id.to_string());
    assert_eq!(post["owner"]["email"], "alice@x.io");
    let post_id = post["id"].as_str().unwrap().to_string();
    let post_uri = format!("/api/posts/{post_id}");

    let vote = |dir: i32| {
        test::TestRequest::post()
            .uri("/api/vote")
            .insert_header((header::AUTHORIZATION, bob.as_str()))
            .set_json(json!({"post_id": post_id, "dir": dir}))
            .to_request()
    };

    let res = test::call_service(&app, vote(1)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "Successfully added vote");

    assert_eq!(test::call_service(&app, vote(1)).await.status(), StatusCode::CONFLICT);
    assert_eq!(test::call_service(&app, vote(2)).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&post_uri)
        .insert_header((header::AUTHORIZATION, bob.as_str()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["votes"], 1);
    assert_eq!(body["post"]["title"], "Miami");

    let req = test::TestRequest::put()
        .uri(&post_uri)
        .insert_header((header::AUTHORIZATION, bob.as_str()))
        .set_json(json!({"title": "Hijacked", "content": "mine now"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&post_uri)
        .insert_header((header::AUTHORIZATION, alice.as_str()))
        .set_json(json!({"title": "Miami", "content": "even better", "published": false}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(res).await;
    assert_eq!(updated["content"], "even better");
    assert_eq!(updated["published"], false);

    let req = test::TestRequest::delete()
        .uri(&post_uri)
        .insert_header((header::AUTHORIZATION, alice.as_str()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&post_uri)
        .insert_header((header::AUTHORIZATION, alice.as_str()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    // The post's votes went with it
    assert_eq!(test::call_service(&app, vote(0)).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_list_posts_applies_query() {
    let state = state();
    let (_, alice) = signup(&state, "alice@x.io").await;
    let app = init_app!(state);

    for title in ["Miami", "Madrid", "Lisbon"] {
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header((header::AUTHORIZATION, alice.as_str()))
            .set_json(json!({"title": title, "content": "trip"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/api/posts?search=M")
        .insert_header((header::AUTHORIZATION, alice.as_str()))
        .to_request();
    let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.len(), 2);

    let req = test::TestRequest::get()
        .uri("/api/posts?limit=1&skip=1")
        .insert_header((header::AUTHORIZATION, alice.as_str()))
        .to_request();
    let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["votes"], 0);

    let req = test::TestRequest::get()
        .uri("/api/posts?limit=0")
        .insert_header((header::AUTHORIZATION, alice.as_str()))
        .to_request();
    let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(body.is_empty());
}

#[actix_web::test]
async fn test_malformed_input_is_bad_request() {
    let state = state();
    let (_, alice) = signup(&state, "alice@x.io").await;
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/posts/not-a-uuid")
        .insert_header((header::AUTHORIZATION, alice.as_str()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/vote")
        .insert_header((header::AUTHORIZATION, alice.as_str()))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(r#"{"post_id": "#)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/posts?limit=many")
        .insert_header((header::AUTHORIZATION, alice.as_str()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_login_is_rate_limited() {
    use agora_infra::rate_limit::{InMemoryRateLimiter, RateLimitConfig};
    use std::sync::Arc;
    use std::time::Duration;

    let limiter = InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: 2,
        window: Duration::from_secs(60),
    });
    let state = AppState::in_memory(jwt_config(), Some(Arc::new(limiter)));
    let app = init_app!(state);

    let login = || {
        test::TestRequest::post()
            .uri("/api/login")
            .peer_addr("10.0.0.7:40000".parse().unwrap())
            .set_json(json!({"email": "alice@x.io", "password": "pw1"}))
            .to_request()
    };

    assert_eq!(test::call_service(&app, login()).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(test::call_service(&app, login()).await.status(), StatusCode::FORBIDDEN);

    let res = test::call_service(&app, login()).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key(header::RETRY_AFTER));

    // Other routes are not throttled
    let res = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_login_limit_ignores_forwarded_headers() {
    use agora_infra::rate_limit::{InMemoryRateLimiter, RateLimitConfig};
    use std::sync::Arc;
    use std::time::Duration;

    let limiter = InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: 2,
        window: Duration::from_secs(60),
    });
    let state = AppState::in_memory(jwt_config(), Some(Arc::new(limiter)));
    let app = init_app!(state);

    let mut statuses = Vec::new();
    for i in 0..5 {
        let req = test::TestRequest::post()
            .uri("/api/login")
            .peer_addr("10.0.0.7:40000".parse().unwrap())
            .insert_header(("X-Forwarded-For", format!("1.2.3.{i}")))
            .insert_header(("Forwarded", format!("for=5.6.7.{i}")))
            .set_json(json!({"email": "alice@x.io", "password": "pw1"}))
            .to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }

    assert_eq!(&statuses[..2], &[StatusCode::FORBIDDEN, StatusCode::FORBIDDEN]);
    assert!(statuses[2..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));

    // A different peer has its own budget
    let req = test::TestRequest::post()
        .uri("/api/login")
        .peer_addr("10.0.0.8:40000".parse().unwrap())
        .set_json(json!({"email": "alice@x.io", "password": "pw1"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}
