mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use estatehub::router::init_router;
use estatehub_config::SecurityConfig;
use serde_json::json;
use tower::ServiceExt;

use common::{TestContext, body_json};

fn sign_in_request(email: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/auth/sign-in")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "email": email, "password": password }).to_string()))
        .unwrap()
}

fn get_with_token(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_sign_in_success() {
    let ctx = TestContext::new();
    let alice = ctx.seed_identity("alice@example.com", "wonderland-42", "ADMIN");
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(sign_in_request("alice@example.com", "wonderland-42"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["identity"]["email"], "alice@example.com");
    assert_eq!(body["identity"]["role"], "ADMIN");
    assert!(body["identity"].get("passwordHash").is_none());

    let token = body["token"].as_str().unwrap();
    let claims = ctx.app_state(SecurityConfig::default()).auth.validator.validate(token).unwrap();
    assert_eq!(claims.identity_id().unwrap(), alice.id);
    assert_eq!(claims.role, "ADMIN");
    assert_eq!(claims.exp - claims.iat, common::TOKEN_LIFETIME_SECONDS);
}

#[tokio::test]
async fn test_sign_in_email_is_case_insensitive() {
    let ctx = TestContext::new();
    ctx.seed_identity("alice@example.com", "wonderland-42", "ADMIN");
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(sign_in_request("Alice@Example.com", "wonderland-42"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sign_in_wrong_password() {
    let ctx = TestContext::new();
    ctx.seed_identity("alice@example.com", "wonderland-42", "ADMIN");
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(sign_in_request("alice@example.com", "looking-glass"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["errorCode"], "INVALID_CREDENTIALS");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_sign_in_unknown_email() {
    let ctx = TestContext::new();
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(sign_in_request("nobody@example.com", "whatever-pass"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["errorCode"], "PRINCIPAL_NOT_FOUND");
}

#[tokio::test]
async fn test_sign_in_inactive_identity() {
    let ctx = TestContext::new();
    let bob = ctx.seed_identity("bob@example.com", "builder-99", "USER");
    ctx.store.set_active(bob.id, false).unwrap();
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(sign_in_request("bob@example.com", "builder-99"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["errorCode"], "PRINCIPAL_NOT_FOUND");
}

#[tokio::test]
async fn test_sign_in_validation_error() {
    let ctx = TestContext::new();
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app.oneshot(sign_in_request("not-an-email", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["errorCode"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_sign_in_malformed_body() {
    let ctx = TestContext::new();
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/sign-in")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sign_in_ignores_stale_token_on_public_path() {
    let ctx = TestContext::new();
    let alice = ctx.seed_identity("alice@example.com", "wonderland-42", "ADMIN");
    let stale = ctx.expired_token_for(&alice, 60);
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let mut request = sign_in_request("alice@example.com", "wonderland-42");
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, format!("Bearer {}", stale).parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_me_returns_principal() {
    let ctx = TestContext::new();
    let alice = ctx.seed_identity("alice@example.com", "wonderland-42", "ADMIN");
    let token = ctx.token_for(&alice);
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(get_with_token("/api/v1/auth/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["identityId"], alice.id);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["role"], "ADMIN");
}

#[tokio::test]
async fn test_me_without_token() {
    let ctx = TestContext::new();
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app.oneshot(get_with_token("/api/v1/auth/me", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["errorCode"], "TOKEN_MISSING");
}

#[tokio::test]
async fn test_me_with_expired_token() {
    let ctx = TestContext::new();
    let alice = ctx.seed_identity("alice@example.com", "wonderland-42", "ADMIN");
    let token = ctx.expired_token_for(&alice, 1);
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(get_with_token("/api/v1/auth/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["errorCode"], "TOKEN_EXPIRED");
    assert_eq!(body["title"], "Token Expired");
}

#[tokio::test]
async fn test_me_with_tampered_token() {
    let ctx = TestContext::new();
    let alice = ctx.seed_identity("alice@example.com", "wonderland-42", "ADMIN");
    let token = ctx.token_for(&alice);
    let (unsigned, signature) = token.rsplit_once('.').unwrap();
    let first = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{}.{}{}", unsigned, first, &signature[1..]);
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(get_with_token("/api/v1/auth/me", Some(&tampered)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["errorCode"], "TOKEN_SIGNATURE_INVALID");
}

#[tokio::test]
async fn test_me_with_garbage_token() {
    let ctx = TestContext::new();
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(get_with_token("/api/v1/auth/me", Some("definitely-not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["errorCode"], "INVALID_BEARER_TOKEN");
}

#[tokio::test]
async fn test_me_with_wrong_scheme_is_anonymous() {
    let ctx = TestContext::new();
    let alice = ctx.seed_identity("alice@example.com", "wonderland-42", "ADMIN");
    let token = ctx.token_for(&alice);
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let request = Request::builder()
        .uri("/api/v1/auth/me")
        .header(header::AUTHORIZATION, format!("Basic {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["errorCode"], "TOKEN_MISSING");
}

#[tokio::test]
async fn test_token_rejected_after_deactivation() {
    let ctx = TestContext::new();
    let bob = ctx.seed_identity("bob@example.com", "builder-99", "USER");
    let token = ctx.token_for(&bob);
    ctx.store.set_active(bob.id, false).unwrap();
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(get_with_token("/api/v1/auth/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["errorCode"], "PRINCIPAL_NOT_FOUND");
}

#[tokio::test]
async fn test_dot_segment_path_is_rejected() {
    let ctx = TestContext::new();
    let alice = ctx.seed_identity("alice@example.com", "wonderland-42", "ADMIN");
    let token = ctx.expired_token_for(&alice, 1);
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(get_with_token("/api/v1/auth/sign-in/../me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_custom_header_and_prefix() {
    let ctx = TestContext::new();
    let alice = ctx.seed_identity("alice@example.com", "wonderland-42", "ADMIN");
    let token = ctx.token_for(&alice);
    let security = SecurityConfig {
        header_name: "X-Access-Token".to_string(),
        header_prefix: "Token ".to_string(),
        ..SecurityConfig::default()
    };
    let app = init_router(ctx.app_state(security));

    let request = Request::builder()
        .uri("/api/v1/auth/me")
        .header("X-Access-Token", format!("Token {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_identity_requires_admin() {
    let ctx = TestContext::new();
    let alice = ctx.seed_identity("alice@example.com", "wonderland-42", "ADMIN");
    let bob = ctx.seed_identity("bob@example.com", "builder-99", "USER");
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(get_with_token(
            &format!("/api/v1/identities/{}", alice.id),
            Some(&ctx.token_for(&bob)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["errorCode"], "ACCESS_DENIED");
}

#[tokio::test]
async fn test_get_identity_as_admin() {
    let ctx = TestContext::new();
    let alice = ctx.seed_identity("alice@example.com", "wonderland-42", "ADMIN");
    let bob = ctx.seed_identity("bob@example.com", "builder-99", "USER");
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(get_with_token(
            &format!("/api/v1/identities/{}", bob.id),
            Some(&ctx.token_for(&alice)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], bob.id);
    assert_eq!(body["email"], "bob@example.com");
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_get_identity_not_found() {
    let ctx = TestContext::new();
    let alice = ctx.seed_identity("alice@example.com", "wonderland-42", "ADMIN");
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(get_with_token("/api/v1/identities/9999", Some(&ctx.token_for(&alice))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["errorCode"], "NOT_FOUND");
}

#[tokio::test]
async fn test_get_identity_without_token() {
    let ctx = TestContext::new();
    let alice = ctx.seed_identity("alice@example.com", "wonderland-42", "ADMIN");
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app
        .oneshot(get_with_token(&format!("/api/v1/identities/{}", alice.id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["errorCode"], "TOKEN_MISSING");
}

#[tokio::test]
async fn test_health_is_public() {
    let ctx = TestContext::new();
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let response = app.oneshot(get_with_token("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let ctx = TestContext::new();
    let app = init_router(ctx.app_state(SecurityConfig::default()));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");
}
