//! HTTP-level tests for bearer-authenticated routes and health checks.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, Utc};
use readroom::AppState;

use common::*;

fn me_request(auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/users/me");
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_me_returns_profile_for_issued_token() {
    let state = default_state();
    let login = body_json(send(router(&state), form_login("vk123", "https://ok")).await).await;
    let token = login["access_token"].as_str().unwrap();

    let resp = send(router(&state), me_request(Some(&format!("Bearer {}", token)))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let profile = body_json(resp).await;
    assert_eq!(profile["external_id"], "vk123");
    assert_eq!(profile["full_name"], "Anna Reader");
    assert_eq!(profile["role"], "AUTHOR");
}

#[tokio::test]
async fn test_me_without_header_is_unauthenticated() {
    let state = default_state();
    let resp = send(router(&state), me_request(None)).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers()[header::WWW_AUTHENTICATE], "Bearer");
    assert_eq!(body_json(resp).await["detail"], "Not authenticated");
}

#[tokio::test]
async fn test_me_with_expired_token_is_rejected() {
    let state = default_state();
    let issued = state
        .issuer
        .issue_at("vk123", Utc::now() - Duration::minutes(LIFETIME_MINUTES + 5))
        .unwrap();

    let resp = send(
        router(&state),
        me_request(Some(&format!("Bearer {}", issued.access_token))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["detail"], "Invalid token");
}

#[tokio::test]
async fn test_me_for_deleted_subject_is_rejected() {
    let state = default_state();
    let issued = state.issuer.issue("vk404").unwrap();

    let resp = send(
        router(&state),
        me_request(Some(&format!("Bearer {}", issued.access_token))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["detail"], "User not found");
}

#[tokio::test]
async fn test_me_for_inactive_user_is_forbidden() {
    let state = default_state();
    let issued = state.issuer.issue("vk555").unwrap();

    let resp = send(
        router(&state),
        me_request(Some(&format!("Bearer {}", issued.access_token))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["detail"], "Inactive user");
}

#[tokio::test]
async fn test_health_endpoints() {
    let state = default_state();

    let live = send(
        router(&state),
        Request::get("/healthz").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(live.status(), StatusCode::OK);

    let ready = send(
        router(&state),
        Request::get("/readyz").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readyz_unavailable_when_store_is_down() {
    let state = Arc::new(
        AppState::new(
            test_config(),
            Arc::new(BrokenStore),
            Arc::new(AcceptValue("https://ok")),
        )
        .unwrap(),
    );

    let ready = send(
        router(&state),
        Request::get("/readyz").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);

    let live = send(
        router(&state),
        Request::get("/healthz").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(live.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let state = default_state();
    let resp = send(
        router(&state),
        Request::get("/stories").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
