//! HTTP surface of the identity service

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use shapeup_identity::routes;
use shapeup_identity::token::Operation;

use common::*;

fn app() -> (Router, Arc<InMemoryUserStore>) {
    let users = Arc::new(InMemoryUserStore::default());
    let sessions = Arc::new(InMemorySessionStore::default());
    let router = routes::api_routes().with_state(app_state(users.clone(), sessions));
    (router, users)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_register_returns_created() {
    let (app, users) = app();

    let (status, body) = send(
        &app,
        post_json(
            "/auth/register",
            json!({ "email": "a@x.com", "password": "longpass1" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let user_id = body["user_id"].as_str().unwrap().parse().unwrap();
    assert!(users.get(user_id).is_some());
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let (app, users) = app();

    let (status, body) = send(
        &app,
        post_json(
            "/auth/register",
            json!({ "email": "nope", "password": "longpass1" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    assert_eq!(users.count(), 0);
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let (app, _) = app();
    let request = || {
        post_json(
            "/auth/register",
            json!({ "email": "a@x.com", "password": "longpass1" }),
        )
    };

    send(&app, request()).await;
    let (status, body) = send(&app, request()).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "EMAIL_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_login_unconfirmed_user_is_forbidden() {
    let (app, users) = app();
    users.add_user("a@x.com", "longpass1", false);

    let (status, body) = send(
        &app,
        post_json(
            "/auth/login",
            json!({ "username": "a@x.com", "password": "longpass1" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "USER_NOT_CONFIRMED");
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let (app, users) = app();
    users.add_user("a@x.com", "longpass1", true);

    let (status, body) = send(
        &app,
        post_json(
            "/auth/login",
            json!({ "username": "a@x.com", "password": "wrongpass" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_generate_token_with_unknown_operation() {
    let (app, _) = app();

    let (status, body) = send(
        &app,
        post_json(
            "/token/generate",
            json!({ "subject": uuid::Uuid::new_v4(), "operation": "delete" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_OPERATION");
}

#[tokio::test]
async fn test_generate_link_with_empty_base() {
    let (app, _) = app();

    let (status, body) = send(
        &app,
        post_json(
            "/token/link",
            json!({
                "base": "",
                "subject": uuid::Uuid::new_v4(),
                "operation": "confirmation",
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_validate_reports_operation() {
    let (app, _) = app();
    let subject = uuid::Uuid::new_v4();
    let token = authority().issue(subject, Operation::Refresh).unwrap();

    let (status, body) = send(&app, post_json("/token/validate", json!({ "token": token }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], subject.to_string());
    assert_eq!(body["operation"], "refresh");
}

#[tokio::test]
async fn test_me_requires_bearer_token() {
    let (app, _) = app();

    let request = Request::builder()
        .uri("/auth/me")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_me_rejects_refresh_token() {
    let (app, users) = app();
    let user_id = users.add_user("a@x.com", "longpass1", true);
    let refresh = authority().issue(user_id, Operation::Refresh).unwrap();

    let request = Request::builder()
        .uri("/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", refresh))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_register_confirm_login_flow() {
    let (app, users) = app();

    let (status, body) = send(
        &app,
        post_json(
            "/auth/register",
            json!({ "email": "a@x.com", "password": "longpass1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id: uuid::Uuid = body["user_id"].as_str().unwrap().parse().unwrap();

    // Unconfirmed accounts cannot log in yet
    let login = || {
        post_json(
            "/auth/login",
            json!({ "username": "a@x.com", "password": "longpass1" }),
        )
    };
    let (status, _) = send(&app, login()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let confirmation = authority().issue(user_id, Operation::Confirmation).unwrap();
    let request = Request::builder()
        .uri(format!("/auth/confirm?token={}", confirmation))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], user_id.to_string());
    assert!(users.get(user_id).unwrap().is_confirmed);

    let (status, body) = send(&app, login()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], user_id.to_string());
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri("/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "a@x.com");
    assert_eq!(body["is_confirmed"], true);
    assert!(body.get("password_hash").is_none());

    let (status, body) = send(&app, login()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "SESSION_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_confirm_by_body_with_access_token() {
    let (app, users) = app();
    let user_id = users.add_user("a@x.com", "longpass1", false);
    let access = authority().issue(user_id, Operation::Access).unwrap();

    let (status, body) = send(&app, post_json("/auth/confirm", json!({ "token": access }))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    assert!(!users.get(user_id).unwrap().is_confirmed);
}
