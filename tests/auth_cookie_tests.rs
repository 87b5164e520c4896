// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth cookie attribute tests.
//!
//! These tests verify the session cookie attributes on sign-in and that
//! removal on logout matches them for localhost and production-style URLs.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;

mod common;

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

fn session_request(access_token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/session")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "access_token": access_token }).to_string(),
        ))
        .unwrap()
}

fn logout_request() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .header(header::COOKIE, "crawl_token=test")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_session_sets_cookie_localhost() {
    let app = common::create_test_app_with_frontend_url("http://localhost:5173");
    let token = common::token_for(&app.state, "user-1");

    let response = app.router.oneshot(session_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookie = find_cookie(&set_cookie_headers(&response), "crawl_token");
    assert!(cookie.starts_with(&format!("crawl_token={}", token)));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_session_sets_secure_cookie_production() {
    let app = common::create_test_app_with_frontend_url("https://crawl.example.com");
    let token = common::token_for(&app.state, "user-1");

    let response = app.router.oneshot(session_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookie = find_cookie(&set_cookie_headers(&response), "crawl_token");
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_session_rejects_invalid_token() {
    let app = common::create_test_app();

    let response = app
        .router
        .oneshot(session_request("not-a-jwt"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie_headers(&response).is_empty());
}

#[tokio::test]
async fn test_session_rejects_malformed_body() {
    let app = common::create_test_app();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/session")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"token\": 1}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_cookie_removal_localhost_attributes() {
    let app = common::create_test_app_with_frontend_url("http://localhost:5173");

    let response = app.router.oneshot(logout_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookie = find_cookie(&set_cookie_headers(&response), "crawl_token");
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(!cookie.contains("Secure"));
    assert!(!cookie.contains("Domain="));
}

#[tokio::test]
async fn test_logout_cookie_removal_production_attributes() {
    let app = common::create_test_app_with_frontend_url("https://crawl.example.com");

    let response = app.router.oneshot(logout_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookie = find_cookie(&set_cookie_headers(&response), "crawl_token");
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("Max-Age=0"));
}
