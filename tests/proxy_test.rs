#![cfg(feature = "web")]

use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, Uri, header},
    response::Response,
    routing::{any, get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;

use shop_admin::app::{AppState, router};
use shop_admin::config::Config;
use shop_admin::proxy::{expiring_cookie, strip_api_prefix};

const ALL_COOKIES: &str = "accessToken=good; refreshToken=rt; apiKey=ak; publicKey=pk";

async fn echo(method: Method, uri: Uri, headers: HeaderMap) -> Json<Value> {
    Json(json!({
        "method": method.as_str(),
        "uri": uri.to_string(),
        "authorization": headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
        "cookie": headers.contains_key(header::COOKIE),
    }))
}

async fn login() -> Json<Value> {
    Json(json!({
        "status": 200,
        "payload": {
            "accessToken": "at",
            "refreshToken": "rt",
            "apiKey": "ak",
            "publicKey": "pk"
        }
    }))
}

async fn access_token() -> Json<Value> {
    Json(json!({ "accessToken": "fresh", "expiresIn": 3600 }))
}

async fn profile(headers: HeaderMap) -> Json<Value> {
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some("Bear good") => Json(json!({ "email": "admin@shop.test", "fullName": "Admin" })),
        _ => Json(json!({ "code": 401, "message": "unauthorized" })),
    }
}

async fn categories() -> Json<Value> {
    Json(json!({
        "status": 200,
        "payload": [
            { "_id": "A", "parent_id": null, "title": "Home" },
            { "_id": "B", "parent_id": "A", "title": "Shoes" },
            { "_id": "C", "parent_id": "B", "title": "Sneakers" }
        ]
    }))
}

/// Spawn a stand-in backend and return its base URL.
async fn spawn_backend() -> String {
    let stub = Router::new()
        .route("/products/*rest", any(echo))
        .route("/admin/login", post(login))
        .route("/oauth/access-token", post(access_token))
        .route("/oauth/user-profile", get(profile))
        .route("/oauth/logout", post(|| async { Json(json!({ "status": 200 })) }))
        .route("/categories", get(categories));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, stub).await.unwrap();
    });
    format!("http://{}", addr)
}

fn console(endpoint: &str) -> Router {
    router(Arc::new(AppState::new(Config::new(endpoint))))
}

fn request(method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

#[test]
fn api_prefix_stripping() {
    assert_eq!(strip_api_prefix("/api/products?page=2"), "/products?page=2");
    assert_eq!(strip_api_prefix("/api"), "/");
    assert_eq!(strip_api_prefix("/apiary"), "/apiary");
}

#[test]
fn expiring_cookie_keeps_whole_value() {
    let cookie = expiring_cookie("accessToken", "abc; Path=/admin", 90);

    assert_eq!(cookie.name(), "accessToken");
    assert_eq!(cookie.value(), "abc; Path=/admin");
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.http_only(), Some(true));
    assert!(cookie.to_string().contains("Max-Age=90"));
}

#[tokio::test]
async fn relay_rewrites_cookie_into_bear_header() {
    let app = console(&spawn_backend().await);

    let response = app
        .oneshot(request(
            Method::GET,
            "/api/products/search?query=air%20max",
            Some("accessToken=good"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["method"], "GET");
    assert_eq!(body["uri"], "/products/search?query=air%20max");
    assert_eq!(body["authorization"], "Bear good");
    assert_eq!(body["cookie"], false);
    println!("✓ Cookie turned into Authorization: Bear header");
}

#[tokio::test]
async fn relay_without_cookie_sends_no_authorization() {
    let app = console(&spawn_backend().await);

    let response = app
        .oneshot(request(Method::DELETE, "/api/products/p1", None))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["method"], "DELETE");
    assert_eq!(body["authorization"], Value::Null);
}

#[tokio::test]
async fn unreachable_backend_is_bad_gateway() {
    let app = console("http://127.0.0.1:1");

    let response = app
        .oneshot(request(Method::GET, "/api/products", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn login_sets_http_only_cookies() {
    let app = console(&spawn_backend().await);

    let response = app
        .oneshot(request(Method::POST, "/api/admin/login", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 4);
    for name in ["accessToken=at", "refreshToken=rt", "apiKey=ak", "publicKey=pk"] {
        let cookie = cookies
            .iter()
            .find(|c| c.starts_with(name))
            .unwrap_or_else(|| panic!("missing cookie {}", name));
        assert!(cookie.contains("HttpOnly"), "{} is not HttpOnly", cookie);
        assert!(cookie.contains("Path=/"));
    }

    let body = json_body(response).await;
    assert_eq!(body["payload"]["apiKey"], "ak");
}

#[tokio::test]
async fn access_token_cookie_expires() {
    let app = console(&spawn_backend().await);

    let response = app
        .oneshot(request(Method::POST, "/api/oauth/access-token", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("accessToken=fresh"));
    assert!(cookies[0].contains("Max-Age=3600"));
}

#[tokio::test]
async fn logout_clears_every_session_cookie() {
    let app = console(&spawn_backend().await);

    let response = app
        .oneshot(request(Method::POST, "/api/oauth/logout", Some(ALL_COOKIES)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 4);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
}

#[tokio::test]
async fn console_requires_session_cookie() {
    let app = console(&spawn_backend().await);

    let response = app
        .oneshot(request(Method::GET, "/session", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn rejected_token_redirects_to_login() {
    let app = console(&spawn_backend().await);

    let response = app
        .oneshot(request(Method::GET, "/session", Some("accessToken=stale")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn session_returns_profile() {
    let app = console(&spawn_backend().await);

    let response = app
        .oneshot(request(Method::GET, "/session", Some("accessToken=good")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["email"], "admin@shop.test");
    assert_eq!(body["name"], "Admin");
}

#[tokio::test]
async fn breadcrumbs_route_walks_backend_categories() {
    let app = console(&spawn_backend().await);

    let response = app
        .oneshot(request(
            Method::GET,
            "/categories/C/breadcrumbs",
            Some("accessToken=good"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!(["Home", "Shoes", "Sneakers"])
    );
    println!("✓ Breadcrumbs served from the backend listing");
}

#[tokio::test]
async fn month_outside_calendar_is_bad_request() {
    let app = console(&spawn_backend().await);

    let response = app
        .oneshot(request(
            Method::GET,
            "/incomes/month/2024/13",
            Some("accessToken=good"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
