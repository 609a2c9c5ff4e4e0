//! Reverse proxy from `/api/*` to the backend service.
//!
//! Requests keep their method, query, headers and body; the `/api` prefix is
//! stripped and the `accessToken` cookie becomes the `Authorization`
//! header. The login relays additionally turn backend tokens into
//! HTTP-only cookies so the browser never sees them.

use std::sync::Arc;

use axum::{
    Json,
    body::to_bytes,
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::app::AppState;
use crate::error::AdminError;
use crate::session::{ACCESS_TOKEN_COOKIE, KeyToken, SESSION_COOKIES, bearer};

/// Headers that describe a single hop and must not be relayed.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Strip the `/api` mount point from a path and query.
///
/// Only a whole `/api` segment is stripped; `/apiary` is left alone.
pub fn strip_api_prefix(path_and_query: &str) -> &str {
    match path_and_query.strip_prefix("/api") {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        Some(rest) if rest.starts_with('?') => rest,
        _ => path_and_query,
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

fn upstream_headers(incoming: &HeaderMap, token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(incoming.len());
    for (name, value) in incoming {
        if is_hop_by_hop(name)
            || name == header::HOST
            || name == header::COOKIE
            || name == header::CONTENT_LENGTH
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    if let Some(token) = token {
        match HeaderValue::from_str(&bearer(token)) {
            Ok(value) => {
                headers.insert(header::AUTHORIZATION, value);
            }
            Err(_) => log::warn!("access token cookie is not a valid header value"),
        }
    }
    headers
}

/// Send the incoming request to the backend.
async fn relay(state: &AppState, request: Request, token: Option<&str>) -> Result<reqwest::Response, AdminError> {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = format!(
        "{}{}",
        state.config.endpoint_server,
        strip_api_prefix(path_and_query)
    );

    let body = to_bytes(body, state.config.body_limit)
        .await
        .map_err(|_| AdminError::Server { status: 413 })?;

    log::debug!("relaying {} {}", parts.method, target);
    let upstream = state
        .http
        .request(parts.method, &target)
        .headers(upstream_headers(&parts.headers, token))
        .body(body)
        .send()
        .await
        .map_err(|e| AdminError::Network(e.to_string()))?;

    log::info!("{} <- {}", upstream.status(), target);
    Ok(upstream)
}

/// Turn a backend response into ours, dropping hop-by-hop headers.
async fn pass_through(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = HeaderMap::with_capacity(upstream.headers().len());
    for (name, value) in upstream.headers() {
        if !is_hop_by_hop(name) && name != header::CONTENT_LENGTH {
            headers.append(name.clone(), value.clone());
        }
    }

    match upstream.bytes().await {
        Ok(body) => (status, headers, body).into_response(),
        Err(e) => AdminError::Network(e.to_string()).into_response(),
    }
}

pub(crate) fn session_cookie(name: &'static str, value: &str) -> Cookie<'static> {
    Cookie::build((name, value.to_string()))
        .http_only(true)
        .path("/")
        .build()
}

/// Session cookie that the browser drops after `max_age` seconds.
pub fn expiring_cookie(name: &'static str, value: &str, max_age: i64) -> Cookie<'static> {
    Cookie::build((name, value.to_string()))
        .http_only(true)
        .path("/")
        .max_age(time::Duration::seconds(max_age))
        .build()
}

fn access_token(jar: &CookieJar) -> Option<String> {
    jar.get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

fn status_from(code: u64) -> StatusCode {
    u16::try_from(code)
        .ok()
        .and_then(|c| StatusCode::from_u16(c).ok())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

/// `ANY /api/*path`
pub async fn forward(State(state): State<Arc<AppState>>, jar: CookieJar, request: Request) -> Response {
    let token = access_token(&jar);
    match relay(&state, request, token.as_deref()).await {
        Ok(upstream) => pass_through(upstream).await,
        Err(err) => {
            log::error!("relay failed: {}", err);
            err.into_response()
        }
    }
}

/// `POST /api/admin/login`
///
/// On `status: 200` the four payload tokens become HTTP-only cookies. The
/// response carries the backend's `status` and body either way.
pub async fn admin_login(State(state): State<Arc<AppState>>, jar: CookieJar, request: Request) -> Response {
    let upstream = match relay(&state, request, None).await {
        Ok(upstream) => upstream,
        Err(err) => {
            log::error!("login relay failed: {}", err);
            return err.into_response();
        }
    };

    let fallback = u64::from(upstream.status().as_u16());
    let body: serde_json::Value = match upstream.json().await {
        Ok(body) => body,
        Err(e) => return AdminError::Decode(e.to_string()).into_response(),
    };
    let status = body
        .get("status")
        .and_then(|s| s.as_u64())
        .unwrap_or(fallback);

    let mut jar = jar;
    if status == 200 {
        match body
            .get("payload")
            .cloned()
            .map(serde_json::from_value::<KeyToken>)
        {
            Some(Ok(tokens)) => {
                for (name, value) in tokens.cookies() {
                    jar = jar.add(session_cookie(name, value));
                }
                log::info!("admin login succeeded, session cookies set");
            }
            Some(Err(e)) => log::warn!("login payload missing tokens: {}", e),
            None => log::warn!("login response has no payload"),
        }
    }

    (status_from(status), jar, Json(body)).into_response()
}

/// `POST /api/oauth/access-token`
///
/// A response without an error `code` stores `accessToken` for
/// `expiresIn` seconds.
pub async fn oauth_access_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
) -> Response {
    let upstream = match relay(&state, request, None).await {
        Ok(upstream) => upstream,
        Err(err) => {
            log::error!("access-token relay failed: {}", err);
            return err.into_response();
        }
    };

    let body: serde_json::Value = match upstream.json().await {
        Ok(body) => body,
        Err(e) => return AdminError::Decode(e.to_string()).into_response(),
    };

    let code = body.get("code").and_then(|c| c.as_u64()).unwrap_or(0);
    if code != 0 {
        return (status_from(code), jar, Json(body)).into_response();
    }

    let mut jar = jar;
    let token = body.get("accessToken").and_then(|t| t.as_str());
    let expires_in = body.get("expiresIn").and_then(|e| e.as_i64());
    match (token, expires_in) {
        (Some(token), Some(max_age)) => jar = jar.add(expiring_cookie(ACCESS_TOKEN_COOKIE, token, max_age)),
        (Some(token), None) => jar = jar.add(session_cookie(ACCESS_TOKEN_COOKIE, token)),
        (None, _) => log::warn!("access-token response without a token"),
    }

    (StatusCode::OK, jar, Json(body)).into_response()
}

/// `POST /api/oauth/logout`
///
/// Cookies are cleared whether or not the backend call succeeds.
pub async fn oauth_logout(State(state): State<Arc<AppState>>, jar: CookieJar, request: Request) -> Response {
    let token = access_token(&jar);
    let mut cleared = jar;
    for name in SESSION_COOKIES {
        cleared = cleared.remove(Cookie::build(name).path("/"));
    }

    match relay(&state, request, token.as_deref()).await {
        Ok(upstream) => (cleared, pass_through(upstream).await).into_response(),
        Err(err) => {
            log::error!("logout relay failed: {}", err);
            (cleared, err).into_response()
        }
    }
}
