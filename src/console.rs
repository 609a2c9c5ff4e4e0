//! Console routes served by this process rather than relayed.
//!
//! They sit behind [`require_session`], which resolves the operator profile
//! once per request and threads the [`SessionContext`] to the handler.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::backend::{BackendClient, CatalogBackend, OrderBackend, ReportBackend, SessionBackend};
use crate::category::{self, CategoryMap, ROOT_KEY, SelectedCategory, TreeRow};
use crate::category_form::{CategoryForm, CreateCategory};
use crate::error::{AdminError, ErrorKind};
use crate::export;
use crate::income::{self, Grow, Series};
use crate::order::{OrderCancel, OrderStatus};
use crate::product::{CreateProduct, ProductFilter, ProductForm, VariantOptions};
use crate::proxy::session_cookie;
use crate::session::{ACCESS_TOKEN_COOKIE, SessionContext, UserProfile};

/// Backend client acting for the operator behind `jar`.
fn client_for(state: &AppState, jar: &CookieJar) -> BackendClient {
    let client = BackendClient::with_client(state.http.clone(), state.config.endpoint_server.clone());
    match jar.get(ACCESS_TOKEN_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => client.with_token(cookie.value()),
        _ => client,
    }
}

fn error_response(err: AdminError) -> Response {
    if err.kind() == ErrorKind::RedirectLogin {
        return Redirect::to("/login").into_response();
    }
    log::warn!("console request failed: {}", err);
    err.into_response()
}

/// Authentication middleware
///
/// Loads the operator profile and hands the session to the handler. Any
/// unauthorized or not-found answer from the backend redirects to `/login`.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if jar.get(ACCESS_TOKEN_COOKIE).is_none() {
        return Redirect::to("/login").into_response();
    }

    let backend = client_for(&state, &jar);
    let mut session = SessionContext::new();
    if let Err(err) = session.init(&backend).await {
        return error_response(err);
    }

    request.extensions_mut().insert(session);
    next.run(request).await
}

/// `GET /session`
pub async fn session_profile(Extension(session): Extension<SessionContext>) -> Response {
    match session.profile() {
        Some(profile) => Json::<UserProfile>(profile.clone()).into_response(),
        None => Redirect::to("/login").into_response(),
    }
}

/// `POST /session/refresh`
///
/// Trades the current session for fresh tokens and rewrites the cookies.
pub async fn refresh_session(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    match client_for(&state, &jar).refresh_token().await {
        Ok(tokens) => {
            let mut jar = jar;
            for (name, value) in tokens.cookies() {
                jar = jar.add(session_cookie(name, value));
            }
            log::info!("session tokens refreshed");
            (jar, StatusCode::NO_CONTENT).into_response()
        }
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    pub root: Option<String>,
}

async fn load_categories(state: &AppState, jar: &CookieJar) -> Result<CategoryMap, AdminError> {
    let records = client_for(state, jar).list_categories().await?;
    Ok(CategoryMap::from_records(records))
}

/// `GET /categories/tree?root=<id>`
pub async fn category_tree(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<TreeQuery>,
) -> Response {
    let root = query.root.unwrap_or_else(|| ROOT_KEY.to_string());
    let rows: Result<Vec<TreeRow>, AdminError> = match load_categories(&state, &jar).await {
        Ok(categories) => category::subtree(&categories, &root),
        Err(err) => Err(err),
    };
    match rows {
        Ok(rows) => Json(rows).into_response(),
        Err(err) => error_response(err),
    }
}

/// `GET /categories/:id/breadcrumbs`
pub async fn category_breadcrumbs(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(node_id): Path<String>,
) -> Response {
    let path = match load_categories(&state, &jar).await {
        Ok(categories) => category::generate_breadcrumbs(&node_id, &categories),
        Err(err) => Err(err),
    };
    match path {
        Ok(path) => Json(path).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
}

/// `GET /categories?page=<n>&search=<text>`
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<CategoryQuery>,
) -> Response {
    let backend = client_for(&state, &jar);
    let page = query.page.unwrap_or(1).max(1);
    let listing = match query.search.as_deref().map(str::trim) {
        Some(search) if !search.is_empty() => backend.search_categories(search, page).await,
        _ => backend.list_categories_page(page).await,
    };
    match listing {
        Ok(listing) => Json(listing).into_response(),
        Err(err) => error_response(err),
    }
}

/// `GET /categories/parents`
pub async fn parent_categories(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    match client_for(&state, &jar).list_parent_categories().await {
        Ok(parents) => Json(parents).into_response(),
        Err(err) => error_response(err),
    }
}

/// `POST /categories`
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(draft): Json<CreateCategory>,
) -> Response {
    let mut form = CategoryForm::from(draft);
    match form.submit(&client_for(&state, &jar)).await {
        Ok(()) => (StatusCode::CREATED, Json(form.draft().clone())).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct PublicBody {
    pub public: bool,
}

/// `PATCH /categories/:id/public`
pub async fn publish_category(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(category_id): Path<String>,
    Json(body): Json<PublicBody>,
) -> Response {
    match client_for(&state, &jar)
        .set_category_public(&category_id, body.public)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

/// `DELETE /categories/:id`
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(category_id): Path<String>,
) -> Response {
    match client_for(&state, &jar).delete_category(&category_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

/// `GET /products?search=&category=&page=`
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(filter): Query<ProductFilter>,
) -> Response {
    match client_for(&state, &jar).list_products(&filter).await {
        Ok(listing) => Json(listing).into_response(),
        Err(err) => error_response(err),
    }
}

/// `GET /products/search?search=`
pub async fn search_products(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(filter): Query<ProductFilter>,
) -> Response {
    match client_for(&state, &jar).search_products(&filter).await {
        Ok(products) => Json(products).into_response(),
        Err(err) => error_response(err),
    }
}

/// Choices offered by the product form.
#[derive(Debug, Serialize)]
pub struct ProductOptions {
    pub categories: Vec<TreeRow>,
    #[serde(flatten)]
    pub variants: VariantOptions,
}

/// `GET /products/options`
pub async fn product_options(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let backend = client_for(&state, &jar);
    let options = async {
        let categories = CategoryMap::from_records(backend.list_categories().await?);
        let attributes = backend.list_variants().await?;
        Ok::<_, AdminError>(ProductOptions {
            categories: category::subtree(&categories, ROOT_KEY)?,
            variants: VariantOptions::from_attributes(&attributes),
        })
    };
    match options.await {
        Ok(options) => Json(options).into_response(),
        Err(err) => error_response(err),
    }
}

/// A product opened for editing.
#[derive(Debug, Serialize)]
pub struct ProductEdit {
    pub product: CreateProduct,
    pub selected: Vec<SelectedCategory>,
}

/// `GET /products/:id/edit`
pub async fn edit_product(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(product_id): Path<String>,
) -> Response {
    let backend = client_for(&state, &jar);
    let edit = async {
        let categories = CategoryMap::from_records(backend.list_categories().await?);
        let form = ProductForm::load(&product_id, &categories, &backend).await?;
        Ok::<_, AdminError>(ProductEdit {
            product: form.to_payload(),
            selected: form.picker().selected().to_vec(),
        })
    };
    match edit.await {
        Ok(edit) => Json(edit).into_response(),
        Err(err) => error_response(err),
    }
}

/// `DELETE /products/:id`
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(product_id): Path<String>,
) -> Response {
    match client_for(&state, &jar).delete_product(&product_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: OrderStatus,
    #[serde(flatten)]
    pub cancel: OrderCancel,
}

/// `PATCH /orders/:id/status`
///
/// Cancellation details are only sent along with a cancel.
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(order_id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Response {
    let cancel = (body.status == OrderStatus::Cancelled).then_some(&body.cancel);
    match client_for(&state, &jar)
        .update_order_status(&order_id, body.status, cancel)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

fn csv_response(filename: &str, body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// `GET /orders/export.csv?page=<n>`
pub async fn export_orders(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Response {
    let page = query.page.unwrap_or(1).max(1);
    match client_for(&state, &jar).list_orders(page).await {
        Ok(orders) => csv_response(&format!("orders-{}.csv", page), export::orders_to_csv(&orders.items)),
        Err(err) => error_response(err),
    }
}

/// `GET /orders/:id/invoice.csv`
pub async fn export_invoice(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(order_id): Path<String>,
) -> Response {
    match client_for(&state, &jar).get_order(&order_id).await {
        Ok(order) => csv_response(
            &format!("invoice-{}.csv", order.order_id),
            export::invoice_to_csv(&order),
        ),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Serialize)]
pub struct IncomeReport {
    pub overview: Grow,
    pub series: Series,
}

/// `GET /incomes/years`
pub async fn income_years(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    match client_for(&state, &jar).gross_years().await {
        Ok(years) => Json(years).into_response(),
        Err(err) => error_response(err),
    }
}

/// `GET /incomes/year/:year`
pub async fn income_year(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(year): Path<i32>,
) -> Response {
    let backend = client_for(&state, &jar);
    let report = async {
        let overview = backend.gross_year(year).await?;
        let points = backend.gross_months_in_year(year).await?;
        Ok::<_, AdminError>(IncomeReport {
            overview,
            series: income::year_series(&points),
        })
    };
    match report.await {
        Ok(report) => Json(report).into_response(),
        Err(err) => error_response(err),
    }
}

/// `GET /incomes/month/:year/:month`
pub async fn income_month(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path((year, month)): Path<(i32, u32)>,
) -> Response {
    if !(1..=12).contains(&month) {
        return (StatusCode::BAD_REQUEST, "month must be between 1 and 12").into_response();
    }

    let backend = client_for(&state, &jar);
    let report = async {
        let overview = backend.gross_month(month, year).await?;
        let points = backend.gross_days_in_month(month, year).await?;
        Ok::<_, AdminError>(IncomeReport {
            overview,
            series: income::month_series(year, month, &points),
        })
    };
    match report.await {
        Ok(report) => Json(report).into_response(),
        Err(err) => error_response(err),
    }
}
