use axum::{
    Router, middleware,
    routing::{any, delete, get, patch, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::console;
use crate::proxy;

/// Shared state of the console server.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState {
            config,
            http: reqwest::Client::new(),
        }
    }
}

/// Build the full router: relays under `/api`, console routes behind the
/// session middleware, and static assets.
pub fn router(state: Arc<AppState>) -> Router {
    let console_routes = Router::new()
        .route("/session", get(console::session_profile))
        .route("/session/refresh", post(console::refresh_session))
        .route(
            "/categories",
            get(console::list_categories).post(console::create_category),
        )
        .route("/categories/tree", get(console::category_tree))
        .route("/categories/parents", get(console::parent_categories))
        .route("/categories/:id", delete(console::delete_category))
        .route("/categories/:id/public", patch(console::publish_category))
        .route("/categories/:id/breadcrumbs", get(console::category_breadcrumbs))
        .route("/products", get(console::list_products))
        .route("/products/search", get(console::search_products))
        .route("/products/options", get(console::product_options))
        .route("/products/:id", delete(console::delete_product))
        .route("/products/:id/edit", get(console::edit_product))
        .route("/orders/export.csv", get(console::export_orders))
        .route("/orders/:id/status", patch(console::update_order_status))
        .route("/orders/:id/invoice.csv", get(console::export_invoice))
        .route("/incomes/years", get(console::income_years))
        .route("/incomes/year/:year", get(console::income_year))
        .route("/incomes/month/:year/:month", get(console::income_month))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            console::require_session,
        ));

    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/api/admin/login", post(proxy::admin_login))
        .route("/api/oauth/access-token", post(proxy::oauth_access_token))
        .route("/api/oauth/logout", post(proxy::oauth_logout))
        .route("/api/*path", any(proxy::forward))
        .merge(console_routes)
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bind = config.bind;
    let endpoint = config.endpoint_server.clone();
    let app = router(Arc::new(AppState::new(config)));

    // Start server
    let listener = TcpListener::bind(bind).await?;
    log::info!("Listening on http://{} (backend {})", bind, endpoint);
    axum::serve(listener, app).await?;

    Ok(())
}
