//! Typed client for the backend REST service.
//!
//! The traits split the backend by screen so form logic can be exercised
//! against small in-memory stand-ins; [`BackendClient`] implements all of
//! them over HTTP. Calls are issued once: no retry, no deduplication.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, header::AUTHORIZATION};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::category::CategoryRecord;
use crate::category_form::CreateCategory;
use crate::error::{AdminError, Result};
use crate::income::{DayPoint, GrossYear, Grow, MonthPoint};
use crate::order::{Order, OrderCancel, OrderStatus};
use crate::pagination::Pagination;
use crate::product::{Attribute, CreateProduct, Product, ProductFilter};
use crate::session::{KeyToken, UserProfile, bearer};

/// Wrapper the backend puts around most listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: u16,
    pub payload: T,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> From<ApiEnvelope<Vec<T>>> for Page<T> {
    fn from(envelope: ApiEnvelope<Vec<T>>) -> Self {
        Page {
            items: envelope.payload,
            pagination: envelope.pagination.unwrap_or_default(),
        }
    }
}

/// Map a status code found in a response body to an error.
pub fn status_error(code: u64) -> AdminError {
    match u16::try_from(code) {
        Ok(status) => AdminError::from_status(status),
        Err(_) => AdminError::Decode(format!("status code {} out of range", code)),
    }
}

/// Reject a blank id before any request is made.
pub fn require_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AdminError::Validation {
            fields: vec!["id".to_string()],
        });
    }
    Ok(id)
}

#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn list_categories_page(&self, page: u32) -> Result<Page<CategoryRecord>>;
    async fn search_categories(&self, search: &str, page: u32) -> Result<Page<CategoryRecord>>;
    async fn list_parent_categories(&self) -> Result<Vec<CategoryRecord>>;
    async fn create_category(&self, category: &CreateCategory) -> Result<()>;
    async fn set_category_public(&self, category_id: &str, public: bool) -> Result<()>;
    async fn delete_category(&self, category_id: &str) -> Result<()>;
    async fn get_product(&self, product_id: &str) -> Result<Product>;
    async fn create_product(&self, product: &CreateProduct) -> Result<()>;
    async fn update_product(&self, product_id: &str, product: &CreateProduct) -> Result<()>;
    async fn delete_product(&self, product_id: &str) -> Result<()>;
    /// Quick name search used by the product picker.
    async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;
    /// Paginated product listing with search and category filters.
    async fn list_products(&self, filter: &ProductFilter) -> Result<Page<Product>>;
    async fn list_variants(&self) -> Result<Vec<Attribute>>;

    /// Every category, following the listing's pages to the end.
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>> {
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let listing = self.list_categories_page(page).await?;
            let last = listing.items.is_empty() || page >= listing.pagination.total_pages();
            records.extend(listing.items);
            if last {
                return Ok(records);
            }
            page += 1;
        }
    }
}

#[async_trait]
pub trait OrderBackend: Send + Sync {
    async fn list_orders(&self, page: u32) -> Result<Page<Order>>;
    async fn get_order(&self, order_id: &str) -> Result<Order>;
    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        cancel: Option<&OrderCancel>,
    ) -> Result<()>;
}

#[async_trait]
pub trait ReportBackend: Send + Sync {
    /// Overview for one month. A month with no figures is all zeros.
    async fn gross_month(&self, month: u32, year: i32) -> Result<Grow>;
    /// Daily figures of one month. A month with no figures has no points.
    async fn gross_days_in_month(&self, month: u32, year: i32) -> Result<Vec<DayPoint>>;
    /// Overview for one year. A year with no figures is all zeros.
    async fn gross_year(&self, year: i32) -> Result<Grow>;
    /// Monthly figures of one year. A year with no figures has no points.
    async fn gross_months_in_year(&self, year: i32) -> Result<Vec<MonthPoint>>;
    /// Years the backend holds figures for.
    async fn gross_years(&self) -> Result<Vec<GrossYear>>;
}

#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn user_profile(&self) -> Result<UserProfile>;
    async fn refresh_token(&self) -> Result<KeyToken>;
    async fn logout(&self) -> Result<()>;
}

/// HTTP implementation of every backend trait.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        BackendClient {
            http,
            base_url: base_url.into(),
            access_token: None,
        }
    }

    /// Client that authenticates as the holder of `token`.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.access_token {
            Some(token) => builder.header(AUTHORIZATION, bearer(token)),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("backend {} responded {}", response.url().path(), status);
            return Err(AdminError::from_status(status.as_u16()));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        Ok(response.json().await?)
    }

    /// Send `builder` and unwrap the envelope.
    ///
    /// The status inside the body is checked before the payload is decoded,
    /// since error envelopes usually carry no payload.
    async fn envelope<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<ApiEnvelope<T>> {
        let body: serde_json::Value = self.send(builder).await?.json().await?;
        check_body_status(&body)?;
        Ok(serde_json::from_value(body)?)
    }

    /// Send `builder` and check the body status of a write without payload.
    async fn send_checked(&self, builder: RequestBuilder) -> Result<()> {
        let body: serde_json::Value = self.send(builder).await?.json().await.unwrap_or_default();
        check_body_status(&body)
    }

    async fn get_envelope<T: DeserializeOwned>(&self, path: &str) -> Result<ApiEnvelope<T>> {
        self.envelope(self.request(Method::GET, path)).await
    }

    async fn send_json<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: &B) -> Result<()> {
        self.send(self.request(method, path).json(body)).await?;
        Ok(())
    }
}

fn check_body_status(body: &serde_json::Value) -> Result<()> {
    match body.get("status").and_then(|s| s.as_u64()) {
        Some(status) if !(200..300).contains(&status) => Err(status_error(status)),
        _ => Ok(()),
    }
}

/// A period the backend has no figures for answers 404.
fn or_empty<T: Default>(result: Result<T>) -> Result<T> {
    match result {
        Err(AdminError::NotFound) => Ok(T::default()),
        other => other,
    }
}

#[async_trait]
impl CatalogBackend for BackendClient {
    async fn list_categories_page(&self, page: u32) -> Result<Page<CategoryRecord>> {
        let builder = self.request(Method::GET, "/categories").query(&[("page", page)]);
        Ok(self.envelope(builder).await?.into())
    }

    async fn search_categories(&self, search: &str, page: u32) -> Result<Page<CategoryRecord>> {
        let builder = self
            .request(Method::GET, "/categories/search")
            .query(&[("search", search.to_string()), ("page", page.to_string())]);
        Ok(self.envelope(builder).await?.into())
    }

    async fn list_parent_categories(&self) -> Result<Vec<CategoryRecord>> {
        Ok(self.get_envelope("/categories/parent").await?.payload)
    }

    async fn create_category(&self, category: &CreateCategory) -> Result<()> {
        log::info!("creating category {}", category.title);
        self.send_checked(self.request(Method::POST, "/category").json(category))
            .await
    }

    async fn set_category_public(&self, category_id: &str, public: bool) -> Result<()> {
        let id = require_id(category_id)?;
        log::info!("category {} public={}", id, public);
        self.send_json(
            Method::PATCH,
            &format!("/categories/{}", id),
            &serde_json::json!({ "public": public }),
        )
        .await
    }

    async fn delete_category(&self, category_id: &str) -> Result<()> {
        let id = require_id(category_id)?;
        log::info!("deleting category {}", id);
        self.send(self.request(Method::DELETE, &format!("/categories/{}", id)))
            .await?;
        Ok(())
    }

    async fn get_product(&self, product_id: &str) -> Result<Product> {
        let id = require_id(product_id)?;
        self.get_json(&format!("/products/id/{}", id)).await
    }

    async fn create_product(&self, product: &CreateProduct) -> Result<()> {
        log::info!("creating product {}", product.name);
        self.send_json(Method::POST, "/product", product).await
    }

    async fn update_product(&self, product_id: &str, product: &CreateProduct) -> Result<()> {
        let id = require_id(product_id)?;
        log::info!("updating product {}", id);
        self.send_json(Method::PATCH, &format!("/products/{}", id), product)
            .await
    }

    async fn delete_product(&self, product_id: &str) -> Result<()> {
        let id = require_id(product_id)?;
        log::info!("deleting product {}", id);
        self.send(self.request(Method::DELETE, &format!("/admin/products/{}", id)))
            .await?;
        Ok(())
    }

    async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let response = self
            .send(self.request(Method::GET, "/product/search").query(filter))
            .await?;
        Ok(response.json().await?)
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Page<Product>> {
        let builder = self
            .request(Method::GET, "/admin/products/search")
            .query(filter);
        Ok(self.envelope(builder).await?.into())
    }

    async fn list_variants(&self) -> Result<Vec<Attribute>> {
        self.get_json("/variants").await
    }
}

#[async_trait]
impl OrderBackend for BackendClient {
    async fn list_orders(&self, page: u32) -> Result<Page<Order>> {
        let builder = self.request(Method::GET, "/orders").query(&[("page", page)]);
        Ok(self.envelope(builder).await?.into())
    }

    async fn get_order(&self, order_id: &str) -> Result<Order> {
        let id = require_id(order_id)?;
        Ok(self.get_envelope(&format!("/orders/{}", id)).await?.payload)
    }

    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        cancel: Option<&OrderCancel>,
    ) -> Result<()> {
        let id = require_id(order_id)?;
        let mut body = serde_json::json!({ "status": status });
        if let Some(cancel) = cancel {
            if let (Some(map), serde_json::Value::Object(extra)) =
                (body.as_object_mut(), serde_json::to_value(cancel)?)
            {
                map.extend(extra);
            }
        }
        log::info!("order {} -> {}", id, status);
        self.send_json(Method::PATCH, &format!("/orders/{}", id), &body)
            .await
    }
}

#[async_trait]
impl ReportBackend for BackendClient {
    async fn gross_month(&self, month: u32, year: i32) -> Result<Grow> {
        let builder = self
            .request(Method::GET, "/gross-month")
            .query(&[("gross_month", month.to_string()), ("gross_year", year.to_string())]);
        let overview = self.envelope(builder).await.map(|e| e.payload);
        or_empty(overview)
    }

    async fn gross_days_in_month(&self, month: u32, year: i32) -> Result<Vec<DayPoint>> {
        let builder = self
            .request(Method::GET, "/gross-date/month")
            .query(&[("gross_month", month.to_string()), ("gross_year", year.to_string())]);
        let points = self.envelope(builder).await.map(|e| e.payload);
        or_empty(points)
    }

    async fn gross_year(&self, year: i32) -> Result<Grow> {
        let builder = self
            .request(Method::GET, "/gross-year/year")
            .query(&[("gross_year", year)]);
        let overview = self.envelope(builder).await.map(|e| e.payload);
        or_empty(overview)
    }

    async fn gross_months_in_year(&self, year: i32) -> Result<Vec<MonthPoint>> {
        let builder = self
            .request(Method::GET, "/gross-month/year")
            .query(&[("gross_year", year)]);
        let points = self.envelope(builder).await.map(|e| e.payload);
        or_empty(points)
    }

    async fn gross_years(&self) -> Result<Vec<GrossYear>> {
        let builder = self.request(Method::GET, "/gross-year").query(&[("year", 1)]);
        let years = self.envelope(builder).await.map(|e| e.payload);
        or_empty(years)
    }
}

#[async_trait]
impl SessionBackend for BackendClient {
    async fn user_profile(&self) -> Result<UserProfile> {
        // The profile endpoint reports auth failures in the body.
        let body: serde_json::Value = self.get_json("/oauth/user-profile").await?;
        if let Some(code) = body.get("code").and_then(|c| c.as_u64()) {
            return Err(status_error(code));
        }
        Ok(serde_json::from_value(body)?)
    }

    async fn refresh_token(&self) -> Result<KeyToken> {
        Ok(self.get_envelope("/admin/refreshToken").await?.payload)
    }

    async fn logout(&self) -> Result<()> {
        self.send_json(Method::POST, "/oauth/logout", &serde_json::json!({}))
            .await
    }
}
