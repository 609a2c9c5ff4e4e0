/*!
# Shop Admin

Server side of an e-commerce administration console, built in Rust.

## Overview

The console manages products, categories, attributes, coupons and orders
of a shop whose data lives in a separate backend REST service. This crate
sits between the browser and that backend: it relays API calls, keeps the
backend's tokens in HTTP-only cookies, and hosts the logic the console
screens share.

## Architecture

### Relay Layer
- **Technologies**: axum, reqwest
- `/api/...` is forwarded to `ENDPOINT_SERVER` with the `/api` prefix stripped
- The `accessToken` cookie is sent upstream as `Authorization: Bear <token>`
- Login responses are turned into `accessToken`, `refreshToken`, `apiKey`
  and `publicKey` cookies

### Console Logic
- Category Tree Resolver - child lookup, breadcrumbs and the category picker
- Field Checks - failing-field tracking shared by every create/edit form
- Product Form - draft editing, gallery handling and guarded submission
- Session Context - operator profile with explicit init and teardown
- Income and export helpers for the dashboards

## Modules

- **category**: Category map, tree walks and the picker
- **category_form**: Category create form and payload
- **fields**: Field values and the failing-field set
- **product**: Product models and the product form
- **backend**: REST client traits and their HTTP implementation
- **session**: Cookie names, tokens and the session context
- **order**: Order models
- **income**: Gross overview and chart series
- **export**: CSV export of orders and invoices
- **pagination**: Listing pagination
- **debounce**: Instance-scoped input debouncing
- **config**: Environment configuration
- **error**: Error type and its classification
- **app**, **proxy**, **console**: Routing, relays and local routes (`web` feature)
*/

pub mod backend;
pub mod category;
pub mod category_form;
pub mod config;
pub mod debounce;
pub mod error;
pub mod export;
pub mod fields;
pub mod income;
pub mod notice;
pub mod order;
pub mod pagination;
pub mod product;
pub mod session;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod console;
#[cfg(feature = "web")]
pub mod proxy;

pub use category::{
    CategoryMap, CategoryNode, CategoryPicker, CategorySelection, ROOT_KEY, generate_breadcrumbs,
    resolve_children,
};
pub use error::{AdminError, ErrorKind};
pub use fields::{Field, FieldCheckSet, FieldValue, check_fields};
pub use notice::Notice;
