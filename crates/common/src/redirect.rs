//! Route names and the `302 Found` redirect used across the service

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// Login page
pub const LOGIN: &str = "/login/";

/// Client home (full catalog)
pub const CLIENT_HOME: &str = "/";

/// Supplier home (own items)
pub const SUPPLIER_HOME: &str = "/supplier/";

/// Build a `302 Found` response pointing at `location`
pub fn found(location: &str) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}
