//! Shared helpers for the HTTP tests: an app over a private in-memory database

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use pedidos_common::{
    auth::hash_password,
    config::AppConfig,
    db::{models::Tier, schema::create_schema, ClientSignup, ItemFields, OrderFields, SupplierSignup},
    DbPool, Repository,
};
use pedidos_web::{create_router, AppState};
use std::sync::{Arc, OnceLock};
use tower::ServiceExt;

pub const PASSWORD: &str = "clave-segura-123";

fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).unwrap()).clone()
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// A logged-in account: its id and the `Cookie` header value to send
pub struct Account {
    pub id: i32,
    pub cookie: String,
}

pub async fn spawn_app() -> TestApp {
    let config = AppConfig::for_tests();
    let db = DbPool::new(&config.database).await.unwrap();
    create_schema(db.write()).await.unwrap();

    let state = AppState::new(Arc::new(config), db);
    TestApp {
        router: create_router(state.clone()),
        state,
    }
}

impl TestApp {
    pub fn repo(&self) -> Repository {
        self.state.repo()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        form: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.request(Method::GET, uri, cookie, None).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, form: &str) -> Response {
        self.request(Method::POST, uri, cookie, Some(form)).await
    }

    fn login_cookie(&self, user: &pedidos_common::db::models::User) -> String {
        let token = self.state.sessions.issue(user).unwrap();
        format!("{}={}", self.state.sessions.cookie_name(), token)
    }

    /// Create a client account directly and return its session
    pub async fn client(&self, username: &str) -> Account {
        let (user, _) = self
            .repo()
            .create_client_account(ClientSignup {
                username: username.to_string(),
                password_hash: password_hash(),
                code: format!("C-{}", username),
                photo: None,
                address: "Av. Central 1".to_string(),
                tier: Tier::Normal,
            })
            .await
            .unwrap();

        Account {
            id: user.id,
            cookie: self.login_cookie(&user),
        }
    }

    /// Create a supplier account directly and return its session
    pub async fn supplier(&self, username: &str) -> Account {
        let (user, _) = self
            .repo()
            .create_supplier_account(SupplierSignup {
                username: username.to_string(),
                password_hash: password_hash(),
                address: "Zona Norte".to_string(),
                items_supplied: "ferreteria".to_string(),
            })
            .await
            .unwrap();

        Account {
            id: user.id,
            cookie: self.login_cookie(&user),
        }
    }

    pub async fn item(&self, supplier: &Account, code: i32) {
        self.repo()
            .create_item(
                supplier.id,
                code,
                ItemFields {
                    description: format!("Articulo {}", code),
                    price: 10.0,
                },
            )
            .await
            .unwrap();
    }

    /// Place an order directly; returns its number
    pub async fn order(&self, client: &Account, item_code: i32, flags: (bool, bool, bool)) -> i32 {
        let (distribution_center, branch, associated_company) = flags;
        self.repo()
            .create_order(
                client.id,
                item_code,
                OrderFields {
                    is_urgent: false,
                    distribution_center,
                    branch,
                    associated_company,
                    quantity: 2,
                },
            )
            .await
            .unwrap()
            .order_no
    }
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// `name=value` of the cookie a response sets
pub fn set_cookie(response: &Response) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    raw.split(';').next().unwrap_or_default().to_string()
}

pub async fn json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn assert_redirect(response: &Response, to: &str) {
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(response), to);
}
