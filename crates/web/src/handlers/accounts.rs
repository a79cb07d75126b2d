//! Signup, login and logout

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use pedidos_common::{
    auth::{hash_password, verify_password, SessionManager},
    db::{models::User, ClientSignup, SupplierSignup},
    errors::{AppError, Result},
    metrics, redirect,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::forms::{ClientSignupForm, FormErrors, FormPage, HtmlForm, LoginForm, SupplierSignupForm};
use crate::AppState;

const CLIENT_SIGNUP: &str = "client_signup";
const SUPPLIER_SIGNUP: &str = "supplier_signup";
const LOGIN: &str = "login";

const USERNAME_TAKEN: &str = "A user with that username already exists.";
const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Serialize)]
pub struct LogoutPage {
    pub logged_out: bool,
}

/// Issue a session for `user` and send them to their home page
fn start_session(sessions: &SessionManager, user: &User) -> Result<Response> {
    let token = sessions.issue(user)?;
    let cookie = HeaderValue::from_str(&sessions.session_cookie(&token)).map_err(|e| {
        AppError::Internal {
            message: format!("Invalid session cookie: {}", e),
        }
    })?;

    let mut response = redirect::found(user.role.home());
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

fn username_taken() -> FormErrors {
    let mut errors = FormErrors::default();
    errors.add("username", USERNAME_TAKEN);
    errors
}

pub async fn client_signup_page() -> FormPage<ClientSignupForm> {
    FormPage::new(CLIENT_SIGNUP, ClientSignupForm::default())
}

/// Create a client identity with its profile, then log the user in
pub async fn client_signup(
    State(state): State<AppState>,
    HtmlForm(form): HtmlForm<ClientSignupForm>,
) -> Result<Response> {
    let input = match form.clean() {
        Ok(input) => input,
        Err(errors) => return Ok(FormPage::with_errors(CLIENT_SIGNUP, form, errors).into_response()),
    };

    let repo = state.repo();
    if repo.find_user_by_username(&input.username).await?.is_some() {
        return Ok(FormPage::with_errors(CLIENT_SIGNUP, form, username_taken()).into_response());
    }

    let signup = ClientSignup {
        username: input.username,
        password_hash: hash_password(&input.password)?,
        code: input.code,
        photo: input.photo,
        address: input.address,
        tier: input.tier,
    };

    let (user, client) = match repo.create_client_account(signup).await {
        Ok(created) => created,
        // lost a race with a concurrent signup
        Err(AppError::Duplicate { .. }) => {
            return Ok(FormPage::with_errors(CLIENT_SIGNUP, form, username_taken()).into_response())
        }
        Err(e) => return Err(e),
    };

    metrics::record_signup("client");
    info!(user_id = user.id, tier = client.tier.label(), "Client account created");

    start_session(&state.sessions, &user)
}

pub async fn supplier_signup_page() -> FormPage<SupplierSignupForm> {
    FormPage::new(SUPPLIER_SIGNUP, SupplierSignupForm::default())
}

/// Create a supplier identity with its profile, then log the user in
pub async fn supplier_signup(
    State(state): State<AppState>,
    HtmlForm(form): HtmlForm<SupplierSignupForm>,
) -> Result<Response> {
    let input = match form.clean() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(FormPage::with_errors(SUPPLIER_SIGNUP, form, errors).into_response())
        }
    };

    let repo = state.repo();
    if repo.find_user_by_username(&input.username).await?.is_some() {
        return Ok(FormPage::with_errors(SUPPLIER_SIGNUP, form, username_taken()).into_response());
    }

    let signup = SupplierSignup {
        username: input.username,
        password_hash: hash_password(&input.password)?,
        address: input.address,
        items_supplied: input.items_supplied,
    };

    let (user, _) = match repo.create_supplier_account(signup).await {
        Ok(created) => created,
        Err(AppError::Duplicate { .. }) => {
            return Ok(FormPage::with_errors(SUPPLIER_SIGNUP, form, username_taken()).into_response())
        }
        Err(e) => return Err(e),
    };

    metrics::record_signup("supplier");
    info!(user_id = user.id, "Supplier account created");

    start_session(&state.sessions, &user)
}

pub async fn login_page() -> FormPage<LoginForm> {
    FormPage::new(LOGIN, LoginForm::default())
}

/// Authenticate and redirect to the role's home page
pub async fn login(
    State(state): State<AppState>,
    HtmlForm(form): HtmlForm<LoginForm>,
) -> Result<Response> {
    if let Err(errors) = form.clean() {
        return Ok(FormPage::with_errors(LOGIN, form, errors).into_response());
    }

    let user = state.repo().find_user_by_username(form.username.trim()).await?;

    match user {
        Some(user) if user.is_active && verify_password(&form.password, &user.password_hash) => {
            info!(user_id = user.id, role = user.role.as_str(), "User logged in");
            start_session(&state.sessions, &user)
        }
        _ => {
            warn!(username = %form.username, "Failed login attempt");
            metrics::record_auth_denial("bad_credentials");
            Ok(FormPage::with_errors(LOGIN, form, FormErrors::non_field(BAD_CREDENTIALS)).into_response())
        }
    }
}

/// Drop the session cookie. Open to anyone.
pub async fn logout(State(sessions): State<Arc<SessionManager>>) -> Response {
    info!("Session cleared");
    (
        [(header::SET_COOKIE, sessions.clear_cookie())],
        Json(LogoutPage { logged_out: true }),
    )
        .into_response()
}
