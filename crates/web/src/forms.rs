//! HTML form binding
//!
//! Forms arrive `application/x-www-form-urlencoded` and are bound as raw
//! strings, so a malformed number becomes a field error instead of a rejected
//! request. Each form's `clean` turns the raw values into typed input or a set
//! of [`FormErrors`].

use axum::{
    extract::FromRequest,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pedidos_common::errors::AppError;
use pedidos_common::db::models::Tier;
use pedidos_common::db::{ItemFields, OrderFields};
use pedidos_common::fulfillment::{Destination, Dispatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Key for errors that do not belong to a single field
pub const NON_FIELD: &str = "__all__";

const MAX_PRICE: f64 = 1_000_000_000.0;

/// `Form` extractor whose rejection renders as an [`AppError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct HtmlForm<T>(pub T);

/// Field name to messages, in field order
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add(NON_FIELD, message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn non_field(message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add_non_field(message);
        errors
    }

    /// Collect the errors reported by a `validator` derive. Nested structs are
    /// flattened into their parent form, as they are on the wire.
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let mut out = Self::default();
        out.collect(errors);
        out
    }

    fn collect(&mut self, errors: &ValidationErrors) {
        for (field, kind) in errors.errors() {
            match kind {
                ValidationErrorsKind::Field(field_errors) => {
                    let field = field.to_string();
                    for error in field_errors {
                        let message = error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| error.code.to_string());
                        self.add(&field, message);
                    }
                }
                ValidationErrorsKind::Struct(inner) => self.collect(inner),
                ValidationErrorsKind::List(items) => {
                    for inner in items.values() {
                        self.collect(inner);
                    }
                }
            }
        }
    }

    fn from_form(form: &impl Validate) -> Self {
        match form.validate() {
            Ok(()) => Self::default(),
            Err(errors) => Self::from_validation(&errors),
        }
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

/// A form redisplayed to the user, with whatever was submitted and the errors
#[derive(Debug, Serialize)]
pub struct FormPage<V> {
    pub form: &'static str,
    pub values: V,
    pub errors: FormErrors,
}

impl<V: Serialize> FormPage<V> {
    pub fn new(form: &'static str, values: V) -> Self {
        Self {
            form,
            values,
            errors: FormErrors::default(),
        }
    }

    pub fn with_errors(form: &'static str, values: V, errors: FormErrors) -> Self {
        Self { form, values, errors }
    }
}

impl<V: Serialize> IntoResponse for FormPage<V> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// HTML checkbox: present means checked unless it carries an explicit false
pub fn checkbox(value: &Option<String>) -> bool {
    match value.as_deref().map(str::trim) {
        None => false,
        Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "" | "false" | "0" | "off"),
    }
}

fn parse_int(errors: &mut FormErrors, field: &str, raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add(field, "This field is required.");
        return None;
    }
    match raw.parse::<i32>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.add(field, "Enter a whole number.");
            None
        }
    }
}

fn parse_price(errors: &mut FormErrors, raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add("price", "This field is required.");
        return None;
    }
    match raw.parse::<f64>() {
        Ok(price) if price.is_finite() && (0.0..=MAX_PRICE).contains(&price) => Some(price),
        Ok(_) => {
            errors.add("price", "Price must be between 0 and 1000000000.");
            None
        }
        Err(_) => {
            errors.add("price", "Enter a number.");
            None
        }
    }
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

// ============================================================================
// Accounts
// ============================================================================

/// Fields shared by both signup forms
#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct Credentials {
    #[validate(length(min = 1, max = 150, message = "Required. 150 characters or fewer."))]
    pub username: String,

    #[serde(skip_serializing)]
    #[validate(
        length(min = 1, message = "This field is required."),
        must_match(other = "password2", message = "The two password fields didn't match.")
    )]
    pub password1: String,

    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password2: String,
}

impl Credentials {
    fn check(&self, errors: &mut FormErrors) {
        if !self.username.is_empty() && !valid_username(&self.username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ClientSignupForm {
    #[serde(flatten)]
    #[validate(nested)]
    pub credentials: Credentials,

    #[validate(length(min = 1, max = 100, message = "Required. 100 characters or fewer."))]
    pub code: String,

    #[validate(length(max = 100, message = "100 characters or fewer."))]
    pub photo: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Required. 100 characters or fewer."))]
    pub address: String,

    pub client_type: Option<String>,
}

/// Typed client signup, password still in clear text
#[derive(Debug, Clone)]
pub struct ClientSignupInput {
    pub username: String,
    pub password: String,
    pub code: String,
    pub photo: Option<String>,
    pub address: String,
    pub tier: Tier,
}

impl ClientSignupForm {
    pub fn clean(&self) -> Result<ClientSignupInput, FormErrors> {
        let mut errors = FormErrors::from_form(self);
        self.credentials.check(&mut errors);

        let tier = match optional(&self.client_type) {
            None => Some(Tier::default()),
            Some(choice) => {
                let tier = Tier::from_choice(&choice);
                if tier.is_none() {
                    errors.add("client_type", "Select a valid choice.");
                }
                tier
            }
        };

        errors.finish(|| ClientSignupInput {
            username: self.credentials.username.clone(),
            password: self.credentials.password1.clone(),
            code: self.code.trim().to_string(),
            photo: optional(&self.photo),
            address: self.address.trim().to_string(),
            tier: tier.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct SupplierSignupForm {
    #[serde(flatten)]
    #[validate(nested)]
    pub credentials: Credentials,

    #[validate(length(min = 1, max = 100, message = "Required. 100 characters or fewer."))]
    pub address: String,

    #[validate(length(min = 1, max = 100, message = "Required. 100 characters or fewer."))]
    pub items_supplied: String,
}

#[derive(Debug, Clone)]
pub struct SupplierSignupInput {
    pub username: String,
    pub password: String,
    pub address: String,
    pub items_supplied: String,
}

impl SupplierSignupForm {
    pub fn clean(&self) -> Result<SupplierSignupInput, FormErrors> {
        let mut errors = FormErrors::from_form(self);
        self.credentials.check(&mut errors);

        errors.finish(|| SupplierSignupInput {
            username: self.credentials.username.clone(),
            password: self.credentials.password1.clone(),
            address: self.address.trim().to_string(),
            items_supplied: self.items_supplied.trim().to_string(),
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,

    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
}

impl LoginForm {
    pub fn clean(&self) -> Result<(), FormErrors> {
        FormErrors::from_form(self).finish(|| ())
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ItemForm {
    pub code: String,

    #[validate(length(min = 1, message = "This field is required."))]
    pub description: String,

    pub price: String,
}

impl ItemForm {
    /// Code and editable fields of a new item
    pub fn clean(&self) -> Result<(i32, ItemFields), FormErrors> {
        let mut errors = FormErrors::from_form(self);
        let code = parse_int(&mut errors, "code", &self.code);
        let price = parse_price(&mut errors, &self.price);

        errors.finish(|| {
            (
                code.unwrap_or_default(),
                ItemFields {
                    description: self.description.clone(),
                    price: price.unwrap_or_default(),
                },
            )
        })
    }

    /// Editable fields only; a submitted code is ignored
    pub fn clean_edit(&self) -> Result<ItemFields, FormErrors> {
        let mut errors = FormErrors::from_form(self);
        let price = parse_price(&mut errors, &self.price);

        errors.finish(|| ItemFields {
            description: self.description.clone(),
            price: price.unwrap_or_default(),
        })
    }

    pub fn from_item(item: &pedidos_common::db::models::Item) -> Self {
        Self {
            code: item.code.to_string(),
            description: item.description.clone(),
            price: item.price.to_string(),
        }
    }
}

// ============================================================================
// Orders
// ============================================================================

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrderForm {
    pub is_urgent: Option<String>,
    pub distribution_center: Option<String>,
    pub branch: Option<String>,
    pub associated_company: Option<String>,
    pub quantity: String,
}

impl OrderForm {
    pub fn clean(&self) -> Result<OrderFields, FormErrors> {
        let mut errors = FormErrors::default();
        let quantity = parse_int(&mut errors, "quantity", &self.quantity);
        if matches!(quantity, Some(q) if q < 1) {
            errors.add("quantity", "Ensure this value is greater than or equal to 1.");
        }

        errors.finish(|| OrderFields {
            is_urgent: checkbox(&self.is_urgent),
            distribution_center: checkbox(&self.distribution_center),
            branch: checkbox(&self.branch),
            associated_company: checkbox(&self.associated_company),
            quantity: quantity.unwrap_or(1),
        })
    }

    pub fn from_order(order: &pedidos_common::db::models::Order) -> Self {
        let flag = |on: bool| on.then(|| "on".to_string());
        Self {
            is_urgent: flag(order.is_urgent),
            distribution_center: flag(order.distribution_center),
            branch: flag(order.branch),
            associated_company: flag(order.associated_company),
            quantity: order.quantity.to_string(),
        }
    }
}

// ============================================================================
// Fulfillment
// ============================================================================

/// Union of the three dispatch forms; only the destination's fields are read
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchForm {
    pub warehouse: String,
    pub reference: String,
    pub branch_code: String,
    pub details: String,
}

impl DispatchForm {
    pub fn clean(&self, destination: Destination) -> Result<Dispatch, FormErrors> {
        let mut errors = FormErrors::default();

        let text = |errors: &mut FormErrors, field: &str, raw: &str, max: usize| -> String {
            let value = raw.trim();
            if value.is_empty() {
                errors.add(field, "This field is required.");
            } else if value.chars().count() > max {
                errors.add(field, format!("Ensure this value has at most {} characters.", max));
            }
            value.to_string()
        };

        let dispatch = match destination {
            Destination::DistributionCenter => {
                let warehouse = text(&mut errors, "warehouse", &self.warehouse, 50);
                Dispatch::DistributionCenter { warehouse }
            }
            Destination::Branch => {
                let reference = text(&mut errors, "reference", &self.reference, 50);
                let branch_code = parse_int(&mut errors, "branch_code", &self.branch_code);
                Dispatch::Branch {
                    reference,
                    branch_code: branch_code.unwrap_or_default(),
                }
            }
            Destination::AssociatedCompany => {
                let reference = text(&mut errors, "reference", &self.reference, 50);
                let branch_code = parse_int(&mut errors, "branch_code", &self.branch_code);
                let details = text(&mut errors, "details", &self.details, 200);
                Dispatch::AssociatedCompany {
                    reference,
                    branch_code: branch_code.unwrap_or_default(),
                    details,
                }
            }
        };

        errors.finish(|| dispatch)
    }
}
