//! Catalog pages and supplier item management

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use pedidos_common::{
    auth::{ensure_item_owner, ClientSession, SupplierSession},
    db::{models::Item, OrderWithFulfillment},
    errors::{AppError, Result},
    metrics, redirect, Repository,
};
use serde::Serialize;
use tracing::info;

use crate::forms::{FormErrors, FormPage, HtmlForm, ItemForm};
use crate::AppState;

const ITEM_CREATE: &str = "item_create";
const ITEM_EDIT: &str = "item_edit";

#[derive(Serialize)]
pub struct CatalogPage {
    pub items: Vec<Item>,
}

#[derive(Serialize)]
pub struct ItemEditPage {
    pub item: Item,
    #[serde(flatten)]
    pub form: FormPage<ItemForm>,
}

#[derive(Serialize)]
pub struct SupplierItemPage {
    pub item: Item,
    pub orders: Vec<OrderWithFulfillment>,
}

/// Load an item the acting supplier owns
async fn owned_item(repo: &Repository, code: i32, supplier_id: i32) -> Result<Item> {
    let item = repo
        .find_item(code)
        .await?
        .ok_or(AppError::ItemNotFound { code })?;
    ensure_item_owner(&item, supplier_id)?;
    Ok(item)
}

/// Client home: the full catalog
pub async fn client_home(
    _client: ClientSession,
    State(state): State<AppState>,
) -> Result<Json<CatalogPage>> {
    let items = state.repo().list_items().await?;
    Ok(Json(CatalogPage { items }))
}

/// Supplier home: the supplier's own items
pub async fn supplier_home(
    supplier: SupplierSession,
    State(state): State<AppState>,
) -> Result<Json<CatalogPage>> {
    let items = state.repo().list_items_by_supplier(supplier.user_id()).await?;
    Ok(Json(CatalogPage { items }))
}

pub async fn create_item_page(_supplier: SupplierSession) -> FormPage<ItemForm> {
    FormPage::new(ITEM_CREATE, ItemForm::default())
}

/// Add an item to the acting supplier's catalog
pub async fn create_item(
    supplier: SupplierSession,
    State(state): State<AppState>,
    HtmlForm(form): HtmlForm<ItemForm>,
) -> Result<Response> {
    let (code, fields) = match form.clean() {
        Ok(cleaned) => cleaned,
        Err(errors) => return Ok(FormPage::with_errors(ITEM_CREATE, form, errors).into_response()),
    };

    let repo = state.repo();
    let supplier_id = supplier.user_id();
    repo.find_supplier(supplier_id)
        .await?
        .ok_or(AppError::ProfileNotFound {
            role: "supplier",
            user_id: supplier_id,
        })?;

    let duplicate_code = || {
        let mut errors = FormErrors::default();
        errors.add("code", "Item with this Code already exists.");
        errors
    };

    if repo.find_item(code).await?.is_some() {
        return Ok(FormPage::with_errors(ITEM_CREATE, form, duplicate_code()).into_response());
    }

    match repo.create_item(supplier_id, code, fields).await {
        Ok(item) => {
            metrics::record_item_event("created");
            info!(item = item.code, supplier_id, "Item created");
            Ok(redirect::found(redirect::SUPPLIER_HOME))
        }
        Err(AppError::Duplicate { .. }) => {
            Ok(FormPage::with_errors(ITEM_CREATE, form, duplicate_code()).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn edit_item_page(
    supplier: SupplierSession,
    State(state): State<AppState>,
    Path(code): Path<i32>,
) -> Result<Json<ItemEditPage>> {
    let item = owned_item(&state.repo(), code, supplier.user_id()).await?;
    let form = FormPage::new(ITEM_EDIT, ItemForm::from_item(&item));
    Ok(Json(ItemEditPage { item, form }))
}

/// Update description and price; the code never changes
pub async fn edit_item(
    supplier: SupplierSession,
    State(state): State<AppState>,
    Path(code): Path<i32>,
    HtmlForm(form): HtmlForm<ItemForm>,
) -> Result<Response> {
    let repo = state.repo();
    let item = owned_item(&repo, code, supplier.user_id()).await?;

    let fields = match form.clean_edit() {
        Ok(fields) => fields,
        Err(errors) => {
            let form = FormPage::with_errors(ITEM_EDIT, form, errors);
            return Ok(Json(ItemEditPage { item, form }).into_response());
        }
    };

    let item = repo.update_item(item, fields).await?;
    metrics::record_item_event("edited");
    info!(item = item.code, "Item updated");

    Ok(redirect::found(redirect::SUPPLIER_HOME))
}

/// Remove an item together with its orders and their fulfillments
pub async fn delete_item(
    supplier: SupplierSession,
    State(state): State<AppState>,
    Path(code): Path<i32>,
) -> Result<Response> {
    let repo = state.repo();
    owned_item(&repo, code, supplier.user_id()).await?;

    let removed = repo.delete_item(code).await?;
    metrics::record_item_event("deleted");
    info!(
        item = code,
        orders = removed.orders,
        fulfillments = removed.fulfillments,
        "Item deleted"
    );

    Ok(redirect::found(redirect::SUPPLIER_HOME))
}

/// Item with every order placed against it. Other suppliers are sent home.
pub async fn supplier_item_detail(
    supplier: SupplierSession,
    State(state): State<AppState>,
    Path(code): Path<i32>,
) -> Result<Response> {
    let repo = state.repo();
    let item = repo
        .find_item(code)
        .await?
        .ok_or(AppError::ItemNotFound { code })?;

    if item.supplier_id != supplier.user_id() {
        metrics::record_auth_denial("item_owner");
        return Ok(redirect::found(redirect::SUPPLIER_HOME));
    }

    let orders = repo.orders_for_item(code).await?;
    Ok(Json(SupplierItemPage { item, orders }).into_response())
}
