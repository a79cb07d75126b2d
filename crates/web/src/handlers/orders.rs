//! Client order placement, edit and removal

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use pedidos_common::{
    auth::{ensure_order_for_item, ensure_order_owner, ClientSession},
    db::models::{Item, ManageOrder, Order},
    errors::{AppError, Result},
    fulfillment::OrderState,
    metrics, redirect, Repository,
};
use serde::Serialize;
use tracing::info;

use crate::forms::{FormPage, HtmlForm, OrderForm};
use crate::AppState;

const ORDER_CREATE: &str = "order_create";
const ORDER_EDIT: &str = "order_edit";

#[derive(Serialize)]
pub struct ItemDetailPage {
    pub item: Item,
    pub order: Option<Order>,
    pub ordered: bool,
    pub state: OrderState,
    pub fulfillment: Option<ManageOrder>,
}

#[derive(Serialize)]
pub struct OrderFormPage {
    pub item: Item,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(flatten)]
    pub form: FormPage<OrderForm>,
}

async fn find_item(repo: &Repository, code: i32) -> Result<Item> {
    repo.find_item(code)
        .await?
        .ok_or(AppError::ItemNotFound { code })
}

/// Refuse a second order for the same (client, item) pair
async fn ensure_not_ordered(repo: &Repository, client_id: i32, item_code: i32) -> Result<()> {
    if repo.find_order_for(client_id, item_code).await?.is_some() {
        metrics::record_order_event("duplicate");
        return Err(AppError::DuplicateOrder { item_code });
    }
    Ok(())
}

/// Load an order of the acting client, addressed through its item
async fn owned_order(
    repo: &Repository,
    item_code: i32,
    order_no: i32,
    client_id: i32,
) -> Result<(Item, Order)> {
    let item = find_item(repo, item_code).await?;
    let order = repo
        .find_order(order_no)
        .await?
        .ok_or(AppError::OrderNotFound { order_no })?;

    ensure_order_owner(&order, client_id)?;
    ensure_order_for_item(&order, item_code)?;
    Ok((item, order))
}

/// Item page with the acting client's order, if any
pub async fn item_detail(
    client: ClientSession,
    State(state): State<AppState>,
    Path(code): Path<i32>,
) -> Result<Json<ItemDetailPage>> {
    let repo = state.repo();
    let item = find_item(&repo, code).await?;
    let order = repo.find_order_for(client.user_id(), code).await?;

    let fulfillment = match &order {
        Some(order) => repo.find_fulfillment(order.order_no).await?,
        None => None,
    };

    Ok(Json(ItemDetailPage {
        state: OrderState::of(order.as_ref(), fulfillment.as_ref()),
        ordered: order.is_some(),
        item,
        order,
        fulfillment,
    }))
}

pub async fn create_order_page(
    client: ClientSession,
    State(state): State<AppState>,
    Path(code): Path<i32>,
) -> Result<Json<OrderFormPage>> {
    let repo = state.repo();
    let item = find_item(&repo, code).await?;
    ensure_not_ordered(&repo, client.user_id(), code).await?;

    Ok(Json(OrderFormPage {
        item,
        order: None,
        form: FormPage::new(ORDER_CREATE, OrderForm::default()),
    }))
}

/// Place an order; client, item and creation time are assigned here
pub async fn create_order(
    client: ClientSession,
    State(state): State<AppState>,
    Path(code): Path<i32>,
    HtmlForm(form): HtmlForm<OrderForm>,
) -> Result<Response> {
    let repo = state.repo();
    let client_id = client.user_id();
    let item = find_item(&repo, code).await?;
    ensure_not_ordered(&repo, client_id, code).await?;

    let fields = match form.clean() {
        Ok(fields) => fields,
        Err(errors) => {
            let form = FormPage::with_errors(ORDER_CREATE, form, errors);
            return Ok(Json(OrderFormPage { item, order: None, form }).into_response());
        }
    };

    repo.find_client(client_id)
        .await?
        .ok_or(AppError::ProfileNotFound {
            role: "client",
            user_id: client_id,
        })?;

    let order = repo.create_order(client_id, code, fields).await.inspect_err(|e| {
        if matches!(e, AppError::DuplicateOrder { .. }) {
            metrics::record_order_event("duplicate");
        }
    })?;

    metrics::record_order_event("created");
    info!(
        order = order.order_no,
        item = code,
        client_id,
        destination = order.destination().map(|d| d.as_str()),
        "Order placed"
    );

    Ok(redirect::found(redirect::CLIENT_HOME))
}

pub async fn edit_order_page(
    client: ClientSession,
    State(state): State<AppState>,
    Path((code, order_no)): Path<(i32, i32)>,
) -> Result<Json<OrderFormPage>> {
    let (item, order) = owned_order(&state.repo(), code, order_no, client.user_id()).await?;
    let form = FormPage::new(ORDER_EDIT, OrderForm::from_order(&order));

    Ok(Json(OrderFormPage {
        item,
        order: Some(order),
        form,
    }))
}

/// Rebind the order's flags and quantity
pub async fn edit_order(
    client: ClientSession,
    State(state): State<AppState>,
    Path((code, order_no)): Path<(i32, i32)>,
    HtmlForm(form): HtmlForm<OrderForm>,
) -> Result<Response> {
    let repo = state.repo();
    let (item, order) = owned_order(&repo, code, order_no, client.user_id()).await?;

    let fields = match form.clean() {
        Ok(fields) => fields,
        Err(errors) => {
            let form = FormPage::with_errors(ORDER_EDIT, form, errors);
            return Ok(Json(OrderFormPage {
                item,
                order: Some(order),
                form,
            })
            .into_response());
        }
    };

    let order = repo.update_order(order, fields).await?;
    metrics::record_order_event("edited");
    info!(order = order.order_no, "Order updated");

    Ok(redirect::found(redirect::CLIENT_HOME))
}

/// Delete the order and its fulfillment record
pub async fn delete_order(
    client: ClientSession,
    State(state): State<AppState>,
    Path((code, order_no)): Path<(i32, i32)>,
) -> Result<Response> {
    let repo = state.repo();
    owned_order(&repo, code, order_no, client.user_id()).await?;

    let removed = repo.delete_order(order_no).await?;
    metrics::record_order_event("deleted");
    info!(order = order_no, fulfillments = removed.fulfillments, "Order deleted");

    Ok(redirect::found(redirect::CLIENT_HOME))
}
