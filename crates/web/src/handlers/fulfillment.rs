//! Supplier-side order fulfillment

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use pedidos_common::{
    auth::{ensure_item_owner, ensure_order_for_item, SupplierSession},
    db::models::{Item, ManageOrder, Order},
    errors::{AppError, Result},
    fulfillment::{Destination, OrderState},
    metrics, redirect, Repository,
};
use serde::Serialize;
use tracing::info;

use crate::forms::{DispatchForm, FormErrors, FormPage, HtmlForm};
use crate::AppState;

const MANAGE_ORDER: &str = "manage_order";
const NO_DESTINATION: &str =
    "This order has no destination selected and cannot be dispatched.";

#[derive(Serialize)]
pub struct ManageOrderPage {
    pub item: Item,
    pub order: Order,
    pub state: OrderState,
    pub destination: Option<Destination>,
    pub required_fields: &'static [&'static str],
    pub fulfillment: Option<ManageOrder>,
    #[serde(flatten)]
    pub form: FormPage<DispatchForm>,
}

impl ManageOrderPage {
    fn new(
        item: Item,
        order: Order,
        fulfillment: Option<ManageOrder>,
        form: DispatchForm,
        mut errors: FormErrors,
    ) -> Self {
        let destination = order.destination();
        if destination.is_none() {
            errors.add_non_field(NO_DESTINATION);
        }

        Self {
            state: OrderState::of(Some(&order), fulfillment.as_ref()),
            required_fields: destination.map(|d| d.required_fields()).unwrap_or(&[]),
            destination,
            item,
            order,
            fulfillment,
            form: FormPage::with_errors(MANAGE_ORDER, form, errors),
        }
    }
}

/// Load an order placed on an item the acting supplier owns
async fn supplier_order(
    repo: &Repository,
    item_code: i32,
    order_no: i32,
    supplier_id: i32,
) -> Result<(Item, Order)> {
    let item = repo
        .find_item(item_code)
        .await?
        .ok_or(AppError::ItemNotFound { code: item_code })?;
    ensure_item_owner(&item, supplier_id)?;

    let order = repo
        .find_order(order_no)
        .await?
        .ok_or(AppError::OrderNotFound { order_no })?;
    ensure_order_for_item(&order, item_code)?;

    Ok((item, order))
}

pub async fn manage_order_page(
    supplier: SupplierSession,
    State(state): State<AppState>,
    Path((code, order_no)): Path<(i32, i32)>,
) -> Result<Json<ManageOrderPage>> {
    let repo = state.repo();
    let (item, order) = supplier_order(&repo, code, order_no, supplier.user_id()).await?;
    let fulfillment = repo.find_fulfillment(order_no).await?;

    Ok(Json(ManageOrderPage::new(
        item,
        order,
        fulfillment,
        DispatchForm::default(),
        FormErrors::default(),
    )))
}

/// Record the dispatch of an order with the form its destination calls for
pub async fn manage_order(
    supplier: SupplierSession,
    State(state): State<AppState>,
    Path((code, order_no)): Path<(i32, i32)>,
    HtmlForm(form): HtmlForm<DispatchForm>,
) -> Result<Response> {
    let repo = state.repo();
    let (item, order) = supplier_order(&repo, code, order_no, supplier.user_id()).await?;

    if repo.find_fulfillment(order_no).await?.is_some() {
        return Err(AppError::AlreadyManaged { order_no });
    }

    let Some(destination) = order.destination() else {
        let page = ManageOrderPage::new(item, order, None, form, FormErrors::default());
        return Ok(Json(page).into_response());
    };

    let dispatch = match form.clean(destination) {
        Ok(dispatch) => dispatch,
        Err(errors) => {
            let page = ManageOrderPage::new(item, order, None, form, errors);
            return Ok(Json(page).into_response());
        }
    };

    let record = repo.create_fulfillment(order_no, dispatch).await?;
    metrics::record_fulfillment(destination.as_str());
    info!(
        order = record.order_no,
        item = code,
        destination = destination.as_str(),
        "Order dispatched"
    );

    Ok(redirect::found(redirect::SUPPLIER_HOME))
}
