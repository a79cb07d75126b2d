//! Ownership checks run before every mutation

use crate::db::models::{Item, Order};
use crate::errors::{AppError, Result};

/// The acting supplier must own the item
pub fn ensure_item_owner(item: &Item, supplier_id: i32) -> Result<()> {
    if item.supplier_id == supplier_id {
        Ok(())
    } else {
        tracing::warn!(item = item.code, supplier_id, "Item ownership check failed");
        crate::metrics::record_auth_denial("item_owner");
        Err(AppError::Forbidden {
            message: format!("item {} belongs to another supplier", item.code),
        })
    }
}

/// The acting client must own the order
pub fn ensure_order_owner(order: &Order, client_id: i32) -> Result<()> {
    if order.client_id == client_id {
        Ok(())
    } else {
        tracing::warn!(order = order.order_no, client_id, "Order ownership check failed");
        crate::metrics::record_auth_denial("order_owner");
        Err(AppError::Forbidden {
            message: format!("order {} belongs to another client", order.order_no),
        })
    }
}

/// The order addressed through an item path must actually be placed on that item
pub fn ensure_order_for_item(order: &Order, item_code: i32) -> Result<()> {
    if order.item_code == item_code {
        Ok(())
    } else {
        Err(AppError::OrderNotFound {
            order_no: order.order_no,
        })
    }
}
