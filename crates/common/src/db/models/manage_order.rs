//! Fulfillment record created by the supplier for one order

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Keyed by the order it fulfils, so an order can be managed at most once.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "manage_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub order_no: i32,

    pub dispatched_at: DateTimeUtc,

    pub warehouse: String,

    pub reference: String,

    #[sea_orm(nullable)]
    pub branch_code: Option<i32>,

    pub details: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderNo",
        to = "super::order::Column::OrderNo",
        on_delete = "Cascade"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
