//! Order entity: a client's request for a quantity of one item

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::fulfillment::Destination;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub order_no: i32,

    pub client_id: i32,

    pub item_code: i32,

    pub created_at: DateTimeUtc,

    pub is_urgent: bool,

    pub distribution_center: bool,

    pub branch: bool,

    pub associated_company: bool,

    pub quantity: i32,
}

impl Model {
    /// Routing destination implied by the destination flags
    pub fn destination(&self) -> Option<Destination> {
        Destination::from_flags(self.distribution_center, self.branch, self.associated_company)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::UserId",
        on_delete = "Cascade"
    )]
    Client,

    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemCode",
        to = "super::item::Column::Code",
        on_delete = "Cascade"
    )]
    Item,

    #[sea_orm(has_one = "super::manage_order::Entity")]
    ManageOrder,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl Related<super::manage_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ManageOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
