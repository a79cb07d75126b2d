//! Identity entity: an authenticated account holding exactly one role

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. A closed variant, so an identity is always exactly one of the two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[sea_orm(string_value = "client")]
    Client,
    #[sea_orm(string_value = "supplier")]
    Supplier,
}

impl Role {
    /// Lower-case role name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Supplier => "supplier",
        }
    }

    /// Home view of this role
    pub fn home(&self) -> &'static str {
        match self {
            Role::Client => crate::redirect::CLIENT_HOME,
            Role::Supplier => crate::redirect::SUPPLIER_HOME,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    #[sea_orm(column_type = "Text")]
    pub password_hash: String,

    pub role: Role,

    pub is_active: bool,

    pub date_joined: DateTimeUtc,
}

impl Model {
    pub fn is_client(&self) -> bool {
        self.role == Role::Client
    }

    pub fn is_supplier(&self) -> bool {
        self.role == Role::Supplier
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::client::Entity")]
    Client,

    #[sea_orm(has_one = "super::supplier::Entity")]
    Supplier,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
