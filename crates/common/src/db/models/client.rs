//! Client profile: one-to-one extension of a client identity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Loyalty tier. Stored as the single-character codes used by the signup form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(1))")]
pub enum Tier {
    #[default]
    #[sea_orm(string_value = "1")]
    Normal,
    #[sea_orm(string_value = "2")]
    Plata,
    #[sea_orm(string_value = "3")]
    Oro,
    #[sea_orm(string_value = "4")]
    Platino,
}

impl Tier {
    /// Parse a form choice (`"1"`..`"4"`)
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Tier::Normal),
            "2" => Some(Tier::Plata),
            "3" => Some(Tier::Oro),
            "4" => Some(Tier::Platino),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Normal => "Normal",
            Tier::Plata => "Plata",
            Tier::Oro => "Oro",
            Tier::Platino => "Platino",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    /// Owning identity
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,

    pub code: String,

    /// Stored path or URL of the profile photo
    #[sea_orm(nullable)]
    pub photo: Option<String>,

    pub address: String,

    pub tier: Tier,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
