//! SeaORM entity models
//!
//! Database entities for Pedidos

mod client;
mod item;
mod manage_order;
mod order;
mod supplier;
mod user;

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
    Role,
};

pub use client::{
    Entity as ClientEntity,
    Model as Client,
    ActiveModel as ClientActiveModel,
    Column as ClientColumn,
    Tier,
};

pub use supplier::{
    Entity as SupplierEntity,
    Model as Supplier,
    ActiveModel as SupplierActiveModel,
    Column as SupplierColumn,
};

pub use item::{
    Entity as ItemEntity,
    Model as Item,
    ActiveModel as ItemActiveModel,
    Column as ItemColumn,
};

pub use order::{
    Entity as OrderEntity,
    Model as Order,
    ActiveModel as OrderActiveModel,
    Column as OrderColumn,
};

pub use manage_order::{
    Entity as ManageOrderEntity,
    Model as ManageOrder,
    ActiveModel as ManageOrderActiveModel,
    Column as ManageOrderColumn,
};
