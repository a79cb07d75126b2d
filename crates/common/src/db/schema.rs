//! Table bootstrap from the entity definitions
//!
//! Tables are created in dependency order and only when missing, so running
//! this on every start is safe.

use crate::db::models::*;
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Schema};
use tracing::info;

/// Name of the unique index enforcing one order per (client, item)
pub const ORDER_CLIENT_ITEM_INDEX: &str = "idx_orders_client_item";

/// Create every table and index the service needs
pub async fn create_schema(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, UserEntity).await?;
    create_table(db, &schema, ClientEntity).await?;
    create_table(db, &schema, SupplierEntity).await?;
    create_table(db, &schema, ItemEntity).await?;
    create_table(db, &schema, OrderEntity).await?;
    create_table(db, &schema, ManageOrderEntity).await?;

    let index = Index::create()
        .name(ORDER_CLIENT_ITEM_INDEX)
        .table(OrderEntity)
        .col(OrderColumn::ClientId)
        .col(OrderColumn::ItemCode)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(db.get_database_backend().build(&index)).await?;

    info!("Database schema ready");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(db.get_database_backend().build(&stmt)).await?;
    Ok(())
}
