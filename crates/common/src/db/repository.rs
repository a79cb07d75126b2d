//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{is_unique_violation, AppError, Result};
use crate::fulfillment::{Dispatch, OrderState};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;

/// New client account, password already hashed
#[derive(Debug, Clone)]
pub struct ClientSignup {
    pub username: String,
    pub password_hash: String,
    pub code: String,
    pub photo: Option<String>,
    pub address: String,
    pub tier: Tier,
}

/// New supplier account, password already hashed
#[derive(Debug, Clone)]
pub struct SupplierSignup {
    pub username: String,
    pub password_hash: String,
    pub address: String,
    pub items_supplied: String,
}

/// Editable item attributes
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub description: String,
    pub price: f64,
}

/// Editable order attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFields {
    pub is_urgent: bool,
    pub distribution_center: bool,
    pub branch: bool,
    pub associated_company: bool,
    pub quantity: i32,
}

/// An order together with its fulfillment record, if the supplier created one
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithFulfillment {
    pub order: Order,
    pub state: OrderState,
    pub fulfillment: Option<ManageOrder>,
}

impl OrderWithFulfillment {
    pub fn new(order: Order, fulfillment: Option<ManageOrder>) -> Self {
        let state = OrderState::of(Some(&order), fulfillment.as_ref());
        Self {
            order,
            state,
            fulfillment,
        }
    }
}

/// Rows removed by a cascading delete, besides the target row itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeSummary {
    pub orders: u64,
    pub fulfillments: u64,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Account Operations
    // ========================================================================

    /// Find user by username
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Create a client identity and its profile in one transaction
    pub async fn create_client_account(&self, signup: ClientSignup) -> Result<(User, Client)> {
        let txn = self.write_conn().begin().await?;

        let user = new_user(signup.username, signup.password_hash, Role::Client)
            .insert(&txn)
            .await
            .map_err(|e| AppError::conflict_or_db(e, "username already taken"))?;

        let client = ClientActiveModel {
            user_id: Set(user.id),
            code: Set(signup.code),
            photo: Set(signup.photo),
            address: Set(signup.address),
            tier: Set(signup.tier),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok((user, client))
    }

    /// Create a supplier identity and its profile in one transaction
    pub async fn create_supplier_account(&self, signup: SupplierSignup) -> Result<(User, Supplier)> {
        let txn = self.write_conn().begin().await?;

        let user = new_user(signup.username, signup.password_hash, Role::Supplier)
            .insert(&txn)
            .await
            .map_err(|e| AppError::conflict_or_db(e, "username already taken"))?;

        let supplier = SupplierActiveModel {
            user_id: Set(user.id),
            address: Set(signup.address),
            items_supplied: Set(signup.items_supplied),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok((user, supplier))
    }

    /// Find the client profile of an identity
    pub async fn find_client(&self, user_id: i32) -> Result<Option<Client>> {
        ClientEntity::find_by_id(user_id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find the supplier profile of an identity
    pub async fn find_supplier(&self, user_id: i32) -> Result<Option<Supplier>> {
        SupplierEntity::find_by_id(user_id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Count identities (all roles)
    pub async fn count_users(&self) -> Result<u64> {
        UserEntity::find()
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Catalog Operations
    // ========================================================================

    /// Every item, unfiltered
    pub async fn list_items(&self) -> Result<Vec<Item>> {
        ItemEntity::find()
            .order_by_asc(ItemColumn::Code)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Items owned by one supplier
    pub async fn list_items_by_supplier(&self, supplier_id: i32) -> Result<Vec<Item>> {
        ItemEntity::find()
            .filter(ItemColumn::SupplierId.eq(supplier_id))
            .order_by_asc(ItemColumn::Code)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find item by code
    pub async fn find_item(&self, code: i32) -> Result<Option<Item>> {
        ItemEntity::find_by_id(code)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Create an item owned by `supplier_id`
    pub async fn create_item(&self, supplier_id: i32, code: i32, fields: ItemFields) -> Result<Item> {
        ItemActiveModel {
            code: Set(code),
            description: Set(fields.description),
            price: Set(fields.price),
            supplier_id: Set(supplier_id),
        }
        .insert(self.write_conn())
        .await
        .map_err(|e| AppError::conflict_or_db(e, format!("item {} already exists", code)))
    }

    /// Overwrite the editable attributes of an item
    pub async fn update_item(&self, item: Item, fields: ItemFields) -> Result<Item> {
        let mut item: ItemActiveModel = item.into();
        item.description = Set(fields.description);
        item.price = Set(fields.price);

        item.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Delete an item with its orders and their fulfillments
    pub async fn delete_item(&self, code: i32) -> Result<CascadeSummary> {
        let txn = self.write_conn().begin().await?;

        let order_nos: Vec<i32> = OrderEntity::find()
            .filter(OrderColumn::ItemCode.eq(code))
            .all(&txn)
            .await?
            .into_iter()
            .map(|order| order.order_no)
            .collect();

        let fulfillments = if order_nos.is_empty() {
            0
        } else {
            ManageOrderEntity::delete_many()
                .filter(ManageOrderColumn::OrderNo.is_in(order_nos))
                .exec(&txn)
                .await?
                .rows_affected
        };

        let orders = OrderEntity::delete_many()
            .filter(OrderColumn::ItemCode.eq(code))
            .exec(&txn)
            .await?
            .rows_affected;

        let deleted = ItemEntity::delete_by_id(code).exec(&txn).await?;
        if deleted.rows_affected == 0 {
            return Err(AppError::ItemNotFound { code });
        }

        txn.commit().await?;
        Ok(CascadeSummary {
            orders,
            fulfillments,
        })
    }

    // ========================================================================
    // Order Operations
    // ========================================================================

    /// Find order by number
    pub async fn find_order(&self, order_no: i32) -> Result<Option<Order>> {
        OrderEntity::find_by_id(order_no)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find the order a client placed on an item
    pub async fn find_order_for(&self, client_id: i32, item_code: i32) -> Result<Option<Order>> {
        OrderEntity::find()
            .filter(OrderColumn::ClientId.eq(client_id))
            .filter(OrderColumn::ItemCode.eq(item_code))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Number of orders a client placed on an item (0 or 1)
    pub async fn count_orders_for(&self, client_id: i32, item_code: i32) -> Result<u64> {
        OrderEntity::find()
            .filter(OrderColumn::ClientId.eq(client_id))
            .filter(OrderColumn::ItemCode.eq(item_code))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Place an order; `created_at` is assigned here
    pub async fn create_order(
        &self,
        client_id: i32,
        item_code: i32,
        fields: OrderFields,
    ) -> Result<Order> {
        OrderActiveModel {
            order_no: NotSet,
            client_id: Set(client_id),
            item_code: Set(item_code),
            created_at: Set(chrono::Utc::now()),
            is_urgent: Set(fields.is_urgent),
            distribution_center: Set(fields.distribution_center),
            branch: Set(fields.branch),
            associated_company: Set(fields.associated_company),
            quantity: Set(fields.quantity),
        }
        .insert(self.write_conn())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateOrder { item_code }
            } else {
                AppError::Database(e)
            }
        })
    }

    /// Rebind the editable attributes of an order; owner and item stay fixed
    pub async fn update_order(&self, order: Order, fields: OrderFields) -> Result<Order> {
        let mut order: OrderActiveModel = order.into();
        order.is_urgent = Set(fields.is_urgent);
        order.distribution_center = Set(fields.distribution_center);
        order.branch = Set(fields.branch);
        order.associated_company = Set(fields.associated_company);
        order.quantity = Set(fields.quantity);

        order.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Delete an order and its fulfillment
    pub async fn delete_order(&self, order_no: i32) -> Result<CascadeSummary> {
        let txn = self.write_conn().begin().await?;

        let fulfillments = ManageOrderEntity::delete_by_id(order_no)
            .exec(&txn)
            .await?
            .rows_affected;

        let deleted = OrderEntity::delete_by_id(order_no).exec(&txn).await?;
        if deleted.rows_affected == 0 {
            return Err(AppError::OrderNotFound { order_no });
        }

        txn.commit().await?;
        Ok(CascadeSummary {
            orders: 0,
            fulfillments,
        })
    }

    /// Every order placed against an item, oldest first, with fulfillment state
    pub async fn orders_for_item(&self, item_code: i32) -> Result<Vec<OrderWithFulfillment>> {
        let rows = OrderEntity::find()
            .filter(OrderColumn::ItemCode.eq(item_code))
            .order_by_asc(OrderColumn::OrderNo)
            .find_also_related(ManageOrderEntity)
            .all(self.read_conn())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(order, fulfillment)| OrderWithFulfillment::new(order, fulfillment))
            .collect())
    }

    // ========================================================================
    // Fulfillment Operations
    // ========================================================================

    /// Find the fulfillment record of an order
    pub async fn find_fulfillment(&self, order_no: i32) -> Result<Option<ManageOrder>> {
        ManageOrderEntity::find_by_id(order_no)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Record how an order is dispatched. At most one record per order.
    pub async fn create_fulfillment(&self, order_no: i32, dispatch: Dispatch) -> Result<ManageOrder> {
        let columns = dispatch.into_columns();

        ManageOrderActiveModel {
            order_no: Set(order_no),
            dispatched_at: Set(chrono::Utc::now()),
            warehouse: Set(columns.warehouse),
            reference: Set(columns.reference),
            branch_code: Set(columns.branch_code),
            details: Set(columns.details),
        }
        .insert(self.write_conn())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyManaged { order_no }
            } else {
                AppError::Database(e)
            }
        })
    }
}

fn new_user(username: String, password_hash: String, role: Role) -> UserActiveModel {
    UserActiveModel {
        id: NotSet,
        username: Set(username),
        password_hash: Set(password_hash),
        role: Set(role),
        is_active: Set(true),
        date_joined: Set(chrono::Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::schema::create_schema;

    async fn repository() -> Repository {
        let pool = DbPool::new(&AppConfig::for_tests().database).await.unwrap();
        create_schema(pool.write()).await.unwrap();
        Repository::new(pool)
    }

    fn client_signup(username: &str) -> ClientSignup {
        ClientSignup {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            code: "C-1".to_string(),
            photo: None,
            address: "calle1".to_string(),
            tier: Tier::Oro,
        }
    }

    fn supplier_signup(username: &str) -> SupplierSignup {
        SupplierSignup {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            address: "calle2".to_string(),
            items_supplied: "items_x".to_string(),
        }
    }

    fn fields(quantity: i32) -> OrderFields {
        OrderFields {
            is_urgent: false,
            distribution_center: false,
            branch: true,
            associated_company: false,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_signup_creates_identity_and_profile() {
        let repo = repository().await;

        let (user, client) = repo.create_client_account(client_signup("ana")).await.unwrap();
        assert!(user.is_client());
        assert!(!user.is_supplier());
        assert_eq!(client.user_id, user.id);
        assert_eq!(client.tier, Tier::Oro);

        let (user, supplier) = repo.create_supplier_account(supplier_signup("bob")).await.unwrap();
        assert!(user.is_supplier());
        assert_eq!(repo.find_supplier(user.id).await.unwrap(), Some(supplier));
        assert_eq!(repo.count_users().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_username_writes_nothing() {
        let repo = repository().await;
        repo.create_supplier_account(supplier_signup("bob")).await.unwrap();

        let err = repo.create_client_account(client_signup("bob")).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { .. }));
        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_one_order_per_client_and_item() {
        let repo = repository().await;
        let (client, _) = repo.create_client_account(client_signup("ana")).await.unwrap();
        let (supplier, _) = repo.create_supplier_account(supplier_signup("bob")).await.unwrap();
        let item = repo
            .create_item(supplier.id, 7, ItemFields { description: "tornillo".into(), price: 1.5 })
            .await
            .unwrap();

        repo.create_order(client.id, item.code, fields(3)).await.unwrap();
        let err = repo.create_order(client.id, item.code, fields(4)).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateOrder { item_code: 7 }));
        assert_eq!(repo.count_orders_for(client.id, item.code).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fulfillment_is_unique_per_order() {
        let repo = repository().await;
        let (client, _) = repo.create_client_account(client_signup("ana")).await.unwrap();
        let (supplier, _) = repo.create_supplier_account(supplier_signup("bob")).await.unwrap();
        repo.create_item(supplier.id, 7, ItemFields { description: "d".into(), price: 0.0 })
            .await
            .unwrap();
        let order = repo.create_order(client.id, 7, fields(1)).await.unwrap();

        let dispatch = Dispatch::Branch { reference: "R-1".into(), branch_code: 12 };
        let record = repo.create_fulfillment(order.order_no, dispatch.clone()).await.unwrap();
        assert_eq!(record.branch_code, Some(12));

        let err = repo.create_fulfillment(order.order_no, dispatch).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyManaged { .. }));

        let listed = repo.orders_for_item(7).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].state, OrderState::Managed);
    }

    #[tokio::test]
    async fn test_delete_item_cascades() {
        let repo = repository().await;
        let (ana, _) = repo.create_client_account(client_signup("ana")).await.unwrap();
        let (eva, _) = repo.create_client_account(client_signup("eva")).await.unwrap();
        let (supplier, _) = repo.create_supplier_account(supplier_signup("bob")).await.unwrap();
        repo.create_item(supplier.id, 7, ItemFields { description: "d".into(), price: 2.0 })
            .await
            .unwrap();
        repo.create_item(supplier.id, 8, ItemFields { description: "kept".into(), price: 2.0 })
            .await
            .unwrap();

        let managed = repo.create_order(ana.id, 7, fields(1)).await.unwrap();
        repo.create_order(eva.id, 7, fields(2)).await.unwrap();
        let kept = repo.create_order(ana.id, 8, fields(1)).await.unwrap();
        repo.create_fulfillment(managed.order_no, Dispatch::DistributionCenter { warehouse: "W".into() })
            .await
            .unwrap();

        let summary = repo.delete_item(7).await.unwrap();
        assert_eq!(summary, CascadeSummary { orders: 2, fulfillments: 1 });

        assert!(repo.find_item(7).await.unwrap().is_none());
        assert!(repo.find_order(managed.order_no).await.unwrap().is_none());
        assert!(repo.find_fulfillment(managed.order_no).await.unwrap().is_none());
        assert!(repo.find_order(kept.order_no).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_order_removes_fulfillment() {
        let repo = repository().await;
        let (client, _) = repo.create_client_account(client_signup("ana")).await.unwrap();
        let (supplier, _) = repo.create_supplier_account(supplier_signup("bob")).await.unwrap();
        repo.create_item(supplier.id, 7, ItemFields { description: "d".into(), price: 2.0 })
            .await
            .unwrap();
        let order = repo.create_order(client.id, 7, fields(1)).await.unwrap();
        repo.create_fulfillment(order.order_no, Dispatch::DistributionCenter { warehouse: "W".into() })
            .await
            .unwrap();

        let summary = repo.delete_order(order.order_no).await.unwrap();
        assert_eq!(summary.fulfillments, 1);
        assert!(repo.find_fulfillment(order.order_no).await.unwrap().is_none());

        let err = repo.delete_order(order.order_no).await.unwrap_err();
        assert!(matches!(err, AppError::OrderNotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_order_keeps_owner_and_timestamp() {
        let repo = repository().await;
        let (client, _) = repo.create_client_account(client_signup("ana")).await.unwrap();
        let (supplier, _) = repo.create_supplier_account(supplier_signup("bob")).await.unwrap();
        repo.create_item(supplier.id, 7, ItemFields { description: "d".into(), price: 2.0 })
            .await
            .unwrap();
        let order = repo.create_order(client.id, 7, fields(1)).await.unwrap();

        let updated = repo
            .update_order(
                order.clone(),
                OrderFields { is_urgent: true, quantity: 9, ..fields(1) },
            )
            .await
            .unwrap();
        assert_eq!(updated.quantity, 9);
        assert!(updated.is_urgent);
        assert_eq!(updated.client_id, order.client_id);
        assert_eq!(updated.created_at.timestamp(), order.created_at.timestamp());
    }
}
