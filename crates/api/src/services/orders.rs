//! Order placement and management.
//!
//! Placing an order is a straight sequence: read the cart, check stock for
//! every line, compute totals, write the order and its lines, take the stock,
//! clear the cart. Steps are not wrapped in a transaction; a failure stops
//! the sequence and earlier writes stay.
//!
//! The service is generic over [`CartStore`], [`InventoryStore`] and
//! [`OrderStore`] so the sequence can run against [`PgOrderStore`] in
//! production and an in-memory store in tests.

use std::future::Future;
use std::str::FromStr;

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;

use bazaar_core::{
    AddressId, CartId, OrderId, OrderStatus, OrderTotals, PaymentMethod, ProductId, UserId,
    line_subtotal,
};

use crate::db::{CartRepository, OrderRepository, RepositoryError};
use crate::models::order::{NewOrder, NewOrderItem};
use crate::models::{CartItem, CreateOrderRequest, Order, PageQuery};
use crate::services::inventory::{InventoryError, InventoryService};

/// Default page size for order listings.
pub const DEFAULT_ORDER_LIMIT: i64 = 20;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order not found")]
    NotFound,

    #[error("cart is empty")]
    EmptyCart,

    #[error("insufficient stock for product {0}")]
    InsufficientStock(ProductId),

    #[error("order cannot be cancelled")]
    NotCancellable,

    #[error("invalid payment method")]
    InvalidPaymentMethod(String),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

// =============================================================================
// Stores
// =============================================================================

/// Cart access needed to place an order.
pub trait CartStore {
    /// The user's cart id and lines, creating the cart if needed.
    fn cart_items(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<(CartId, Vec<CartItem>), RepositoryError>> + Send;

    fn clear_cart(&self, cart_id: CartId) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Stock access needed to place an order.
pub trait InventoryStore {
    /// Whether `quantity` units are available; `false` without a stock row.
    fn check_stock(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> impl Future<Output = Result<bool, InventoryError>> + Send;

    /// Guarded decrement; `false` when stock was too low.
    fn reduce_stock(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> impl Future<Output = Result<bool, InventoryError>> + Send;
}

/// Order persistence.
pub trait OrderStore {
    fn insert_order(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<OrderId, RepositoryError>> + Send;

    fn insert_item(
        &self,
        order_id: OrderId,
        item: &NewOrderItem,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn find_order(
        &self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    fn list_orders(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;

    fn set_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// `PostgreSQL` implementation of the order stores.
#[derive(Clone, Copy)]
pub struct PgOrderStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PgOrderStore<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl CartStore for PgOrderStore<'_> {
    async fn cart_items(&self, user_id: UserId) -> Result<(CartId, Vec<CartItem>), RepositoryError> {
        let carts = CartRepository::new(self.pool);
        let cart_id = carts.get_or_create_id(user_id).await?;
        let items = carts.items(cart_id).await?;
        Ok((cart_id, items))
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        CartRepository::new(self.pool).clear(cart_id).await?;
        Ok(())
    }
}

impl InventoryStore for PgOrderStore<'_> {
    async fn check_stock(&self, product_id: ProductId, quantity: i32) -> Result<bool, InventoryError> {
        InventoryService::new(self.pool)
            .check_stock(product_id, quantity)
            .await
    }

    async fn reduce_stock(&self, product_id: ProductId, quantity: i32) -> Result<bool, InventoryError> {
        InventoryService::new(self.pool)
            .reduce_stock(product_id, quantity)
            .await
    }
}

impl OrderStore for PgOrderStore<'_> {
    async fn insert_order(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        OrderRepository::new(self.pool).create(order).await
    }

    async fn insert_item(&self, order_id: OrderId, item: &NewOrderItem) -> Result<(), RepositoryError> {
        OrderRepository::new(self.pool).add_item(order_id, item).await?;
        Ok(())
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(self.pool).get(order_id).await
    }

    async fn list_orders(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        OrderRepository::new(self.pool)
            .list_for_user(user_id, limit, offset)
            .await
    }

    async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<(), RepositoryError> {
        OrderRepository::new(self.pool).set_status(order_id, status).await
    }
}

// =============================================================================
// Service
// =============================================================================

/// Order service.
pub struct OrderService<S> {
    store: S,
}

impl<'a> OrderService<PgOrderStore<'a>> {
    /// Order service backed by `PostgreSQL`.
    #[must_use]
    pub const fn for_pool(pool: &'a PgPool) -> Self {
        Self::new(PgOrderStore::new(pool))
    }
}

impl<S> OrderService<S>
where
    S: CartStore + InventoryStore + OrderStore + Sync,
{
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Turn the caller's cart into an order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidPaymentMethod` before anything is read,
    /// `OrderError::EmptyCart` or `OrderError::InsufficientStock` before
    /// anything is written. A stock decrement that loses a race also reports
    /// `OrderError::InsufficientStock`, after the order rows exist.
    #[tracing::instrument(skip(self, req), fields(user_id = %user_id))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        req: &CreateOrderRequest,
    ) -> Result<Order, OrderError> {
        PaymentMethod::from_str(&req.payment_method)
            .map_err(|_| OrderError::InvalidPaymentMethod(req.payment_method.clone()))?;

        let (cart_id, items) = self.store.cart_items(user_id).await?;
        if items.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        for item in &items {
            if !self.store.check_stock(item.product_id, item.quantity).await? {
                return Err(OrderError::InsufficientStock(item.product_id));
            }
        }

        let totals = OrderTotals::compute(items.iter().map(|item| (item.price, item.quantity)));
        let new_order = NewOrder {
            user_id,
            order_number: order_number(Utc::now().timestamp()),
            totals,
            shipping_address: address_label(req.shipping_address_id),
            billing_address: address_label(req.billing_address_id),
        };
        let order_id = self.store.insert_order(&new_order).await?;

        for item in &items {
            let line = NewOrderItem {
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
                subtotal: line_subtotal(item.price, item.quantity),
            };
            self.store.insert_item(order_id, &line).await?;
        }

        for item in &items {
            if !self.store.reduce_stock(item.product_id, item.quantity).await? {
                tracing::warn!(
                    order_id = %order_id,
                    product_id = %item.product_id,
                    "Stock changed after check; order left partially applied"
                );
                return Err(OrderError::InsufficientStock(item.product_id));
            }
        }

        self.store.clear_cart(cart_id).await?;

        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total,
            "Order placed"
        );
        Ok(order)
    }

    /// The caller's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn list_orders(&self, user_id: UserId, page: PageQuery) -> Result<Vec<Order>, OrderError> {
        let (limit, offset) = page.resolve(DEFAULT_ORDER_LIMIT);
        Ok(self.store.list_orders(user_id, limit, offset).await?)
    }

    /// One of the caller's orders.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order is missing or belongs to
    /// someone else.
    pub async fn get_order(&self, user_id: UserId, order_id: OrderId) -> Result<Order, OrderError> {
        self.store
            .find_order(order_id)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or(OrderError::NotFound)
    }

    /// Cancel one of the caller's orders. Stock is not returned.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` as for [`Self::get_order`] and
    /// `OrderError::NotCancellable` once the order has shipped or was
    /// already cancelled.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, user_id: UserId, order_id: OrderId) -> Result<(), OrderError> {
        let order = self.get_order(user_id, order_id).await?;
        if !order.status.is_cancellable() {
            return Err(OrderError::NotCancellable);
        }

        self.store
            .set_status(order_id, OrderStatus::Cancelled)
            .await?;
        tracing::info!(order_id = %order_id, "Order cancelled");
        Ok(())
    }
}

fn order_number(unix_seconds: i64) -> String {
    format!("ORD-{unix_seconds}")
}

fn address_label(id: AddressId) -> String {
    format!("Address ID: {id}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use bazaar_core::{CartItemId, OrderItemId, OrderPaymentStatus, StockLevel};
    use chrono::DateTime;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::OrderItem;

    #[derive(Default)]
    struct State {
        cart: Vec<CartItem>,
        stock: HashMap<ProductId, StockLevel>,
        orders: Vec<Order>,
        next_id: i64,
    }

    /// In-memory stand-in for all three stores.
    #[derive(Default)]
    struct MemoryStore {
        state: Mutex<State>,
    }

    const USER: UserId = UserId::new(1);
    const CART: CartId = CartId::new(10);

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(0, 0).unwrap()
    }

    impl MemoryStore {
        fn with_cart(lines: &[(i64, i64, i32)], stock: &[(i64, i32)]) -> Self {
            let store = Self::default();
            {
                let mut state = store.state.lock().unwrap();
                for (i, &(product, cents, quantity)) in lines.iter().enumerate() {
                    let price = Decimal::new(cents, 2);
                    state.cart.push(CartItem {
                        id: CartItemId::new(i64::try_from(i).unwrap() + 1),
                        cart_id: CART,
                        product_id: ProductId::new(product),
                        quantity,
                        price,
                        subtotal: line_subtotal(price, quantity),
                        created_at: epoch(),
                        updated_at: epoch(),
                    });
                }
                for &(product, quantity) in stock {
                    state
                        .stock
                        .insert(ProductId::new(product), StockLevel::new(quantity, 0));
                }
            }
            store
        }

        fn order_count(&self) -> usize {
            self.state.lock().unwrap().orders.len()
        }

        fn insert_placed(&self, status: OrderStatus, owner: UserId) -> OrderId {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = OrderId::new(state.next_id);
            state.orders.push(Order {
                id,
                user_id: owner,
                order_number: order_number(1),
                status,
                payment_status: OrderPaymentStatus::Pending,
                subtotal: Decimal::ZERO,
                tax: Decimal::ZERO,
                shipping_cost: Decimal::ZERO,
                total: Decimal::ZERO,
                shipping_address: address_label(AddressId::new(1)),
                billing_address: address_label(AddressId::new(1)),
                items: Vec::new(),
                created_at: epoch(),
                updated_at: epoch(),
            });
            id
        }
    }

    impl CartStore for MemoryStore {
        async fn cart_items(&self, _user_id: UserId) -> Result<(CartId, Vec<CartItem>), RepositoryError> {
            Ok((CART, self.state.lock().unwrap().cart.clone()))
        }

        async fn clear_cart(&self, _cart_id: CartId) -> Result<(), RepositoryError> {
            self.state.lock().unwrap().cart.clear();
            Ok(())
        }
    }

    impl InventoryStore for MemoryStore {
        async fn check_stock(&self, product_id: ProductId, quantity: i32) -> Result<bool, InventoryError> {
            let state = self.state.lock().unwrap();
            Ok(state
                .stock
                .get(&product_id)
                .is_some_and(|stock| stock.can_fulfil(quantity)))
        }

        async fn reduce_stock(&self, product_id: ProductId, quantity: i32) -> Result<bool, InventoryError> {
            let mut state = self.state.lock().unwrap();
            match state.stock.get_mut(&product_id) {
                Some(stock) if stock.quantity >= quantity => {
                    stock.quantity -= quantity;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }

    impl OrderStore for MemoryStore {
        async fn insert_order(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = OrderId::new(state.next_id);
            state.orders.push(Order {
                id,
                user_id: order.user_id,
                order_number: order.order_number.clone(),
                status: OrderStatus::Pending,
                payment_status: OrderPaymentStatus::Pending,
                subtotal: order.totals.subtotal,
                tax: order.totals.tax,
                shipping_cost: order.totals.shipping_cost,
                total: order.totals.total,
                shipping_address: order.shipping_address.clone(),
                billing_address: order.billing_address.clone(),
                items: Vec::new(),
                created_at: epoch(),
                updated_at: epoch(),
            });
            Ok(id)
        }

        async fn insert_item(&self, order_id: OrderId, item: &NewOrderItem) -> Result<(), RepositoryError> {
            let mut state = self.state.lock().unwrap();
            let order = state
                .orders
                .iter_mut()
                .find(|o| o.id == order_id)
                .ok_or(RepositoryError::NotFound)?;
            let next = i64::try_from(order.items.len()).unwrap() + 1;
            order.items.push(OrderItem {
                id: OrderItemId::new(next),
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
                subtotal: item.subtotal,
                created_at: epoch(),
            });
            Ok(())
        }

        async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
            let state = self.state.lock().unwrap();
            Ok(state.orders.iter().find(|o| o.id == order_id).cloned())
        }

        async fn list_orders(
            &self,
            user_id: UserId,
            _limit: i64,
            _offset: i64,
        ) -> Result<Vec<Order>, RepositoryError> {
            let state = self.state.lock().unwrap();
            Ok(state
                .orders
                .iter()
                .rev()
                .filter(|o| o.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<(), RepositoryError> {
            let mut state = self.state.lock().unwrap();
            let order = state
                .orders
                .iter_mut()
                .find(|o| o.id == order_id)
                .ok_or(RepositoryError::NotFound)?;
            order.status = status;
            Ok(())
        }
    }

    fn request(method: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            shipping_address_id: AddressId::new(3),
            billing_address_id: AddressId::new(4),
            payment_method: method.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_order_computes_totals() {
        let service = OrderService::new(MemoryStore::with_cart(&[(1, 1000, 2)], &[(1, 5)]));

        let order = service.create_order(USER, &request("stripe")).await.unwrap();

        assert_eq!(order.subtotal, Decimal::new(2000, 2));
        assert_eq!(order.tax, Decimal::new(200, 2));
        assert_eq!(order.shipping_cost, Decimal::new(1000, 2));
        assert_eq!(order.total, Decimal::new(3200, 2));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, OrderPaymentStatus::Pending);
        assert!(order.order_number.starts_with("ORD-"));
        assert_eq!(order.shipping_address, "Address ID: 3");
        assert_eq!(order.billing_address, "Address ID: 4");
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].subtotal, Decimal::new(2000, 2));
    }

    #[tokio::test]
    async fn test_create_order_takes_stock_and_clears_cart() {
        let store = MemoryStore::with_cart(&[(1, 1999, 2), (2, 550, 1)], &[(1, 5), (2, 1)]);
        let service = OrderService::new(store);

        service.create_order(USER, &request("bkash")).await.unwrap();

        let state = service.store.state.lock().unwrap();
        assert!(state.cart.is_empty());
        assert_eq!(state.stock[&ProductId::new(1)].quantity, 3);
        assert_eq!(state.stock[&ProductId::new(2)].quantity, 0);
    }

    #[tokio::test]
    async fn test_empty_cart_writes_nothing() {
        let service = OrderService::new(MemoryStore::default());

        let err = service.create_order(USER, &request("stripe")).await.unwrap_err();

        assert!(matches!(err, OrderError::EmptyCart));
        assert_eq!(err.to_string(), "cart is empty");
        assert_eq!(service.store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let store = MemoryStore::with_cart(&[(1, 1000, 1), (2, 1000, 4)], &[(1, 10), (2, 3)]);
        let service = OrderService::new(store);

        let err = service.create_order(USER, &request("stripe")).await.unwrap_err();

        assert_eq!(err.to_string(), "insufficient stock for product 2");
        assert_eq!(service.store.order_count(), 0);
        let state = service.store.state.lock().unwrap();
        assert_eq!(state.cart.len(), 2);
        assert_eq!(state.stock[&ProductId::new(1)].quantity, 10);
    }

    #[tokio::test]
    async fn test_missing_inventory_row_is_insufficient() {
        let service = OrderService::new(MemoryStore::with_cart(&[(9, 1000, 1)], &[]));

        let err = service.create_order(USER, &request("stripe")).await.unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock(p) if p == ProductId::new(9)));
    }

    #[tokio::test]
    async fn test_invalid_payment_method_rejected_first() {
        let service = OrderService::new(MemoryStore::with_cart(&[(1, 1000, 1)], &[(1, 5)]));

        let err = service.create_order(USER, &request("paypal")).await.unwrap_err();

        assert!(matches!(err, OrderError::InvalidPaymentMethod(_)));
        assert_eq!(service.store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_other_users_order_is_not_found() {
        let store = MemoryStore::default();
        let id = store.insert_placed(OrderStatus::Pending, UserId::new(2));
        let service = OrderService::new(store);

        let err = service.get_order(USER, id).await.unwrap_err();
        assert_eq!(err.to_string(), "order not found");

        let err = service.cancel_order(USER, id).await.unwrap_err();
        assert!(matches!(err, OrderError::NotFound));
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let store = MemoryStore::default();
        let pending = store.insert_placed(OrderStatus::Pending, USER);
        let confirmed = store.insert_placed(OrderStatus::Confirmed, USER);
        let shipped = store.insert_placed(OrderStatus::Shipped, USER);
        let delivered = store.insert_placed(OrderStatus::Delivered, USER);
        let cancelled = store.insert_placed(OrderStatus::Cancelled, USER);
        let service = OrderService::new(store);

        service.cancel_order(USER, pending).await.unwrap();
        service.cancel_order(USER, confirmed).await.unwrap();
        assert_eq!(
            service.get_order(USER, pending).await.unwrap().status,
            OrderStatus::Cancelled
        );

        for id in [shipped, delivered, cancelled] {
            let err = service.cancel_order(USER, id).await.unwrap_err();
            assert_eq!(err.to_string(), "order cannot be cancelled");
        }
    }

    #[tokio::test]
    async fn test_list_orders_only_returns_own() {
        let store = MemoryStore::default();
        store.insert_placed(OrderStatus::Pending, USER);
        store.insert_placed(OrderStatus::Pending, UserId::new(2));
        store.insert_placed(OrderStatus::Delivered, USER);
        let service = OrderService::new(store);

        let orders = service.list_orders(USER, PageQuery::default()).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.user_id == USER));
    }

    #[test]
    fn test_labels() {
        assert_eq!(order_number(1_700_000_000), "ORD-1700000000");
        assert_eq!(address_label(AddressId::new(12)), "Address ID: 12");
    }
}
