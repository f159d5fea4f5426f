//! Order intake and the order status machine.
//!
//! ```text
//! PlaceOrder
//!   ↓ validate request fields
//! begin
//!   ↓ per line, in request order:
//!   ↓   lock product → check quantity & stock → decrement → save → price
//!   ↓ build order (pending, frozen total + snapshot)
//!   ↓ insert order
//!   ↓ append "New Order Placed"
//! commit   (any failure above: rollback, nothing persisted)
//! ```

use std::sync::Arc;

use tracing::instrument;

use maison_audit::SYSTEM_ADMIN_ACTOR;
use maison_core::{Clock, DomainError, DomainResult, IdGenerator, OrderId};
use maison_sales::{
    Cart, CustomerDetails, Order, OrderLineRequest, OrderStatus, OrderView, PlaceOrder,
};

use super::finish;
use crate::store::{Store, StoreTx};

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { store, ids, clock }
    }

    /// Validate, price and persist a new order, reserving stock for every line.
    ///
    /// All-or-nothing: on any error no stock, order or audit row is written.
    #[instrument(
        skip(self, cmd),
        fields(customer = %cmd.customer, line_count = cmd.lines.len()),
        err
    )]
    pub async fn place_order(&self, cmd: PlaceOrder) -> DomainResult<OrderView> {
        let (details, lines) = cmd.validate()?;

        let mut tx = self.store.begin().await?;
        let result = self.place_in_tx(tx.as_mut(), details, lines).await;
        let view = finish(tx, result).await?;

        tracing::info!(order_id = %view.id, total = view.total, "order placed");
        Ok(view)
    }

    async fn place_in_tx(
        &self,
        tx: &mut dyn StoreTx,
        details: CustomerDetails,
        lines: Vec<OrderLineRequest>,
    ) -> DomainResult<OrderView> {
        let now = self.clock.now();
        let mut cart = Cart::new();

        for line in lines {
            let mut product = tx
                .find_product(&line.product_id)
                .await?
                .ok_or_else(|| {
                    DomainError::not_found(format!("product {} not found", line.product_id))
                })?;

            product.reserve(line.quantity)?;
            product.updated_at = now;
            tx.save_product(&product).await?;

            cart.add(product, line.quantity)?;
        }

        let order = Order::place(self.ids.order_id(), details, cart, now)?;
        tx.insert_order(&order).await?;

        let entry = order
            .placed_audit_entry()
            .at(now)
            .stamp(self.ids.as_ref(), self.clock.as_ref());
        tx.append_audit(&entry).await?;

        order.to_view()
    }

    /// Move an order to `status` and record the transition.
    ///
    /// `actor` is recorded on the audit entry when it is not blank; otherwise
    /// the system administrator is recorded.
    #[instrument(skip(self, actor), fields(order_id = %order_id, status = %status), err)]
    pub async fn update_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        actor: Option<&str>,
    ) -> DomainResult<OrderView> {
        let actor = actor
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(SYSTEM_ADMIN_ACTOR)
            .to_string();

        let mut tx = self.store.begin().await?;
        let result = self.update_status_in_tx(tx.as_mut(), order_id, status, actor).await;
        finish(tx, result).await
    }

    async fn update_status_in_tx(
        &self,
        tx: &mut dyn StoreTx,
        order_id: &OrderId,
        status: OrderStatus,
        actor: String,
    ) -> DomainResult<OrderView> {
        let mut order = tx
            .find_order(order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;

        let change = order.change_status(status);
        tx.save_order_status(&order).await?;

        let entry = change
            .audit_entry(order.id(), actor)
            .stamp(self.ids.as_ref(), self.clock.as_ref());
        tx.append_audit(&entry).await?;

        tracing::info!(from = %change.from, to = %change.to, "order status changed");
        order.to_view()
    }

    /// All orders, newest first.
    #[instrument(skip(self), err)]
    pub async fn list_orders(&self) -> DomainResult<Vec<OrderView>> {
        self.store
            .list_orders()
            .await?
            .iter()
            .map(Order::to_view)
            .collect()
    }

    #[instrument(skip(self), fields(order_id = %order_id), err)]
    pub async fn get_order(&self, order_id: &OrderId) -> DomainResult<OrderView> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?
            .to_view()
    }

    /// Insert `orders` as-is when no order exists yet. Returns how many were inserted.
    #[instrument(skip(self, orders), err)]
    pub async fn seed_if_empty(&self, orders: Vec<Order>) -> DomainResult<usize> {
        if !self.store.list_orders().await?.is_empty() {
            return Ok(0);
        }

        let mut tx = self.store.begin().await?;
        let mut result = Ok(());
        for order in &orders {
            if let Err(e) = tx.insert_order(order).await {
                result = Err(DomainError::from(e));
                break;
            }
        }
        finish(tx, result).await?;

        tracing::info!(count = orders.len(), "demo orders seeded");
        Ok(orders.len())
    }
}

fn order_not_found(order_id: &OrderId) -> DomainError {
    DomainError::not_found(format!("order {order_id} not found"))
}
