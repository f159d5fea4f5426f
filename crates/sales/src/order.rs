use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use maison_audit::{AuditCategory, AuditSeverity, NewAuditEntry};
use maison_core::{DomainError, DomainResult, Entity, OrderId, ProductId, require_non_blank};
use maison_products::Product;

use crate::snapshot::{decode_items, encode_items};

/// Order status lifecycle.
///
/// Any status may follow any other: the admin client is trusted to move
/// orders backwards (e.g. `delivered -> pending`) when correcting mistakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::invalid("invalid status"))
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product copy frozen at purchase time, plus the quantity bought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: i64,
}

/// One requested line of a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Who the order is for and where it ships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDetails {
    pub customer: String,
    pub email: String,
    pub address: String,
}

/// Command: place a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrder {
    pub customer: String,
    pub email: String,
    pub address: String,
    pub lines: Vec<OrderLineRequest>,
}

impl PlaceOrder {
    /// Trim and check the request-level fields.
    ///
    /// Per-line checks (product exists, quantity, stock) need the catalog and
    /// happen during intake.
    pub fn validate(self) -> DomainResult<(CustomerDetails, Vec<OrderLineRequest>)> {
        let details = CustomerDetails {
            customer: require_non_blank(&self.customer, "customer")?,
            email: require_non_blank(&self.email, "email")?,
            address: require_non_blank(&self.address, "address")?,
        };
        if self.lines.is_empty() {
            return Err(DomainError::invalid("items are required"));
        }
        let lines = self
            .lines
            .into_iter()
            .map(|line| {
                let product_id = line.product_id.as_str().parse::<ProductId>().map_err(|_| {
                    DomainError::invalid("product.id is required for each cart item")
                })?;
                Ok(OrderLineRequest {
                    product_id,
                    quantity: line.quantity,
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;
        Ok((details, lines))
    }
}

/// Priced lines accumulated during intake, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
    total: i64,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frozen product copy and add `price * quantity` to the total.
    pub fn add(&mut self, product: Product, quantity: i64) -> DomainResult<()> {
        let line_total = product.line_total(quantity)?;
        self.total = self
            .total
            .checked_add(line_total)
            .ok_or_else(|| DomainError::invalid("order total overflows"))?;
        self.items.push(CartItem { product, quantity });
        Ok(())
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Order as loaded back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOrder {
    pub id: OrderId,
    pub customer: String,
    pub email: String,
    pub address: String,
    pub items_json: Option<String>,
    pub total: i64,
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
}

/// Order row: contact details, serialized item snapshot, frozen total.
///
/// Only the status changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    customer: String,
    email: String,
    address: String,
    items_json: String,
    total: i64,
    status: OrderStatus,
    date: DateTime<Utc>,
}

impl Order {
    /// Create a pending order from a priced cart.
    pub fn place(
        id: OrderId,
        details: CustomerDetails,
        cart: Cart,
        date: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if cart.is_empty() {
            return Err(DomainError::invalid("items are required"));
        }
        let items_json = encode_items(cart.items())?;
        Ok(Self {
            id,
            customer: details.customer,
            email: details.email,
            address: details.address,
            items_json,
            total: cart.total(),
            status: OrderStatus::Pending,
            date,
        })
    }

    /// Rehydrate from a stored row. The snapshot is not decoded here.
    pub fn restore(stored: StoredOrder) -> Self {
        Self {
            id: stored.id,
            customer: stored.customer,
            email: stored.email,
            address: stored.address,
            items_json: stored.items_json.unwrap_or_default(),
            total: stored.total,
            status: stored.status,
            date: stored.date,
        }
    }

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Serialized snapshot, as persisted.
    pub fn items_json(&self) -> &str {
        &self.items_json
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Decode the frozen line items.
    pub fn items(&self) -> DomainResult<Vec<CartItem>> {
        decode_items(Some(&self.items_json))
    }

    /// Move to `to` and report the transition. Every transition is accepted.
    pub fn change_status(&mut self, to: OrderStatus) -> StatusChange {
        let from = self.status;
        self.status = to;
        StatusChange { from, to }
    }

    /// Externally visible shape with the snapshot expanded.
    pub fn to_view(&self) -> DomainResult<OrderView> {
        Ok(OrderView {
            id: self.id.clone(),
            customer: self.customer.clone(),
            email: self.email.clone(),
            items: self.items()?,
            total: self.total,
            status: self.status,
            date: self.date,
            address: self.address.clone(),
        })
    }

    /// Audit entry recorded when the order is placed. The customer email is the actor.
    pub fn placed_audit_entry(&self) -> NewAuditEntry {
        NewAuditEntry::new(
            "New Order Placed",
            AuditCategory::Order,
            self.email.clone(),
            format!(
                "New order {} placed by {} - ${}",
                self.id, self.customer, self.total
            ),
            AuditSeverity::Info,
        )
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Result of [`Order::change_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl StatusChange {
    /// Cancellations are flagged for review; everything else is routine.
    pub fn severity(&self) -> AuditSeverity {
        if self.to == OrderStatus::Cancelled {
            AuditSeverity::Warning
        } else {
            AuditSeverity::Info
        }
    }

    pub fn audit_entry(&self, order_id: &OrderId, actor: impl Into<String>) -> NewAuditEntry {
        NewAuditEntry::new(
            "Order Status Changed",
            AuditCategory::Order,
            actor,
            format!(
                "Order {order_id} status changed from '{}' to '{}'",
                self.from, self.to
            ),
            self.severity(),
        )
    }
}

/// Order as returned to clients. Never exposes the serialized snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: OrderId,
    pub customer: String,
    pub email: String,
    pub items: Vec<CartItem>,
    pub total: i64,
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
    pub address: String,
}
