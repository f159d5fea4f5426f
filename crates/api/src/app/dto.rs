use serde::Deserialize;

use maison_audit::{AuditCategory, AuditSeverity, NewAuditEntry};
use maison_core::{DomainResult, ProductId};
use maison_products::ProductInput;
use maison_sales::{OrderLineRequest, OrderStatus, PlaceOrder};

// -------------------------
// Request DTOs
// -------------------------

/// Cart lines carry the whole product as the storefront holds it. Only
/// `product.id` is read; price and stock come from the catalog.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub items: Vec<CartItemRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CartItemRequest {
    #[serde(default)]
    pub product: ProductRef,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductRef {
    #[serde(default)]
    pub id: String,
}

impl CreateOrderRequest {
    pub fn into_command(self) -> PlaceOrder {
        PlaceOrder {
            customer: self.customer,
            email: self.email,
            address: self.address,
            lines: self
                .items
                .into_iter()
                .map(|item| OrderLineRequest {
                    product_id: ProductId::new(item.product.id),
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub user: Option<String>,
}

impl UpdateOrderStatusRequest {
    pub fn status(&self) -> DomainResult<OrderStatus> {
        self.status.trim().parse()
    }
}

/// New product. `id` is optional; a blank one is generated.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub input: ProductInput,
}

#[derive(Debug, Deserialize)]
pub struct CreateAuditLogRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub severity: String,
}

impl CreateAuditLogRequest {
    /// Text fields are checked before the enum values.
    pub fn into_entry(self) -> DomainResult<NewAuditEntry> {
        let mut entry = NewAuditEntry::new(
            self.action,
            AuditCategory::System,
            self.user,
            self.details,
            AuditSeverity::Info,
        );
        entry.validate()?;
        entry.category = self.category.parse()?;
        entry.severity = self.severity.parse()?;
        Ok(entry)
    }
}
