use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use maison_core::{DomainError, DomainResult, Entity, ProductId};

/// Highest rating a product can carry.
pub const MAX_RATING: f64 = 5.0;

/// Catalog product.
///
/// Prices are integers in the smallest currency unit. `stock` never goes
/// negative: the only decrement path is [`Product::reserve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: i64,
    /// List price shown struck through next to `price`. Never below `price`.
    #[serde(
        rename = "originalPrice",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub original_price: Option<i64>,
    pub image: String,
    pub description: String,
    pub dimensions: String,
    pub material: String,
    pub stock: i64,
    pub sku: String,
    pub featured: bool,
    pub rating: f64,
    pub reviews: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable product fields, as submitted by the catalog client.
///
/// Missing JSON fields take their zero value, matching a full-replace edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    pub name: String,
    pub category: String,
    pub price: i64,
    #[serde(rename = "originalPrice")]
    pub original_price: Option<i64>,
    pub image: String,
    pub description: String,
    pub dimensions: String,
    pub material: String,
    pub stock: i64,
    pub sku: String,
    pub featured: bool,
    pub rating: f64,
    pub reviews: i64,
}

impl ProductInput {
    /// Trim every free-text field.
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.name,
            &mut self.category,
            &mut self.image,
            &mut self.description,
            &mut self.dimensions,
            &mut self.material,
            &mut self.sku,
        ] {
            let trimmed = field.trim();
            if trimmed.len() != field.len() {
                *field = trimmed.to_string();
            }
        }
        self
    }
}

impl Product {
    /// Build a new catalog entry. Input is normalized and validated.
    pub fn create(id: ProductId, input: ProductInput, now: DateTime<Utc>) -> DomainResult<Self> {
        let input = input.normalized();
        let product = Self {
            id,
            name: input.name,
            category: input.category,
            price: input.price,
            original_price: input.original_price,
            image: input.image,
            description: input.description,
            dimensions: input.dimensions,
            material: input.material,
            stock: input.stock,
            sku: input.sku,
            featured: input.featured,
            rating: input.rating,
            reviews: input.reviews,
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    /// Replace every editable field. Identity and `created_at` are kept.
    ///
    /// On validation failure `self` is left untouched.
    pub fn replace(&mut self, input: ProductInput, now: DateTime<Utc>) -> DomainResult<()> {
        let mut next = Self::create(self.id.clone(), input, self.created_at)?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Catalog field rules.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.is_empty() {
            return Err(DomainError::invalid("name is required"));
        }
        if self.category.is_empty() {
            return Err(DomainError::invalid("category is required"));
        }
        if self.image.is_empty() {
            return Err(DomainError::invalid("image is required"));
        }
        if self.sku.is_empty() {
            return Err(DomainError::invalid("sku is required"));
        }
        if self.price < 0 {
            return Err(DomainError::invalid("price must be >= 0"));
        }
        if self.stock < 0 {
            return Err(DomainError::invalid("stock must be >= 0"));
        }
        if self.reviews < 0 {
            return Err(DomainError::invalid("reviews must be >= 0"));
        }
        if !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(DomainError::invalid("rating must be between 0 and 5"));
        }
        if let Some(original) = self.original_price {
            if original < self.price {
                return Err(DomainError::invalid("originalPrice must be >= price"));
            }
        }
        Ok(())
    }

    /// Take `quantity` units out of stock.
    ///
    /// Fails without mutating when the quantity is not positive or exceeds
    /// what is on hand.
    pub fn reserve(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::invalid("quantity must be greater than 0"));
        }
        if quantity > self.stock {
            return Err(DomainError::insufficient_stock(self.name.clone()));
        }
        self.stock -= quantity;
        Ok(())
    }

    /// `price * quantity`, rejecting overflow.
    pub fn line_total(&self, quantity: i64) -> DomainResult<i64> {
        self.price
            .checked_mul(quantity)
            .ok_or_else(|| DomainError::invalid(format!("line total overflows for {}", self.name)))
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Human-readable summary of what a catalog edit changed.
///
/// Only the fields an operator cares about in the audit trail are listed.
pub fn collect_changes(prev: &Product, next: &Product) -> Vec<String> {
    let mut changes = Vec::new();

    if prev.name != next.name {
        changes.push(format!("name: {:?} -> {:?}", prev.name, next.name));
    }
    if prev.price != next.price {
        changes.push(format!("price: {} -> {}", prev.price, next.price));
    }
    if prev.stock != next.stock {
        changes.push(format!("stock: {} -> {}", prev.stock, next.stock));
    }
    if prev.featured != next.featured {
        changes.push(format!("featured: {} -> {}", prev.featured, next.featured));
    }
    if prev.category != next.category {
        changes.push(format!("category: {:?} -> {:?}", prev.category, next.category));
    }
    if prev.image != next.image {
        changes.push("image updated".to_string());
    }
    match (prev.original_price, next.original_price) {
        (None, Some(to)) => changes.push(format!("originalPrice: nil -> {to}")),
        (Some(from), None) => changes.push(format!("originalPrice: {from} -> nil")),
        (Some(from), Some(to)) if from != to => {
            changes.push(format!("originalPrice: {from} -> {to}"))
        }
        _ => {}
    }
    if prev.rating != next.rating {
        changes.push(format!("rating: {:.1} -> {:.1}", prev.rating, next.rating));
    }
    if prev.reviews != next.reviews {
        changes.push(format!("reviews: {} -> {}", prev.reviews, next.reviews));
    }

    changes
}
