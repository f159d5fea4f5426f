use std::sync::Arc;

use tracing::instrument;

use maison_audit::{AuditCategory, AuditSeverity, NewAuditEntry, SYSTEM_ADMIN_ACTOR};
use maison_core::{Clock, DomainError, DomainResult, IdGenerator, ProductId};
use maison_products::{Product, ProductInput, collect_changes};

use super::finish;
use crate::store::{Store, StoreError, StoreTx};

/// Catalog CRUD. Edits and deletions are audited; creation is not.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { store, ids, clock }
    }

    /// Oldest first.
    #[instrument(skip(self), err)]
    pub async fn list_products(&self) -> DomainResult<Vec<Product>> {
        Ok(self.store.list_products().await?)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn get_product(&self, id: &ProductId) -> DomainResult<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| product_not_found(id))
    }

    /// Create a product. A blank `id` gets a generated `p-…` identifier.
    #[instrument(skip(self, input), err)]
    pub async fn create_product(
        &self,
        id: Option<&str>,
        input: ProductInput,
    ) -> DomainResult<Product> {
        let id = match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => ProductId::new(id),
            None => self.ids.product_id(),
        };
        let product = Product::create(id, input, self.clock.now())?;

        let mut tx = self.store.begin().await?;
        let result = tx.insert_product(&product).await.map_err(|e| match e {
            StoreError::Conflict { .. } => {
                DomainError::invalid(format!("product {} already exists", product.id))
            }
            other => other.into(),
        });
        finish(tx, result).await?;

        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Replace every editable field of an existing product.
    #[instrument(skip(self, input), fields(product_id = %id), err)]
    pub async fn update_product(&self, id: &ProductId, input: ProductInput) -> DomainResult<Product> {
        let mut tx = self.store.begin().await?;
        let result = self.update_in_tx(tx.as_mut(), id, input).await;
        finish(tx, result).await
    }

    async fn update_in_tx(
        &self,
        tx: &mut dyn StoreTx,
        id: &ProductId,
        input: ProductInput,
    ) -> DomainResult<Product> {
        let mut product = tx.find_product(id).await?.ok_or_else(|| product_not_found(id))?;
        let prev = product.clone();

        product.replace(input, self.clock.now())?;
        tx.save_product(&product).await?;

        let mut changes = collect_changes(&prev, &product);
        if changes.is_empty() {
            changes.push("saved without field changes".to_string());
        }
        let entry = NewAuditEntry::new(
            "Product Updated",
            AuditCategory::Product,
            SYSTEM_ADMIN_ACTOR,
            format!("Updated \"{}\": {}", product.name, changes.join(", ")),
            AuditSeverity::Info,
        )
        .stamp(self.ids.as_ref(), self.clock.as_ref());
        tx.append_audit(&entry).await?;

        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn delete_product(&self, id: &ProductId) -> DomainResult<()> {
        let mut tx = self.store.begin().await?;
        let result = self.delete_in_tx(tx.as_mut(), id).await;
        finish(tx, result).await
    }

    async fn delete_in_tx(&self, tx: &mut dyn StoreTx, id: &ProductId) -> DomainResult<()> {
        if !tx.delete_product(id).await? {
            return Err(product_not_found(id));
        }

        let entry = NewAuditEntry::new(
            "Product Deleted",
            AuditCategory::Product,
            SYSTEM_ADMIN_ACTOR,
            format!("Deleted product {id}"),
            AuditSeverity::Warning,
        )
        .stamp(self.ids.as_ref(), self.clock.as_ref());
        tx.append_audit(&entry).await?;
        Ok(())
    }

    /// Insert `products` in one transaction if the catalog is empty.
    ///
    /// Returns how many products were inserted.
    #[instrument(skip(self, products), err)]
    pub async fn seed_if_empty(&self, products: Vec<Product>) -> DomainResult<usize> {
        if !self.store.list_products().await?.is_empty() {
            return Ok(0);
        }

        let count = products.len();
        let mut tx = self.store.begin().await?;
        let mut result = Ok(());
        for product in &products {
            if let Err(e) = tx.insert_product(product).await {
                result = Err(DomainError::from(e));
                break;
            }
        }
        finish(tx, result).await?;

        tracing::info!(count, "catalog seeded");
        Ok(count)
    }
}

fn product_not_found(id: &ProductId) -> DomainError {
    DomainError::not_found(format!("product {id} not found"))
}
