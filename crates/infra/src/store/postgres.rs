//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | any | `Database` |
//! | ColumnDecode / Decode | N/A | `Decode` |
//! | PoolClosed, Io, Tls, … | N/A | `Database` |
//!
//! ## Locking
//!
//! Transactional reads use `SELECT … FOR UPDATE`. Two concurrent orders for
//! the same product serialize on the product row, so the second one sees the
//! stock left by the first.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tracing::instrument;

use maison_audit::AuditLog;
use maison_core::{AuditLogId, OrderId, ProductId};
use maison_products::Product;
use maison_sales::{Order, OrderStatus, StoredOrder};

use super::{Store, StoreError, StoreTx};

/// Embedded schema, applied by [`PostgresStore::migrate`].
const INIT_SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

const PRODUCT_COLUMNS: &str = "id, name, category, price, original_price, image, description, \
     dimensions, material, stock, sku, featured, rating, reviews, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, customer, email, address, items_json, total, status, date";

const AUDIT_COLUMNS: &str = r#"id, action, category, "user", details, severity, timestamp"#;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    #[instrument(skip_all, err)]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(INIT_SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        tracing::info!("database schema up to date");
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PostgresTx { tx }))
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY date DESC, id DESC"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;

        rows.iter().map(order_from_row).collect()
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_order", e))?;

        row.as_ref().map(order_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_audit_logs(&self) -> Result<Vec<AuditLog>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_logs ORDER BY timestamp DESC, id DESC"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_audit_logs", e))?;

        rows.iter().map(audit_log_from_row).collect()
    }
}

struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn find_product(&mut self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
        ))
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.original_price)
        .bind(&product.image)
        .bind(&product.description)
        .bind(&product.dimensions)
        .bind(&product.material)
        .bind(product.stock)
        .bind(&product.sku)
        .bind(product.featured)
        .bind(product.rating)
        .bind(product.reviews)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    async fn save_product(&mut self, product: &Product) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = $2,
                category = $3,
                price = $4,
                original_price = $5,
                image = $6,
                description = $7,
                dimensions = $8,
                material = $9,
                stock = $10,
                sku = $11,
                featured = $12,
                rating = $13,
                reviews = $14,
                updated_at = $15
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.original_price)
        .bind(&product.image)
        .bind(&product.description)
        .bind(&product.dimensions)
        .bind(&product.material)
        .bind(product.stock)
        .bind(&product.sku)
        .bind(product.featured)
        .bind(product.rating)
        .bind(product.reviews)
        .bind(product.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("save_product", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Database {
                operation: "save_product".to_string(),
                message: format!("product {} does not exist", product.id),
            });
        }
        Ok(())
    }

    async fn delete_product(&mut self, id: &ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(order.id().as_str())
        .bind(order.customer())
        .bind(order.email())
        .bind(order.address())
        .bind(order.items_json())
        .bind(order.total())
        .bind(order.status().as_str())
        .bind(order.date())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;
        Ok(())
    }

    async fn find_order(&mut self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_order", e))?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn save_order_status(&mut self, order: &Order) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(order.id().as_str())
            .bind(order.status().as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("save_order_status", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Database {
                operation: "save_order_status".to_string(),
                message: format!("order {} does not exist", order.id()),
            });
        }
        Ok(())
    }

    async fn append_audit(&mut self, entry: &AuditLog) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO audit_logs ({AUDIT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(entry.id.as_str())
        .bind(&entry.action)
        .bind(entry.category.as_str())
        .bind(&entry.user)
        .bind(&entry.details)
        .bind(entry.severity.as_str())
        .bind(entry.timestamp)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("append_audit", e))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message().to_string();
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict {
                    operation: operation.to_string(),
                    message,
                },
                _ => StoreError::Database {
                    operation: operation.to_string(),
                    message,
                },
            }
        }
        sqlx::Error::ColumnDecode { index, source } => StoreError::Decode {
            entity: "column",
            message: format!("{operation}: column {index}: {source}"),
        },
        sqlx::Error::PoolClosed => StoreError::Database {
            operation: operation.to_string(),
            message: "connection pool closed".to_string(),
        },
        other => StoreError::Database {
            operation: operation.to_string(),
            message: other.to_string(),
        },
    }
}

fn decode_err(entity: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| StoreError::Decode {
        entity,
        message: e.to_string(),
    }
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    let err = decode_err("product");
    Ok(Product {
        id: ProductId::new(row.try_get::<String, _>("id").map_err(&err)?),
        name: row.try_get("name").map_err(&err)?,
        category: row.try_get("category").map_err(&err)?,
        price: row.try_get("price").map_err(&err)?,
        original_price: row.try_get("original_price").map_err(&err)?,
        image: row.try_get("image").map_err(&err)?,
        description: row.try_get("description").map_err(&err)?,
        dimensions: row.try_get("dimensions").map_err(&err)?,
        material: row.try_get("material").map_err(&err)?,
        stock: row.try_get("stock").map_err(&err)?,
        sku: row.try_get("sku").map_err(&err)?,
        featured: row.try_get("featured").map_err(&err)?,
        rating: row.try_get("rating").map_err(&err)?,
        reviews: row.try_get("reviews").map_err(&err)?,
        created_at: row.try_get("created_at").map_err(&err)?,
        updated_at: row.try_get("updated_at").map_err(&err)?,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let err = decode_err("order");
    let status: String = row.try_get("status").map_err(&err)?;
    let status = status.parse::<OrderStatus>().map_err(|e| StoreError::Decode {
        entity: "order",
        message: e.to_string(),
    })?;
    let date: DateTime<Utc> = row.try_get("date").map_err(&err)?;

    Ok(Order::restore(StoredOrder {
        id: OrderId::new(row.try_get::<String, _>("id").map_err(&err)?),
        customer: row.try_get("customer").map_err(&err)?,
        email: row.try_get("email").map_err(&err)?,
        address: row.try_get("address").map_err(&err)?,
        items_json: row.try_get("items_json").map_err(&err)?,
        total: row.try_get("total").map_err(&err)?,
        status,
        date,
    }))
}

fn audit_log_from_row(row: &PgRow) -> Result<AuditLog, StoreError> {
    let err = decode_err("audit log");
    let category: String = row.try_get("category").map_err(&err)?;
    let severity: String = row.try_get("severity").map_err(&err)?;
    let invalid = |e: maison_core::DomainError| StoreError::Decode {
        entity: "audit log",
        message: e.to_string(),
    };

    Ok(AuditLog {
        id: AuditLogId::new(row.try_get::<String, _>("id").map_err(&err)?),
        action: row.try_get("action").map_err(&err)?,
        category: category.parse().map_err(invalid)?,
        user: row.try_get("user").map_err(&err)?,
        details: row.try_get("details").map_err(&err)?,
        severity: severity.parse().map_err(invalid)?,
        timestamp: row.try_get("timestamp").map_err(&err)?,
    })
}
