use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use maison_audit::AuditLog;
use maison_core::{Entity, OrderId, ProductId};
use maison_products::Product;
use maison_sales::Order;

use super::{Store, StoreError, StoreTx};

/// Write operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    SaveProduct,
    InsertOrder,
    SaveOrderStatus,
    AppendAudit,
    Commit,
}

impl FailurePoint {
    const COUNT: usize = 5;

    fn index(self) -> usize {
        match self {
            FailurePoint::SaveProduct => 0,
            FailurePoint::InsertOrder => 1,
            FailurePoint::SaveOrderStatus => 2,
            FailurePoint::AppendAudit => 3,
            FailurePoint::Commit => 4,
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    armed: [AtomicBool; FailurePoint::COUNT],
}

impl Faults {
    fn check(&self, point: FailurePoint) -> Result<(), StoreError> {
        if self.armed[point.index()].load(Ordering::SeqCst) {
            return Err(StoreError::Injected(point));
        }
        Ok(())
    }
}

/// Rows keyed by their entity id.
type Table<E> = BTreeMap<<E as Entity>::Id, E>;

/// Insert `row` unless its id is taken. Returns whether it was inserted.
fn insert_new<E: Entity + Clone>(table: &mut Table<E>, row: &E) -> bool {
    if table.contains_key(row.id()) {
        return false;
    }
    table.insert(row.id().clone(), row.clone());
    true
}

/// Rows kept in insertion order, looked up by entity id.
fn find_row<'a, E: Entity>(rows: &'a [E], id: &E::Id) -> Option<&'a E> {
    rows.iter().find(|row| row.id() == id)
}

#[derive(Debug, Clone, Default)]
struct State {
    products: Table<Product>,
    orders: Vec<Order>,
    audit_logs: Vec<AuditLog>,
}

/// In-memory store.
///
/// Intended for tests/dev. A transaction holds the whole store for its
/// lifetime, so transactions run one at a time. Writes go to a private copy
/// that replaces the shared state on commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call at `point` fail until [`InMemoryStore::heal`].
    pub fn fail_at(&self, point: FailurePoint) {
        self.faults.armed[point.index()].store(true, Ordering::SeqCst);
    }

    pub fn heal(&self, point: FailurePoint) {
        self.faults.armed[point.index()].store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTx {
            guard,
            working,
            faults: self.faults.clone(),
        }))
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let state = self.state.lock().await;
        let mut products: Vec<Product> = state.products.values().cloned().collect();
        products.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.state.lock().await.products.get(id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let state = self.state.lock().await;
        // Newest insert first among equal dates.
        let mut orders: Vec<Order> = state.orders.iter().rev().cloned().collect();
        orders.sort_by(|a, b| b.date().cmp(&a.date()));
        Ok(orders)
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let state = self.state.lock().await;
        Ok(find_row(&state.orders, id).cloned())
    }

    async fn list_audit_logs(&self) -> Result<Vec<AuditLog>, StoreError> {
        let state = self.state.lock().await;
        let mut logs: Vec<AuditLog> = state.audit_logs.iter().rev().cloned().collect();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(logs)
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<State>,
    working: State,
    faults: Arc<Faults>,
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn find_product(&mut self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.working.products.get(id).cloned())
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        self.faults.check(FailurePoint::SaveProduct)?;
        if !insert_new(&mut self.working.products, product) {
            return Err(StoreError::Conflict {
                operation: "insert_product".to_string(),
                message: format!("product {} already exists", product.id),
            });
        }
        Ok(())
    }

    async fn save_product(&mut self, product: &Product) -> Result<(), StoreError> {
        self.faults.check(FailurePoint::SaveProduct)?;
        match self.working.products.get_mut(&product.id) {
            Some(slot) => {
                *slot = product.clone();
                Ok(())
            }
            None => Err(StoreError::Database {
                operation: "save_product".to_string(),
                message: format!("product {} does not exist", product.id),
            }),
        }
    }

    async fn delete_product(&mut self, id: &ProductId) -> Result<bool, StoreError> {
        Ok(self.working.products.remove(id).is_some())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        self.faults.check(FailurePoint::InsertOrder)?;
        if find_row(&self.working.orders, order.id()).is_some() {
            return Err(StoreError::Conflict {
                operation: "insert_order".to_string(),
                message: format!("order {} already exists", order.id()),
            });
        }
        self.working.orders.push(order.clone());
        Ok(())
    }

    async fn find_order(&mut self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        Ok(find_row(&self.working.orders, id).cloned())
    }

    async fn save_order_status(&mut self, order: &Order) -> Result<(), StoreError> {
        self.faults.check(FailurePoint::SaveOrderStatus)?;
        let stored = self
            .working
            .orders
            .iter_mut()
            .find(|o| o.id() == order.id())
            .ok_or_else(|| StoreError::Database {
                operation: "save_order_status".to_string(),
                message: format!("order {} does not exist", order.id()),
            })?;
        stored.change_status(order.status());
        Ok(())
    }

    async fn append_audit(&mut self, entry: &AuditLog) -> Result<(), StoreError> {
        self.faults.check(FailurePoint::AppendAudit)?;
        if find_row(&self.working.audit_logs, &entry.id).is_some() {
            return Err(StoreError::Conflict {
                operation: "append_audit".to_string(),
                message: format!("audit log {} already exists", entry.id),
            });
        }
        self.working.audit_logs.push(entry.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.faults.check(FailurePoint::Commit)?;
        let InMemoryTx {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
