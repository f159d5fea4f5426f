//! Service-level tests over the in-memory store.
//!
//! Verifies:
//! - Order intake prices, reserves and audits in one unit
//! - Any failing step leaves stock, orders and the audit trail untouched
//! - Status changes are audited with the right severity and actor
//! - Past orders are independent of later catalog edits

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use maison_audit::{AuditCategory, AuditSeverity, NewAuditEntry};
    use maison_core::{Clock, DomainError, IdGenerator, ManualClock, OrderId, ProductId, SequentialIdGenerator};
    use maison_products::{Product, ProductInput};
    use maison_sales::{OrderLineRequest, OrderStatus, PlaceOrder};

    use crate::seed::{demo_audit_logs, demo_catalog, demo_orders};
    use crate::services::{AuditService, CatalogService, OrderService};
    use crate::store::{FailurePoint, InMemoryStore, Store};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    struct Harness {
        store: InMemoryStore,
        clock: Arc<ManualClock>,
        orders: OrderService,
        catalog: CatalogService,
        audit: AuditService,
    }

    async fn harness() -> Harness {
        let store = InMemoryStore::new();
        let shared: Arc<dyn Store> = Arc::new(store.clone());
        let ids: Arc<dyn IdGenerator> = Arc::new(SequentialIdGenerator::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();

        let catalog = CatalogService::new(shared.clone(), ids.clone(), dyn_clock.clone());
        catalog
            .seed_if_empty(demo_catalog(t0()).unwrap())
            .await
            .unwrap();

        Harness {
            orders: OrderService::new(shared.clone(), ids.clone(), dyn_clock.clone()),
            audit: AuditService::new(shared, ids, dyn_clock),
            catalog,
            clock,
            store,
        }
    }

    fn order_for(lines: &[(&str, i64)]) -> PlaceOrder {
        PlaceOrder {
            customer: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            address: "12 Analytical Way, London".to_string(),
            lines: lines
                .iter()
                .map(|(id, quantity)| OrderLineRequest {
                    product_id: ProductId::new(*id),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    async fn stock_of(h: &Harness, id: &str) -> i64 {
        h.catalog.get_product(&ProductId::new(id)).await.unwrap().stock
    }

    fn input_from(product: &Product) -> ProductInput {
        ProductInput {
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price,
            original_price: product.original_price,
            image: product.image.clone(),
            description: product.description.clone(),
            dimensions: product.dimensions.clone(),
            material: product.material.clone(),
            stock: product.stock,
            sku: product.sku.clone(),
            featured: product.featured,
            rating: product.rating,
            reviews: product.reviews,
        }
    }

    #[tokio::test]
    async fn placing_an_order_prices_reserves_and_audits() {
        let h = harness().await;

        let view = h.orders.place_order(order_for(&[("p2", 2)])).await.unwrap();

        assert_eq!(view.total, 1298);
        assert_eq!(view.status, OrderStatus::Pending);
        assert_eq!(view.date, t0());
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 2);
        assert_eq!(view.items[0].product.stock, 26);
        assert_eq!(stock_of(&h, "p2").await, 26);

        let logs = h.audit.list().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "New Order Placed");
        assert_eq!(logs[0].category, AuditCategory::Order);
        assert_eq!(logs[0].severity, AuditSeverity::Info);
        assert_eq!(logs[0].user, "ada@example.com");
        assert_eq!(
            logs[0].details,
            format!("New order {} placed by Ada Lovelace - $1298", view.id)
        );
    }

    /// Moves one second forward every time it is read.
    struct TickingClock(ManualClock);

    impl Clock for TickingClock {
        fn now(&self) -> DateTime<Utc> {
            let now = self.0.now();
            self.0.advance(Duration::seconds(1));
            now
        }
    }

    #[tokio::test]
    async fn placed_order_and_its_audit_entry_share_one_timestamp() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let ids: Arc<dyn IdGenerator> = Arc::new(SequentialIdGenerator::new());
        let clock: Arc<dyn Clock> = Arc::new(TickingClock(ManualClock::new(t0())));
        CatalogService::new(store.clone(), ids.clone(), clock.clone())
            .seed_if_empty(demo_catalog(t0()).unwrap())
            .await
            .unwrap();
        let orders = OrderService::new(store.clone(), ids.clone(), clock.clone());
        let audit = AuditService::new(store, ids, clock);

        let view = orders.place_order(order_for(&[("p5", 1)])).await.unwrap();

        let logs = audit.list().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].timestamp, view.date);
    }

    #[tokio::test]
    async fn insufficient_stock_leaves_no_trace() {
        let h = harness().await;

        let err = h.orders.place_order(order_for(&[("p2", 50)])).await.unwrap_err();

        assert_eq!(err, DomainError::insufficient_stock("Aria Accent Chair"));
        assert_eq!(stock_of(&h, "p2").await, 28);
        assert!(h.orders.list_orders().await.unwrap().is_empty());
        assert!(h.audit.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_on_a_later_line_undoes_earlier_reservations() {
        let h = harness().await;

        let err = h
            .orders
            .place_order(order_for(&[("p1", 1), ("p7", 2), ("p3", 9)]))
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::insufficient_stock("Strata Walnut Dining Table"));
        assert_eq!(stock_of(&h, "p1").await, 12);
        assert_eq!(stock_of(&h, "p7").await, 42);
        assert_eq!(stock_of(&h, "p3").await, 8);
        assert!(h.orders.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_product_lines_draw_from_the_same_stock() {
        let h = harness().await;

        let err = h
            .orders
            .place_order(order_for(&[("p3", 5), ("p3", 4)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock { .. }));
        assert_eq!(stock_of(&h, "p3").await, 8);

        let view = h
            .orders
            .place_order(order_for(&[("p3", 5), ("p3", 3)]))
            .await
            .unwrap();
        assert_eq!(view.total, 1899 * 8);
        assert_eq!(view.items[0].product.stock, 3);
        assert_eq!(view.items[1].product.stock, 0);
        assert_eq!(stock_of(&h, "p3").await, 0);
    }

    #[tokio::test]
    async fn unknown_product_and_bad_quantity_are_rejected() {
        let h = harness().await;

        let err = h
            .orders
            .place_order(order_for(&[("p1", 1), ("p99", 1)]))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("product p99 not found"));
        assert_eq!(stock_of(&h, "p1").await, 12);

        for quantity in [0, -3] {
            let err = h
                .orders
                .place_order(order_for(&[("p2", quantity)]))
                .await
                .unwrap_err();
            assert_eq!(err, DomainError::invalid("quantity must be greater than 0"));
        }
        assert_eq!(stock_of(&h, "p2").await, 28);
    }

    #[tokio::test]
    async fn request_field_errors_are_reported_before_touching_the_store() {
        let h = harness().await;
        h.store.fail_at(FailurePoint::Commit);

        let mut cmd = order_for(&[("p2", 1)]);
        cmd.email = "  ".to_string();
        let err = h.orders.place_order(cmd).await.unwrap_err();
        assert_eq!(err, DomainError::invalid("email is required"));

        let err = h.orders.place_order(order_for(&[])).await.unwrap_err();
        assert_eq!(err, DomainError::invalid("items are required"));
    }

    #[tokio::test]
    async fn audit_failure_rolls_back_the_whole_order() {
        let h = harness().await;
        h.store.fail_at(FailurePoint::AppendAudit);

        let err = h.orders.place_order(order_for(&[("p2", 2)])).await.unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
        assert_eq!(stock_of(&h, "p2").await, 28);
        assert!(h.orders.list_orders().await.unwrap().is_empty());

        h.store.heal(FailurePoint::AppendAudit);
        h.orders.place_order(order_for(&[("p2", 2)])).await.unwrap();
        assert_eq!(stock_of(&h, "p2").await, 26);
    }

    #[tokio::test]
    async fn order_persist_and_commit_failures_roll_back() {
        let h = harness().await;

        for point in [
            FailurePoint::SaveProduct,
            FailurePoint::InsertOrder,
            FailurePoint::Commit,
        ] {
            h.store.fail_at(point);
            let err = h.orders.place_order(order_for(&[("p4", 3)])).await.unwrap_err();
            assert!(matches!(err, DomainError::Internal(_)));
            h.store.heal(point);
        }

        assert_eq!(stock_of(&h, "p4").await, 15);
        assert!(h.orders.list_orders().await.unwrap().is_empty());
        assert!(h.audit.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_after_write_returns_the_created_order() {
        let h = harness().await;

        let placed = h
            .orders
            .place_order(order_for(&[("p1", 1), ("p2", 2)]))
            .await
            .unwrap();
        let fetched = h.orders.get_order(&placed.id).await.unwrap();

        assert_eq!(fetched, placed);
        assert_eq!(fetched.total, 2199 + 2 * 649);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let h = harness().await;
        let missing = OrderId::new("ORD-404");

        assert_eq!(
            h.orders.get_order(&missing).await.unwrap_err(),
            DomainError::not_found("order ORD-404 not found")
        );
        assert_eq!(
            h.orders
                .update_status(&missing, OrderStatus::Shipped, None)
                .await
                .unwrap_err(),
            DomainError::not_found("order ORD-404 not found")
        );
        assert!(h.audit.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelling_is_audited_as_a_warning_by_the_admin() {
        let h = harness().await;
        let placed = h.orders.place_order(order_for(&[("p2", 2)])).await.unwrap();

        h.clock.advance(Duration::minutes(5));
        let processing = h
            .orders
            .update_status(&placed.id, OrderStatus::Processing, Some("ops@maison.co"))
            .await
            .unwrap();
        assert_eq!(processing.status, OrderStatus::Processing);

        h.clock.advance(Duration::minutes(5));
        let cancelled = h
            .orders
            .update_status(&placed.id, OrderStatus::Cancelled, Some("   "))
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.total, placed.total);

        let logs = h.audit.list().await.unwrap();
        assert_eq!(logs.len(), 3);

        let cancel = &logs[0];
        assert_eq!(cancel.action, "Order Status Changed");
        assert_eq!(cancel.severity, AuditSeverity::Warning);
        assert_eq!(cancel.user, "admin@maison.co");
        assert!(cancel.details.contains("'processing'"));
        assert!(cancel.details.contains("'cancelled'"));

        let process = &logs[1];
        assert_eq!(process.severity, AuditSeverity::Info);
        assert_eq!(process.user, "ops@maison.co");
        assert_eq!(
            process.details,
            format!("Order {} status changed from 'pending' to 'processing'", placed.id)
        );
    }

    #[tokio::test]
    async fn status_change_is_rolled_back_when_a_write_fails() {
        let h = harness().await;
        let placed = h.orders.place_order(order_for(&[("p5", 1)])).await.unwrap();

        for point in [FailurePoint::SaveOrderStatus, FailurePoint::AppendAudit] {
            h.store.fail_at(point);
            let err = h
                .orders
                .update_status(&placed.id, OrderStatus::Shipped, None)
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::Internal(_)));
            h.store.heal(point);
        }

        let fetched = h.orders.get_order(&placed.id).await.unwrap();
        assert_eq!(fetched.status, OrderStatus::Pending);
        assert_eq!(h.audit.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn backwards_transitions_are_allowed() {
        let h = harness().await;
        let placed = h.orders.place_order(order_for(&[("p6", 1)])).await.unwrap();

        h.orders
            .update_status(&placed.id, OrderStatus::Delivered, None)
            .await
            .unwrap();
        let back = h
            .orders
            .update_status(&placed.id, OrderStatus::Pending, None)
            .await
            .unwrap();
        assert_eq!(back.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn catalog_price_change_does_not_touch_past_orders() {
        let h = harness().await;
        let placed = h.orders.place_order(order_for(&[("p2", 2)])).await.unwrap();

        let chair = h.catalog.get_product(&ProductId::new("p2")).await.unwrap();
        let mut input = input_from(&chair);
        input.price = 999;
        input.name = "Aria Accent Chair II".to_string();
        h.catalog.update_product(&chair.id, input).await.unwrap();

        let fetched = h.orders.get_order(&placed.id).await.unwrap();
        assert_eq!(fetched.total, 1298);
        assert_eq!(fetched.items[0].product.price, 649);
        assert_eq!(fetched.items[0].product.name, "Aria Accent Chair");
    }

    #[tokio::test]
    async fn orders_are_listed_newest_first() {
        let h = harness().await;

        let first = h.orders.place_order(order_for(&[("p7", 1)])).await.unwrap();
        h.clock.advance(Duration::hours(1));
        let second = h.orders.place_order(order_for(&[("p8", 1)])).await.unwrap();

        let ids: Vec<OrderId> = h
            .orders
            .list_orders()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_orders_never_oversell() {
        let h = harness().await;

        let mut handles = Vec::new();
        for _ in 0..12 {
            let orders = h.orders.clone();
            handles.push(tokio::spawn(async move {
                orders.place_order(order_for(&[("p3", 1)])).await
            }));
        }

        let mut placed = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => placed += 1,
                Err(DomainError::InsufficientStock { .. }) => rejected += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(placed, 8);
        assert_eq!(rejected, 4);
        assert_eq!(stock_of(&h, "p3").await, 0);
        assert_eq!(h.orders.list_orders().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn product_update_is_audited_with_a_change_summary() {
        let h = harness().await;
        let chair = h.catalog.get_product(&ProductId::new("p2")).await.unwrap();

        let mut input = input_from(&chair);
        input.price = 700;
        input.stock = 30;
        input.rating = 4.5;
        input.reviews = 90;
        h.clock.advance(Duration::minutes(1));
        let updated = h.catalog.update_product(&chair.id, input).await.unwrap();
        assert_eq!(updated.created_at, chair.created_at);
        assert_eq!(updated.updated_at, t0() + Duration::minutes(1));

        h.catalog
            .update_product(&chair.id, input_from(&updated))
            .await
            .unwrap();

        let logs = h.audit.list().await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(
            logs[0].details,
            "Updated \"Aria Accent Chair\": saved without field changes"
        );
        assert_eq!(
            logs[1].details,
            "Updated \"Aria Accent Chair\": price: 649 -> 700, stock: 28 -> 30, \
             rating: 4.7 -> 4.5, reviews: 89 -> 90"
        );
        assert_eq!(logs[1].category, AuditCategory::Product);
    }

    #[tokio::test]
    async fn invalid_product_update_changes_nothing() {
        let h = harness().await;
        let chair = h.catalog.get_product(&ProductId::new("p2")).await.unwrap();

        let mut input = input_from(&chair);
        input.original_price = Some(100);
        let err = h.catalog.update_product(&chair.id, input).await.unwrap_err();

        assert_eq!(err, DomainError::invalid("originalPrice must be >= price"));
        assert_eq!(h.catalog.get_product(&chair.id).await.unwrap(), chair);
        assert!(h.audit.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn product_delete_is_audited_as_a_warning() {
        let h = harness().await;
        let rug = ProductId::new("p8");

        h.catalog.delete_product(&rug).await.unwrap();
        assert_eq!(
            h.catalog.get_product(&rug).await.unwrap_err(),
            DomainError::not_found("product p8 not found")
        );
        assert_eq!(
            h.catalog.delete_product(&rug).await.unwrap_err(),
            DomainError::not_found("product p8 not found")
        );

        let logs = h.audit.list().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "Product Deleted");
        assert_eq!(logs[0].severity, AuditSeverity::Warning);
        assert_eq!(logs[0].details, "Deleted product p8");
    }

    #[tokio::test]
    async fn product_create_generates_ids_and_rejects_duplicates() {
        let h = harness().await;
        let chair = h.catalog.get_product(&ProductId::new("p2")).await.unwrap();

        h.clock.advance(Duration::seconds(1));
        let created = h
            .catalog
            .create_product(Some("  "), input_from(&chair))
            .await
            .unwrap();
        assert!(created.id.as_str().starts_with("p-"));

        let products = h.catalog.list_products().await.unwrap();
        assert_eq!(products.len(), 9);
        assert_eq!(products.last().map(|p| &p.id), Some(&created.id));

        let err = h
            .catalog
            .create_product(Some("p1"), input_from(&chair))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::invalid("product p1 already exists"));
    }

    #[tokio::test]
    async fn seeding_is_skipped_when_catalog_has_products() {
        let h = harness().await;
        let inserted = h
            .catalog
            .seed_if_empty(demo_catalog(t0()).unwrap())
            .await
            .unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(h.catalog.list_products().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn manual_audit_entries_are_validated_and_listed() {
        let h = harness().await;

        let err = h
            .audit
            .record(NewAuditEntry::new(
                "Login",
                AuditCategory::User,
                "  ",
                "Signed in",
                AuditSeverity::Info,
            ))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::invalid("user is required"));

        let log = h
            .audit
            .record(NewAuditEntry::new(
                " Backup Completed ",
                AuditCategory::System,
                "system",
                "Nightly backup finished",
                AuditSeverity::Info,
            ))
            .await
            .unwrap();
        assert_eq!(log.action, "Backup Completed");
        assert!(log.id.as_str().starts_with("log-"));
        assert_eq!(log.timestamp, t0());

        assert_eq!(h.audit.list().await.unwrap(), vec![log]);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        const PRICES: [(&str, i64, i64); 4] =
            [("p1", 2199, 12), ("p2", 649, 28), ("p3", 1899, 8), ("p7", 349, 42)];

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 64,
                ..ProptestConfig::default()
            })]

            /// Property: an order either succeeds with total = Σ price × qty and
            /// stock reduced by exactly the ordered quantities, or fails and
            /// leaves every stock level unchanged.
            #[test]
            fn intake_is_all_or_nothing(
                lines in prop::collection::vec((0usize..PRICES.len(), -1i64..20), 1..6)
            ) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();

                runtime.block_on(async {
                    let h = harness().await;
                    let request: Vec<(&str, i64)> =
                        lines.iter().map(|(i, q)| (PRICES[*i].0, *q)).collect();

                    let result = h.orders.place_order(order_for(&request)).await;

                    let mut expected_total = 0;
                    let mut ordered = [0i64; PRICES.len()];
                    for (i, q) in &lines {
                        expected_total += PRICES[*i].1 * q;
                        ordered[*i] += q;
                    }

                    for (i, (id, _, initial)) in PRICES.iter().enumerate() {
                        let stock = stock_of(&h, id).await;
                        match &result {
                            Ok(_) => assert_eq!(stock, initial - ordered[i]),
                            Err(_) => assert_eq!(stock, *initial),
                        }
                        assert!(stock >= 0);
                    }

                    match result {
                        Ok(view) => {
                            assert_eq!(view.total, expected_total);
                            assert_eq!(h.audit.list().await.unwrap().len(), 1);
                        }
                        Err(_) => {
                            assert!(h.orders.list_orders().await.unwrap().is_empty());
                            assert!(h.audit.list().await.unwrap().is_empty());
                        }
                    }
                });
            }
        }
    }

    #[tokio::test]
    async fn demo_orders_and_audit_trail_are_seeded_once() {
        let h = harness().await;
        let catalog = h.catalog.list_products().await.unwrap();

        assert_eq!(h.orders.seed_if_empty(demo_orders(&catalog).unwrap()).await.unwrap(), 5);
        assert_eq!(h.audit.seed_if_empty(demo_audit_logs().unwrap()).await.unwrap(), 8);
        assert_eq!(h.orders.seed_if_empty(demo_orders(&catalog).unwrap()).await.unwrap(), 0);
        assert_eq!(h.audit.seed_if_empty(demo_audit_logs().unwrap()).await.unwrap(), 0);

        let listed: Vec<String> = h
            .orders
            .list_orders()
            .await
            .unwrap()
            .iter()
            .map(|o| o.id.to_string())
            .collect();
        assert_eq!(
            listed,
            vec!["ORD-2024-005", "ORD-2024-004", "ORD-2024-003", "ORD-2024-002", "ORD-2024-001"]
        );

        let delivered = h.orders.get_order(&OrderId::new("ORD-2024-001")).await.unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.total, 3497);
        assert_eq!(delivered.items.len(), 2);

        let logs = h.audit.list().await.unwrap();
        assert_eq!(logs[0].id.as_str(), "log-003");
        assert_eq!(logs[7].id.as_str(), "log-008");

        // Seeding does not touch stock.
        assert_eq!(stock_of(&h, "p2").await, 28);
    }

    #[tokio::test]
    async fn seeded_order_can_move_on_and_new_orders_list_first() {
        let h = harness().await;
        let catalog = h.catalog.list_products().await.unwrap();
        h.orders.seed_if_empty(demo_orders(&catalog).unwrap()).await.unwrap();

        let pending = OrderId::new("ORD-2024-004");
        let view = h
            .orders
            .update_status(&pending, OrderStatus::Processing, None)
            .await
            .unwrap();
        assert_eq!(view.status, OrderStatus::Processing);
        assert_eq!(view.total, 1328);

        let placed = h.orders.place_order(order_for(&[("p7", 1)])).await.unwrap();
        let listed = h.orders.list_orders().await.unwrap();
        assert_eq!(listed.len(), 6);
        assert_eq!(listed[0].id, placed.id);
    }
}
