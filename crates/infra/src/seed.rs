//! Demo data inserted on first start: the furniture catalog, a handful of
//! past orders across every status, and an audit trail.

use chrono::{DateTime, Utc};

use maison_audit::{AuditCategory, AuditLog, AuditSeverity, SYSTEM_ADMIN_ACTOR};
use maison_core::{AuditLogId, DomainError, DomainResult, OrderId, ProductId};
use maison_products::{Product, ProductInput};
use maison_sales::{Cart, Order, OrderStatus, StoredOrder, encode_items};

struct SeedProduct {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    price: i64,
    original_price: Option<i64>,
    image: &'static str,
    description: &'static str,
    dimensions: &'static str,
    material: &'static str,
    stock: i64,
    sku: &'static str,
    featured: bool,
    rating: f64,
    reviews: i64,
}

const CATALOG: [SeedProduct; 8] = [
    SeedProduct {
        id: "p1",
        name: "Haven Sectional Sofa",
        category: "Living Room",
        price: 2199,
        original_price: Some(2799),
        image: "/images/prod-sofa-1.jpg",
        description: "Sink into the ultimate comfort with our Haven Sectional Sofa. Crafted with a kiln-dried hardwood frame and wrapped in premium Belgian linen, this piece effortlessly blends form and function. The deep-set cushions provide hours of comfort, making it perfect for family gatherings or quiet evenings at home.",
        dimensions: "W 280cm x D 180cm x H 86cm",
        material: "Belgian Linen, Kiln-Dried Hardwood Frame",
        stock: 12,
        sku: "SOF-HVNS-BEI",
        featured: true,
        rating: 4.8,
        reviews: 124,
    },
    SeedProduct {
        id: "p2",
        name: "Aria Accent Chair",
        category: "Living Room",
        price: 649,
        original_price: None,
        image: "/images/prod-chair-1.jpg",
        description: "Make a statement with the Aria Accent Chair. Its sculptural silhouette and rich terracotta velvet upholstery add warmth and personality to any room. Solid oak legs provide a sturdy, grounded feel while keeping the look light and airy.",
        dimensions: "W 76cm x D 82cm x H 84cm",
        material: "Terracotta Velvet, Solid Oak",
        stock: 28,
        sku: "CHR-ARIA-TER",
        featured: true,
        rating: 4.7,
        reviews: 89,
    },
    SeedProduct {
        id: "p3",
        name: "Strata Walnut Dining Table",
        category: "Dining Room",
        price: 1899,
        original_price: Some(2299),
        image: "/images/prod-table-1.jpg",
        description: "The Strata Dining Table is a celebration of natural beauty. Each table is crafted from solid American walnut with a hand-rubbed oil finish that brings out the unique grain patterns. Seats six comfortably, with room for eight when entertaining.",
        dimensions: "W 200cm x D 95cm x H 76cm",
        material: "Solid American Walnut, Hand-Rubbed Oil Finish",
        stock: 8,
        sku: "TBL-STRW-WAL",
        featured: true,
        rating: 4.9,
        reviews: 56,
    },
    SeedProduct {
        id: "p4",
        name: "Cloud Platform Bed",
        category: "Bedroom",
        price: 1549,
        original_price: None,
        image: "/images/prod-bed-1.jpg",
        description: "Elevate your sleep experience with the Cloud Platform Bed. The low-profile silhouette and padded linen headboard create a serene retreat. Its solid base eliminates the need for a box spring, and the upholstered frame adds a luxurious hotel-like feel.",
        dimensions: "W 193cm x D 228cm x H 110cm (King)",
        material: "Cream Linen, Solid Pine Frame",
        stock: 15,
        sku: "BED-CLPL-CRM",
        featured: true,
        rating: 4.9,
        reviews: 201,
    },
    SeedProduct {
        id: "p5",
        name: "Lattice Oak Bookshelf",
        category: "Storage",
        price: 849,
        original_price: None,
        image: "/images/prod-shelf-1.jpg",
        description: "Organize your space in style with the Lattice Oak Bookshelf. Five open shelves give you plenty of room for books, plants, and decor, while the natural oak finish blends seamlessly with any interior palette.",
        dimensions: "W 90cm x D 35cm x H 200cm",
        material: "Natural Oak Veneer, Steel Frame",
        stock: 20,
        sku: "SHF-LTOK-NAT",
        featured: false,
        rating: 4.6,
        reviews: 43,
    },
    SeedProduct {
        id: "p6",
        name: "Studio Writing Desk",
        category: "Home Office",
        price: 599,
        original_price: None,
        image: "/images/prod-desk-1.jpg",
        description: "The Studio Writing Desk is designed for creative minds. Its clean lines, ample surface area, and smart cable management port make it the perfect workspace companion. Works equally well in a dedicated office or as a stylish entry console.",
        dimensions: "W 140cm x D 60cm x H 75cm",
        material: "Lacquered MDF, Powder-Coated Steel",
        stock: 35,
        sku: "DSK-STUD-WHT",
        featured: false,
        rating: 4.5,
        reviews: 67,
    },
    SeedProduct {
        id: "p7",
        name: "Soleil Brass Floor Lamp",
        category: "Lighting",
        price: 349,
        original_price: None,
        image: "/images/prod-lamp-1.jpg",
        description: "Cast a warm glow with the Soleil Floor Lamp. Its antique brass finish and pleated linen shade combine timeless elegance with modern proportions. An adjustable arm lets you direct light exactly where you need it.",
        dimensions: "H 165cm, Shade Diameter 42cm",
        material: "Antique Brass, Linen Shade",
        stock: 42,
        sku: "LMP-SOLB-BRS",
        featured: false,
        rating: 4.7,
        reviews: 98,
    },
    SeedProduct {
        id: "p8",
        name: "Marrakesh Wool Rug",
        category: "Rugs & Textiles",
        price: 479,
        original_price: Some(599),
        image: "/images/prod-rug-1.jpg",
        description: "Inspired by the intricate geometry of North African architecture, the Marrakesh Rug adds soul and warmth to any floor. Hand-tufted from 100% New Zealand wool, it features a subtle raised texture that rewards a closer look.",
        dimensions: "250cm x 350cm",
        material: "100% New Zealand Wool",
        stock: 18,
        sku: "RUG-MRKW-CRM",
        featured: false,
        rating: 4.8,
        reviews: 77,
    },
];

/// The demo catalog (`p1`…`p8`), stamped with `now`.
pub fn demo_catalog(now: DateTime<Utc>) -> DomainResult<Vec<Product>> {
    CATALOG
        .iter()
        .map(|seed| {
            Product::create(
                ProductId::new(seed.id),
                ProductInput {
                    name: seed.name.to_string(),
                    category: seed.category.to_string(),
                    price: seed.price,
                    original_price: seed.original_price,
                    image: seed.image.to_string(),
                    description: seed.description.to_string(),
                    dimensions: seed.dimensions.to_string(),
                    material: seed.material.to_string(),
                    stock: seed.stock,
                    sku: seed.sku.to_string(),
                    featured: seed.featured,
                    rating: seed.rating,
                    reviews: seed.reviews,
                },
                now,
            )
        })
        .collect()
}

struct SeedOrder {
    id: &'static str,
    customer: &'static str,
    email: &'static str,
    address: &'static str,
    lines: &'static [(&'static str, i64)],
    status: OrderStatus,
    date: &'static str,
}

const ORDERS: [SeedOrder; 5] = [
    SeedOrder {
        id: "ORD-2024-001",
        customer: "Sarah Mitchell",
        email: "s.mitchell@email.com",
        address: "14 Oak Lane, San Francisco, CA 94102",
        lines: &[("p1", 1), ("p2", 2)],
        status: OrderStatus::Delivered,
        date: "2025-02-15T10:30:00Z",
    },
    SeedOrder {
        id: "ORD-2024-002",
        customer: "James Thornton",
        email: "j.thornton@email.com",
        address: "88 Maple Street, Brooklyn, NY 11201",
        lines: &[("p3", 1)],
        status: OrderStatus::Shipped,
        date: "2025-02-18T14:15:00Z",
    },
    SeedOrder {
        id: "ORD-2024-003",
        customer: "Elena Rossi",
        email: "e.rossi@email.com",
        address: "201 Birch Ave, Austin, TX 78701",
        lines: &[("p4", 1), ("p7", 1)],
        status: OrderStatus::Processing,
        date: "2025-02-20T09:00:00Z",
    },
    SeedOrder {
        id: "ORD-2024-004",
        customer: "Marcus Webb",
        email: "m.webb@email.com",
        address: "55 Pine Road, Denver, CO 80203",
        lines: &[("p5", 1), ("p8", 1)],
        status: OrderStatus::Pending,
        date: "2025-02-21T16:45:00Z",
    },
    SeedOrder {
        id: "ORD-2024-005",
        customer: "Priya Sharma",
        email: "p.sharma@email.com",
        address: "99 Elm Street, Chicago, IL 60601",
        lines: &[("p6", 2)],
        status: OrderStatus::Cancelled,
        date: "2025-02-22T11:20:00Z",
    },
];

struct SeedLog {
    id: &'static str,
    action: &'static str,
    category: AuditCategory,
    user: &'static str,
    details: &'static str,
    severity: AuditSeverity,
    timestamp: &'static str,
}

const AUDIT_TRAIL: [SeedLog; 8] = [
    SeedLog {
        id: "log-001",
        action: "Product Updated",
        category: AuditCategory::Product,
        user: SYSTEM_ADMIN_ACTOR,
        details: "Updated price of Haven Sectional Sofa from $2,499 to $2,199",
        severity: AuditSeverity::Info,
        timestamp: "2025-02-26T09:15:00Z",
    },
    SeedLog {
        id: "log-002",
        action: "Order Status Changed",
        category: AuditCategory::Order,
        user: SYSTEM_ADMIN_ACTOR,
        details: "Order ORD-2024-002 status changed from 'processing' to 'shipped'",
        severity: AuditSeverity::Info,
        timestamp: "2025-02-26T10:30:00Z",
    },
    SeedLog {
        id: "log-003",
        action: "Stock Alert",
        category: AuditCategory::Product,
        user: "system",
        details: "Strata Walnut Dining Table stock dropped below threshold (8 units remaining)",
        severity: AuditSeverity::Warning,
        timestamp: "2025-02-26T11:00:00Z",
    },
    SeedLog {
        id: "log-004",
        action: "Order Cancelled",
        category: AuditCategory::Order,
        user: SYSTEM_ADMIN_ACTOR,
        details: "Order ORD-2024-005 cancelled per customer request - refund initiated",
        severity: AuditSeverity::Warning,
        timestamp: "2025-02-25T14:20:00Z",
    },
    SeedLog {
        id: "log-005",
        action: "Product Added",
        category: AuditCategory::Product,
        user: "manager@maison.co",
        details: "New product 'Soleil Brass Floor Lamp' added to Lighting category (SKU: LMP-SOLB-BRS)",
        severity: AuditSeverity::Info,
        timestamp: "2025-02-24T16:00:00Z",
    },
    SeedLog {
        id: "log-006",
        action: "User Login",
        category: AuditCategory::User,
        user: "manager@maison.co",
        details: "Successful admin login from IP 192.168.1.45",
        severity: AuditSeverity::Info,
        timestamp: "2025-02-24T15:58:00Z",
    },
    SeedLog {
        id: "log-007",
        action: "Bulk Stock Update",
        category: AuditCategory::Product,
        user: SYSTEM_ADMIN_ACTOR,
        details: "Stock levels updated for 5 products after warehouse inventory count",
        severity: AuditSeverity::Info,
        timestamp: "2025-02-23T10:00:00Z",
    },
    SeedLog {
        id: "log-008",
        action: "Failed Login Attempt",
        category: AuditCategory::User,
        user: "unknown",
        details: "3 consecutive failed login attempts from IP 203.0.113.42",
        severity: AuditSeverity::Critical,
        timestamp: "2025-02-23T03:15:00Z",
    },
];

fn parse_time(raw: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DomainError::internal(format!("bad seed timestamp {raw:?}: {e}")))
}

/// Past orders `ORD-2024-001`…`005`, one per status.
///
/// Line items are snapshots of the matching products in `catalog`. An order
/// naming a product that `catalog` lacks is left out.
pub fn demo_orders(catalog: &[Product]) -> DomainResult<Vec<Order>> {
    let mut orders = Vec::with_capacity(ORDERS.len());

    'orders: for seed in &ORDERS {
        let mut cart = Cart::new();
        for (product_id, quantity) in seed.lines {
            let Some(product) = catalog.iter().find(|p| p.id.as_str() == *product_id) else {
                continue 'orders;
            };
            cart.add(product.clone(), *quantity)?;
        }

        orders.push(Order::restore(StoredOrder {
            id: OrderId::new(seed.id),
            customer: seed.customer.to_string(),
            email: seed.email.to_string(),
            address: seed.address.to_string(),
            items_json: Some(encode_items(cart.items())?),
            total: cart.total(),
            status: seed.status,
            date: parse_time(seed.date)?,
        }));
    }

    Ok(orders)
}

/// The demo audit trail (`log-001`…`log-008`).
pub fn demo_audit_logs() -> DomainResult<Vec<AuditLog>> {
    AUDIT_TRAIL
        .iter()
        .map(|seed| {
            Ok(AuditLog {
                id: AuditLogId::new(seed.id),
                action: seed.action.to_string(),
                category: seed.category,
                user: seed.user.to_string(),
                details: seed.details.to_string(),
                severity: seed.severity,
                timestamp: parse_time(seed.timestamp)?,
            })
        })
        .collect()
}
