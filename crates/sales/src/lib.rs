//! Customer orders.
//!
//! Pure domain logic: request validation, cart pricing, the frozen item
//! snapshot and status transitions. Persistence and transactions live in
//! `maison-infra`.

pub mod order;
pub mod snapshot;

pub use order::{
    Cart, CartItem, CustomerDetails, Order, OrderLineRequest, OrderStatus, OrderView, PlaceOrder,
    StatusChange, StoredOrder,
};
pub use snapshot::{decode_items, encode_items};
