//! Database models
//!
//! Row types mapped with sqlx `FromRow`. Order status uses the shared
//! [`OrderStatus`](shared::OrderStatus) enum end to end; no layer redefines
//! status strings.

mod address;
mod cart;
mod order;

pub use address::Address;
pub use cart::CartItem;
pub use order::{NewOrder, NewOrderItem, Order, OrderDetail, OrderItem, OrderStatusHistory};
