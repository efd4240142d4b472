//! Data models shared across the backend

pub mod order;

pub use order::{
    Address, Carrier, Order, OrderItem, OrderStatus, Refund, Shipment,
};
