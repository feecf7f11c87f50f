//! GATT services carrying the two byte streams

pub mod service;

pub use service::{Channel, ChannelHandles, ServiceDef, ServiceTable, WriteTarget};
