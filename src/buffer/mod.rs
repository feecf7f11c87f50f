//! Byte buffering for the inbound and outbound streams

pub mod ring;
pub mod shared;

pub use ring::RingBuffer;
pub use shared::SharedRing;
