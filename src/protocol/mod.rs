//! Framing for data carried over the raw channel

pub mod media;

pub use media::{header_len, MediaWriter, PacketFlag};
