//! GAP: advertising and connection lifecycle

pub mod advertising;
pub mod connection;

pub use advertising::{AdvertisingData, PayloadTooLong};
pub use connection::{negotiated_payload, LinkState, LinkStatus, LinkViolation};
