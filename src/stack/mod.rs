//! Radio stack seam
//!
//! The BLE stack itself is an external collaborator; the transport only
//! talks to it through [`RadioStack`].

pub mod traits;

pub use traits::{
    AdvHandle, AdvParams, AttrHandle, BleEvent, CharHandles, CharacteristicDef,
    CharacteristicKind, ConnHandle, ConnParams, DisconnectReason, Phy, PlatformEvent,
    RadioStack, StackError, WriteData,
};
