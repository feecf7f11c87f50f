//! Radio stack trait for abstraction and testability
//!
//! This trait describes the calls the transport makes into the BLE stack and
//! the event queues it drains, so the real stack can be swapped with a mock
//! for testing. Every method takes `&self` because the stack is reached both
//! from interrupt context (event replies) and main context (notifications).

use crate::config::ble::LOCAL_MAX_MTU;
use heapless::Vec;

/// Identifier of an active connection
pub type ConnHandle = u16;

/// Attribute handle in the local GATT table
pub type AttrHandle = u16;

/// Identifier of a configured advertising set
pub type AdvHandle = u8;

/// Errors reported by the radio stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// Transmit queue is full, try again
    Resources,
    /// Operation not valid in the current state (e.g. not connected)
    InvalidState,
    /// Connection handle does not refer to a live connection
    InvalidConnHandle,
    /// A parameter was rejected
    InvalidParam,
    /// Stack ran out of memory for the request
    NoMem,
    /// Any other result code
    Internal(u32),
}

/// Connection parameters in radio-stack units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnParams {
    /// Minimum connection interval, 1.25 ms units
    pub min_interval: u16,
    /// Maximum connection interval, 1.25 ms units
    pub max_interval: u16,
    /// Connection events the peripheral may skip
    pub slave_latency: u16,
    /// Supervision timeout, 10 ms units
    pub supervision_timeout: u16,
}

impl ConnParams {
    /// Build parameters from millisecond values
    pub const fn from_millis(interval_ms: u32, slave_latency: u16, timeout_ms: u32) -> Self {
        let interval = (interval_ms * 1000 / 1250) as u16;
        Self {
            min_interval: interval,
            max_interval: interval,
            slave_latency,
            supervision_timeout: (timeout_ms * 1000 / 10_000) as u16,
        }
    }
}

impl Default for ConnParams {
    fn default() -> Self {
        use crate::config::gap;

        Self::from_millis(
            gap::CONN_INTERVAL_MS,
            gap::SLAVE_LATENCY,
            gap::SUPERVISION_TIMEOUT_MS,
        )
    }
}

/// Advertising parameters in radio-stack units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvParams {
    /// Advertising interval, 0.625 ms units
    pub interval: u32,
}

impl AdvParams {
    /// Connectable, scannable, undirected advertising at the given interval
    pub const fn from_millis(interval_ms: u32) -> Self {
        Self {
            interval: interval_ms * 1000 / 625,
        }
    }
}

impl Default for AdvParams {
    fn default() -> Self {
        Self::from_millis(crate::config::advertising::INTERVAL_MS)
    }
}

/// Direction of a characteristic as seen from the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicKind {
    /// Peer writes (with or without response)
    Write,
    /// Device notifies
    Notify,
}

/// Characteristic to register under a service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicDef {
    pub uuid: u128,
    pub kind: CharacteristicKind,
    /// Maximum value length in bytes
    pub max_len: u16,
}

/// Handles assigned to a registered characteristic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharHandles {
    /// Value attribute
    pub value: AttrHandle,
    /// Client characteristic configuration descriptor, notify characteristics only
    pub cccd: Option<AttrHandle>,
}

/// PHY preference used when answering a PHY update request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phy {
    /// Let the stack pick
    Auto,
}

/// HCI reason given when the device drops a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    RemoteUserTerminated,
}

/// Low-level platform events (flash operations and the like)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    FlashOperationSuccess,
    FlashOperationError,
    Other(u32),
}

/// Written value carried by a GATT write event
pub type WriteData = Vec<u8, { LOCAL_MAX_MTU as usize }>;

/// BLE protocol events pulled from the stack's event queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BleEvent {
    /// A central connected
    Connected { conn: ConnHandle },
    /// The link went down
    Disconnected { conn: ConnHandle, reason: u8 },
    /// Peer asked to change PHY
    PhyUpdateRequest { conn: ConnHandle },
    /// Peer started an ATT MTU exchange
    MtuExchangeRequest { conn: ConnHandle, client_rx_mtu: u16 },
    /// Peer wrote an attribute value
    Write {
        conn: ConnHandle,
        handle: AttrHandle,
        data: WriteData,
    },
    /// A server-side GATT procedure timed out
    GattServerTimeout { conn: ConnHandle },
    /// System attributes (CCCD state) are needed for this connection
    SystemAttributesMissing { conn: ConnHandle },
    /// Peer wants to pair
    SecurityParamsRequest { conn: ConnHandle },
    /// Peer asks for stored keys
    SecurityInfoRequest { conn: ConnHandle },
    /// Peer requests encryption
    SecurityRequest { conn: ConnHandle },
    /// Peer asks for a passkey or OOB data
    AuthKeyRequest { conn: ConnHandle },
    /// Peer proposes new data length parameters
    DataLengthUpdateRequest { conn: ConnHandle },
    /// Client-role GATT timeout
    GattClientTimeout { conn: ConnHandle },
    /// Central-role connection parameter update request
    ConnParamUpdateRequest { conn: ConnHandle },
    /// Queued-write memory request (central role)
    UserMemRequest { conn: ConnHandle },
    /// Anything this transport does not know about
    Unknown(u16),
}

/// Abstract radio stack interface for testability
///
/// This trait allows the transport to work with either the real stack
/// bindings or a mock implementation for testing.
pub trait RadioStack {
    /// Set the GAP device name
    fn set_device_name(&self, name: &str) -> Result<(), StackError>;

    /// Store the peripheral's preferred connection parameters
    fn set_preferred_conn_params(&self, params: &ConnParams) -> Result<(), StackError>;

    /// Read back the preferred connection parameters
    fn preferred_conn_params(&self) -> Result<ConnParams, StackError>;

    /// Register a primary service, returning its handle
    fn add_service(&self, uuid: u128) -> Result<AttrHandle, StackError>;

    /// Register a characteristic under `service`
    fn add_characteristic(
        &self,
        service: AttrHandle,
        def: &CharacteristicDef,
    ) -> Result<CharHandles, StackError>;

    /// Configure the advertising set with the given payload
    fn configure_advertising(
        &self,
        payload: &[u8],
        params: &AdvParams,
    ) -> Result<AdvHandle, StackError>;

    /// Start advertising with a configured set
    fn start_advertising(&self, adv: AdvHandle) -> Result<(), StackError>;

    /// Stop advertising
    fn stop_advertising(&self, adv: AdvHandle) -> Result<(), StackError>;

    /// Queue a notification on `handle`
    ///
    /// Returns [`StackError::Resources`] while the transmit queue is full.
    fn notify(&self, conn: ConnHandle, handle: AttrHandle, data: &[u8]) -> Result<(), StackError>;

    /// Ask the central to apply the given connection parameters
    fn update_conn_params(&self, conn: ConnHandle, params: &ConnParams) -> Result<(), StackError>;

    /// Provide an empty set of system attributes for `conn`
    fn set_system_attributes(&self, conn: ConnHandle) -> Result<(), StackError>;

    /// Answer a PHY update request
    fn reply_phy_update(&self, conn: ConnHandle, phy: Phy) -> Result<(), StackError>;

    /// Answer an MTU exchange with our maximum
    fn reply_mtu_exchange(&self, conn: ConnHandle, server_rx_mtu: u16) -> Result<(), StackError>;

    /// Answer a data length update with automatic parameters
    fn reply_data_length_update(&self, conn: ConnHandle) -> Result<(), StackError>;

    /// Reject a pairing request with "pairing not supported"
    fn reply_sec_params_not_supported(&self, conn: ConnHandle) -> Result<(), StackError>;

    /// Answer a security info request with no keys
    fn reply_sec_info_none(&self, conn: ConnHandle) -> Result<(), StackError>;

    /// Answer an auth key request with no key
    fn reply_auth_key_none(&self, conn: ConnHandle) -> Result<(), StackError>;

    /// Answer a peer security request without starting pairing
    fn authenticate_declined(&self, conn: ConnHandle) -> Result<(), StackError>;

    /// Drop the connection
    fn disconnect(&self, conn: ConnHandle, reason: DisconnectReason) -> Result<(), StackError>;

    /// Pop the next platform event, if any
    fn next_platform_event(&self) -> Option<PlatformEvent>;

    /// Pop the next BLE event; `Ok(None)` once the queue is drained
    fn next_ble_event(&self) -> Result<Option<BleEvent>, StackError>;

    /// Sleep until any interrupt fires.
    ///
    /// Must return immediately if an interrupt fired since the last call,
    /// so a check-then-wait sequence cannot miss a wakeup.
    fn wait_for_event(&self);
}
