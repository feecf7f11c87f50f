//! Transport configuration constants

/// ATT / GATT sizing
pub mod ble {
    /// Largest ATT MTU this device offers during an MTU exchange
    pub const LOCAL_MAX_MTU: u16 = 128;

    /// Opcode (1 byte) plus attribute handle (2 bytes)
    pub const ATT_OVERHEAD: u16 = 3;

    /// ATT MTU every connection starts with before an exchange
    pub const DEFAULT_ATT_MTU: u16 = 23;

    /// Largest notification payload we will ever build
    pub const MAX_PAYLOAD: usize = (LOCAL_MAX_MTU - ATT_OVERHEAD) as usize;

    /// Payload size used until the first MTU exchange completes
    pub const DEFAULT_PAYLOAD: u16 = DEFAULT_ATT_MTU - ATT_OVERHEAD;

    /// Sentinel the radio stack uses for "no connection"
    pub const CONN_HANDLE_INVALID: u16 = 0xFFFF;
}

/// Ring buffer sizing
pub mod buffers {
    /// Slots per ring; +45 lets a bytearray repr be printed in one go.
    /// One slot is kept free, so 1068 bytes are usable.
    pub const RING_CAPACITY: usize = 1024 + 45;
}

/// GAP defaults
pub mod gap {
    /// Name advertised and exposed through the GAP service
    pub const DEVICE_NAME: &str = "Monocle";

    /// Preferred connection interval (min and max) in milliseconds
    pub const CONN_INTERVAL_MS: u32 = 15;

    /// Connection events the peripheral may skip
    pub const SLAVE_LATENCY: u16 = 3;

    /// Supervision timeout in milliseconds
    pub const SUPERVISION_TIMEOUT_MS: u32 = 2000;
}

/// Advertising payload layout
pub mod advertising {
    /// Legacy advertising data limit
    pub const MAX_PAYLOAD: usize = 31;

    /// Advertising interval in milliseconds
    pub const INTERVAL_MS: u32 = 20;

    /// AD type: flags
    pub const AD_TYPE_FLAGS: u8 = 0x01;

    /// AD type: incomplete list of 128-bit service UUIDs
    pub const AD_TYPE_UUID128_INCOMPLETE: u8 = 0x06;

    /// AD type: complete local name
    pub const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;

    /// LE general discoverable, BR/EDR not supported
    pub const FLAGS_LE_ONLY_GENERAL_DISC: u8 = 0x06;
}

/// 128-bit UUIDs of the two services
pub mod uuids {
    /// Nordic UART Service, used for the interactive console
    pub const CONSOLE_SERVICE: u128 = 0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E;
    pub const CONSOLE_RX: u128 = 0x6E400002_B5A3_F393_E0A9_E50E24DCCA9E;
    pub const CONSOLE_TX: u128 = 0x6E400003_B5A3_F393_E0A9_E50E24DCCA9E;

    /// Raw data service, discoverable only once connected
    pub const RAW_SERVICE: u128 = 0xE5700001_7BAC_429A_B4CE_57FF900F479D;
    pub const RAW_RX: u128 = 0xE5700002_7BAC_429A_B4CE_57FF900F479D;
    pub const RAW_TX: u128 = 0xE5700003_7BAC_429A_B4CE_57FF900F479D;
}
