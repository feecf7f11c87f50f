//! Connection state shared between the event handler and the main loop
//!
//! Written only from the event handler (interrupt context), read from
//! everywhere. Every field is an atomic scalar so no lock is needed.

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crate::config::ble::{ATT_OVERHEAD, CONN_HANDLE_INVALID, DEFAULT_PAYLOAD};
use crate::stack::ConnHandle;

/// Where the link currently is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Waiting for a central
    Advertising,
    /// A central is connected
    Connected(ConnHandle),
    /// Shut down for power-off; neither advertising nor connected
    Stopped,
}

/// Event sequences the stack should never produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkViolation {
    /// Connect while another connection is live
    AlreadyConnected { active: ConnHandle, new: ConnHandle },
    /// Event for a connection that is not the active one
    UnknownConnection {
        active: Option<ConnHandle>,
        got: ConnHandle,
    },
    /// Connect carrying the stack's "no connection" handle
    ReservedHandle { got: ConnHandle },
}

/// Payload bytes per notification for an MTU exchange.
///
/// The smaller of the two MTUs wins, minus the ATT opcode and handle.
pub fn negotiated_payload(local_max_mtu: u16, client_rx_mtu: u16) -> u16 {
    local_max_mtu.min(client_rx_mtu).saturating_sub(ATT_OVERHEAD)
}

/// Connection handle, negotiated MTU and advertising flags
pub struct LinkState {
    connection: AtomicU16,
    payload_size: AtomicU16,
    advertising: AtomicBool,
    stopped: AtomicBool,
}

impl LinkState {
    pub const fn new() -> Self {
        Self {
            connection: AtomicU16::new(CONN_HANDLE_INVALID),
            payload_size: AtomicU16::new(DEFAULT_PAYLOAD),
            advertising: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Active connection, if any
    pub fn connection(&self) -> Option<ConnHandle> {
        match self.connection.load(Ordering::Acquire) {
            CONN_HANDLE_INVALID => None,
            handle => Some(handle),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection().is_some()
    }

    /// Bytes usable per notification.
    ///
    /// Kept across reconnects until the next MTU exchange.
    pub fn payload_size(&self) -> u16 {
        self.payload_size.load(Ordering::Relaxed)
    }

    /// A stopped link reports `Stopped` even while a late connection is
    /// still being torn down.
    pub fn status(&self) -> LinkStatus {
        if self.stopped.load(Ordering::Relaxed) {
            LinkStatus::Stopped
        } else if let Some(conn) = self.connection() {
            LinkStatus::Connected(conn)
        } else {
            LinkStatus::Advertising
        }
    }

    pub fn is_advertising(&self) -> bool {
        self.advertising.load(Ordering::Relaxed)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    pub(crate) fn set_advertising(&self, advertising: bool) {
        self.advertising.store(advertising, Ordering::Relaxed);
    }

    pub(crate) fn set_stopped(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    /// Record a new connection. Only one may be live at a time.
    pub(crate) fn connect(&self, conn: ConnHandle) -> Result<(), LinkViolation> {
        if conn == CONN_HANDLE_INVALID {
            return Err(LinkViolation::ReservedHandle { got: conn });
        }
        if let Some(active) = self.connection() {
            return Err(LinkViolation::AlreadyConnected { active, new: conn });
        }
        self.connection.store(conn, Ordering::Release);
        self.advertising.store(false, Ordering::Relaxed);
        Ok(())
    }

    /// Clear the connection `conn`, which must be the active one.
    pub(crate) fn disconnect(&self, conn: ConnHandle) -> Result<(), LinkViolation> {
        self.ensure_active(conn)?;
        self.connection.store(CONN_HANDLE_INVALID, Ordering::Release);
        Ok(())
    }

    /// Check that an event belongs to the active connection
    pub(crate) fn ensure_active(&self, conn: ConnHandle) -> Result<(), LinkViolation> {
        match self.connection() {
            Some(active) if active == conn => Ok(()),
            active => Err(LinkViolation::UnknownConnection { active, got: conn }),
        }
    }

    /// Store the outcome of an MTU exchange and return the new payload size
    pub(crate) fn record_mtu(&self, local_max_mtu: u16, client_rx_mtu: u16) -> u16 {
        let payload = negotiated_payload(local_max_mtu, client_rx_mtu);
        self.payload_size.store(payload, Ordering::Relaxed);
        payload
    }
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_disconnected() {
        let link = LinkState::new();
        assert!(!link.is_connected());
        assert_eq!(link.connection(), None);
        assert_eq!(link.payload_size(), DEFAULT_PAYLOAD);
        assert_eq!(link.status(), LinkStatus::Advertising);
    }

    #[test]
    fn test_connect_disconnect_cycle() {
        let link = LinkState::new();

        for handle in [7u16, 0, 42] {
            link.connect(handle).unwrap();
            assert_eq!(link.connection(), Some(handle));
            assert_eq!(link.status(), LinkStatus::Connected(handle));

            link.disconnect(handle).unwrap();
            assert!(!link.is_connected());
        }
    }

    #[test]
    fn test_second_connect_rejected() {
        let link = LinkState::new();
        link.connect(1).unwrap();

        assert_eq!(
            link.connect(2),
            Err(LinkViolation::AlreadyConnected { active: 1, new: 2 })
        );
        assert_eq!(link.connection(), Some(1));
    }

    #[test]
    fn test_connect_with_reserved_handle_rejected() {
        let link = LinkState::new();

        assert_eq!(
            link.connect(CONN_HANDLE_INVALID),
            Err(LinkViolation::ReservedHandle { got: 0xFFFF })
        );
        assert!(!link.is_connected());
        // A real connection still goes through afterwards
        link.connect(3).unwrap();
        assert_eq!(link.connection(), Some(3));
    }

    #[test]
    fn test_stopped_wins_over_connection() {
        let link = LinkState::new();
        link.connect(5).unwrap();
        link.set_stopped();

        assert_eq!(link.status(), LinkStatus::Stopped);
        assert!(link.is_connected());
    }

    #[test]
    fn test_disconnect_wrong_handle_rejected() {
        let link = LinkState::new();
        link.connect(1).unwrap();

        assert_eq!(
            link.disconnect(5),
            Err(LinkViolation::UnknownConnection {
                active: Some(1),
                got: 5
            })
        );
        assert!(link.is_connected());
    }

    #[test]
    fn test_negotiated_payload_bounds() {
        assert_eq!(negotiated_payload(128, 64), 61);
        assert_eq!(negotiated_payload(128, 300), 125);
        assert_eq!(negotiated_payload(128, 128), 125);
        assert_eq!(negotiated_payload(128, 2), 0);
    }

    #[test]
    fn test_mtu_survives_reconnect() {
        let link = LinkState::new();
        link.connect(1).unwrap();
        assert_eq!(link.record_mtu(128, 64), 61);
        link.disconnect(1).unwrap();
        link.connect(2).unwrap();

        assert_eq!(link.payload_size(), 61);
    }
}
