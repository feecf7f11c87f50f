//! Radio event dispatcher
//!
//! Runs in the stack's event interrupt. Each invocation drains the platform
//! event queue, then the BLE event queue, to completion. Every BLE event maps
//! to exactly one action; see [`EventDispatcher::dispatch`].

use crate::config::ble::LOCAL_MAX_MTU;
use crate::fatal::{check, fatal};
use crate::gatt::WriteTarget;
use crate::stack::{BleEvent, ConnHandle, DisconnectReason, Phy, PlatformEvent, RadioStack};
use crate::transport::Transport;

/// CCCD bit enabling notifications
const CCCD_NOTIFY: u16 = 0x0001;

/// Radio event dispatcher
///
/// Holds no state of its own; everything it touches lives in the
/// [`Transport`].
pub struct EventDispatcher;

impl EventDispatcher {
    /// Create a new event dispatcher
    pub fn new() -> Self {
        Self
    }

    /// Drain both event queues
    pub fn service<S: RadioStack>(&self, transport: &Transport<S>) {
        while let Some(event) = transport.stack.next_platform_event() {
            self.handle_platform_event(event);
        }

        loop {
            match transport.stack.next_ble_event() {
                Ok(Some(event)) => self.dispatch(transport, event),
                Ok(None) => break,
                Err(error) => fatal("fetch BLE event", error),
            }
        }
    }

    /// Handle one BLE event
    pub fn dispatch<S: RadioStack>(&self, transport: &Transport<S>, event: BleEvent) {
        crate::debug!("BLE event: {:?}", event);
        let stack = &transport.stack;

        match event {
            BleEvent::Connected { conn } => self.handle_connected(transport, conn),
            BleEvent::Disconnected { conn, reason } => {
                self.handle_disconnected(transport, conn, reason)
            }
            BleEvent::PhyUpdateRequest { conn } => {
                self.ensure_active(transport, conn);
                check("reply PHY update", stack.reply_phy_update(conn, Phy::Auto));
            }
            BleEvent::MtuExchangeRequest {
                conn,
                client_rx_mtu,
            } => {
                self.ensure_active(transport, conn);
                check(
                    "reply MTU exchange",
                    stack.reply_mtu_exchange(conn, LOCAL_MAX_MTU),
                );
                let payload = transport.link.record_mtu(LOCAL_MAX_MTU, client_rx_mtu);
                log::info!("BLE: MTU {} requested, payload {} bytes", client_rx_mtu, payload);
            }
            BleEvent::Write { conn, handle, data } => {
                self.ensure_active(transport, conn);
                self.handle_write(transport, handle, &data);
            }
            BleEvent::GattServerTimeout { conn } => {
                self.ensure_active(transport, conn);
                log::warn!("BLE: GATT server timeout, disconnecting");
                check(
                    "disconnect on GATT timeout",
                    stack.disconnect(conn, DisconnectReason::RemoteUserTerminated),
                );
            }
            BleEvent::SystemAttributesMissing { conn } => {
                self.ensure_active(transport, conn);
                check("set system attributes", stack.set_system_attributes(conn));
            }
            BleEvent::SecurityParamsRequest { conn } => {
                self.ensure_active(transport, conn);
                check(
                    "reject pairing",
                    stack.reply_sec_params_not_supported(conn),
                );
            }
            BleEvent::SecurityInfoRequest { conn } => {
                self.ensure_active(transport, conn);
                check("reply security info", stack.reply_sec_info_none(conn));
            }
            BleEvent::SecurityRequest { conn } => {
                self.ensure_active(transport, conn);
                check("answer security request", stack.authenticate_declined(conn));
            }
            BleEvent::AuthKeyRequest { conn } => {
                self.ensure_active(transport, conn);
                check("reply auth key", stack.reply_auth_key_none(conn));
            }
            BleEvent::DataLengthUpdateRequest { conn } => {
                self.ensure_active(transport, conn);
                check(
                    "reply data length update",
                    stack.reply_data_length_update(conn),
                );
            }
            // Peripheral only, these belong to the central role
            BleEvent::GattClientTimeout { .. }
            | BleEvent::ConnParamUpdateRequest { .. }
            | BleEvent::UserMemRequest { .. } => fatal("client-role event", event),
            BleEvent::Unknown(id) => {
                crate::debug!("BLE: ignoring event 0x{:04x}", id);
            }
        }
    }

    /// Acknowledge a platform event
    pub fn handle_platform_event(&self, event: PlatformEvent) {
        match event {
            PlatformEvent::FlashOperationSuccess => crate::debug!("flash operation done"),
            PlatformEvent::FlashOperationError => log::warn!("flash operation failed"),
            PlatformEvent::Other(id) => crate::debug!("platform event {}", id),
        }
    }

    fn handle_connected<S: RadioStack>(&self, transport: &Transport<S>, conn: ConnHandle) {
        if let Err(violation) = transport.link.connect(conn) {
            fatal("connect", violation);
        }
        log::info!("BLE: connected, handle {}", conn);

        // Shut down while this connection was being set up
        if transport.link.is_stopped() {
            transport.drop_connection(conn, "disconnect after shutdown");
            return;
        }

        let stack = &transport.stack;
        let params = match stack.preferred_conn_params() {
            Ok(params) => params,
            Err(error) => fatal("read preferred connection parameters", error),
        };
        check(
            "update connection parameters",
            stack.update_conn_params(conn, &params),
        );
        check("set system attributes", stack.set_system_attributes(conn));
    }

    fn handle_disconnected<S: RadioStack>(
        &self,
        transport: &Transport<S>,
        conn: ConnHandle,
        reason: u8,
    ) {
        if let Err(violation) = transport.link.disconnect(conn) {
            fatal("disconnect", violation);
        }
        transport.clear_notifications();
        log::info!("BLE: disconnected, handle {} reason 0x{:02x}", conn, reason);

        if !transport.link.is_stopped() {
            transport.start_advertising();
        }
    }

    fn handle_write<S: RadioStack>(&self, transport: &Transport<S>, handle: u16, data: &[u8]) {
        match transport.services.route(handle) {
            WriteTarget::Inbound(channel) => {
                let accepted = transport.buffers(channel).rx.push_slice(data);
                if accepted < data.len() {
                    log::warn!(
                        "BLE: {:?} inbound full, dropped {} bytes",
                        channel,
                        data.len() - accepted
                    );
                }
            }
            WriteTarget::NotifyConfig(channel) => {
                let enabled = match data {
                    [lo, hi, ..] => u16::from_le_bytes([*lo, *hi]) & CCCD_NOTIFY != 0,
                    _ => false,
                };
                crate::debug!("BLE: {:?} notifications {}", channel, enabled);
                transport.set_notifications(channel, enabled);
            }
            WriteTarget::Other => {
                crate::debug!("BLE: write to unowned handle 0x{:04x}", handle);
            }
        }
    }

    fn ensure_active<S: RadioStack>(&self, transport: &Transport<S>, conn: ConnHandle) {
        if let Err(violation) = transport.link.ensure_active(conn) {
            fatal("event for inactive connection", violation);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RadioStack> Transport<S> {
    /// Entry point for the stack's event-ready interrupt
    pub fn on_radio_event(&self) {
        EventDispatcher::new().service(self);
    }
}
