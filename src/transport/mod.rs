//! BLE byte-stream transport
//!
//! Owns everything the link needs: the radio stack handle, connection state,
//! registered service handles, the advertising payload and one pair of ring
//! buffers per channel.
//!
//! Two contexts touch a [`Transport`]:
//! - the radio event handler ([`Transport::on_radio_event`]), run from the
//!   stack's event interrupt. It is the only writer of connection state and
//!   the only producer into the inbound rings.
//! - application code on the main loop, which produces into the outbound
//!   rings and consumes from the inbound ones.
//!
//! There is no "uninitialised" value: a `Transport` only exists once
//! [`Transport::init`] has registered the services and started advertising.

mod drain;
mod reader;
mod sender;

use core::sync::atomic::{AtomicBool, Ordering};

use crate::buffer::SharedRing;
use crate::config::buffers::RING_CAPACITY;
use crate::config::gap;
use crate::fatal::{check, fatal};
use crate::gap::{AdvertisingData, LinkState, LinkStatus};
use crate::gatt::{Channel, ChannelHandles, ServiceTable};
use crate::stack::{
    AdvHandle, AdvParams, ConnHandle, ConnParams, DisconnectReason, RadioStack, StackError,
};

/// Errors a caller of the transport can recover from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Packet does not fit in one notification at the negotiated MTU
    PacketTooLarge { len: usize, max: usize },
    /// Device name leaves no room for the rest of the advertising payload
    AdvertisingPayloadTooLong,
    /// Media header does not fit in the first packet
    HeaderTooLarge,
}

impl embedded_io::Error for TransportError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            TransportError::PacketTooLarge { .. } | TransportError::HeaderTooLarge => {
                embedded_io::ErrorKind::InvalidInput
            }
            TransportError::AdvertisingPayloadTooLong => embedded_io::ErrorKind::Other,
        }
    }
}

/// Settings applied when the transport starts
#[derive(Debug, Clone, Copy)]
pub struct TransportConfig {
    /// GAP device name, also placed in the advertising payload
    pub device_name: &'static str,
    /// Connection parameters requested from every central
    pub conn_params: ConnParams,
    /// Advertising interval
    pub adv_params: AdvParams,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            device_name: gap::DEVICE_NAME,
            conn_params: ConnParams::default(),
            adv_params: AdvParams::default(),
        }
    }
}

/// Inbound and outbound ring for one channel
pub(crate) struct ChannelBuffers {
    pub(crate) rx: SharedRing<RING_CAPACITY>,
    pub(crate) tx: SharedRing<RING_CAPACITY>,
}

impl ChannelBuffers {
    const fn new() -> Self {
        Self {
            rx: SharedRing::new(),
            tx: SharedRing::new(),
        }
    }
}

/// The transport context
pub struct Transport<S: RadioStack> {
    pub(crate) stack: S,
    pub(crate) link: LinkState,
    pub(crate) services: ServiceTable,
    pub(crate) adv_handle: AdvHandle,
    adv_data: AdvertisingData,
    console: ChannelBuffers,
    raw: ChannelBuffers,
    notifications: [AtomicBool; 2],
}

impl<S: RadioStack> Transport<S> {
    /// Register both services, build the advertising payload and start
    /// advertising.
    ///
    /// Any stack error here is fatal: the firmware cannot run without its
    /// services. An oversized device name is reported to the caller.
    pub fn init(stack: S, config: TransportConfig) -> Result<Self, TransportError> {
        // Only the console service is advertised
        let console_uuid = Channel::Console.service().service;
        let adv_data = AdvertisingData::for_device(config.device_name, console_uuid)
            .map_err(|_| TransportError::AdvertisingPayloadTooLong)?;

        check("set device name", stack.set_device_name(config.device_name));
        check(
            "set preferred connection parameters",
            stack.set_preferred_conn_params(&config.conn_params),
        );

        let services = match ServiceTable::register(&stack) {
            Ok(services) => services,
            Err(error) => fatal("register services", error),
        };

        let adv_handle = match stack.configure_advertising(adv_data.as_bytes(), &config.adv_params) {
            Ok(handle) => handle,
            Err(error) => fatal("configure advertising", error),
        };

        let transport = Self {
            stack,
            link: LinkState::new(),
            services,
            adv_handle,
            adv_data,
            console: ChannelBuffers::new(),
            raw: ChannelBuffers::new(),
            notifications: [AtomicBool::new(false), AtomicBool::new(false)],
        };
        transport.start_advertising();

        Ok(transport)
    }

    /// True while a central is connected
    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Bytes per notification at the current MTU.
    ///
    /// Not reset on disconnect: a reconnect that skips the MTU exchange keeps
    /// the previous value.
    pub fn negotiated_payload_size(&self) -> u16 {
        self.link.payload_size()
    }

    pub fn status(&self) -> LinkStatus {
        self.link.status()
    }

    /// Whether the peer has enabled notifications on `channel`'s TX characteristic
    pub fn notifications_enabled(&self, channel: Channel) -> bool {
        self.notifications[channel.index()].load(Ordering::Relaxed)
    }

    /// Handles the stack assigned to `channel`
    pub fn handles(&self, channel: Channel) -> &ChannelHandles {
        self.services.get(channel)
    }

    /// The advertising payload built at init
    pub fn advertising_payload(&self) -> &[u8] {
        self.adv_data.as_bytes()
    }

    /// The underlying radio stack
    pub fn stack(&self) -> &S {
        &self.stack
    }

    /// Stop the link ahead of power-down.
    ///
    /// Stops advertising and asks the stack to drop any connection. The
    /// disconnect event that follows will not restart advertising.
    pub fn shutdown(&self) {
        if self.link.is_stopped() {
            return;
        }
        self.link.set_stopped();

        if self.link.is_advertising() {
            match self.stack.stop_advertising(self.adv_handle) {
                // A central connected and the stack stopped advertising already
                Ok(()) | Err(StackError::InvalidState) => {}
                Err(error) => fatal("stop advertising", error),
            }
            self.link.set_advertising(false);
        }

        if let Some(conn) = self.link.connection() {
            self.drop_connection(conn, "disconnect on shutdown");
        }
        log::info!("BLE: shut down");
    }

    /// Ask the stack to drop `conn`, tolerating a link that is already going down
    pub(crate) fn drop_connection(&self, conn: ConnHandle, context: &str) {
        match self.stack.disconnect(conn, DisconnectReason::RemoteUserTerminated) {
            Ok(()) | Err(StackError::InvalidState) | Err(StackError::InvalidConnHandle) => {}
            Err(error) => fatal(context, error),
        }
    }

    pub(crate) fn start_advertising(&self) {
        check("start advertising", self.stack.start_advertising(self.adv_handle));
        self.link.set_advertising(true);
        log::info!("BLE: advertising");
    }

    pub(crate) fn buffers(&self, channel: Channel) -> &ChannelBuffers {
        match channel {
            Channel::Console => &self.console,
            Channel::Raw => &self.raw,
        }
    }

    pub(crate) fn set_notifications(&self, channel: Channel, enabled: bool) {
        self.notifications[channel.index()].store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn clear_notifications(&self) {
        for channel in Channel::ALL {
            self.set_notifications(channel, false);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::stack::traits::mock::{MockStack, StackCall};

    #[test]
    fn test_init_starts_advertising() {
        let transport = transport();

        assert!(!transport.is_connected());
        assert_eq!(transport.status(), LinkStatus::Advertising);

        let stack = transport.stack();
        assert_eq!(
            stack.calls().first(),
            Some(&StackCall::SetDeviceName("Monocle".into()))
        );
        assert_eq!(stack.count_calls(|c| matches!(c, StackCall::StartAdvertising(_))), 1);
        assert_eq!(
            stack.advertising_payload().as_deref(),
            Some(transport.advertising_payload())
        );
    }

    #[test]
    fn test_init_rejects_long_name() {
        let config = TransportConfig {
            device_name: "Name-That-Cannot-Possibly-Fit",
            ..TransportConfig::default()
        };

        let result = Transport::init(MockStack::new(), config);
        assert!(matches!(result, Err(TransportError::AdvertisingPayloadTooLong)));
    }

    #[test]
    #[should_panic(expected = "register services")]
    fn test_init_registration_failure_is_fatal() {
        let stack = MockStack::new();
        // Device name and connection parameters go through, the first service does not
        stack.fail_reply_after(2, StackError::NoMem);

        let _ = Transport::init(stack, TransportConfig::default());
    }

    #[test]
    #[should_panic(expected = "start advertising")]
    fn test_init_advertising_failure_is_fatal() {
        let stack = MockStack::new();
        // name, conn params, 2 x (service + 2 characteristics), configure
        stack.fail_reply_after(9, StackError::InvalidParam);

        let _ = Transport::init(stack, TransportConfig::default());
    }

    #[test]
    fn test_shutdown_while_advertising() {
        let transport = transport();
        transport.stack().clear_history();

        transport.shutdown();
        transport.shutdown();

        assert_eq!(transport.status(), LinkStatus::Stopped);
        assert_eq!(
            transport.stack().calls(),
            [StackCall::StopAdvertising(transport.adv_handle)]
        );
    }

    #[test]
    fn test_shutdown_after_stack_stopped_advertising() {
        let transport = transport();
        // A central connected, but its event has not been handled yet
        transport.stack().fail_next_reply(StackError::InvalidState);

        transport.shutdown();

        assert_eq!(transport.status(), LinkStatus::Stopped);
        assert!(!transport.link.is_advertising());
    }

    #[test]
    #[should_panic(expected = "stop advertising")]
    fn test_shutdown_unexpected_stop_error_is_fatal() {
        let transport = transport();
        transport.stack().fail_next_reply(StackError::Internal(8));

        transport.shutdown();
    }

    #[test]
    fn test_connection_after_shutdown_is_dropped() {
        let transport = transport();
        transport.shutdown();
        transport.stack().clear_history();

        inject(&transport, crate::stack::BleEvent::Connected { conn: 5 });

        assert_eq!(transport.status(), LinkStatus::Stopped);
        assert_eq!(
            transport.stack().calls(),
            [StackCall::Disconnect(5, DisconnectReason::RemoteUserTerminated)]
        );

        inject(
            &transport,
            crate::stack::BleEvent::Disconnected { conn: 5, reason: 0x16 },
        );
        assert!(!transport.is_connected());
        assert_eq!(transport.status(), LinkStatus::Stopped);
        assert_eq!(
            transport
                .stack()
                .count_calls(|c| matches!(c, StackCall::StartAdvertising(_))),
            0
        );
    }

    #[test]
    fn test_shutdown_while_connected() {
        let transport = connected(3);

        transport.shutdown();
        assert_eq!(
            transport.stack().calls(),
            [StackCall::Disconnect(3, DisconnectReason::RemoteUserTerminated)]
        );

        // The resulting disconnect must not bring advertising back
        inject(
            &transport,
            crate::stack::BleEvent::Disconnected { conn: 3, reason: 0x16 },
        );
        assert_eq!(transport.status(), LinkStatus::Stopped);
        assert_eq!(
            transport
                .stack()
                .count_calls(|c| matches!(c, StackCall::StartAdvertising(_))),
            0
        );
    }
}
