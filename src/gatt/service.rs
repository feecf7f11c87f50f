//! Console and raw data service definitions
//!
//! Both services have the same shape:
//! - RX characteristic (write, write without response): peer to device
//! - TX characteristic (notify): device to peer
//!
//! Console service UUID: 6E400001-B5A3-F393-E0A9-E50E24DCCA9E (Nordic UART Service)
//! Raw service UUID: E5700001-7BAC-429A-B4CE-57FF900F479D

use crate::config::ble::MAX_PAYLOAD;
use crate::config::uuids;
use crate::stack::{AttrHandle, CharHandles, CharacteristicDef, CharacteristicKind, RadioStack, StackError};

/// One of the two byte streams carried over the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Interactive console (Nordic UART Service)
    Console,
    /// Bulk data from device to peer
    Raw,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Console, Channel::Raw];

    /// UUIDs of the service backing this channel
    pub fn service(self) -> &'static ServiceDef {
        match self {
            Channel::Console => &CONSOLE_SERVICE,
            Channel::Raw => &RAW_SERVICE,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Channel::Console => 0,
            Channel::Raw => 1,
        }
    }
}

/// UUIDs of a service and its two characteristics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDef {
    pub service: u128,
    pub rx: u128,
    pub tx: u128,
}

pub const CONSOLE_SERVICE: ServiceDef = ServiceDef {
    service: uuids::CONSOLE_SERVICE,
    rx: uuids::CONSOLE_RX,
    tx: uuids::CONSOLE_TX,
};

pub const RAW_SERVICE: ServiceDef = ServiceDef {
    service: uuids::RAW_SERVICE,
    rx: uuids::RAW_RX,
    tx: uuids::RAW_TX,
};

/// Handles the stack assigned to one registered service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelHandles {
    pub service: AttrHandle,
    pub rx: CharHandles,
    pub tx: CharHandles,
}

impl ServiceDef {
    /// Register the service and both characteristics with the stack
    pub fn register<S: RadioStack>(&self, stack: &S) -> Result<ChannelHandles, StackError> {
        let service = stack.add_service(self.service)?;

        let rx = stack.add_characteristic(
            service,
            &CharacteristicDef {
                uuid: self.rx,
                kind: CharacteristicKind::Write,
                max_len: MAX_PAYLOAD as u16,
            },
        )?;

        let tx = stack.add_characteristic(
            service,
            &CharacteristicDef {
                uuid: self.tx,
                kind: CharacteristicKind::Notify,
                max_len: MAX_PAYLOAD as u16,
            },
        )?;

        Ok(ChannelHandles { service, rx, tx })
    }
}

/// What a peer write landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    /// Value of a channel's RX characteristic
    Inbound(Channel),
    /// Notification configuration of a channel's TX characteristic
    NotifyConfig(Channel),
    /// Some attribute this transport does not own
    Other,
}

/// Handles of both services
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceTable {
    pub console: ChannelHandles,
    pub raw: ChannelHandles,
}

impl ServiceTable {
    /// Register the console service, then the raw service
    pub fn register<S: RadioStack>(stack: &S) -> Result<Self, StackError> {
        Ok(Self {
            console: CONSOLE_SERVICE.register(stack)?,
            raw: RAW_SERVICE.register(stack)?,
        })
    }

    pub fn get(&self, channel: Channel) -> &ChannelHandles {
        match channel {
            Channel::Console => &self.console,
            Channel::Raw => &self.raw,
        }
    }

    /// Find which channel endpoint an attribute handle belongs to
    pub fn route(&self, handle: AttrHandle) -> WriteTarget {
        for channel in Channel::ALL {
            let handles = self.get(channel);
            if handle == handles.rx.value {
                return WriteTarget::Inbound(channel);
            }
            if handles.tx.cccd == Some(handle) {
                return WriteTarget::NotifyConfig(channel);
            }
        }
        WriteTarget::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::traits::mock::{MockStack, StackCall};

    #[test]
    fn test_register_order() {
        let stack = MockStack::new();
        ServiceTable::register(&stack).unwrap();

        let calls = stack.calls();
        assert_eq!(
            calls,
            [
                StackCall::AddService(uuids::CONSOLE_SERVICE),
                StackCall::AddCharacteristic(uuids::CONSOLE_RX, CharacteristicKind::Write),
                StackCall::AddCharacteristic(uuids::CONSOLE_TX, CharacteristicKind::Notify),
                StackCall::AddService(uuids::RAW_SERVICE),
                StackCall::AddCharacteristic(uuids::RAW_RX, CharacteristicKind::Write),
                StackCall::AddCharacteristic(uuids::RAW_TX, CharacteristicKind::Notify),
            ]
        );
    }

    #[test]
    fn test_route_writes() {
        let stack = MockStack::new();
        let table = ServiceTable::register(&stack).unwrap();

        assert_eq!(
            table.route(table.console.rx.value),
            WriteTarget::Inbound(Channel::Console)
        );
        assert_eq!(table.route(table.raw.rx.value), WriteTarget::Inbound(Channel::Raw));
        assert_eq!(
            table.route(table.console.tx.cccd.unwrap()),
            WriteTarget::NotifyConfig(Channel::Console)
        );
        assert_eq!(
            table.route(table.raw.tx.cccd.unwrap()),
            WriteTarget::NotifyConfig(Channel::Raw)
        );
        // Writing the TX value itself is not something we act on
        assert_eq!(table.route(table.console.tx.value), WriteTarget::Other);
        assert_eq!(table.route(0xFFF0), WriteTarget::Other);
    }

    #[test]
    fn test_channel_service_definitions() {
        assert_eq!(Channel::Console.service(), &CONSOLE_SERVICE);
        assert_eq!(Channel::Raw.service().service, uuids::RAW_SERVICE);
    }

    #[test]
    fn test_register_failure_propagates() {
        let stack = MockStack::new();
        stack.fail_next_reply(StackError::NoMem);

        assert_eq!(ServiceTable::register(&stack), Err(StackError::NoMem));
    }
}
