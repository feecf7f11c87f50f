//! Notification sender with busy-retry

use crate::config::ble::MAX_PAYLOAD;
use crate::fatal::fatal;
use crate::gatt::Channel;
use crate::stack::{RadioStack, StackError};

use super::{Transport, TransportError};

impl<S: RadioStack> Transport<S> {
    /// Send `data` as one notification on `channel`'s TX characteristic.
    ///
    /// Spins while the stack's transmit queue is full. A send that races a
    /// disconnect is dropped without error. Must not be called from the event
    /// handler: the retry loop waits on the radio draining its queue.
    pub(crate) fn send_chunk(&self, channel: Channel, data: &[u8]) {
        let handle = self.services.get(channel).tx.value;

        loop {
            // Re-read every attempt, the link may drop while we spin
            let Some(conn) = self.link.connection() else {
                log::debug!("BLE: dropped {} bytes, not connected", data.len());
                return;
            };

            match self.stack.notify(conn, handle, data) {
                Ok(()) => return,
                Err(StackError::Resources) => core::hint::spin_loop(),
                Err(StackError::InvalidState) | Err(StackError::InvalidConnHandle) => {
                    log::debug!("BLE: dropped {} bytes, link going down", data.len());
                    return;
                }
                Err(error) => fatal("send notification", error),
            }
        }
    }

    /// Send one caller-framed packet on `channel`.
    ///
    /// Anything still queued on the channel goes out first so packets never
    /// overtake buffered bytes. The packet must fit in a single notification.
    pub fn send_packet(&self, channel: Channel, packet: &[u8]) -> Result<(), TransportError> {
        let max = self.max_packet_len();
        if packet.len() > max {
            return Err(TransportError::PacketTooLarge {
                len: packet.len(),
                max,
            });
        }

        self.flush(channel);
        self.send_chunk(channel, packet);
        Ok(())
    }

    /// Largest packet [`send_packet`](Self::send_packet) accepts right now
    pub fn max_packet_len(&self) -> usize {
        (self.link.payload_size() as usize).min(MAX_PAYLOAD)
    }
}
