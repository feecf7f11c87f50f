//! Outbound buffering and MTU-sized draining

use crate::config::ble::MAX_PAYLOAD;
use crate::gatt::Channel;
use crate::stack::RadioStack;

use super::Transport;

impl<S: RadioStack> Transport<S> {
    /// Queue `data` for transmission on `channel`.
    ///
    /// Bytes are only buffered here; they leave on the next [`flush`](Self::flush)
    /// or while the console reader idles. If the ring fills up this drains it
    /// in place, which never returns while disconnected.
    pub fn write(&self, channel: Channel, data: &[u8]) {
        let tx = &self.buffers(channel).tx;
        let mut rest = data;

        while !rest.is_empty() {
            let pushed = tx.push_slice(rest);
            rest = &rest[pushed..];

            if !rest.is_empty() {
                self.flush(channel);
                if !self.link.is_connected() {
                    core::hint::spin_loop();
                }
            }
        }
    }

    /// Send everything queued on `channel` in chunks of at most the
    /// negotiated payload size.
    ///
    /// Does nothing while disconnected; queued bytes wait for the next
    /// connection.
    pub fn flush(&self, channel: Channel) {
        let tx = &self.buffers(channel).tx;
        let mut chunk = [0u8; MAX_PAYLOAD];

        while self.link.is_connected() {
            // Re-read each round, an MTU exchange may land mid-drain
            let size = (self.link.payload_size() as usize).clamp(1, MAX_PAYLOAD);
            let len = tx.pop_into(&mut chunk[..size]);
            if len == 0 {
                break;
            }
            self.send_chunk(channel, &chunk[..len]);
        }
    }

    /// Flush both channels
    pub fn flush_all(&self) {
        for channel in Channel::ALL {
            self.flush(channel);
        }
    }

    /// Bytes waiting to be sent on `channel`
    pub fn pending_tx(&self, channel: Channel) -> usize {
        self.buffers(channel).tx.len()
    }

    pub(crate) fn tx_idle(&self) -> bool {
        Channel::ALL
            .iter()
            .all(|&channel| self.buffers(channel).tx.is_empty())
    }
}
