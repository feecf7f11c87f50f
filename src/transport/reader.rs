//! Inbound side: blocking console reader and non-blocking polls

use crate::gatt::Channel;
use crate::stack::RadioStack;

use super::Transport;

impl<S: RadioStack> Transport<S> {
    /// Block until a console byte arrives and return it.
    ///
    /// This is the main loop's only idle point. While nothing has arrived it
    /// drains the outbound rings and, once there is nothing left it can
    /// send, sleeps until the next interrupt. Queued output that cannot go
    /// out because nobody is connected does not keep the core awake.
    pub fn read(&self) -> u8 {
        let rx = &self.buffers(Channel::Console).rx;

        loop {
            if let Some(byte) = rx.try_pop() {
                return byte;
            }

            self.flush_all();

            if rx.is_empty() && (self.tx_idle() || !self.link.is_connected()) {
                self.stack.wait_for_event();
            }
        }
    }

    /// Pop one inbound byte from `channel` without blocking
    pub fn try_read(&self, channel: Channel) -> Option<u8> {
        self.buffers(channel).rx.try_pop()
    }

    /// True if a console byte is waiting, so [`read`](Self::read) would not block
    pub fn is_read_pending(&self) -> bool {
        !self.buffers(Channel::Console).rx.is_empty()
    }

    /// Inbound bytes waiting on `channel`
    pub fn pending_rx(&self, channel: Channel) -> usize {
        self.buffers(channel).rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::traits::mock::MockStack;
    use crate::stack::{BleEvent, WriteData};
    use crate::transport::test_support::*;
    use crate::transport::Transport;

    fn peer_write(transport: &Transport<MockStack>, conn: u16, channel: Channel, bytes: &[u8]) {
        let handle = transport.handles(channel).rx.value;
        inject(
            transport,
            BleEvent::Write {
                conn,
                handle,
                data: WriteData::from_slice(bytes).unwrap(),
            },
        );
    }

    #[test]
    fn test_read_returns_buffered_bytes_in_order() {
        let transport = connected(5);
        peer_write(&transport, 5, Channel::Console, b"ok");

        assert!(transport.is_read_pending());
        assert_eq!(transport.read(), b'o');
        assert_eq!(transport.read(), b'k');
        assert!(!transport.is_read_pending());
        assert_eq!(transport.stack().waits(), 0);
    }

    #[test]
    fn test_try_read_per_channel() {
        let transport = connected(5);
        peer_write(&transport, 5, Channel::Raw, b"r");

        assert_eq!(transport.try_read(Channel::Console), None);
        assert!(!transport.is_read_pending());
        assert_eq!(transport.pending_rx(Channel::Raw), 1);
        assert_eq!(transport.try_read(Channel::Raw), Some(b'r'));
        assert_eq!(transport.try_read(Channel::Raw), None);
    }

    #[test]
    fn test_read_sleeps_until_event_arrives() {
        let transport = connected(5);
        transport.stack().set_wait_limit(usize::MAX);

        let byte = std::thread::scope(|s| {
            s.spawn(|| {
                // Stands in for the radio interrupt
                while transport.stack().waits() == 0 {
                    std::thread::yield_now();
                }
                peer_write(&transport, 5, Channel::Console, b"z");
            });
            transport.read()
        });

        assert_eq!(byte, b'z');
        assert!(transport.stack().waits() > 0);
    }

    #[test]
    fn test_read_drains_output_while_idle() {
        let transport = connected(5);
        transport.stack().set_wait_limit(usize::MAX);
        transport.write(Channel::Console, b">>> ");

        let byte = std::thread::scope(|s| {
            s.spawn(|| {
                while transport.stack().notified_bytes().is_empty() {
                    std::thread::yield_now();
                }
                peer_write(&transport, 5, Channel::Console, b"\r");
            });
            transport.read()
        });

        assert_eq!(byte, b'\r');
        assert_eq!(transport.stack().notified_bytes(), b">>> ");
    }

    #[test]
    fn test_read_while_disconnected_with_queued_output_sleeps() {
        let transport = transport();
        transport.stack().set_wait_limit(usize::MAX);
        transport.write(Channel::Console, b"pending");

        let byte = std::thread::scope(|s| {
            s.spawn(|| {
                while transport.stack().waits() == 0 {
                    std::thread::yield_now();
                }
                inject(&transport, BleEvent::Connected { conn: 8 });
                peer_write(&transport, 8, Channel::Console, b"x");
            });
            transport.read()
        });

        assert_eq!(byte, b'x');
        transport.flush(Channel::Console);
        assert_eq!(transport.stack().notified_bytes(), b"pending");
    }
}
