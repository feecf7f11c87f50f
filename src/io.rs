//! embedded-io wrapper for the console channel.
//!
//! Lets byte-oriented code (a REPL, `write!` formatting) run on top of the
//! transport without knowing about rings or notifications.

use embedded_io::{ErrorType, Read, ReadReady, Write, WriteReady};

use crate::config::buffers::RING_CAPACITY;
use crate::gatt::Channel;
use crate::stack::RadioStack;
use crate::transport::{Transport, TransportError};

/// Console stream over a [`Transport`].
pub struct ConsoleIo<'a, S: RadioStack> {
    transport: &'a Transport<S>,
}

impl<'a, S: RadioStack> ConsoleIo<'a, S> {
    pub fn new(transport: &'a Transport<S>) -> Self {
        Self { transport }
    }
}

impl<S: RadioStack> ErrorType for ConsoleIo<'_, S> {
    type Error = TransportError;
}

impl<S: RadioStack> Read for ConsoleIo<'_, S> {
    /// Blocks for the first byte, then takes whatever else is already buffered.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Some((first, rest)) = buf.split_first_mut() else {
            return Ok(0);
        };

        *first = self.transport.read();

        let mut count = 1;
        for slot in rest {
            match self.transport.try_read(Channel::Console) {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }
}

impl<S: RadioStack> ReadReady for ConsoleIo<'_, S> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.transport.is_read_pending())
    }
}

impl<S: RadioStack> Write for ConsoleIo<'_, S> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.transport.write(Channel::Console, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.transport.flush(Channel::Console);
        Ok(())
    }
}

impl<S: RadioStack> WriteReady for ConsoleIo<'_, S> {
    /// False when a write would have to drain the ring first.
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.transport.pending_tx(Channel::Console) < RING_CAPACITY - 1)
    }
}

impl<S: RadioStack> core::fmt::Write for ConsoleIo<'_, S> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.transport.write(Channel::Console, s.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{BleEvent, WriteData};
    use crate::transport::test_support::*;

    #[test]
    fn test_read_takes_everything_buffered() {
        let transport = connected(1);
        inject(
            &transport,
            BleEvent::Write {
                conn: 1,
                handle: transport.handles(Channel::Console).rx.value,
                data: WriteData::from_slice(b"ls\r").unwrap(),
            },
        );
        let mut io = ConsoleIo::new(&transport);

        assert!(io.read_ready().unwrap());
        let mut buf = [0u8; 8];
        let n = io.read(&mut buf).unwrap();

        assert_eq!(&buf[..n], b"ls\r");
        assert!(!io.read_ready().unwrap());
        assert_eq!(io.read(&mut []).unwrap(), 0);
    }

    #[test]
    fn test_write_then_flush() {
        let transport = connected(1);
        let mut io = ConsoleIo::new(&transport);

        io.write_all(b"ok\r\n").unwrap();
        assert!(transport.stack().notifications().is_empty());

        Write::flush(&mut io).unwrap();
        assert_eq!(transport.stack().notified_bytes(), b"ok\r\n");
    }

    #[test]
    fn test_fmt_write() {
        let transport = connected(1);
        let mut io = ConsoleIo::new(&transport);

        // Both Write traits have write_fmt, pick the formatting one
        core::fmt::Write::write_fmt(&mut io, format_args!("{} + {} = {}", 1, 2, 3)).unwrap();
        transport.flush(Channel::Console);

        assert_eq!(transport.stack().notified_bytes(), b"1 + 2 = 3");
    }

    #[test]
    fn test_write_ready_tracks_ring_space() {
        let transport = transport();
        let mut io = ConsoleIo::new(&transport);
        assert!(io.write_ready().unwrap());

        // Disconnected, so nothing drains
        transport.write(Channel::Console, &[0u8; RING_CAPACITY - 1]);
        assert!(!io.write_ready().unwrap());
    }
}
