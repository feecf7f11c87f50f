//! Media transfer framing over the raw channel
//!
//! A file goes out as a run of packets, each one notification long. Every
//! packet starts with a [`PacketFlag`]. The first packet then carries the
//! file header:
//!
//! ```text
//! +------+-----------+----------+-----------+---------+
//! | flag | size (LE) | name len | name      | data... |
//! | 1    | 4         | 1        | name len  |         |
//! +------+-----------+----------+-----------+---------+
//! ```
//!
//! Later packets carry the flag and data only.

use heapless::Vec;

use crate::config::ble::MAX_PAYLOAD;
use crate::gatt::Channel;
use crate::stack::RadioStack;
use crate::transport::{Transport, TransportError};

/// Position of a packet within a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketFlag {
    /// Whole file in one packet
    Small = 0,
    Start = 1,
    Middle = 2,
    End = 3,
}

impl PacketFlag {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(PacketFlag::Small),
            1 => Some(PacketFlag::Start),
            2 => Some(PacketFlag::Middle),
            3 => Some(PacketFlag::End),
            _ => None,
        }
    }
}

/// Header bytes in the first packet, flag included
pub fn header_len(name: &str) -> usize {
    1 + 4 + 1 + name.len()
}

/// Streams one file to the peer as framed packets.
///
/// Packet size is fixed from the negotiated payload size when the transfer
/// begins. Data is sent as packets fill; [`finish`](Self::finish) sends the
/// remainder.
pub struct MediaWriter<'a, S: RadioStack> {
    transport: &'a Transport<S>,
    packet: Vec<u8, MAX_PAYLOAD>,
    packet_len: usize,
    flag: PacketFlag,
}

impl<'a, S: RadioStack> MediaWriter<'a, S> {
    /// Start a transfer of `size` bytes named `name`.
    pub fn begin(
        transport: &'a Transport<S>,
        name: &str,
        size: u32,
    ) -> Result<Self, TransportError> {
        let packet_len = transport.max_packet_len();
        if name.len() > u8::MAX as usize || header_len(name) > packet_len {
            return Err(TransportError::HeaderTooLarge);
        }

        let mut packet = Vec::new();
        // Capacity checked above
        let _ = packet.push(PacketFlag::Start as u8);
        let _ = packet.extend_from_slice(&size.to_le_bytes());
        let _ = packet.push(name.len() as u8);
        let _ = packet.extend_from_slice(name.as_bytes());

        Ok(Self {
            transport,
            packet,
            packet_len,
            flag: PacketFlag::Start,
        })
    }

    /// Append file data, sending every packet that fills up.
    pub fn write(&mut self, mut data: &[u8]) -> Result<(), TransportError> {
        while !data.is_empty() {
            if self.packet.len() == self.packet_len {
                self.send()?;
            }
            let take = (self.packet_len - self.packet.len()).min(data.len());
            let _ = self.packet.extend_from_slice(&data[..take]);
            data = &data[take..];
        }
        Ok(())
    }

    /// Send the last packet.
    ///
    /// Flagged [`PacketFlag::End`], or [`PacketFlag::Small`] if the whole file
    /// fit in the first packet.
    pub fn finish(mut self) -> Result<(), TransportError> {
        self.flag = match self.flag {
            PacketFlag::Start => PacketFlag::Small,
            _ => PacketFlag::End,
        };
        self.send()
    }

    fn send(&mut self) -> Result<(), TransportError> {
        self.packet[0] = self.flag as u8;
        self.transport.send_packet(Channel::Raw, &self.packet)?;

        self.packet.truncate(1);
        self.flag = PacketFlag::Middle;
        Ok(())
    }
}
