#![cfg_attr(not(test), no_std)]

pub mod buffer;
pub mod config;
pub mod debug;
pub mod dispatcher;
pub mod fatal;
pub mod gap;
pub mod gatt;
pub mod io;
pub mod protocol;
pub mod stack;
pub mod transport;

pub use dispatcher::EventDispatcher;
pub use gap::LinkStatus;
pub use gatt::Channel;
pub use io::ConsoleIo;
pub use protocol::{MediaWriter, PacketFlag};
pub use stack::{BleEvent, RadioStack, StackError};
pub use transport::{Transport, TransportConfig, TransportError};
