//! Debug trace for radio events.
//!
//! Messages go to the `log` facade at debug level. The most recent one is also
//! kept in a small buffer so a diagnostics command can report what the radio
//! did last, even when no logger is installed.

use core::cell::RefCell;
use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::String;

/// Maximum length of a single debug message
pub const MAX_DEBUG_MSG_LEN: usize = 96;

/// Latest debug message, empty once taken
static DEBUG_BUFFER: Mutex<CriticalSectionRawMutex, RefCell<String<MAX_DEBUG_MSG_LEN>>> =
    Mutex::new(RefCell::new(String::new()));

/// Replace the stored message. Long messages are truncated.
pub fn write_debug(msg: &str) {
    DEBUG_BUFFER.lock(|cell| {
        let mut buffer = cell.borrow_mut();
        buffer.clear();
        for c in msg.chars() {
            if buffer.push(c).is_err() {
                break;
            }
        }
    });
}

/// Take the latest debug message, leaving the buffer empty.
pub fn take_debug_message() -> Option<String<MAX_DEBUG_MSG_LEN>> {
    DEBUG_BUFFER.lock(|cell| {
        let mut buffer = cell.borrow_mut();
        if buffer.is_empty() {
            None
        } else {
            let msg = buffer.clone();
            buffer.clear();
            Some(msg)
        }
    })
}

/// Truncating formatter into a fixed buffer
struct Truncating<'a>(&'a mut String<MAX_DEBUG_MSG_LEN>);

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Format, log and store a debug message.
///
/// This is the implementation behind the debug! macro.
pub fn debug_print(args: core::fmt::Arguments) {
    log::debug!("{}", args);

    let mut s: String<MAX_DEBUG_MSG_LEN> = String::new();
    let _ = Truncating(&mut s).write_fmt(args);
    write_debug(&s);
}

/// Log a debug message and keep it as the latest trace.
///
/// Usage: `debug!("event {:?}", event);`
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::debug::debug_print(format_args!($($arg)*))
    };
}
