//! Unrecoverable errors
//!
//! Protocol violations and unexpected stack errors leave the link in a state
//! that cannot be repaired in place. They are logged and then handed to the
//! panic handler, which halts or resets the device.

use core::fmt::Debug;

use crate::stack::StackError;

/// Log `detail` and halt.
#[cold]
#[track_caller]
pub fn fatal(context: &str, detail: impl Debug) -> ! {
    log::error!("fatal: {}: {:?}", context, detail);
    panic!("{}: {:?}", context, detail)
}

/// Halt unless the stack call succeeded.
#[track_caller]
pub fn check(context: &str, result: Result<(), StackError>) {
    if let Err(error) = result {
        fatal(context, error);
    }
}
