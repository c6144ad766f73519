//! Command transport: the byte sink that reaches the remote device.
//!
//! Each emitted command is one ASCII byte.  Delivery is best effort: no
//! acknowledgement, no retry, no queueing.

pub mod serial;

use std::io;

use crate::hand::Command;

pub use serial::SerialLink;

/// A destination for emitted commands.
pub trait CommandSink {
    /// Write one command.  Errors are reported to the caller, never retried.
    fn send(&mut self, command: Command) -> io::Result<()>;

    /// Short human-readable name for log lines (e.g. the device path).
    fn describe(&self) -> String;
}
