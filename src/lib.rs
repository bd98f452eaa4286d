//! Drive a 2^N channel analog/digital multiplexer (CD74HC4067, 74HC4051, ...)
//! from N digital select lines and one terminal pin.
//!
//! ```ignore
//! // 16-channel input mux: terminal on one pin, four select lines.
//! let mut input = MuxPin::owned(terminal, [s0, s1, s2, s3], delay)?
//!     .with_settle_delay_us(1);
//! let reading = input.select(12)?.is_high()?;
//! ```
//!
//! Channels are numbered `0..2^N`. Select line 0 carries the least
//! significant bit of the channel index.
#![cfg_attr(not(test), no_std)]

pub mod driver;
pub mod mutex;
pub mod mux;
pub mod shared;

#[cfg(test)]
pub(crate) mod fakes;

pub use driver::{BuildError, MuxError, SelectLines};
pub use mux::MuxPin;
pub use shared::{ChannelError, MuxChannel, SharedMux};

/// Upper bound on select lines, so `2^N` channels fit a `u8` index.
pub const MAX_SELECT_LINES: usize = 8;

/// A device that routes one of several channels to a single terminal.
pub trait Multiplexer {
    /// The pin capability the selected channel is routed to.
    type Terminal;

    type Error: core::fmt::Debug;

    /// Number of addressable channels.
    fn channels(&self) -> u16;

    /// Route `channel` to the terminal and return it once it is safe to use.
    fn select(&mut self, channel: u8) -> Result<&mut Self::Terminal, Self::Error>;

    /// The terminal, without touching the select lines.
    fn terminal(&self) -> &Self::Terminal;
}
