//! A terminal pin routed through an N select-line multiplexer.

use crate::driver::{BuildError, MuxError, SelectLines};
use crate::{MAX_SELECT_LINES, Multiplexer};
use core::convert::Infallible;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// One terminal pin addressed as `2^N` channels through N select lines.
///
/// `T` is the pin capability wired to the multiplexer's common terminal
/// (digital in/out, PWM, ADC channel, ...). It is never interpreted here.
/// [`select`](Self::select) routes a channel and hands `T` back once the
/// multiplexer has settled.
///
/// Dropping a `MuxPin` drops its select lines in owned mode and leaves them
/// with the caller in borrowed mode.
pub struct MuxPin<'a, T, S, D> {
    terminal: T,
    select: SelectLines<'a, S>,
    delay: D,
    settle_us: u32,
}

impl<'a, T, S, D> MuxPin<'a, T, S, D> {
    /// Create a multiplexed pin driving caller-owned select lines.
    ///
    /// `lines[0]` carries the least significant channel bit. The slice must
    /// hold between 1 and [`MAX_SELECT_LINES`] lines; this is only checked in
    /// debug builds.
    pub fn borrowed(terminal: T, lines: &'a mut [S], delay: D) -> Self {
        debug_assert!(
            !lines.is_empty() && lines.len() <= MAX_SELECT_LINES,
            "a multiplexer needs 1..={} select lines",
            MAX_SELECT_LINES
        );
        Self::from_lines(terminal, SelectLines::Borrowed(lines), delay)
    }

    /// Create a multiplexed pin that takes ownership of its select lines.
    pub fn owned(
        terminal: T,
        lines: impl IntoIterator<Item = S>,
        delay: D,
    ) -> Result<Self, BuildError<Infallible>> {
        let lines = SelectLines::try_collect(lines, Ok::<S, Infallible>)?;
        Ok(Self::from_lines(terminal, lines, delay))
    }

    /// Create a multiplexed pin, building each select line from a raw pin
    /// identifier.
    ///
    /// If any line fails to build, the lines built before it are released and
    /// the error is returned.
    pub fn from_pin_ids<I>(
        terminal: T,
        ids: impl IntoIterator<Item = I>,
        delay: D,
    ) -> Result<Self, BuildError<<S as TryFrom<I>>::Error>>
    where
        S: TryFrom<I>,
    {
        let lines = SelectLines::try_collect(ids, S::try_from)?;
        Ok(Self::from_lines(terminal, lines, delay))
    }

    fn from_lines(terminal: T, select: SelectLines<'a, S>, delay: D) -> Self {
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "mux: {=usize} select lines, owned: {=bool}",
            select.len(),
            select.is_owned()
        );
        Self {
            terminal,
            select,
            delay,
            settle_us: 0,
        }
    }

    /// Wait `us` microseconds after every channel change before handing out
    /// the terminal. Defaults to 0.
    #[must_use]
    pub fn with_settle_delay_us(mut self, us: u32) -> Self {
        self.settle_us = us;
        self
    }

    pub fn settle_delay_us(&self) -> u32 {
        self.settle_us
    }

    /// Number of addressable channels, `2^N`.
    pub fn channels(&self) -> u16 {
        1 << self.select.len().min(MAX_SELECT_LINES)
    }

    pub fn is_owned(&self) -> bool {
        self.select.is_owned()
    }

    pub fn select_lines(&self) -> &[S] {
        self.select.as_slice()
    }

    /// The terminal, without selecting anything first.
    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    /// The terminal, without selecting anything first. Nothing guarantees the
    /// multiplexer has settled.
    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    /// Take the multiplexer apart.
    pub fn release(self) -> (T, SelectLines<'a, S>, D) {
        (self.terminal, self.select, self.delay)
    }
}

impl<T, S, D> MuxPin<'_, T, S, D>
where
    S: OutputPin,
    D: DelayNs,
{
    /// Route `channel` to the terminal and return the terminal.
    ///
    /// Every select line is rewritten on every call, even when the channel has
    /// not changed, then the settle delay runs once. Channels outside
    /// `0..2^N` are rejected before any line is touched.
    pub fn select(&mut self, channel: u8) -> Result<&mut T, MuxError<S::Error>> {
        let channels = self.channels();
        if u16::from(channel) >= channels {
            return Err(MuxError::ChannelOutOfRange { channel, channels });
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("mux: select channel {=u8}", channel);

        self.select.write(channel).map_err(MuxError::Pin)?;
        self.delay.delay_us(self.settle_us);
        Ok(&mut self.terminal)
    }
}

impl<T, S, D> Multiplexer for MuxPin<'_, T, S, D>
where
    S: OutputPin,
    D: DelayNs,
{
    type Terminal = T;
    type Error = MuxError<S::Error>;

    fn channels(&self) -> u16 {
        MuxPin::channels(self)
    }

    fn select(&mut self, channel: u8) -> Result<&mut T, Self::Error> {
        MuxPin::select(self, channel)
    }

    fn terminal(&self) -> &T {
        MuxPin::terminal(self)
    }
}
