//! Low-level select-line handling: who owns the lines and what gets written to them.

use crate::MAX_SELECT_LINES;
use core::fmt::Debug;
use embedded_hal::digital::{Error as HalError, ErrorKind, OutputPin, PinState};
use heapless::Vec;

/// Errors from selecting a channel.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MuxError<E> {
    /// The channel index does not fit in the available select lines.
    ChannelOutOfRange { channel: u8, channels: u16 },
    /// Underlying error from a select line.
    Pin(E),
}

impl<E: HalError> HalError for MuxError<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            MuxError::Pin(e) => e.kind(),
            MuxError::ChannelOutOfRange { .. } => ErrorKind::Other,
        }
    }
}

/// Errors from building a multiplexer that owns its select lines.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BuildError<E> {
    /// No select lines were given.
    NoSelectLines,
    /// More than [`MAX_SELECT_LINES`] select lines were given.
    TooManySelectLines,
    /// A select line could not be constructed from its pin identifier.
    Pin(E),
}

impl<E: Debug> HalError for BuildError<E> {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// The select lines of a multiplexer, either owned or borrowed from the caller.
///
/// Owned lines are dropped together with the multiplexer. Borrowed lines stay
/// with the caller, who must keep them alive for as long as the borrow.
#[derive(Debug)]
pub enum SelectLines<'a, S> {
    Owned(Vec<S, MAX_SELECT_LINES>),
    Borrowed(&'a mut [S]),
}

impl<'a, S> SelectLines<'a, S> {
    /// Build owned lines one identifier at a time.
    ///
    /// Nothing is kept on failure: lines built so far are dropped before the
    /// error is returned.
    pub fn try_collect<I, E>(
        ids: impl IntoIterator<Item = I>,
        mut build: impl FnMut(I) -> Result<S, E>,
    ) -> Result<Self, BuildError<E>> {
        let mut lines = Vec::new();
        for id in ids {
            if lines.is_full() {
                return Err(BuildError::TooManySelectLines);
            }
            let line = build(id).map_err(BuildError::Pin)?;
            // capacity checked above
            let _ = lines.push(line);
        }
        if lines.is_empty() {
            return Err(BuildError::NoSelectLines);
        }
        Ok(SelectLines::Owned(lines))
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, SelectLines::Owned(_))
    }

    pub fn as_slice(&self) -> &[S] {
        match self {
            SelectLines::Owned(lines) => lines.as_slice(),
            SelectLines::Borrowed(lines) => &lines[..],
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [S] {
        match self {
            SelectLines::Owned(lines) => lines.as_mut_slice(),
            SelectLines::Borrowed(lines) => &mut lines[..],
        }
    }
}

impl<S: OutputPin> SelectLines<'_, S> {
    /// Drive every line with its bit of `channel`, line 0 taking the LSB.
    ///
    /// Lines past the width of `channel` are driven low.
    pub fn write(&mut self, channel: u8) -> Result<(), S::Error> {
        for (s, line) in self.as_mut_slice().iter_mut().enumerate() {
            let bit = u32::try_from(s)
                .ok()
                .and_then(|s| channel.checked_shr(s))
                .unwrap_or(0)
                & 1;
            line.set_state(PinState::from(bit == 1))?;
        }
        Ok(())
    }
}
