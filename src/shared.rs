use crate::Multiplexer;
use crate::mutex::PortMutex;
use core::cell::RefCell;
use core::fmt::Debug;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

/// Errors from a channel proxy: either routing the channel or using the terminal failed.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError<S, T> {
    Select(S),
    Terminal(T),
}

impl<S: Debug, T: digital::Error> digital::Error for ChannelError<S, T> {
    fn kind(&self) -> digital::ErrorKind {
        match self {
            ChannelError::Terminal(e) => e.kind(),
            ChannelError::Select(_) => digital::ErrorKind::Other,
        }
    }
}

impl<S: Debug, T: pwm::Error> pwm::Error for ChannelError<S, T> {
    fn kind(&self) -> pwm::ErrorKind {
        match self {
            ChannelError::Terminal(e) => e.kind(),
            ChannelError::Select(_) => pwm::ErrorKind::Other,
        }
    }
}

/// High-level wrapper: a multiplexer behind a PortMutex (e.g. RefCell), so
/// every channel can be handed out as its own pin.
pub struct SharedMux<M> {
    mux: M,
}

impl<M, X> SharedMux<M>
where
    M: PortMutex<Port = X>,
    X: Multiplexer,
{
    pub fn new(mux: X) -> Self {
        Self {
            mux: M::create(mux),
        }
    }

    /// A pin proxy for `channel`, or `None` if the multiplexer has no such channel.
    pub fn channel(&self, channel: u8) -> Option<MuxChannel<'_, M>> {
        let channels = self.mux.lock(|mux| mux.channels());
        (u16::from(channel) < channels).then(|| MuxChannel::new(&self.mux, channel))
    }

    /// Proxies for channels `0..C`, or `None` if there are fewer than `C` channels.
    pub fn split<const C: usize>(&self) -> Option<[MuxChannel<'_, M>; C]> {
        let channels = self.mux.lock(|mux| mux.channels());
        if C > usize::from(channels) {
            return None;
        }
        // C <= 256 here, so every index fits a u8
        Some(core::array::from_fn(|i| MuxChannel::new(&self.mux, i as u8)))
    }

    /// Run `f` on the multiplexer under the lock.
    pub fn lock<R>(&self, f: impl FnOnce(&mut X) -> R) -> R {
        self.mux.lock(f)
    }
}

impl<X: Multiplexer> SharedMux<RefCell<X>> {
    pub fn into_inner(self) -> X {
        self.mux.into_inner()
    }
}

/// A pin proxy for one channel.
///
/// Each operation selects the channel (including the settle delay) and then
/// performs the same operation on the terminal, all under one lock.
pub struct MuxChannel<'a, M> {
    mux: &'a M,
    channel: u8,
}

impl<'a, M, X> MuxChannel<'a, M>
where
    M: PortMutex<Port = X>,
    X: Multiplexer,
{
    pub(crate) fn new(mux: &'a M, channel: u8) -> Self {
        Self { mux, channel }
    }

    pub fn number(&self) -> u8 {
        self.channel
    }

    fn with_selected<R, E>(
        &self,
        f: impl FnOnce(&mut X::Terminal) -> Result<R, E>,
    ) -> Result<R, ChannelError<X::Error, E>> {
        let channel = self.channel;
        self.mux.lock(|mux| {
            let terminal = mux.select(channel).map_err(ChannelError::Select)?;
            f(terminal).map_err(ChannelError::Terminal)
        })
    }
}

impl<M, X> digital::ErrorType for MuxChannel<'_, M>
where
    M: PortMutex<Port = X>,
    X: Multiplexer,
    X::Terminal: digital::ErrorType,
{
    type Error = ChannelError<X::Error, <X::Terminal as digital::ErrorType>::Error>;
}

impl<M, X> OutputPin for MuxChannel<'_, M>
where
    M: PortMutex<Port = X>,
    X: Multiplexer,
    X::Terminal: OutputPin,
{
    fn set_low(&mut self) -> Result<(), <Self as digital::ErrorType>::Error> {
        self.with_selected(|t| t.set_low())
    }

    fn set_high(&mut self) -> Result<(), <Self as digital::ErrorType>::Error> {
        self.with_selected(|t| t.set_high())
    }
}

impl<M, X> InputPin for MuxChannel<'_, M>
where
    M: PortMutex<Port = X>,
    X: Multiplexer,
    X::Terminal: InputPin,
{
    fn is_high(&mut self) -> Result<bool, <Self as digital::ErrorType>::Error> {
        self.with_selected(|t| t.is_high())
    }

    fn is_low(&mut self) -> Result<bool, <Self as digital::ErrorType>::Error> {
        self.with_selected(|t| t.is_low())
    }
}

impl<M, X> pwm::ErrorType for MuxChannel<'_, M>
where
    M: PortMutex<Port = X>,
    X: Multiplexer,
    X::Terminal: pwm::ErrorType,
{
    type Error = ChannelError<X::Error, <X::Terminal as pwm::ErrorType>::Error>;
}

impl<M, X> SetDutyCycle for MuxChannel<'_, M>
where
    M: PortMutex<Port = X>,
    X: Multiplexer,
    X::Terminal: SetDutyCycle,
{
    fn max_duty_cycle(&self) -> u16 {
        self.mux.lock(|mux| mux.terminal().max_duty_cycle())
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), <Self as pwm::ErrorType>::Error> {
        self.with_selected(|t| t.set_duty_cycle(duty))
    }
}
