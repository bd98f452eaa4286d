//! Recording pins and delays for tests that care about ordering and drops.

use core::cell::{Cell, RefCell};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use std::rc::Rc;
use std::vec::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Write { line: usize, high: bool },
    DelayNs(u64),
    Duty(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeError;

impl digital::Error for FakeError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Shared log every fake of one test writes into.
#[derive(Debug, Clone, Default)]
pub struct Bench {
    events: Rc<RefCell<Vec<Event>>>,
    built: Rc<Cell<usize>>,
    dropped: Rc<Cell<usize>>,
}

impl Bench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&self, index: usize) -> RecordingLine {
        self.built.set(self.built.get() + 1);
        RecordingLine {
            index,
            bench: self.clone(),
            fail: false,
        }
    }

    pub fn failing_line(&self, index: usize) -> RecordingLine {
        let mut line = self.line(index);
        line.fail = true;
        line
    }

    pub fn lines<const N: usize>(&self) -> [RecordingLine; N] {
        core::array::from_fn(|i| self.line(i))
    }

    pub fn id(&self, index: usize) -> PinId {
        PinId {
            index,
            bench: self.clone(),
            valid: true,
        }
    }

    pub fn bad_id(&self, index: usize) -> PinId {
        PinId {
            valid: false,
            ..self.id(index)
        }
    }

    pub fn delay(&self) -> RecordingDelay {
        RecordingDelay {
            bench: self.clone(),
        }
    }

    pub fn pwm(&self) -> RecordingPwm {
        RecordingPwm {
            bench: self.clone(),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn built(&self) -> usize {
        self.built.get()
    }

    pub fn dropped(&self) -> usize {
        self.dropped.get()
    }

    /// Last level written to each of the first `n` lines.
    pub fn levels(&self, n: usize) -> Vec<Option<bool>> {
        let mut levels = std::vec![None; n];
        for event in self.events.borrow().iter() {
            if let Event::Write { line, high } = *event {
                if line < n {
                    levels[line] = Some(high);
                }
            }
        }
        levels
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

/// Select line that logs writes and counts its own drop.
#[derive(Debug)]
pub struct RecordingLine {
    index: usize,
    bench: Bench,
    fail: bool,
}

impl RecordingLine {
    fn write(&mut self, high: bool) -> Result<(), FakeError> {
        if self.fail {
            return Err(FakeError);
        }
        self.bench.push(Event::Write {
            line: self.index,
            high,
        });
        Ok(())
    }
}

impl Drop for RecordingLine {
    fn drop(&mut self) {
        self.bench.dropped.set(self.bench.dropped.get() + 1);
    }
}

impl digital::ErrorType for RecordingLine {
    type Error = FakeError;
}

impl OutputPin for RecordingLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

/// Raw pin number a `RecordingLine` can be built from.
#[derive(Debug)]
pub struct PinId {
    index: usize,
    bench: Bench,
    valid: bool,
}

impl TryFrom<PinId> for RecordingLine {
    type Error = FakeError;

    fn try_from(id: PinId) -> Result<Self, Self::Error> {
        if !id.valid {
            return Err(FakeError);
        }
        Ok(id.bench.line(id.index))
    }
}

#[derive(Debug)]
pub struct RecordingDelay {
    bench: Bench,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.bench.push(Event::DelayNs(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        self.bench.push(Event::DelayNs(u64::from(us) * 1_000));
    }
}

#[derive(Debug)]
pub struct RecordingPwm {
    bench: Bench,
}

impl pwm::ErrorType for RecordingPwm {
    type Error = core::convert::Infallible;
}

impl SetDutyCycle for RecordingPwm {
    fn max_duty_cycle(&self) -> u16 {
        1000
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.bench.push(Event::Duty(duty));
        Ok(())
    }
}
