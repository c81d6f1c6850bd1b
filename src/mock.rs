//! Recording doubles for the hardware traits. Every double appends to one
//! shared, ordered event log so tests can assert on cross-device ordering.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, SpiBus};

use crate::clip::PixelRows;
use crate::transport::register::{RegisterBlock, REG_COMMAND};
use crate::transport::{Session, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(u8, Vec<u8>),
    Bulk(u8, Vec<u16>),
    Reset(bool),
    Cs(bool),
    Dc(bool),
    Backlight(bool),
    Spi(Vec<u8>),
    DelayUs(u32),
    DelayMs(u32),
}

#[derive(Debug, Clone, Default)]
pub struct Log(Rc<RefCell<Vec<Event>>>);

impl Log {
    pub fn push(&self, e: Event) {
        self.0.borrow_mut().push(e);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Command bytes of every `Command`/`Bulk` event, in order.
    pub fn commands(&self) -> Vec<u8> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Command(c, _) | Event::Bulk(c, _) => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// SPI writes following the first single-byte write of `cmd`.
    pub fn spi_writes_after(&self, cmd: u8) -> Vec<Vec<u8>> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Spi(b) => Some(b.clone()),
                _ => None,
            })
            .skip_while(|b| b.as_slice() != [cmd])
            .skip(1)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

impl spi::Error for MockError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

impl digital::Error for MockError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PinRole {
    Cs,
    Dc,
    Reset,
    Backlight,
}

#[derive(Debug)]
pub struct MockPin {
    log: Log,
    role: PinRole,
    fail: bool,
}

impl MockPin {
    fn new(log: &Log, role: PinRole) -> Self {
        Self { log: log.clone(), role, fail: false }
    }

    pub fn cs(log: &Log) -> Self {
        Self::new(log, PinRole::Cs)
    }

    pub fn dc(log: &Log) -> Self {
        Self::new(log, PinRole::Dc)
    }

    pub fn reset(log: &Log) -> Self {
        Self::new(log, PinRole::Reset)
    }

    pub fn backlight(log: &Log) -> Self {
        Self::new(log, PinRole::Backlight)
    }

    /// Every write fails and records nothing.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn name(&self) -> &'static str {
        match self.role {
            PinRole::Cs => "cs",
            PinRole::Dc => "dc",
            PinRole::Reset => "reset",
            PinRole::Backlight => "backlight",
        }
    }

    fn set(&mut self, high: bool) -> Result<(), MockError> {
        if self.fail {
            return Err(MockError);
        }
        self.log.push(match self.role {
            PinRole::Cs => Event::Cs(high),
            PinRole::Dc => Event::Dc(high),
            PinRole::Reset => Event::Reset(high),
            PinRole::Backlight => Event::Backlight(high),
        });
        Ok(())
    }
}

impl digital::ErrorType for MockPin {
    type Error = MockError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), MockError> {
        self.set(false)
    }

    fn set_high(&mut self) -> Result<(), MockError> {
        self.set(true)
    }
}

#[derive(Debug)]
pub struct MockSpi {
    log: Log,
    ok_writes: Option<usize>,
}

impl MockSpi {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone(), ok_writes: None }
    }

    /// The next `n` writes succeed, every later one fails unrecorded.
    pub fn fail_after(&mut self, n: usize) {
        self.ok_writes = Some(n);
    }
}

impl spi::ErrorType for MockSpi {
    type Error = MockError;
}

impl SpiBus<u8> for MockSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), MockError> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), MockError> {
        if let Some(n) = self.ok_writes.as_mut() {
            if *n == 0 {
                return Err(MockError);
            }
            *n -= 1;
        }
        self.log.push(Event::Spi(words.to_vec()));
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), MockError> {
        read.fill(0);
        self.write(write)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), MockError> {
        let out = words.to_vec();
        words.fill(0);
        self.write(&out)
    }

    fn flush(&mut self) -> Result<(), MockError> {
        Ok(())
    }
}

/// Records `delay_us`/`delay_ms` calls; never sleeps.
#[derive(Debug)]
pub struct MockDelay {
    log: Log,
}

impl MockDelay {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone() }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_us(&mut self, us: u32) {
        self.log.push(Event::DelayUs(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.push(Event::DelayMs(ms));
    }
}

/// Session that records commands and flattened bulk writes.
#[derive(Debug)]
pub struct RecordingSession {
    log: Log,
    fail_on: Option<u8>,
}

impl RecordingSession {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone(), fail_on: None }
    }
}

impl Session for RecordingSession {
    type Error = MockError;

    fn send_command(&mut self, cmd: u8, params: &[u8]) -> Result<(), MockError> {
        if self.fail_on == Some(cmd) {
            return Err(MockError);
        }
        self.log.push(Event::Command(cmd, params.to_vec()));
        Ok(())
    }

    fn send_bulk(&mut self, cmd: u8, rows: PixelRows<'_>) -> Result<(), MockError> {
        if self.fail_on == Some(cmd) {
            return Err(MockError);
        }
        self.log.push(Event::Bulk(cmd, rows.flatten().copied().collect()));
        Ok(())
    }
}

/// Transport handing out [`RecordingSession`]s.
#[derive(Debug)]
pub struct RecordingTransport {
    log: Log,
    fail_on: Option<u8>,
    pub busy: bool,
}

impl RecordingTransport {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone(), fail_on: None, busy: false }
    }

    /// Sessions fail when asked to send `cmd`.
    pub fn failing_on(mut self, cmd: u8) -> Self {
        self.fail_on = Some(cmd);
        self
    }
}

impl Transport for RecordingTransport {
    type Error = MockError;
    type Session<'s>
        = RecordingSession
    where
        Self: 's;

    fn set_reset(&mut self, asserted: bool) -> Result<(), MockError> {
        self.log.push(Event::Reset(asserted));
        Ok(())
    }

    fn open(&mut self) -> Result<RecordingSession, MockError> {
        if self.busy {
            return Err(MockError);
        }
        Ok(RecordingSession { log: self.log.clone(), fail_on: self.fail_on })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    W8(usize, u8),
    W32(usize, u32),
    R32(usize),
}

#[derive(Debug, Default)]
struct RegState {
    ops: Vec<Reg>,
    read_value: u32,
}

/// Register block recording every access. Clones share one log.
#[derive(Debug, Clone, Default)]
pub struct RegLog(Rc<RefCell<RegState>>);

impl RegLog {
    pub fn take(&self) -> Vec<Reg> {
        core::mem::take(&mut self.0.borrow_mut().ops)
    }

    pub fn set_read_value(&self, v: u32) {
        self.0.borrow_mut().read_value = v;
    }

    /// Bytes written to the command register, in order.
    pub fn commands(&self) -> Vec<u8> {
        self.0
            .borrow()
            .ops
            .iter()
            .filter_map(|r| match r {
                Reg::W8(REG_COMMAND, c) => Some(*c),
                _ => None,
            })
            .collect()
    }
}

impl RegisterBlock for RegLog {
    fn write8(&mut self, offset: usize, value: u8) {
        self.0.borrow_mut().ops.push(Reg::W8(offset, value));
    }

    fn write32(&mut self, offset: usize, value: u32) {
        self.0.borrow_mut().ops.push(Reg::W32(offset, value));
    }

    fn read32(&mut self, offset: usize) -> u32 {
        let mut s = self.0.borrow_mut();
        s.ops.push(Reg::R32(offset));
        s.read_value
    }
}
