//! Bus transports.
//!
//! Both physical links (the memory-mapped DBI type B register block and the
//! SPI bus with a data/command line) present the same two primitives to the
//! layers above: send one command with parameter bytes, and stream pixels
//! after the bulk-write command.
//!
//! A [`Transport`] hands out a [`Session`] for every logical operation. For
//! the serial link the session *is* the bus claim, and dropping it releases
//! the bus on every exit path.

use embedded_hal::delay::DelayNs;

use crate::clip::PixelRows;

pub mod register;
pub mod serial;

pub use register::{Mmio, RegisterBlock, RegisterTransport, Resource};
pub use serial::{SerialConfig, SerialPins, SerialTransport, TransferBuffer};

/// Command/data primitives, valid for the lifetime of one session.
pub trait Session {
    type Error;

    /// Send `cmd` followed by its parameter bytes.
    fn send_command(&mut self, cmd: u8, params: &[u8]) -> Result<(), Self::Error>;

    /// Send the bulk-write command `cmd`, then every pixel yielded by `rows`
    /// in order.
    fn send_bulk(&mut self, cmd: u8, rows: PixelRows<'_>) -> Result<(), Self::Error>;
}

/// A physical link to one panel controller.
pub trait Transport {
    type Error;
    type Session<'s>: Session<Error = Self::Error>
    where
        Self: 's;

    /// Every bulk pixel stream must hold a multiple of this many pixels.
    const PIXEL_ALIGN: usize = 1;

    /// Drive the controller's reset input. `true` asserts reset.
    fn set_reset(&mut self, asserted: bool) -> Result<(), Self::Error>;

    /// Claim the link for one logical operation.
    fn open(&mut self) -> Result<Self::Session<'_>, Self::Error>;

    /// Pulse reset: assert, hold `pulse_us`, release, wait `settle_ms`.
    fn hard_reset(&mut self, delay: &mut impl DelayNs, pulse_us: u32, settle_ms: u32) -> Result<(), Self::Error> {
        self.set_reset(true)?;
        delay.delay_us(pulse_us);
        self.set_reset(false)?;
        delay.delay_ms(settle_ms);
        Ok(())
    }
}
