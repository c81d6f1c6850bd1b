//! Controller models: geometry, init tables and addressing commands.

use embedded_hal::delay::DelayNs;

use crate::clip::AddressWindow;
use crate::encoder::command;
use crate::error::PanelError;
use crate::transport::Session;

pub mod ili9488;
pub mod ssd2119;

pub use ili9488::{Cmd as Ili9488Cmd, Ili9488};
pub use ssd2119::{Reg as Ssd2119Reg, Ssd2119};

/// Fixed panel dimensions. Pixels are always 16-bit RGB565.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u16,
    pub height: u16,
}

impl Geometry {
    pub const BITS_PER_PIXEL: u8 = 16;

    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// One entry of an init table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitStep {
    /// Command with inline parameters
    Cmd(u8, &'static [u8]),
    DelayMs(u32),
}

/// Per-controller constants and the addressing sequence.
///
/// The init tables are split by [`crate::init::InitState`] phase; a phase a
/// controller has no commands for is empty.
pub trait Model {
    const NAME: &'static str;
    const GEOMETRY: Geometry;
    /// Command whose parameter stream is raw pixel data.
    const WRITE_MEMORY: u8;

    /// Reset line hold time.
    const RESET_PULSE_US: u32;
    /// Wait after releasing reset.
    const RESET_SETTLE_MS: u32;

    const SOFT_RESET: &'static [InitStep];
    const CONFIGURE: &'static [InitStep];
    const SLEEP_EXIT: &'static [InitStep];
    const DISPLAY_ON: &'static [InitStep];

    /// Program the GRAM window and position the write pointer at its start.
    fn set_address_window<S: Session>(session: &mut S, window: &AddressWindow) -> Result<(), PanelError<S::Error>>;
}

/// Run one init table through the encoder.
pub(crate) fn run_steps<S: Session>(
    session: &mut S,
    steps: &[InitStep],
    delay: &mut impl DelayNs,
) -> Result<(), PanelError<S::Error>> {
    for step in steps {
        match *step {
            InitStep::Cmd(cmd, params) => command(session, cmd, params)?,
            InitStep::DelayMs(ms) => delay.delay_ms(ms),
        }
    }
    Ok(())
}
