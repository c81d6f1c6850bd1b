//! Panel drivers for the ILI9488 and SSD2119 LCD controllers on Zynq boards.
//!
//! Two transports carry the same command/data primitives: a memory-mapped
//! DBI type B register block ([`transport::RegisterTransport`]) and SPI with a
//! data/command line ([`transport::SerialTransport`]). Controller models,
//! the init sequence and the clipped blit engine sit on top of either.
//!
//! ```ignore
//! let mut panel = wiring::green_mango::bring_up(&bus, pins, backlight, &mut delay)?;
//! panel.sync(&framebuffer, None)?;
//! ```
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod backlight;
pub mod clip;
pub mod encoder;
pub mod error;
pub mod init;
pub mod models;
pub mod panel;
pub mod shell;
pub mod transport;
pub mod wiring;

#[cfg(feature = "graphics")]
pub mod framebuffer;

#[cfg(test)]
mod mock;

pub use backlight::{Backlight, GpioBacklight, PwmBacklight, PwmConfig, XlnxPwm};
pub use clip::ClipRect;
pub use encoder::command;
pub use error::{BacklightError, ErrorKind, PanelError, SerialError};
pub use init::{InitState, PanelInitializer};
pub use models::{Geometry, Ili9488, Ili9488Cmd, Model, Ssd2119, Ssd2119Reg};
pub use panel::{Ili9488Panel, Panel, Ssd2119Panel};
pub use shell::{CommandError, DisplayCommand};

#[cfg(feature = "graphics")]
pub use framebuffer::Framebuffer;
