//! Parser for the board shell's `display` subcommands.
//!
//! ```text
//! write.rgb565 <hex addr>  <x1> <x2> <y1> <y2>
//! clear.rgb565 <hex color> <x1> <x2> <y1> <y2>
//! ```
//!
//! Coordinates are decimal, the address and color hexadecimal with an
//! optional `0x` prefix.

use core::convert::Infallible;
use core::fmt;

use log::debug;

use crate::backlight::Backlight;
use crate::clip::ClipRect;
use crate::error::PanelError;
use crate::models::Model;
use crate::panel::Panel;
use crate::transport::{RegisterBlock, RegisterTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCommand {
    /// Copy the pixels stored at a physical address into the region.
    WriteRgb565 { addr: usize, clip: ClipRect },
    /// Fill the region with one color.
    ClearRgb565 { color: u16, clip: ClipRect },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Wrong number of arguments.
    Usage,
    UnknownCommand,
    /// The named argument is not a number of the expected base and width.
    BadNumber(&'static str),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage => f.write_str(
                "usage: write.rgb565 <addr> <x1> <x2> <y1> <y2> | clear.rgb565 <color> <x1> <x2> <y1> <y2>",
            ),
            Self::UnknownCommand => f.write_str("unknown display command"),
            Self::BadNumber(what) => write!(f, "invalid {what}"),
        }
    }
}

fn hex<T>(arg: &str, what: &'static str, parse: fn(&str, u32) -> Result<T, core::num::ParseIntError>) -> Result<T, CommandError> {
    let digits = arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")).unwrap_or(arg);
    parse(digits, 16).map_err(|_| CommandError::BadNumber(what))
}

fn coord(arg: &str, what: &'static str) -> Result<u16, CommandError> {
    arg.parse().map_err(|_| CommandError::BadNumber(what))
}

fn clip(args: &[&str]) -> Result<ClipRect, CommandError> {
    match *args {
        [x1, x2, y1, y2] => Ok(ClipRect {
            x1: coord(x1, "x1")?,
            x2: coord(x2, "x2")?,
            y1: coord(y1, "y1")?,
            y2: coord(y2, "y2")?,
        }),
        _ => Err(CommandError::Usage),
    }
}

impl DisplayCommand {
    /// Parse the arguments following `display`.
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        let (&name, rest) = args.split_first().ok_or(CommandError::Usage)?;
        let known = matches!(name, "write.rgb565" | "clear.rgb565");
        if !known {
            return Err(CommandError::UnknownCommand);
        }
        let (&value, coords) = match rest.split_first() {
            Some(split) if rest.len() == 5 => split,
            _ => return Err(CommandError::Usage),
        };
        let clip = clip(coords)?;
        Ok(match name {
            "write.rgb565" => Self::WriteRgb565 { addr: hex(value, "address", usize::from_str_radix)?, clip },
            _ => Self::ClearRgb565 { color: hex(value, "color", u16::from_str_radix)?, clip },
        })
    }

    /// Run against a register-mapped panel.
    ///
    /// `resolve` turns the raw address of a `write.rgb565` into `len` pixels;
    /// `None` means the range is not accessible.
    pub fn execute<'a, M, R, B, F>(&self, panel: &mut Panel<M, RegisterTransport<R>, B>, resolve: F) -> Result<(), PanelError<Infallible>>
    where
        M: Model,
        R: RegisterBlock,
        B: Backlight,
        F: FnOnce(usize, usize) -> Option<&'a [u16]>,
    {
        debug!("display {self:?}");
        match *self {
            Self::ClearRgb565 { color, clip } => panel.fill_solid(color, clip),
            Self::WriteRgb565 { addr, clip } => {
                if !clip.fits(M::GEOMETRY) {
                    return Err(PanelError::OutOfBounds);
                }
                let pixels = resolve(addr, clip.pixel_count()).ok_or(PanelError::ResourceUnavailable("pixel source"))?;
                panel.write_region(pixels, clip)
            }
        }
    }
}
