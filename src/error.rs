//! Error types shared by the transports, the initializer and the blit engine.

use core::convert::Infallible;
use core::fmt;

use embedded_hal::{digital, spi};

/// Coarse error taxonomy, independent of the transport's error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A register block, GPIO line or bus device could not be obtained.
    ResourceUnavailable,
    /// The transfer buffer could not be allocated.
    AllocationFailure,
    /// A transport-level transfer failed.
    Bus,
    /// The requested configuration has no hardware support.
    Unsupported,
    /// A region or buffer does not fit the panel.
    OutOfBounds,
}

/// Error returned by probe, sync and fill.
///
/// `E` is the error type of the bound transport
/// ([`Infallible`] for the register-mapped transport).
#[derive(Debug, PartialEq, Eq)]
pub enum PanelError<E> {
    ResourceUnavailable(&'static str),
    AllocationFailure,
    Bus(E),
    Backlight(BacklightError),
    Unsupported,
    OutOfBounds,
}

impl<E> PanelError<E> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ResourceUnavailable(_) => ErrorKind::ResourceUnavailable,
            Self::AllocationFailure => ErrorKind::AllocationFailure,
            Self::Bus(_) => ErrorKind::Bus,
            Self::Backlight(e) => e.kind(),
            Self::Unsupported => ErrorKind::Unsupported,
            Self::OutOfBounds => ErrorKind::OutOfBounds,
        }
    }
}

impl PanelError<Infallible> {
    /// Re-types an error that cannot carry a bus error.
    pub fn widen<E>(self) -> PanelError<E> {
        match self {
            Self::ResourceUnavailable(what) => PanelError::ResourceUnavailable(what),
            Self::AllocationFailure => PanelError::AllocationFailure,
            Self::Bus(never) => match never {},
            Self::Backlight(e) => PanelError::Backlight(e),
            Self::Unsupported => PanelError::Unsupported,
            Self::OutOfBounds => PanelError::OutOfBounds,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for PanelError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceUnavailable(what) => write!(f, "resource unavailable: {what}"),
            Self::AllocationFailure => f.write_str("cannot allocate transfer buffer"),
            Self::Bus(e) => write!(f, "bus error: {e:?}"),
            Self::Backlight(e) => write!(f, "backlight: {e}"),
            Self::Unsupported => f.write_str("unsupported configuration"),
            Self::OutOfBounds => f.write_str("region out of bounds"),
        }
    }
}

/// Serial transport failure. Underlying HAL errors are reduced to their
/// `embedded-hal` kinds so one type covers the bus and all three lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialError {
    Spi(spi::ErrorKind),
    Pin(digital::ErrorKind),
    /// The shared bus is held by another user.
    BusBusy,
}

impl SerialError {
    pub(crate) fn spi<E: spi::Error>(e: E) -> Self {
        Self::Spi(e.kind())
    }

    pub(crate) fn pin<E: digital::Error>(e: E) -> Self {
        Self::Pin(e.kind())
    }
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi(kind) => write!(f, "spi transfer failed: {kind}"),
            Self::Pin(kind) => write!(f, "gpio write failed: {kind}"),
            Self::BusBusy => f.write_str("spi bus already claimed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklightError {
    Pin(digital::ErrorKind),
    Unsupported,
    ResourceUnavailable(&'static str),
}

impl BacklightError {
    pub(crate) fn pin<E: digital::Error>(e: E) -> Self {
        Self::Pin(e.kind())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Pin(_) => ErrorKind::Bus,
            Self::Unsupported => ErrorKind::Unsupported,
            Self::ResourceUnavailable(_) => ErrorKind::ResourceUnavailable,
        }
    }
}

impl fmt::Display for BacklightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin(kind) => write!(f, "gpio write failed: {kind}"),
            Self::Unsupported => f.write_str("unsupported"),
            Self::ResourceUnavailable(what) => write!(f, "resource unavailable: {what}"),
        }
    }
}
