//! Per-panel device state and the blit engine.
//!
//! A [`Panel`] only exists after a successful probe, so every blit entry
//! point runs against a controller that reached display-on.

use core::convert::Infallible;
use core::marker::PhantomData;

use embedded_hal::delay::DelayNs;
use log::{debug, info, trace};

use crate::backlight::Backlight;
use crate::clip::{ClipRect, PixelRows};
use crate::error::PanelError;
#[cfg(feature = "graphics")]
use crate::framebuffer::Framebuffer;
use crate::init::PanelInitializer;
use crate::models::{Geometry, Ili9488, Model, Ssd2119};
use crate::transport::{RegisterBlock, RegisterTransport, SerialTransport, Session, Transport};

/// A controller of model `M`, bound to a transport and a backlight.
pub struct Panel<M, T, B> {
    transport: T,
    backlight: B,
    _model: PhantomData<M>,
}

/// ILI9488 behind the DBI type B register block.
pub type Ili9488Panel<R, B> = Panel<Ili9488, RegisterTransport<R>, B>;

/// SSD2119 on a shared SPI bus.
pub type Ssd2119Panel<'bus, BUS, CS, DC, RST, B> = Panel<Ssd2119, SerialTransport<'bus, BUS, CS, DC, RST>, B>;

impl<M: Model, T: Transport, B: Backlight> Panel<M, T, B> {
    /// Reset and initialize the controller, then enable the backlight.
    ///
    /// On error the transport and backlight are dropped and the panel stays
    /// uninitialized.
    pub fn probe(mut transport: T, mut backlight: B, delay: &mut impl DelayNs) -> Result<Self, PanelError<T::Error>> {
        info!("probing {} {}x{}", M::NAME, M::GEOMETRY.width, M::GEOMETRY.height);
        PanelInitializer::<M>::new().run(&mut transport, &mut backlight, delay)?;
        Ok(Self { transport, backlight, _model: PhantomData })
    }

    pub fn geometry(&self) -> Geometry {
        M::GEOMETRY
    }

    /// Push `fb`, a full-panel framebuffer (row stride = panel width), to
    /// GRAM. `None` sends the whole panel; a region sends only its pixels.
    ///
    /// On transports that move pixels in pairs a region with an odd pixel
    /// count is widened by one column, taking the extra pixel from `fb`.
    pub fn sync(&mut self, fb: &[u16], region: Option<ClipRect>) -> Result<(), PanelError<T::Error>> {
        let geometry = M::GEOMETRY;
        if fb.len() != geometry.pixel_count() {
            return Err(PanelError::OutOfBounds);
        }
        let mut clip = region.unwrap_or(ClipRect::full(geometry));
        if !clip.fits(geometry) {
            return Err(PanelError::OutOfBounds);
        }
        if T::PIXEL_ALIGN > 1 {
            clip = clip.widen_to_even(geometry).ok_or(PanelError::Unsupported)?;
        }
        trace!("sync {clip:?}");
        self.blit(&clip, PixelRows::new(fb, usize::from(geometry.width), &clip))
    }

    /// Write `clip.pixel_count()` contiguous pixels from the front of
    /// `pixels` into the `clip` window.
    ///
    /// The pixel count must be a multiple of [`Transport::PIXEL_ALIGN`]
    /// (even on the register transport), else [`PanelError::Unsupported`].
    pub fn write_region(&mut self, pixels: &[u16], clip: ClipRect) -> Result<(), PanelError<T::Error>> {
        if !clip.fits(M::GEOMETRY) || pixels.len() < clip.pixel_count() {
            return Err(PanelError::OutOfBounds);
        }
        if clip.pixel_count() % T::PIXEL_ALIGN != 0 {
            return Err(PanelError::Unsupported);
        }
        trace!("write {} px to {clip:?}", clip.pixel_count());
        self.blit(&clip, PixelRows::contiguous(pixels, &clip))
    }

    /// Sync whatever was drawn into `fb` since the last flush.
    ///
    /// On error the region stays dirty so the next flush retries it.
    #[cfg(feature = "graphics")]
    pub fn flush(&mut self, fb: &mut Framebuffer<'_>) -> Result<(), PanelError<T::Error>> {
        let Some(clip) = fb.take_dirty() else {
            return Ok(());
        };
        let res = self.sync(fb.pixels(), Some(clip));
        if res.is_err() {
            fb.mark(clip);
        }
        res
    }

    /// Hand the transport and backlight back. The backlight is left as is.
    pub fn remove(self) -> (T, B) {
        debug!("removing {}", M::NAME);
        (self.transport, self.backlight)
    }

    fn blit(&mut self, clip: &ClipRect, rows: PixelRows<'_>) -> Result<(), PanelError<T::Error>> {
        let window = clip.resolve_addressing();
        // One claim covers the addressing commands and every chunk.
        let mut session = self.transport.open().map_err(PanelError::Bus)?;
        M::set_address_window(&mut session, &window)?;
        session.send_bulk(M::WRITE_MEMORY, rows).map_err(PanelError::Bus)
    }
}

impl<M: Model, R: RegisterBlock, B: Backlight> Panel<M, RegisterTransport<R>, B> {
    /// Hardware revision of the DBI master.
    pub fn version(&mut self) -> u32 {
        self.transport.version()
    }

    /// Fill `clip` with one RGB565 color, two pixels per register write.
    pub fn fill_solid(&mut self, color: u16, clip: ClipRect) -> Result<(), PanelError<Infallible>> {
        if !clip.fits(M::GEOMETRY) {
            return Err(PanelError::OutOfBounds);
        }
        trace!("fill {clip:?} with {color:#06x}");
        let window = clip.resolve_addressing();
        let session = self.transport.open().map_err(PanelError::Bus)?;
        M::set_address_window(&mut &mut *session, &window)?;
        let word = (u32::from(color) << 16) | u32::from(color);
        session.fill_words(M::WRITE_MEMORY, word, clip.pixel_count() * 2);
        Ok(())
    }
}
