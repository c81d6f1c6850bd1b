// -------------------- embedded-graphics integration --------------------
//
// Drawing only touches memory. The dirty rectangle collects everything drawn
// since the last `take_dirty`, ready to be handed to `Panel::sync`.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::clip::ClipRect;
use crate::error::PanelError;
use crate::models::Geometry;

/// Full-panel RGB565 framebuffer over caller-owned storage.
pub struct Framebuffer<'fb> {
    geometry: Geometry,
    fb: &'fb mut [u16],
    dirty: Option<ClipRect>,
}

impl<'fb> Framebuffer<'fb> {
    /// `fb` must hold exactly `width * height` pixels.
    pub fn new(fb: &'fb mut [u16], geometry: Geometry) -> Result<Self, PanelError<Infallible>> {
        if fb.len() != geometry.pixel_count() {
            return Err(PanelError::OutOfBounds);
        }
        Ok(Self { geometry, fb, dirty: None })
    }

    pub fn pixels(&self) -> &[u16] {
        self.fb
    }

    /// Region drawn since the last call, if any.
    pub fn take_dirty(&mut self) -> Option<ClipRect> {
        self.dirty.take()
    }

    /// Grow the dirty rect to cover `clip`, rounded to an even pixel count.
    pub(crate) fn mark(&mut self, clip: ClipRect) {
        let dirty = match self.dirty {
            Some(d) => d.union(&clip),
            None => clip,
        };
        self.dirty = Some(dirty.widen_to_even(self.geometry).unwrap_or(dirty));
    }
}

impl OriginDimensions for Framebuffer<'_> {
    fn size(&self) -> Size {
        Size::new(u32::from(self.geometry.width), u32::from(self.geometry.height))
    }
}

impl DrawTarget for Framebuffer<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Rgb565>>,
    {
        let (w, h) = (self.geometry.width, self.geometry.height);
        let mut bounds: Option<ClipRect> = None;
        for Pixel(p, c) in pixels {
            if p.x < 0 || p.y < 0 || p.x >= i32::from(w) || p.y >= i32::from(h) {
                continue;
            }
            let (x, y) = (p.x as u16, p.y as u16);
            self.fb[usize::from(y) * usize::from(w) + usize::from(x)] = c.into_storage();
            let px = ClipRect { x1: x, x2: x + 1, y1: y, y2: y + 1 };
            bounds = Some(bounds.map_or(px, |b| b.union(&px)));
        }
        if let Some(b) = bounds {
            self.mark(b);
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        let Some(clip) = ClipRect::from_rectangle(area, self.geometry) else {
            return Ok(());
        };
        let raw = color.into_storage();
        let stride = usize::from(self.geometry.width);
        for y in clip.y1..clip.y2 {
            let row = usize::from(y) * stride;
            self.fb[row + usize::from(clip.x1)..row + usize::from(clip.x2)].fill(raw);
        }
        self.mark(clip);
        Ok(())
    }

    fn clear(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        self.fb.fill(color.into_storage());
        self.mark(ClipRect::full(self.geometry));
        Ok(())
    }
}
