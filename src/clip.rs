//! Clip rectangles and their translation to controller addressing.
//!
//! A [`ClipRect`] is half-open (`x1..x2`, `y1..y2`) while the controllers'
//! column/page windows are inclusive on both ends. [`ClipRect::resolve_addressing`]
//! is the only place that conversion happens.

use crate::models::Geometry;

/// Region of the panel updated by one blit, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x1: u16,
    pub x2: u16,
    pub y1: u16,
    pub y2: u16,
}

/// Column and page address parameters, each `[hi(start), lo(start), hi(end), lo(end)]`
/// with an inclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressWindow {
    pub columns: [u8; 4],
    pub pages: [u8; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidClip;

impl ClipRect {
    /// Checked constructor: `x1 < x2 <= width`, `y1 < y2 <= height`.
    pub fn new(x1: u16, x2: u16, y1: u16, y2: u16, geometry: Geometry) -> Result<Self, InvalidClip> {
        let clip = Self { x1, x2, y1, y2 };
        if clip.fits(geometry) {
            Ok(clip)
        } else {
            Err(InvalidClip)
        }
    }

    /// The whole panel.
    pub const fn full(geometry: Geometry) -> Self {
        Self { x1: 0, x2: geometry.width, y1: 0, y2: geometry.height }
    }

    pub fn fits(&self, geometry: Geometry) -> bool {
        self.x1 < self.x2 && self.x2 <= geometry.width && self.y1 < self.y2 && self.y2 <= geometry.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        usize::from(self.x2 - self.x1)
    }

    #[inline]
    pub fn height(&self) -> usize {
        usize::from(self.y2 - self.y1)
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Grow by one column so the region holds an even number of pixels,
    /// to the right when there is room, else to the left. Regions that are
    /// already even come back unchanged. `None` if the region spans the full
    /// width of an odd-width panel.
    pub fn widen_to_even(&self, geometry: Geometry) -> Option<Self> {
        if self.pixel_count() % 2 == 0 {
            Some(*self)
        } else if self.x2 < geometry.width {
            Some(Self { x2: self.x2 + 1, ..*self })
        } else if self.x1 > 0 {
            Some(Self { x1: self.x1 - 1, ..*self })
        } else {
            None
        }
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x1: self.x1.min(other.x1),
            x2: self.x2.max(other.x2),
            y1: self.y1.min(other.y1),
            y2: self.y2.max(other.y2),
        }
    }

    /// Big-endian (start, inclusive end) pairs for the column and page commands.
    pub fn resolve_addressing(&self) -> AddressWindow {
        AddressWindow {
            columns: be_span(self.x1, self.x2 - 1),
            pages: be_span(self.y1, self.y2 - 1),
        }
    }

    /// Clip an embedded-graphics rectangle to the panel. Empty results are `None`.
    #[cfg(feature = "graphics")]
    pub fn from_rectangle(
        rect: &embedded_graphics::primitives::Rectangle,
        geometry: Geometry,
    ) -> Option<Self> {
        use embedded_graphics::prelude::*;
        use embedded_graphics::primitives::Rectangle;

        let bounds = Rectangle::new(
            Point::zero(),
            Size::new(u32::from(geometry.width), u32::from(geometry.height)),
        );
        let inter = rect.intersection(&bounds);
        if inter.size.width == 0 || inter.size.height == 0 {
            return None;
        }
        let x1 = inter.top_left.x as u16;
        let y1 = inter.top_left.y as u16;
        Some(Self {
            x1,
            x2: x1 + inter.size.width as u16,
            y1,
            y2: y1 + inter.size.height as u16,
        })
    }
}

#[inline]
fn be_span(start: u16, end: u16) -> [u8; 4] {
    let [s_hi, s_lo] = start.to_be_bytes();
    let [e_hi, e_lo] = end.to_be_bytes();
    [s_hi, s_lo, e_hi, e_lo]
}

/// Rows of a clip region inside a framebuffer with a given stride.
///
/// Yields one `&[u16]` per row, top to bottom. A contiguous source is a
/// framebuffer whose stride equals the clip width and whose origin is the
/// clip's top-left corner.
#[derive(Debug, Clone)]
pub struct PixelRows<'a> {
    data: &'a [u16],
    stride: usize,
    x: usize,
    width: usize,
    row: usize,
    end_row: usize,
}

impl<'a> PixelRows<'a> {
    /// Rows of `clip` inside a `stride`-wide framebuffer. The caller checks
    /// that the buffer covers the clip.
    pub(crate) fn new(data: &'a [u16], stride: usize, clip: &ClipRect) -> Self {
        Self {
            data,
            stride,
            x: usize::from(clip.x1),
            width: clip.width(),
            row: usize::from(clip.y1),
            end_row: usize::from(clip.y2),
        }
    }

    /// `data` holds exactly the region's pixels, row after row.
    pub(crate) fn contiguous(data: &'a [u16], clip: &ClipRect) -> Self {
        Self {
            data,
            stride: clip.width(),
            x: 0,
            width: clip.width(),
            row: 0,
            end_row: clip.height(),
        }
    }

    /// Pixels not yet yielded.
    pub fn remaining(&self) -> usize {
        (self.end_row - self.row) * self.width
    }
}

impl<'a> Iterator for PixelRows<'a> {
    type Item = &'a [u16];

    fn next(&mut self) -> Option<Self::Item> {
        if self.row >= self.end_row {
            return None;
        }
        let base = self.row * self.stride + self.x;
        self.row += 1;
        self.data.get(base..base + self.width)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end_row - self.row;
        (n, Some(n))
    }
}
