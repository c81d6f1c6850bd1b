// Register-mapped transport: a MIPI DBI type B (parallel bus) master exposed
// as a small block of memory-mapped registers in the programmable logic.
//
// Register map (offsets from the block base):
//   0x00 VERSION  (read)
//   0x04 CONTROL  bit0 = RESET, bit1 = CS
//   0x10 COMMAND  8-bit write
//   0x20 DATA     8-bit write, or 32-bit write during WRITE_MEMORY_START
//
// The block has no error signaling, so this transport cannot fail.

use core::convert::Infallible;
use core::ptr::NonNull;

use log::{debug, trace};

use crate::clip::PixelRows;
use crate::error::PanelError;
use crate::transport::{Session, Transport};

pub const REG_VERSION: usize = 0x00;
pub const REG_CONTROL: usize = 0x04;
pub const REG_COMMAND: usize = 0x10;
pub const REG_DATA: usize = 0x20;

pub const CONTROL_RESET: u32 = 1 << 0;
pub const CONTROL_CS: u32 = 1 << 1;

/// MIPI DCS write_memory_start, the only command the hardware accepts
/// 32-bit data writes for.
pub const WRITE_MEMORY_START: u8 = 0x2C;

/// Raw register access.
pub trait RegisterBlock {
    fn write8(&mut self, offset: usize, value: u8);
    fn write32(&mut self, offset: usize, value: u32);
    fn read32(&mut self, offset: usize) -> u32;
}

impl<R: RegisterBlock + ?Sized> RegisterBlock for &mut R {
    fn write8(&mut self, offset: usize, value: u8) {
        R::write8(self, offset, value)
    }

    fn write32(&mut self, offset: usize, value: u32) {
        R::write32(self, offset, value)
    }

    fn read32(&mut self, offset: usize) -> u32 {
        R::read32(self, offset)
    }
}

/// Physical address range of a register block, as read from the board's
/// resource description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub start: usize,
    pub size: usize,
}

/// Volatile access to a mapped register block.
#[derive(Debug)]
pub struct Mmio {
    base: NonNull<u8>,
    size: usize,
}

impl Mmio {
    /// Map `res`, which must cover at least `min_size` bytes.
    ///
    /// # Safety
    ///
    /// `res` must describe device memory that is mapped, word aligned and not
    /// aliased by any other `Mmio` for the lifetime of the returned value.
    pub unsafe fn from_resource(res: Resource, min_size: usize) -> Result<Self, PanelError<Infallible>> {
        let base = NonNull::new(res.start as *mut u8).ok_or(PanelError::ResourceUnavailable("mmio base"))?;
        if res.start % 4 != 0 || res.size < min_size {
            return Err(PanelError::ResourceUnavailable("mmio range"));
        }
        Ok(Self { base, size: res.size })
    }

    #[inline]
    fn at(&self, offset: usize, width: usize) -> *mut u8 {
        debug_assert!(offset + width <= self.size, "register {offset:#x} outside block");
        // SAFETY: offset checked against the mapped size above
        unsafe { self.base.as_ptr().add(offset) }
    }
}

impl RegisterBlock for Mmio {
    #[inline]
    fn write8(&mut self, offset: usize, value: u8) {
        // SAFETY: mapped device memory, see `from_resource`
        unsafe { core::ptr::write_volatile(self.at(offset, 1), value) }
    }

    #[inline]
    fn write32(&mut self, offset: usize, value: u32) {
        // SAFETY: mapped, word-aligned device memory
        unsafe { core::ptr::write_volatile(self.at(offset, 4).cast::<u32>(), value) }
    }

    #[inline]
    fn read32(&mut self, offset: usize) -> u32 {
        // SAFETY: mapped, word-aligned device memory
        unsafe { core::ptr::read_volatile(self.at(offset, 4).cast::<u32>()) }
    }
}

/// DBI type B transport over a [`RegisterBlock`].
pub struct RegisterTransport<R> {
    regs: R,
}

impl<R: RegisterBlock> RegisterTransport<R> {
    /// Smallest block that covers every register this transport touches.
    pub const BLOCK_SIZE: usize = REG_DATA + 4;

    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Hardware revision of the DBI master.
    pub fn version(&mut self) -> u32 {
        self.regs.read32(REG_VERSION)
    }

    /// Send `cmd` and its parameters under one CS assertion.
    ///
    /// For [`WRITE_MEMORY_START`] the parameters go out four bytes at a time
    /// as native-endian 32-bit words; `params.len()` must then be a multiple
    /// of four. Every other command is written byte by byte.
    pub fn send_command(&mut self, cmd: u8, params: &[u8]) {
        self.select();
        self.regs.write8(REG_COMMAND, cmd);
        match cmd {
            WRITE_MEMORY_START => {
                debug_assert!(params.len() % 4 == 0, "bulk write of {} bytes", params.len());
                for word in params.chunks_exact(4) {
                    self.regs.write32(REG_DATA, bytemuck::pod_read_unaligned(word));
                }
            }
            _ => {
                for &b in params {
                    self.regs.write8(REG_DATA, b);
                }
            }
        }
        self.deselect();
    }

    /// Write `byte_count` bytes of one repeated 32-bit word after `cmd`.
    ///
    /// The count is in bytes and drops by four per word written, so
    /// `byte_count / 4` words go out (rounded up).
    pub fn fill_words(&mut self, cmd: u8, word: u32, byte_count: usize) {
        trace!("fill {byte_count} bytes with {word:#010x}");
        self.select();
        self.regs.write8(REG_COMMAND, cmd);
        let mut remaining = byte_count;
        while remaining > 0 {
            self.regs.write32(REG_DATA, word);
            remaining = remaining.saturating_sub(4);
        }
        self.deselect();
    }

    /// Give the register block back.
    pub fn release(self) -> R {
        debug!("releasing dbi register block");
        self.regs
    }

    #[inline]
    fn select(&mut self) {
        self.regs.write32(REG_CONTROL, CONTROL_CS);
    }

    #[inline]
    fn deselect(&mut self) {
        self.regs.write32(REG_CONTROL, 0);
    }

    /// Stream `rows` after `cmd`. After [`WRITE_MEMORY_START`] the pixel
    /// count must be even; a trailing unpaired pixel is not written.
    fn write_pixels(&mut self, cmd: u8, rows: PixelRows<'_>) {
        self.select();
        self.regs.write8(REG_COMMAND, cmd);
        if cmd == WRITE_MEMORY_START {
            // Pixel pairs may straddle rows when the clip width is odd.
            let mut carry: Option<u16> = None;
            for row in rows {
                let mut row = row;
                if let Some(first) = carry.take() {
                    match row.split_first() {
                        Some((&second, rest)) => {
                            self.regs.write32(REG_DATA, bytemuck::cast([first, second]));
                            row = rest;
                        }
                        None => {
                            carry = Some(first);
                            continue;
                        }
                    }
                }
                let mut pairs = row.chunks_exact(2);
                for pair in &mut pairs {
                    self.regs.write32(REG_DATA, bytemuck::cast([pair[0], pair[1]]));
                }
                carry = pairs.remainder().first().copied();
            }
            debug_assert!(carry.is_none(), "bulk write must be a whole number of 32-bit words");
        } else {
            for row in rows {
                for &b in bytemuck::cast_slice::<u16, u8>(row) {
                    self.regs.write8(REG_DATA, b);
                }
            }
        }
        self.deselect();
    }
}

impl<R: RegisterBlock> Transport for RegisterTransport<R> {
    type Error = Infallible;
    type Session<'s>
        = &'s mut Self
    where
        Self: 's;

    /// Pixels go out in pairs, one 32-bit write each.
    const PIXEL_ALIGN: usize = 2;

    fn set_reset(&mut self, asserted: bool) -> Result<(), Infallible> {
        self.regs.write32(REG_CONTROL, if asserted { CONTROL_RESET } else { 0 });
        Ok(())
    }

    fn open(&mut self) -> Result<&mut Self, Infallible> {
        Ok(self)
    }
}

impl<R: RegisterBlock> Session for &mut RegisterTransport<R> {
    type Error = Infallible;

    fn send_command(&mut self, cmd: u8, params: &[u8]) -> Result<(), Infallible> {
        RegisterTransport::send_command(self, cmd, params);
        Ok(())
    }

    fn send_bulk(&mut self, cmd: u8, rows: PixelRows<'_>) -> Result<(), Infallible> {
        self.write_pixels(cmd, rows);
        Ok(())
    }
}
