// Serial transport: 4-wire SPI with a discrete data/command (mode-select) line.
//
// The SSD2119 wants every command and parameter byte in its own chip-select
// frame; batching them under one CS assertion corrupts its GRAM write state
// machine. Only pixel chunks after the GRAM write command are sent as one
// frame per transfer-buffer fill.
//
// The SPI bus is shared with other peripherals. It is held in a `RefCell` and
// claimed for the whole of one logical operation; the claim is a
// `SerialSession`, so every exit path releases it.

use core::cell::{RefCell, RefMut};

use alloc::vec::Vec;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use log::{debug, trace};

use crate::clip::PixelRows;
use crate::error::{PanelError, SerialError};
use crate::transport::{Session, Transport};

/// One 4 KiB page worth of 16-bit words.
pub const PAGE_WORDS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Command,
    Data,
}

/// Lines assigned to the panel. A missing line fails the probe.
pub struct SerialPins<CS, DC, RST> {
    pub cs: Option<CS>,
    pub dc: Option<DC>,
    pub reset: Option<RST>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Transfer buffer capacity, in pixels.
    pub transfer_words: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self { transfer_words: PAGE_WORDS }
    }
}

/// Fixed-capacity staging buffer for big-endian pixel chunks.
///
/// Allocated once at probe; its capacity never changes afterwards.
#[derive(Debug)]
pub struct TransferBuffer {
    words: Vec<u16>,
}

impl TransferBuffer {
    pub fn with_capacity(words: usize) -> Result<Self, PanelError<SerialError>> {
        if words == 0 {
            return Err(PanelError::Unsupported);
        }
        let mut buf = Vec::new();
        buf.try_reserve_exact(words).map_err(|_| PanelError::AllocationFailure)?;
        buf.resize(words, 0);
        Ok(Self { words: buf })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    /// Copy pixels from `rows` (starting with whatever is left of `pending`)
    /// as big-endian words. Returns the number of words filled.
    fn fill<'a>(&mut self, pending: &mut &'a [u16], rows: &mut PixelRows<'a>) -> usize {
        let cap = self.words.len();
        let mut filled = 0;
        while filled < cap {
            if pending.is_empty() {
                match rows.next() {
                    Some(row) => {
                        *pending = row;
                        continue;
                    }
                    None => break,
                }
            }
            let cur: &'a [u16] = pending;
            let (head, tail) = cur.split_at((cap - filled).min(cur.len()));
            for (dst, src) in self.words[filled..filled + head.len()].iter_mut().zip(head) {
                *dst = src.to_be();
            }
            filled += head.len();
            *pending = tail;
        }
        filled
    }

    fn bytes(&self, words: usize) -> &[u8] {
        bytemuck::cast_slice(&self.words[..words])
    }
}

/// SPI + data/command transport for one panel on a shared bus.
pub struct SerialTransport<'bus, BUS, CS, DC, RST> {
    bus: &'bus RefCell<BUS>,
    cs: CS,
    dc: DC,
    reset: RST,
    tx_buf: TransferBuffer,
}

impl<'bus, BUS, CS, DC, RST> SerialTransport<'bus, BUS, CS, DC, RST>
where
    BUS: SpiBus<u8>,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
{
    /// Take the panel's lines and allocate the transfer buffer.
    pub fn new(
        bus: &'bus RefCell<BUS>,
        pins: SerialPins<CS, DC, RST>,
        config: SerialConfig,
    ) -> Result<Self, PanelError<SerialError>> {
        let SerialPins { cs, dc, reset } = pins;
        let reset = reset.ok_or(PanelError::ResourceUnavailable("reset-gpios"))?;
        let dc = dc.ok_or(PanelError::ResourceUnavailable("dc-gpios"))?;
        let mut cs = cs.ok_or(PanelError::ResourceUnavailable("cs-gpios"))?;
        cs.set_high().map_err(|e| PanelError::Bus(SerialError::pin(e)))?;

        let tx_buf = TransferBuffer::with_capacity(config.transfer_words)?;
        debug!("serial transport: {} word transfer buffer", tx_buf.capacity());
        Ok(Self { bus, cs, dc, reset, tx_buf })
    }

    pub fn transfer_capacity(&self) -> usize {
        self.tx_buf.capacity()
    }

    /// Free the transfer buffer and hand the lines back.
    pub fn release(self) -> (CS, DC, RST) {
        debug!("releasing serial transport lines and {} word buffer", self.tx_buf.capacity());
        let Self { cs, dc, reset, tx_buf, .. } = self;
        drop(tx_buf);
        (cs, dc, reset)
    }
}

impl<'bus, BUS, CS, DC, RST> Transport for SerialTransport<'bus, BUS, CS, DC, RST>
where
    BUS: SpiBus<u8>,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
{
    type Error = SerialError;
    type Session<'s>
        = SerialSession<'s, BUS, CS, DC>
    where
        Self: 's;

    fn set_reset(&mut self, asserted: bool) -> Result<(), SerialError> {
        // active low
        if asserted {
            self.reset.set_low()
        } else {
            self.reset.set_high()
        }
        .map_err(SerialError::pin)
    }

    fn open(&mut self) -> Result<SerialSession<'_, BUS, CS, DC>, SerialError> {
        let bus = self.bus.try_borrow_mut().map_err(|_| SerialError::BusBusy)?;
        trace!("spi bus claimed");
        Ok(SerialSession {
            bus,
            cs: &mut self.cs,
            dc: &mut self.dc,
            tx_buf: &mut self.tx_buf,
        })
    }
}

/// A claimed bus. Dropping it releases the claim.
pub struct SerialSession<'s, BUS, CS, DC> {
    bus: RefMut<'s, BUS>,
    cs: &'s mut CS,
    dc: &'s mut DC,
    tx_buf: &'s mut TransferBuffer,
}

impl<BUS, CS, DC> SerialSession<'_, BUS, CS, DC>
where
    BUS: SpiBus<u8>,
    CS: OutputPin,
    DC: OutputPin,
{
    fn set_mode(&mut self, mode: Mode) -> Result<(), SerialError> {
        match mode {
            Mode::Command => self.dc.set_low(),
            Mode::Data => self.dc.set_high(),
        }
        .map_err(SerialError::pin)
    }

    /// One chip-select framed transfer.
    fn frame(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        self.cs.set_low().map_err(SerialError::pin)?;
        let res = self.bus.write(bytes).and_then(|()| self.bus.flush());
        // Deassert even when the transfer failed; report the transfer error first.
        let cs = self.cs.set_high().map_err(SerialError::pin);
        res.map_err(SerialError::spi)?;
        cs
    }
}

impl<BUS, CS, DC> Session for SerialSession<'_, BUS, CS, DC>
where
    BUS: SpiBus<u8>,
    CS: OutputPin,
    DC: OutputPin,
{
    type Error = SerialError;

    fn send_command(&mut self, cmd: u8, params: &[u8]) -> Result<(), SerialError> {
        self.set_mode(Mode::Command)?;
        self.frame(&[cmd])?;
        if params.is_empty() {
            return Ok(());
        }
        self.set_mode(Mode::Data)?;
        for &b in params {
            self.frame(&[b])?;
        }
        Ok(())
    }

    fn send_bulk(&mut self, cmd: u8, mut rows: PixelRows<'_>) -> Result<(), SerialError> {
        self.send_command(cmd, &[])?;
        self.set_mode(Mode::Data)?;

        let total = rows.remaining();
        let mut pending: &[u16] = &[];
        let mut chunks = 0usize;
        loop {
            let filled = self.tx_buf.fill(&mut pending, &mut rows);
            if filled == 0 {
                break;
            }
            // tx_buf is borrowed separately from cs/bus
            let Self { bus, cs, tx_buf, .. } = self;
            cs.set_low().map_err(SerialError::pin)?;
            let res = bus.write(tx_buf.bytes(filled)).and_then(|()| bus.flush());
            let deassert = cs.set_high().map_err(SerialError::pin);
            res.map_err(SerialError::spi)?;
            deassert?;
            chunks += 1;
        }
        trace!("gram write: {total} px in {chunks} chunks");
        Ok(())
    }
}

impl<BUS, CS, DC> Drop for SerialSession<'_, BUS, CS, DC> {
    fn drop(&mut self) {
        trace!("spi bus released");
    }
}

#[cfg(feature = "dbi")]
mod dbi {
    use display_interface::{DataFormat, DisplayError, WriteOnlyDataCommand};

    use super::*;

    fn to_display_error(e: SerialError) -> DisplayError {
        match e {
            SerialError::Pin(_) => DisplayError::DCError,
            SerialError::Spi(_) | SerialError::BusBusy => DisplayError::BusWriteError,
        }
    }

    impl<BUS, CS, DC> SerialSession<'_, BUS, CS, DC>
    where
        BUS: SpiBus<u8>,
        CS: OutputPin,
        DC: OutputPin,
    {
        fn framed_bytes(&mut self, mode: Mode, data: DataFormat<'_>) -> Result<(), DisplayError> {
            self.set_mode(mode).map_err(to_display_error)?;
            match data {
                DataFormat::U8(bytes) => {
                    for &b in bytes {
                        self.frame_byte(b)?;
                    }
                }
                DataFormat::U16BE(words) => {
                    for w in words.iter() {
                        self.frame_word(w.to_be_bytes())?;
                    }
                }
                DataFormat::U16LE(words) => {
                    for w in words.iter() {
                        self.frame_word(w.to_le_bytes())?;
                    }
                }
                DataFormat::U8Iter(iter) => {
                    for b in iter {
                        self.frame_byte(b)?;
                    }
                }
                DataFormat::U16BEIter(iter) => {
                    for w in iter {
                        self.frame_word(w.to_be_bytes())?;
                    }
                }
                DataFormat::U16LEIter(iter) => {
                    for w in iter {
                        self.frame_word(w.to_le_bytes())?;
                    }
                }
                _ => return Err(DisplayError::DataFormatNotImplemented),
            }
            Ok(())
        }

        fn frame_byte(&mut self, b: u8) -> Result<(), DisplayError> {
            self.frame(&[b]).map_err(to_display_error)
        }

        fn frame_word(&mut self, [a, b]: [u8; 2]) -> Result<(), DisplayError> {
            self.frame_byte(a)?;
            self.frame_byte(b)
        }
    }

    impl<BUS, CS, DC, RST> WriteOnlyDataCommand for SerialTransport<'_, BUS, CS, DC, RST>
    where
        BUS: SpiBus<u8>,
        CS: OutputPin,
        DC: OutputPin,
        RST: OutputPin,
    {
        fn send_commands(&mut self, cmd: DataFormat<'_>) -> Result<(), DisplayError> {
            self.open().map_err(to_display_error)?.framed_bytes(Mode::Command, cmd)
        }

        fn send_data(&mut self, buf: DataFormat<'_>) -> Result<(), DisplayError> {
            self.open().map_err(to_display_error)?.framed_bytes(Mode::Data, buf)
        }
    }
}
