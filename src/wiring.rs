// Board-specific resource maps and bring-up.
//
// Each board gets its own module with the addresses and line assignments
// its bitstream / schematic uses, and a `bring_up` that builds the transport,
// the backlight and the probed panel in the right order.

//! Board profiles.
//!
//! - zeus: ILI9488 (URT P220MD-T) on the DBI type B block in the PL,
//!   backlight on an AXI timer in PWM mode.
//! - green mango: SSD2119 on the shared SPI bus with discrete D/C and
//!   reset lines.

/// Zynq "zeus" board.
pub mod zeus {
    use core::convert::Infallible;

    use embedded_hal::delay::DelayNs;
    use log::info;

    use crate::backlight::{PwmBacklight, PwmConfig, PWM_BLOCK_SIZE};
    use crate::error::PanelError;
    use crate::panel::{Ili9488Panel, Panel};
    use crate::transport::{Mmio, RegisterBlock, RegisterTransport, Resource};

    /// DBI type B master.
    pub const DBI: Resource = Resource { start: 0x43C1_0000, size: 0x1_0000 };
    /// AXI timer driving the backlight.
    pub const BACKLIGHT_PWM: Resource = Resource { start: 0x4280_0000, size: 0x1_0000 };
    /// `s_axi_aclk`
    pub const AXI_CLK_HZ: u32 = 100_000_000;

    /// Period and duty both 10 us; the duty cap keeps it just under 100 %.
    pub const BACKLIGHT: PwmConfig = PwmConfig { clk_rate_hz: AXI_CLK_HZ, period_ns: 10_000, duty_ns: 10_000 };

    pub type ZeusPanel<R = Mmio> = Ili9488Panel<R, PwmBacklight<R>>;

    /// Bring up the panel on already-mapped register blocks.
    pub fn bring_up_with<R: RegisterBlock>(
        dbi: R,
        pwm: R,
        delay: &mut impl DelayNs,
    ) -> Result<ZeusPanel<R>, PanelError<Infallible>> {
        let mut transport = RegisterTransport::new(dbi);
        info!("zeus: dbi block version {:#010x}", transport.version());
        let backlight = PwmBacklight::new(pwm, BACKLIGHT).map_err(PanelError::Backlight)?;
        Panel::probe(transport, backlight, delay)
    }

    /// Map the board's register blocks and bring up the panel.
    ///
    /// # Safety
    ///
    /// [`DBI`] and [`BACKLIGHT_PWM`] must be mapped 1:1 and not be in use
    /// anywhere else for the lifetime of the returned panel.
    pub unsafe fn bring_up(delay: &mut impl DelayNs) -> Result<ZeusPanel, PanelError<Infallible>> {
        // SAFETY: forwarded to the caller
        let dbi = unsafe { Mmio::from_resource(DBI, RegisterTransport::<Mmio>::BLOCK_SIZE)? };
        // SAFETY: as above
        let pwm = unsafe { Mmio::from_resource(BACKLIGHT_PWM, PWM_BLOCK_SIZE)? };
        bring_up_with(dbi, pwm, delay)
    }
}

/// Zynq "green mango" board.
pub mod green_mango {
    use core::cell::RefCell;

    use embedded_hal::delay::DelayNs;
    use embedded_hal::digital::OutputPin;
    use embedded_hal::spi::SpiBus;

    use crate::backlight::Backlight;
    use crate::error::{PanelError, SerialError};
    use crate::panel::{Panel, Ssd2119Panel};
    use crate::transport::serial::PAGE_WORDS;
    use crate::transport::{SerialConfig, SerialPins, SerialTransport};

    /// One page of pixels per SPI transaction.
    pub const SERIAL: SerialConfig = SerialConfig { transfer_words: PAGE_WORDS };

    /// Claim the panel's lines on `bus` and bring up the panel.
    pub fn bring_up<'bus, BUS, CS, DC, RST, BL>(
        bus: &'bus RefCell<BUS>,
        pins: SerialPins<CS, DC, RST>,
        backlight: BL,
        delay: &mut impl DelayNs,
    ) -> Result<Ssd2119Panel<'bus, BUS, CS, DC, RST, BL>, PanelError<SerialError>>
    where
        BUS: SpiBus<u8>,
        CS: OutputPin,
        DC: OutputPin,
        RST: OutputPin,
        BL: Backlight,
    {
        let transport = SerialTransport::new(bus, pins, SERIAL)?;
        Panel::probe(transport, backlight, delay)
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use super::*;
    use crate::backlight::{GpioBacklight, TCSR0, TCSR1, TLR0, TLR1};
    use crate::error::ErrorKind;
    use crate::mock::{Event, Log, MockDelay, MockPin, MockSpi, Reg, RegLog};
    use crate::transport::SerialPins;

    #[test]
    fn zeus_programs_backlight_after_display_on() {
        let dbi = RegLog::default();
        let pwm = RegLog::default();
        dbi.set_read_value(0x0001_0000);
        let log = Log::default();
        let panel = zeus::bring_up_with(dbi.clone(), pwm.clone(), &mut MockDelay::new(&log));
        assert!(panel.is_ok());
        assert_eq!(dbi.commands().last(), Some(&0x29));
        assert_eq!(
            pwm.take(),
            vec![
                Reg::W32(TLR1, 0x3E5),
                Reg::W32(TLR0, 0x3E6),
                Reg::W32(TCSR0, 0x286),
                Reg::W32(TCSR1, 0x286),
            ]
        );
    }

    #[test]
    fn green_mango_uses_a_page_sized_buffer() {
        let log = Log::default();
        let bus = RefCell::new(MockSpi::new(&log));
        let pins = SerialPins {
            cs: Some(MockPin::cs(&log)),
            dc: Some(MockPin::dc(&log)),
            reset: Some(MockPin::reset(&log)),
        };
        let bl = GpioBacklight::new(MockPin::backlight(&log));
        let panel = green_mango::bring_up(&bus, pins, bl, &mut MockDelay::new(&log)).unwrap();
        let (transport, _) = panel.remove();
        assert_eq!(transport.transfer_capacity(), 4096);
        assert_eq!(log.events().last(), Some(&Event::Backlight(true)));
    }

    #[test]
    fn green_mango_without_reset_line_fails_probe() {
        let log = Log::default();
        let bus = RefCell::new(MockSpi::new(&log));
        let pins: SerialPins<MockPin, MockPin, MockPin> = SerialPins {
            cs: Some(MockPin::cs(&log)),
            dc: Some(MockPin::dc(&log)),
            reset: None,
        };
        let bl = GpioBacklight::new(MockPin::backlight(&log));
        let err = green_mango::bring_up(&bus, pins, bl, &mut MockDelay::new(&log)).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::ResourceUnavailable));
        assert!(!log.events().contains(&Event::Backlight(true)));
    }
}
