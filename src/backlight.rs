//! Backlight control.
//!
//! The panel only needs "on" and "off". Boards either switch the backlight
//! with a plain GPIO or drive it from a Xilinx AXI timer in PWM mode.

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::error::BacklightError;
use crate::transport::RegisterBlock;

pub trait Backlight {
    fn enable(&mut self) -> Result<(), BacklightError>;
    fn disable(&mut self) -> Result<(), BacklightError>;
}

impl<B: Backlight + ?Sized> Backlight for &mut B {
    fn enable(&mut self) -> Result<(), BacklightError> {
        B::enable(self)
    }

    fn disable(&mut self) -> Result<(), BacklightError> {
        B::disable(self)
    }
}

/// Backlight switched by one active-high line.
pub struct GpioBacklight<P> {
    pin: P,
}

impl<P: OutputPin> GpioBacklight<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> Backlight for GpioBacklight<P> {
    fn enable(&mut self) -> Result<(), BacklightError> {
        self.pin.set_high().map_err(BacklightError::pin)
    }

    fn disable(&mut self) -> Result<(), BacklightError> {
        self.pin.set_low().map_err(BacklightError::pin)
    }
}

// AXI timer register map
pub const TCSR0: usize = 0x00;
pub const TLR0: usize = 0x04;
/// Timer 1 control and status
pub const TCSR1: usize = 0x10;
/// Timer 1 load
pub const TLR1: usize = 0x14;

pub const PERIOD: usize = TLR0;
pub const DUTY: usize = TLR1;

/// Up/down count
pub const TCSR_UDT: u32 = 1 << 1;
/// External generate signal
pub const TCSR_GENT: u32 = 1 << 2;
pub const TCSR_ENT: u32 = 1 << 7;
pub const TCSR_PWMA: u32 = 1 << 9;
pub const PWM_CONF: u32 = TCSR_UDT | TCSR_GENT | TCSR_ENT | TCSR_PWMA;

/// Smallest register block covering both timers.
pub const PWM_BLOCK_SIZE: usize = TLR1 + 4;

/// Xilinx AXI timer used as a single-channel PWM generator.
pub struct XlnxPwm<R> {
    regs: R,
    clk_period_ns: u32,
}

impl<R: RegisterBlock> XlnxPwm<R> {
    /// `clk_rate_hz` is the rate of the timer's `s_axi_aclk`.
    pub fn new(regs: R, clk_rate_hz: u32) -> Result<Self, BacklightError> {
        let clk_period_ns = 1_000_000_000u32.checked_div(clk_rate_hz).unwrap_or(0);
        if clk_period_ns == 0 {
            return Err(BacklightError::ResourceUnavailable("s_axi_aclk"));
        }
        Ok(Self { regs, clk_period_ns })
    }

    pub fn clk_period_ns(&self) -> u32 {
        self.clk_period_ns
    }

    /// Program period and duty cycle.
    ///
    /// Output is zero when duty equals period, so duty is capped one tick
    /// below the period and 100 % is never reached.
    pub fn set_config(&mut self, period_ns: u32, duty_ns: u32) {
        let period = self.ticks(period_ns);
        let duty = self.ticks(duty_ns).min(period.saturating_sub(1));
        debug!(
            "pwm: period {period_ns} ns duty {duty_ns} ns clk {} ns -> tlr0 {period:#x} tlr1 {duty:#x}",
            self.clk_period_ns
        );
        self.regs.write32(DUTY, duty);
        self.regs.write32(PERIOD, period);
    }

    pub fn set_enable(&mut self, enable: bool) {
        let data = if enable { PWM_CONF } else { 0 };
        self.regs.write32(TCSR0, data);
        self.regs.write32(TCSR1, data);
    }

    pub fn set_invert(&mut self, inverted: bool) -> Result<(), BacklightError> {
        if inverted {
            Err(BacklightError::Unsupported)
        } else {
            Ok(())
        }
    }

    pub fn release(self) -> R {
        self.regs
    }

    fn ticks(&self, ns: u32) -> u32 {
        (ns / self.clk_period_ns).max(2) - 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmConfig {
    pub clk_rate_hz: u32,
    pub period_ns: u32,
    pub duty_ns: u32,
}

/// PWM backlight at a fixed operating point.
pub struct PwmBacklight<R> {
    pwm: XlnxPwm<R>,
    period_ns: u32,
    duty_ns: u32,
}

impl<R: RegisterBlock> PwmBacklight<R> {
    pub fn new(regs: R, config: PwmConfig) -> Result<Self, BacklightError> {
        Ok(Self {
            pwm: XlnxPwm::new(regs, config.clk_rate_hz)?,
            period_ns: config.period_ns,
            duty_ns: config.duty_ns,
        })
    }

    pub fn pwm(&mut self) -> &mut XlnxPwm<R> {
        &mut self.pwm
    }

    pub fn release(self) -> R {
        self.pwm.release()
    }
}

impl<R: RegisterBlock> Backlight for PwmBacklight<R> {
    fn enable(&mut self) -> Result<(), BacklightError> {
        self.pwm.set_invert(false)?;
        self.pwm.set_config(self.period_ns, self.duty_ns);
        self.pwm.set_enable(true);
        Ok(())
    }

    fn disable(&mut self) -> Result<(), BacklightError> {
        self.pwm.set_enable(false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Event, Log, MockPin, Reg, RegLog};

    const ZEUS: PwmConfig = PwmConfig { clk_rate_hz: 100_000_000, period_ns: 10_000, duty_ns: 10_000 };

    #[test]
    fn full_duty_is_capped_below_period() {
        let regs = RegLog::default();
        let mut bl = PwmBacklight::new(regs.clone(), ZEUS).unwrap();
        bl.enable().unwrap();
        assert_eq!(
            regs.take(),
            vec![
                Reg::W32(TLR1, 0x3E5),
                Reg::W32(TLR0, 0x3E6),
                Reg::W32(TCSR0, 0x286),
                Reg::W32(TCSR1, 0x286),
            ]
        );
    }

    #[test]
    fn short_intervals_clamp_to_zero_ticks() {
        let regs = RegLog::default();
        let mut pwm = XlnxPwm::new(regs.clone(), 100_000_000).unwrap();
        pwm.set_config(10, 5);
        // period 0 ticks, duty cap saturates at 0
        assert_eq!(regs.take(), vec![Reg::W32(DUTY, 0), Reg::W32(PERIOD, 0)]);
    }

    #[test]
    fn disable_clears_both_timers() {
        let regs = RegLog::default();
        let mut bl = PwmBacklight::new(regs.clone(), ZEUS).unwrap();
        bl.disable().unwrap();
        assert_eq!(regs.take(), vec![Reg::W32(TCSR0, 0), Reg::W32(TCSR1, 0)]);
    }

    #[test]
    fn inverted_polarity_is_unsupported() {
        let mut pwm = XlnxPwm::new(RegLog::default(), 100_000_000).unwrap();
        assert_eq!(pwm.set_invert(true), Err(BacklightError::Unsupported));
        assert_eq!(pwm.set_invert(false), Ok(()));
    }

    #[test]
    fn clock_must_be_usable() {
        assert!(matches!(
            XlnxPwm::new(RegLog::default(), 0),
            Err(BacklightError::ResourceUnavailable(_))
        ));
        assert!(XlnxPwm::new(RegLog::default(), 2_000_000_000).is_err());
        assert_eq!(XlnxPwm::new(RegLog::default(), 100_000_000).unwrap().clk_period_ns(), 10);
    }

    #[test]
    fn gpio_backlight_drives_its_line() {
        let log = Log::default();
        let mut bl = GpioBacklight::new(MockPin::backlight(&log));
        bl.enable().unwrap();
        bl.disable().unwrap();
        assert_eq!(log.events(), vec![Event::Backlight(true), Event::Backlight(false)]);
        assert_eq!(bl.release().name(), "backlight");
    }

    #[test]
    fn gpio_failure_is_reported() {
        let log = Log::default();
        let mut bl = GpioBacklight::new(MockPin::backlight(&log).failing());
        assert!(matches!(bl.enable(), Err(BacklightError::Pin(_))));
    }
}
