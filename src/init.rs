//! Panel bring-up sequence.
//!
//! A strictly linear walk from reset to display-on. Each phase runs one of
//! the model's init tables; the delays inside the tables are the minimum
//! hold times before the next command is legal.

use core::marker::PhantomData;

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::backlight::Backlight;
use crate::error::PanelError;
use crate::models::{run_steps, Model};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InitState {
    Unreset,
    HardReset,
    SoftReset,
    ConfiguringDisplay,
    SleepExit,
    /// The only state in which blits are valid.
    DisplayOn,
}

impl InitState {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Unreset => Some(Self::HardReset),
            Self::HardReset => Some(Self::SoftReset),
            Self::SoftReset => Some(Self::ConfiguringDisplay),
            Self::ConfiguringDisplay => Some(Self::SleepExit),
            Self::SleepExit => Some(Self::DisplayOn),
            Self::DisplayOn => None,
        }
    }
}

/// Drives one controller of model `M` from reset to [`InitState::DisplayOn`].
#[derive(Debug)]
pub struct PanelInitializer<M> {
    state: InitState,
    _model: PhantomData<M>,
}

impl<M: Model> Default for PanelInitializer<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> PanelInitializer<M> {
    pub const fn new() -> Self {
        Self { state: InitState::Unreset, _model: PhantomData }
    }

    /// Last phase completed. On error this is where the sequence stopped.
    pub fn state(&self) -> InitState {
        self.state
    }

    /// Run the whole sequence, then switch the backlight on.
    ///
    /// All commands go out under one transport session; it is closed before
    /// the backlight is touched.
    pub fn run<T: Transport, B: Backlight>(
        &mut self,
        transport: &mut T,
        backlight: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<(), PanelError<T::Error>> {
        self.state = InitState::Unreset;

        transport
            .hard_reset(delay, M::RESET_PULSE_US, M::RESET_SETTLE_MS)
            .map_err(PanelError::Bus)?;
        self.advance(InitState::HardReset);

        {
            let mut session = transport.open().map_err(PanelError::Bus)?;
            run_steps(&mut session, M::SOFT_RESET, delay)?;
            self.advance(InitState::SoftReset);
            run_steps(&mut session, M::CONFIGURE, delay)?;
            self.advance(InitState::ConfiguringDisplay);
            run_steps(&mut session, M::SLEEP_EXIT, delay)?;
            self.advance(InitState::SleepExit);
            run_steps(&mut session, M::DISPLAY_ON, delay)?;
        }

        backlight.enable().map_err(PanelError::Backlight)?;
        self.advance(InitState::DisplayOn);
        info!("{}: display on", M::NAME);
        Ok(())
    }

    fn advance(&mut self, to: InitState) {
        debug_assert_eq!(self.state.next(), Some(to));
        debug!("{}: {:?} -> {:?}", M::NAME, self.state, to);
        self.state = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backlight::GpioBacklight;
    use crate::error::BacklightError;
    use crate::mock::{Event, Log, MockDelay, MockError, MockPin, RecordingTransport};
    use crate::models::{Ili9488, Ssd2119};

    const ILI9488_ORDER: [u8; 17] = [
        0x01, 0x28, 0xE0, 0xE1, 0xC0, 0xC1, 0xC5, 0x36, 0x3A, 0xB0, 0xB1, 0x21, 0xB4, 0x53, 0x51, 0x11, 0x29,
    ];

    #[test]
    fn states_are_strictly_linear() {
        let mut s = InitState::Unreset;
        let mut seen = vec![s];
        while let Some(n) = s.next() {
            assert!(n > s);
            seen.push(n);
            s = n;
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(s, InitState::DisplayOn);
    }

    #[test]
    fn ili9488_sequence_and_timing() {
        let log = Log::default();
        let mut t = RecordingTransport::new(&log);
        let mut bl = GpioBacklight::new(MockPin::backlight(&log));
        let mut init = PanelInitializer::<Ili9488>::new();
        init.run(&mut t, &mut bl, &mut MockDelay::new(&log)).unwrap();

        assert_eq!(init.state(), InitState::DisplayOn);
        assert_eq!(log.commands(), ILI9488_ORDER);

        let ev = log.events();
        assert_eq!(
            ev[..5],
            [
                Event::Reset(true),
                Event::DelayUs(10_000),
                Event::Reset(false),
                Event::DelayMs(120),
                Event::Command(0x01, vec![]),
            ]
        );
        assert_eq!(ev[5], Event::DelayMs(240));
        assert_eq!(
            ev[ev.len() - 5..],
            [
                Event::Command(0x11, vec![]),
                Event::DelayMs(120),
                Event::Command(0x29, vec![]),
                Event::DelayMs(50),
                Event::Backlight(true),
            ]
        );
    }

    #[test]
    fn ssd2119_runs_its_register_table() {
        let log = Log::default();
        let mut t = RecordingTransport::new(&log);
        let mut bl = GpioBacklight::new(MockPin::backlight(&log));
        let mut init = PanelInitializer::<Ssd2119>::new();
        init.run(&mut t, &mut bl, &mut MockDelay::new(&log)).unwrap();

        let expected: Vec<u8> = [
            0x28, 0x00, 0x10, 0x01, 0x02, 0x03, 0x11, 0x0F, 0x0B, 0x0C, 0x0D, 0x0E, 0x1E, 0x25, 0x26, 0x12, 0x30,
            0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x3A, 0x3B, 0x07, 0x22,
        ]
        .to_vec();
        assert_eq!(log.commands(), expected);
        assert_eq!(log.events()[1], Event::DelayUs(40));
        assert!(log.events().contains(&Event::Command(0x11, vec![0x6E, 0x70])));
        assert_eq!(log.events().last(), Some(&Event::Backlight(true)));
    }

    #[test]
    fn bus_failure_stops_mid_configure() {
        let log = Log::default();
        let mut t = RecordingTransport::new(&log).failing_on(0x3A);
        let mut bl = GpioBacklight::new(MockPin::backlight(&log));
        let mut init = PanelInitializer::<Ili9488>::new();
        let err = init.run(&mut t, &mut bl, &mut MockDelay::new(&log));

        assert_eq!(err, Err(PanelError::Bus(MockError)));
        assert_eq!(init.state(), InitState::SoftReset);
        assert_eq!(log.commands().last(), Some(&0x36));
        assert!(!log.events().contains(&Event::Backlight(true)));
    }

    #[test]
    fn busy_transport_fails_after_reset() {
        let log = Log::default();
        let mut t = RecordingTransport::new(&log);
        t.busy = true;
        let mut bl = GpioBacklight::new(MockPin::backlight(&log));
        let mut init = PanelInitializer::<Ili9488>::new();

        assert!(init.run(&mut t, &mut bl, &mut MockDelay::new(&log)).is_err());
        assert_eq!(init.state(), InitState::HardReset);
        assert!(log.commands().is_empty());
    }

    #[test]
    fn backlight_failure_leaves_panel_short_of_display_on() {
        let log = Log::default();
        let mut t = RecordingTransport::new(&log);
        let mut bl = GpioBacklight::new(MockPin::backlight(&log).failing());
        let mut init = PanelInitializer::<Ili9488>::new();
        let err = init.run(&mut t, &mut bl, &mut MockDelay::new(&log));

        assert!(matches!(err, Err(PanelError::Backlight(BacklightError::Pin(_)))));
        assert_eq!(init.state(), InitState::SleepExit);
        assert_eq!(log.commands().last(), Some(&0x29));
    }
}
