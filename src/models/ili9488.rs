//! Ilitek ILI9488, 320x480, driven over the DBI type B register block
//! (URT P220MD-T panel).

use crate::clip::AddressWindow;
use crate::encoder::command;
use crate::error::PanelError;
use crate::models::{Geometry, InitStep, Model};
use crate::transport::Session;

/// MIPI DCS and ILI9488 command opcodes.
pub struct Cmd;

impl Cmd {
    pub const SOFT_RESET: u8 = 0x01;
    pub const EXIT_SLEEP_MODE: u8 = 0x11;
    pub const ENTER_INVERT_MODE: u8 = 0x21;
    pub const SET_DISPLAY_OFF: u8 = 0x28;
    pub const SET_DISPLAY_ON: u8 = 0x29;
    pub const SET_COLUMN_ADDRESS: u8 = 0x2A;
    pub const SET_PAGE_ADDRESS: u8 = 0x2B;
    pub const WRITE_MEMORY_START: u8 = 0x2C;
    pub const SET_ADDRESS_MODE: u8 = 0x36;
    pub const SET_PIXEL_FORMAT: u8 = 0x3A;
    pub const SET_DISPLAY_BRIGHTNESS: u8 = 0x51;
    pub const WRITE_CONTROL_DISPLAY: u8 = 0x53;
    pub const INTERFACE_MODE_CONTROL: u8 = 0xB0;
    pub const FRAME_RATE_CONTROL: u8 = 0xB1;
    pub const DISPLAY_INVERSION_CONTROL: u8 = 0xB4;
    pub const POWER_CONTROL_1: u8 = 0xC0;
    pub const POWER_CONTROL_2: u8 = 0xC1;
    pub const VCOM_CONTROL_1: u8 = 0xC5;
    pub const POSITIVE_GAMMA: u8 = 0xE0;
    pub const NEGATIVE_GAMMA: u8 = 0xE1;
}

const DINV_2_DOT_INVERSION: u8 = 0x02;
const DBI_16_BPP: u8 = 0x5;
const DPI_16_BPP: u8 = 0x5;
/// MX and BGR
const ADDRESS_MODE: u8 = 0x48;
/// 0x01 is 30.38 Hz; 0xA0 is 60.76 Hz
const FRAME_RATE_60HZ: u8 = 0xA0;

pub struct Ili9488;

impl Model for Ili9488 {
    const NAME: &'static str = "ili9488";
    const GEOMETRY: Geometry = Geometry { width: 320, height: 480 };
    const WRITE_MEMORY: u8 = Cmd::WRITE_MEMORY_START;

    const RESET_PULSE_US: u32 = 10_000;
    const RESET_SETTLE_MS: u32 = 120;

    const SOFT_RESET: &'static [InitStep] = &[
        InitStep::Cmd(Cmd::SOFT_RESET, &[]),
        // controller reboot
        InitStep::DelayMs(240),
    ];

    // Several registers depend on defaults set by earlier ones: keep the order.
    const CONFIGURE: &'static [InitStep] = &[
        InitStep::Cmd(Cmd::SET_DISPLAY_OFF, &[]),
        InitStep::Cmd(
            Cmd::POSITIVE_GAMMA,
            &[0x00, 0x03, 0x09, 0x08, 0x16, 0x0A, 0x3F, 0x78, 0x4C, 0x09, 0x0A, 0x08, 0x16, 0x1A, 0x0F],
        ),
        InitStep::Cmd(
            Cmd::NEGATIVE_GAMMA,
            &[0x00, 0x16, 0x19, 0x03, 0x0F, 0x05, 0x32, 0x45, 0x46, 0x04, 0x0E, 0x0D, 0x35, 0x37, 0x0F],
        ),
        InitStep::Cmd(Cmd::POWER_CONTROL_1, &[0x17, 0x15]),
        InitStep::Cmd(Cmd::POWER_CONTROL_2, &[0x41]),
        InitStep::Cmd(Cmd::VCOM_CONTROL_1, &[0x00, 0x12, 0x80]),
        InitStep::Cmd(Cmd::SET_ADDRESS_MODE, &[ADDRESS_MODE]),
        // RGB565 on both the DBI and DPI side
        InitStep::Cmd(Cmd::SET_PIXEL_FORMAT, &[DBI_16_BPP | (DPI_16_BPP << 4)]),
        InitStep::Cmd(Cmd::INTERFACE_MODE_CONTROL, &[0x00]),
        InitStep::Cmd(Cmd::FRAME_RATE_CONTROL, &[FRAME_RATE_60HZ]),
        InitStep::Cmd(Cmd::ENTER_INVERT_MODE, &[]),
        InitStep::Cmd(Cmd::DISPLAY_INVERSION_CONTROL, &[DINV_2_DOT_INVERSION]),
        // brightness control, dimming, backlight
        InitStep::Cmd(Cmd::WRITE_CONTROL_DISPLAY, &[0x28]),
        InitStep::Cmd(Cmd::SET_DISPLAY_BRIGHTNESS, &[0x7F]),
    ];

    const SLEEP_EXIT: &'static [InitStep] = &[
        InitStep::Cmd(Cmd::EXIT_SLEEP_MODE, &[]),
        InitStep::DelayMs(120),
    ];

    const DISPLAY_ON: &'static [InitStep] = &[
        InitStep::Cmd(Cmd::SET_DISPLAY_ON, &[]),
        InitStep::DelayMs(50),
    ];

    fn set_address_window<S: Session>(session: &mut S, window: &AddressWindow) -> Result<(), PanelError<S::Error>> {
        command(session, Cmd::SET_COLUMN_ADDRESS, &window.columns)?;
        command(session, Cmd::SET_PAGE_ADDRESS, &window.pages)
    }
}
