//! Solomon Systech SSD2119, 320x240, driven over 4-wire SPI with a D/C line.
//!
//! Registers are 16 bits wide; every table entry is a register index
//! followed by its value, high byte first.

use crate::clip::AddressWindow;
use crate::encoder::command;
use crate::error::PanelError;
use crate::models::{Geometry, InitStep, Model};
use crate::transport::Session;

/// SSD2119 register indices.
pub struct Reg;

impl Reg {
    pub const OSCILLATION_START: u8 = 0x00;
    pub const OUTPUT_CONTROL: u8 = 0x01;
    pub const LCD_DRIVE_AC_CONTROL: u8 = 0x02;
    pub const POWER_CONTROL_1: u8 = 0x03;
    pub const DISPLAY_CONTROL: u8 = 0x07;
    pub const FRAME_CYCLE_CONTROL: u8 = 0x0B;
    pub const POWER_CONTROL_2: u8 = 0x0C;
    pub const POWER_CONTROL_3: u8 = 0x0D;
    pub const POWER_CONTROL_4: u8 = 0x0E;
    pub const GATE_SCAN_START: u8 = 0x0F;
    pub const SLEEP_MODE_1: u8 = 0x10;
    pub const ENTRY_MODE: u8 = 0x11;
    pub const SLEEP_MODE_2: u8 = 0x12;
    pub const POWER_CONTROL_5: u8 = 0x1E;
    pub const WRITE_GRAM: u8 = 0x22;
    pub const FRAME_FREQUENCY: u8 = 0x25;
    pub const ANALOG_SETTING: u8 = 0x26;
    pub const VCOM_OTP: u8 = 0x28;
    pub const GAMMA_1: u8 = 0x30;
    pub const GAMMA_2: u8 = 0x31;
    pub const GAMMA_3: u8 = 0x32;
    pub const GAMMA_4: u8 = 0x33;
    pub const GAMMA_5: u8 = 0x34;
    pub const GAMMA_6: u8 = 0x35;
    pub const GAMMA_7: u8 = 0x36;
    pub const GAMMA_8: u8 = 0x37;
    pub const GAMMA_9: u8 = 0x3A;
    pub const GAMMA_10: u8 = 0x3B;
    pub const V_RAM_POS: u8 = 0x44;
    pub const H_RAM_START: u8 = 0x45;
    pub const H_RAM_END: u8 = 0x46;
    pub const GRAM_ADDR_X: u8 = 0x4E;
    pub const GRAM_ADDR_Y: u8 = 0x4F;
}

/// Upper bits of the entry mode register; the low byte carries the scan direction.
pub const ENTRY_MODE_UPPER_BITS: u16 = 0x6E40;
pub const ROT_0: u16 = 0x30;

const ENTRY_MODE: [u8; 2] = (ENTRY_MODE_UPPER_BITS | ROT_0).to_be_bytes();

pub struct Ssd2119;

impl Model for Ssd2119 {
    const NAME: &'static str = "ssd2119";
    const GEOMETRY: Geometry = Geometry { width: 320, height: 240 };
    const WRITE_MEMORY: u8 = Reg::WRITE_GRAM;

    const RESET_PULSE_US: u32 = 40;
    const RESET_SETTLE_MS: u32 = 120;

    // The hardware reset is the only reset this controller needs.
    const SOFT_RESET: &'static [InitStep] = &[];

    // Sleep exit (0x10) and display on (0x07) are interleaved with the power
    // setup in this order; the whole table runs in the configure phase.
    const CONFIGURE: &'static [InitStep] = &[
        InitStep::Cmd(Reg::VCOM_OTP, &[0x00, 0x06]),
        InitStep::Cmd(Reg::OSCILLATION_START, &[0x00, 0x01]),
        InitStep::Cmd(Reg::SLEEP_MODE_1, &[0x00, 0x00]),
        InitStep::Cmd(Reg::OUTPUT_CONTROL, &[0x30, 0xEF]),
        InitStep::Cmd(Reg::LCD_DRIVE_AC_CONTROL, &[0x06, 0x00]),
        InitStep::Cmd(Reg::POWER_CONTROL_1, &[0x6A, 0x38]),
        InitStep::Cmd(Reg::ENTRY_MODE, &ENTRY_MODE),
        InitStep::Cmd(Reg::GATE_SCAN_START, &[0x00, 0x00]),
        InitStep::Cmd(Reg::FRAME_CYCLE_CONTROL, &[0x53, 0x08]),
        InitStep::Cmd(Reg::POWER_CONTROL_2, &[0x00, 0x03]),
        InitStep::Cmd(Reg::POWER_CONTROL_3, &[0x00, 0x0A]),
        InitStep::Cmd(Reg::POWER_CONTROL_4, &[0x2E, 0x00]),
        InitStep::Cmd(Reg::POWER_CONTROL_5, &[0x00, 0xBE]),
        InitStep::Cmd(Reg::FRAME_FREQUENCY, &[0xA0, 0x00]),
        InitStep::Cmd(Reg::ANALOG_SETTING, &[0x78, 0x00]),
        InitStep::Cmd(Reg::SLEEP_MODE_2, &[0x08, 0xD9]),
        InitStep::Cmd(Reg::GAMMA_1, &[0x00, 0x00]),
        InitStep::Cmd(Reg::GAMMA_2, &[0x01, 0x04]),
        InitStep::Cmd(Reg::GAMMA_3, &[0x01, 0x00]),
        InitStep::Cmd(Reg::GAMMA_4, &[0x03, 0x05]),
        InitStep::Cmd(Reg::GAMMA_5, &[0x05, 0x05]),
        InitStep::Cmd(Reg::GAMMA_6, &[0x03, 0x05]),
        InitStep::Cmd(Reg::GAMMA_7, &[0x07, 0x07]),
        InitStep::Cmd(Reg::GAMMA_8, &[0x03, 0x00]),
        InitStep::Cmd(Reg::GAMMA_9, &[0x12, 0x00]),
        InitStep::Cmd(Reg::GAMMA_10, &[0x08, 0x00]),
        InitStep::Cmd(Reg::DISPLAY_CONTROL, &[0x00, 0x33]),
        InitStep::Cmd(Reg::WRITE_GRAM, &[0x00, 0x00]),
    ];

    const SLEEP_EXIT: &'static [InitStep] = &[];
    const DISPLAY_ON: &'static [InitStep] = &[];

    fn set_address_window<S: Session>(session: &mut S, window: &AddressWindow) -> Result<(), PanelError<S::Error>> {
        let [x_hi, x_lo, xe_hi, xe_lo] = window.columns;
        let [y_hi, y_lo, _, ye_lo] = window.pages;
        // rows fit in one byte: end in the high byte, start in the low byte
        command(session, Reg::V_RAM_POS, &[ye_lo, y_lo])?;
        command(session, Reg::H_RAM_START, &[x_hi, x_lo])?;
        command(session, Reg::H_RAM_END, &[xe_hi, xe_lo])?;
        // The address counter auto-increments on GRAM writes; park it at the
        // window origin so the write starts from the top-left corner.
        command(session, Reg::GRAM_ADDR_X, &[x_hi, x_lo])?;
        command(session, Reg::GRAM_ADDR_Y, &[y_hi, y_lo])
    }
}
