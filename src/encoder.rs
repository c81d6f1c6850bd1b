//! Command encoder: the one call site application logic uses to talk to a panel.
//!
//! Call sites read `command(&mut session, CMD, &[b0, b1, ...])`. The encoder
//! never looks at the controller type; the bound transport decides how the
//! bytes reach the hardware.

use heapless::Vec;
use log::trace;

use crate::error::PanelError;
use crate::transport::Session;

/// Longest inline parameter list (the ILI9488 gamma tables carry 15).
pub const MAX_PARAMS: usize = 16;

/// A command byte plus its inline parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    pub cmd: u8,
    pub params: Vec<u8, MAX_PARAMS>,
}

impl CommandFrame {
    /// `None` when `params` does not fit in [`MAX_PARAMS`].
    pub fn new(cmd: u8, params: &[u8]) -> Option<Self> {
        let mut frame = Self { cmd, params: Vec::new() };
        frame.params.extend_from_slice(params).ok()?;
        Some(frame)
    }
}

/// Pack `params` into a [`CommandFrame`] and send it through `session`.
pub fn command<S: Session>(session: &mut S, cmd: u8, params: &[u8]) -> Result<(), PanelError<S::Error>> {
    let frame = CommandFrame::new(cmd, params).ok_or(PanelError::OutOfBounds)?;
    trace!("cmd {:#04x} {:02x?}", frame.cmd, frame.params.as_slice());
    session.send_command(frame.cmd, &frame.params).map_err(PanelError::Bus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Event, Log, RecordingSession};

    #[test]
    fn frame_holds_params_in_order() {
        let f = CommandFrame::new(0xC5, &[0x00, 0x12, 0x80]).unwrap();
        assert_eq!(f.cmd, 0xC5);
        assert_eq!(f.params.as_slice(), &[0x00, 0x12, 0x80]);
    }

    #[test]
    fn oversized_parameter_list_is_rejected() {
        assert!(CommandFrame::new(0xE0, &[0u8; MAX_PARAMS]).is_some());
        assert!(CommandFrame::new(0xE0, &[0u8; MAX_PARAMS + 1]).is_none());

        let log = Log::default();
        let mut s = RecordingSession::new(&log);
        assert_eq!(command(&mut s, 0xE0, &[0u8; 17]), Err(PanelError::OutOfBounds));
        assert!(log.events().is_empty());
    }

    #[test]
    fn forwards_to_the_session() {
        let log = Log::default();
        let mut s = RecordingSession::new(&log);
        command(&mut s, 0x3A, &[0x55]).unwrap();
        command(&mut s, 0x29, &[]).unwrap();
        assert_eq!(
            log.events(),
            vec![Event::Command(0x3A, vec![0x55]), Event::Command(0x29, vec![])]
        );
    }
}
