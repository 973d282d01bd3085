//! Occlusion goggles: open/close trigger codes over a point-to-point link.

use std::io::Write;

use tracing::{debug, error};

use crate::config::OcclusionCodes;
use crate::error::DeviceResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcclusionState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcclusionCommand {
    Open,
    Close,
}

/// Fire-and-forget command sink. No acknowledgement is awaited.
pub trait OcclusionDevice {
    fn send(&mut self, command: OcclusionCommand) -> DeviceResult<()>;
}

/// Writes a trigger code per command to any byte link, typically a serial
/// character device.
#[derive(Debug)]
pub struct SerialTrigger<W: Write> {
    link: W,
    codes: OcclusionCodes,
}

impl<W: Write> SerialTrigger<W> {
    pub fn new(link: W, codes: OcclusionCodes) -> Self {
        Self { link, codes }
    }
}

impl<W: Write> OcclusionDevice for SerialTrigger<W> {
    fn send(&mut self, command: OcclusionCommand) -> DeviceResult<()> {
        let code = match command {
            OcclusionCommand::Open => &self.codes.open,
            OcclusionCommand::Close => &self.codes.close,
        };
        self.link.write_all(code.as_bytes())?;
        self.link.flush()?;
        Ok(())
    }
}

/// Device stand-in for sessions run without goggles.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDevice;

impl OcclusionDevice for NoDevice {
    fn send(&mut self, _command: OcclusionCommand) -> DeviceResult<()> {
        Ok(())
    }
}

/// Sole owner of the occlusion state.
///
/// State only changes when a command is handed to the link without error, so
/// a failed `open` leaves the controller `Closed` and the next `ensure_open`
/// tries again. Dropping a closed controller makes one last open attempt.
#[derive(Debug)]
pub struct OcclusionController<D: OcclusionDevice> {
    device: D,
    state: OcclusionState,
}

impl<D: OcclusionDevice> OcclusionController<D> {
    /// Assumes the goggles start open; call `open` at block start to be sure.
    pub fn new(device: D) -> Self {
        Self {
            device,
            state: OcclusionState::Open,
        }
    }

    pub fn state(&self) -> OcclusionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == OcclusionState::Open
    }

    pub fn open(&mut self) -> bool {
        self.command(OcclusionCommand::Open, OcclusionState::Open)
    }

    pub fn close(&mut self) -> bool {
        self.command(OcclusionCommand::Close, OcclusionState::Closed)
    }

    /// Opens unless already open. Returns whether the goggles are now open.
    pub fn ensure_open(&mut self) -> bool {
        self.is_open() || self.open()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn command(&mut self, command: OcclusionCommand, target: OcclusionState) -> bool {
        match self.device.send(command) {
            Ok(()) => {
                debug!(?command, "occlusion command sent");
                self.state = target;
                true
            }
            Err(e) => {
                error!(?command, error = %e, "occlusion command failed");
                false
            }
        }
    }
}

impl<D: OcclusionDevice> Drop for OcclusionController<D> {
    fn drop(&mut self) {
        if !self.is_open() {
            self.open();
        }
    }
}
