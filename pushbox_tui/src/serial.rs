use std::{
    io::{self, Read, Write},
    time::Duration,
};

use pushbox_core::device::{DeviceError, InputPacket, LightCommand, PacketStream};
use serialport::SerialPort;
use tracing::{debug, info};

/// How long a single read waits before the loop asks the port again.
const READ_POLL: Duration = Duration::from_millis(100);

/// The controller reached through a serial (MIDI-over-serial) port.
///
/// The port is closed when this value is dropped.
pub struct SerialStream {
    path: String,
    port: Box<dyn SerialPort>,
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("path", &self.path)
            .finish()
    }
}

impl SerialStream {
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, DeviceError> {
        let port = serialport::new(path, baud_rate)
            .timeout(READ_POLL)
            .open()
            .map_err(|e| DeviceError::Unavailable {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        info!(path, baud_rate, "controller connected");
        Ok(SerialStream {
            path: path.to_string(),
            port,
        })
    }

    fn read_full(&mut self, buf: &mut [u8]) -> Result<(), DeviceError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => return Err(DeviceError::Closed),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

impl PacketStream for SerialStream {
    fn next_packet(&mut self) -> Result<InputPacket, DeviceError> {
        let mut bytes = [0u8; 3];
        self.read_full(&mut bytes)?;
        Ok(InputPacket::from(bytes))
    }

    fn poll_packet(&mut self) -> Result<Option<InputPacket>, DeviceError> {
        let waiting = self.port.bytes_to_read().map_err(io::Error::from)?;
        if waiting < 3 {
            return Ok(None);
        }
        self.next_packet().map(Some)
    }

    fn send(&mut self, commands: &[LightCommand]) -> Result<(), DeviceError> {
        let bytes: Vec<u8> = commands.iter().flat_map(LightCommand::to_bytes).collect();
        self.port.write_all(&bytes)?;
        self.port.flush()?;
        Ok(())
    }
}

impl Drop for SerialStream {
    fn drop(&mut self) {
        debug!(path = %self.path, "controller released");
    }
}
