//! Wire protocol of the 8x8 button/LED grid controller.
//!
//! Every message in either direction is three bytes. Lighting a pad is
//! `{0x90, x + 16 * y, color | flags}`; a pad press arrives as
//! `{0x90, key, 0x7F}` and the top-row control buttons as `{0xB0, key, value}`.

use std::{collections::VecDeque, io, ops::BitOr, time::Duration};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Direction, board::Board, catalog::LightColor};

/// Side length of the controller's pad grid.
pub const GRID_SIZE: usize = 8;

pub const STATUS_NOTE_ON: u8 = 0x90;
pub const STATUS_CONTROL_CHANGE: u8 = 0xB0;
pub const VELOCITY_PRESSED: u8 = 0x7F;
/// Control-change number of the first top-row button, used for reset.
pub const RESET_CONTROLLER: u8 = 104;

/// Pause between two diagonals of the win sweep.
pub const SWEEP_STEP_DELAY: Duration = Duration::from_millis(40);
/// Pause after the last diagonal, before the session ends.
pub const SWEEP_FINAL_DELAY: Duration = Duration::from_millis(1500);

/// Colors the win sweep may be drawn in.
pub const CELEBRATION_PALETTE: [LightColor; 5] = [
    LightColor::GREEN,
    LightColor::AMBER,
    LightColor::RED,
    LightColor::ORANGE,
    LightColor::LIME,
];

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device {path} is unavailable: {reason}")]
    Unavailable { path: String, reason: String },
    #[error("Device stream closed")]
    Closed,
    #[error("Device I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Double-buffering bits carried next to the color in the velocity byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LightFlags(u8);

impl LightFlags {
    pub const NONE: LightFlags = LightFlags(0);
    pub const COPY: LightFlags = LightFlags(0x04);
    pub const CLEAR: LightFlags = LightFlags(0x08);
    const MASK: u8 = 0x0C;

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: LightFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for LightFlags {
    type Output = LightFlags;

    fn bitor(self, rhs: LightFlags) -> LightFlags {
        LightFlags(self.0 | rhs.0)
    }
}

/// Sets one pad's LED.
///
/// Coordinates are always inside the 8x8 grid, so the key fits in a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightCommand {
    x: u8,
    y: u8,
    color: LightColor,
    flags: LightFlags,
}

impl LightCommand {
    /// Returns `None` for a pad outside the controller's grid.
    pub fn new(x: usize, y: usize, color: LightColor, flags: LightFlags) -> Option<Self> {
        if x >= GRID_SIZE || y >= GRID_SIZE {
            return None;
        }
        Some(LightCommand {
            x: x as u8,
            y: y as u8,
            color,
            flags,
        })
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    pub fn color(&self) -> LightColor {
        self.color
    }

    pub fn flags(&self) -> LightFlags {
        self.flags
    }

    #[inline]
    pub fn key(&self) -> u8 {
        self.x + 16 * self.y
    }

    #[inline]
    pub fn velocity(&self) -> u8 {
        self.color.bits() | self.flags.bits()
    }

    pub fn to_bytes(&self) -> [u8; 3] {
        [STATUS_NOTE_ON, self.key(), self.velocity()]
    }

    /// Parses bytes produced by [`LightCommand::to_bytes`].
    pub fn from_bytes(bytes: [u8; 3]) -> Option<LightCommand> {
        let [status, key, velocity] = bytes;
        if status != STATUS_NOTE_ON {
            return None;
        }
        let flags = LightFlags(velocity & LightFlags::MASK);
        let color = LightColor::new(velocity & 0x03, (velocity >> 4) & 0x03);
        LightCommand::new(usize::from(key % 16), usize::from(key / 16), color, flags)
    }
}

/// Raw 3-byte message received from the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputPacket {
    pub status: u8,
    pub key: u8,
    pub velocity: u8,
}

impl InputPacket {
    pub const fn new(status: u8, key: u8, velocity: u8) -> Self {
        InputPacket {
            status,
            key,
            velocity,
        }
    }

    /// A press of the pad at `(x, y)`: column in the low nibble, row in the
    /// high nibble. Higher bits of either coordinate are dropped.
    pub const fn press(x: u8, y: u8) -> Self {
        InputPacket::new(STATUS_NOTE_ON, (x & 0x0F) | (y << 4), VELOCITY_PRESSED)
    }

    pub const fn reset() -> Self {
        InputPacket::new(STATUS_CONTROL_CHANGE, RESET_CONTROLLER, VELOCITY_PRESSED)
    }
}

impl From<[u8; 3]> for InputPacket {
    fn from([status, key, velocity]: [u8; 3]) -> Self {
        InputPacket::new(status, key, velocity)
    }
}

/// What a controller message means to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Move(Direction),
    ResetRequested,
    Ignored,
}

/// One cell per pad, entity color over tile color, row-major.
///
/// Cells beyond the controller's 8x8 surface have no pad and are skipped.
pub fn encode_board(board: &Board) -> Vec<LightCommand> {
    board
        .cells()
        .enumerate()
        .filter_map(|(pos, cell)| {
            let color = cell
                .entity
                .attributes()
                .color
                .unwrap_or(cell.tile.attributes().color);
            LightCommand::new(pos.x, pos.y, color, LightFlags::COPY | LightFlags::CLEAR)
        })
        .collect()
}

/// Maps a controller message to a game event.
///
/// Pads on the outer ring steer the player: left column left, right column
/// right, top row up, bottom row down. Columns are checked before rows, so
/// the corners steer sideways. Interior pads and the side buttons in
/// column 8 are ignored.
pub fn decode_input_packet(packet: InputPacket) -> InputEvent {
    let event = match packet {
        InputPacket {
            status: STATUS_NOTE_ON,
            key,
            velocity: VELOCITY_PRESSED,
        } => {
            let (x, y) = (usize::from(key % 16), usize::from(key / 16));
            let last = GRID_SIZE - 1;
            if x > last || y > last {
                InputEvent::Ignored
            } else if x == 0 {
                InputEvent::Move(Direction::Left)
            } else if x == last {
                InputEvent::Move(Direction::Right)
            } else if y == 0 {
                InputEvent::Move(Direction::Up)
            } else if y == last {
                InputEvent::Move(Direction::Down)
            } else {
                InputEvent::Ignored
            }
        }
        InputPacket {
            status: STATUS_CONTROL_CHANGE,
            key: RESET_CONTROLLER,
            ..
        } => InputEvent::ResetRequested,
        _ => InputEvent::Ignored,
    };
    debug!(?packet, ?event, "decoded controller packet");
    event
}

/// Byte stream to and from the controller.
pub trait PacketStream {
    /// Blocks until a full packet has arrived. There is no timeout.
    fn next_packet(&mut self) -> Result<InputPacket, DeviceError>;

    /// Returns a packet only if one is already buffered.
    fn poll_packet(&mut self) -> Result<Option<InputPacket>, DeviceError>;

    fn send(&mut self, commands: &[LightCommand]) -> Result<(), DeviceError>;
}

/// Throws away everything the controller sent before now, without blocking.
///
/// Returns the number of packets discarded.
pub fn clear_pending_input<S: PacketStream + ?Sized>(stream: &mut S) -> Result<usize, DeviceError> {
    let mut drained = 0;
    while stream.poll_packet()?.is_some() {
        drained += 1;
    }
    if drained > 0 {
        debug!(drained, "discarded stale controller input");
    }
    Ok(drained)
}

/// One diagonal of the win sweep and how long to hold it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFrame {
    pub commands: Vec<LightCommand>,
    pub hold: Duration,
}

/// Diagonal sweep from the top-left corner, one anti-diagonal per frame.
pub fn win_transition(color: LightColor) -> Vec<SweepFrame> {
    let diagonals = 2 * GRID_SIZE;
    (0..diagonals)
        .map(|i| {
            let commands = (0..=i)
                .map(|j| (j, i - j))
                .filter_map(|(x, y)| LightCommand::new(x, y, color, LightFlags::NONE))
                .collect();
            let hold = if i + 1 == diagonals {
                SWEEP_FINAL_DELAY
            } else {
                SWEEP_STEP_DELAY
            };
            SweepFrame { commands, hold }
        })
        .collect()
}

/// Picks the color of the win sweep.
pub fn celebration_color<R: Rng>(rng: &mut R) -> LightColor {
    CELEBRATION_PALETTE[rng.random_range(0..CELEBRATION_PALETTE.len())]
}

/// In-memory controller: tests queue input bytes and inspect what was sent.
#[derive(Debug, Default)]
pub struct MemoryStream {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_packet(&mut self, packet: InputPacket) {
        self.input.extend([packet.status, packet.key, packet.velocity]);
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.input.extend(bytes);
    }

    pub fn pending_bytes(&self) -> usize {
        self.input.len()
    }

    /// Everything sent so far, parsed back into commands.
    pub fn sent_commands(&self) -> Vec<LightCommand> {
        self.output
            .chunks_exact(3)
            .filter_map(|c| LightCommand::from_bytes([c[0], c[1], c[2]]))
            .collect()
    }

    fn take_packet(&mut self) -> Option<InputPacket> {
        if self.input.len() < 3 {
            return None;
        }
        let mut bytes = [0u8; 3];
        for b in &mut bytes {
            *b = self.input.pop_front()?;
        }
        Some(InputPacket::from(bytes))
    }
}

impl PacketStream for MemoryStream {
    fn next_packet(&mut self) -> Result<InputPacket, DeviceError> {
        self.take_packet().ok_or(DeviceError::Closed)
    }

    fn poll_packet(&mut self) -> Result<Option<InputPacket>, DeviceError> {
        Ok(self.take_packet())
    }

    fn send(&mut self, commands: &[LightCommand]) -> Result<(), DeviceError> {
        for command in commands {
            self.output.extend_from_slice(&command.to_bytes());
        }
        Ok(())
    }
}
