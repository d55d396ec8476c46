use tracing::info;

use crate::{
    board::{Board, LoadError, load_level},
    device::DeviceError,
    input::{Command, InputSource},
    movement::move_player,
    win::has_won,
};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Result of applying one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Moved,
    Blocked,
    Reset,
    Won,
}

impl Outcome {
    /// Whether the board looks different afterwards.
    pub fn changed_board(self) -> bool {
        !matches!(self, Outcome::Blocked)
    }
}

/// A running game: the board plus the level it was loaded from.
#[derive(Debug, Clone)]
pub struct Session {
    descriptor: String,
    width: usize,
    height: usize,
    board: Board,
}

impl Session {
    pub fn new(descriptor: impl Into<String>, width: usize, height: usize) -> Result<Self, LoadError> {
        let descriptor = descriptor.into();
        let (board, _warnings) = load_level(&descriptor, width, height)?;
        info!(width, height, player = %board.player(), "level loaded");
        Ok(Session {
            descriptor,
            width,
            height,
            board,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_won(&self) -> bool {
        has_won(&self.board)
    }

    /// Throws the board away and loads the level again from scratch.
    pub fn reset(&mut self) -> Result<(), LoadError> {
        let (board, _warnings) = load_level(&self.descriptor, self.width, self.height)?;
        self.board = board;
        info!("level reset");
        Ok(())
    }

    pub fn apply(&mut self, command: Command) -> Result<Outcome, LoadError> {
        match command {
            Command::Reset => {
                self.reset()?;
                Ok(Outcome::Reset)
            }
            Command::Move(direction) => {
                if !move_player(&mut self.board, direction) {
                    return Ok(Outcome::Blocked);
                }
                if has_won(&self.board) {
                    info!("puzzle solved");
                    Ok(Outcome::Won)
                } else {
                    Ok(Outcome::Moved)
                }
            }
        }
    }

    /// Feeds commands from `input` until the puzzle is solved or the input
    /// runs dry. `on_change` sees the input and the board after every
    /// change, so a device-backed input can mirror the board to its device.
    ///
    /// A board that is already solved returns `true` without reading input.
    pub fn play<I, F>(&mut self, input: &mut I, mut on_change: F) -> Result<bool, SessionError>
    where
        I: InputSource + ?Sized,
        F: FnMut(&mut I, &Board) -> Result<(), DeviceError>,
    {
        if self.is_won() {
            return Ok(true);
        }
        while let Some(command) = input.next_command()? {
            let outcome = self.apply(command)?;
            if outcome.changed_board() {
                on_change(input, &self.board)?;
            }
            if outcome == Outcome::Won {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
