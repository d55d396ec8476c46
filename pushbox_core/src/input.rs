use std::collections::VecDeque;

use crate::{
    Direction,
    device::{DeviceError, InputEvent, PacketStream, decode_input_packet},
};

/// Something the player asked the game to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Reset,
}

/// A place commands come from.
///
/// `next_command` blocks until a meaningful command is available and skips
/// anything that maps to nothing. `Ok(None)` means the source is exhausted.
pub trait InputSource {
    fn next_command(&mut self) -> Result<Option<Command>, DeviceError>;
}

/// Console key mapping: `w`/`a`/`s`/`d` move, `r` restarts the level.
pub fn command_from_key(key: char) -> Option<Command> {
    match key {
        'w' => Some(Command::Move(Direction::Up)),
        'a' => Some(Command::Move(Direction::Left)),
        's' => Some(Command::Move(Direction::Down)),
        'd' => Some(Command::Move(Direction::Right)),
        'r' => Some(Command::Reset),
        _ => None,
    }
}

impl From<InputEvent> for Option<Command> {
    fn from(event: InputEvent) -> Self {
        match event {
            InputEvent::Move(direction) => Some(Command::Move(direction)),
            InputEvent::ResetRequested => Some(Command::Reset),
            InputEvent::Ignored => None,
        }
    }
}

/// Commands decoded from the controller's pads.
#[derive(Debug)]
pub struct DeviceInput<'a, S: PacketStream + ?Sized> {
    stream: &'a mut S,
}

impl<'a, S: PacketStream + ?Sized> DeviceInput<'a, S> {
    pub fn new(stream: &'a mut S) -> Self {
        Self { stream }
    }

    pub fn stream(&mut self) -> &mut S {
        self.stream
    }
}

impl<S: PacketStream + ?Sized> InputSource for DeviceInput<'_, S> {
    fn next_command(&mut self) -> Result<Option<Command>, DeviceError> {
        loop {
            let packet = self.stream.next_packet()?;
            if let Some(command) = Option::<Command>::from(decode_input_packet(packet)) {
                return Ok(Some(command));
            }
        }
    }
}

/// A fixed list of key presses, replayed in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    keys: VecDeque<char>,
}

impl ScriptedInput {
    pub fn new(keys: &str) -> Self {
        Self {
            keys: keys.chars().collect(),
        }
    }
}

impl InputSource for ScriptedInput {
    fn next_command(&mut self) -> Result<Option<Command>, DeviceError> {
        while let Some(key) = self.keys.pop_front() {
            if let Some(command) = command_from_key(key) {
                return Ok(Some(command));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{InputPacket, MemoryStream};

    #[test]
    fn wasd_maps_to_directions() {
        assert_eq!(command_from_key('w'), Some(Command::Move(Direction::Up)));
        assert_eq!(command_from_key('a'), Some(Command::Move(Direction::Left)));
        assert_eq!(command_from_key('s'), Some(Command::Move(Direction::Down)));
        assert_eq!(command_from_key('d'), Some(Command::Move(Direction::Right)));
        assert_eq!(command_from_key('r'), Some(Command::Reset));
        assert_eq!(command_from_key('W'), None);
        assert_eq!(command_from_key('q'), None);
    }

    #[test]
    fn scripted_input_skips_unknown_keys_then_ends() {
        let mut input = ScriptedInput::new("d?x s");
        assert_eq!(
            input.next_command().unwrap(),
            Some(Command::Move(Direction::Right))
        );
        assert_eq!(
            input.next_command().unwrap(),
            Some(Command::Move(Direction::Down))
        );
        assert_eq!(input.next_command().unwrap(), None);
    }

    #[test]
    fn device_input_skips_ignored_packets() {
        let mut stream = MemoryStream::new();
        stream.push_packet(InputPacket::press(3, 3));
        stream.push_packet(InputPacket::new(0x90, 0, 0x00));
        stream.push_packet(InputPacket::press(7, 2));
        stream.push_packet(InputPacket::reset());
        let mut input = DeviceInput::new(&mut stream);
        assert_eq!(
            input.next_command().unwrap(),
            Some(Command::Move(Direction::Right))
        );
        assert_eq!(input.next_command().unwrap(), Some(Command::Reset));
        assert!(matches!(input.next_command(), Err(DeviceError::Closed)));
    }
}
