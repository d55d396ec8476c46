use pushbox_core::{
    Direction, Position,
    board::{REFERENCE_HEIGHT, REFERENCE_LEVEL, REFERENCE_WIDTH, load_level},
    catalog::{EntityKind, LightColor},
    device::{
        InputPacket, LightFlags, MemoryStream, PacketStream, clear_pending_input, encode_board,
        win_transition,
    },
    input::{Command, DeviceInput, InputSource, ScriptedInput},
    movement::move_player,
    session::{Outcome, Session},
    win::has_won,
};

/// Solves the reference level: box one right along row 1, box two down
/// column 2 and then right along row 6.
const SOLUTION: &str = "ddddaaassssasdddd";

fn reference_session() -> Session {
    Session::new(REFERENCE_LEVEL, REFERENCE_WIDTH, REFERENCE_HEIGHT).unwrap()
}

fn entity_at(session: &Session, x: usize, y: usize) -> EntityKind {
    session.board().get_cell(Position::new(x, y)).unwrap().entity
}

// ============================================================================
// Reference level
// ============================================================================

#[test]
fn test_first_push_moves_player_and_box() {
    let (mut board, _) = load_level(REFERENCE_LEVEL, REFERENCE_WIDTH, REFERENCE_HEIGHT).unwrap();
    assert_eq!(board.player(), Position::new(1, 1));
    assert!(!has_won(&board));

    assert!(move_player(&mut board, Direction::Right));

    assert_eq!(board.player(), Position::new(2, 1));
    assert_eq!(
        board.get_cell(Position::new(3, 1)).unwrap().entity,
        EntityKind::Box
    );
    assert_eq!(
        board.get_cell(Position::new(1, 1)).unwrap().entity,
        EntityKind::None
    );
    assert!(!has_won(&board));
}

#[test]
fn test_solution_wins_on_the_final_push() {
    let mut session = reference_session();
    let commands: Vec<Command> = {
        let mut input = ScriptedInput::new(SOLUTION);
        std::iter::from_fn(|| input.next_command().unwrap()).collect()
    };
    assert_eq!(commands.len(), SOLUTION.len());

    let (last, rest) = commands.split_last().unwrap();
    for command in rest {
        assert_eq!(session.apply(*command).unwrap(), Outcome::Moved, "{command:?}");
        assert!(!session.is_won());
    }
    assert_eq!(session.apply(*last).unwrap(), Outcome::Won);
    assert!(session.is_won());
    assert_eq!(entity_at(&session, 6, 1), EntityKind::Box);
    assert_eq!(entity_at(&session, 6, 6), EntityKind::Box);
}

#[test]
fn test_play_reports_the_win() {
    let mut session = reference_session();
    let mut frames = Vec::new();
    let won = session
        .play(&mut ScriptedInput::new(SOLUTION), |_, board| {
            frames.push(board.render_text());
            Ok(())
        })
        .unwrap();
    assert!(won);
    assert_eq!(frames.len(), SOLUTION.len());
    let expected = [
        "########", "#     b#", "#   #  #", "#   #  #", "#   #  #", "#   #  #", "#    %b#",
        "########",
    ]
    .join("\n");
    assert_eq!(frames.last().unwrap(), &expected);
}

#[test]
fn test_reset_after_partial_solution() {
    let mut session = reference_session();
    session
        .play(&mut ScriptedInput::new("dddd"), |_, _| Ok(()))
        .unwrap();
    assert_eq!(entity_at(&session, 6, 1), EntityKind::Box);

    assert_eq!(session.apply(Command::Reset).unwrap(), Outcome::Reset);
    assert_eq!(entity_at(&session, 2, 1), EntityKind::Box);
    assert_eq!(entity_at(&session, 6, 1), EntityKind::None);
    assert_eq!(session.board().player(), Position::new(1, 1));
}

#[test]
fn test_level_without_goals_is_won_before_any_input() {
    let mut session = Session::new("% ", 2, 1).unwrap();
    assert!(session.is_won());
    let mut redraws = 0;
    let won = session
        .play(&mut ScriptedInput::new("d"), |_, _| {
            redraws += 1;
            Ok(())
        })
        .unwrap();
    assert!(won);
    assert_eq!(redraws, 0);
    assert_eq!(session.board().player(), Position::new(0, 0));
}

// ============================================================================
// Controller round trip
// ============================================================================

#[test]
fn test_controller_drives_the_session() {
    let mut stream = MemoryStream::new();
    // Stale presses from before the game started.
    stream.push_packet(InputPacket::press(0, 4));
    stream.push_packet(InputPacket::press(0, 4));
    assert_eq!(clear_pending_input(&mut stream).unwrap(), 2);

    let mut session = reference_session();
    stream.send(&encode_board(session.board())).unwrap();

    for key in SOLUTION.chars() {
        let packet = match key {
            'd' => InputPacket::press(7, 3),
            'a' => InputPacket::press(0, 3),
            's' => InputPacket::press(3, 7),
            'w' => InputPacket::press(3, 0),
            _ => unreachable!(),
        };
        stream.push_packet(packet);
        // Interior pads are noise.
        stream.push_packet(InputPacket::press(4, 4));
    }

    let won = {
        let mut input = DeviceInput::new(&mut stream);
        session
            .play(&mut input, |input, board| {
                input.stream().send(&encode_board(board))
            })
            .unwrap()
    };
    assert!(won);

    let sent = stream.sent_commands();
    assert_eq!(sent.len(), 64 * (SOLUTION.len() + 1));
    let last_frame = &sent[sent.len() - 64..];
    let goal = last_frame.iter().find(|c| (c.x(), c.y()) == (6, 6)).unwrap();
    assert_eq!(goal.color(), LightColor::AMBER);
    assert!(
        last_frame
            .iter()
            .all(|c| c.flags() == LightFlags::COPY | LightFlags::CLEAR)
    );
}

#[test]
fn test_win_transition_lights_the_whole_surface() {
    let mut stream = MemoryStream::new();
    for frame in win_transition(LightColor::LIME) {
        stream.send(&frame.commands).unwrap();
    }
    let sent = stream.sent_commands();
    assert_eq!(sent.len(), 64);
    let mut seen = [[false; 8]; 8];
    for c in sent {
        let (x, y) = (usize::from(c.x()), usize::from(c.y()));
        assert!(!seen[y][x]);
        seen[y][x] = true;
    }
    assert!(seen.iter().flatten().all(|&lit| lit));
}
