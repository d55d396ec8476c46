use tracing::debug;

use crate::{Direction, Position, board::Board, catalog::EntityKind};

/// Tries to move the player one step in `direction`, pushing at most one box.
///
/// Returns `true` iff the board changed. A blocked move (wall, edge of the
/// board, or a box that cannot be pushed) leaves the board untouched and is
/// not an error.
pub fn move_player(board: &mut Board, direction: Direction) -> bool {
    let from = board.player();
    let Some(dest) = inside(board, from.step(direction)) else {
        return false;
    };
    let target = board.cells()[dest];
    if !target.tile.passable() {
        return false;
    }

    if target.entity == EntityKind::Box {
        let Some(box_dest) = inside(board, dest.step(direction)) else {
            return false;
        };
        let beyond = board.cells()[box_dest];
        if !beyond.tile.passable() || beyond.entity != EntityKind::None {
            return false;
        }
        board.set_entity(box_dest, EntityKind::Box);
        board.set_entity(dest, EntityKind::None);
        debug!(from = %dest, to = %box_dest, "box pushed");
    }

    // Anything other than a box standing here cannot be entered.
    if board.cells()[dest].entity != EntityKind::None {
        return false;
    }

    board.set_entity(from, EntityKind::None);
    board.set_entity(dest, EntityKind::Player);
    board.set_player(dest);
    debug!(?direction, to = %dest, "player moved");
    true
}

fn inside(board: &Board, pos: Option<Position>) -> Option<Position> {
    pos.filter(|&p| board.is_inside(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::load_level;

    fn board(rows: &[&str]) -> Board {
        let width = rows[0].len();
        load_level(&rows.concat(), width, rows.len()).unwrap().0
    }

    #[test]
    fn walks_onto_floor_and_goal() {
        let mut b = board(&["% x"]);
        assert!(move_player(&mut b, Direction::Right));
        assert!(move_player(&mut b, Direction::Right));
        assert_eq!(b.player(), Position::new(2, 0));
        assert_eq!(b.render_text(), "  %");
    }

    #[test]
    fn walls_and_edges_block() {
        let mut b = board(&["%#"]);
        assert!(!move_player(&mut b, Direction::Right));
        assert!(!move_player(&mut b, Direction::Left));
        assert!(!move_player(&mut b, Direction::Up));
        assert!(!move_player(&mut b, Direction::Down));
        assert_eq!(b.render_text(), "%#");
    }

    #[test]
    fn pushes_a_single_box() {
        let mut b = board(&["%b "]);
        assert!(move_player(&mut b, Direction::Right));
        assert_eq!(b.render_text(), " %b");
    }

    #[test]
    fn box_against_edge_wall_or_box_does_not_move() {
        for rows in [["%b"], ["%b#"], ["%bb "]] {
            let mut b = board(&rows);
            let before = b.clone();
            assert!(!move_player(&mut b, Direction::Right), "{rows:?}");
            assert_eq!(b, before);
        }
    }

    #[test]
    fn box_slides_onto_goal() {
        let mut b = board(&["%bx"]);
        assert!(move_player(&mut b, Direction::Right));
        assert_eq!(b.render_text(), " %b");
        assert_eq!(b.cells()[Position::new(2, 0)].tile, crate::catalog::TileKind::Goal);
    }

    #[test]
    fn vertical_pushes_use_downward_y() {
        let mut b = board(&["%", "b", " "]);
        assert!(move_player(&mut b, Direction::Down));
        assert_eq!(b.render_text(), " \n%\nb");
        assert!(!move_player(&mut b, Direction::Down));
        assert!(move_player(&mut b, Direction::Up));
        assert_eq!(b.player(), Position::new(0, 0));
    }
}
