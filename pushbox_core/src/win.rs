use crate::{
    board::Board,
    catalog::{EntityKind, TileKind},
};

/// The puzzle is solved when every goal holds a box.
///
/// A board without goals counts as solved.
pub fn has_won(board: &Board) -> bool {
    board
        .cells()
        .iter()
        .filter(|cell| cell.tile == TileKind::Goal)
        .all(|cell| cell.entity == EntityKind::Box)
}

/// Returns `(covered, total)` goal counts.
pub fn goal_progress(board: &Board) -> (usize, usize) {
    board
        .cells()
        .iter()
        .filter(|cell| cell.tile == TileKind::Goal)
        .fold((0, 0), |(covered, total), cell| {
            let on_goal = usize::from(cell.entity == EntityKind::Box);
            (covered + on_goal, total + 1)
        })
}
