//! Pellet-seeking steering used to drive the player in headless runs.

use std::collections::{HashSet, VecDeque};

use crate::level::Level;
use crate::mover::Mover;
use crate::types::{Direction, GridPos, PelletKind};

/// First step of a shortest walk from the mover's cell to the nearest pellet.
///
/// Warp cells are expanded into their partner as well, so the walk may go
/// through a tunnel. Returns `Direction::None` when nothing is reachable.
pub fn choose_direction(level: &Level, mover: &Mover) -> Direction {
    let start = mover.grid_cell(level);
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);

    for dir in Direction::CARDINALS {
        let next = start.offset(dir);
        if level.is_walkable(next) && visited.insert(next) {
            queue.push_back((next, dir));
        }
    }

    while let Some((cell, first)) = queue.pop_front() {
        if level.pellet_at(cell.col, cell.row) != PelletKind::None {
            return first;
        }
        for next in neighbors(level, cell) {
            if visited.insert(next) {
                queue.push_back((next, first));
            }
        }
    }

    Direction::None
}

fn neighbors(level: &Level, cell: GridPos) -> impl Iterator<Item = GridPos> + '_ {
    Direction::CARDINALS
        .into_iter()
        .map(move |dir| cell.offset(dir))
        .chain(level.warp_target(cell))
        .filter(move |next| level.is_walkable(*next))
}
