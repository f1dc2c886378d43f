use crate::config::MovementTuning;
use crate::level::Level;
use crate::types::{Direction, GridPos};

/// Grid-constrained movement shared by the player and the ghosts.
///
/// A requested heading is only committed once the mover sits close enough to
/// a grid line on the perpendicular axis and the next step is free, which
/// gives snapped turns at junctions instead of free 2D movement.
#[derive(Clone, Debug)]
pub struct Mover {
    x: f64,
    y: f64,
    size: f64,
    speed: f64,
    dir: Direction,
    queued: Direction,
    tuning: MovementTuning,
    // Destination of the last warp; its own link is ignored until the center leaves it.
    warp_guard: Option<GridPos>,
}

impl Mover {
    pub fn new(x: f64, y: f64, size: f64, speed: f64) -> Self {
        Self::with_tuning(x, y, size, speed, MovementTuning::default())
    }

    pub fn with_tuning(x: f64, y: f64, size: f64, speed: f64, tuning: MovementTuning) -> Self {
        Self {
            x,
            y,
            size,
            speed,
            dir: Direction::None,
            queued: Direction::None,
            tuning,
            warp_guard: None,
        }
    }

    /// Records the latest requested heading, replacing any pending one.
    pub fn queue_direction(&mut self, dir: Direction) {
        self.queued = dir;
    }

    pub fn update(&mut self, level: &Level) {
        let tile_size = level.tile_size();
        self.apply_queued(level, tile_size);

        if self.dir == Direction::None {
            return;
        }

        if self.can_move(level, self.dir) {
            let (dx, dy) = self.dir.delta();
            self.x += dx as f64 * self.speed;
            self.y += dy as f64 * self.speed;
            self.handle_warp(level);
            return;
        }

        self.snap_to_grid(tile_size);
        self.dir = Direction::None;
    }

    fn apply_queued(&mut self, level: &Level, tile_size: f64) {
        if self.queued == Direction::None {
            return;
        }
        let threshold = self.tuning.turn_threshold(tile_size);
        let (x, y) = (self.x, self.y);
        let (snapped_x, snapped_y) = if self.queued.is_vertical() {
            if grid_offset(x, tile_size) > threshold {
                return;
            }
            (snap(x, tile_size), y)
        } else {
            if grid_offset(y, tile_size) > threshold {
                return;
            }
            (x, snap(y, tile_size))
        };

        let (dx, dy) = self.queued.delta();
        let next_x = snapped_x + dx as f64 * self.speed;
        let next_y = snapped_y + dy as f64 * self.speed;
        if level.collides(next_x, next_y, self.size) {
            return;
        }

        self.x = snapped_x;
        self.y = snapped_y;
        self.dir = self.queued;
        self.queued = Direction::None;
    }

    /// One-tick lookahead in `dir` without moving.
    pub fn can_move(&self, level: &Level, dir: Direction) -> bool {
        let (dx, dy) = dir.delta();
        let next_x = self.x + dx as f64 * self.speed;
        let next_y = self.y + dy as f64 * self.speed;
        !level.collides(next_x, next_y, self.size)
    }

    fn handle_warp(&mut self, level: &Level) {
        let (cx, cy) = self.center();
        let cell = level.grid_for_pixel(cx, cy);
        if self.warp_guard == Some(cell) {
            return;
        }
        self.warp_guard = None;
        let Some(target) = level.warp_target(cell) else {
            return;
        };
        let (x, y) = level.cell_origin(target);
        self.x = x;
        self.y = y;
        self.warp_guard = Some(target);
    }

    fn snap_to_grid(&mut self, tile_size: f64) {
        self.x = snap(self.x, tile_size);
        self.y = snap(self.y, tile_size);
    }

    /// Teleports and forgets both the current and the queued heading.
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        self.dir = Direction::None;
        self.queued = Direction::None;
        self.warp_guard = None;
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.size / 2.0, self.y + self.size / 2.0)
    }

    pub fn grid_cell(&self, level: &Level) -> GridPos {
        let (cx, cy) = self.center();
        level.grid_for_pixel(cx, cy)
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    pub fn direction(&self) -> Direction {
        self.dir
    }

    pub fn queued_direction(&self) -> Direction {
        self.queued
    }
}

fn grid_offset(value: f64, tile_size: f64) -> f64 {
    let rem = value.rem_euclid(tile_size);
    rem.min(tile_size - rem)
}

fn snap(value: f64, tile_size: f64) -> f64 {
    (value / tile_size).round() * tile_size
}
