use std::collections::HashMap;

use tracing::debug;

use crate::config::{MovementTuning, PursuitTuning};
use crate::constants::FRIGHTENED_COLOR;
use crate::level::Level;
use crate::mover::Mover;
use crate::rng::Rng;
use crate::types::{Color, Direction, GridPos};

/// Pursuit agent: a [`Mover`] steered by chase/flee decisions.
///
/// While the frightened countdown is zero the ghost greedily heads for the
/// target, penalising cells it has already walked through; while it is
/// positive the ghost slows down and wanders randomly.
#[derive(Clone, Debug)]
pub struct Ghost {
    body: Mover,
    base_speed: f64,
    primary_color: Color,
    frightened_ticks: u32,
    spawn: (f64, f64),
    visits: HashMap<GridPos, u32>,
    rng: Rng,
    tuning: PursuitTuning,
}

impl Ghost {
    pub fn new(x: f64, y: f64, size: f64, color: Color, rng: Rng) -> Self {
        Self::with_tuning(
            x,
            y,
            size,
            color,
            rng,
            MovementTuning::default(),
            PursuitTuning::default(),
        )
    }

    pub fn with_tuning(
        x: f64,
        y: f64,
        size: f64,
        color: Color,
        rng: Rng,
        movement: MovementTuning,
        tuning: PursuitTuning,
    ) -> Self {
        let body = Mover::with_tuning(x, y, size, movement.ghost_speed, movement);
        Self {
            base_speed: movement.ghost_speed,
            body,
            primary_color: color,
            frightened_ticks: 0,
            spawn: (x, y),
            visits: HashMap::new(),
            rng,
            tuning,
        }
    }

    /// One tick: countdown, speed, decision, movement, then visit bookkeeping.
    pub fn update(&mut self, level: &Level, target_x: f64, target_y: f64) {
        if self.frightened_ticks > 0 {
            self.frightened_ticks -= 1;
        }

        let speed = if self.is_frightened() {
            self.base_speed * self.tuning.frightened_speed_factor
        } else {
            self.base_speed
        };
        self.body.set_speed(speed);

        if let Some(dir) = self.next_direction(level, target_x, target_y) {
            self.body.queue_direction(dir);
        }

        self.body.update(level);

        let cell = self.body.grid_cell(level);
        *self.visits.entry(cell).or_insert(0) += 1;
    }

    fn next_direction(&mut self, level: &Level, target_x: f64, target_y: f64) -> Option<Direction> {
        if !self.needs_decision(level) {
            return None;
        }

        let mut options = self.available_directions(level);
        if options.is_empty() {
            return None;
        }
        self.rng.shuffle(&mut options);

        if self.is_frightened() {
            let idx = self.rng.pick_index(options.len());
            return Some(options[idx]);
        }

        let tile_size = level.tile_size();
        let (cx, cy) = self.body.center();
        let mut best: Option<(f64, Direction)> = None;
        for dir in options {
            let (dx, dy) = dir.delta();
            let ahead_x = cx + dx as f64 * tile_size;
            let ahead_y = cy + dy as f64 * tile_size;
            let visits = self.visit_count(level.grid_for_pixel(ahead_x, ahead_y));
            let score = (target_x - ahead_x).hypot(target_y - ahead_y)
                + visits as f64 * self.tuning.visit_penalty;
            if best.is_none_or(|(best_score, _)| score < best_score) {
                best = Some((score, dir));
            }
        }

        let choice = best.map(|(_, dir)| dir);
        debug!(?choice, x = cx, y = cy, "ghost re-targeted");
        choice
    }

    fn needs_decision(&mut self, level: &Level) -> bool {
        let current = self.body.direction();
        if current == Direction::None || !self.body.can_move(level, current) {
            return true;
        }
        if self.at_intersection(level) {
            return true;
        }
        let reroll = if self.is_frightened() {
            self.tuning.frightened_reroll_chance
        } else {
            self.tuning.hostile_reroll_chance
        };
        self.rng.chance(reroll)
    }

    fn at_intersection(&self, level: &Level) -> bool {
        let (cx, cy) = self.body.center();
        let (center_x, center_y) = level.cell_center(level.grid_for_pixel(cx, cy));
        let tolerance = self.tuning.intersection_tolerance * level.tile_size();
        (center_x - cx).abs() < tolerance && (center_y - cy).abs() < tolerance
    }

    fn available_directions(&self, level: &Level) -> Vec<Direction> {
        let opposite = self.body.direction().opposite();
        let valid: Vec<Direction> = Direction::CARDINALS
            .into_iter()
            .filter(|dir| *dir != opposite && self.body.can_move(level, *dir))
            .collect();
        if valid.is_empty() && opposite != Direction::None && self.body.can_move(level, opposite) {
            return vec![opposite];
        }
        valid
    }

    /// Extends vulnerability; a shorter request never cuts it down.
    pub fn set_frightened(&mut self, duration: u32) {
        if duration > self.frightened_ticks {
            self.frightened_ticks = duration;
        }
    }

    pub fn is_frightened(&self) -> bool {
        self.frightened_ticks > 0
    }

    pub fn frightened_ticks(&self) -> u32 {
        self.frightened_ticks
    }

    pub fn color(&self) -> Color {
        if self.is_frightened() {
            FRIGHTENED_COLOR
        } else {
            self.primary_color
        }
    }

    /// Back to the spawn point with no vulnerability and no path memory.
    pub fn reset(&mut self) {
        let (x, y) = self.spawn;
        self.respawn_at(x, y);
    }

    pub fn respawn_at(&mut self, x: f64, y: f64) {
        self.body.set_position(x, y);
        self.body.set_speed(self.base_speed);
        self.frightened_ticks = 0;
        self.visits.clear();
    }

    pub fn visit_count(&self, cell: GridPos) -> u32 {
        self.visits.get(&cell).copied().unwrap_or(0)
    }

    pub fn position(&self) -> (f64, f64) {
        self.body.position()
    }

    pub fn center(&self) -> (f64, f64) {
        self.body.center()
    }

    pub fn size(&self) -> f64 {
        self.body.size()
    }

    pub fn direction(&self) -> Direction {
        self.body.direction()
    }

    pub fn spawn(&self) -> (f64, f64) {
        self.spawn
    }

    pub fn body(&self) -> &Mover {
        &self.body
    }
}
