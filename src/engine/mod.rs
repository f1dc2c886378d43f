use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::constants::{DEFAULT_LAYOUT, GHOST_SPAWNS, PLAYER_SPAWN, TILE_SIZE};
use crate::error::LoadError;
use crate::ghost::Ghost;
use crate::level::Level;
use crate::mover::Mover;
use crate::rng::Rng;
use crate::types::{
    Color, Direction, GamePhase, GhostView, GridPos, PelletKind, PlayerView, RuntimeEvent,
    Snapshot,
};

pub mod autopilot;
mod spawn_system;
mod utils;

use self::utils::circles_touch;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostSpawn {
    pub cell: GridPos,
    pub color: Color,
}

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub seed: u32,
    pub config: EngineConfig,
    pub player_spawn: GridPos,
    pub ghost_spawns: Vec<GhostSpawn>,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            config: EngineConfig::default(),
            player_spawn: PLAYER_SPAWN,
            ghost_spawns: GHOST_SPAWNS
                .iter()
                .map(|&(cell, color)| GhostSpawn { cell, color })
                .collect(),
        }
    }
}

/// Headless session: one player, a handful of ghosts, score and lives.
///
/// Within a tick the player always moves first so the ghosts chase the
/// player's position as of this tick.
#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: EngineConfig,

    template: Level,
    level: Level,
    player: Mover,
    player_spawn: (f64, f64),
    ghosts: Vec<Ghost>,
    events: Vec<RuntimeEvent>,

    phase: GamePhase,
    ready_timer: u32,
    power_timer: u32,
    score: u32,
    lives: u32,
    level_number: u32,
    tick_counter: u64,
}

impl GameEngine {
    pub fn new(level: Level, options: GameEngineOptions) -> Result<Self, LoadError> {
        let mut rng = Rng::new(options.seed);
        let config = options.config;
        config.check_tile_size(level.tile_size())?;
        let player_spawn = spawn_origin(&level, options.player_spawn)?;
        let player = Mover::with_tuning(
            player_spawn.0,
            player_spawn.1,
            level.tile_size(),
            config.movement.player_speed,
            config.movement,
        );

        let mut ghosts = Vec::with_capacity(options.ghost_spawns.len());
        for spawn in &options.ghost_spawns {
            let (x, y) = spawn_origin(&level, spawn.cell)?;
            ghosts.push(Ghost::with_tuning(
                x,
                y,
                level.tile_size(),
                spawn.color,
                Rng::new(rng.fork_seed()),
                config.movement,
                config.pursuit,
            ));
        }

        Ok(Self {
            config,
            template: level.clone(),
            level,
            player,
            player_spawn,
            ghosts,
            events: Vec::new(),
            phase: GamePhase::Ready,
            ready_timer: config.session.ready_delay_ticks,
            power_timer: 0,
            score: 0,
            lives: config.session.start_lives,
            level_number: 1,
            tick_counter: 0,
        })
    }

    pub fn from_layout<S: AsRef<str>>(
        layout: &[S],
        tile_size: f64,
        options: GameEngineOptions,
    ) -> Result<Self, LoadError> {
        let level = Level::parse(layout, tile_size)?;
        Self::new(level, options)
    }

    pub fn with_default_level(options: GameEngineOptions) -> Result<Self, LoadError> {
        Self::from_layout(&DEFAULT_LAYOUT, TILE_SIZE, options)
    }

    pub fn queue_player_direction(&mut self, dir: Direction) {
        self.player.queue_direction(dir);
    }

    pub fn step(&mut self) {
        self.tick_counter += 1;
        match self.phase {
            GamePhase::Ready => {
                if self.ready_timer > 0 {
                    self.ready_timer -= 1;
                    return;
                }
                self.set_phase(GamePhase::Playing);
            }
            GamePhase::Playing => self.play_tick(),
            GamePhase::Cleared | GamePhase::GameOver => {}
        }
    }

    fn play_tick(&mut self) {
        self.player.update(&self.level);
        self.handle_pellet_pickup();
        self.update_ghosts();
        self.power_timer = self.power_timer.saturating_sub(1);
        self.check_ghost_collisions();
        if self.phase == GamePhase::GameOver {
            return;
        }
        if self.level.remaining_pellets() == 0 {
            self.events.push(RuntimeEvent::LevelCleared {
                level: self.level_number,
            });
            self.set_phase(GamePhase::Cleared);
        }
    }

    fn handle_pellet_pickup(&mut self) {
        let cell = self.player.grid_cell(&self.level);
        let kind = self.level.consume_pellet(cell.col, cell.row);
        let session = self.config.session;
        match kind {
            PelletKind::None => return,
            PelletKind::Small => self.score += session.pellet_score,
            PelletKind::Power => {
                self.score += session.power_pellet_score;
                self.activate_power_mode();
            }
        }
        self.events.push(RuntimeEvent::PelletEaten {
            kind,
            col: cell.col,
            row: cell.row,
        });
    }

    fn activate_power_mode(&mut self) {
        let duration = self.config.session.power_duration_ticks;
        self.power_timer = duration;
        for ghost in &mut self.ghosts {
            ghost.set_frightened(duration);
        }
        self.events.push(RuntimeEvent::PowerStarted {
            duration_ticks: duration,
        });
        debug!(duration, "power mode started");
    }

    fn update_ghosts(&mut self) {
        let (px, py) = self.player.center();
        for ghost in &mut self.ghosts {
            ghost.update(&self.level, px, py);
        }
    }

    fn check_ghost_collisions(&mut self) {
        let shrink = self.config.session.catch_shrinkage;
        let player_center = self.player.center();
        let player_radius = self.player.size() / 2.0 * shrink;

        let caught = self.ghosts.iter().position(|ghost| {
            circles_touch(
                player_center,
                player_radius,
                ghost.center(),
                ghost.size() / 2.0 * shrink,
            )
        });
        let Some(idx) = caught else {
            return;
        };

        if self.ghosts[idx].is_frightened() {
            let points = self.config.session.ghost_score;
            self.score += points;
            self.ghosts[idx].reset();
            self.events.push(RuntimeEvent::GhostEaten {
                ghost: idx,
                score: points,
            });
            debug!(ghost = idx, score = self.score, "ghost eaten");
        } else {
            self.lose_life();
        }
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.events.push(RuntimeEvent::LifeLost {
            lives_left: self.lives,
        });
        if self.lives == 0 {
            self.events.push(RuntimeEvent::GameOver { score: self.score });
            self.set_phase(GamePhase::GameOver);
            return;
        }
        self.power_timer = 0;
        self.reset_actor_positions();
        self.ready_timer = self.config.session.ready_delay_ticks;
        self.set_phase(GamePhase::Ready);
    }

    /// Loads the next round of the same layout, keeping score and lives.
    pub fn advance_level(&mut self) -> bool {
        if self.phase != GamePhase::Cleared {
            return false;
        }
        self.level_number += 1;
        self.reset_level(true);
        true
    }

    /// Starts over after a game over.
    pub fn restart(&mut self) -> bool {
        if self.phase != GamePhase::GameOver {
            return false;
        }
        self.level_number = 1;
        self.reset_level(false);
        true
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase == phase {
            return;
        }
        info!(
            from = ?self.phase,
            to = ?phase,
            tick = self.tick_counter,
            score = self.score,
            lives = self.lives,
            "phase changed"
        );
        self.phase = phase;
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            phase: self.phase,
            level: self.level_number,
            score: self.score,
            lives: self.lives,
            power_ticks: self.power_timer,
            pellets_left: self.level.remaining_pellets(),
            player: PlayerView {
                x: self.player.x(),
                y: self.player.y(),
                dir: self.player.direction(),
            },
            ghosts: self
                .ghosts
                .iter()
                .map(|ghost| {
                    let (x, y) = ghost.position();
                    GhostView {
                        x,
                        y,
                        dir: ghost.direction(),
                        color: ghost.color(),
                        frightened: ghost.is_frightened(),
                        frightened_ticks: ghost.frightened_ticks(),
                    }
                })
                .collect(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn power_ticks(&self) -> u32 {
        self.power_timer
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn level_number(&self) -> u32 {
        self.level_number
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn player(&self) -> &Mover {
        &self.player
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }
}

fn spawn_origin(level: &Level, cell: GridPos) -> Result<(f64, f64), LoadError> {
    if !level.is_walkable(cell) {
        return Err(LoadError::BlockedSpawn {
            col: cell.col,
            row: cell.row,
        });
    }
    Ok(level.cell_origin(cell))
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::engine::autopilot;
    use crate::engine::{GameEngine, GameEngineOptions, GhostSpawn};
    use crate::error::LoadError;
    use crate::types::{Color, Direction, GamePhase, GridPos, RuntimeEvent};

    const TILE: f64 = 16.0;

    fn quick_config(start_lives: u32) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.session.ready_delay_ticks = 0;
        config.session.start_lives = start_lives;
        config
    }

    fn options(player: (i32, i32), ghosts: &[(i32, i32)], start_lives: u32) -> GameEngineOptions {
        GameEngineOptions {
            seed: 7,
            config: quick_config(start_lives),
            player_spawn: GridPos::new(player.0, player.1),
            ghost_spawns: ghosts
                .iter()
                .map(|&(col, row)| GhostSpawn {
                    cell: GridPos::new(col, row),
                    color: Color::rgb(255, 0, 0),
                })
                .collect(),
        }
    }

    fn drain(engine: &mut GameEngine) -> Vec<RuntimeEvent> {
        engine.build_snapshot(true).events
    }

    #[test]
    fn ready_phase_counts_down_before_play() {
        let mut engine =
            GameEngine::with_default_level(GameEngineOptions::default()).expect("default level");
        let delay = engine.config.session.ready_delay_ticks;
        for _ in 0..delay {
            engine.step();
            assert_eq!(engine.phase(), GamePhase::Ready);
        }
        engine.step();
        assert_eq!(engine.phase(), GamePhase::Playing);
    }

    #[test]
    fn eating_every_pellet_clears_the_level() {
        let mut engine = GameEngine::from_layout(
            &["#######", "#  ..o#", "#######"],
            TILE,
            options((1, 1), &[], 3),
        )
        .expect("valid layout");
        engine.queue_player_direction(Direction::Right);
        for _ in 0..60 {
            engine.step();
        }
        assert_eq!(engine.phase(), GamePhase::Cleared);
        assert_eq!(engine.score(), 10 + 10 + 50);
        assert_eq!(engine.level().remaining_pellets(), 0);
        let events = drain(&mut engine);
        assert!(events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::PowerStarted { .. })));
        assert!(events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::LevelCleared { level: 1 })));
        assert!(drain(&mut engine).is_empty());
    }

    #[test]
    fn advance_level_restores_pellets_and_keeps_score() {
        let mut engine = GameEngine::from_layout(
            &["#######", "#  ..o#", "#######"],
            TILE,
            options((1, 1), &[], 3),
        )
        .expect("valid layout");
        assert!(!engine.advance_level());
        engine.queue_player_direction(Direction::Right);
        for _ in 0..60 {
            engine.step();
        }
        assert!(engine.advance_level());
        assert_eq!(engine.phase(), GamePhase::Ready);
        assert_eq!(engine.level_number(), 2);
        assert_eq!(engine.score(), 70);
        assert_eq!(engine.level().remaining_pellets(), 3);
        assert_eq!(engine.player().position(), (TILE, TILE));
        assert_eq!(engine.player().direction(), Direction::None);
    }

    #[test]
    fn power_pellet_frightens_every_ghost() {
        let mut engine = GameEngine::from_layout(
            &["#######", "# o  .#", "#######", "#     #", "#######"],
            TILE,
            options((1, 1), &[(1, 3), (5, 3)], 3),
        )
        .expect("valid layout");
        engine.queue_player_direction(Direction::Right);
        for _ in 0..11 {
            engine.step();
        }
        assert_eq!(engine.score(), 50);
        assert!(engine.power_ticks() > 0);
        assert!(engine.ghosts().iter().all(|ghost| ghost.is_frightened()));
        let snapshot = engine.build_snapshot(true);
        assert!(snapshot.ghosts.iter().all(|ghost| ghost.frightened));
        assert_eq!(snapshot.pellets_left, 1);
    }

    #[test]
    fn hostile_ghost_costs_a_life_and_resets_actors() {
        let mut engine = GameEngine::from_layout(
            &["#######", "#    .#", "#######"],
            TILE,
            options((1, 1), &[(3, 1)], 3),
        )
        .expect("valid layout");
        for _ in 0..40 {
            engine.step();
            if engine.lives() < 3 {
                break;
            }
        }
        assert_eq!(engine.lives(), 2);
        assert_eq!(engine.phase(), GamePhase::Ready);
        assert_eq!(engine.player().position(), (TILE, TILE));
        assert_eq!(engine.ghosts()[0].position(), (3.0 * TILE, TILE));
        assert_eq!(engine.level().remaining_pellets(), 1);
        assert!(drain(&mut engine)
            .iter()
            .any(|event| matches!(event, RuntimeEvent::LifeLost { lives_left: 2 })));
    }

    #[test]
    fn last_life_ends_the_game_and_restart_resets() {
        let mut engine = GameEngine::from_layout(
            &["######", "#.   #", "######"],
            TILE,
            options((2, 1), &[(4, 1)], 1),
        )
        .expect("valid layout");
        for _ in 0..40 {
            engine.step();
        }
        assert_eq!(engine.phase(), GamePhase::GameOver);
        assert_eq!(engine.lives(), 0);
        assert!(drain(&mut engine)
            .iter()
            .any(|event| matches!(event, RuntimeEvent::GameOver { .. })));

        engine.step();
        assert_eq!(engine.phase(), GamePhase::GameOver);
        assert!(engine.restart());
        assert_eq!(engine.phase(), GamePhase::Ready);
        assert_eq!(engine.lives(), 1);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.level().remaining_pellets(), 1);
    }

    #[test]
    fn frightened_ghost_is_eaten_for_points() {
        let mut engine = GameEngine::from_layout(
            &["#######", "#o   .#", "#######"],
            TILE,
            options((1, 1), &[(2, 1)], 3),
        )
        .expect("valid layout");
        for _ in 0..300 {
            engine.step();
            if engine.score() >= 250 {
                break;
            }
        }
        assert_eq!(engine.score(), 250);
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.phase(), GamePhase::Playing);
        let ghost = &engine.ghosts()[0];
        assert!(!ghost.is_frightened());
        assert_eq!(ghost.position(), (2.0 * TILE, TILE));
        assert!(drain(&mut engine)
            .iter()
            .any(|event| matches!(event, RuntimeEvent::GhostEaten { ghost: 0, score: 200 })));
    }

    #[test]
    fn spawning_inside_a_wall_is_rejected() {
        let result = GameEngine::from_layout(
            &["#####", "#...#", "#####"],
            TILE,
            options((0, 0), &[], 3),
        );
        assert!(matches!(
            result,
            Err(LoadError::BlockedSpawn { col: 0, row: 0 })
        ));
        let result = GameEngine::from_layout(
            &["#####", "#...#", "#####"],
            TILE,
            options((1, 1), &[(4, 1)], 3),
        );
        assert!(matches!(
            result,
            Err(LoadError::BlockedSpawn { col: 4, row: 1 })
        ));
    }

    #[test]
    fn speeds_must_stay_below_half_a_tile() {
        let mut opts = options((1, 1), &[], 3);
        opts.config.movement.ghost_speed = 5.0;
        let result = GameEngine::from_layout(&["#####", "#...#", "#####"], 10.0, opts);
        assert!(matches!(result, Err(LoadError::Tuning(_))));

        let mut opts = options((1, 1), &[], 3);
        opts.config.movement.ghost_speed = 4.9;
        assert!(GameEngine::from_layout(&["#####", "#...#", "#####"], 10.0, opts).is_ok());
    }

    #[test]
    fn same_seed_produces_same_session() {
        let run = || {
            let mut engine = GameEngine::with_default_level(GameEngineOptions {
                seed: 424_242,
                ..GameEngineOptions::default()
            })
            .expect("default level");
            let mut trace = Vec::new();
            for _ in 0..2_000 {
                let dir = autopilot::choose_direction(engine.level(), engine.player());
                if dir != Direction::None {
                    engine.queue_player_direction(dir);
                }
                engine.step();
                let snapshot = engine.build_snapshot(false);
                trace.push((
                    snapshot.score,
                    snapshot.lives,
                    snapshot
                        .ghosts
                        .iter()
                        .map(|ghost| (ghost.x, ghost.y))
                        .collect::<Vec<_>>(),
                ));
            }
            trace
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn actors_stay_out_of_walls_during_play() {
        for seed in 0..5u32 {
            let mut engine = GameEngine::with_default_level(GameEngineOptions {
                seed,
                config: quick_config(3),
                ..GameEngineOptions::default()
            })
            .expect("default level");
            for _ in 0..3_000 {
                let dir = autopilot::choose_direction(engine.level(), engine.player());
                engine.queue_player_direction(dir);
                engine.step();
                let level = engine.level();
                let player = engine.player();
                assert!(!level.collides(player.x(), player.y(), player.size()));
                for ghost in engine.ghosts() {
                    let (x, y) = ghost.position();
                    assert!(!level.collides(x, y, ghost.size()));
                }
                if engine.phase() == GamePhase::GameOver {
                    engine.restart();
                } else if engine.phase() == GamePhase::Cleared {
                    engine.advance_level();
                }
            }
        }
    }
}
