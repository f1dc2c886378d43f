use crate::types::{Color, GridPos};

pub const TICK_RATE: u32 = 60;
pub const TILE_SIZE: f64 = 16.0;

/// Corner inset used by the collision test.
pub const COLLISION_EPSILON: f64 = 0.01;

pub const PLAYER_SPEED: f64 = 1.6;
pub const GHOST_BASE_SPEED: f64 = 1.35;

pub const TURN_MIN_PX: f64 = 0.8;
pub const TURN_TILE_FRACTION: f64 = 0.2;

pub const INTERSECTION_TOLERANCE: f64 = 0.3;
pub const HOSTILE_REROLL_CHANCE: f64 = 0.4;
pub const FRIGHTENED_REROLL_CHANCE: f64 = 0.2;
pub const VISIT_PENALTY: f64 = 5.0;
pub const FRIGHTENED_SPEED_FACTOR: f64 = 0.75;
pub const FRIGHTENED_COLOR: Color = Color::rgb(0, 0, 255);

pub const START_LIVES: u32 = 3;
pub const PELLET_SCORE: u32 = 10;
pub const POWER_PELLET_SCORE: u32 = 50;
pub const GHOST_SCORE: u32 = 200;
pub const POWER_DURATION_TICKS: u32 = 600;
pub const READY_DELAY_TICKS: u32 = 60;
pub const CATCH_SHRINKAGE: f64 = 0.85;

pub const DEFAULT_LAYOUT: [&str; 20] = [
    "###############",
    "#o...........o#",
    "#.###.###.###.#",
    "#.#.........#.#",
    "#.#.###.###.#.#",
    "#.....#.......#",
    "###.#.#.#.#.###",
    "W...#.....#...W",
    "#.#.#.###.#.#.#",
    "#.#.#.....#.#.#",
    "#.#.#######.#.#",
    "#.............#",
    "###.###.#.###.#",
    "#.....#.#.....#",
    "#.###.#.#.###.#",
    "#.............#",
    "#.###########.#",
    "#o...........o#",
    "#.###########.#",
    "###############",
];

pub const PLAYER_SPAWN: GridPos = GridPos { col: 7, row: 11 };

pub const GHOST_SPAWNS: [(GridPos, Color); 3] = [
    (GridPos { col: 7, row: 9 }, Color::rgb(255, 0, 0)),
    (GridPos { col: 6, row: 9 }, Color::rgb(0, 255, 255)),
    (GridPos { col: 8, row: 9 }, Color::rgb(255, 105, 180)),
];
