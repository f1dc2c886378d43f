//! Error types surfaced while building levels and loading tuning files.

use std::path::PathBuf;

use thiserror::Error;

/// A level layout that cannot be turned into a playable maze.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("empty level layout")]
    Empty,

    #[error("inconsistent row width at row {row}: expected {expected}, found {found}")]
    InconsistentWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown tile symbol {symbol:?} at row {row} col {col}")]
    UnknownSymbol { symbol: char, row: usize, col: usize },

    #[error("warp cells must come in pairs, got {0}")]
    OddWarpCount(usize),

    #[error("tile size must be a positive finite number, got {0}")]
    InvalidTileSize(f64),

    #[error("tuning does not fit the level: {0}")]
    Tuning(#[from] ConfigError),

    #[error("spawn cell ({col}, {row}) is a wall")]
    BlockedSpawn { col: i32, row: i32 },

    #[error("failed to read level file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
