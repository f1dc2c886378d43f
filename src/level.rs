use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::constants::{COLLISION_EPSILON, DEFAULT_LAYOUT, TILE_SIZE};
use crate::error::LoadError;
use crate::types::{GridPos, PelletKind, TileKind};

/// Tile grid, pellet layer and warp links for one stage.
#[derive(Clone, Debug)]
pub struct Level {
    tiles: Vec<Vec<TileKind>>,
    pellets: Vec<Vec<PelletKind>>,
    tile_size: f64,
    width: i32,
    height: i32,
    warp_cells: Vec<GridPos>,
    warp_targets: HashMap<GridPos, GridPos>,
    remaining_pellets: usize,
    total_pellets: usize,
}

impl Level {
    /// Builds a level from rows of `#`, `.`, `o`, ` ` and `W` symbols.
    pub fn parse<S: AsRef<str>>(layout: &[S], tile_size: f64) -> Result<Self, LoadError> {
        if !(tile_size > 0.0 && tile_size.is_finite()) {
            return Err(LoadError::InvalidTileSize(tile_size));
        }
        let Some(first) = layout.first() else {
            return Err(LoadError::Empty);
        };
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(LoadError::Empty);
        }

        let mut tiles = Vec::with_capacity(layout.len());
        let mut pellets = Vec::with_capacity(layout.len());
        let mut warp_cells = Vec::new();
        let mut pellet_count = 0usize;

        for (row_idx, row) in layout.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(LoadError::InconsistentWidth {
                    row: row_idx,
                    expected: width,
                    found,
                });
            }

            let mut tile_row = Vec::with_capacity(width);
            let mut pellet_row = Vec::with_capacity(width);
            for (col_idx, symbol) in row.chars().enumerate() {
                let (tile, pellet) = match symbol {
                    '#' => (TileKind::Wall, PelletKind::None),
                    '.' => (TileKind::Path, PelletKind::Small),
                    'o' => (TileKind::Path, PelletKind::Power),
                    ' ' => (TileKind::Path, PelletKind::None),
                    'W' => {
                        warp_cells.push(GridPos::new(col_idx as i32, row_idx as i32));
                        (TileKind::Warp, PelletKind::None)
                    }
                    _ => {
                        return Err(LoadError::UnknownSymbol {
                            symbol,
                            row: row_idx,
                            col: col_idx,
                        })
                    }
                };
                if pellet != PelletKind::None {
                    pellet_count += 1;
                }
                tile_row.push(tile);
                pellet_row.push(pellet);
            }
            tiles.push(tile_row);
            pellets.push(pellet_row);
        }

        if warp_cells.len() % 2 != 0 {
            return Err(LoadError::OddWarpCount(warp_cells.len()));
        }
        let mut warp_targets = HashMap::with_capacity(warp_cells.len());
        for pair in warp_cells.chunks_exact(2) {
            warp_targets.insert(pair[0], pair[1]);
            warp_targets.insert(pair[1], pair[0]);
        }

        Ok(Self {
            tiles,
            pellets,
            tile_size,
            width: width as i32,
            height: layout.len() as i32,
            warp_cells,
            warp_targets,
            remaining_pellets: pellet_count,
            total_pellets: pellet_count,
        })
    }

    /// The built-in stage. It ships with the crate, so a parse failure is a bug.
    pub fn default_level() -> Self {
        Self::parse(&DEFAULT_LAYOUT, TILE_SIZE).expect("built-in level layout must be valid")
    }

    /// Reads a layout file, one row per line.
    pub fn load(path: &Path, tile_size: f64) -> Result<Self, LoadError> {
        let rows = read_layout(path)?;
        Self::parse(&rows, tile_size)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && col < self.width && row < self.height
    }

    /// Out-of-bounds cells read as walls.
    pub fn tile_at(&self, col: i32, row: i32) -> TileKind {
        if !self.in_bounds(col, row) {
            return TileKind::Wall;
        }
        self.tiles[row as usize][col as usize]
    }

    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.tile_at(pos.col, pos.row) != TileKind::Wall
    }

    pub fn pellet_at(&self, col: i32, row: i32) -> PelletKind {
        if !self.in_bounds(col, row) {
            return PelletKind::None;
        }
        self.pellets[row as usize][col as usize]
    }

    /// Clears the pellet and returns what was there. Empty cells are a no-op.
    pub fn consume_pellet(&mut self, col: i32, row: i32) -> PelletKind {
        if !self.in_bounds(col, row) {
            return PelletKind::None;
        }
        let cell = &mut self.pellets[row as usize][col as usize];
        let prior = std::mem::take(cell);
        if prior != PelletKind::None {
            self.remaining_pellets -= 1;
        }
        prior
    }

    pub fn remaining_pellets(&self) -> usize {
        self.remaining_pellets
    }

    pub fn total_pellets(&self) -> usize {
        self.total_pellets
    }

    pub fn grid_for_pixel(&self, x: f64, y: f64) -> GridPos {
        GridPos {
            col: (x / self.tile_size).floor() as i32,
            row: (y / self.tile_size).floor() as i32,
        }
    }

    pub fn cell_origin(&self, pos: GridPos) -> (f64, f64) {
        (
            pos.col as f64 * self.tile_size,
            pos.row as f64 * self.tile_size,
        )
    }

    pub fn cell_center(&self, pos: GridPos) -> (f64, f64) {
        let (x, y) = self.cell_origin(pos);
        let half = self.tile_size / 2.0;
        (x + half, y + half)
    }

    pub fn warp_target(&self, pos: GridPos) -> Option<GridPos> {
        self.warp_targets.get(&pos).copied()
    }

    /// Warp cells in row-major scan order.
    pub fn warp_cells(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.warp_cells.iter().copied()
    }

    /// Corner-sampled wall test for the box `[x, x + size] × [y, y + size]`.
    ///
    /// Only the four (slightly inset) corners are checked, so a box may share
    /// an edge with a wall without colliding.
    pub fn collides(&self, x: f64, y: f64, size: f64) -> bool {
        let near = COLLISION_EPSILON;
        let far = size - COLLISION_EPSILON;
        [(near, near), (far, near), (near, far), (far, far)]
            .into_iter()
            .any(|(dx, dy)| {
                let cell = self.grid_for_pixel(x + dx, y + dy);
                self.tile_at(cell.col, cell.row) == TileKind::Wall
            })
    }
}

fn read_layout(path: &Path) -> Result<Vec<String>, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rows: Vec<String> = text
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect();
    while rows.last().is_some_and(|row| row.trim().is_empty()) {
        rows.pop();
    }
    Ok(rows)
}
