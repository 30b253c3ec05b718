//! Grid - cell state for the disaster area
//!
//! The grid owns terrain, fire intensity, and rubble. Only the dynamics
//! pass mutates fire; commands mutate rubble (clearing) through the world.

pub mod dynamics;
pub mod pathfinding;

use serde::{Deserialize, Serialize};

use crate::core::types::GridPos;

/// Terrain class of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terrain {
    Passable,
    Blocked,
}

/// One grid cell
#[derive(Debug, Clone, Copy)]
pub struct Cell {
    pub terrain: Terrain,
    /// Fire intensity, 0 = no fire
    pub fire: u8,
    /// Rubble slows movement until a truck clears it
    pub rubble: bool,
    /// Hospitals and depots never ignite
    pub fireproof: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            terrain: Terrain::Passable,
            fire: 0,
            rubble: false,
            fireproof: false,
        }
    }
}

/// Row-major 2-D grid of cells
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        Self {
            width,
            height,
            cells: vec![Cell::default(); (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    pub fn cell(&self, pos: GridPos) -> Option<&Cell> {
        if self.in_bounds(pos) {
            Some(&self.cells[(pos.y * self.width + pos.x) as usize])
        } else {
            None
        }
    }

    pub fn cell_mut(&mut self, pos: GridPos) -> Option<&mut Cell> {
        if self.in_bounds(pos) {
            Some(&mut self.cells[(pos.y * self.width + pos.x) as usize])
        } else {
            None
        }
    }

    /// Agents may occupy any in-bounds, non-blocked cell
    pub fn is_passable(&self, pos: GridPos) -> bool {
        self.cell(pos)
            .map(|c| c.terrain == Terrain::Passable)
            .unwrap_or(false)
    }

    pub fn is_burning(&self, pos: GridPos) -> bool {
        self.cell(pos).map(|c| c.fire > 0).unwrap_or(false)
    }

    /// True when `pos` itself or any orthogonal neighbour is burning
    pub fn fire_adjacent(&self, pos: GridPos) -> bool {
        if self.is_burning(pos) {
            return true;
        }
        pos.orthogonal().iter().any(|&n| self.is_burning(n))
    }

    /// Burning cell positions in row-major order (stable iteration order
    /// matters for deterministic replays)
    pub fn burning_cells(&self) -> Vec<(GridPos, u8)> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = GridPos::new(x, y);
                let fire = self.cells[(y * self.width + x) as usize].fire;
                if fire > 0 {
                    out.push((pos, fire));
                }
            }
        }
        out
    }

    pub fn active_fire_count(&self) -> usize {
        self.cells.iter().filter(|c| c.fire > 0).count()
    }
}
