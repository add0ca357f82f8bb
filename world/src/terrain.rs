//! Static terrain layer of the arena.

use arena_tactics_core::{CellCoord, Dimensions};

/// Kinds of terrain a cell may carry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Terrain {
    /// Open ground.
    #[default]
    Plain,
    /// Slow ground that fatigues heavy units.
    Swamp,
    /// Impassable rock.
    Wall,
}

impl Terrain {
    /// Path cost of entering a cell of this terrain.
    #[must_use]
    pub const fn movement_cost(self) -> u32 {
        match self {
            Self::Plain => 1,
            Self::Swamp => 5,
            Self::Wall => u32::MAX,
        }
    }

    /// Fatigue generated per non-move part when entering the terrain.
    #[must_use]
    pub const fn fatigue_per_part(self) -> u32 {
        match self {
            Self::Plain => 2,
            Self::Swamp => 10,
            Self::Wall => 0,
        }
    }
}

/// Dense row-major terrain grid.
#[derive(Clone, Debug)]
pub(crate) struct TerrainGrid {
    dimensions: Dimensions,
    cells: Vec<Terrain>,
}

impl TerrainGrid {
    pub(crate) fn new(dimensions: Dimensions) -> Self {
        let count = usize::try_from(dimensions.columns()).unwrap_or(0)
            * usize::try_from(dimensions.rows()).unwrap_or(0);
        Self {
            dimensions,
            cells: vec![Terrain::Plain; count],
        }
    }

    pub(crate) fn get(&self, cell: CellCoord) -> Terrain {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(Terrain::Wall)
    }

    pub(crate) fn set(&mut self, cell: CellCoord, terrain: Terrain) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = terrain;
            }
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.dimensions.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.dimensions.columns()).ok()?;
        Some(row * width + column)
    }
}
