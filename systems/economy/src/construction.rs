use std::collections::BTreeSet;

use arena_tactics_core::{Allegiance, ArenaView, CellCoord, Command, StructureKind};
use log::debug;
use serde::Deserialize;

/// Configuration parameters of the construction planner.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Column and row offsets from the home base, tried in order.
    pub offsets: Vec<(i32, i32)>,
    /// Upper bound on towers standing or under construction.
    pub max_towers: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            offsets: vec![(2, 2), (2, -2), (-2, 2), (-2, -2), (3, 0), (-3, 0)],
            max_towers: 2,
        }
    }
}

/// Requests defensive towers around the home base.
#[derive(Debug, Default)]
pub struct Construction {
    config: Config,
    requested: BTreeSet<CellCoord>,
}

impl Construction {
    /// Creates a planner with no outstanding requests.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            requested: BTreeSet::new(),
        }
    }

    /// Emits at most one construction request per tick.
    ///
    /// Nothing is requested until the first wave deployed. A cell is never
    /// requested twice, so a request the arena silently dropped moves the
    /// planner on to the next offset.
    pub fn plan(&mut self, view: &ArenaView, first_deployed: bool) -> Option<Command> {
        if !first_deployed {
            return None;
        }
        let home = view.home_base()?.cell;

        let standing = view
            .structures_of(Allegiance::Mine)
            .filter(|structure| structure.kind == StructureKind::Tower)
            .count()
            + view
                .sites()
                .iter()
                .filter(|site| {
                    site.allegiance == Allegiance::Mine && site.kind == StructureKind::Tower
                })
                .count();
        if standing >= self.config.max_towers as usize {
            return None;
        }

        let cell = self
            .config
            .offsets
            .iter()
            .filter_map(|&(dx, dy)| offset(home, dx, dy))
            .filter(|cell| view.dimensions().contains(*cell))
            .find(|cell| !self.requested.contains(cell) && is_free(view, *cell))?;
        let _ = self.requested.insert(cell);
        debug!(
            "tick {}: requesting tower at ({}, {})",
            view.tick(),
            cell.column(),
            cell.row()
        );
        Some(Command::RequestConstruction {
            cell,
            kind: StructureKind::Tower,
        })
    }

    /// Cells requested so far.
    #[must_use]
    pub fn requested(&self) -> &BTreeSet<CellCoord> {
        &self.requested
    }
}

fn offset(origin: CellCoord, dx: i32, dy: i32) -> Option<CellCoord> {
    Some(CellCoord::new(
        origin.column().checked_add_signed(dx)?,
        origin.row().checked_add_signed(dy)?,
    ))
}

fn is_free(view: &ArenaView, cell: CellCoord) -> bool {
    !view.structures().iter().any(|structure| structure.cell == cell)
        && !view.sites().iter().any(|site| site.cell == cell)
}
