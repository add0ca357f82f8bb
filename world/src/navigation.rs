//! Shortest-path service backing the [`Pathfinder`] collaborator.

use std::collections::BTreeSet;

use arena_tactics_core::{CellCoord, Direction, PathOptions, Pathfinder};
use pathfinding::prelude::astar;

use super::{Terrain, World};

impl World {
    fn blocked_cells(&self, options: PathOptions) -> BTreeSet<CellCoord> {
        let mut blocked: BTreeSet<CellCoord> = self
            .structures
            .values()
            .filter(|structure| !structure.kind.is_walkable())
            .map(|structure| structure.cell)
            .collect();
        if !options.ignore_units {
            blocked.extend(self.units.values().map(|unit| unit.cell));
        }
        blocked
    }

    fn successors(
        &self,
        cell: CellCoord,
        goal: CellCoord,
        blocked: &BTreeSet<CellCoord>,
    ) -> Vec<(CellCoord, u32)> {
        Direction::ALL
            .iter()
            .filter_map(|direction| cell.step(*direction))
            .filter(|next| self.dimensions.contains(*next))
            .filter_map(|next| {
                let terrain = self.terrain.get(next);
                if terrain == Terrain::Wall {
                    return None;
                }
                if next != goal && blocked.contains(&next) {
                    return None;
                }
                Some((next, terrain.movement_cost()))
            })
            .collect()
    }
}

impl Pathfinder for World {
    fn find_path(
        &self,
        from: CellCoord,
        to: CellCoord,
        options: PathOptions,
    ) -> Option<Vec<CellCoord>> {
        if !self.dimensions.contains(from) || !self.dimensions.contains(to) {
            return None;
        }
        if from == to {
            return Some(Vec::new());
        }

        let blocked = self.blocked_cells(options);
        let (path, _cost) = astar(
            &from,
            |cell| self.successors(*cell, to, &blocked),
            |cell| cell.range_to(to),
            |cell| *cell == to,
        )?;
        Some(path.into_iter().skip(1).collect())
    }
}
