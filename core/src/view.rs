//! Immutable per-tick snapshots of the arena.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    Allegiance, CellCoord, Dimensions, Health, Loadout, SiteId, SourceId, Store, StructureId,
    StructureKind, UnitId,
};

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Stable identifier of the unit.
    pub id: UnitId,
    /// Cell the unit occupies.
    pub cell: CellCoord,
    /// Current and maximum health.
    pub health: Health,
    /// Ordered body parts.
    pub loadout: Loadout,
    /// Side controlling the unit.
    pub allegiance: Allegiance,
    /// Carried energy.
    pub store: Store,
}

/// Immutable representation of a structure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSnapshot {
    /// Identifier of the structure.
    pub id: StructureId,
    /// Kind of structure.
    pub kind: StructureKind,
    /// Cell occupied by the structure.
    pub cell: CellCoord,
    /// Side owning the structure.
    pub allegiance: Allegiance,
    /// Current and maximum health.
    pub health: Health,
    /// Stored energy; zero capacity when the kind stores nothing.
    pub store: Store,
    /// Ticks until the structure may act again.
    pub cooldown: u32,
    /// Indicates a production facility currently producing a unit.
    pub busy: bool,
}

/// Immutable representation of a construction site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSnapshot {
    /// Identifier of the site.
    pub id: SiteId,
    /// Structure the site becomes once finished.
    pub kind: StructureKind,
    /// Cell the finished structure will occupy.
    pub cell: CellCoord,
    /// Side that requested the site.
    pub allegiance: Allegiance,
    /// Work invested so far.
    pub progress: u32,
    /// Work required to finish.
    pub total: u32,
}

/// Immutable representation of a harvestable resource node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSnapshot {
    /// Identifier of the node.
    pub id: SourceId,
    /// Cell occupied by the node.
    pub cell: CellCoord,
    /// Energy still available.
    pub energy: u32,
}

/// Authoritative roster snapshot captured at the start of a tick.
///
/// Every collection is sorted by identifier so iteration order is
/// deterministic across runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArenaView {
    tick: u64,
    dimensions: Dimensions,
    units: Vec<UnitSnapshot>,
    structures: Vec<StructureSnapshot>,
    sites: Vec<SiteSnapshot>,
    sources: Vec<SourceSnapshot>,
}

impl ArenaView {
    /// Creates a new view, sorting every collection by identifier.
    #[must_use]
    pub fn new(
        tick: u64,
        dimensions: Dimensions,
        mut units: Vec<UnitSnapshot>,
        mut structures: Vec<StructureSnapshot>,
        mut sites: Vec<SiteSnapshot>,
        mut sources: Vec<SourceSnapshot>,
    ) -> Self {
        units.sort_by_key(|unit| unit.id);
        structures.sort_by_key(|structure| structure.id);
        sites.sort_by_key(|site| site.id);
        sources.sort_by_key(|source| source.id);
        Self {
            tick,
            dimensions,
            units,
            structures,
            sites,
            sources,
        }
    }

    /// Tick the snapshot was captured at.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Size of the arena grid.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Every living unit on both sides.
    #[must_use]
    pub fn units(&self) -> &[UnitSnapshot] {
        &self.units
    }

    /// Living units controlled by this agent.
    pub fn my_units(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.units
            .iter()
            .filter(|unit| unit.allegiance == Allegiance::Mine)
    }

    /// Living units controlled by the opponent.
    pub fn enemy_units(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.units
            .iter()
            .filter(|unit| unit.allegiance == Allegiance::Enemy)
    }

    /// Looks up a living unit by identifier.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&UnitSnapshot> {
        self.units
            .binary_search_by_key(&id, |unit| unit.id)
            .ok()
            .map(|index| &self.units[index])
    }

    /// Every standing structure.
    #[must_use]
    pub fn structures(&self) -> &[StructureSnapshot] {
        &self.structures
    }

    /// Looks up a standing structure by identifier.
    #[must_use]
    pub fn structure(&self, id: StructureId) -> Option<&StructureSnapshot> {
        self.structures
            .binary_search_by_key(&id, |structure| structure.id)
            .ok()
            .map(|index| &self.structures[index])
    }

    /// Structures owned by the given side.
    pub fn structures_of(
        &self,
        allegiance: Allegiance,
    ) -> impl Iterator<Item = &StructureSnapshot> {
        self.structures
            .iter()
            .filter(move |structure| structure.allegiance == allegiance)
    }

    /// Construction sites in progress.
    #[must_use]
    pub fn sites(&self) -> &[SiteSnapshot] {
        &self.sites
    }

    /// Resource nodes.
    #[must_use]
    pub fn sources(&self) -> &[SourceSnapshot] {
        &self.sources
    }

    /// Production facility of this agent, if it still stands.
    #[must_use]
    pub fn home_base(&self) -> Option<&StructureSnapshot> {
        self.structures_of(Allegiance::Mine)
            .find(|structure| structure.kind == StructureKind::Spawn)
    }

    /// Production facility of the opponent, if it still stands.
    #[must_use]
    pub fn enemy_base(&self) -> Option<&StructureSnapshot> {
        self.structures_of(Allegiance::Enemy)
            .find(|structure| structure.kind == StructureKind::Spawn)
    }

    /// Checks whether a cell is occupied by a unit or a non-walkable structure.
    #[must_use]
    pub fn is_cell_occupied(&self, cell: CellCoord) -> bool {
        self.units.iter().any(|unit| unit.cell == cell)
            || self
                .structures
                .iter()
                .any(|structure| structure.cell == cell && !structure.kind.is_walkable())
    }

    /// Set of every living unit identifier on both sides.
    #[must_use]
    pub fn live_units(&self) -> LiveUnits {
        LiveUnits::from_ids(self.units.iter().map(|unit| unit.id))
    }
}

/// Set of unit identifiers alive at the start of the current tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveUnits {
    ids: BTreeSet<UnitId>,
}

impl LiveUnits {
    /// Collects the provided identifiers.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = UnitId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Reports whether the unit is alive.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.ids.contains(&id)
    }

    /// Number of living units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Reports whether no unit is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Core-owned table that references units by identifier.
///
/// Implementors drop every entry that mentions a unit missing from the live
/// roster and report how many entries were removed.
pub trait RosterBound {
    /// Removes entries referencing dead units.
    fn retain_live(&mut self, live: &LiveUnits) -> usize;
}
