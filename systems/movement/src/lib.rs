#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Movement controller that memoises routes per unit and issues single steps.
//!
//! Routes are requested from the [`Pathfinder`] collaborator and cached per
//! unit. A cached route is reused only while its target is unchanged, it is
//! younger than the refresh interval, its cursor has steps left, and the unit
//! has not drifted away from where the cursor expects it. The cursor advances
//! only once the unit is observed standing on the step it was aimed at.

use std::collections::{BTreeMap, BTreeSet};

use arena_tactics_core::{
    Arena, CellCoord, Command, CommandError, LiveUnits, PathOptions, RosterBound, UnitId,
    UnitSnapshot,
};
use log::debug;
use serde::Deserialize;

/// Configuration parameters of the movement controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ticks a route stays fresh before it is recomputed.
    pub refresh_interval: u64,
    /// Largest distance tolerated between a unit and its expected cell.
    pub drift_tolerance: u32,
}

impl Config {
    /// Creates a configuration with explicit limits.
    #[must_use]
    pub const fn new(refresh_interval: u64, drift_tolerance: u32) -> Self {
        Self {
            refresh_interval,
            drift_tolerance,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(5, 1)
    }
}

/// Where a unit wants to go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Follow a unit, keyed by identity so its movement does not invalidate
    /// the cached route before the refresh interval.
    Unit {
        /// Unit being followed.
        id: UnitId,
        /// Cell the unit occupied when the request was made.
        cell: CellCoord,
    },
    /// Reach a fixed cell.
    Cell(CellCoord),
}

impl Destination {
    /// Destination that tracks the provided unit.
    #[must_use]
    pub fn unit(unit: &UnitSnapshot) -> Self {
        Self::Unit {
            id: unit.id,
            cell: unit.cell,
        }
    }

    /// Cell the route should end on.
    #[must_use]
    pub const fn cell(self) -> CellCoord {
        match self {
            Self::Unit { cell, .. } | Self::Cell(cell) => cell,
        }
    }

    /// Identity used to decide whether a cached route still applies.
    #[must_use]
    pub const fn key(self) -> TargetKey {
        match self {
            Self::Unit { id, .. } => TargetKey::Unit(id),
            Self::Cell(cell) => TargetKey::Cell(cell),
        }
    }
}

/// Identity of a cached route's target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetKey {
    /// Route toward a unit.
    Unit(UnitId),
    /// Route toward a fixed cell.
    Cell(CellCoord),
}

/// Memoised route and progress cursor for one unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathEntry {
    target: TargetKey,
    origin: CellCoord,
    computed_at: u64,
    steps: Vec<CellCoord>,
    cursor: usize,
}

impl PathEntry {
    /// Target the route was planned for.
    #[must_use]
    pub const fn target(&self) -> TargetKey {
        self.target
    }

    /// Tick at which the route was computed.
    #[must_use]
    pub const fn computed_at(&self) -> u64 {
        self.computed_at
    }

    /// Planned steps, excluding the cell the route started from.
    #[must_use]
    pub fn steps(&self) -> &[CellCoord] {
        &self.steps
    }

    /// Index of the next step to take.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    fn next_step(&self) -> Option<CellCoord> {
        self.steps.get(self.cursor).copied()
    }

    fn expected_cell(&self) -> CellCoord {
        match self.cursor.checked_sub(1) {
            Some(previous) => self.steps.get(previous).copied().unwrap_or(self.origin),
            None => self.origin,
        }
    }

    fn confirm_progress(&mut self, cell: CellCoord) {
        if self.next_step() == Some(cell) {
            self.cursor += 1;
        }
    }
}

/// Result of a movement request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// A step was submitted and accepted.
    Moved,
    /// The unit is already within the requested range.
    Arrived,
    /// No route exists this tick; nothing was submitted.
    NoPath,
    /// The unit already moved this tick.
    AlreadyMoved,
    /// The arena rejected the submitted step.
    Rejected(CommandError),
}

/// Movement controller owning the per-unit path cache.
#[derive(Debug)]
pub struct Movement {
    config: Config,
    tick: u64,
    entries: BTreeMap<UnitId, PathEntry>,
    moved: BTreeSet<UnitId>,
}

impl Movement {
    /// Creates a controller with an empty cache.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            tick: 0,
            entries: BTreeMap::new(),
            moved: BTreeSet::new(),
        }
    }

    /// Starts a new tick, re-arming the one-step-per-unit guard.
    pub fn begin_tick(&mut self, tick: u64) {
        self.tick = tick;
        self.moved.clear();
    }

    /// Steps the unit toward the destination.
    pub fn move_toward<A>(
        &mut self,
        unit: &UnitSnapshot,
        destination: Destination,
        options: PathOptions,
        arena: &mut A,
    ) -> MoveOutcome
    where
        A: Arena + ?Sized,
    {
        self.move_within(unit, destination, 0, options, arena)
    }

    /// Steps the unit toward the destination unless it is already within
    /// `range` cells of it.
    pub fn move_within<A>(
        &mut self,
        unit: &UnitSnapshot,
        destination: Destination,
        range: u32,
        options: PathOptions,
        arena: &mut A,
    ) -> MoveOutcome
    where
        A: Arena + ?Sized,
    {
        if unit.cell.range_to(destination.cell()) <= range {
            return MoveOutcome::Arrived;
        }
        if self.moved.contains(&unit.id) {
            return MoveOutcome::AlreadyMoved;
        }

        if let Some(entry) = self.entries.get_mut(&unit.id) {
            entry.confirm_progress(unit.cell);
        }

        let key = destination.key();
        if !self.is_fresh(unit, key) {
            let _ = self.entries.remove(&unit.id);
            let steps = arena
                .find_path(unit.cell, destination.cell(), options)
                .filter(|steps| !steps.is_empty());
            let Some(steps) = steps else {
                debug!(
                    "unit {} has no route to {:?}",
                    unit.id.get(),
                    destination.cell()
                );
                return MoveOutcome::NoPath;
            };
            let _ = self.entries.insert(
                unit.id,
                PathEntry {
                    target: key,
                    origin: unit.cell,
                    computed_at: self.tick,
                    steps,
                    cursor: 0,
                },
            );
        }

        let Some(next) = self.entries.get(&unit.id).and_then(PathEntry::next_step) else {
            return MoveOutcome::NoPath;
        };
        let Some(direction) = unit.cell.direction_to(next) else {
            return MoveOutcome::Arrived;
        };

        let _ = self.moved.insert(unit.id);
        match arena.submit(Command::Move {
            unit: unit.id,
            direction,
        }) {
            Ok(()) => MoveOutcome::Moved,
            Err(error) => MoveOutcome::Rejected(error),
        }
    }

    fn is_fresh(&self, unit: &UnitSnapshot, key: TargetKey) -> bool {
        let Some(entry) = self.entries.get(&unit.id) else {
            return false;
        };
        entry.target == key
            && self.tick.saturating_sub(entry.computed_at) < self.config.refresh_interval
            && entry.cursor < entry.steps.len()
            && unit.cell.range_to(entry.expected_cell()) <= self.config.drift_tolerance
    }

    /// Cached route of a unit, if any.
    #[must_use]
    pub fn entry(&self, unit: UnitId) -> Option<&PathEntry> {
        self.entries.get(&unit)
    }

    /// Number of cached routes.
    #[must_use]
    pub fn cached_routes(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the unit already moved this tick.
    #[must_use]
    pub fn has_moved(&self, unit: UnitId) -> bool {
        self.moved.contains(&unit)
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl RosterBound for Movement {
    fn retain_live(&mut self, live: &LiveUnits) -> usize {
        let before = self.entries.len() + self.moved.len();
        self.entries.retain(|unit, entry| {
            live.contains(*unit)
                && match entry.target {
                    TargetKey::Unit(target) => live.contains(target),
                    TargetKey::Cell(_) => true,
                }
        });
        self.moved.retain(|unit| live.contains(*unit));
        before - (self.entries.len() + self.moved.len())
    }
}
