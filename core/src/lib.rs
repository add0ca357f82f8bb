#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the arena tactics engine.
//!
//! This crate defines the vocabulary that connects the authoritative arena,
//! the pure decision systems, and the adapters that drive them. Systems read
//! immutable [`ArenaView`] snapshots captured at the start of a tick, consult
//! the [`Pathfinder`] collaborator for routes, and express every intended
//! mutation as a [`Command`] submitted through a [`CommandSink`]. The sink
//! answers each submission with a [`CommandError`] when the arena rejects it,
//! so callers never assume that an action landed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod view;

pub use view::{
    ArenaView, LiveUnits, RosterBound, SiteSnapshot, SourceSnapshot, StructureSnapshot,
    UnitSnapshot,
};

/// Canonical banner emitted when the runner boots.
pub const WELCOME_BANNER: &str = "Arena tactics online.";

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Stable identifier assigned to a unit for its whole lifetime.
    UnitId
);
define_id!(
    /// Stable identifier assigned to a structure.
    StructureId
);
define_id!(
    /// Identifier of a construction site.
    SiteId
);
define_id!(
    /// Identifier of a harvestable resource node.
    SourceId
);

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Rows grow toward the south, columns grow toward the east.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Grid range between two cells, measured as Chebyshev distance.
    ///
    /// Diagonal steps cost the same as orthogonal ones, which matches how
    /// every action range in the arena is evaluated.
    #[must_use]
    pub fn range_to(self, other: CellCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }

    /// Compass direction that moves a unit from `self` toward `other`.
    ///
    /// Returns `None` when both cells coincide. The cells need not be
    /// adjacent; the sign of each axis delta selects the heading.
    #[must_use]
    pub fn direction_to(self, other: CellCoord) -> Option<Direction> {
        let dx = i64::from(other.column) - i64::from(self.column);
        let dy = i64::from(other.row) - i64::from(self.row);
        Direction::from_offset(dx.signum() as i32, dy.signum() as i32)
    }

    /// Cell reached by stepping once in `direction`, if it stays non-negative.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (dx, dy) = direction.offset();
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        Some(CellCoord::new(column, row))
    }
}

/// Size of the arena grid measured in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    columns: u32,
    rows: u32,
}

impl Dimensions {
    /// Creates a new dimension descriptor.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Cell at the geometric centre of the grid.
    #[must_use]
    pub const fn center(&self) -> CellCoord {
        CellCoord::new(self.columns / 2, self.rows / 2)
    }
}

/// Compass headings available to a single-cell move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing row indices.
    North,
    /// Toward decreasing rows and increasing columns.
    NorthEast,
    /// Toward increasing column indices.
    East,
    /// Toward increasing rows and columns.
    SouthEast,
    /// Toward increasing row indices.
    South,
    /// Toward increasing rows and decreasing columns.
    SouthWest,
    /// Toward decreasing column indices.
    West,
    /// Toward decreasing rows and columns.
    NorthWest,
}

impl Direction {
    /// Every heading in clockwise order starting from north.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Column and row delta applied by a step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }

    /// Resolves the heading matching a unit offset, if any.
    #[must_use]
    pub const fn from_offset(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (0, -1) => Some(Self::North),
            (1, -1) => Some(Self::NorthEast),
            (1, 0) => Some(Self::East),
            (1, 1) => Some(Self::SouthEast),
            (0, 1) => Some(Self::South),
            (-1, 1) => Some(Self::SouthWest),
            (-1, 0) => Some(Self::West),
            (-1, -1) => Some(Self::NorthWest),
            _ => None,
        }
    }
}

/// Side an entity fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Allegiance {
    /// Controlled by this agent.
    Mine,
    /// Controlled by the opponent.
    Enemy,
    /// Owned by nobody, e.g. obstacles and loose containers.
    Neutral,
}

/// Body part kinds that make up a unit loadout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PartKind {
    /// Reduces fatigue, enabling movement.
    Move,
    /// Harvests, builds and demolishes.
    Work,
    /// Adds carrying capacity.
    Carry,
    /// Melee damage.
    Attack,
    /// Ranged damage.
    RangedAttack,
    /// Restores friendly health.
    Heal,
    /// Cheap extra health.
    Tough,
}

impl PartKind {
    /// Energy cost of producing the part.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::Move | Self::Carry => 50,
            Self::Work => 100,
            Self::Attack => 80,
            Self::RangedAttack => 150,
            Self::Heal => 250,
            Self::Tough => 10,
        }
    }
}

/// Carrying capacity contributed by one carry part.
pub const CARRY_CAPACITY_PER_PART: u32 = 50;

/// Health contributed by each body part.
pub const HEALTH_PER_PART: u32 = 100;

/// Ordered list of body parts describing what a unit can do.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Loadout {
    parts: Vec<PartKind>,
}

impl Loadout {
    /// Creates a loadout from the provided ordered parts.
    #[must_use]
    pub fn new(parts: Vec<PartKind>) -> Self {
        Self { parts }
    }

    /// Ordered parts of the loadout.
    #[must_use]
    pub fn parts(&self) -> &[PartKind] {
        &self.parts
    }

    /// Number of parts in the loadout.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Reports whether the loadout carries no parts at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Reports whether at least one part of the given kind is present.
    #[must_use]
    pub fn contains(&self, kind: PartKind) -> bool {
        self.parts.contains(&kind)
    }

    /// Number of parts of the given kind.
    #[must_use]
    pub fn count(&self, kind: PartKind) -> u32 {
        self.parts.iter().filter(|part| **part == kind).count() as u32
    }

    /// Reports whether the loadout can deal damage.
    #[must_use]
    pub fn is_offensive(&self) -> bool {
        self.contains(PartKind::Attack) || self.contains(PartKind::RangedAttack)
    }

    /// Range at which the loadout can strike, or zero when it cannot.
    #[must_use]
    pub fn attack_range(&self) -> u32 {
        if self.contains(PartKind::Attack) {
            1
        } else if self.contains(PartKind::RangedAttack) {
            3
        } else {
            0
        }
    }

    /// Reports whether the loadout moves at full speed across swamps.
    ///
    /// Fast units carry at least as many move parts as every other part
    /// combined.
    #[must_use]
    pub fn is_fast(&self) -> bool {
        let movers = self.count(PartKind::Move) as usize;
        movers > 0 && movers * 2 >= self.parts.len()
    }

    /// Energy required to produce the loadout.
    #[must_use]
    pub fn cost(&self) -> u32 {
        self.parts.iter().map(|part| part.cost()).sum()
    }
}

/// Current and maximum health of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    current: u32,
    max: u32,
}

impl Health {
    /// Creates a health record; `current` is clamped to `max`.
    #[must_use]
    pub fn new(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    /// Creates an undamaged health record.
    #[must_use]
    pub const fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Remaining health.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Maximum health.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Health missing from the maximum.
    #[must_use]
    pub const fn missing(&self) -> u32 {
        self.max.saturating_sub(self.current)
    }

    /// Reports whether any health is missing.
    #[must_use]
    pub const fn is_wounded(&self) -> bool {
        self.current < self.max
    }

    /// Applies damage, saturating at zero.
    #[must_use]
    pub const fn damaged(self, amount: u32) -> Self {
        Self {
            current: self.current.saturating_sub(amount),
            max: self.max,
        }
    }

    /// Restores health, saturating at the maximum.
    #[must_use]
    pub fn healed(self, amount: u32) -> Self {
        Self::new(self.current.saturating_add(amount), self.max)
    }
}

/// Resource kinds that can be stored, harvested and transferred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// The only currency of the arena.
    Energy,
}

/// Amount of energy held against a fixed capacity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Store {
    amount: u32,
    capacity: u32,
}

impl Store {
    /// Creates a store; `amount` is clamped to `capacity`.
    #[must_use]
    pub fn new(amount: u32, capacity: u32) -> Self {
        Self {
            amount: amount.min(capacity),
            capacity,
        }
    }

    /// Creates an empty store with the provided capacity.
    #[must_use]
    pub const fn empty(capacity: u32) -> Self {
        Self {
            amount: 0,
            capacity,
        }
    }

    /// Stored amount.
    #[must_use]
    pub const fn amount(&self) -> u32 {
        self.amount
    }

    /// Maximum amount the store can hold.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Remaining free capacity.
    #[must_use]
    pub const fn free(&self) -> u32 {
        self.capacity.saturating_sub(self.amount)
    }

    /// Reports whether the store holds nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.amount == 0
    }

    /// Reports whether the store cannot accept more.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.amount >= self.capacity
    }

    /// Adds up to `amount`, returning how much was accepted.
    pub fn deposit(&mut self, amount: u32) -> u32 {
        let accepted = amount.min(self.free());
        self.amount += accepted;
        accepted
    }

    /// Removes up to `amount`, returning how much was taken.
    pub fn take(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.amount);
        self.amount -= taken;
        taken
    }
}

/// Kinds of structures that exist in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    /// Production facility and home base.
    Spawn,
    /// Low-capacity feeder that funds production.
    Extension,
    /// Walkable storage, often pre-filled with energy.
    Container,
    /// Defensive structure that shoots enemies.
    Tower,
    /// Inert obstacle that can be demolished.
    Wall,
}

impl StructureKind {
    /// Reports whether units may stand on the structure's cell.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Container)
    }

    /// Work units required to finish building the structure.
    #[must_use]
    pub const fn build_cost(self) -> u32 {
        match self {
            Self::Spawn => 3_000,
            Self::Extension => 200,
            Self::Container => 100,
            Self::Tower => 1_250,
            Self::Wall => 100,
        }
    }
}

/// Entity that an attack may be aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackTarget {
    /// Hostile unit.
    Unit(UnitId),
    /// Hostile or neutral structure.
    Structure(StructureId),
}

/// Options forwarded to the pathfinding collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathOptions {
    /// Plan through cells occupied by other units.
    pub ignore_units: bool,
}

impl PathOptions {
    /// Options that treat other units as obstacles.
    #[must_use]
    pub const fn avoiding_units() -> Self {
        Self {
            ignore_units: false,
        }
    }

    /// Options that plan straight through other units.
    #[must_use]
    pub const fn ignoring_units() -> Self {
        Self { ignore_units: true }
    }
}

/// Action requests the decision core may submit to the arena.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Moves a unit a single cell.
    Move {
        /// Unit being moved.
        unit: UnitId,
        /// Heading of the step.
        direction: Direction,
    },
    /// Strikes a unit or structure.
    Attack {
        /// Attacking unit.
        unit: UnitId,
        /// Entity receiving the damage.
        target: AttackTarget,
    },
    /// Heals an adjacent friendly unit.
    Heal {
        /// Healing unit.
        unit: UnitId,
        /// Unit receiving the healing.
        target: UnitId,
    },
    /// Heals a friendly unit at range, at reduced potency.
    RangedHeal {
        /// Healing unit.
        unit: UnitId,
        /// Unit receiving the healing.
        target: UnitId,
    },
    /// Harvests energy from a resource node.
    Harvest {
        /// Harvesting unit.
        unit: UnitId,
        /// Node being harvested.
        source: SourceId,
    },
    /// Withdraws a resource from a structure into the unit's store.
    Withdraw {
        /// Withdrawing unit.
        unit: UnitId,
        /// Structure holding the resource.
        structure: StructureId,
        /// Resource being withdrawn.
        resource: ResourceKind,
    },
    /// Transfers a resource from the unit's store into a structure.
    Transfer {
        /// Delivering unit.
        unit: UnitId,
        /// Structure receiving the resource.
        structure: StructureId,
        /// Resource being transferred.
        resource: ResourceKind,
    },
    /// Invests held energy into a construction site.
    Build {
        /// Building unit.
        unit: UnitId,
        /// Site receiving the work.
        site: SiteId,
    },
    /// Requests a new construction site. Fire-and-forget.
    RequestConstruction {
        /// Cell the structure should occupy.
        cell: CellCoord,
        /// Kind of structure requested.
        kind: StructureKind,
    },
    /// Queues a new unit at a production facility.
    Enqueue {
        /// Facility producing the unit.
        spawn: StructureId,
        /// Loadout of the requested unit.
        loadout: Loadout,
    },
    /// Fires a tower at a hostile unit.
    TowerAttack {
        /// Firing tower.
        tower: StructureId,
        /// Unit receiving the damage.
        target: UnitId,
    },
}

/// Reasons the arena may reject a submitted [`Command`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum CommandError {
    /// The target lies beyond the action's range.
    #[error("target is not in range")]
    NotInRange,
    /// The referenced target does not exist or cannot receive the action.
    #[error("invalid target")]
    InvalidTarget,
    /// The acting entity is not controlled by this agent.
    #[error("acting entity is not owned by this agent")]
    NotOwner,
    /// The acting entity is fatigued or cooling down.
    #[error("acting entity is tired")]
    Tired,
    /// The acting unit lacks the body part the action needs.
    #[error("missing required body part")]
    NoBodyPart,
    /// Not enough resources to perform the action.
    #[error("not enough resources")]
    NotEnoughResources,
    /// The receiving store is full.
    #[error("target store is full")]
    Full,
    /// The facility is already producing.
    #[error("facility is busy")]
    Busy,
    /// The requested cell cannot be used.
    #[error("invalid location")]
    InvalidLocation,
}

/// Synchronous route planning service consumed by the decision core.
pub trait Pathfinder {
    /// Plans a route from `from` to `to`.
    ///
    /// The returned steps exclude `from` and end on `to`. `None` signals an
    /// unreachable destination.
    fn find_path(
        &self,
        from: CellCoord,
        to: CellCoord,
        options: PathOptions,
    ) -> Option<Vec<CellCoord>>;
}

/// Receiver for action requests that reports whether each one landed.
pub trait CommandSink {
    /// Submits a command to the arena.
    fn submit(&mut self, command: Command) -> Result<(), CommandError>;
}

/// Environment that both plans routes and accepts commands.
pub trait Arena: Pathfinder + CommandSink {}

impl<T: Pathfinder + CommandSink + ?Sized> Arena for T {}

impl CommandSink for Vec<Command> {
    fn submit(&mut self, command: Command) -> Result<(), CommandError> {
        self.push(command);
        Ok(())
    }
}
