#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative arena state used to exercise the decision core.
//!
//! The world owns terrain, units, structures, construction sites and resource
//! nodes. Commands are resolved immediately through [`apply`], which validates
//! ownership, body parts, range and resources exactly like the live arena
//! would, and reports rejections as [`CommandError`] values. [`World::end_tick`]
//! advances production, fatigue and cooldowns. Opponent units never act.

mod navigation;
pub mod scenario;
mod structures;
mod terrain;

use std::collections::BTreeMap;

use arena_tactics_core::{
    Allegiance, ArenaView, AttackTarget, CellCoord, Command, CommandError, CommandSink,
    Dimensions, Direction, Health, Loadout, PartKind, ResourceKind, SiteId, SiteSnapshot,
    SourceId, SourceSnapshot, Store, StructureId, StructureKind, StructureSnapshot, UnitId,
    UnitSnapshot, CARRY_CAPACITY_PER_PART, HEALTH_PER_PART,
};
use log::debug;

pub use terrain::Terrain;

use self::structures::{base_health, store_capacity};
use self::terrain::TerrainGrid;

const ATTACK_POWER: u32 = 30;
const RANGED_ATTACK_POWER: u32 = 10;
const RANGED_ATTACK_RANGE: u32 = 3;
const HEAL_POWER: u32 = 12;
const RANGED_HEAL_POWER: u32 = 4;
const RANGED_HEAL_RANGE: u32 = 3;
const HARVEST_POWER: u32 = 2;
const BUILD_POWER: u32 = 5;
const BUILD_RANGE: u32 = 3;
const TOWER_RANGE: u32 = 20;
const TOWER_POWER: u32 = 150;
const TOWER_COOLDOWN: u32 = 10;
const TOWER_ENERGY_PER_SHOT: u32 = 10;
const SPAWN_TICKS_PER_PART: u32 = 3;
const FATIGUE_RECOVERY_PER_MOVE_PART: u32 = 2;

#[derive(Clone, Debug)]
struct Unit {
    id: UnitId,
    cell: CellCoord,
    allegiance: Allegiance,
    loadout: Loadout,
    health: Health,
    store: Store,
    fatigue: u32,
}

impl Unit {
    fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            cell: self.cell,
            health: self.health,
            loadout: self.loadout.clone(),
            allegiance: self.allegiance,
            store: self.store,
        }
    }
}

#[derive(Clone, Debug)]
struct Production {
    loadout: Loadout,
    remaining: u32,
}

#[derive(Clone, Debug)]
struct Structure {
    id: StructureId,
    kind: StructureKind,
    cell: CellCoord,
    allegiance: Allegiance,
    health: Health,
    store: Store,
    cooldown: u32,
    production: Option<Production>,
}

impl Structure {
    fn snapshot(&self) -> StructureSnapshot {
        StructureSnapshot {
            id: self.id,
            kind: self.kind,
            cell: self.cell,
            allegiance: self.allegiance,
            health: self.health,
            store: self.store,
            cooldown: self.cooldown,
            busy: self.production.is_some(),
        }
    }
}

#[derive(Clone, Debug)]
struct Site {
    id: SiteId,
    kind: StructureKind,
    cell: CellCoord,
    allegiance: Allegiance,
    progress: u32,
}

#[derive(Clone, Debug)]
struct Source {
    id: SourceId,
    cell: CellCoord,
    energy: u32,
}

/// Represents the authoritative arena state.
#[derive(Clone, Debug)]
pub struct World {
    tick: u64,
    dimensions: Dimensions,
    terrain: TerrainGrid,
    units: BTreeMap<UnitId, Unit>,
    structures: BTreeMap<StructureId, Structure>,
    sites: BTreeMap<SiteId, Site>,
    sources: BTreeMap<SourceId, Source>,
    next_unit_id: u32,
    next_structure_id: u32,
    next_site_id: u32,
    next_source_id: u32,
}

impl World {
    /// Creates an empty arena of plain terrain.
    #[must_use]
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            tick: 0,
            dimensions,
            terrain: TerrainGrid::new(dimensions),
            units: BTreeMap::new(),
            structures: BTreeMap::new(),
            sites: BTreeMap::new(),
            sources: BTreeMap::new(),
            next_unit_id: 0,
            next_structure_id: 0,
            next_site_id: 0,
            next_source_id: 0,
        }
    }

    /// Current tick counter.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Size of the arena grid.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Overrides the terrain of a single cell.
    pub fn set_terrain(&mut self, cell: CellCoord, terrain: Terrain) {
        self.terrain.set(cell, terrain);
    }

    /// Places a fully healed unit with an empty store.
    pub fn spawn_unit(
        &mut self,
        allegiance: Allegiance,
        cell: CellCoord,
        loadout: Loadout,
    ) -> UnitId {
        let id = UnitId::new(self.next_unit_id);
        self.next_unit_id += 1;
        let max_health = HEALTH_PER_PART * loadout.len() as u32;
        let capacity = CARRY_CAPACITY_PER_PART * loadout.count(PartKind::Carry);
        let _ = self.units.insert(
            id,
            Unit {
                id,
                cell,
                allegiance,
                loadout,
                health: Health::full(max_health),
                store: Store::empty(capacity),
                fatigue: 0,
            },
        );
        id
    }

    /// Places a finished structure with an empty store.
    pub fn place_structure(
        &mut self,
        allegiance: Allegiance,
        kind: StructureKind,
        cell: CellCoord,
    ) -> StructureId {
        let id = StructureId::new(self.next_structure_id);
        self.next_structure_id += 1;
        let _ = self.structures.insert(
            id,
            Structure {
                id,
                kind,
                cell,
                allegiance,
                health: Health::full(base_health(kind)),
                store: Store::empty(store_capacity(kind)),
                cooldown: 0,
                production: None,
            },
        );
        id
    }

    /// Places an unfinished construction site.
    pub fn place_site(
        &mut self,
        allegiance: Allegiance,
        kind: StructureKind,
        cell: CellCoord,
    ) -> SiteId {
        let id = SiteId::new(self.next_site_id);
        self.next_site_id += 1;
        let _ = self.sites.insert(
            id,
            Site {
                id,
                kind,
                cell,
                allegiance,
                progress: 0,
            },
        );
        id
    }

    /// Places a resource node holding `energy`.
    pub fn place_source(&mut self, cell: CellCoord, energy: u32) -> SourceId {
        let id = SourceId::new(self.next_source_id);
        self.next_source_id += 1;
        let _ = self.sources.insert(id, Source { id, cell, energy });
        id
    }

    /// Sets the energy carried by a unit, clamped to its capacity.
    pub fn set_unit_energy(&mut self, unit: UnitId, amount: u32) {
        if let Some(unit) = self.units.get_mut(&unit) {
            unit.store = Store::new(amount, unit.store.capacity());
        }
    }

    /// Sets the energy stored in a structure, clamped to its capacity.
    pub fn set_structure_energy(&mut self, structure: StructureId, amount: u32) {
        if let Some(structure) = self.structures.get_mut(&structure) {
            structure.store = Store::new(amount, structure.store.capacity());
        }
    }

    /// Applies raw damage to a unit, removing it when its health runs out.
    pub fn damage_unit(&mut self, unit: UnitId, amount: u32) {
        if let Some(entry) = self.units.get_mut(&unit) {
            entry.health = entry.health.damaged(amount);
            if entry.health.current() == 0 {
                let _ = self.units.remove(&unit);
            }
        }
    }

    /// Teleports a unit, bypassing movement rules.
    pub fn relocate_unit(&mut self, unit: UnitId, cell: CellCoord) {
        if let Some(entry) = self.units.get_mut(&unit) {
            entry.cell = cell;
        }
    }

    /// Captures the snapshot the decision core reads at the start of a tick.
    #[must_use]
    pub fn view(&self) -> ArenaView {
        ArenaView::new(
            self.tick,
            self.dimensions,
            self.units.values().map(Unit::snapshot).collect(),
            self.structures.values().map(Structure::snapshot).collect(),
            self.sites
                .values()
                .map(|site| SiteSnapshot {
                    id: site.id,
                    kind: site.kind,
                    cell: site.cell,
                    allegiance: site.allegiance,
                    progress: site.progress,
                    total: site.kind.build_cost(),
                })
                .collect(),
            self.sources
                .values()
                .map(|source| SourceSnapshot {
                    id: source.id,
                    cell: source.cell,
                    energy: source.energy,
                })
                .collect(),
        )
    }

    /// Advances production, fatigue recovery and cooldowns by one tick.
    pub fn end_tick(&mut self) {
        for unit in self.units.values_mut() {
            let recovery = FATIGUE_RECOVERY_PER_MOVE_PART * unit.loadout.count(PartKind::Move);
            unit.fatigue = unit.fatigue.saturating_sub(recovery);
        }

        let mut finished = Vec::new();
        for structure in self.structures.values_mut() {
            structure.cooldown = structure.cooldown.saturating_sub(1);
            if let Some(production) = structure.production.as_mut() {
                production.remaining = production.remaining.saturating_sub(1);
                if production.remaining == 0 {
                    finished.push(structure.id);
                }
            }
        }

        for spawn in finished {
            self.release_unit(spawn);
        }

        self.tick = self.tick.saturating_add(1);
    }

    fn release_unit(&mut self, spawn: StructureId) {
        let Some(structure) = self.structures.get(&spawn) else {
            return;
        };
        let Some(production) = structure.production.clone() else {
            return;
        };
        let allegiance = structure.allegiance;
        let origin = structure.cell;

        let exit = Direction::ALL
            .iter()
            .filter_map(|direction| origin.step(*direction))
            .find(|cell| self.is_enterable(*cell));
        let Some(exit) = exit else {
            return;
        };

        let unit = self.spawn_unit(allegiance, exit, production.loadout);
        debug!("spawn {} released unit {}", spawn.get(), unit.get());
        if let Some(structure) = self.structures.get_mut(&spawn) {
            structure.production = None;
        }
    }

    fn is_enterable(&self, cell: CellCoord) -> bool {
        self.dimensions.contains(cell)
            && self.terrain.get(cell) != Terrain::Wall
            && !self.units.values().any(|unit| unit.cell == cell)
            && !self
                .structures
                .values()
                .any(|structure| structure.cell == cell && !structure.kind.is_walkable())
    }

    fn owned_unit(&self, id: UnitId) -> Result<&Unit, CommandError> {
        let unit = self.units.get(&id).ok_or(CommandError::InvalidTarget)?;
        if unit.allegiance != Allegiance::Mine {
            return Err(CommandError::NotOwner);
        }
        Ok(unit)
    }

    fn resolve_move(&mut self, id: UnitId, direction: Direction) -> Result<(), CommandError> {
        let unit = self.owned_unit(id)?;
        if !unit.loadout.contains(PartKind::Move) {
            return Err(CommandError::NoBodyPart);
        }
        if unit.fatigue > 0 {
            return Err(CommandError::Tired);
        }
        let next = unit
            .cell
            .step(direction)
            .ok_or(CommandError::InvalidLocation)?;
        if !self.is_enterable(next) {
            return Err(CommandError::InvalidLocation);
        }

        let heavy_parts = unit
            .loadout
            .parts()
            .iter()
            .filter(|part| **part != PartKind::Move)
            .count() as u32;
        let fatigue = heavy_parts * self.terrain.get(next).fatigue_per_part();

        if let Some(unit) = self.units.get_mut(&id) {
            unit.cell = next;
            unit.fatigue = fatigue;
        }
        Ok(())
    }

    fn resolve_attack(&mut self, id: UnitId, target: AttackTarget) -> Result<(), CommandError> {
        let unit = self.owned_unit(id)?;
        let target_cell = match target {
            AttackTarget::Unit(target) => {
                let victim = self.units.get(&target).ok_or(CommandError::InvalidTarget)?;
                if victim.allegiance == Allegiance::Mine {
                    return Err(CommandError::InvalidTarget);
                }
                victim.cell
            }
            AttackTarget::Structure(target) => {
                let victim = self
                    .structures
                    .get(&target)
                    .ok_or(CommandError::InvalidTarget)?;
                if victim.allegiance == Allegiance::Mine {
                    return Err(CommandError::InvalidTarget);
                }
                victim.cell
            }
        };

        let range = unit.cell.range_to(target_cell);
        let melee = unit.loadout.count(PartKind::Attack);
        let ranged = unit.loadout.count(PartKind::RangedAttack);
        let damage = if melee > 0 && range <= 1 {
            melee * ATTACK_POWER
        } else if ranged > 0 && range <= RANGED_ATTACK_RANGE {
            ranged * RANGED_ATTACK_POWER
        } else if melee == 0 && ranged == 0 {
            return Err(CommandError::NoBodyPart);
        } else {
            return Err(CommandError::NotInRange);
        };

        match target {
            AttackTarget::Unit(target) => self.damage_unit(target, damage),
            AttackTarget::Structure(target) => self.damage_structure(target, damage),
        }
        Ok(())
    }

    fn damage_structure(&mut self, id: StructureId, amount: u32) {
        if let Some(structure) = self.structures.get_mut(&id) {
            structure.health = structure.health.damaged(amount);
            if structure.health.current() == 0 {
                debug!("structure {} destroyed", id.get());
                let _ = self.structures.remove(&id);
            }
        }
    }

    fn resolve_heal(
        &mut self,
        id: UnitId,
        target: UnitId,
        max_range: u32,
        power: u32,
    ) -> Result<(), CommandError> {
        let unit = self.owned_unit(id)?;
        let heal_parts = unit.loadout.count(PartKind::Heal);
        if heal_parts == 0 {
            return Err(CommandError::NoBodyPart);
        }
        let patient = self.units.get(&target).ok_or(CommandError::InvalidTarget)?;
        if patient.allegiance != Allegiance::Mine {
            return Err(CommandError::InvalidTarget);
        }
        if unit.cell.range_to(patient.cell) > max_range {
            return Err(CommandError::NotInRange);
        }
        if let Some(patient) = self.units.get_mut(&target) {
            patient.health = patient.health.healed(heal_parts * power);
        }
        Ok(())
    }

    fn resolve_harvest(&mut self, id: UnitId, source: SourceId) -> Result<(), CommandError> {
        let unit = self.owned_unit(id)?;
        let work_parts = unit.loadout.count(PartKind::Work);
        if work_parts == 0 {
            return Err(CommandError::NoBodyPart);
        }
        let node = self.sources.get(&source).ok_or(CommandError::InvalidTarget)?;
        if unit.cell.range_to(node.cell) > 1 {
            return Err(CommandError::NotInRange);
        }
        if node.energy == 0 {
            return Err(CommandError::NotEnoughResources);
        }
        if unit.store.is_full() {
            return Err(CommandError::Full);
        }

        let amount = (work_parts * HARVEST_POWER).min(node.energy);
        let accepted = match self.units.get_mut(&id) {
            Some(unit) => unit.store.deposit(amount),
            None => 0,
        };
        if let Some(node) = self.sources.get_mut(&source) {
            node.energy -= accepted;
        }
        Ok(())
    }

    fn resolve_withdraw(&mut self, id: UnitId, structure: StructureId) -> Result<(), CommandError> {
        let unit = self.owned_unit(id)?;
        if !unit.loadout.contains(PartKind::Carry) {
            return Err(CommandError::NoBodyPart);
        }
        let holder = self
            .structures
            .get(&structure)
            .ok_or(CommandError::InvalidTarget)?;
        if holder.allegiance == Allegiance::Enemy {
            return Err(CommandError::NotOwner);
        }
        if unit.cell.range_to(holder.cell) > 1 {
            return Err(CommandError::NotInRange);
        }
        if holder.store.is_empty() {
            return Err(CommandError::NotEnoughResources);
        }
        if unit.store.is_full() {
            return Err(CommandError::Full);
        }

        let amount = unit.store.free().min(holder.store.amount());
        if let Some(holder) = self.structures.get_mut(&structure) {
            let _ = holder.store.take(amount);
        }
        if let Some(unit) = self.units.get_mut(&id) {
            let _ = unit.store.deposit(amount);
        }
        Ok(())
    }

    fn resolve_transfer(&mut self, id: UnitId, structure: StructureId) -> Result<(), CommandError> {
        let unit = self.owned_unit(id)?;
        let receiver = self
            .structures
            .get(&structure)
            .ok_or(CommandError::InvalidTarget)?;
        if receiver.allegiance != Allegiance::Mine {
            return Err(CommandError::NotOwner);
        }
        if unit.cell.range_to(receiver.cell) > 1 {
            return Err(CommandError::NotInRange);
        }
        if unit.store.is_empty() {
            return Err(CommandError::NotEnoughResources);
        }
        if receiver.store.is_full() {
            return Err(CommandError::Full);
        }

        let amount = unit.store.amount().min(receiver.store.free());
        if let Some(unit) = self.units.get_mut(&id) {
            let _ = unit.store.take(amount);
        }
        if let Some(receiver) = self.structures.get_mut(&structure) {
            let _ = receiver.store.deposit(amount);
        }
        Ok(())
    }

    fn resolve_build(&mut self, id: UnitId, site: SiteId) -> Result<(), CommandError> {
        let unit = self.owned_unit(id)?;
        let work_parts = unit.loadout.count(PartKind::Work);
        if work_parts == 0 {
            return Err(CommandError::NoBodyPart);
        }
        let target = self.sites.get(&site).ok_or(CommandError::InvalidTarget)?;
        if target.allegiance != Allegiance::Mine {
            return Err(CommandError::NotOwner);
        }
        if unit.cell.range_to(target.cell) > BUILD_RANGE {
            return Err(CommandError::NotInRange);
        }
        if unit.store.is_empty() {
            return Err(CommandError::NotEnoughResources);
        }

        let remaining = target.kind.build_cost().saturating_sub(target.progress);
        let invested = (work_parts * BUILD_POWER)
            .min(unit.store.amount())
            .min(remaining);
        if let Some(unit) = self.units.get_mut(&id) {
            let _ = unit.store.take(invested);
        }

        let completed = match self.sites.get_mut(&site) {
            Some(target) => {
                target.progress += invested;
                target.progress >= target.kind.build_cost()
            }
            None => false,
        };
        if completed {
            if let Some(finished) = self.sites.remove(&site) {
                let structure =
                    self.place_structure(finished.allegiance, finished.kind, finished.cell);
                debug!("site {} completed as structure {}", site.get(), structure.get());
            }
        }
        Ok(())
    }

    fn resolve_construction(
        &mut self,
        cell: CellCoord,
        kind: StructureKind,
    ) -> Result<(), CommandError> {
        if !self.dimensions.contains(cell) || self.terrain.get(cell) == Terrain::Wall {
            return Err(CommandError::InvalidLocation);
        }
        let occupied = self.structures.values().any(|structure| structure.cell == cell)
            || self.sites.values().any(|site| site.cell == cell);
        if occupied {
            return Err(CommandError::InvalidLocation);
        }
        let _ = self.place_site(Allegiance::Mine, kind, cell);
        Ok(())
    }

    fn resolve_enqueue(&mut self, spawn: StructureId, loadout: Loadout) -> Result<(), CommandError> {
        let facility = self
            .structures
            .get(&spawn)
            .ok_or(CommandError::InvalidTarget)?;
        if facility.kind != StructureKind::Spawn {
            return Err(CommandError::InvalidTarget);
        }
        if facility.allegiance != Allegiance::Mine {
            return Err(CommandError::NotOwner);
        }
        if facility.production.is_some() {
            return Err(CommandError::Busy);
        }
        if loadout.is_empty() {
            return Err(CommandError::InvalidTarget);
        }

        let cost = loadout.cost();
        let available: u32 = self
            .structures
            .values()
            .filter(|structure| structure.allegiance == Allegiance::Mine)
            .filter(|structure| {
                structure.id == spawn || structure.kind == StructureKind::Extension
            })
            .map(|structure| structure.store.amount())
            .sum();
        if available < cost {
            return Err(CommandError::NotEnoughResources);
        }

        let mut owed = cost;
        if let Some(facility) = self.structures.get_mut(&spawn) {
            owed -= facility.store.take(owed);
        }
        for structure in self.structures.values_mut() {
            if owed == 0 {
                break;
            }
            if structure.allegiance == Allegiance::Mine
                && structure.kind == StructureKind::Extension
            {
                owed -= structure.store.take(owed);
            }
        }

        if let Some(facility) = self.structures.get_mut(&spawn) {
            facility.production = Some(Production {
                remaining: SPAWN_TICKS_PER_PART * loadout.len() as u32,
                loadout,
            });
        }
        Ok(())
    }

    fn resolve_tower_attack(
        &mut self,
        tower: StructureId,
        target: UnitId,
    ) -> Result<(), CommandError> {
        let shooter = self
            .structures
            .get(&tower)
            .ok_or(CommandError::InvalidTarget)?;
        if shooter.kind != StructureKind::Tower {
            return Err(CommandError::InvalidTarget);
        }
        if shooter.allegiance != Allegiance::Mine {
            return Err(CommandError::NotOwner);
        }
        if shooter.cooldown > 0 {
            return Err(CommandError::Tired);
        }
        if shooter.store.amount() < TOWER_ENERGY_PER_SHOT {
            return Err(CommandError::NotEnoughResources);
        }
        let victim = self.units.get(&target).ok_or(CommandError::InvalidTarget)?;
        if victim.allegiance == Allegiance::Mine {
            return Err(CommandError::InvalidTarget);
        }
        if shooter.cell.range_to(victim.cell) > TOWER_RANGE {
            return Err(CommandError::NotInRange);
        }

        if let Some(shooter) = self.structures.get_mut(&tower) {
            let _ = shooter.store.take(TOWER_ENERGY_PER_SHOT);
            shooter.cooldown = TOWER_COOLDOWN;
        }
        self.damage_unit(target, TOWER_POWER);
        Ok(())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command) -> Result<(), CommandError> {
    match command {
        Command::Move { unit, direction } => world.resolve_move(unit, direction),
        Command::Attack { unit, target } => world.resolve_attack(unit, target),
        Command::Heal { unit, target } => world.resolve_heal(unit, target, 1, HEAL_POWER),
        Command::RangedHeal { unit, target } => {
            world.resolve_heal(unit, target, RANGED_HEAL_RANGE, RANGED_HEAL_POWER)
        }
        Command::Harvest { unit, source } => world.resolve_harvest(unit, source),
        Command::Withdraw {
            unit,
            structure,
            resource: ResourceKind::Energy,
        } => world.resolve_withdraw(unit, structure),
        Command::Transfer {
            unit,
            structure,
            resource: ResourceKind::Energy,
        } => world.resolve_transfer(unit, structure),
        Command::Build { unit, site } => world.resolve_build(unit, site),
        Command::RequestConstruction { cell, kind } => world.resolve_construction(cell, kind),
        Command::Enqueue { spawn, loadout } => world.resolve_enqueue(spawn, loadout),
        Command::TowerAttack { tower, target } => world.resolve_tower_attack(tower, target),
    }
}

impl CommandSink for World {
    fn submit(&mut self, command: Command) -> Result<(), CommandError> {
        apply(self, command)
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use arena_tactics_core::{Allegiance, CellCoord, UnitId};

    use super::{Terrain, World};

    /// Terrain of the provided cell; out-of-bounds cells read as walls.
    #[must_use]
    pub fn terrain_at(world: &World, cell: CellCoord) -> Terrain {
        world.terrain.get(cell)
    }

    /// Number of living units fighting for the given side.
    #[must_use]
    pub fn unit_count(world: &World, allegiance: Allegiance) -> usize {
        world
            .units
            .values()
            .filter(|unit| unit.allegiance == allegiance)
            .count()
    }

    /// Cell currently occupied by the unit, if it lives.
    #[must_use]
    pub fn unit_cell(world: &World, unit: UnitId) -> Option<CellCoord> {
        world.units.get(&unit).map(|unit| unit.cell)
    }

    /// Remaining fatigue of the unit, if it lives.
    #[must_use]
    pub fn unit_fatigue(world: &World, unit: UnitId) -> Option<u32> {
        world.units.get(&unit).map(|unit| unit.fatigue)
    }
}
