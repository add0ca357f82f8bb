#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-role behaviour executors.
//!
//! Each executor walks a fixed priority chain for one unit and submits the
//! first action that lands. An action rejected as out of range turns into a
//! move toward its target; a target that cannot be reached lets the chain
//! fall through to the next candidate, ending in holding near the base.

use arena_tactics_core::{
    Arena, ArenaView, CellCoord, Command, CommandError, PathOptions, UnitSnapshot,
};
use arena_tactics_system_flanking::FlankPlanner;
use arena_tactics_system_movement::{Destination, MoveOutcome, Movement};
use arena_tactics_system_squads::SquadBook;
use log::debug;
use serde::Deserialize;

mod fighter;
mod gatherer;
mod medic;
mod tower;

/// Configuration parameters of the behaviour executors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Distance beyond which a fighter regroups with its leader.
    pub cohesion_radius: u32,
    /// Distance medics and regrouping fighters keep from whoever they follow.
    pub follow_distance: u32,
    /// Distance at which an enemy makes a gatherer retreat.
    pub flee_radius: u32,
    /// Radius around the home base that undeployed units defend.
    pub base_defense_radius: u32,
    /// Distance at which an undeployed medic looks for patients.
    pub heal_radius: u32,
    /// Distance from the home base idle units wait at.
    pub hold_radius: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cohesion_radius: 4,
            follow_distance: 1,
            flee_radius: 4,
            base_defense_radius: 8,
            heal_radius: 3,
            hold_radius: 2,
        }
    }
}

/// Borrowed state an executor needs for one tick.
pub struct Context<'a> {
    view: &'a ArenaView,
    squads: &'a SquadBook,
    movement: &'a mut Movement,
    flank: &'a mut FlankPlanner,
    arena: &'a mut dyn Arena,
    config: Config,
}

/// Result of trying an action with a move as fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
    /// The action landed.
    Done,
    /// The target was out of range and the unit is closing in.
    Closing,
    /// The action failed and the target cannot be approached.
    Blocked,
}

impl<'a> Context<'a> {
    /// Bundles the tick's snapshot, the core-owned tables and the arena.
    #[must_use]
    pub fn new(
        view: &'a ArenaView,
        squads: &'a SquadBook,
        movement: &'a mut Movement,
        flank: &'a mut FlankPlanner,
        arena: &'a mut dyn Arena,
        config: Config,
    ) -> Self {
        Self {
            view,
            squads,
            movement,
            flank,
            arena,
            config,
        }
    }

    /// Runs the gatherer chain for the unit.
    pub fn run_gatherer(&mut self, unit: &UnitSnapshot) {
        gatherer::run(self, unit);
    }

    /// Runs the medic chain, deployed or at base depending on enlistment.
    pub fn run_medic(&mut self, unit: &UnitSnapshot) {
        let squads = self.squads;
        medic::run(self, unit, squads.squad_of(unit.id));
    }

    /// Runs the fighter chain, deployed or at base depending on enlistment.
    pub fn run_fighter(&mut self, unit: &UnitSnapshot) {
        let squads = self.squads;
        fighter::run(self, unit, squads.squad_of(unit.id));
    }

    /// Fires every idle tower at the enemy nearest to the home base.
    pub fn run_towers(&mut self) {
        tower::run(self);
    }

    fn home(&self) -> Option<CellCoord> {
        self.view.home_base().map(|base| base.cell)
    }

    fn submit(&mut self, command: Command) -> Result<(), CommandError> {
        self.arena.submit(command)
    }

    fn approach(&mut self, unit: &UnitSnapshot, cell: CellCoord, range: u32) -> MoveOutcome {
        self.movement.move_within(
            unit,
            Destination::Cell(cell),
            range,
            PathOptions::avoiding_units(),
            &mut *self.arena,
        )
    }

    fn follow(&mut self, unit: &UnitSnapshot, target: &UnitSnapshot, range: u32) -> MoveOutcome {
        self.movement.move_within(
            unit,
            Destination::unit(target),
            range,
            PathOptions::avoiding_units(),
            &mut *self.arena,
        )
    }

    /// Submits the command, closing in on `target` when it is out of range.
    fn attempt(
        &mut self,
        unit: &UnitSnapshot,
        command: Command,
        target: CellCoord,
        range: u32,
    ) -> Attempt {
        match self.submit(command) {
            Ok(()) => Attempt::Done,
            Err(CommandError::NotInRange) => match self.approach(unit, target, range) {
                MoveOutcome::NoPath | MoveOutcome::Rejected(_) => Attempt::Blocked,
                MoveOutcome::Moved | MoveOutcome::Arrived | MoveOutcome::AlreadyMoved => {
                    Attempt::Closing
                }
            },
            Err(error) => {
                debug!("unit {} action rejected: {error}", unit.id.get());
                Attempt::Blocked
            }
        }
    }

    fn hold(&mut self, unit: &UnitSnapshot) {
        if let Some(home) = self.home() {
            let _ = self.approach(unit, home, self.config.hold_radius);
        }
    }
}
