#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick loop of the tactical core.
//!
//! A [`Commander`] owns every table the core keeps between ticks and drives
//! the systems over one [`ArenaView`] in a fixed order: pruning, role
//! partition, squad upkeep, flank planning, unit behaviour, towers and
//! finally the economy.

use arena_tactics_core::{Arena, ArenaView, Command, RosterBound};
use arena_tactics_system_behavior::Context;
use arena_tactics_system_economy::{Construction, Production};
use arena_tactics_system_flanking::FlankPlanner;
use arena_tactics_system_lifecycle::Lifecycle;
use arena_tactics_system_movement::Movement;
use arena_tactics_system_roles::RoleRoster;
use arena_tactics_system_squads::{Deployment, SquadBook, SquadName};
use log::debug;

mod config;

pub use config::{Config, ConfigError};

/// What happened during one call to [`Commander::tick`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick the report belongs to.
    pub tick: u64,
    /// Stale entries purged from the core's tables.
    pub pruned: usize,
    /// Squad deployed this tick, if any.
    pub formed: Option<SquadName>,
    /// Units whose behaviour chain ran.
    pub units_acted: usize,
    /// Production order accepted by the arena.
    pub enqueued: Option<Command>,
    /// Construction request accepted by the arena.
    pub construction: Option<Command>,
}

/// Owner of all persistent tactical state.
#[derive(Debug, Default)]
pub struct Commander {
    lifecycle: Lifecycle,
    movement: Movement,
    squads: SquadBook,
    deployment: Deployment,
    flank: FlankPlanner,
    production: Production,
    construction: Construction,
    behavior: arena_tactics_system_behavior::Config,
}

impl Commander {
    /// Creates a commander with empty tables.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            movement: Movement::new(config.movement),
            squads: SquadBook::new(),
            deployment: Deployment::new(config.squads),
            flank: FlankPlanner::new(config.flanking),
            production: Production::new(config.production),
            construction: Construction::new(config.construction),
            behavior: config.behavior,
        }
    }

    /// Runs one decision tick against `view`, submitting actions to `arena`.
    pub fn tick(&mut self, view: &ArenaView, arena: &mut dyn Arena) -> TickReport {
        let mut report = TickReport {
            tick: view.tick(),
            ..TickReport::default()
        };

        let tables: &mut [&mut dyn RosterBound] =
            &mut [&mut self.movement, &mut self.squads, &mut self.flank];
        report.pruned = self.lifecycle.prune(view, tables).removed;

        let roster = RoleRoster::partition(view);
        self.movement.begin_tick(view.tick());

        self.update_squads(view);
        report.formed = self.deployment.advance(&mut self.squads, view, &roster);

        if self.deployment.config().flank_wave.is_some() {
            let _ = self.flank.waypoint_for(
                view.home_base().map(|base| base.cell),
                view.enemy_base().map(|base| base.cell),
                view.dimensions(),
                &*arena,
            );
        }

        let mut context = Context::new(
            view,
            &self.squads,
            &mut self.movement,
            &mut self.flank,
            &mut *arena,
            self.behavior,
        );
        for unit in roster.gatherers().iter().filter_map(|id| view.unit(*id)) {
            context.run_gatherer(unit);
            report.units_acted += 1;
        }
        for unit in roster.medics().iter().filter_map(|id| view.unit(*id)) {
            context.run_medic(unit);
            report.units_acted += 1;
        }
        for unit in roster.fighters().iter().filter_map(|id| view.unit(*id)) {
            context.run_fighter(unit);
            report.units_acted += 1;
        }
        context.run_towers();

        report.enqueued = self
            .production
            .plan(view)
            .and_then(|command| submit(arena, command));
        report.construction = self
            .construction
            .plan(view, self.deployment.first_deployed())
            .and_then(|command| submit(arena, command));

        report
    }

    /// Promotes successors for fallen leaders and refreshes focus targets.
    fn update_squads(&mut self, view: &ArenaView) {
        let live = view.live_units();
        let config = *self.deployment.config();
        for name in self.squads.names() {
            let leader = self
                .squads
                .reconcile_leader(name, &live)
                .and_then(|leader| view.unit(leader));
            if let Some(leader) = leader {
                let _ = self.squads.designate_target(
                    name,
                    leader,
                    view.enemy_units(),
                    config.target_policy,
                    config.detection_radius,
                );
            }
        }
    }

    /// Squads formed so far and their assignments.
    #[must_use]
    pub const fn squads(&self) -> &SquadBook {
        &self.squads
    }

    /// Path cache shared by every unit.
    #[must_use]
    pub const fn movement(&self) -> &Movement {
        &self.movement
    }

    /// Wave sequencing state.
    #[must_use]
    pub const fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// Flank waypoint and per-unit progress.
    #[must_use]
    pub const fn flank(&self) -> &FlankPlanner {
        &self.flank
    }

    /// Tower sites requested so far.
    #[must_use]
    pub const fn construction(&self) -> &Construction {
        &self.construction
    }

    /// Lifecycle tracker, exposing the latest pruning report.
    #[must_use]
    pub const fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

fn submit(arena: &mut dyn Arena, command: Command) -> Option<Command> {
    match arena.submit(command.clone()) {
        Ok(()) => Some(command),
        Err(error) => {
            debug!("economy order {command:?} rejected: {error}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use arena_tactics_core::{
        Allegiance, CellCoord, CommandError, CommandSink, Dimensions, Health, Loadout, PartKind,
        PathOptions, Pathfinder, StructureId, StructureKind, StructureSnapshot, Store,
        UnitSnapshot, UnitId,
    };

    use super::*;

    /// Arena that accepts everything and never finds a route.
    #[derive(Default)]
    struct Recorder {
        commands: Vec<Command>,
    }

    impl Pathfinder for Recorder {
        fn find_path(&self, _: CellCoord, _: CellCoord, _: PathOptions) -> Option<Vec<CellCoord>> {
            None
        }
    }

    impl CommandSink for Recorder {
        fn submit(&mut self, command: Command) -> Result<(), CommandError> {
            self.commands.push(command);
            Ok(())
        }
    }

    fn unit(id: u32, column: u32, parts: Vec<PartKind>) -> UnitSnapshot {
        let loadout = Loadout::new(parts);
        UnitSnapshot {
            id: UnitId::new(id),
            cell: CellCoord::new(column, 5),
            health: Health::full(100 * loadout.len() as u32),
            loadout,
            allegiance: Allegiance::Mine,
            store: Store::empty(0),
        }
    }

    fn fighter(id: u32, column: u32) -> UnitSnapshot {
        unit(id, column, vec![PartKind::Attack, PartKind::Move])
    }

    fn view(tick: u64, units: Vec<UnitSnapshot>) -> ArenaView {
        let spawn = StructureSnapshot {
            id: StructureId::new(1),
            kind: StructureKind::Spawn,
            allegiance: Allegiance::Mine,
            cell: CellCoord::new(1, 5),
            health: Health::full(5000),
            store: Store::new(300, 300),
            busy: false,
            cooldown: 0,
        };
        ArenaView::new(
            tick,
            Dimensions::new(20, 10),
            units,
            vec![spawn],
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn first_wave_forms_once_the_quota_is_alive() {
        let mut commander = Commander::default();
        let mut arena = Recorder::default();
        let units = vec![
            fighter(1, 3),
            fighter(2, 4),
            fighter(3, 5),
            unit(4, 6, vec![PartKind::Heal, PartKind::Move]),
        ];

        let report = commander.tick(&view(0, units), &mut arena);

        assert_eq!(report.formed, Some(SquadName::nth(0)));
        assert_eq!(report.units_acted, 4);
        assert!(commander.deployment().first_deployed());
        let squad = commander.squads().squad(SquadName::nth(0)).expect("formed");
        assert_eq!(squad.leader(), Some(UnitId::new(1)));
    }

    #[test]
    fn dead_units_leave_every_table_before_anything_runs() {
        let mut commander = Commander::default();
        let mut arena = Recorder::default();
        let units = vec![
            fighter(1, 3),
            fighter(2, 4),
            fighter(3, 5),
            unit(4, 6, vec![PartKind::Heal, PartKind::Move]),
        ];
        let _ = commander.tick(&view(0, units.clone()), &mut arena);

        let survivors = units.into_iter().filter(|unit| unit.id != UnitId::new(1)).collect();
        let report = commander.tick(&view(1, survivors), &mut arena);

        assert!(report.pruned >= 1);
        let squad = commander.squads().squad(SquadName::nth(0)).expect("retained");
        assert!(!squad.contains(UnitId::new(1)));
        assert_eq!(squad.leader(), Some(UnitId::new(2)));
    }

    #[test]
    fn idle_facility_receives_a_production_order() {
        let mut commander = Commander::default();
        let mut arena = Recorder::default();

        let report = commander.tick(&view(0, Vec::new()), &mut arena);

        assert!(matches!(report.enqueued, Some(Command::Enqueue { .. })));
        assert_eq!(arena.commands.last(), report.enqueued.as_ref());
        assert_eq!(report.formed, None);
    }
}
