//! Wave deployment state machine.

use arena_tactics_core::{ArenaView, UnitId};
use arena_tactics_system_roles::RoleRoster;
use log::info;
use serde::Deserialize;

use super::{Composition, SquadBook, SquadKind, SquadName, TargetPolicy};

/// Configuration parameters of squad formation and targeting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Composition of the opening wave.
    pub first_wave: Composition,
    /// Composition of every wave after the opening ones.
    pub steady_wave: Composition,
    /// Composition of the fast flanking wave, if one is fielded.
    pub flank_wave: Option<Composition>,
    /// Holds formation while the production facility is mid-production.
    pub require_idle_facility: bool,
    /// Radius within which leaders pick focus targets.
    pub detection_radius: u32,
    /// Focus retention policy.
    pub target_policy: TargetPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            first_wave: Composition::new(3, 1),
            steady_wave: Composition::new(3, 1),
            flank_wave: None,
            require_idle_facility: true,
            detection_radius: 10,
            target_policy: TargetPolicy::Sticky,
        }
    }
}

/// Wave the sequencer is waiting to deploy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Opening wave.
    FirstWave,
    /// Fast flanking sub-squad.
    Flank,
    /// Recurring reinforcement waves.
    Steady,
}

/// Deployment sequencer tracking the current phase and formation history.
#[derive(Debug)]
pub struct Deployment {
    config: Config,
    phase: Phase,
    squads_formed: u32,
    first_deployed: bool,
}

impl Deployment {
    /// Creates a sequencer waiting for the opening wave.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            phase: Phase::FirstWave,
            squads_formed: 0,
            first_deployed: false,
        }
    }

    /// Phase the sequencer is in.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Squads deployed by the sequencer.
    #[must_use]
    pub const fn squads_formed(&self) -> u32 {
        self.squads_formed
    }

    /// Reports whether the opening wave has deployed.
    #[must_use]
    pub const fn first_deployed(&self) -> bool {
        self.first_deployed
    }

    /// Configuration the sequencer runs with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Deploys the current phase's wave when the undeployed pools meet its
    /// quota. At most one squad forms per call.
    pub fn advance(
        &mut self,
        book: &mut SquadBook,
        view: &ArenaView,
        roster: &RoleRoster,
    ) -> Option<SquadName> {
        let facility_busy = view.home_base().is_some_and(|facility| facility.busy);
        if self.config.require_idle_facility && facility_busy {
            return None;
        }

        let steady = self.config.steady_wave;
        let (name, kind) = match (self.phase, self.config.flank_wave) {
            (Phase::FirstWave, _) => {
                form(book, view, roster, SquadKind::Main, self.config.first_wave)?
            }
            // Reinforcements keep flowing while too few fast fighters exist.
            (Phase::Flank, Some(flank)) => form(book, view, roster, SquadKind::Flank, flank)
                .or_else(|| form(book, view, roster, SquadKind::Main, steady))?,
            (Phase::Flank, None) | (Phase::Steady, _) => {
                form(book, view, roster, SquadKind::Main, steady)?
            }
        };

        self.squads_formed += 1;
        if !self.first_deployed {
            self.first_deployed = true;
            info!("tick {}: first wave deployed as {name}", view.tick());
        }
        let next = match (self.phase, self.config.flank_wave, kind) {
            (Phase::FirstWave, Some(_), _) => Phase::Flank,
            (Phase::Flank, Some(_), SquadKind::Main) => Phase::Flank,
            _ => Phase::Steady,
        };
        if next != self.phase {
            info!("deployment phase {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
        Some(name)
    }
}

impl Default for Deployment {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Forms one squad of `kind`; flank squads draw only on fast fighters.
fn form(
    book: &mut SquadBook,
    view: &ArenaView,
    roster: &RoleRoster,
    kind: SquadKind,
    quota: Composition,
) -> Option<(SquadName, SquadKind)> {
    let fighters: Vec<UnitId> = roster
        .fighters()
        .iter()
        .copied()
        .filter(|id| kind == SquadKind::Main || is_fast(view, *id))
        .collect();
    book.form_squad(kind, &fighters, roster.medics(), quota)
        .map(|name| (name, kind))
}

fn is_fast(view: &ArenaView, unit: UnitId) -> bool {
    view.unit(unit)
        .is_some_and(|snapshot| snapshot.loadout.is_fast())
}

#[cfg(test)]
mod tests {
    use arena_tactics_core::{
        Allegiance, CellCoord, Dimensions, Health, Loadout, PartKind, Store, StructureId,
        StructureKind, StructureSnapshot, UnitSnapshot,
    };

    use super::*;

    fn unit(id: u32, parts: &[PartKind]) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            cell: CellCoord::new(id, 1),
            health: Health::full(100),
            loadout: Loadout::new(parts.to_vec()),
            allegiance: Allegiance::Mine,
            store: Store::default(),
        }
    }

    fn fighter(id: u32) -> UnitSnapshot {
        unit(id, &[PartKind::Tough, PartKind::Tough, PartKind::Attack, PartKind::Move])
    }

    fn runner(id: u32) -> UnitSnapshot {
        unit(id, &[PartKind::Attack, PartKind::Move])
    }

    fn medic(id: u32) -> UnitSnapshot {
        unit(id, &[PartKind::Heal, PartKind::Move])
    }

    fn view(units: Vec<UnitSnapshot>, busy: bool) -> ArenaView {
        let spawn = StructureSnapshot {
            id: StructureId::new(0),
            kind: StructureKind::Spawn,
            cell: CellCoord::new(0, 0),
            allegiance: Allegiance::Mine,
            health: Health::full(3_000),
            store: Store::empty(1_000),
            cooldown: 0,
            busy,
        };
        ArenaView::new(
            0,
            Dimensions::new(30, 30),
            units,
            vec![spawn],
            Vec::new(),
            Vec::new(),
        )
    }

    fn step(
        deployment: &mut Deployment,
        book: &mut SquadBook,
        view: &ArenaView,
    ) -> Option<SquadName> {
        let roster = RoleRoster::partition(view);
        deployment.advance(book, view, &roster)
    }

    #[test]
    fn three_fighters_and_a_medic_deploy_the_first_wave() {
        let mut deployment = Deployment::default();
        let mut book = SquadBook::new();
        let view = view(vec![fighter(1), fighter(2), fighter(3), medic(4)], false);

        let name = step(&mut deployment, &mut book, &view).expect("wave deployed");

        assert_eq!(name.to_string(), "Alpha");
        assert_eq!(
            book.squad(name).and_then(|squad| squad.leader()),
            Some(UnitId::new(1))
        );
        assert!(deployment.first_deployed());
        assert_eq!(deployment.phase(), Phase::Steady);
        assert_eq!(deployment.squads_formed(), 1);
        assert_eq!(step(&mut deployment, &mut book, &view), None);
        assert_eq!(book.squads().count(), 1);
    }

    #[test]
    fn busy_facility_postpones_the_wave() {
        let mut deployment = Deployment::default();
        let mut book = SquadBook::new();
        let units = vec![fighter(1), fighter(2), fighter(3), medic(4)];

        assert_eq!(step(&mut deployment, &mut book, &view(units.clone(), true)), None);
        assert!(!deployment.first_deployed());
        assert!(step(&mut deployment, &mut book, &view(units, false)).is_some());
    }

    #[test]
    fn busy_facility_is_ignored_when_not_required() {
        let mut deployment = Deployment::new(Config {
            require_idle_facility: false,
            ..Config::default()
        });
        let mut book = SquadBook::new();
        let units = vec![fighter(1), fighter(2), fighter(3), medic(4)];
        assert!(step(&mut deployment, &mut book, &view(units, true)).is_some());
    }

    #[test]
    fn flank_wave_draws_only_fast_fighters() {
        let mut deployment = Deployment::new(Config {
            first_wave: Composition::new(1, 0),
            flank_wave: Some(Composition::new(2, 0)),
            ..Config::default()
        });
        let mut book = SquadBook::new();

        let opening = view(vec![fighter(1)], false);
        let _ = step(&mut deployment, &mut book, &opening);
        assert_eq!(deployment.phase(), Phase::Flank);

        let slow_pool = view(vec![fighter(1), fighter(2), fighter(3), runner(4)], false);
        assert_eq!(step(&mut deployment, &mut book, &slow_pool), None);

        let fast_pool = view(
            vec![fighter(1), fighter(2), fighter(3), runner(4), runner(5)],
            false,
        );
        let name = step(&mut deployment, &mut book, &fast_pool).expect("flank formed");
        let squad = book.squad(name).expect("stored");
        assert_eq!(squad.kind(), SquadKind::Flank);
        assert_eq!(
            squad.fighters().collect::<Vec<_>>(),
            vec![UnitId::new(4), UnitId::new(5)]
        );
        assert_eq!(deployment.phase(), Phase::Steady);
    }

    #[test]
    fn slow_reinforcements_deploy_while_the_flank_wave_waits() {
        let mut deployment = Deployment::new(Config {
            flank_wave: Some(Composition::new(2, 0)),
            ..Config::default()
        });
        let mut book = SquadBook::new();
        let mut units = vec![fighter(1), fighter(2), fighter(3), medic(4)];
        let mut next_id = 5;

        for tick in 0..50 {
            if tick > 0 && tick % 5 == 0 {
                units.push(fighter(next_id));
                units.push(medic(next_id + 1));
                next_id += 2;
            }
            let _ = step(&mut deployment, &mut book, &view(units.clone(), false));
        }

        // Nine fighters arrived after the opening wave: three steady waves.
        assert_eq!(deployment.squads_formed(), 4);
        assert!(book.squads().all(|squad| squad.kind() == SquadKind::Main));
        assert_eq!(deployment.phase(), Phase::Flank);

        units.push(runner(next_id));
        units.push(runner(next_id + 1));
        let name = step(&mut deployment, &mut book, &view(units, false)).expect("flank formed");
        assert_eq!(book.squad(name).map(|squad| squad.kind()), Some(SquadKind::Flank));
        assert_eq!(deployment.phase(), Phase::Steady);
    }

    #[test]
    fn steady_waves_repeat_as_reinforcements_arrive() {
        let mut deployment = Deployment::new(Config {
            first_wave: Composition::new(1, 0),
            steady_wave: Composition::new(1, 0),
            ..Config::default()
        });
        let mut book = SquadBook::new();
        let mut units = Vec::new();
        for id in 1..=4 {
            units.push(fighter(id));
            let formed = step(&mut deployment, &mut book, &view(units.clone(), false));
            assert!(formed.is_some(), "reinforcement {id} not deployed");
        }
        assert_eq!(deployment.squads_formed(), 4);
        assert_eq!(book.names().last().map(ToString::to_string), Some("Delta".to_owned()));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: Config = toml::from_str(
            r#"
                target_policy = "continuous"

                [flank_wave]
                fighters = 2
            "#,
        )
        .expect("valid config");
        assert_eq!(config.target_policy, TargetPolicy::Continuous);
        assert_eq!(config.flank_wave, Some(Composition::new(2, 0)));
        assert_eq!(config.first_wave, Composition::new(3, 1));
    }
}
