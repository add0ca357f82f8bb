use arena_tactics_core::{Allegiance, ArenaView, Command, Loadout, PartKind, StructureKind};
use log::debug;
use serde::Deserialize;

/// Unit template the facility produces until enough of them live.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Archetype {
    /// Human readable label used in logs.
    pub name: String,
    /// Ordered body parts.
    pub parts: Vec<PartKind>,
    /// Number of living units with this loadout the list aims for.
    pub target: u32,
}

impl Archetype {
    /// Creates an archetype.
    #[must_use]
    pub fn new(name: &str, parts: &[PartKind], target: u32) -> Self {
        Self {
            name: name.to_owned(),
            parts: parts.to_vec(),
            target,
        }
    }

    /// Loadout the facility is asked to produce.
    #[must_use]
    pub fn loadout(&self) -> Loadout {
        Loadout::new(self.parts.clone())
    }
}

/// Configuration parameters of the production planner.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Archetypes in priority order.
    pub archetypes: Vec<Archetype>,
}

impl Default for Config {
    fn default() -> Self {
        use PartKind::{Attack, Carry, Heal, Move, Tough, Work};

        let harvester = [Work, Carry, Move];
        let fighter = [Tough, Attack, Attack, Move, Move];
        let medic = [Heal, Move];
        Self {
            archetypes: vec![
                Archetype::new("harvester", &harvester, 2),
                Archetype::new("fighter", &fighter, 3),
                Archetype::new("medic", &medic, 1),
                Archetype::new("fighter", &fighter, 6),
                Archetype::new("medic", &medic, 2),
                Archetype::new("harvester", &harvester, 3),
                Archetype::new("fighter", &fighter, 9),
                Archetype::new("medic", &medic, 3),
            ],
        }
    }
}

/// Production planner walking the archetype priority list.
#[derive(Debug, Default)]
pub struct Production {
    config: Config,
}

impl Production {
    /// Creates a planner.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Picks the next unit to enqueue at the home facility.
    ///
    /// Only the first archetype below its target is considered, so a costly
    /// entry waits for energy instead of being skipped for a cheaper one.
    /// Returns `None` while the facility is missing or busy.
    #[must_use]
    pub fn plan(&self, view: &ArenaView) -> Option<Command> {
        let facility = view.home_base()?;
        if facility.busy {
            return None;
        }

        let archetype = self.config.archetypes.iter().find(|archetype| {
            let loadout = archetype.loadout();
            let living = view
                .my_units()
                .filter(|unit| unit.loadout == loadout)
                .count();
            living < archetype.target as usize
        })?;

        let loadout = archetype.loadout();
        let available = spawn_energy(view);
        if available < loadout.cost() {
            return None;
        }
        debug!(
            "tick {}: enqueueing {} ({} energy of {})",
            view.tick(),
            archetype.name,
            loadout.cost(),
            available
        );
        Some(Command::Enqueue {
            spawn: facility.id,
            loadout,
        })
    }
}

/// Energy the facility may draw on, including its feeder extensions.
fn spawn_energy(view: &ArenaView) -> u32 {
    view.structures_of(Allegiance::Mine)
        .filter(|structure| {
            matches!(structure.kind, StructureKind::Spawn | StructureKind::Extension)
        })
        .map(|structure| structure.store.amount())
        .sum()
}
