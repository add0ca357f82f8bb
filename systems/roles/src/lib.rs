#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure classifier that maps unit loadouts to behavioural roles.

use arena_tactics_core::{ArenaView, Loadout, PartKind, UnitId, UnitSnapshot};

/// Behaviour a unit follows this tick, derived from its loadout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Carries energy between sources, containers and structures.
    Gatherer,
    /// Heals friendly units.
    Medic,
    /// Deals damage.
    Fighter,
    /// Matches no role and is skipped by behaviour execution.
    Inert,
}

/// Classifies a loadout.
///
/// Carry parts win over heal parts, which win over offensive parts.
#[must_use]
pub fn classify(loadout: &Loadout) -> Role {
    if loadout.contains(PartKind::Carry) {
        Role::Gatherer
    } else if loadout.contains(PartKind::Heal) {
        Role::Medic
    } else if loadout.is_offensive() {
        Role::Fighter
    } else {
        Role::Inert
    }
}

/// This agent's living units grouped by role, each group sorted by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleRoster {
    gatherers: Vec<UnitId>,
    medics: Vec<UnitId>,
    fighters: Vec<UnitId>,
    inert: Vec<UnitId>,
}

impl RoleRoster {
    /// Partitions the agent's units in the view.
    #[must_use]
    pub fn partition(view: &ArenaView) -> Self {
        Self::from_units(view.my_units())
    }

    /// Partitions an arbitrary set of units.
    #[must_use]
    pub fn from_units<'a>(units: impl IntoIterator<Item = &'a UnitSnapshot>) -> Self {
        let mut roster = Self::default();
        for unit in units {
            let bucket = match classify(&unit.loadout) {
                Role::Gatherer => &mut roster.gatherers,
                Role::Medic => &mut roster.medics,
                Role::Fighter => &mut roster.fighters,
                Role::Inert => &mut roster.inert,
            };
            bucket.push(unit.id);
        }
        roster.gatherers.sort_unstable();
        roster.medics.sort_unstable();
        roster.fighters.sort_unstable();
        roster.inert.sort_unstable();
        roster
    }

    /// Units classified as gatherers.
    #[must_use]
    pub fn gatherers(&self) -> &[UnitId] {
        &self.gatherers
    }

    /// Units classified as medics.
    #[must_use]
    pub fn medics(&self) -> &[UnitId] {
        &self.medics
    }

    /// Units classified as fighters.
    #[must_use]
    pub fn fighters(&self) -> &[UnitId] {
        &self.fighters
    }

    /// Units that match no role.
    #[must_use]
    pub fn inert(&self) -> &[UnitId] {
        &self.inert
    }

    /// Number of units holding the given role.
    #[must_use]
    pub fn count(&self, role: Role) -> usize {
        match role {
            Role::Gatherer => self.gatherers.len(),
            Role::Medic => self.medics.len(),
            Role::Fighter => self.fighters.len(),
            Role::Inert => self.inert.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_tactics_core::{Allegiance, CellCoord, Health, Store};

    fn loadout(parts: &[PartKind]) -> Loadout {
        Loadout::new(parts.to_vec())
    }

    #[test]
    fn carry_takes_precedence_over_heal_and_attack() {
        let hybrid = loadout(&[PartKind::Attack, PartKind::Heal, PartKind::Carry]);
        assert_eq!(classify(&hybrid), Role::Gatherer);
    }

    #[test]
    fn heal_takes_precedence_over_attack() {
        let battle_medic = loadout(&[PartKind::RangedAttack, PartKind::Heal, PartKind::Move]);
        assert_eq!(classify(&battle_medic), Role::Medic);
    }

    #[test]
    fn ranged_or_melee_parts_make_a_fighter() {
        assert_eq!(
            classify(&loadout(&[PartKind::Move, PartKind::RangedAttack])),
            Role::Fighter
        );
        assert_eq!(
            classify(&loadout(&[PartKind::Tough, PartKind::Attack])),
            Role::Fighter
        );
    }

    #[test]
    fn movers_and_workers_are_inert() {
        assert_eq!(
            classify(&loadout(&[PartKind::Move, PartKind::Work])),
            Role::Inert
        );
        assert_eq!(classify(&Loadout::default()), Role::Inert);
    }

    #[test]
    fn classification_is_idempotent() {
        let unit = loadout(&[PartKind::Heal, PartKind::Move]);
        assert_eq!(classify(&unit), classify(&unit));
    }

    #[test]
    fn partition_sorts_each_bucket() {
        let snapshot = |id: u32, parts: &[PartKind]| UnitSnapshot {
            id: UnitId::new(id),
            cell: CellCoord::new(id, 0),
            health: Health::full(100),
            loadout: loadout(parts),
            allegiance: Allegiance::Mine,
            store: Store::default(),
        };
        let units = vec![
            snapshot(9, &[PartKind::Attack]),
            snapshot(2, &[PartKind::Attack]),
            snapshot(4, &[PartKind::Heal]),
            snapshot(1, &[PartKind::Move]),
        ];

        let roster = RoleRoster::from_units(&units);

        assert_eq!(roster.fighters(), &[UnitId::new(2), UnitId::new(9)]);
        assert_eq!(roster.medics(), &[UnitId::new(4)]);
        assert_eq!(roster.inert(), &[UnitId::new(1)]);
        assert_eq!(roster.count(Role::Gatherer), 0);
    }
}
