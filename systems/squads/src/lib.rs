#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Squad bookkeeping and the wave deployment state machine.
//!
//! A [`SquadBook`] owns every squad formed during a match together with the
//! unit-to-squad assignments. A unit counts as deployed for as long as it is
//! assigned to a squad. Squads are formed atomically from undeployed pools and
//! keep their name for the rest of the match, even after every member died.

use std::{collections::BTreeMap, fmt};

use arena_tactics_core::{LiveUnits, RosterBound, UnitId, UnitSnapshot};
use log::debug;
use serde::Deserialize;

mod deployment;

pub use deployment::{Config, Deployment, Phase};

/// Ordered pool of squad names, reused cyclically once exhausted.
pub const NAME_POOL: [&str; 8] = [
    "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel",
];

/// Unique squad key drawn from [`NAME_POOL`].
///
/// The cycle counter starts at one and grows each time the pool wraps, so a
/// reused base name never collides with an earlier squad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SquadName {
    cycle: u32,
    slot: usize,
}

impl SquadName {
    /// Name assigned to the `ordinal`-th squad of the match, counted from zero.
    #[must_use]
    pub fn nth(ordinal: u32) -> Self {
        let pool = NAME_POOL.len() as u32;
        Self {
            cycle: ordinal / pool + 1,
            slot: (ordinal % pool) as usize,
        }
    }

    /// Base name taken from the pool.
    #[must_use]
    pub fn base(&self) -> &'static str {
        NAME_POOL[self.slot]
    }

    /// Number of times the pool has been walked when this name was issued.
    #[must_use]
    pub const fn cycle(&self) -> u32 {
        self.cycle
    }
}

impl fmt::Display for SquadName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cycle <= 1 {
            f.write_str(self.base())
        } else {
            write!(f, "{}-{}", self.base(), self.cycle)
        }
    }
}

/// Purpose a squad was formed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SquadKind {
    /// Advances straight on the enemy base.
    Main,
    /// Routes through the flanking waypoint before advancing.
    Flank,
}

/// Fighters and medics a squad needs before it can form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct Composition {
    /// Required fighters.
    pub fighters: u32,
    /// Required medics.
    pub medics: u32,
}

impl Composition {
    /// Creates a composition.
    #[must_use]
    pub const fn new(fighters: u32, medics: u32) -> Self {
        Self { fighters, medics }
    }

    /// Total number of members.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.fighters + self.medics
    }
}

/// Duty a unit was enlisted for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Duty {
    /// Deals damage and may lead.
    Fighter,
    /// Heals squadmates.
    Medic,
}

/// Squad member record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Member {
    /// Enlisted unit.
    pub id: UnitId,
    /// Duty the unit was enlisted for.
    pub duty: Duty,
}

/// How leaders pick focus targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPolicy {
    /// Keep the current focus while it lives and stays within the radius.
    #[default]
    Sticky,
    /// Re-evaluate the focus every tick.
    Continuous,
}

/// Group of deployed units moving and fighting together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Squad {
    name: SquadName,
    kind: SquadKind,
    quota: Composition,
    members: Vec<Member>,
    leader: Option<UnitId>,
    focus: Option<UnitId>,
}

impl Squad {
    /// Unique squad key.
    #[must_use]
    pub const fn name(&self) -> SquadName {
        self.name
    }

    /// Purpose of the squad.
    #[must_use]
    pub const fn kind(&self) -> SquadKind {
        self.kind
    }

    /// Composition the squad was formed with.
    #[must_use]
    pub const fn quota(&self) -> Composition {
        self.quota
    }

    /// Surviving members in enlistment order.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Surviving fighters in enlistment order.
    pub fn fighters(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.members_with(Duty::Fighter)
    }

    /// Surviving medics in enlistment order.
    pub fn medics(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.members_with(Duty::Medic)
    }

    /// Current leader, if any fighter survives to lead.
    #[must_use]
    pub const fn leader(&self) -> Option<UnitId> {
        self.leader
    }

    /// Enemy the leader designated for focus fire.
    #[must_use]
    pub const fn focus(&self) -> Option<UnitId> {
        self.focus
    }

    /// Reports whether the unit belongs to the squad.
    #[must_use]
    pub fn contains(&self, unit: UnitId) -> bool {
        self.members.iter().any(|member| member.id == unit)
    }

    /// Reports whether every member died.
    #[must_use]
    pub fn is_wiped(&self) -> bool {
        self.members.is_empty()
    }

    fn members_with(&self, duty: Duty) -> impl Iterator<Item = UnitId> + '_ {
        self.members
            .iter()
            .filter(move |member| member.duty == duty)
            .map(|member| member.id)
    }
}

/// Registry of squads and unit assignments.
#[derive(Debug, Default)]
pub struct SquadBook {
    squads: BTreeMap<SquadName, Squad>,
    assignments: BTreeMap<UnitId, SquadName>,
    formed: u32,
}

impl SquadBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forms a squad from the provided pools when they meet `quota`.
    ///
    /// Units already deployed are skipped. Either every selected member is
    /// enlisted and the first selected fighter leads, or nothing changes.
    pub fn form_squad(
        &mut self,
        kind: SquadKind,
        fighters: &[UnitId],
        medics: &[UnitId],
        quota: Composition,
    ) -> Option<SquadName> {
        if quota.size() == 0 {
            return None;
        }
        let fighters = self.select_undeployed(fighters, quota.fighters)?;
        let medics = self.select_undeployed(medics, quota.medics)?;

        let name = SquadName::nth(self.formed);
        self.formed += 1;

        let members: Vec<Member> = fighters
            .iter()
            .map(|&id| Member {
                id,
                duty: Duty::Fighter,
            })
            .chain(medics.iter().map(|&id| Member {
                id,
                duty: Duty::Medic,
            }))
            .collect();
        for member in &members {
            let _ = self.assignments.insert(member.id, name);
        }
        let leader = fighters.first().copied();
        debug!(
            "formed squad {name} ({kind:?}) with {} members, leader {:?}",
            members.len(),
            leader.map(|id| id.get())
        );
        let _ = self.squads.insert(
            name,
            Squad {
                name,
                kind,
                quota,
                members,
                leader,
                focus: None,
            },
        );
        Some(name)
    }

    fn select_undeployed(&self, pool: &[UnitId], wanted: u32) -> Option<Vec<UnitId>> {
        let selected: Vec<UnitId> = pool
            .iter()
            .copied()
            .filter(|id| !self.is_deployed(*id))
            .take(wanted as usize)
            .collect();
        (selected.len() == wanted as usize).then_some(selected)
    }

    /// Ensures the squad is led by a live fighter of its own, promoting the
    /// first surviving fighter when the recorded leader is gone.
    pub fn reconcile_leader(&mut self, name: SquadName, live: &LiveUnits) -> Option<UnitId> {
        let squad = self.squads.get_mut(&name)?;
        let is_live_fighter = |id: UnitId| {
            live.contains(id)
                && squad
                    .members
                    .iter()
                    .any(|member| member.id == id && member.duty == Duty::Fighter)
        };
        if let Some(leader) = squad.leader {
            if is_live_fighter(leader) {
                return Some(leader);
            }
        }
        let promoted = squad.fighters().find(|id| live.contains(*id));
        if promoted != squad.leader {
            debug!(
                "squad {name}: leadership passes to {:?}",
                promoted.map(|id| id.get())
            );
        }
        squad.leader = promoted;
        promoted
    }

    /// Lets the squad leader pick the focus target among `enemies`.
    ///
    /// Requests from anyone but the recorded leader leave the focus untouched.
    /// Enemies carrying offensive parts are preferred; ties go to the nearest
    /// one and then to the lowest id.
    pub fn designate_target<'a>(
        &mut self,
        name: SquadName,
        leader: &UnitSnapshot,
        enemies: impl IntoIterator<Item = &'a UnitSnapshot>,
        policy: TargetPolicy,
        radius: u32,
    ) -> Option<UnitId> {
        let squad = self.squads.get_mut(&name)?;
        if squad.leader != Some(leader.id) {
            return squad.focus;
        }

        let candidates: Vec<&UnitSnapshot> = enemies
            .into_iter()
            .filter(|enemy| leader.cell.range_to(enemy.cell) <= radius)
            .collect();
        if policy == TargetPolicy::Sticky {
            if let Some(current) = squad.focus {
                if candidates.iter().any(|enemy| enemy.id == current) {
                    return Some(current);
                }
            }
        }

        squad.focus = candidates
            .iter()
            .min_by_key(|enemy| {
                (
                    !enemy.loadout.is_offensive(),
                    leader.cell.range_to(enemy.cell),
                    enemy.id,
                )
            })
            .map(|enemy| enemy.id);
        squad.focus
    }

    /// Focus target designated by the squad's leader.
    #[must_use]
    pub fn focus(&self, name: SquadName) -> Option<UnitId> {
        self.squads.get(&name).and_then(Squad::focus)
    }

    /// Looks up a squad by name.
    #[must_use]
    pub fn squad(&self, name: SquadName) -> Option<&Squad> {
        self.squads.get(&name)
    }

    /// Squad the unit is enlisted in.
    #[must_use]
    pub fn squad_of(&self, unit: UnitId) -> Option<&Squad> {
        self.assignments
            .get(&unit)
            .and_then(|name| self.squads.get(name))
    }

    /// Every squad in formation order.
    pub fn squads(&self) -> impl Iterator<Item = &Squad> {
        self.squads.values()
    }

    /// Names of every squad in formation order.
    #[must_use]
    pub fn names(&self) -> Vec<SquadName> {
        self.squads.keys().copied().collect()
    }

    /// Reports whether the unit has been deployed into a squad.
    #[must_use]
    pub fn is_deployed(&self, unit: UnitId) -> bool {
        self.assignments.contains_key(&unit)
    }

    /// Number of squads formed so far.
    #[must_use]
    pub const fn formed(&self) -> u32 {
        self.formed
    }
}

impl RosterBound for SquadBook {
    fn retain_live(&mut self, live: &LiveUnits) -> usize {
        let mut removed = 0;
        for squad in self.squads.values_mut() {
            let before = squad.members.len();
            squad.members.retain(|member| live.contains(member.id));
            removed += before - squad.members.len();
            if squad.leader.is_some_and(|leader| !live.contains(leader)) {
                squad.leader = None;
                removed += 1;
            }
            if squad.focus.is_some_and(|focus| !live.contains(focus)) {
                squad.focus = None;
                removed += 1;
            }
        }
        let before = self.assignments.len();
        self.assignments.retain(|unit, _| live.contains(*unit));
        removed + before - self.assignments.len()
    }
}
