use std::cmp::Reverse;

use arena_tactics_core::{AttackTarget, Command, UnitSnapshot};
use arena_tactics_system_movement::MoveOutcome;
use arena_tactics_system_squads::Squad;

use super::{Attempt, Context};

pub(crate) fn run(ctx: &mut Context<'_>, unit: &UnitSnapshot, squad: Option<&Squad>) {
    match squad {
        Some(squad) => deployed(ctx, unit, squad),
        None => at_base(ctx, unit),
    }
}

fn at_base(ctx: &mut Context<'_>, unit: &UnitSnapshot) {
    let view = ctx.view;
    let heal_radius = ctx.config.heal_radius;
    let patients = wounded(
        unit,
        view.my_units()
            .filter(|friend| unit.cell.range_to(friend.cell) <= heal_radius),
    );
    if patients
        .into_iter()
        .any(|patient| heal(ctx, unit, patient) != Attempt::Blocked)
    {
        return;
    }

    let radius = ctx.config.base_defense_radius;

    if unit.loadout.is_offensive() {
        let anchor = ctx.home().unwrap_or(unit.cell);
        let threat = view
            .enemy_units()
            .filter(|enemy| anchor.range_to(enemy.cell) <= radius)
            .min_by_key(|enemy| (unit.cell.range_to(enemy.cell), enemy.id));
        if let Some(threat) = threat {
            let command = Command::Attack {
                unit: unit.id,
                target: AttackTarget::Unit(threat.id),
            };
            let reach = unit.loadout.attack_range();
            if ctx.attempt(unit, command, threat.cell, reach) != Attempt::Blocked {
                return;
            }
        }
    }

    ctx.hold(unit);
}

fn deployed(ctx: &mut Context<'_>, unit: &UnitSnapshot, squad: &Squad) {
    let view = ctx.view;
    let mates: Vec<&UnitSnapshot> = squad
        .members()
        .iter()
        .filter(|member| member.id != unit.id)
        .filter_map(|member| view.unit(member.id))
        .collect();
    if mates.is_empty() {
        orphaned(ctx, unit);
        return;
    }

    // Leader first, then the nearest mates.
    let mut anchors = mates.clone();
    anchors.sort_by_key(|mate| {
        (
            Some(mate.id) != squad.leader(),
            unit.cell.range_to(mate.cell),
            mate.id,
        )
    });

    let healed = wounded(unit, mates.iter().copied())
        .into_iter()
        .any(|patient| heal(ctx, unit, patient) != Attempt::Blocked);
    if !healed {
        // With nobody wounded the anchor is topped up pre-emptively.
        let _ = anchors
            .iter()
            .any(|anchor| heal(ctx, unit, anchor) != Attempt::Blocked);
    }

    for anchor in anchors {
        if ctx.follow(unit, anchor, ctx.config.follow_distance) != MoveOutcome::NoPath {
            return;
        }
    }
    orphaned(ctx, unit);
}

/// Squad wiped or out of reach: tag along with another deployed unit or push
/// on alone.
fn orphaned(ctx: &mut Context<'_>, unit: &UnitSnapshot) {
    let view = ctx.view;
    let squads = ctx.squads;
    let mut escorts: Vec<&UnitSnapshot> = view
        .my_units()
        .filter(|other| other.id != unit.id && squads.is_deployed(other.id))
        .collect();
    escorts.sort_by_key(|other| (unit.cell.range_to(other.cell), other.id));
    for escort in escorts {
        if heal(ctx, unit, escort) == Attempt::Blocked {
            continue;
        }
        if ctx.follow(unit, escort, ctx.config.follow_distance) != MoveOutcome::NoPath {
            return;
        }
    }
    if let Some(base) = view.enemy_base() {
        let _ = ctx.approach(unit, base.cell, 1);
    }
}

/// Wounded candidates, most damage first.
fn wounded<'v>(
    unit: &UnitSnapshot,
    candidates: impl Iterator<Item = &'v UnitSnapshot>,
) -> Vec<&'v UnitSnapshot> {
    let mut patients: Vec<_> = candidates
        .filter(|friend| friend.health.is_wounded())
        .collect();
    patients.sort_by_key(|friend| {
        (
            Reverse(friend.health.missing()),
            unit.cell.range_to(friend.cell),
            friend.id,
        )
    });
    patients
}

/// Heals in melee reach, at range otherwise, closing in when too far.
fn heal(ctx: &mut Context<'_>, unit: &UnitSnapshot, patient: &UnitSnapshot) -> Attempt {
    let command = if unit.cell.range_to(patient.cell) <= 1 {
        Command::Heal {
            unit: unit.id,
            target: patient.id,
        }
    } else {
        Command::RangedHeal {
            unit: unit.id,
            target: patient.id,
        }
    };
    ctx.attempt(unit, command, patient.cell, 1)
}
