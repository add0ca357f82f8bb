use arena_tactics_core::{
    Allegiance, ArenaView, AttackTarget, Command, StructureKind, StructureSnapshot, UnitSnapshot,
};
use arena_tactics_system_flanking::FlankStage;
use arena_tactics_system_movement::MoveOutcome;
use arena_tactics_system_squads::{Squad, SquadKind};

use super::{Attempt, Context};

pub(crate) fn run(ctx: &mut Context<'_>, unit: &UnitSnapshot, squad: Option<&Squad>) {
    match squad {
        Some(squad) => deployed(ctx, unit, squad),
        None => at_base(ctx, unit),
    }
}

fn at_base(ctx: &mut Context<'_>, unit: &UnitSnapshot) {
    if strike_nearby(ctx, unit) {
        return;
    }

    if let Some(obstacle) = obstacle(ctx.view) {
        let command = Command::Attack {
            unit: unit.id,
            target: AttackTarget::Structure(obstacle.id),
        };
        let reach = reach(unit);
        if ctx.attempt(unit, command, obstacle.cell, reach) != Attempt::Blocked {
            return;
        }
    }

    ctx.hold(unit);
}

fn deployed(ctx: &mut Context<'_>, unit: &UnitSnapshot, squad: &Squad) {
    let view = ctx.view;
    let reach = reach(unit);
    let mut struck = false;

    let leader = squad
        .leader()
        .filter(|leader| *leader != unit.id)
        .and_then(|leader| view.unit(leader));
    if let Some(leader) = leader {
        if unit.cell.range_to(leader.cell) > ctx.config.cohesion_radius {
            struck = strike_nearby(ctx, unit);
            if ctx.follow(unit, leader, ctx.config.follow_distance) != MoveOutcome::NoPath {
                return;
            }
        }
    }

    if squad.kind() == SquadKind::Flank {
        if let FlankStage::ToWaypoint(waypoint) = ctx.flank.stage(unit) {
            struck = struck || strike_nearby(ctx, unit);
            if ctx.approach(unit, waypoint, 1) != MoveOutcome::NoPath {
                return;
            }
            ctx.flank.skip_waypoint(unit.id);
        }
    }

    if let Some(target) = squad.focus().and_then(|focus| view.unit(focus)) {
        if unit.cell.range_to(target.cell) <= reach {
            if !struck {
                let _ = ctx.submit(Command::Attack {
                    unit: unit.id,
                    target: AttackTarget::Unit(target.id),
                });
            }
            return;
        }
        struck = struck || strike_nearby(ctx, unit);
        // An unreachable focus counts as no focus at all.
        if ctx.follow(unit, target, reach) != MoveOutcome::NoPath {
            return;
        }
    }

    assault_base(ctx, unit, struck);
}

/// Pushes on the enemy base, hitting it on contact unless already engaged.
fn assault_base(ctx: &mut Context<'_>, unit: &UnitSnapshot, struck: bool) {
    let struck = struck || strike_nearby(ctx, unit);
    let Some(base) = ctx.view.enemy_base() else {
        return;
    };
    let reach = reach(unit);
    if unit.cell.range_to(base.cell) <= reach {
        if !struck {
            let _ = ctx.submit(Command::Attack {
                unit: unit.id,
                target: AttackTarget::Structure(base.id),
            });
        }
    } else {
        let _ = ctx.approach(unit, base.cell, reach);
    }
}

/// Strikes the nearest enemy within the unit's own reach.
fn strike_nearby(ctx: &mut Context<'_>, unit: &UnitSnapshot) -> bool {
    let view = ctx.view;
    let reach = reach(unit);
    let target = view
        .enemy_units()
        .filter(|enemy| unit.cell.range_to(enemy.cell) <= reach)
        .min_by_key(|enemy| (unit.cell.range_to(enemy.cell), enemy.id));
    let Some(target) = target else {
        return false;
    };
    ctx.submit(Command::Attack {
        unit: unit.id,
        target: AttackTarget::Unit(target.id),
    })
    .is_ok()
}

fn reach(unit: &UnitSnapshot) -> u32 {
    unit.loadout.attack_range().max(1)
}

/// Neutral wall sealing off a container or resource node, nearest to home.
fn obstacle(view: &ArenaView) -> Option<&StructureSnapshot> {
    let home = view.home_base()?.cell;
    let supplies: Vec<_> = view
        .structures()
        .iter()
        .filter(|structure| structure.kind == StructureKind::Container)
        .map(|container| container.cell)
        .chain(view.sources().iter().map(|source| source.cell))
        .collect();
    view.structures_of(Allegiance::Neutral)
        .filter(|structure| structure.kind == StructureKind::Wall)
        .filter(|wall| supplies.iter().any(|supply| wall.cell.range_to(*supply) <= 1))
        .min_by_key(|wall| (home.range_to(wall.cell), wall.id))
}
