use arena_tactics_core::{
    Allegiance, Command, PartKind, ResourceKind, StructureKind, StructureSnapshot, UnitSnapshot,
};

use super::{Attempt, Context};

pub(crate) fn run(ctx: &mut Context<'_>, unit: &UnitSnapshot) {
    if let Some(home) = ctx.home() {
        let threatened = ctx
            .view
            .enemy_units()
            .any(|enemy| unit.cell.range_to(enemy.cell) <= ctx.config.flee_radius);
        if threatened {
            let _ = ctx.approach(unit, home, 1);
            return;
        }
    }

    if unit.store.is_full() {
        deliver(ctx, unit);
    } else {
        collect(ctx, unit);
    }
}

/// Feeds extensions and towers first, then construction sites, then the
/// production facility itself.
fn deliver(ctx: &mut Context<'_>, unit: &UnitSnapshot) {
    let view = ctx.view;
    let mut receivers: Vec<&StructureSnapshot> = view
        .structures_of(Allegiance::Mine)
        .filter(|structure| structure.store.free() > 0)
        .collect();
    receivers.sort_by_key(|structure| {
        (
            structure.kind == StructureKind::Spawn,
            unit.cell.range_to(structure.cell),
            structure.id,
        )
    });
    let (bases, feeders): (Vec<_>, Vec<_>) = receivers
        .into_iter()
        .partition(|structure| structure.kind == StructureKind::Spawn);

    for feeder in feeders {
        let command = Command::Transfer {
            unit: unit.id,
            structure: feeder.id,
            resource: ResourceKind::Energy,
        };
        if ctx.attempt(unit, command, feeder.cell, 1) != Attempt::Blocked {
            return;
        }
    }

    if unit.loadout.contains(PartKind::Work) && !unit.store.is_empty() {
        let mut sites: Vec<_> = view
            .sites()
            .iter()
            .filter(|site| site.allegiance == Allegiance::Mine)
            .collect();
        sites.sort_by_key(|site| (unit.cell.range_to(site.cell), site.id));
        for site in sites {
            let command = Command::Build {
                unit: unit.id,
                site: site.id,
            };
            if ctx.attempt(unit, command, site.cell, 1) != Attempt::Blocked {
                return;
            }
        }
    }

    for base in bases {
        let command = Command::Transfer {
            unit: unit.id,
            structure: base.id,
            resource: ResourceKind::Energy,
        };
        if ctx.attempt(unit, command, base.cell, 1) != Attempt::Blocked {
            return;
        }
    }

    ctx.hold(unit);
}

fn collect(ctx: &mut Context<'_>, unit: &UnitSnapshot) {
    let view = ctx.view;
    let mut containers: Vec<&StructureSnapshot> = view
        .structures()
        .iter()
        .filter(|structure| {
            structure.kind == StructureKind::Container
                && structure.allegiance != Allegiance::Enemy
                && !structure.store.is_empty()
        })
        .collect();
    containers.sort_by_key(|container| (unit.cell.range_to(container.cell), container.id));
    for container in containers {
        let command = Command::Withdraw {
            unit: unit.id,
            structure: container.id,
            resource: ResourceKind::Energy,
        };
        if ctx.attempt(unit, command, container.cell, 1) != Attempt::Blocked {
            return;
        }
    }

    if unit.loadout.contains(PartKind::Work) {
        let mut sources: Vec<_> = view
            .sources()
            .iter()
            .filter(|source| source.energy > 0)
            .collect();
        sources.sort_by_key(|source| (unit.cell.range_to(source.cell), source.id));
        for source in sources {
            let command = Command::Harvest {
                unit: unit.id,
                source: source.id,
            };
            if ctx.attempt(unit, command, source.cell, 1) != Attempt::Blocked {
                return;
            }
        }
    }

    if unit.store.is_empty() {
        ctx.hold(unit);
    } else {
        deliver(ctx, unit);
    }
}
