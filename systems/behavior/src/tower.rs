use arena_tactics_core::{Allegiance, Command, StructureKind};
use log::debug;

use super::Context;

pub(crate) fn run(ctx: &mut Context<'_>) {
    let view = ctx.view;
    let towers = view
        .structures_of(Allegiance::Mine)
        .filter(|structure| structure.kind == StructureKind::Tower && structure.cooldown == 0);
    for tower in towers {
        let anchor = ctx.home().unwrap_or(tower.cell);
        let Some(target) = view
            .enemy_units()
            .min_by_key(|enemy| (anchor.range_to(enemy.cell), enemy.id))
        else {
            return;
        };
        if let Err(error) = ctx.submit(Command::TowerAttack {
            tower: tower.id,
            target: target.id,
        }) {
            debug!("tower {} held fire: {error}", tower.id.get());
        }
    }
}
