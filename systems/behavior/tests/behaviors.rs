use arena_tactics_core::{
    Allegiance, ArenaView, CellCoord, Dimensions, Loadout, PartKind, RosterBound, StructureId,
    StructureKind, UnitId,
};
use arena_tactics_system_behavior::{Config, Context};
use arena_tactics_system_flanking::FlankPlanner;
use arena_tactics_system_movement::{Movement, TargetKey};
use arena_tactics_system_squads::{Composition, SquadBook, SquadKind, TargetPolicy};
use arena_tactics_world::{query, Terrain, World};

struct Harness {
    world: World,
    squads: SquadBook,
    movement: Movement,
    flank: FlankPlanner,
}

impl Harness {
    fn new(columns: u32, rows: u32) -> Self {
        Self {
            world: World::new(Dimensions::new(columns, rows)),
            squads: SquadBook::new(),
            movement: Movement::default(),
            flank: FlankPlanner::default(),
        }
    }

    fn run(&mut self, act: impl FnOnce(&mut Context<'_>, &ArenaView)) {
        let view = self.world.view();
        self.movement.begin_tick(view.tick());
        let mut context = Context::new(
            &view,
            &self.squads,
            &mut self.movement,
            &mut self.flank,
            &mut self.world,
            Config::default(),
        );
        act(&mut context, &view);
    }

    fn unit_health(&self, unit: UnitId) -> Option<u32> {
        self.world
            .view()
            .unit(unit)
            .map(|snapshot| snapshot.health.current())
    }

    fn wall_in(&mut self, cell: CellCoord) {
        for (dx, dy) in [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)] {
            let ring = CellCoord::new(
                cell.column().saturating_add_signed(dx),
                cell.row().saturating_add_signed(dy),
            );
            self.world.set_terrain(ring, Terrain::Wall);
        }
    }

    fn structure_energy(&self, structure: StructureId) -> Option<u32> {
        self.world
            .view()
            .structure(structure)
            .map(|snapshot| snapshot.store.amount())
    }
}

fn gatherer() -> Loadout {
    Loadout::new(vec![PartKind::Work, PartKind::Carry, PartKind::Move])
}

fn brawler() -> Loadout {
    Loadout::new(vec![PartKind::Tough, PartKind::Attack, PartKind::Move])
}

fn medic() -> Loadout {
    Loadout::new(vec![PartKind::Heal, PartKind::Move])
}

#[test]
fn full_gatherer_feeds_extensions_before_the_facility() {
    let mut harness = Harness::new(12, 8);
    let spawn = harness
        .world
        .place_structure(Allegiance::Mine, StructureKind::Spawn, CellCoord::new(2, 4));
    let extension = harness.world.place_structure(
        Allegiance::Mine,
        StructureKind::Extension,
        CellCoord::new(2, 2),
    );
    let worker = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(3, 3), gatherer());
    harness.world.set_unit_energy(worker, 50);

    harness.run(|context, view| {
        let unit = view.unit(worker).expect("alive");
        context.run_gatherer(unit);
    });

    assert_eq!(harness.structure_energy(extension), Some(50));
    assert_eq!(harness.structure_energy(spawn), Some(0));
}

#[test]
fn empty_gatherer_harvests_the_adjacent_source() {
    let mut harness = Harness::new(12, 8);
    let _ = harness
        .world
        .place_structure(Allegiance::Mine, StructureKind::Spawn, CellCoord::new(1, 1));
    let _ = harness.world.place_source(CellCoord::new(6, 4), 100);
    let worker = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(5, 4), gatherer());

    harness.run(|context, view| {
        context.run_gatherer(view.unit(worker).expect("alive"));
    });

    let carried = harness
        .world
        .view()
        .unit(worker)
        .map(|unit| unit.store.amount());
    assert_eq!(carried, Some(2));
}

#[test]
fn threatened_gatherer_retreats_toward_home() {
    let mut harness = Harness::new(14, 8);
    let _ = harness
        .world
        .place_structure(Allegiance::Mine, StructureKind::Spawn, CellCoord::new(1, 4));
    let _ = harness.world.place_source(CellCoord::new(9, 4), 100);
    let worker = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(8, 4), gatherer());
    let _ = harness
        .world
        .spawn_unit(Allegiance::Enemy, CellCoord::new(11, 4), brawler());

    harness.run(|context, view| {
        context.run_gatherer(view.unit(worker).expect("alive"));
    });

    let cell = query::unit_cell(&harness.world, worker).expect("alive");
    assert!(cell.column() < 8, "gatherer moved to {cell:?}");
}

#[test]
fn medic_heals_the_most_wounded_friend() {
    let mut harness = Harness::new(12, 12);
    let healer = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(5, 5), medic());
    let scratched = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(6, 5), brawler());
    let mauled = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(5, 6), brawler());
    harness.world.damage_unit(scratched, 50);
    harness.world.damage_unit(mauled, 150);

    harness.run(|context, view| {
        context.run_medic(view.unit(healer).expect("alive"));
    });

    assert_eq!(harness.unit_health(scratched), Some(250));
    assert!(harness.unit_health(mauled).is_some_and(|health| health > 150));
}

#[test]
fn deployed_medic_follows_its_leader() {
    let mut harness = Harness::new(16, 8);
    let leader = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(10, 4), brawler());
    let healer = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(2, 4), medic());
    let _ = harness.squads.form_squad(
        SquadKind::Main,
        &[leader],
        &[healer],
        Composition::new(1, 1),
    );

    harness.run(|context, view| {
        context.run_medic(view.unit(healer).expect("alive"));
    });

    let cell = query::unit_cell(&harness.world, healer).expect("alive");
    assert_eq!(cell.column(), 3, "medic closes in on the leader");
}

#[test]
fn leader_strikes_the_focus_target() {
    let mut harness = Harness::new(12, 12);
    let leader = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(5, 5), brawler());
    let raider = harness
        .world
        .spawn_unit(Allegiance::Enemy, CellCoord::new(6, 5), brawler());
    let hauler = harness
        .world
        .spawn_unit(Allegiance::Enemy, CellCoord::new(4, 5), gatherer());
    let squad = harness
        .squads
        .form_squad(SquadKind::Main, &[leader], &[], Composition::new(1, 0))
        .expect("quota met");
    let view = harness.world.view();
    let focus = harness.squads.designate_target(
        squad,
        view.unit(leader).expect("alive"),
        view.enemy_units(),
        TargetPolicy::Sticky,
        10,
    );
    assert_eq!(focus, Some(raider));

    harness.run(|context, view| {
        context.run_fighter(view.unit(leader).expect("alive"));
    });

    assert_eq!(harness.unit_health(raider), Some(270));
    assert_eq!(harness.unit_health(hauler), Some(300));
}

#[test]
fn straggler_regroups_with_the_leader() {
    let mut harness = Harness::new(16, 6);
    let leader = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(2, 2), brawler());
    let straggler = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(10, 2), brawler());
    let _ = harness.squads.form_squad(
        SquadKind::Main,
        &[leader, straggler],
        &[],
        Composition::new(2, 0),
    );

    harness.run(|context, view| {
        context.run_fighter(view.unit(straggler).expect("alive"));
    });

    let cell = query::unit_cell(&harness.world, straggler).expect("alive");
    assert_eq!(cell.column(), 9, "straggler closes in on the leader");
}

#[test]
fn idle_fighter_breaks_open_a_walled_cache() {
    let mut harness = Harness::new(12, 12);
    let _ = harness
        .world
        .place_structure(Allegiance::Mine, StructureKind::Spawn, CellCoord::new(1, 1));
    let cache = CellCoord::new(6, 6);
    let _ = harness
        .world
        .place_structure(Allegiance::Neutral, StructureKind::Container, cache);
    let mut walls = Vec::new();
    for (dx, dy) in [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)] {
        let cell = CellCoord::new(
            cache.column().saturating_add_signed(dx),
            cache.row().saturating_add_signed(dy),
        );
        walls.push(
            harness
                .world
                .place_structure(Allegiance::Neutral, StructureKind::Wall, cell),
        );
    }
    let fighter = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(4, 4), brawler());

    harness.run(|context, view| {
        context.run_fighter(view.unit(fighter).expect("alive"));
    });

    let view = harness.world.view();
    let nearest_wall = view.structure(walls[0]).expect("still standing");
    assert_eq!(nearest_wall.cell, CellCoord::new(5, 5));
    assert_eq!(nearest_wall.health.missing(), 30);
}

#[test]
fn tower_fires_at_the_enemy_nearest_home() {
    let mut harness = Harness::new(16, 16);
    let _ = harness
        .world
        .place_structure(Allegiance::Mine, StructureKind::Spawn, CellCoord::new(1, 1));
    let tower = harness
        .world
        .place_structure(Allegiance::Mine, StructureKind::Tower, CellCoord::new(5, 5));
    harness.world.set_structure_energy(tower, 50);
    let far = harness
        .world
        .spawn_unit(Allegiance::Enemy, CellCoord::new(9, 9), brawler());
    let near = harness
        .world
        .spawn_unit(Allegiance::Enemy, CellCoord::new(3, 8), brawler());

    harness.run(|context, _| context.run_towers());

    assert_eq!(harness.unit_health(near), Some(150));
    assert_eq!(harness.unit_health(far), Some(300));
    assert_eq!(harness.structure_energy(tower), Some(40));
}

#[test]
fn flank_fighter_heads_for_the_waypoint_first() {
    let mut harness = Harness::new(40, 30);
    let home = CellCoord::new(4, 15);
    let enemy = CellCoord::new(35, 15);
    let _ = harness
        .world
        .place_structure(Allegiance::Mine, StructureKind::Spawn, home);
    let _ = harness
        .world
        .place_structure(Allegiance::Enemy, StructureKind::Spawn, enemy);
    let runner = harness.world.spawn_unit(
        Allegiance::Mine,
        CellCoord::new(6, 15),
        Loadout::new(vec![PartKind::Attack, PartKind::Move]),
    );
    let _ = harness
        .squads
        .form_squad(SquadKind::Flank, &[runner], &[], Composition::new(1, 0));
    let waypoint = harness
        .flank
        .waypoint_for(Some(home), Some(enemy), harness.world.dimensions(), &harness.world)
        .expect("both bases known");

    harness.run(|context, view| {
        context.run_fighter(view.unit(runner).expect("alive"));
    });

    assert_eq!(
        harness.movement.entry(runner).map(|entry| entry.target()),
        Some(TargetKey::Cell(waypoint))
    );
}

#[test]
fn unreachable_focus_gives_way_to_the_enemy_base() {
    let mut harness = Harness::new(20, 10);
    let base_cell = CellCoord::new(16, 5);
    let _ = harness
        .world
        .place_structure(Allegiance::Enemy, StructureKind::Spawn, base_cell);
    let leader = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(3, 5), brawler());
    let entrenched = harness
        .world
        .spawn_unit(Allegiance::Enemy, CellCoord::new(9, 5), brawler());
    harness.wall_in(CellCoord::new(9, 5));
    let squad = harness
        .squads
        .form_squad(SquadKind::Main, &[leader], &[], Composition::new(1, 0))
        .expect("quota met");
    let view = harness.world.view();
    let focus = harness.squads.designate_target(
        squad,
        view.unit(leader).expect("alive"),
        view.enemy_units(),
        TargetPolicy::Sticky,
        10,
    );
    assert_eq!(focus, Some(entrenched));

    harness.run(|context, view| {
        context.run_fighter(view.unit(leader).expect("alive"));
    });

    let cell = query::unit_cell(&harness.world, leader).expect("alive");
    assert_eq!(cell.column(), 4, "fighter heads for the base instead of idling");
    assert_eq!(
        harness.movement.entry(leader).map(|entry| entry.target()),
        Some(TargetKey::Cell(base_cell))
    );
}

#[test]
fn deployed_fighter_without_focus_hits_the_base_on_contact() {
    let mut harness = Harness::new(12, 8);
    let base = harness.world.place_structure(
        Allegiance::Enemy,
        StructureKind::Spawn,
        CellCoord::new(8, 4),
    );
    let fighter = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(7, 4), brawler());
    let _ = harness
        .squads
        .form_squad(SquadKind::Main, &[fighter], &[], Composition::new(1, 0));

    harness.run(|context, view| {
        context.run_fighter(view.unit(fighter).expect("alive"));
    });

    let view = harness.world.view();
    let base = view.structure(base).expect("still standing");
    assert_eq!(base.health.missing(), 30);
}

#[test]
fn medic_falls_back_to_a_reachable_squadmate() {
    let mut harness = Harness::new(20, 8);
    let leader = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(14, 4), brawler());
    harness.wall_in(CellCoord::new(14, 4));
    let mate = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(8, 4), brawler());
    let healer = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(2, 4), medic());
    let _ = harness.squads.form_squad(
        SquadKind::Main,
        &[leader, mate],
        &[healer],
        Composition::new(2, 1),
    );

    harness.run(|context, view| {
        context.run_medic(view.unit(healer).expect("alive"));
    });

    let cell = query::unit_cell(&harness.world, healer).expect("alive");
    assert_eq!(cell.column(), 3, "medic closes in on the reachable mate");
}

#[test]
fn wiped_squad_medic_tags_along_with_another_squad() {
    let mut harness = Harness::new(16, 8);
    let fallen = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(4, 2), brawler());
    let healer = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(2, 4), medic());
    let escort = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(10, 4), brawler());
    let _ = harness.squads.form_squad(
        SquadKind::Main,
        &[fallen],
        &[healer],
        Composition::new(1, 1),
    );
    let _ = harness
        .squads
        .form_squad(SquadKind::Main, &[escort], &[], Composition::new(1, 0));
    harness.world.damage_unit(fallen, 300);
    let _ = harness.squads.retain_live(&harness.world.view().live_units());

    harness.run(|context, view| {
        context.run_medic(view.unit(healer).expect("alive"));
    });

    let cell = query::unit_cell(&harness.world, healer).expect("alive");
    assert_eq!(cell.column(), 3, "medic joins the other squad");
}

#[test]
fn lone_medic_pushes_on_the_enemy_base() {
    let mut harness = Harness::new(16, 8);
    let _ = harness.world.place_structure(
        Allegiance::Enemy,
        StructureKind::Spawn,
        CellCoord::new(13, 4),
    );
    let fallen = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(4, 2), brawler());
    let healer = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(2, 4), medic());
    let _ = harness.squads.form_squad(
        SquadKind::Main,
        &[fallen],
        &[healer],
        Composition::new(1, 1),
    );
    harness.world.damage_unit(fallen, 300);
    let _ = harness.squads.retain_live(&harness.world.view().live_units());

    harness.run(|context, view| {
        context.run_medic(view.unit(healer).expect("alive"));
    });

    let cell = query::unit_cell(&harness.world, healer).expect("alive");
    assert_eq!(cell.column(), 3, "medic advances alone");
}

#[test]
fn medic_at_base_ignores_patients_beyond_heal_radius() {
    let mut harness = Harness::new(16, 8);
    let healer = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(2, 4), medic());
    let distant = harness
        .world
        .spawn_unit(Allegiance::Mine, CellCoord::new(7, 4), brawler());
    harness.world.damage_unit(distant, 100);

    harness.run(|context, view| {
        context.run_medic(view.unit(healer).expect("alive"));
    });

    assert_eq!(query::unit_cell(&harness.world, healer), Some(CellCoord::new(2, 4)));
    assert_eq!(harness.unit_health(distant), Some(200));
}
