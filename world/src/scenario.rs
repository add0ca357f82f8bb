//! Seeded skirmish layouts used by the runner and integration tests.

use arena_tactics_core::{Allegiance, CellCoord, Dimensions, Loadout, PartKind, StructureKind};
use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};

use super::{Terrain, World};

const SKIRMISH_COLUMNS: u32 = 48;
const SKIRMISH_ROWS: u32 = 32;
const RIDGE_COLUMN: u32 = 24;
const SWAMP_PATCHES: usize = 10;
const STARTING_ENERGY: u32 = 1_000;
const CONTAINER_ENERGY: u32 = 600;

/// Landmarks of a generated skirmish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkirmishLayout {
    /// Cell of this agent's production facility.
    pub home: CellCoord,
    /// Cell of the opponent's production facility.
    pub enemy: CellCoord,
}

/// Generates a two-sided skirmish on a fixed-size map.
///
/// The map is split by a rock ridge with one gap north and one gap south of
/// the centre line; the seed picks which gap is narrow, scatters swamp
/// patches, and positions the defenders around the enemy base.
#[must_use]
pub fn skirmish(seed: u64) -> (World, SkirmishLayout) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let dimensions = Dimensions::new(SKIRMISH_COLUMNS, SKIRMISH_ROWS);
    let mut world = World::new(dimensions);
    let layout = SkirmishLayout {
        home: CellCoord::new(4, SKIRMISH_ROWS / 2),
        enemy: CellCoord::new(SKIRMISH_COLUMNS - 5, SKIRMISH_ROWS / 2),
    };

    carve_ridge(&mut world, &mut rng);
    scatter_swamps(&mut world, &mut rng, layout);

    let spawn = world.place_structure(Allegiance::Mine, StructureKind::Spawn, layout.home);
    world.set_structure_energy(spawn, STARTING_ENERGY);
    for offset_row in [layout.home.row() - 2, layout.home.row() + 2] {
        let extension = world.place_structure(
            Allegiance::Mine,
            StructureKind::Extension,
            CellCoord::new(layout.home.column(), offset_row),
        );
        world.set_structure_energy(extension, 50);
    }
    let _ = world.place_structure(Allegiance::Enemy, StructureKind::Spawn, layout.enemy);

    for cell in [CellCoord::new(9, 8), CellCoord::new(9, 24)] {
        let container = world.place_structure(Allegiance::Neutral, StructureKind::Container, cell);
        world.set_structure_energy(container, CONTAINER_ENERGY);
    }
    let _ = world.place_source(CellCoord::new(2, 4), 3_000);

    // Walled-in cache that an idle fighter can break open.
    let cache = CellCoord::new(12, 28);
    let container = world.place_structure(Allegiance::Neutral, StructureKind::Container, cache);
    world.set_structure_energy(container, CONTAINER_ENERGY);
    for cell in ring(cache) {
        let _ = world.place_structure(Allegiance::Neutral, StructureKind::Wall, cell);
    }

    let guard = Loadout::new(vec![PartKind::Tough, PartKind::Attack, PartKind::Move]);
    for row_offset in [0_u32, 3, 6] {
        let row = layout.enemy.row() - 3 + row_offset;
        let column = layout.enemy.column() - rng.gen_range(2..5);
        let _ = world.spawn_unit(Allegiance::Enemy, CellCoord::new(column, row), guard.clone());
    }

    (world, layout)
}

fn carve_ridge(world: &mut World, rng: &mut ChaCha8Rng) {
    let north_gap = rng.gen_range(4..8);
    let south_gap = rng.gen_range(SKIRMISH_ROWS - 8..SKIRMISH_ROWS - 4);
    let wide_north = rng.gen_bool(0.5);
    for row in 0..SKIRMISH_ROWS {
        let in_north_gap = row >= north_gap && row < north_gap + if wide_north { 4 } else { 2 };
        let in_south_gap = row >= south_gap && row < south_gap + if wide_north { 2 } else { 4 };
        if !in_north_gap && !in_south_gap {
            world.set_terrain(CellCoord::new(RIDGE_COLUMN, row), Terrain::Wall);
        }
    }
}

fn scatter_swamps(world: &mut World, rng: &mut ChaCha8Rng, layout: SkirmishLayout) {
    for _ in 0..SWAMP_PATCHES {
        let column = rng.gen_range(8..SKIRMISH_COLUMNS - 8);
        let row = rng.gen_range(1..SKIRMISH_ROWS - 1);
        let center = CellCoord::new(column, row);
        if column == RIDGE_COLUMN
            || center.range_to(layout.home) < 6
            || center.range_to(layout.enemy) < 6
        {
            continue;
        }
        world.set_terrain(center, Terrain::Swamp);
        for cell in ring(center) {
            if cell.column() != RIDGE_COLUMN && rng.gen_bool(0.5) {
                world.set_terrain(cell, Terrain::Swamp);
            }
        }
    }
}

fn ring(center: CellCoord) -> impl Iterator<Item = CellCoord> {
    arena_tactics_core::Direction::ALL
        .into_iter()
        .filter_map(move |direction| center.step(direction))
}
