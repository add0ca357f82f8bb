//! Per-kind structure statistics.

use arena_tactics_core::StructureKind;

/// Health a freshly finished structure starts with.
pub(crate) const fn base_health(kind: StructureKind) -> u32 {
    match kind {
        StructureKind::Spawn => 3_000,
        StructureKind::Extension => 100,
        StructureKind::Container => 250,
        StructureKind::Tower => 3_000,
        StructureKind::Wall => 1_000,
    }
}

/// Energy capacity of the structure's store.
pub(crate) const fn store_capacity(kind: StructureKind) -> u32 {
    match kind {
        StructureKind::Spawn => 1_000,
        StructureKind::Extension => 100,
        StructureKind::Container => 2_000,
        StructureKind::Tower => 50,
        StructureKind::Wall => 0,
    }
}
