use arena_tactics_core::{CellCoord, Command, CommandError, CommandSink, PathOptions, Pathfinder};
use arena_tactics_world::World;
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use log::warn;
use sha2::{Digest, Sha256};

/// Arena wrapper that fingerprints every command the world accepts.
///
/// Two matches with the same seed and configuration must produce the same
/// fingerprint; any divergence in decisions shows up as a different digest.
pub(crate) struct RecordingArena {
    world: World,
    hasher: Sha256,
    accepted: u64,
    rejected: u64,
}

impl RecordingArena {
    pub(crate) fn new(world: World) -> Self {
        Self {
            world,
            hasher: Sha256::new(),
            accepted: 0,
            rejected: 0,
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn end_tick(&mut self) {
        self.hasher.update(self.world.view().tick().to_le_bytes());
        self.world.end_tick();
    }

    pub(crate) fn accepted(&self) -> u64 {
        self.accepted
    }

    pub(crate) fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Base64 digest of the accepted command stream so far.
    pub(crate) fn fingerprint(&self) -> String {
        STANDARD_NO_PAD.encode(self.hasher.clone().finalize())
    }
}

impl Pathfinder for RecordingArena {
    fn find_path(
        &self,
        from: CellCoord,
        to: CellCoord,
        options: PathOptions,
    ) -> Option<Vec<CellCoord>> {
        self.world.find_path(from, to, options)
    }
}

impl CommandSink for RecordingArena {
    fn submit(&mut self, command: Command) -> Result<(), CommandError> {
        let encoded = bincode::serialize(&command);
        match self.world.submit(command) {
            Ok(()) => {
                self.accepted += 1;
                match encoded {
                    Ok(bytes) => self.hasher.update(bytes),
                    Err(error) => warn!("command left out of the fingerprint: {error}"),
                }
                Ok(())
            }
            Err(error) => {
                self.rejected += 1;
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use arena_tactics_core::{Allegiance, Dimensions, Direction, Loadout, PartKind, UnitId};

    use super::*;

    fn arena_with_runner() -> (RecordingArena, Command) {
        let mut world = World::new(Dimensions::new(8, 8));
        let unit = world.spawn_unit(
            Allegiance::Mine,
            CellCoord::new(1, 1),
            Loadout::new(vec![PartKind::Move]),
        );
        let step = Command::Move {
            unit,
            direction: Direction::South,
        };
        (RecordingArena::new(world), step)
    }

    #[test]
    fn rejected_commands_leave_the_fingerprint_untouched() {
        let (mut arena, _) = arena_with_runner();
        let before = arena.fingerprint();
        let far = Command::Move {
            unit: UnitId::new(999),
            direction: Direction::East,
        };

        assert!(arena.submit(far).is_err());
        assert_eq!(arena.fingerprint(), before);
        assert_eq!((arena.accepted(), arena.rejected()), (0, 1));
    }

    #[test]
    fn accepted_commands_change_the_fingerprint() {
        let (mut arena, step) = arena_with_runner();
        let before = arena.fingerprint();

        assert!(arena.submit(step).is_ok());
        assert_ne!(arena.fingerprint(), before);
        assert_eq!(arena.accepted(), 1);
        assert_eq!(arena.world().view().my_units().count(), 1);
    }
}
