#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick bookkeeping that purges dead units from every core-owned table.
//!
//! The tracker runs before any other system reads state. It derives the set of
//! living units from the tick's authoritative [`ArenaView`] and asks every
//! [`RosterBound`] table to drop entries referencing anyone else, so later
//! systems never look up a stale identifier.

use arena_tactics_core::{ArenaView, LiveUnits, RosterBound};
use log::debug;

/// Outcome of a pruning pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Units alive at the start of the tick.
    pub live: usize,
    /// Entries removed across all tables.
    pub removed: usize,
}

/// Lifecycle tracker that remembers the previous pass for diagnostics.
#[derive(Debug, Default)]
pub struct Lifecycle {
    last_report: PruneReport,
}

impl Lifecycle {
    /// Creates a tracker with an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prunes every table against the living roster of `view`.
    pub fn prune(&mut self, view: &ArenaView, tables: &mut [&mut dyn RosterBound]) -> PruneReport {
        let live = view.live_units();
        let report = prune_against(&live, tables);
        if report.removed > 0 {
            debug!(
                "tick {}: pruned {} stale entries ({} units alive)",
                view.tick(),
                report.removed,
                report.live
            );
        }
        self.last_report = report;
        report
    }

    /// Report produced by the most recent pass.
    #[must_use]
    pub const fn last_report(&self) -> PruneReport {
        self.last_report
    }
}

/// Prunes every table against an explicit live set.
pub fn prune_against(live: &LiveUnits, tables: &mut [&mut dyn RosterBound]) -> PruneReport {
    let removed: usize = tables.iter_mut().map(|table| table.retain_live(live)).sum();
    PruneReport {
        live: live.len(),
        removed,
    }
}
