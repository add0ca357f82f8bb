#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! One-shot flanking waypoint selection and per-unit stage tracking.
//!
//! The planner asks the [`Pathfinder`] for the base-to-base route once,
//! looks at which lateral half of the map its midpoint lies in, and fixes a
//! waypoint in the opposite half on the opponent's side of the map. Flanking
//! units first head for the waypoint and then for the enemy base.

use std::collections::BTreeSet;

use arena_tactics_core::{
    CellCoord, Dimensions, LiveUnits, PathOptions, Pathfinder, RosterBound, UnitId,
    UnitSnapshot,
};
use log::info;
use serde::Deserialize;

/// Configuration parameters of the flanking planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Distance at which a unit counts as having reached the waypoint.
    pub reach_radius: u32,
    /// Distance kept between the waypoint and the map edge.
    pub edge_margin: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reach_radius: 3,
            edge_margin: 8,
        }
    }
}

/// Leg of the flanking route a unit is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlankStage {
    /// Heading for the waypoint.
    ToWaypoint(CellCoord),
    /// Waypoint reached or unavailable; heading for the enemy base.
    ToBase,
}

/// Flanking planner holding the match-wide waypoint.
#[derive(Debug, Default)]
pub struct FlankPlanner {
    config: Config,
    waypoint: Option<CellCoord>,
    reached: BTreeSet<UnitId>,
}

impl FlankPlanner {
    /// Creates a planner without a waypoint.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            waypoint: None,
            reached: BTreeSet::new(),
        }
    }

    /// Waypoint fixed for the match, if computed.
    #[must_use]
    pub const fn waypoint(&self) -> Option<CellCoord> {
        self.waypoint
    }

    /// Returns the waypoint, computing it on first use.
    ///
    /// Nothing is cached while either base position is unknown, so a later
    /// call can still compute it. Once set the waypoint never changes.
    pub fn waypoint_for<P>(
        &mut self,
        home: Option<CellCoord>,
        enemy: Option<CellCoord>,
        dimensions: Dimensions,
        pathfinder: &P,
    ) -> Option<CellCoord>
    where
        P: Pathfinder + ?Sized,
    {
        if self.waypoint.is_some() {
            return self.waypoint;
        }
        let (home, enemy) = (home?, enemy?);

        let midpoint = pathfinder
            .find_path(home, enemy, PathOptions::ignoring_units())
            .and_then(|steps| steps.get(steps.len() / 2).copied())
            .unwrap_or_else(|| straight_midpoint(home, enemy));
        let waypoint = opposite_flank(
            home,
            enemy,
            midpoint,
            dimensions,
            self.config.edge_margin,
        );
        info!(
            "flank waypoint fixed at ({}, {}); direct route passes ({}, {})",
            waypoint.column(),
            waypoint.row(),
            midpoint.column(),
            midpoint.row()
        );
        self.waypoint = Some(waypoint);
        self.waypoint
    }

    /// Stage of the route the unit should follow this tick.
    ///
    /// A unit switches to [`FlankStage::ToBase`] once it comes within the
    /// reach radius of the waypoint and stays there.
    pub fn stage(&mut self, unit: &UnitSnapshot) -> FlankStage {
        let Some(waypoint) = self.waypoint else {
            return FlankStage::ToBase;
        };
        if self.reached.contains(&unit.id) {
            return FlankStage::ToBase;
        }
        if unit.cell.range_to(waypoint) <= self.config.reach_radius {
            let _ = self.reached.insert(unit.id);
            return FlankStage::ToBase;
        }
        FlankStage::ToWaypoint(waypoint)
    }

    /// Sends the unit straight to the base, e.g. when the waypoint is
    /// unreachable from where it stands.
    pub fn skip_waypoint(&mut self, unit: UnitId) {
        let _ = self.reached.insert(unit);
    }

    /// Reports whether the unit already passed the waypoint.
    #[must_use]
    pub fn has_reached(&self, unit: UnitId) -> bool {
        self.reached.contains(&unit)
    }
}

impl RosterBound for FlankPlanner {
    fn retain_live(&mut self, live: &LiveUnits) -> usize {
        let before = self.reached.len();
        self.reached.retain(|unit| live.contains(*unit));
        before - self.reached.len()
    }
}

fn straight_midpoint(home: CellCoord, enemy: CellCoord) -> CellCoord {
    CellCoord::new(
        (home.column() + enemy.column()) / 2,
        (home.row() + enemy.row()) / 2,
    )
}

/// Picks the waypoint on the lateral half not used by the direct route.
///
/// Bases separated mostly along columns have a north/south lateral axis;
/// bases separated mostly along rows have a west/east one.
fn opposite_flank(
    home: CellCoord,
    enemy: CellCoord,
    midpoint: CellCoord,
    dimensions: Dimensions,
    margin: u32,
) -> CellCoord {
    let horizontal = home.column().abs_diff(enemy.column()) >= home.row().abs_diff(enemy.row());
    let center = dimensions.center();
    if horizontal {
        let row = if midpoint.row() < center.row() {
            far_edge(dimensions.rows(), margin)
        } else {
            near_edge(dimensions.rows(), margin)
        };
        let column = if enemy.column() >= center.column() {
            far_edge(dimensions.columns(), margin)
        } else {
            near_edge(dimensions.columns(), margin)
        };
        CellCoord::new(column, row)
    } else {
        let column = if midpoint.column() < center.column() {
            far_edge(dimensions.columns(), margin)
        } else {
            near_edge(dimensions.columns(), margin)
        };
        let row = if enemy.row() >= center.row() {
            far_edge(dimensions.rows(), margin)
        } else {
            near_edge(dimensions.rows(), margin)
        };
        CellCoord::new(column, row)
    }
}

fn near_edge(extent: u32, margin: u32) -> u32 {
    margin.min(extent.saturating_sub(1))
}

fn far_edge(extent: u32, margin: u32) -> u32 {
    extent.saturating_sub(1).saturating_sub(margin)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use arena_tactics_core::{Allegiance, Health, Loadout, PartKind, Store};

    use super::*;

    /// Returns a canned route that bends through `via`.
    struct Detour {
        via: Option<CellCoord>,
        calls: Cell<u32>,
    }

    impl Detour {
        fn through(via: CellCoord) -> Self {
            Self {
                via: Some(via),
                calls: Cell::new(0),
            }
        }

        fn unreachable() -> Self {
            Self {
                via: None,
                calls: Cell::new(0),
            }
        }
    }

    impl Pathfinder for Detour {
        fn find_path(
            &self,
            _from: CellCoord,
            to: CellCoord,
            _options: PathOptions,
        ) -> Option<Vec<CellCoord>> {
            self.calls.set(self.calls.get() + 1);
            let via = self.via?;
            Some(vec![via, via, to])
        }
    }

    fn unit_at(cell: CellCoord) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(3),
            cell,
            health: Health::full(100),
            loadout: Loadout::new(vec![PartKind::Attack, PartKind::Move]),
            allegiance: Allegiance::Mine,
            store: Store::default(),
        }
    }

    const DIMENSIONS: Dimensions = Dimensions::new(40, 30);
    const HOME: CellCoord = CellCoord::new(4, 15);
    const ENEMY: CellCoord = CellCoord::new(35, 15);

    #[test]
    fn northern_route_yields_a_southern_waypoint_near_the_enemy_edge() {
        let mut planner = FlankPlanner::default();
        let north = Detour::through(CellCoord::new(20, 4));

        let waypoint = planner.waypoint_for(Some(HOME), Some(ENEMY), DIMENSIONS, &north);

        assert_eq!(waypoint, Some(CellCoord::new(31, 21)));
    }

    #[test]
    fn waypoint_is_never_recomputed() {
        let mut planner = FlankPlanner::default();
        let north = Detour::through(CellCoord::new(20, 4));
        let south = Detour::through(CellCoord::new(20, 26));

        let first = planner.waypoint_for(Some(HOME), Some(ENEMY), DIMENSIONS, &north);
        let second = planner.waypoint_for(
            Some(CellCoord::new(35, 15)),
            Some(CellCoord::new(4, 15)),
            DIMENSIONS,
            &south,
        );

        assert_eq!(first, second);
        assert_eq!(south.calls.get(), 0);
    }

    #[test]
    fn missing_base_defers_the_computation() {
        let mut planner = FlankPlanner::default();
        let south = Detour::through(CellCoord::new(20, 26));

        assert_eq!(planner.waypoint_for(Some(HOME), None, DIMENSIONS, &south), None);
        assert_eq!(south.calls.get(), 0);
        assert_eq!(
            planner.waypoint_for(Some(HOME), Some(ENEMY), DIMENSIONS, &south),
            Some(CellCoord::new(31, 8))
        );
    }

    #[test]
    fn unreachable_enemy_falls_back_to_the_straight_midpoint() {
        let mut planner = FlankPlanner::default();
        let home = CellCoord::new(4, 20);
        let enemy = CellCoord::new(35, 22);

        let blocked = Detour::unreachable();

        let waypoint = planner.waypoint_for(Some(home), Some(enemy), DIMENSIONS, &blocked);

        // Straight midpoint (19, 21) lies south of the centre line.
        assert_eq!(waypoint, Some(CellCoord::new(31, 8)));
    }

    #[test]
    fn vertically_separated_bases_flank_east_or_west() {
        let mut planner = FlankPlanner::default();
        let home = CellCoord::new(20, 2);
        let enemy = CellCoord::new(20, 27);
        let west = Detour::through(CellCoord::new(6, 15));

        let waypoint = planner.waypoint_for(Some(home), Some(enemy), DIMENSIONS, &west);

        assert_eq!(waypoint, Some(CellCoord::new(31, 21)));
    }

    #[test]
    fn units_switch_to_the_base_once_within_reach() {
        let mut planner = FlankPlanner::default();
        let waypoint = planner
            .waypoint_for(
                Some(HOME),
                Some(ENEMY),
                DIMENSIONS,
                &Detour::through(CellCoord::new(20, 4)),
            )
            .expect("bases known");

        assert_eq!(
            planner.stage(&unit_at(CellCoord::new(10, 20))),
            FlankStage::ToWaypoint(waypoint)
        );
        assert_eq!(
            planner.stage(&unit_at(CellCoord::new(28, 20))),
            FlankStage::ToBase
        );
        // Walking away from the waypoint again does not reset the stage.
        assert_eq!(
            planner.stage(&unit_at(CellCoord::new(10, 20))),
            FlankStage::ToBase
        );
    }

    #[test]
    fn no_waypoint_means_straight_to_base() {
        let mut planner = FlankPlanner::default();
        assert_eq!(
            planner.stage(&unit_at(CellCoord::new(0, 0))),
            FlankStage::ToBase
        );
    }

    #[test]
    fn pruning_forgets_dead_units() {
        let mut planner = FlankPlanner::default();
        planner.skip_waypoint(UnitId::new(3));
        planner.skip_waypoint(UnitId::new(4));

        let removed = planner.retain_live(&LiveUnits::from_ids([UnitId::new(4)]));

        assert_eq!(removed, 1);
        assert!(!planner.has_reached(UnitId::new(3)));
        assert!(planner.has_reached(UnitId::new(4)));
    }
}
