#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Production and construction collaborators driven by the commander.
//!
//! [`Production`] keeps the unit roster topped up from a priority list of
//! archetypes. [`Construction`] requests defensive structures around the home
//! base once the first wave has left.

mod construction;
mod production;

pub use construction::{Config as ConstructionConfig, Construction};
pub use production::{Archetype, Config as ProductionConfig, Production};
