//! Core business logic modules

pub mod staking;

// Re-export commonly used types
pub use staking::{chasing_stake, flat_stake, round_up_to_unit, sort_by_odds, StakeCalculator};
