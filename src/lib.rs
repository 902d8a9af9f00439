//! Stakeplan - race staking planner
//!
//! This library provides:
//! - Race card parsing from pasted text (`number rank name odds` or `name odds`)
//! - Race page scraping with katakana-name / odds heuristics
//! - Flat target-payout and chasing target-profit stake allocation
//! - Yen / odds formatting for result tables
//!
//! # Example
//!
//! ```
//! use stakeplan::core::staking::StakeCalculator;
//! use stakeplan::data::EntryParser;
//!
//! let entrants = EntryParser::new()
//!     .parse_text("1 3 Alpha 2.5\n7 1 Beta 1.8")
//!     .unwrap();
//!
//! let plan = StakeCalculator::manual().plan(&entrants).unwrap();
//! assert_eq!(plan.total_invested(), 2800);
//! ```

pub mod core;
pub mod data;
pub mod error;
pub mod models;
pub mod report;

#[cfg(feature = "scraper")]
pub mod scraper;

// Re-export commonly used types
pub use crate::core::staking::StakeCalculator;
pub use data::EntryParser;
pub use error::PlanError;
pub use models::{Allocation, Entrant, StakePlan, StakeStatus, StakingMethod};
