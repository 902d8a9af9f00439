//! Stake allocation across a race field
//!
//! Entrants are processed favourite first (odds ascending) against one
//! budget that only ever shrinks. Two formulas are supported:
//!
//! Flat target payout, each entrant sized on its own:
//!     stake = ceil(target / odds / unit) * unit
//!
//! Chasing target profit, each stake covers everything already spent:
//!     stake = ceil((invested + target) / (odds - 1) / unit) * unit
//!
//! Where:
//!     unit = minimum stake increment (100 yen)
//!     invested = sum of stakes placed on shorter-priced entrants
//!
//! The flat method keeps going after a shortfall and marks the row; the
//! chasing method stops at the first entrant it cannot afford and drops the
//! rest of the field.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{validate_budget, validate_odds, validate_target, validate_unit, PlanError};
use crate::models::{Allocation, Entrant, StakePlan, StakeStatus, StakingMethod};

/// Minimum stake increment in yen
pub const DEFAULT_UNIT: i64 = 100;

/// Round an amount up to the next multiple of `unit`
///
/// Fails when the rounded stake does not fit in an `i64`.
///
/// # Examples
/// ```
/// use stakeplan::core::staking::round_up_to_unit;
/// assert_eq!(round_up_to_unit(2777.8, 100).unwrap(), 2800);
/// assert_eq!(round_up_to_unit(2000.0, 100).unwrap(), 2000);
/// assert!(round_up_to_unit(1e30, 100).is_err());
/// ```
pub fn round_up_to_unit(amount: f64, unit: i64) -> Result<i64, PlanError> {
    let units = (amount / unit as f64).ceil();
    if !units.is_finite() || units >= i64::MAX as f64 {
        return Err(stake_overflow(amount));
    }

    (units as i64).checked_mul(unit).ok_or_else(|| stake_overflow(amount))
}

fn stake_overflow(amount: f64) -> PlanError {
    PlanError::Validation(format!("Stake for {:.0} yen is out of range", amount))
}

/// Stake that returns at least `target` gross if the entrant wins
pub fn flat_stake(target: i64, odds: f64, unit: i64) -> Result<i64, PlanError> {
    round_up_to_unit(target as f64 / odds, unit)
}

/// Stake that returns everything invested so far plus `target_profit`
///
/// Returns `Ok(None)` when the odds cannot produce a profit (odds ≤ 1).
pub fn chasing_stake(
    invested: i64,
    target_profit: i64,
    odds: f64,
    unit: i64,
) -> Result<Option<i64>, PlanError> {
    if odds <= 1.0 {
        return Ok(None);
    }

    let owed = invested.checked_add(target_profit).ok_or_else(|| {
        PlanError::Validation(format!(
            "Invested {} plus target {} is out of range",
            invested, target_profit
        ))
    })?;

    round_up_to_unit(owed as f64 / (odds - 1.0), unit).map(Some)
}

/// Gross return of a winning stake, truncated to whole yen
pub fn payout(stake: i64, odds: f64) -> i64 {
    (stake as f64 * odds) as i64
}

/// Stable sort by odds, favourites first
pub fn sort_by_odds(entrants: &[Entrant]) -> Vec<Entrant> {
    let mut sorted = entrants.to_vec();
    sorted.sort_by(|a, b| a.odds.total_cmp(&b.odds));
    sorted
}

/// Running state threaded through the allocation fold
#[derive(Debug, Clone)]
struct Ledger {
    remaining_budget: i64,
    total_invested: i64,
    allocations: Vec<Allocation>,
    excluded: Vec<Entrant>,
    stopped: bool,
}

impl Ledger {
    fn open(budget: i64) -> Self {
        Self {
            remaining_budget: budget,
            total_invested: 0,
            allocations: Vec::new(),
            excluded: Vec::new(),
            stopped: false,
        }
    }

    fn buy(mut self, entrant: Entrant, stake: i64) -> Self {
        self.remaining_budget -= stake;
        self.total_invested += stake;
        let payout = payout(stake, entrant.odds);
        self.allocations.push(Allocation {
            entrant,
            stake,
            payout,
            remaining_budget: self.remaining_budget,
            status: StakeStatus::Purchased,
        });
        self
    }

    fn skip(mut self, entrant: Entrant, status: StakeStatus) -> Self {
        self.allocations.push(Allocation {
            entrant,
            stake: 0,
            payout: 0,
            remaining_budget: self.remaining_budget,
            status,
        });
        self
    }

    fn flat_step(self, entrant: Entrant, target: i64, unit: i64) -> Result<Self, PlanError> {
        let stake = flat_stake(target, entrant.odds, unit)?;

        if stake <= self.remaining_budget {
            Ok(self.buy(entrant, stake))
        } else {
            debug!(
                "{}: stake {} exceeds remaining budget {}",
                entrant.name, stake, self.remaining_budget
            );
            Ok(self.skip(entrant, StakeStatus::OverBudget))
        }
    }

    fn chasing_step(mut self, entrant: Entrant, target: i64, unit: i64) -> Result<Self, PlanError> {
        if self.stopped {
            self.excluded.push(entrant);
            return Ok(self);
        }

        Ok(match chasing_stake(self.total_invested, target, entrant.odds, unit)? {
            None => {
                warn!("{}: odds {} too short to chase", entrant.name, entrant.odds);
                self.skip(entrant, StakeStatus::OddsTooShort)
            }
            Some(stake) if stake > self.remaining_budget => {
                warn!(
                    "Budget exhausted at {} (stake {}, remaining {})",
                    entrant.name, stake, self.remaining_budget
                );
                self.stopped = true;
                self.excluded.push(entrant);
                self
            }
            Some(stake) => self.buy(entrant, stake),
        })
    }
}

/// Stake planner for a single race
///
/// Holds the budget, the target (gross payout for the flat method, net
/// profit for the chasing method), the stake unit and the formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeCalculator {
    pub budget: i64,
    pub target: i64,
    pub unit: i64,
    pub method: StakingMethod,
}

impl StakeCalculator {
    pub fn new(budget: i64, target: i64, unit: i64, method: StakingMethod) -> Self {
        Self {
            budget,
            target,
            unit,
            method,
        }
    }

    /// Default unit with the given budget, target and method
    pub fn with_defaults(budget: i64, target: i64, method: StakingMethod) -> Self {
        Self::new(budget, target, DEFAULT_UNIT, method)
    }

    /// Pasted race card defaults: 3,000 yen budget, 5,000 yen flat payout
    pub fn manual() -> Self {
        Self::with_defaults(3_000, 5_000, StakingMethod::Flat)
    }

    /// Scraped race page defaults: 100,000 yen budget, 5,000 yen chased profit
    pub fn scraped() -> Self {
        Self::with_defaults(100_000, 5_000, StakingMethod::Chasing)
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        validate_budget(self.budget)?;
        validate_target(self.target)?;
        validate_unit(self.unit)?;
        Ok(())
    }

    /// Build the staking plan for a field of entrants
    pub fn plan(&self, entrants: &[Entrant]) -> Result<StakePlan, PlanError> {
        self.validate()?;

        if entrants.is_empty() {
            return Err(PlanError::no_entrants("entrant list is empty"));
        }
        for entrant in entrants {
            validate_odds(entrant.odds)?;
        }

        let (target, unit) = (self.target, self.unit);
        let ledger = sort_by_odds(entrants)
            .into_iter()
            .try_fold(Ledger::open(self.budget), |ledger, entrant| match self.method {
                StakingMethod::Flat => ledger.flat_step(entrant, target, unit),
                StakingMethod::Chasing => ledger.chasing_step(entrant, target, unit),
            })?;

        info!(
            "{} plan: {} purchased, {} invested, {} remaining",
            self.method,
            ledger.allocations.iter().filter(|a| a.purchased()).count(),
            ledger.total_invested,
            ledger.remaining_budget
        );

        Ok(StakePlan {
            method: self.method,
            initial_budget: self.budget,
            target: self.target,
            allocations: ledger.allocations,
            excluded: ledger.excluded,
        })
    }
}

impl Default for StakeCalculator {
    fn default() -> Self {
        Self::manual()
    }
}
