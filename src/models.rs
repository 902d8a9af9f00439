use serde::{Deserialize, Serialize};

/// Stand-in for an entrant number or popularity rank that the input did not carry
pub const PLACEHOLDER: &str = "-";

/// A single race entrant with its published win odds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrant {
    pub number: String,
    pub popularity: String,
    pub name: String,
    pub odds: f64,
}

impl Entrant {
    /// Entrant with both number and popularity rank known
    pub fn new(
        number: impl Into<String>,
        popularity: impl Into<String>,
        name: impl Into<String>,
        odds: f64,
    ) -> Self {
        Self {
            number: number.into(),
            popularity: popularity.into(),
            name: name.into(),
            odds,
        }
    }

    /// Entrant known only by name and odds
    pub fn unnumbered(name: impl Into<String>, odds: f64) -> Self {
        Self::new(PLACEHOLDER, PLACEHOLDER, name, odds)
    }
}

/// Staking formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakingMethod {
    /// Same gross payout whichever entrant wins
    Flat,
    /// Each stake recovers everything spent so far plus the target profit
    Chasing,
}

impl std::fmt::Display for StakingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StakingMethod::Flat => write!(f, "flat"),
            StakingMethod::Chasing => write!(f, "chasing"),
        }
    }
}

/// Outcome of sizing one entrant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeStatus {
    Purchased,
    /// Stake did not fit into the remaining budget
    OverBudget,
    /// Odds of 1.0 or less cannot return a profit
    OddsTooShort,
}

/// Stake decision for one entrant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub entrant: Entrant,
    pub stake: i64,
    pub payout: i64,
    pub remaining_budget: i64,
    pub status: StakeStatus,
}

impl Allocation {
    pub fn purchased(&self) -> bool {
        self.status == StakeStatus::Purchased
    }
}

/// Full staking plan for one race
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakePlan {
    pub method: StakingMethod,
    pub initial_budget: i64,
    pub target: i64,
    /// Every processed entrant, odds ascending
    pub allocations: Vec<Allocation>,
    /// Entrants dropped once the chasing method ran out of budget
    pub excluded: Vec<Entrant>,
}

impl StakePlan {
    /// Rows that were actually bought
    pub fn purchases(&self) -> impl Iterator<Item = &Allocation> {
        self.allocations.iter().filter(|a| a.purchased())
    }

    pub fn total_invested(&self) -> i64 {
        self.purchases().map(|a| a.stake).sum()
    }

    pub fn remaining_budget(&self) -> i64 {
        self.initial_budget - self.total_invested()
    }

    /// Entrant at which the chasing method stopped
    pub fn first_excluded(&self) -> Option<&Entrant> {
        self.excluded.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, stake: i64, status: StakeStatus) -> Allocation {
        Allocation {
            entrant: Entrant::unnumbered(name, 2.0),
            stake,
            payout: stake * 2,
            remaining_budget: 0,
            status,
        }
    }

    #[test]
    fn test_unnumbered_uses_placeholder() {
        let e = Entrant::unnumbered("アルファ", 3.2);
        assert_eq!(e.number, PLACEHOLDER);
        assert_eq!(e.popularity, PLACEHOLDER);
    }

    #[test]
    fn test_plan_totals_only_count_purchases() {
        let plan = StakePlan {
            method: StakingMethod::Flat,
            initial_budget: 3000,
            target: 5000,
            allocations: vec![
                row("A", 2800, StakeStatus::Purchased),
                row("B", 0, StakeStatus::OverBudget),
            ],
            excluded: Vec::new(),
        };

        assert_eq!(plan.purchases().count(), 1);
        assert_eq!(plan.total_invested(), 2800);
        assert_eq!(plan.remaining_budget(), 200);
        assert!(plan.first_excluded().is_none());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&StakeStatus::OverBudget).unwrap();
        assert_eq!(json, "\"over_budget\"");
        let json = serde_json::to_string(&StakingMethod::Chasing).unwrap();
        assert_eq!(json, "\"chasing\"");
    }
}
