//! Display rows for a staking plan
//!
//! Amounts are formatted as yen with thousands separators, odds with a
//! 倍 suffix, the way race cards print them.

use crate::models::{StakePlan, StakeStatus, StakingMethod};

/// Format an amount as `12,345円`
pub fn format_yen(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0 { "-" } else { "" };
    format!("{}{}円", sign, grouped)
}

/// Format odds as `2.5倍`, keeping one decimal for whole numbers
pub fn format_odds(odds: f64) -> String {
    if odds.fract() == 0.0 {
        format!("{:.1}倍", odds)
    } else {
        format!("{}倍", odds)
    }
}

/// Status marker shown in the detail table
pub fn status_label(status: StakeStatus) -> &'static str {
    match status {
        StakeStatus::Purchased => "購入",
        StakeStatus::OverBudget => "予算不足",
        StakeStatus::OddsTooShort => "対象外",
    }
}

pub fn method_label(method: StakingMethod) -> &'static str {
    match method {
        StakingMethod::Flat => "目標払戻 (flat)",
        StakingMethod::Chasing => "目標利益 (chasing)",
    }
}

/// One line of the purchase list
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRow {
    pub number: String,
    pub popularity: String,
    pub name: String,
    pub odds: String,
    pub stake: String,
    pub payout: String,
}

/// One line of the full detail table
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
    pub status: &'static str,
    pub number: String,
    pub popularity: String,
    pub name: String,
    pub odds: String,
    pub stake: String,
    pub remaining_budget: String,
}

/// Budget totals for a plan
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub initial_budget: String,
    pub remaining_budget: String,
    pub total_invested: String,
    /// Chasing method only: the entrant where buying stopped
    pub stopped_at: Option<String>,
}

pub fn purchase_rows(plan: &StakePlan) -> Vec<PurchaseRow> {
    plan.purchases()
        .map(|a| PurchaseRow {
            number: a.entrant.number.clone(),
            popularity: a.entrant.popularity.clone(),
            name: a.entrant.name.clone(),
            odds: format_odds(a.entrant.odds),
            stake: format_yen(a.stake),
            payout: format_yen(a.payout),
        })
        .collect()
}

pub fn detail_rows(plan: &StakePlan) -> Vec<DetailRow> {
    plan.allocations
        .iter()
        .map(|a| DetailRow {
            status: status_label(a.status),
            number: a.entrant.number.clone(),
            popularity: a.entrant.popularity.clone(),
            name: a.entrant.name.clone(),
            odds: format_odds(a.entrant.odds),
            stake: format_yen(a.stake),
            remaining_budget: format_yen(a.remaining_budget),
        })
        .collect()
}

pub fn summary(plan: &StakePlan) -> Summary {
    Summary {
        initial_budget: format_yen(plan.initial_budget),
        remaining_budget: format_yen(plan.remaining_budget()),
        total_invested: format_yen(plan.total_invested()),
        stopped_at: plan.first_excluded().map(|e| e.name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::staking::StakeCalculator;
    use crate::models::Entrant;

    #[test]
    fn test_format_yen() {
        assert_eq!(format_yen(0), "0円");
        assert_eq!(format_yen(200), "200円");
        assert_eq!(format_yen(2800), "2,800円");
        assert_eq!(format_yen(100_000), "100,000円");
        assert_eq!(format_yen(1_234_567), "1,234,567円");
        assert_eq!(format_yen(-2800), "-2,800円");
    }

    #[test]
    fn test_format_odds() {
        assert_eq!(format_odds(2.5), "2.5倍");
        assert_eq!(format_odds(2.0), "2.0倍");
        assert_eq!(format_odds(145.3), "145.3倍");
    }

    #[test]
    fn test_flat_plan_rows() {
        let entrants = vec![
            Entrant::new("1", "3", "Alpha", 2.5),
            Entrant::new("7", "1", "Beta", 1.8),
        ];
        let plan = StakeCalculator::manual().plan(&entrants).unwrap();

        let purchases = purchase_rows(&plan);
        assert_eq!(
            purchases,
            vec![PurchaseRow {
                number: "7".to_string(),
                popularity: "1".to_string(),
                name: "Beta".to_string(),
                odds: "1.8倍".to_string(),
                stake: "2,800円".to_string(),
                payout: "5,040円".to_string(),
            }]
        );

        let details = detail_rows(&plan);
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].status, "購入");
        assert_eq!(details[1].status, "予算不足");
        assert_eq!(details[1].stake, "0円");
        assert_eq!(details[1].remaining_budget, "200円");

        let totals = summary(&plan);
        assert_eq!(totals.initial_budget, "3,000円");
        assert_eq!(totals.remaining_budget, "200円");
        assert_eq!(totals.total_invested, "2,800円");
        assert_eq!(totals.stopped_at, None);
    }

    #[test]
    fn test_chasing_summary_names_cutoff() {
        let entrants = vec![
            Entrant::unnumbered("アルファ", 2.0),
            Entrant::unnumbered("ベータ", 2.0),
        ];
        let calc = StakeCalculator::with_defaults(6000, 5000, StakingMethod::Chasing);
        let plan = calc.plan(&entrants).unwrap();

        assert_eq!(summary(&plan).stopped_at.as_deref(), Some("ベータ"));
        assert_eq!(detail_rows(&plan).len(), 1);
    }
}
