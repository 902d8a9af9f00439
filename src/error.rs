use thiserror::Error;

/// Format hint shown when pasted text yields nothing
pub const MANUAL_FORMAT_HINT: &str =
    "expected one entrant per line as `number rank name odds` \
     (e.g. `1 3 サトノダイヤモンド 2.5`) or `name odds`";

/// Planning errors
#[derive(Debug, Error)]
pub enum PlanError {
    /// Nothing was supplied
    #[error("No input supplied")]
    EmptyInput,

    /// Input was supplied but no entrant could be read from it
    #[error("No entrants found: {hint}")]
    NoEntrants { hint: String },

    /// Invalid budget, target or odds
    #[error("Validation error: {0}")]
    Validation(String),
}

impl PlanError {
    pub fn no_entrants(hint: impl Into<String>) -> Self {
        PlanError::NoEntrants { hint: hint.into() }
    }
}

/// Validation functions
pub fn validate_budget(budget: i64) -> Result<(), PlanError> {
    if budget < 0 {
        return Err(PlanError::Validation(format!(
            "Budget must be non-negative, got {}",
            budget
        )));
    }
    Ok(())
}

pub fn validate_target(target: i64) -> Result<(), PlanError> {
    if target <= 0 {
        return Err(PlanError::Validation(format!(
            "Target must be positive, got {}",
            target
        )));
    }
    Ok(())
}

pub fn validate_unit(unit: i64) -> Result<(), PlanError> {
    if unit <= 0 {
        return Err(PlanError::Validation(format!(
            "Stake unit must be positive, got {}",
            unit
        )));
    }
    Ok(())
}

pub fn validate_odds(odds: f64) -> Result<(), PlanError> {
    if !odds.is_finite() || odds <= 0.0 {
        return Err(PlanError::Validation(format!(
            "Odds must be positive, got {}",
            odds
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_budget() {
        assert!(validate_budget(0).is_ok());
        assert!(validate_budget(3000).is_ok());
        assert!(validate_budget(-1).is_err());
    }

    #[test]
    fn test_validate_target() {
        assert!(validate_target(5000).is_ok());
        assert!(validate_target(0).is_err());
        assert!(validate_target(-500).is_err());
    }

    #[test]
    fn test_validate_unit() {
        assert!(validate_unit(100).is_ok());
        assert!(validate_unit(0).is_err());
    }

    #[test]
    fn test_validate_odds() {
        assert!(validate_odds(1.0).is_ok());
        assert!(validate_odds(145.2).is_ok());
        assert!(validate_odds(0.0).is_err());
        assert!(validate_odds(-2.5).is_err());
        assert!(validate_odds(f64::NAN).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = PlanError::Validation("test error".to_string());
        assert!(err.to_string().contains("Validation error"));

        let err = PlanError::no_entrants(MANUAL_FORMAT_HINT);
        assert!(err.to_string().contains("number rank name odds"));
    }
}
