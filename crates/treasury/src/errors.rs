use bazaar_types::{Amount, InvalidPercentage, InvestorId};
use thiserror::Error;

/// Errors raised by treasury operations. Every variant is reported before
/// any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreasuryError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("investor {0} not found")]
    NotFound(InvestorId),

    #[error("arithmetic overflow while computing {0}")]
    CalculationOverflow(&'static str),
}

pub type Result<T> = std::result::Result<T, TreasuryError>;

impl From<InvalidPercentage> for TreasuryError {
    fn from(err: InvalidPercentage) -> Self {
        TreasuryError::Validation(err.to_string())
    }
}

/// Reject negative amounts.
pub(crate) fn ensure_non_negative(what: &str, amount: Amount) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(TreasuryError::Validation(format!(
            "{what} must not be negative, got {amount}"
        )));
    }
    Ok(())
}
