//! Platform fee configuration

use crate::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default share of collected revenue kept as platform fee (percent).
pub const DEFAULT_PLATFORM_FEE_PERCENTAGE: u32 = 10;
/// Default share of the platform fee earmarked for investors (percent).
pub const DEFAULT_INVESTOR_DIVIDEND_PERCENTAGE: u32 = 30;

/// Percentage outside the inclusive `0..=100` range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} must be within 0..=100, got {value}")]
pub struct InvalidPercentage {
    pub field: &'static str,
    pub value: Decimal,
}

/// Check a percentage field.
pub fn validate_percentage(field: &'static str, value: Decimal) -> Result<(), InvalidPercentage> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(InvalidPercentage { field, value });
    }
    Ok(())
}

/// Platform-wide fee and dividend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSettings {
    pub platform_fee_percentage: Decimal,
    pub investor_dividend_percentage: Decimal,
    #[serde(default)]
    pub terms_and_conditions: String,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            platform_fee_percentage: Decimal::from(DEFAULT_PLATFORM_FEE_PERCENTAGE),
            investor_dividend_percentage: Decimal::from(DEFAULT_INVESTOR_DIVIDEND_PERCENTAGE),
            terms_and_conditions: String::new(),
        }
    }
}

impl SystemSettings {
    /// Validate both percentages.
    pub fn validate(&self) -> Result<(), InvalidPercentage> {
        validate_percentage("platform_fee_percentage", self.platform_fee_percentage)?;
        validate_percentage(
            "investor_dividend_percentage",
            self.investor_dividend_percentage,
        )?;
        Ok(())
    }

    /// Platform fee as a fraction (10% -> 0.1).
    pub fn platform_fee_rate(&self) -> Decimal {
        self.platform_fee_percentage / Decimal::ONE_HUNDRED
    }

    /// Investor dividend share of the fee pool as a fraction (30% -> 0.3).
    pub fn investor_dividend_rate(&self) -> Decimal {
        self.investor_dividend_percentage / Decimal::ONE_HUNDRED
    }

    /// Split collected revenue with the current rates.
    ///
    /// Returns `None` on arithmetic overflow. The caller is expected to
    /// reject negative revenue before calling this.
    pub fn split_revenue(&self, collected: Amount) -> Option<RevenueSplit> {
        let platform_fee = collected.checked_mul(self.platform_fee_rate())?;
        let investor_pool = platform_fee.checked_mul(self.investor_dividend_rate())?;
        Some(RevenueSplit {
            collected,
            platform_fee,
            investor_pool,
            platform_retained: platform_fee.checked_sub(investor_pool)?,
            seller_proceeds: collected.checked_sub(platform_fee)?,
        })
    }
}

/// How a collected revenue amount breaks down under the current settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSplit {
    pub collected: Amount,
    /// `collected × platform fee rate`
    pub platform_fee: Amount,
    /// Part of the platform fee handed to the pool distribution
    pub investor_pool: Amount,
    pub platform_retained: Amount,
    pub seller_proceeds: Amount,
}
