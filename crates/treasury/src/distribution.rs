//! Share-weighted pool distribution
//!
//! Every investor receives `amount × shares / total_shares`, rounded toward
//! zero. The denominator is the ledger's fixed total, not the allocated sum,
//! so the fraction owned by unallocated shares stays with the treasury and is
//! reported as `retained` together with the rounding dust. Payouts never sum
//! past the pool, so `retained` is never negative.
//!
//! All deltas and resulting balances are computed before anything is
//! written; an overflow aborts the distribution with the ledger untouched.

use crate::errors::{ensure_non_negative, Result, TreasuryError};
use crate::investor_ledger::InvestorLedger;
use bazaar_types::{Amount, InvestorId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Single investor's slice of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorPayout {
    pub investor_id: InvestorId,
    pub shares: u64,
    pub amount: Amount,
}

/// Outcome of one pool distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionResult {
    /// Pool amount handed in
    pub amount: Amount,
    pub total_shares: u64,
    pub allocated_shares: u64,
    /// Sum of all payouts
    pub total_distributed: Amount,
    /// `amount - total_distributed`: unallocated fraction plus rounding dust
    pub retained: Amount,
    /// Per-investor payouts, in ledger order
    pub payouts: Vec<InvestorPayout>,
}

/// Largest mantissa a `Decimal` can hold (2^96 - 1).
const MAX_MANTISSA: u128 = (1 << 96) - 1;

/// Deepest scale a `Decimal` supports.
const MAX_SCALE: u32 = 28;

/// `floor(n × mul / div)`, splitting `n` by `div` first so the intermediate
/// product stays within `u128` for any `u64` weights.
fn mul_div_floor(n: u128, mul: u128, div: u128) -> Option<u128> {
    if div == 0 {
        return None;
    }
    let whole = (n / div).checked_mul(mul)?;
    let part = (n % div).checked_mul(mul)? / div;
    whole.checked_add(part)
}

/// `amount × shares / total_shares`, rounded toward zero.
///
/// The quotient is taken at the deepest scale at which `amount` itself still
/// fits a `Decimal`. Every share of the same pool therefore lands on one
/// common scale, is never larger than its exact value, and the shares of one
/// pool add up without rounding.
pub fn pool_share(amount: Amount, shares: u64, total_shares: u64) -> Result<Amount> {
    if total_shares == 0 {
        return Err(TreasuryError::Validation(
            "total shares must be greater than zero".into(),
        ));
    }
    if amount.is_zero() || shares == 0 {
        return Ok(Amount::ZERO);
    }

    let mantissa = u128::try_from(amount.mantissa()).map_err(|_| {
        TreasuryError::Validation(format!("pool amount must not be negative, got {amount}"))
    })?;

    let scale = amount.scale();
    let mut extra = MAX_SCALE - scale;
    let scaled = loop {
        match 10u128
            .checked_pow(extra)
            .and_then(|factor| mantissa.checked_mul(factor))
        {
            Some(scaled) if scaled <= MAX_MANTISSA => break scaled,
            _ if extra == 0 => return Err(TreasuryError::CalculationOverflow("pool share")),
            _ => extra -= 1,
        }
    };

    // shares <= total_shares keeps the quotient at or below `scaled`
    let quotient = mul_div_floor(scaled, u128::from(shares), u128::from(total_shares))
        .and_then(|quotient| i128::try_from(quotient).ok())
        .ok_or(TreasuryError::CalculationOverflow("pool share"))?;

    Decimal::try_from_i128_with_scale(quotient, scale + extra)
        .map(|share| share.normalize())
        .map_err(|_| TreasuryError::CalculationOverflow("pool share"))
}

impl InvestorLedger {
    /// Distribute `amount` across every investor proportionally to shares.
    ///
    /// Holds the ledger write lock for the whole operation.
    pub fn distribute_pool(&self, amount: Amount) -> Result<DistributionResult> {
        ensure_non_negative("pool amount", amount)?;

        let total_shares = self.total_shares();
        let mut state = self.state.write();

        // (payout, new balance, new lifetime dividends) per investor
        let mut planned = Vec::with_capacity(state.investors.len());
        let mut allocated_shares: u64 = 0;
        let mut total_distributed = Amount::ZERO;
        for investor in &state.investors {
            let delta = pool_share(amount, investor.shares, total_shares)?;
            let balance = investor
                .balance
                .checked_add(delta)
                .ok_or(TreasuryError::CalculationOverflow("investor balance"))?;
            let dividends = investor
                .total_dividends
                .checked_add(delta)
                .ok_or(TreasuryError::CalculationOverflow("investor dividends"))?;
            total_distributed = total_distributed
                .checked_add(delta)
                .ok_or(TreasuryError::CalculationOverflow("total distributed"))?;
            allocated_shares = allocated_shares.saturating_add(investor.shares);

            planned.push((
                InvestorPayout {
                    investor_id: investor.id.clone(),
                    shares: investor.shares,
                    amount: delta,
                },
                balance,
                dividends,
            ));
        }

        let mut payouts = Vec::with_capacity(planned.len());
        for (investor, (payout, balance, dividends)) in state.investors.iter_mut().zip(planned) {
            investor.balance = balance;
            investor.total_dividends = dividends;
            debug!(
                target: "treasury",
                investor = %payout.investor_id,
                shares = payout.shares,
                amount = %payout.amount,
                "Pool share credited"
            );
            payouts.push(payout);
        }

        let retained = amount - total_distributed;

        info!(
            target: "treasury",
            amount = %amount,
            total_distributed = %total_distributed,
            retained = %retained,
            investors = payouts.len(),
            "Pool distribution complete"
        );

        Ok(DistributionResult {
            amount,
            total_shares,
            allocated_shares,
            total_distributed,
            retained,
            payouts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_types::Investor;
    use rust_decimal_macros::dec;

    fn ledger() -> InvestorLedger {
        InvestorLedger::new(
            10_000,
            vec![
                Investor::new("inv-1", "Alice", 500, dec!(5000)),
                Investor::new("inv-2", "Bob", 2000, dec!(15000)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_pool_share() {
        assert_eq!(pool_share(dec!(1000), 500, 10_000).unwrap(), dec!(50));
        assert_eq!(pool_share(dec!(1000), 0, 10_000).unwrap(), dec!(0));
        assert_eq!(pool_share(dec!(12.34), 10_000, 10_000).unwrap(), dec!(12.34));
        assert!(pool_share(dec!(1000), 1, 0).is_err());
    }

    #[test]
    fn test_pool_share_rounds_toward_zero() {
        // 1/7 = 0.142857..., the 28th digit would round up
        assert_eq!(
            pool_share(dec!(1), 1, 7).unwrap(),
            dec!(0.1428571428571428571428571428)
        );
        assert_eq!(
            pool_share(dec!(2), 1, 3).unwrap(),
            dec!(0.6666666666666666666666666666)
        );
        // no room for extra digits at the top of the range
        assert_eq!(
            pool_share(Decimal::MAX, 1, 2).unwrap(),
            Decimal::from_i128_with_scale((MAX_MANTISSA / 2) as i128, 0)
        );
        assert_eq!(pool_share(Decimal::MAX, 9_999, 9_999).unwrap(), Decimal::MAX);
    }

    #[test]
    fn test_indivisible_pool_never_over_distributes() {
        let investors = (1..=7)
            .map(|n| Investor::new(format!("inv-{n}"), format!("Investor {n}"), 1, dec!(0)))
            .collect();
        let ledger = InvestorLedger::new(7, investors).unwrap();

        let result = ledger.distribute_pool(dec!(1)).unwrap();
        assert!(result.total_distributed <= dec!(1));
        assert!(result.retained >= Decimal::ZERO);
        assert_eq!(result.total_distributed + result.retained, dec!(1));
        assert_eq!(result.retained, dec!(0.0000000000000000000000000004));

        let dividends = ledger
            .find_all()
            .iter()
            .fold(Decimal::ZERO, |sum, investor| sum + investor.total_dividends);
        assert_eq!(dividends, result.total_distributed);
    }

    #[test]
    fn test_distribution_credits_balance_and_dividends() {
        let ledger = ledger();
        let result = ledger.distribute_pool(dec!(1000)).unwrap();

        assert_eq!(result.total_distributed, dec!(250));
        assert_eq!(result.retained, dec!(750));
        assert_eq!(result.allocated_shares, 2500);
        assert_eq!(result.payouts.len(), 2);
        assert_eq!(result.payouts[0].amount, dec!(50));
        assert_eq!(result.payouts[1].amount, dec!(200));

        let alice = ledger.find_one(&"inv-1".into()).unwrap();
        assert_eq!(alice.balance, dec!(5050));
        assert_eq!(alice.total_dividends, dec!(50));
    }

    #[test]
    fn test_negative_pool_rejected_without_mutation() {
        let ledger = ledger();
        let before = ledger.snapshot();

        let err = ledger.distribute_pool(dec!(-10)).unwrap_err();
        assert!(matches!(err, TreasuryError::Validation(_)));
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_zero_pool_is_noop() {
        let ledger = ledger();
        let before = ledger.snapshot();

        let result = ledger.distribute_pool(dec!(0)).unwrap();
        assert_eq!(result.total_distributed, dec!(0));
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_empty_ledger_retains_everything() {
        let ledger = InvestorLedger::empty(10_000).unwrap();
        let result = ledger.distribute_pool(dec!(99)).unwrap();
        assert!(result.payouts.is_empty());
        assert_eq!(result.retained, dec!(99));
    }

    #[test]
    fn test_overflow_leaves_ledger_untouched() {
        let ledger = InvestorLedger::new(
            1,
            vec![Investor::new("whale", "Whale", 1, Decimal::MAX)],
        )
        .unwrap();
        let before = ledger.snapshot();

        let err = ledger.distribute_pool(dec!(1)).unwrap_err();
        assert!(matches!(err, TreasuryError::CalculationOverflow(_)));
        assert_eq!(ledger.snapshot(), before);
    }
}
