use rust_decimal::Decimal;
use thiserror::Error;

/// Payout figures for a winning bet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutQuote {
    /// Odds-implied multiplier, 1 / probability
    pub margin: Decimal,
    /// Stake times margin
    pub gross: Decimal,
    /// Gross minus stake
    pub net: Decimal,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum OddsError {
    #[error("probability must be positive, got {0}")]
    NonPositiveProbability(Decimal),

    #[error("payout overflow for probability {probability} and amount {amount}")]
    Overflow { probability: Decimal, amount: Decimal },
}

/// Compute the payout of a winning stake at the locked-in probability
pub fn quote(probability: Decimal, amount: Decimal) -> Result<PayoutQuote, OddsError> {
    if probability <= Decimal::ZERO {
        return Err(OddsError::NonPositiveProbability(probability));
    }

    let overflow = || OddsError::Overflow {
        probability,
        amount,
    };

    let margin = Decimal::ONE.checked_div(probability).ok_or_else(overflow)?;
    let gross = amount.checked_mul(margin).ok_or_else(overflow)?;
    let net = gross.checked_sub(amount).ok_or_else(overflow)?;

    Ok(PayoutQuote { margin, gross, net })
}
