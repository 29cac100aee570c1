use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Break-even spend reported when the card earns nothing yet still charges a fee.
pub const UNREACHABLE_SPEND: Decimal = Decimal::from_parts(9_999_999, 0, 0, false, 0);

/// Progress of a card toward paying back its annual fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakEvenStats {
    /// Reward earned per unit of annual spend, as a fraction.
    pub effective_rate: Decimal,
    /// Annual spend at which rewards cover the fee, truncated to whole currency units.
    pub break_even_spend: Decimal,
    /// Share of the break-even spend already reached, within `[0, 1]`.
    pub percent_recovered: Decimal,
    /// Rewards still missing before the fee is covered.
    pub fee_shortfall: Decimal,
}

impl BreakEvenStats {
    /// False only when a fee is owed and the card earns nothing on this spend.
    pub fn is_reachable(&self) -> bool {
        self.effective_rate > Decimal::ZERO || self.break_even_spend.is_zero()
    }

    pub fn fee_recovered(&self) -> bool {
        self.percent_recovered >= Decimal::ONE
    }
}

pub fn compute_break_even(
    fee: Decimal,
    net_savings: Decimal,
    annual_spend: Decimal,
) -> BreakEvenStats {
    let total_earnings = net_savings + fee;

    let effective_rate = if annual_spend > Decimal::ZERO {
        total_earnings / annual_spend
    } else {
        Decimal::ZERO
    };

    // fee / (earnings / spend), rearranged to divide once.
    let break_even_spend = if effective_rate > Decimal::ZERO {
        (fee * annual_spend / total_earnings).trunc()
    } else if fee > Decimal::ZERO {
        UNREACHABLE_SPEND
    } else {
        Decimal::ZERO
    };

    let percent_recovered = if break_even_spend > Decimal::ZERO {
        (annual_spend / break_even_spend).clamp(Decimal::ZERO, Decimal::ONE)
    } else {
        Decimal::ONE
    };

    BreakEvenStats {
        effective_rate,
        break_even_spend,
        percent_recovered,
        fee_shortfall: (-net_savings).max(Decimal::ZERO),
    }
}
