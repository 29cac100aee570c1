use crate::domain::{CardRecord, SpendCategory, SpendProfile, MONTHS_PER_YEAR};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const PERCENT: Decimal = Decimal::ONE_HUNDRED;

/// Annual reward earned in one spend category, kept for the calculation walkthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReward {
    pub category: SpendCategory,
    pub annual_spend: Decimal,
    pub rate: Decimal,
    pub reward: Decimal,
}

/// Reward arithmetic for one (profile, card) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldResult {
    pub gross_reward: Decimal,
    pub capped_reward: Decimal,
    pub net_savings: Decimal,
    pub cap_applied: bool,
    pub breakdown: Vec<CategoryReward>,
}

/// Net annual value of `card` for someone spending `spend` every month.
///
/// The monthly cap is enforced as a single blended annual ceiling (`12 × monthly_cap`)
/// across all categories. Per-category monthly limits are not modeled.
pub fn compute_yield(spend: &SpendProfile, card: &CardRecord) -> YieldResult {
    let mut gross_reward = Decimal::ZERO;
    let mut breakdown = Vec::new();

    for category in SpendCategory::ALL {
        let annual_spend = spend.amount(category) * MONTHS_PER_YEAR;
        let rate = card.rates.rate_for(category);
        let reward = annual_spend * rate / PERCENT;
        gross_reward += reward;

        if !annual_spend.is_zero() {
            breakdown.push(CategoryReward {
                category,
                annual_spend,
                rate,
                reward,
            });
        }
    }

    let (capped_reward, cap_applied) = match card.annual_cap() {
        Some(annual_cap) if gross_reward > annual_cap => (annual_cap, true),
        _ => (gross_reward, false),
    };

    YieldResult {
        gross_reward,
        capped_reward,
        net_savings: capped_reward - card.fee,
        cap_applied,
        breakdown,
    }
}
