use crate::domain::{CardRecord, SpendProfile};
use crate::engine::{
    classify, compute_break_even, compute_yield, BreakEvenStats, Verdict, YieldResult,
};
use rust_decimal::Decimal;

/// Number of cards shown in the profitability comparison.
pub const COMPARISON_SIZE: usize = 5;

/// One eligible card with its full evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCard<'a> {
    pub card: &'a CardRecord,
    pub yield_result: YieldResult,
    pub break_even: BreakEvenStats,
    pub verdict: Verdict,
}

/// Eligible cards ordered by net savings, best first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking<'a> {
    entries: Vec<RankedCard<'a>>,
}

impl<'a> Ranking<'a> {
    /// `None` means no card passed the income and lounge filters.
    pub fn winner(&self) -> Option<&RankedCard<'a>> {
        self.entries.first()
    }

    pub fn entries(&self) -> &[RankedCard<'a>] {
        &self.entries
    }

    pub fn top(&self, limit: usize) -> &[RankedCard<'a>] {
        &self.entries[..limit.min(self.entries.len())]
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn into_entries(self) -> Vec<RankedCard<'a>> {
        self.entries
    }
}

pub fn rank_cards<'a>(
    catalog: &'a [CardRecord],
    profile: &SpendProfile,
    user_income: Decimal,
    require_lounge: bool,
) -> Ranking<'a> {
    let annual_spend = profile.annual_total();

    let mut entries: Vec<RankedCard<'a>> = catalog
        .iter()
        .filter(|card| card.min_income <= user_income)
        .filter(|card| !require_lounge || card.lounge_access)
        .map(|card| {
            let yield_result = compute_yield(profile, card);
            let break_even = compute_break_even(card.fee, yield_result.net_savings, annual_spend);
            let verdict = classify(yield_result.net_savings, card.fee);
            RankedCard {
                card,
                yield_result,
                break_even,
                verdict,
            }
        })
        .collect();

    // Stable: equal savings keep catalog order.
    entries.sort_by(|left, right| {
        right
            .yield_result
            .net_savings
            .cmp(&left.yield_result.net_savings)
    });

    Ranking { entries }
}
