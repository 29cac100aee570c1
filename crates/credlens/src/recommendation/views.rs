use crate::domain::{CardRecord, CardStatus, RewardType, SpendProfile};
use crate::engine::{BreakEvenStats, Verdict, YieldResult};
use crate::ranking::RankedCard;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Evaluation of one eligible card, owned so it can outlive the catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardEvaluation {
    pub rank: usize,
    pub card: CardRecord,
    pub yield_result: YieldResult,
    pub break_even: BreakEvenStats,
    pub verdict: Verdict,
    pub verdict_label: &'static str,
}

impl CardEvaluation {
    pub(crate) fn from_ranked(rank: usize, entry: &RankedCard<'_>) -> Self {
        Self {
            rank,
            card: entry.card.clone(),
            yield_result: entry.yield_result.clone(),
            break_even: entry.break_even,
            verdict: entry.verdict,
            verdict_label: entry.verdict.label(),
        }
    }

    pub fn net_savings(&self) -> Decimal {
        self.yield_result.net_savings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    Recommended,
    NoEligibleCards,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationReport {
    pub status: RecommendationStatus,
    pub income: Decimal,
    pub spend: SpendProfile,
    pub monthly_spend: Decimal,
    pub annual_spend: Decimal,
    pub winner: Option<CardEvaluation>,
    pub ranked: Vec<CardEvaluation>,
    pub catalog_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_warning: Option<String>,
    pub advisory: Option<String>,
}

impl RecommendationReport {
    /// Leading entries for the profitability comparison.
    pub fn comparison(&self, limit: usize) -> &[CardEvaluation] {
        &self.ranked[..limit.min(self.ranked.len())]
    }
}

/// Catalog listing entry for `GET /api/v1/cards`.
#[derive(Debug, Clone, Serialize)]
pub struct CardSummaryView {
    pub name: String,
    pub fee: Decimal,
    pub min_income: Decimal,
    pub lounge_access: bool,
    pub monthly_cap: Option<Decimal>,
    pub reward_type: RewardType,
    pub status: CardStatus,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_text: Option<String>,
}

impl From<&CardRecord> for CardSummaryView {
    fn from(card: &CardRecord) -> Self {
        Self {
            name: card.name.clone(),
            fee: card.fee,
            min_income: card.min_income,
            lounge_access: card.lounge_access,
            monthly_cap: card.monthly_cap,
            reward_type: card.reward_type.clone(),
            status: card.details.status,
            status_label: card.details.status.label(),
            warning_text: card.details.warning_text.clone(),
        }
    }
}
