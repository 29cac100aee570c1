use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::views::{CardEvaluation, RecommendationReport, RecommendationStatus};
use crate::advisory::{AdvisoryError, AdvisoryGenerator, AdvisoryRequest};
use crate::catalog::{CardCatalog, CatalogProvider};
use crate::domain::{ProfileError, SpendProfile, MAX_MONTHLY_AMOUNT};
use crate::ranking::rank_cards;
use crate::usage::{UsageEvent, UsageLogger};

pub const DEFAULT_ADVISORY_TIMEOUT: Duration = Duration::from_secs(3);
const ANONYMOUS_SESSION: &str = "anonymous";

/// One user interaction: income, monthly spend and filters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecommendationRequest {
    pub income: Decimal,
    #[serde(default)]
    pub spend: SpendProfile,
    #[serde(default)]
    pub require_lounge: bool,
    #[serde(default = "include_advisory_default")]
    pub include_advisory: bool,
    #[serde(default)]
    pub session_id: Option<String>,
}

fn include_advisory_default() -> bool {
    true
}

impl RecommendationRequest {
    pub fn new(income: Decimal, spend: SpendProfile) -> Self {
        Self {
            income,
            spend,
            require_lounge: false,
            include_advisory: true,
            session_id: None,
        }
    }

    fn validate(&self) -> Result<(), ProfileError> {
        if self.income < Decimal::ZERO {
            return Err(ProfileError::NegativeIncome);
        }
        if self.income > MAX_MONTHLY_AMOUNT {
            return Err(ProfileError::IncomeTooLarge);
        }
        self.spend.validate()
    }
}

/// Service composing the catalog provider, the ranking core and the side-channel ports.
pub struct RecommendationService<C, A, L> {
    catalog: Arc<C>,
    advisor: Arc<A>,
    usage: Arc<L>,
    advisory_timeout: Duration,
}

impl<C, A, L> RecommendationService<C, A, L>
where
    C: CatalogProvider + 'static,
    A: AdvisoryGenerator + 'static,
    L: UsageLogger + 'static,
{
    pub fn new(catalog: Arc<C>, advisor: Arc<A>, usage: Arc<L>) -> Self {
        Self {
            catalog,
            advisor,
            usage,
            advisory_timeout: DEFAULT_ADVISORY_TIMEOUT,
        }
    }

    pub fn with_advisory_timeout(mut self, timeout: Duration) -> Self {
        self.advisory_timeout = timeout;
        self
    }

    pub fn catalog(&self) -> Arc<CardCatalog> {
        self.catalog.snapshot()
    }

    pub fn catalog_diagnostic(&self) -> Option<String> {
        self.catalog.diagnostic()
    }

    /// Rank the current catalog for one request.
    ///
    /// Numbers are final before any collaborator runs: the usage log is written on a
    /// blocking task that is never awaited, and the advisory text is only attached.
    pub async fn recommend(
        &self,
        request: RecommendationRequest,
    ) -> Result<RecommendationReport, RecommendationError> {
        request.validate()?;

        let snapshot = self.catalog.snapshot();
        let ranked: Vec<CardEvaluation> = rank_cards(
            snapshot.cards(),
            &request.spend,
            request.income,
            request.require_lounge,
        )
        .into_entries()
        .into_iter()
        .enumerate()
        .map(|(index, entry)| CardEvaluation::from_ranked(index + 1, &entry))
        .collect();

        let winner = ranked.first().cloned();
        let status = if winner.is_some() {
            RecommendationStatus::Recommended
        } else {
            RecommendationStatus::NoEligibleCards
        };

        let advisory = match &winner {
            Some(best) => {
                self.log_usage(&request, best);
                if request.include_advisory {
                    self.advise(&request, best).await
                } else {
                    None
                }
            }
            None => None,
        };

        info!(
            income = %request.income,
            monthly_spend = %request.spend.total(),
            eligible = ranked.len(),
            winner = winner.as_ref().map(|best| best.card.name.as_str()).unwrap_or("none"),
            "recommendation computed"
        );

        Ok(RecommendationReport {
            status,
            income: request.income,
            spend: request.spend,
            monthly_spend: request.spend.total(),
            annual_spend: request.spend.annual_total(),
            winner,
            ranked,
            catalog_size: snapshot.len(),
            catalog_warning: self.catalog.diagnostic(),
            advisory,
        })
    }

    fn log_usage(&self, request: &RecommendationRequest, best: &CardEvaluation) {
        let event = UsageEvent {
            recorded_at: Utc::now(),
            session_id: request
                .session_id
                .clone()
                .unwrap_or_else(|| ANONYMOUS_SESSION.to_string()),
            income: request.income,
            spend: request.spend,
            card_name: best.card.name.clone(),
            net_savings: best.net_savings(),
        };

        let usage = Arc::clone(&self.usage);
        tokio::task::spawn_blocking(move || {
            if let Err(err) = usage.record(event) {
                warn!(error = %err, "usage log write failed");
            }
        });
    }

    async fn advise(
        &self,
        request: &RecommendationRequest,
        best: &CardEvaluation,
    ) -> Option<String> {
        let advisory_request = AdvisoryRequest {
            income: request.income,
            monthly_spend: request.spend.total(),
            card_name: best.card.name.clone(),
            net_savings: best.net_savings(),
        };

        match tokio::time::timeout(
            self.advisory_timeout,
            self.advisor.advise(&advisory_request),
        )
        .await
        {
            Ok(Ok(text)) => Some(text),
            Ok(Err(AdvisoryError::Disabled)) => {
                debug!("advisory generator disabled");
                None
            }
            Ok(Err(err)) => {
                warn!(error = %err, "advisory generation failed");
                None
            }
            Err(_) => {
                warn!(
                    error = %AdvisoryError::Timeout,
                    timeout = ?self.advisory_timeout,
                    "advisory generation abandoned"
                );
                None
            }
        }
    }
}

/// Error raised by the recommendation service.
#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("invalid profile: {0}")]
    InvalidProfile(#[from] ProfileError),
}
