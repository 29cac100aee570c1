//! Request-level orchestration: validate, rank a catalog snapshot, then attach the
//! best-effort side channels (usage log, advisory text).

pub mod router;
pub mod service;
pub mod views;

pub use router::recommendation_router;
pub use service::{
    RecommendationError, RecommendationRequest, RecommendationService, DEFAULT_ADVISORY_TIMEOUT,
};
pub use views::{CardEvaluation, CardSummaryView, RecommendationReport, RecommendationStatus};
