use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::service::{RecommendationError, RecommendationRequest, RecommendationService};
use super::views::CardSummaryView;
use crate::advisory::AdvisoryGenerator;
use crate::catalog::CatalogProvider;
use crate::usage::UsageLogger;

/// Router builder exposing the recommendation and catalog listing endpoints.
pub fn recommendation_router<C, A, L>(service: Arc<RecommendationService<C, A, L>>) -> Router
where
    C: CatalogProvider + 'static,
    A: AdvisoryGenerator + 'static,
    L: UsageLogger + 'static,
{
    Router::new()
        .route("/api/v1/recommendations", post(recommend_handler::<C, A, L>))
        .route("/api/v1/cards", get(cards_handler::<C, A, L>))
        .with_state(service)
}

pub(crate) async fn recommend_handler<C, A, L>(
    State(service): State<Arc<RecommendationService<C, A, L>>>,
    axum::Json(request): axum::Json<RecommendationRequest>,
) -> Response
where
    C: CatalogProvider + 'static,
    A: AdvisoryGenerator + 'static,
    L: UsageLogger + 'static,
{
    match service.recommend(request).await {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(RecommendationError::InvalidProfile(error)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn cards_handler<C, A, L>(
    State(service): State<Arc<RecommendationService<C, A, L>>>,
) -> Response
where
    C: CatalogProvider + 'static,
    A: AdvisoryGenerator + 'static,
    L: UsageLogger + 'static,
{
    let catalog = service.catalog();
    let cards: Vec<CardSummaryView> = catalog.cards().iter().map(CardSummaryView::from).collect();
    let payload = json!({
        "count": cards.len(),
        "skipped_rows": catalog.skipped_rows(),
        "warning": service.catalog_diagnostic(),
        "cards": cards,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}
