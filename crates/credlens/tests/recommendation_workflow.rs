//! End-to-end behavior of the recommendation workflow: a CSV catalog on disk, the
//! service facade, and the HTTP router, exercised only through public APIs.

mod common {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use credlens::advisory::DisabledAdvisor;
    use credlens::catalog::CsvCatalogProvider;
    use credlens::recommendation::RecommendationService;
    use credlens::usage::{DebouncedUsageLogger, MemoryUsageLogger};
    use tempfile::NamedTempFile;

    pub(super) const CATALOG: &str = "\
Card Name,Fee,Min Income,Online Rate,Travel Rate,Dining Rate,Utility Rate,UPI Rate,Base Rate,Monthly Cap,Lounge Access,Reward Type,Pro_Reason,Con_Reason,Market_Rating,Status,Warning_Text,Image_URL,Apply_Link
Cashback Plus,500,25000,5,5,,,,1,1000,No,Cashback,Flat 5% online,,4.5,Hot,,,
Capped Five,500,25000,5,5,,,,1,400,No,Cashback,,,,Stable,,,
Free Saver,0,15000,1,1,,,,1,,No,Points,,,,,,,
Travel Elite,\"2,500\",100000,2,10,,,,1,,Yes,Miles,,,,Devalued,Lounge visits cut to 4,,
,999,0,1,1,,,,1,,No,,,,,,,,
";

    pub(super) type Service = RecommendationService<
        CsvCatalogProvider,
        DisabledAdvisor,
        DebouncedUsageLogger<MemoryUsageLogger>,
    >;

    pub(super) fn catalog_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp catalog");
        file.write_all(contents.as_bytes()).expect("write catalog");
        file.flush().expect("flush catalog");
        file
    }

    pub(super) fn service_for(path: &std::path::Path, debounce: Duration) -> Arc<Service> {
        Arc::new(RecommendationService::new(
            Arc::new(CsvCatalogProvider::new(path, Duration::from_secs(60))),
            Arc::new(DisabledAdvisor),
            Arc::new(DebouncedUsageLogger::new(
                MemoryUsageLogger::default(),
                debounce,
            )),
        ))
    }
}

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use credlens::advisory::DisabledAdvisor;
use credlens::catalog::{CardCatalog, CsvCatalogProvider};
use credlens::domain::SpendProfile;
use credlens::engine::{classify, compute_break_even, compute_yield, Verdict};
use credlens::recommendation::{
    recommendation_router, RecommendationRequest, RecommendationService,
};
use credlens::usage::{DebouncedUsageLogger, MemoryUsageLogger};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{catalog_file, service_for, CATALOG};

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal encoded as string")).expect("decimal")
}

fn scenario_spend() -> Value {
    json!({ "online": 10000, "travel": 5000, "offline": 10000 })
}

async fn post(router: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::post("/api/v1/recommendations")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&bytes).expect("json"))
}

#[tokio::test]
async fn ranks_catalog_by_net_savings_over_http() {
    let file = catalog_file(CATALOG);
    let router = recommendation_router(service_for(file.path(), Duration::ZERO));

    let (status, body) = post(
        router,
        json!({ "income": 50000, "spend": scenario_spend(), "include_advisory": false }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "recommended");
    assert_eq!(body["catalog_size"], 4);
    assert!(body["advisory"].is_null());

    let ranked = body["ranked"].as_array().expect("ranked list");
    let names: Vec<_> = ranked
        .iter()
        .map(|entry| entry["card"]["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Cashback Plus", "Capped Five", "Free Saver"]);

    let winner = &body["winner"];
    assert_eq!(winner["card"]["name"], "Cashback Plus");
    assert_eq!(decimal(&winner["yield_result"]["gross_reward"]), dec!(10200));
    assert_eq!(decimal(&winner["yield_result"]["net_savings"]), dec!(9700));
    assert_eq!(winner["yield_result"]["cap_applied"], false);
    assert_eq!(winner["verdict"], "hidden_gem");
    assert_eq!(winner["card"]["details"]["status"], "hot");

    let capped = &ranked[1];
    assert_eq!(decimal(&capped["yield_result"]["capped_reward"]), dec!(4800));
    assert_eq!(decimal(&capped["yield_result"]["net_savings"]), dec!(4300));
    assert_eq!(capped["yield_result"]["cap_applied"], true);

    let free = &ranked[2];
    assert_eq!(free["verdict"], "top_pick");
    assert_eq!(decimal(&free["break_even"]["percent_recovered"]), Decimal::ONE);
}

#[tokio::test]
async fn income_below_every_minimum_reports_no_eligible_cards() {
    let file = catalog_file(CATALOG);
    let router = recommendation_router(service_for(file.path(), Duration::ZERO));

    let (status, body) = post(
        router,
        json!({ "income": 1000, "spend": scenario_spend() }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no_eligible_cards");
    assert!(body["winner"].is_null());
    assert_eq!(body["ranked"], json!([]));
}

#[tokio::test]
async fn lounge_filter_keeps_only_lounge_cards() {
    let file = catalog_file(CATALOG);
    let router = recommendation_router(service_for(file.path(), Duration::ZERO));

    let (_, body) = post(
        router,
        json!({
            "income": 150000,
            "spend": scenario_spend(),
            "require_lounge": true,
            "include_advisory": false
        }),
    )
    .await;

    assert_eq!(body["winner"]["card"]["name"], "Travel Elite");
    assert_eq!(decimal(&body["winner"]["card"]["fee"]), dec!(2500));
    assert_eq!(body["ranked"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["winner"]["verdict"], "fair_value");
}

#[tokio::test]
async fn negative_spend_is_unprocessable() {
    let file = catalog_file(CATALOG);
    let router = recommendation_router(service_for(file.path(), Duration::ZERO));

    let (status, body) = post(
        router,
        json!({ "income": 50000, "spend": { "dining": -1 } }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("Dining"));
}

#[tokio::test]
async fn out_of_range_amounts_are_unprocessable_not_fatal() {
    let file = catalog_file(CATALOG);
    let service = service_for(file.path(), Duration::ZERO);

    for body in [
        json!({ "income": "100000", "spend": { "online": "2000000000000000000000000000" } }),
        json!({ "income": "2000000000000000000000000000", "spend": scenario_spend() }),
    ] {
        let router = recommendation_router(Arc::clone(&service));
        let (status, payload) = tokio::spawn(post(router, body))
            .await
            .expect("handler task completes");

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(payload["error"]
            .as_str()
            .expect("error message")
            .contains("exceeds the supported maximum"));
    }
}

#[tokio::test]
async fn cards_endpoint_lists_loaded_catalog() {
    let file = catalog_file(CATALOG);
    let router = recommendation_router(service_for(file.path(), Duration::ZERO));

    let response = router
        .oneshot(
            Request::get("/api/v1/cards")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body: Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(body["count"], 4);
    assert_eq!(body["skipped_rows"], 1);
    assert!(body["warning"].is_null());
    assert_eq!(body["cards"][3]["status_label"], "Devalued");
    assert_eq!(body["cards"][3]["warning_text"], "Lounge visits cut to 4");
}

#[tokio::test]
async fn missing_catalog_degrades_to_empty_result_with_warning() {
    let dir = tempfile::tempdir().expect("temp dir");
    let service = service_for(&dir.path().join("cards.csv"), Duration::ZERO);
    let router = recommendation_router(Arc::clone(&service));

    let (status, body) = post(
        router,
        json!({ "income": 50000, "spend": scenario_spend() }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no_eligible_cards");
    assert_eq!(body["catalog_size"], 0);
    assert!(body["catalog_warning"]
        .as_str()
        .expect("warning present")
        .contains("failed to read card catalog"));
    assert!(service.catalog_diagnostic().is_some());
}

#[tokio::test]
async fn usage_events_are_debounced_per_session() {
    let file = catalog_file(CATALOG);
    let usage = Arc::new(DebouncedUsageLogger::new(
        MemoryUsageLogger::default(),
        Duration::from_secs(3600),
    ));
    let service = RecommendationService::new(
        Arc::new(CsvCatalogProvider::new(file.path(), Duration::from_secs(60))),
        Arc::new(DisabledAdvisor),
        Arc::clone(&usage),
    );
    let logged = || usage.inner().events().len();

    let request = |session: &str| {
        let mut request = RecommendationRequest::new(
            dec!(50000),
            SpendProfile {
                online: dec!(10000),
                ..SpendProfile::default()
            },
        );
        request.include_advisory = false;
        request.session_id = Some(session.to_string());
        request
    };

    service.recommend(request("alpha")).await.expect("first");
    wait_for(|| logged() == 1).await;

    service.recommend(request("alpha")).await.expect("repeat");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(logged(), 1);

    service.recommend(request("beta")).await.expect("other session");
    wait_for(|| logged() == 2).await;

    let events = usage.inner().events();
    assert_eq!(events[0].card_name, "Cashback Plus");
    assert_eq!(events[1].session_id, "beta");
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

#[test]
fn hidden_gem_and_free_card_scenarios() {
    let catalog = CardCatalog::from_reader(
        "Card Name,Fee,Base Rate\nGem Card,500,1\nZero Fee,0,1\n".as_bytes(),
    )
    .expect("catalog");
    let spend = SpendProfile {
        offline: dec!(17500),
        ..SpendProfile::default()
    };

    let gem = catalog.find("Gem Card").expect("gem card");
    let gem_yield = compute_yield(&spend, gem);
    assert_eq!(gem_yield.net_savings, dec!(1600));
    assert_eq!(classify(gem_yield.net_savings, gem.fee), Verdict::HiddenGem);

    let free = catalog.find("Zero Fee").expect("free card");
    let free_yield = compute_yield(&spend, free);
    assert_eq!(classify(free_yield.net_savings, free.fee), Verdict::TopPick);
    let stats = compute_break_even(free.fee, free_yield.net_savings, spend.annual_total());
    assert_eq!(stats.percent_recovered, Decimal::ONE);
}
