use credlens::advisory::{
    AdvisoryError, AdvisoryGenerator, AdvisoryRequest, CachedAdvisor, DisabledAdvisor,
    GeminiAdvisor,
};
use credlens::catalog::CsvCatalogProvider;
use credlens::config::AppConfig;
use credlens::recommendation::RecommendationService;
use credlens::usage::{
    CsvUsageLogger, DebouncedUsageLogger, TracingUsageLogger, UsageEvent, UsageLogError,
    UsageLogger,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type CredLensService = RecommendationService<
    CsvCatalogProvider,
    RuntimeAdvisor,
    DebouncedUsageLogger<RuntimeUsageLog>,
>;

/// Advisory generator chosen from configuration at startup.
pub(crate) enum RuntimeAdvisor {
    Disabled(DisabledAdvisor),
    Gemini(CachedAdvisor<GeminiAdvisor>),
}

impl AdvisoryGenerator for RuntimeAdvisor {
    async fn advise(&self, request: &AdvisoryRequest) -> Result<String, AdvisoryError> {
        match self {
            RuntimeAdvisor::Disabled(advisor) => advisor.advise(request).await,
            RuntimeAdvisor::Gemini(advisor) => advisor.advise(request).await,
        }
    }
}

/// Usage sink chosen from configuration at startup.
pub(crate) enum RuntimeUsageLog {
    File(CsvUsageLogger),
    Tracing(TracingUsageLogger),
}

impl UsageLogger for RuntimeUsageLog {
    fn record(&self, event: UsageEvent) -> Result<(), UsageLogError> {
        match self {
            RuntimeUsageLog::File(logger) => logger.record(event),
            RuntimeUsageLog::Tracing(logger) => logger.record(event),
        }
    }
}

pub(crate) fn build_advisor(config: &AppConfig) -> RuntimeAdvisor {
    match &config.advisory.api_key {
        Some(api_key) => {
            info!(model = %config.advisory.model, "advisory generator enabled");
            RuntimeAdvisor::Gemini(CachedAdvisor::new(GeminiAdvisor::new(
                api_key.clone(),
                config.advisory.model.clone(),
            )))
        }
        None => {
            info!("no advisory API key configured; advisory disabled");
            RuntimeAdvisor::Disabled(DisabledAdvisor)
        }
    }
}

pub(crate) fn build_usage_log(config: &AppConfig) -> DebouncedUsageLogger<RuntimeUsageLog> {
    let inner = match &config.usage.log_path {
        Some(path) => RuntimeUsageLog::File(CsvUsageLogger::new(path.clone())),
        None => RuntimeUsageLog::Tracing(TracingUsageLogger),
    };
    DebouncedUsageLogger::new(inner, config.usage.debounce)
}

pub(crate) fn build_service(config: &AppConfig) -> Arc<CredLensService> {
    let catalog = CsvCatalogProvider::new(
        config.catalog.path.clone(),
        config.catalog.refresh_interval,
    );

    Arc::new(
        RecommendationService::new(
            Arc::new(catalog),
            Arc::new(build_advisor(config)),
            Arc::new(build_usage_log(config)),
        )
        .with_advisory_timeout(config.advisory.timeout),
    )
}
