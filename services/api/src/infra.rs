use chrono::NaiveDate;
use homepal::config::MarketplaceConfig;
use homepal::marketplace::{
    CategoryEstimator, InMemoryMarketplaceStore, LiveUpdatePublisher, MarketplaceService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type Marketplace<L> = MarketplaceService<InMemoryMarketplaceStore, L>;

/// In-process marketplace with photo estimates enabled.
pub(crate) fn marketplace_service<L>(config: &MarketplaceConfig, live: Arc<L>) -> Marketplace<L>
where
    L: LiveUpdatePublisher + 'static,
{
    MarketplaceService::new(
        Arc::new(InMemoryMarketplaceStore::new()),
        live,
        config.clone(),
    )
    .with_estimator(Arc::new(CategoryEstimator))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates_only() {
        assert_eq!(
            parse_date(" 2027-03-01 "),
            Ok(NaiveDate::from_ymd_opt(2027, 3, 1).expect("valid date"))
        );
        assert!(parse_date("01.03.2027").is_err());
    }
}
