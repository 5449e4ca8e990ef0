//! API server: REST endpoints plus a Prometheus exporter on its own port.

use crate::rest::{self, AppState};
use crate::{bulk_rest, platform_rest, records_rest};
use adlaunch_core::config::AppConfig;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Bulk submissions
        .route("/api/v1/bulk-submissions", get(bulk_rest::list).post(bulk_rest::start))
        .route("/api/v1/bulk-submissions/preview", post(bulk_rest::preview))
        .route("/api/v1/bulk-submissions/:id", get(bulk_rest::status))
        // Platform lookups
        .route("/api/v1/platform/campaigns", get(platform_rest::list_campaigns))
        .route("/api/v1/platform/campaigns/:id/ad-sets", get(platform_rest::list_ad_sets))
        .route("/api/v1/platform/ad-sets/:id/ads", get(platform_rest::list_ads))
        .route("/api/v1/platform/ad-accounts", get(platform_rest::list_ad_accounts))
        .route("/api/v1/platform/pages", get(platform_rest::list_pages))
        .route("/api/v1/platform/pixels", get(platform_rest::list_pixels))
        .route("/api/v1/platform/locations/search", get(platform_rest::search_locations))
        // Brands
        .route("/api/v1/brands", get(records_rest::list_brands).post(records_rest::create_brand))
        .route(
            "/api/v1/brands/:id",
            get(records_rest::get_brand)
                .put(records_rest::update_brand)
                .delete(records_rest::delete_brand),
        )
        .route(
            "/api/v1/brands/:id/products",
            get(records_rest::list_products).post(records_rest::create_product),
        )
        // Products
        .route(
            "/api/v1/products/:id",
            get(records_rest::get_product)
                .put(records_rest::update_product)
                .delete(records_rest::delete_product),
        )
        // Customer profiles
        .route("/api/v1/profiles", get(records_rest::list_profiles).post(records_rest::create_profile))
        .route(
            "/api/v1/profiles/:id",
            get(records_rest::get_profile)
                .put(records_rest::update_profile)
                .delete(records_rest::delete_profile),
        )
        // Local campaign and ad set records
        .route("/api/v1/campaigns", get(records_rest::list_campaigns).post(records_rest::save_campaign))
        .route("/api/v1/campaigns/:id", get(records_rest::get_campaign))
        .route("/api/v1/ad-sets", get(records_rest::list_ad_sets).post(records_rest::save_ad_set))
        .route("/api/v1/ad-sets/:id", get(records_rest::get_ad_set))
        // Local ad records
        .route("/api/v1/ads", get(records_rest::list_ads).post(records_rest::create_ads))
        .route("/api/v1/ads/:ad_set_id", get(records_rest::list_ads_for_ad_set))
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = router(self.state.clone());
        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, platform = self.state.client.platform_name(), "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }

    /// Start the metrics exporter on a separate port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
