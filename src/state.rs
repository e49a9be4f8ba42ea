use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Notify;

use crate::config::AppConfig;
use crate::detector::{CatalogOverlay, Detector};
use crate::error::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub detector: Arc<Detector>,
    pub started_at: Instant,
    /// Notified by `POST /shutdown`; `main` waits on it alongside OS signals.
    pub shutdown: Arc<Notify>,
}

impl AppState {
    /// Build the detector (built-ins plus the configured overlay, if any).
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let mut detector = Detector::standard()?;

        if let Some(path) = &config.catalog_path {
            let overlay = CatalogOverlay::from_path(path)?;
            tracing::info!(
                path = %path,
                languages = overlay.languages.len(),
                signals = overlay.signals.len(),
                "Applying catalog overlay"
            );
            detector = detector.with_overlay(overlay)?;
        }

        Ok(Self::with_detector(config, detector))
    }

    pub fn with_detector(config: AppConfig, detector: Detector) -> Self {
        Self {
            config,
            detector: Arc::new(detector),
            started_at: Instant::now(),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Resolves once a shutdown has been requested over HTTP.
    pub async fn wait_for_shutdown(&self) {
        self.shutdown.notified().await;
    }
}
