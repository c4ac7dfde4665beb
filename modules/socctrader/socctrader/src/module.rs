//! Composition root: store, search index, coordinator and services.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use sea_orm::DatabaseConnection;
use socckit::{AppConfig, PageLimits};
use socctrader_sdk::{Country, FinancialAction, Game, League, Region, Team};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::MODULE_NAME;
use crate::config::SocctraderConfig;
use crate::domain::error::DomainError;
use crate::domain::ports::SearchIndex;
use crate::domain::service::RecordService;
use crate::domain::sync::{ReconcileReport, ReconcileSource, SyncCoordinator, SyncStatus, reconcile};
use crate::infra::search::build_index;
use crate::infra::storage::{SeaRecordRepository, connect_and_migrate};

/// Everything the REST layer and the server binary need.
#[derive(Clone)]
pub struct AppServices {
    pub config: Arc<SocctraderConfig>,
    pub sync: SyncCoordinator,
    pub countries: RecordService<Country>,
    pub regions: RecordService<Region>,
    pub leagues: RecordService<League>,
    pub teams: RecordService<Team>,
    pub games: RecordService<Game>,
    pub financial_actions: RecordService<FinancialAction>,
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("config", &self.config)
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}

impl AppServices {
    /// Read `modules.socctrader.config`, connect the store and the configured
    /// search backend, and wire the services.
    ///
    /// # Errors
    /// Fails when the module config is invalid or the store or index cannot
    /// be set up.
    pub async fn build(app: &AppConfig, cancel: CancellationToken) -> anyhow::Result<Self> {
        let cfg: SocctraderConfig = app
            .module_config_or_default(MODULE_NAME)
            .context("reading socctrader module config")?;
        cfg.validate()
            .map_err(|msg| anyhow::anyhow!("invalid socctrader config: {msg}"))?;

        let db = connect_and_migrate(&app.database)
            .await
            .with_context(|| format!("connecting to {}", redact_dsn(&app.database.dsn)))?;
        let index = build_index(&cfg.search).context("setting up the search index")?;

        Ok(Self::assemble(cfg, db, index, cancel))
    }

    /// Wire services over an already connected store and index.
    #[must_use]
    pub fn assemble(
        cfg: SocctraderConfig,
        db: DatabaseConnection,
        index: Arc<dyn SearchIndex>,
        cancel: CancellationToken,
    ) -> Self {
        let sync = SyncCoordinator::with_cancellation(index, cfg.sync.backoff(), cancel);

        info!(
            backend = sync.index().backend(),
            app_name = %cfg.app_name,
            "socctrader services assembled"
        );

        Self {
            countries: RecordService::new(
                Arc::new(SeaRecordRepository::<Country>::new(db.clone())),
                sync.clone(),
            ),
            regions: RecordService::new(
                Arc::new(SeaRecordRepository::<Region>::new(db.clone())),
                sync.clone(),
            ),
            leagues: RecordService::new(
                Arc::new(SeaRecordRepository::<League>::new(db.clone())),
                sync.clone(),
            ),
            teams: RecordService::new(
                Arc::new(SeaRecordRepository::<Team>::new(db.clone())),
                sync.clone(),
            ),
            games: RecordService::new(
                Arc::new(SeaRecordRepository::<Game>::new(db.clone())),
                sync.clone(),
            ),
            financial_actions: RecordService::new(
                Arc::new(SeaRecordRepository::<FinancialAction>::new(db)),
                sync.clone(),
            ),
            config: Arc::new(cfg),
            sync,
        }
    }

    /// The REST API: resources, search and sync management.
    #[must_use]
    pub fn router(&self) -> Router {
        crate::api::rest::routes::router(self.clone())
    }

    #[must_use]
    pub fn page_limits(&self) -> PageLimits {
        self.config.page_limits()
    }

    /// Reconciliation sources in a fixed kind order.
    #[must_use]
    pub fn sources(&self) -> Vec<Arc<dyn ReconcileSource>> {
        vec![
            Arc::new(self.countries.clone()),
            Arc::new(self.regions.clone()),
            Arc::new(self.leagues.clone()),
            Arc::new(self.teams.clone()),
            Arc::new(self.games.clone()),
            Arc::new(self.financial_actions.clone()),
        ]
    }

    /// One diff-and-repair pass over every kind. Repairs are queued, not awaited.
    ///
    /// # Errors
    /// Fails when the store or the index cannot be listed.
    pub async fn reconcile(&self) -> Result<ReconcileReport, DomainError> {
        reconcile(&self.sync, &self.sources()).await
    }

    /// Reconcile until one pass succeeds, backing off between failed passes
    /// with the sync retry policy. Returns `None` once `cancel` fires.
    pub async fn reconcile_with_retry(&self, cancel: &CancellationToken) -> Option<ReconcileReport> {
        let mut backoff = self.config.sync.backoff();
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            let pass = tokio::select! {
                () = cancel.cancelled() => return None,
                pass = self.reconcile() => pass,
            };

            match pass {
                Ok(report) => {
                    if attempt > 1 {
                        info!(attempts = attempt, "reconciliation succeeded after retries");
                    }
                    return Some(report);
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(
                        attempt,
                        retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "reconciliation failed; will retry"
                    );
                    tokio::select! {
                        () = cancel.cancelled() => return None,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn sync_status(&self) -> SyncStatus {
        self.sync.status()
    }

    /// Wait up to `grace` for outstanding index work, then shut the
    /// coordinator down. New work is still accepted during the wait.
    /// Returns whether everything drained.
    pub async fn drain(&self, grace: Duration) -> bool {
        let drained = self.sync.wait_idle(grace).await;
        self.sync.shutdown();
        drained
    }
}

/// DSN with any password replaced, for error messages.
fn redact_dsn(dsn: &str) -> String {
    match url::Url::parse(dsn) {
        Ok(mut url) if url.password().is_some() => {
            if url.set_password(Some("***")).is_ok() {
                url.to_string()
            } else {
                dsn.to_owned()
            }
        }
        _ => dsn.to_owned(),
    }
}
