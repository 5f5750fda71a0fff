//! Main entry point for tiered record storage.
//!
//! This module provides the `Tiering` struct, which wires stores, cache,
//! orchestrator, router and record service together.

use std::sync::Arc;
use strata_tier_cache::{CacheStats, CachedRecord, LruTtlCache, RecordCache};
use strata_tier_concurrency::StopSignal;
use strata_tier_core::{Error, RecordId, Result, TieringConfig};
use strata_tier_engine::{
    ArchivalOrchestrator, PassOptions, PassReport, RecordService, Retrieval, RetrievalRouter,
};
use strata_tier_storage::{ColdStore, HotStore, MemoryColdStore, MemoryHotStore};
use tokio::task::JoinHandle;
use tracing::info;

/// Tiered record storage.
///
/// Reads go through [`Tiering::router`], writes through
/// [`Tiering::records`], and an external scheduler calls
/// [`Tiering::run_archival_pass`] on whatever cadence it likes.
///
/// # Example
///
/// ```ignore
/// use stratatier::prelude::*;
///
/// let tiering = Tiering::in_memory()?;
/// let record = tiering.records.create(None, json!({"amount": 99.99})).await?;
///
/// let report = tiering.run_archival_pass().await?;
/// println!("{}", report.summary());
///
/// let found = tiering.get(&record.id).await?;
/// ```
pub struct Tiering {
    config: TieringConfig,
    cache: Arc<dyn RecordCache>,

    /// Archival passes, quarantine and cleanup
    pub archival: Arc<ArchivalOrchestrator>,

    /// Reads across cache, hot and cold tiers
    pub router: Arc<RetrievalRouter>,

    /// Writes to the hot tier
    pub records: RecordService,
}

impl Tiering {
    /// In-memory stores with the default configuration.
    pub fn in_memory() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder.
    pub fn builder() -> TieringBuilder {
        TieringBuilder::new()
    }

    /// Effective configuration.
    pub fn config(&self) -> &TieringConfig {
        &self.config
    }

    /// Resolve one record.
    pub async fn get(&self, id: &RecordId) -> Result<Retrieval> {
        self.router.get(id).await
    }

    /// Resolve several records, one result per id in request order.
    pub async fn get_many(&self, ids: &[RecordId]) -> Vec<Result<Retrieval>> {
        self.router.get_many(ids).await
    }

    /// Run one archival pass with the configured options.
    pub async fn run_archival_pass(&self) -> Result<PassReport> {
        self.archival
            .run_pass(&PassOptions::from_config(&self.config), &StopSignal::new())
            .await
    }

    /// Start a pass in the background; the handle can stop it gracefully.
    pub fn spawn_archival_pass(&self, options: PassOptions) -> ArchivalHandle {
        let stop = StopSignal::new();
        let archival = Arc::clone(&self.archival);
        let signal = stop.clone();
        let task = tokio::spawn(async move { archival.run_pass(&options, &signal).await });
        ArchivalHandle { stop, task }
    }

    /// Cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// A pass running in the background.
pub struct ArchivalHandle {
    stop: StopSignal,
    task: JoinHandle<Result<PassReport>>,
}

impl ArchivalHandle {
    /// Stop pulling new records; migrations under way finish.
    pub fn stop(&self) {
        self.stop.request_stop();
    }

    /// Signal that stops this pass, for handing to another task.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Wait for the pass to finish.
    pub async fn join(self) -> Result<PassReport> {
        self.task
            .await
            .map_err(|e| Error::Internal(format!("archival task failed: {}", e)))?
    }
}

/// Builder for [`Tiering`].
///
/// Any store left unset is an in-memory one.
///
/// # Example
///
/// ```ignore
/// let tiering = Tiering::builder()
///     .config(TieringConfig::load("tiering.toml")?.with_env_overrides()?)
///     .cold(Arc::new(FsColdStore::open("./cold")?))
///     .build()?;
/// ```
#[derive(Default)]
pub struct TieringBuilder {
    config: TieringConfig,
    hot: Option<Arc<dyn HotStore>>,
    cold: Option<Arc<dyn ColdStore>>,
    cache: Option<Arc<dyn RecordCache>>,
}

impl TieringBuilder {
    /// Builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config`.
    pub fn config(mut self, config: TieringConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `hot` as the hot tier.
    pub fn hot(mut self, hot: Arc<dyn HotStore>) -> Self {
        self.hot = Some(hot);
        self
    }

    /// Use `cold` as the cold tier.
    pub fn cold(mut self, cold: Arc<dyn ColdStore>) -> Self {
        self.cold = Some(cold);
        self
    }

    /// Use `cache` instead of a bounded LRU cache.
    pub fn cache(mut self, cache: Arc<dyn RecordCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Validate the configuration and wire everything together.
    pub fn build(self) -> Result<Tiering> {
        let config = self.config;
        config.validate()?;

        let hot: Arc<dyn HotStore> = match self.hot {
            Some(hot) => hot,
            None => Arc::new(MemoryHotStore::with_max_record_size(config.max_record_size)),
        };
        let cold: Arc<dyn ColdStore> = match self.cold {
            Some(cold) => cold,
            None => Arc::new(MemoryColdStore::new()),
        };
        let cache: Arc<dyn RecordCache> = match self.cache {
            Some(cache) => cache,
            None => Arc::new(LruTtlCache::<RecordId, CachedRecord>::new(config.cache_capacity)),
        };

        let archival = Arc::new(ArchivalOrchestrator::new(
            hot.clone(),
            cold.clone(),
            cache.clone(),
            &config,
        )?);
        let router = Arc::new(RetrievalRouter::new(
            hot.clone(),
            cold,
            cache.clone(),
            &config,
        ));
        let records = RecordService::new(hot, cache.clone(), &config);

        info!(
            archive_threshold_secs = config.archive_threshold_secs,
            cache_capacity = config.cache_capacity,
            "tiering ready"
        );

        Ok(Tiering {
            config,
            cache,
            archival,
            router,
            records,
        })
    }
}
