//! Background worker for periodic discovery

use crate::{Curator, CuratorConfig, CuratorError, CuratorMetrics, DiscoveryReport};
use std::fmt::Display;
use tokio::time::{interval, Duration};
use trellis_domain::traits::RelationshipStore;

/// Background worker that runs discovery on a schedule
///
/// Each tick takes a fresh snapshot of the store, so edges linked between
/// ticks feed the next discovery run.
///
/// # Examples
///
/// ```no_run
/// use trellis_curator::{CuratorConfig, CuratorWorker};
/// use trellis_store::SqliteRelationshipStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = SqliteRelationshipStore::open("trellis.db")?;
///     let mut worker = CuratorWorker::new(CuratorConfig::default())?;
///
///     // Run until Ctrl+C
///     worker.run(&store).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct CuratorWorker {
    curator: Curator,
    interval: Duration,
}

impl CuratorWorker {
    /// Create a new background worker with the given configuration
    ///
    /// # Errors
    /// `Config` if the configuration is invalid
    pub fn new(config: CuratorConfig) -> Result<Self, CuratorError> {
        let interval = config.discovery_interval();
        Ok(Self {
            curator: Curator::new(config)?,
            interval,
        })
    }

    /// Time between discovery runs
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the worker until a shutdown signal (Ctrl+C) is received
    ///
    /// A failed run is logged and the next tick proceeds.
    pub async fn run<R>(&mut self, store: &R) -> Result<(), CuratorError>
    where
        R: RelationshipStore,
        R::Error: Display,
    {
        let mut ticker = interval(self.interval);

        tracing::info!("Curator worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Starting discovery run");

                    if let Err(e) = self.curator.run_discovery(store) {
                        tracing::error!("Discovery run failed: {}", e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping curator worker");
                    break;
                }
            }
        }

        tracing::info!(
            "Curator worker stopped. Final metrics:\n{}",
            self.curator.metrics().summary()
        );

        Ok(())
    }

    /// Run for a specific number of discovery cycles
    ///
    /// The first cycle starts immediately. Stops at the first failed run.
    pub async fn run_cycles<R>(
        &mut self,
        store: &R,
        cycles: usize,
    ) -> Result<Vec<DiscoveryReport>, CuratorError>
    where
        R: RelationshipStore,
        R::Error: Display,
    {
        let mut ticker = interval(self.interval);
        let mut reports = Vec::with_capacity(cycles);

        tracing::info!(
            "Curator worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;

            match self.curator.run_discovery(store) {
                Ok(report) => {
                    tracing::debug!(
                        "Discovery {}/{} completed: {} proposed",
                        cycle + 1,
                        cycles,
                        report.proposed
                    );
                    reports.push(report);
                }
                Err(e) => {
                    tracing::error!("Discovery {}/{} failed: {}", cycle + 1, cycles, e);
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "Curator worker finished {} cycles. Final metrics:\n{}",
            cycles,
            self.curator.metrics().summary()
        );

        Ok(reports)
    }

    /// The wrapped curator, for linking between discovery runs
    pub fn curator_mut(&mut self) -> &mut Curator {
        &mut self.curator
    }

    /// Get a reference to the curator's current metrics
    pub fn metrics(&self) -> &CuratorMetrics {
        self.curator.metrics()
    }

    /// Reset the curator's metrics counters
    pub fn reset_metrics(&mut self) {
        self.curator.reset_metrics();
    }
}
