//! Drives the three periodic background workers and performs a final,
//! bounded-timeout flush on shutdown.

use crate::error::AuthError;
use crate::services::insert_buffer::InsertBuffer;
use crate::services::revoke_buffer::RevokeBuffer;
use crate::services::sweeper::Sweeper;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub insert_interval: Duration,
    pub revoke_interval: Duration,
    pub sweep_interval: Duration,
    /// Bound on the final drain performed at shutdown. The source uses one
    /// minute; a stuck database must not prevent process exit.
    pub shutdown_flush_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            insert_interval: Duration::from_secs(5),
            revoke_interval: Duration::from_secs(10),
            sweep_interval: Duration::from_secs(10),
            shutdown_flush_timeout: Duration::from_secs(60),
        }
    }
}

pub struct Scheduler {
    insert_buffer: Arc<InsertBuffer>,
    revoke_buffer: Arc<RevokeBuffer>,
    sweeper: Arc<Sweeper>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        insert_buffer: Arc<InsertBuffer>,
        revoke_buffer: Arc<RevokeBuffer>,
        sweeper: Arc<Sweeper>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            insert_buffer,
            revoke_buffer,
            sweeper,
            config,
        }
    }

    /// Run the three workers on independent timers until `shutdown` is
    /// cancelled, then perform one final bounded-timeout flush of all
    /// three. One task's slow drain never delays another's tick — each
    /// runs its own `tokio::time::interval`.
    pub async fn run(&self, shutdown: CancellationToken) {
        tokio::join!(
            self.run_periodic("insert", self.config.insert_interval, &shutdown, || {
                self.insert_buffer.drain()
            }),
            self.run_periodic("revoke", self.config.revoke_interval, &shutdown, || {
                self.revoke_buffer.drain()
            }),
            self.run_periodic("sweep", self.config.sweep_interval, &shutdown, || {
                self.sweeper.drain()
            }),
        );

        info!("scheduler shutting down, performing final flush");
        if let Err(e) = self.final_flush().await {
            error!(error = %e, "final shutdown flush did not fully succeed");
        }
    }

    async fn run_periodic<F, Fut>(
        &self,
        name: &'static str,
        interval: Duration,
        shutdown: &CancellationToken,
        mut drain: F,
    ) where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<(), AuthError>>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = drain().await {
                        error!(task = name, error = %e, "periodic drain failed, work remains buffered");
                    }
                }
                _ = shutdown.cancelled() => break,
            }
        }
    }

    /// Flush all three workers once more with a bounded timeout so a stuck
    /// database cannot prevent process exit. Accumulates each task's own
    /// error rather than discarding all but one.
    #[instrument(skip(self))]
    async fn final_flush(&self) -> Result<(), AuthError> {
        let flush_all = async {
            let (insert_res, revoke_res, sweep_res) = tokio::join!(
                self.insert_buffer.drain(),
                self.revoke_buffer.drain(),
                self.sweeper.drain(),
            );

            let mut errors = Vec::new();
            for (name, result) in [
                ("insert", insert_res),
                ("revoke", revoke_res),
                ("sweep", sweep_res),
            ] {
                if let Err(e) = result {
                    errors.push(format!("{name}: {e}"));
                }
            }
            errors
        };

        match tokio::time::timeout(self.config.shutdown_flush_timeout, flush_all).await {
            Ok(errors) if errors.is_empty() => Ok(()),
            Ok(errors) => Err(AuthError::StorageError(errors.join("; "))),
            Err(_) => Err(AuthError::Cancelled),
        }
    }
}
