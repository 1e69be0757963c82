//! Background polling of sensor series.
//!
//! A [`Poller`] spawns one task per sensor. Each task calls
//! [`ResilienceController::current_series`] on a fixed interval and publishes
//! a [`PollEvent`] on a broadcast channel. Tasks run until [`Poller::stop`]
//! is called or the poller is dropped.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use airq_types::{Provenance, SensorId};

use crate::controller::ResilienceController;
use crate::error::{Error, Result};
use crate::traits::{CatalogRepository, RemoteSource, SeriesRepository};

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Consecutive failures logged at warn level before the poller goes quiet.
const LOUD_FAILURES: u32 = 3;

/// Result of one poll of one sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollEvent {
    pub sensor_id: SensorId,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
    pub outcome: PollOutcome,
}

/// What a poll produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PollOutcome {
    /// A series was returned, live or from the cache.
    Updated {
        provenance: Provenance,
        samples: usize,
    },
    /// Neither the remote nor the cache could answer.
    Failed { message: String },
}

impl PollOutcome {
    fn is_live(&self) -> bool {
        matches!(
            self,
            PollOutcome::Updated {
                provenance: Provenance::Live,
                ..
            }
        )
    }
}

/// Periodic poller over a shared controller.
pub struct Poller<S, R> {
    controller: Arc<ResilienceController<S, R>>,
    events_tx: broadcast::Sender<PollEvent>,
    stop_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl<S, R> Poller<S, R>
where
    S: RemoteSource + 'static,
    R: SeriesRepository + CatalogRepository + 'static,
{
    /// Create an idle poller.
    pub fn new(controller: Arc<ResilienceController<S, R>>) -> Self {
        Self::with_buffer(controller, DEFAULT_EVENT_BUFFER)
    }

    /// Create an idle poller whose event channel holds `buffer` events.
    pub fn with_buffer(controller: Arc<ResilienceController<S, R>>, buffer: usize) -> Self {
        let (events_tx, _) = broadcast::channel(buffer.max(1));
        let (stop_tx, _) = watch::channel(false);
        Self {
            controller,
            events_tx,
            stop_tx,
            handles: Vec::new(),
        }
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.events_tx.subscribe()
    }

    /// Whether any polling task is still alive.
    pub fn is_running(&self) -> bool {
        self.handles.iter().any(|h| !h.is_finished())
    }

    /// Start polling `sensors` every `every`. The first poll happens at once.
    ///
    /// Calling `start` again adds more tasks; sensors already being polled
    /// are polled twice. A zero interval is rejected with
    /// [`Error::InvalidConfig`].
    pub fn start(&mut self, sensors: &[SensorId], every: Duration) -> Result<()> {
        if every.is_zero() {
            return Err(Error::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if sensors.is_empty() {
            info!("No sensors configured for polling");
            return Ok(());
        }

        self.stop_tx.send_replace(false);
        info!(
            "Starting poller for {} sensor(s) every {:?}",
            sensors.len(),
            every
        );

        for &sensor_id in sensors {
            let controller = Arc::clone(&self.controller);
            let events_tx = self.events_tx.clone();
            let stop_rx = self.stop_tx.subscribe();
            self.handles.push(tokio::spawn(poll_sensor(
                controller, sensor_id, every, events_tx, stop_rx,
            )));
        }
        Ok(())
    }

    /// Signal every task to stop and wait for them to finish.
    pub async fn stop(&mut self) {
        self.stop_tx.send_replace(true);
        for result in join_all(self.handles.drain(..)).await {
            if let Err(e) = result {
                warn!("Poll task ended abnormally: {}", e);
            }
        }
        debug!("Poller stopped");
    }
}

impl<S, R> Drop for Poller<S, R> {
    fn drop(&mut self) {
        self.stop_tx.send_replace(true);
    }
}

async fn poll_sensor<S, R>(
    controller: Arc<ResilienceController<S, R>>,
    sensor_id: SensorId,
    every: Duration,
    events_tx: broadcast::Sender<PollEvent>,
    mut stop_rx: watch::Receiver<bool>,
) where
    S: RemoteSource,
    R: SeriesRepository + CatalogRepository,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut consecutive_failures = 0u32;

    loop {
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        let outcome = match controller.current_series(sensor_id).await {
            Ok(series) => PollOutcome::Updated {
                provenance: series.provenance,
                samples: series.data.len(),
            },
            Err(e) => PollOutcome::Failed {
                message: e.to_string(),
            },
        };

        if outcome.is_live() {
            if consecutive_failures > 0 {
                info!(
                    "Sensor {} live again after {} failed polls",
                    sensor_id, consecutive_failures
                );
            }
            consecutive_failures = 0;
        } else {
            consecutive_failures += 1;
            if consecutive_failures <= LOUD_FAILURES {
                warn!(
                    "Poll of sensor {} not live: {:?} (attempt {})",
                    sensor_id, outcome, consecutive_failures
                );
            } else if consecutive_failures == LOUD_FAILURES + 1 {
                error!(
                    "Sensor {} not live after {} polls, will continue trying silently",
                    sensor_id, consecutive_failures
                );
            }
        }

        // No subscribers is fine.
        let _ = events_tx.send(PollEvent {
            sensor_id,
            at: OffsetDateTime::now_utc(),
            outcome,
        });
    }

    debug!("Poll task for sensor {} exiting", sensor_id);
}
