//! Periodic and on-demand refresh loop around a [`ScannerService`].

use crate::aggregate::ViewParams;
use crate::api::{DashboardApi, RefreshResponse};
use crate::service::ScannerService;
use anyhow::{anyhow, Result};
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Venues rate-limit public endpoints; cycles are never closer than this.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

const CHANNEL_CAPACITY: usize = 8;

pub struct Scheduler {
    service: ScannerService,
    params: ViewParams,
    interval: Duration,
    refresh_rx: Receiver<()>,
    shutdown_rx: Receiver<()>,
    output_tx: Sender<Result<RefreshResponse>>,
}

/// Control side of a running [`Scheduler`]. Dropping every handle stops it.
#[derive(Clone)]
pub struct SchedulerHandle {
    refresh_tx: Sender<()>,
    shutdown_tx: Sender<()>,
}

impl SchedulerHandle {
    /// Requests a cycle outside the regular cadence.
    pub async fn refresh_now(&self) -> Result<()> {
        self.refresh_tx
            .send(())
            .await
            .map_err(|_| anyhow!("scheduler is no longer running"))
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| anyhow!("scheduler is no longer running"))
    }
}

impl Scheduler {
    /// Builds a scheduler together with its control handle and the receiver
    /// of every cycle outcome. `interval` is raised to
    /// [`MIN_REFRESH_INTERVAL`] when shorter.
    pub fn new(
        service: ScannerService,
        params: ViewParams,
        interval: Duration,
    ) -> (Self, SchedulerHandle, Receiver<Result<RefreshResponse>>) {
        if interval < MIN_REFRESH_INTERVAL {
            log::warn!(
                "Refresh interval {:?} is below the {:?} floor, using the floor",
                interval,
                MIN_REFRESH_INTERVAL
            );
        }
        let (refresh_tx, refresh_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (output_tx, output_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let scheduler = Self {
            service,
            params,
            interval: interval.max(MIN_REFRESH_INTERVAL),
            refresh_rx,
            shutdown_rx,
            output_tx,
        };
        let handle = SchedulerHandle {
            refresh_tx,
            shutdown_tx,
        };
        (scheduler, handle, output_rx)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs one cycle immediately, then on every tick or manual request until
    /// shut down.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_rx.recv() => {
                    log::info!("Scheduler shutting down.");
                    break;
                }
                Some(()) = self.refresh_rx.recv() => {
                    log::debug!("Manual refresh requested");
                    ticker.reset();
                }
                _ = ticker.tick() => {}
            }

            let outcome = self.service.refresh(&self.params).await;
            if let Err(e) = &outcome {
                log::error!("Refresh cycle failed: {:#}", e);
            }
            if self.output_tx.send(outcome).await.is_err() {
                log::info!("Refresh receiver dropped, scheduler stopping.");
                break;
            }
        }
    }
}
