//! Fixed-rate tick scheduler
//!
//! Runs a [`HapticEngine`] on a dedicated OS thread at a fixed period
//! (1 kHz by default). Each tick reads the latest [`PointerSnapshot`] once,
//! steps the engine and sleeps until the next deadline. When a tick overruns
//! its deadline the schedule re-anchors on the current time rather than
//! firing a burst of catch-up ticks.
//!
//! Shutdown is cooperative: the flag is checked between ticks, so the
//! in-flight tick always completes before the engine is dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use spiketouch_core::sns::CHANNEL_COUNT;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::SchedulerConfig;
use crate::engine::HapticEngine;
use crate::error::{BridgeError, BridgeResult};
use crate::pointer::PointerSnapshot;

/// Counters from one scheduler run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Ticks completed
    pub ticks: u64,
    /// Spikes per channel
    pub spikes: [u64; CHANNEL_COUNT],
    /// Ticks that finished after their deadline
    pub overruns: u64,
}

/// Spawns the tick thread.
pub struct Scheduler;

impl Scheduler {
    /// Start ticking `engine` against snapshots from `pointer`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Scheduler`] if the tick period does not match the
    /// engine's encoder step, [`BridgeError::Network`] if the OS refuses to
    /// spawn the thread.
    pub fn spawn(
        mut engine: HapticEngine,
        pointer: watch::Receiver<PointerSnapshot>,
        config: SchedulerConfig,
    ) -> BridgeResult<SchedulerHandle> {
        let dt_us = engine.dt_ms() * 1000.0;
        if (dt_us - config.tick_us as f64).abs() >= 1.0 {
            return Err(BridgeError::Scheduler(format!(
                "tick period {} µs does not match encoder step {dt_us} µs",
                config.tick_us
            )));
        }

        let stop = Arc::new(AtomicBool::new(false));
        let ticks = Arc::new(AtomicU64::new(0));
        let period = Duration::from_micros(config.tick_us.max(1));

        let thread = {
            let stop = Arc::clone(&stop);
            let ticks = Arc::clone(&ticks);
            thread::Builder::new()
                .name("spiketouch-tick".to_string())
                .spawn(move || {
                    info!(period_us = config.tick_us, "Scheduler started");
                    let mut stats = SchedulerStats::default();
                    let mut deadline = Instant::now() + period;

                    while !stop.load(Ordering::Acquire) {
                        let snapshot = *pointer.borrow();
                        engine.tick(&snapshot);
                        stats.ticks += 1;
                        ticks.store(stats.ticks, Ordering::Relaxed);

                        let now = Instant::now();
                        if now < deadline {
                            thread::sleep(deadline - now);
                            deadline += period;
                        } else {
                            stats.overruns += 1;
                            debug!(
                                tick = stats.ticks,
                                late_us = (now - deadline).as_micros() as u64,
                                "Tick overrun"
                            );
                            deadline = now + period;
                        }
                    }

                    stats.spikes = engine.spike_counts();
                    info!(ticks = stats.ticks, overruns = stats.overruns, "Scheduler stopped");
                    stats
                })?
        };

        Ok(SchedulerHandle { stop, ticks, thread })
    }
}

/// Handle to a running tick thread.
#[derive(Debug)]
pub struct SchedulerHandle {
    stop: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    thread: JoinHandle<SchedulerStats>,
}

impl SchedulerHandle {
    /// Ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// True once the tick thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Stop after the in-flight tick and collect the run's counters.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Scheduler`] if the tick thread panicked.
    pub fn shutdown(self) -> BridgeResult<SchedulerStats> {
        self.stop.store(true, Ordering::Release);
        self.thread
            .join()
            .map_err(|_| BridgeError::Scheduler("tick thread panicked".to_string()))
    }
}
