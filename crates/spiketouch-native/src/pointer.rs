//! Pointer tracking and snapshot handoff
//!
//! The input side (UI thread, scripted driver) owns a [`PointerTracker`] and
//! feeds it press, release and move events. After each event the tracker
//! publishes a complete [`PointerSnapshot`] over a `tokio::sync::watch`
//! channel. The tick loop borrows the latest snapshot once per tick, so it
//! never sees a half-updated speed/press pair.

use std::time::{Duration, Instant};

use spiketouch_core::math::{pointer_speed, SpeedAverage};
use tokio::sync::watch;

use crate::config::PointerConfig;

/// Samples in the running speed average
pub const SPEED_WINDOW: usize = 10;

/// Pointer state as seen by one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerSnapshot {
    /// Instantaneous speed (px/s)
    pub speed: f64,
    /// Running mean of recent speeds (px/s)
    pub avg_speed: f64,
    /// Button or finger down
    pub pressed: bool,
}

/// Single writer of pointer snapshots.
#[derive(Debug)]
pub struct PointerTracker {
    config: PointerConfig,
    tx: watch::Sender<PointerSnapshot>,
    last: Option<(f64, f64, Instant)>,
    window: SpeedAverage<SPEED_WINDOW>,
    snapshot: PointerSnapshot,
}

impl PointerTracker {
    /// Create a tracker and the receiver the tick loop reads from
    pub fn new(config: PointerConfig) -> (Self, watch::Receiver<PointerSnapshot>) {
        let (tx, rx) = watch::channel(PointerSnapshot::default());
        let tracker = Self {
            config,
            tx,
            last: None,
            window: SpeedAverage::new(),
            snapshot: PointerSnapshot::default(),
        };
        (tracker, rx)
    }

    /// Another receiver for the same snapshots
    pub fn subscribe(&self) -> watch::Receiver<PointerSnapshot> {
        self.tx.subscribe()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PointerSnapshot {
        self.snapshot
    }

    /// Press at `(x, y)` now
    pub fn press(&mut self, x: f64, y: f64) {
        self.press_at(x, y, Instant::now());
    }

    /// Press at `(x, y)` at time `at`. Clears speed history.
    pub fn press_at(&mut self, x: f64, y: f64, at: Instant) {
        self.window.clear();
        self.last = Some((x, y, at));
        self.snapshot = PointerSnapshot {
            speed: 0.0,
            avg_speed: 0.0,
            pressed: true,
        };
        self.publish();
    }

    /// Release. Speed drops to 0.
    pub fn release(&mut self) {
        self.window.clear();
        self.snapshot = PointerSnapshot::default();
        self.publish();
    }

    /// Move to `(x, y)` now
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.move_to_at(x, y, Instant::now());
    }

    /// Move to `(x, y)` at time `at`.
    ///
    /// Moves arriving less than `min_interval_ms` after the last accepted
    /// one are coalesced into the next.
    pub fn move_to_at(&mut self, x: f64, y: f64, at: Instant) {
        let Some((last_x, last_y, last_at)) = self.last else {
            self.last = Some((x, y, at));
            return;
        };

        let dt = at.saturating_duration_since(last_at);
        if dt < Duration::from_secs_f64(self.config.min_interval_ms.max(0.0) / 1000.0) {
            return;
        }

        let speed = pointer_speed(x - last_x, y - last_y, dt.as_secs_f64()).min(self.config.max_speed);
        self.snapshot.speed = speed;
        self.snapshot.avg_speed = self.window.push(speed);
        self.last = Some((x, y, at));
        self.publish();
    }

    /// Zero the speed if no move was accepted within `stop_threshold_ms` of
    /// `now`. Returns true when the speed was zeroed.
    pub fn check_stopped(&mut self, now: Instant) -> bool {
        let Some((_, _, last_at)) = self.last else {
            return false;
        };
        let idle = now.saturating_duration_since(last_at).as_secs_f64() * 1000.0;
        if self.snapshot.speed > 0.0 && idle >= self.config.stop_threshold_ms {
            self.snapshot.speed = 0.0;
            self.publish();
            return true;
        }
        false
    }

    fn publish(&self) {
        self.tx.send_replace(self.snapshot);
    }
}
