use serde::Serialize;
use std::time::{Duration, Instant};

/// Collects diagnostic statistics for a sampling session.
pub struct SamplingStats {
    tick_count: u64,
    drop_count: u64,
    cycle_count: u64,
    grab_failures: u64,
    inference_failures: u64,
    handoff_count: u64,
    render_count: u64,
    render_failures: u64,
    start_time: Instant,
    latency_us: u64,
}

/// Snapshot of sampling stats for logging and serialisation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingSnapshot {
    pub tick_count: u64,
    pub drop_count: u64,
    pub drop_rate: f64,
    pub cycle_count: u64,
    pub cycle_rate: f64,
    pub grab_failures: u64,
    pub inference_failures: u64,
    pub handoff_count: u64,
    pub render_count: u64,
    pub render_failures: u64,
    pub latency_ms: f64,
}

impl SamplingStats {
    /// Create new stats with zeroed counters.
    pub fn new() -> Self {
        Self {
            tick_count: 0,
            drop_count: 0,
            cycle_count: 0,
            grab_failures: 0,
            inference_failures: 0,
            handoff_count: 0,
            render_count: 0,
            render_failures: 0,
            start_time: Instant::now(),
            latency_us: 0,
        }
    }

    /// Record a tick that started a cycle.
    pub fn record_cycle_start(&mut self) {
        self.tick_count += 1;
        self.cycle_count += 1;
    }

    /// Record a tick dropped because a cycle was in flight.
    pub fn record_drop(&mut self) {
        self.tick_count += 1;
        self.drop_count += 1;
    }

    pub fn record_grab_failure(&mut self) {
        self.grab_failures += 1;
    }

    pub fn record_inference_failure(&mut self) {
        self.inference_failures += 1;
    }

    /// Record a successful inference and its latency.
    pub fn record_inference(&mut self, latency: Duration) {
        self.latency_us = latency.as_micros() as u64;
    }

    /// Record a batch handed to the overlay thread.
    pub fn record_handoff(&mut self) {
        self.handoff_count += 1;
    }

    pub fn record_render(&mut self) {
        self.render_count += 1;
    }

    pub fn record_render_failure(&mut self) {
        self.render_failures += 1;
    }

    /// Cycles started per second since the stats were created or reset.
    pub fn cycle_rate(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed < 0.001 {
            return 0.0;
        }
        self.cycle_count as f64 / elapsed
    }

    /// Dropped ticks as a percentage of all ticks (0.0 - 100.0).
    pub fn drop_rate(&self) -> f64 {
        if self.tick_count == 0 {
            return 0.0;
        }
        (self.drop_count as f64 / self.tick_count as f64) * 100.0
    }

    /// Latest inference latency in milliseconds.
    pub fn latency_ms(&self) -> f64 {
        self.latency_us as f64 / 1000.0
    }

    /// Reset all counters.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Take a serialisable snapshot.
    pub fn snapshot(&self) -> SamplingSnapshot {
        SamplingSnapshot {
            tick_count: self.tick_count,
            drop_count: self.drop_count,
            drop_rate: self.drop_rate(),
            cycle_count: self.cycle_count,
            cycle_rate: self.cycle_rate(),
            grab_failures: self.grab_failures,
            inference_failures: self.inference_failures,
            handoff_count: self.handoff_count,
            render_count: self.render_count,
            render_failures: self.render_failures,
            latency_ms: self.latency_ms(),
        }
    }
}

impl Default for SamplingStats {
    fn default() -> Self {
        Self::new()
    }
}
