//! Adaptive frame pacing with budget monitoring.
//!
//! The game loop computes a frame, then asks the pacer how long to sleep
//! before the next one:
//!
//! ```text
//! computation = (now − last_tick) − last_sleep
//! delay       = max(0, budget − computation)
//! ```
//!
//! where `budget = 1 / frame_rate`. A slow frame shortens the following
//! sleep; a frame slower than the whole budget is followed by no sleep at
//! all. The delay is never negative.

use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the frame pacer.
#[derive(Debug, Clone)]
pub struct PacerConfig {
    /// Target frames per second.
    pub frame_rate: u32,
    /// Budget warning threshold (0.0–1.0). Default: 0.80 (80%).
    pub budget_warn_threshold: f64,
    /// Budget critical threshold (0.0–1.0). Default: 1.0 (100%).
    pub budget_critical_threshold: f64,
    /// Enable per-frame metrics collection.
    pub metrics_enabled: bool,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            frame_rate: Self::DEFAULT_FRAME_RATE,
            budget_warn_threshold: 0.80,
            budget_critical_threshold: 1.0,
            metrics_enabled: true,
        }
    }
}

impl PacerConfig {
    pub const DEFAULT_FRAME_RATE: u32 = 60;
    pub const MAX_FRAME_RATE: u32 = 128;

    pub fn with_rate(frame_rate: u32) -> Self {
        Self {
            frame_rate,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// - `frame_rate` is kept within `1..=MAX_FRAME_RATE`.
    /// - Thresholds are clamped to `0.0..=1.0`, warn ≤ critical.
    pub fn validated(mut self) -> Self {
        if self.frame_rate > Self::MAX_FRAME_RATE {
            warn!(
                rate = self.frame_rate,
                max = Self::MAX_FRAME_RATE,
                "frame rate exceeds maximum, clamping"
            );
            self.frame_rate = Self::MAX_FRAME_RATE;
        }
        if self.frame_rate == 0 {
            warn!("frame rate of zero, using 1");
            self.frame_rate = 1;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self.budget_critical_threshold = self.budget_critical_threshold.clamp(0.0, 1.0);
        if self.budget_warn_threshold > self.budget_critical_threshold {
            self.budget_warn_threshold = self.budget_critical_threshold;
        }
        self
    }

    /// Time available for one frame.
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Runtime metrics for the pacer. All timings are computation time, i.e.
/// the part of a frame interval not spent sleeping.
#[derive(Debug, Clone, Default)]
pub struct PacerMetrics {
    /// Frames with a measured computation time.
    pub total_frames: u64,
    /// Frames whose computation exceeded the whole budget.
    pub total_overruns: u64,
    /// Exponential moving average of computation time (α = 0.1).
    pub avg_frame_time: Duration,
    /// Longest computation time observed.
    pub max_frame_time: Duration,
    /// Last budget utilization (0.0–∞). >1.0 means overrun.
    pub budget_utilization: f64,
}

// ---------------------------------------------------------------------------
// Pacer
// ---------------------------------------------------------------------------

/// Computes the delay before each frame.
pub struct FramePacer {
    config: PacerConfig,
    budget: Duration,
    last_tick: Option<Instant>,
    last_sleep: Duration,
    frame_count: u64,
    metrics: PacerMetrics,
}

impl FramePacer {
    pub fn new(config: PacerConfig) -> Self {
        let config = config.validated();
        let budget = config.frame_budget();
        debug!(
            rate = config.frame_rate,
            budget_ms = budget.as_secs_f64() * 1000.0,
            "frame pacer created"
        );
        Self {
            config,
            budget,
            last_tick: None,
            last_sleep: Duration::ZERO,
            frame_count: 0,
            metrics: PacerMetrics::default(),
        }
    }

    pub fn with_rate(frame_rate: u32) -> Self {
        Self::new(PacerConfig::with_rate(frame_rate))
    }

    /// Records a frame computed at `now` and returns how long to wait
    /// before the next one.
    ///
    /// The first frame after creation or [`reset`](Self::reset) has
    /// nothing to measure and waits one full budget. Measuring from a zero
    /// timestamp instead would make that first delay zero and let the
    /// second frame of a round follow the first immediately.
    pub fn next_delay_at(&mut self, now: Instant) -> Duration {
        let computation = match self.last_tick {
            Some(last) => now.saturating_duration_since(last).saturating_sub(self.last_sleep),
            None => Duration::ZERO,
        };
        let delay = self.budget.saturating_sub(computation);

        self.frame_count += 1;
        if self.last_tick.is_some() {
            self.observe(computation);
        }
        self.last_tick = Some(now);
        self.last_sleep = delay;

        trace!(frame = self.frame_count, delay_us = delay.as_micros() as u64, "frame paced");
        delay
    }

    /// [`next_delay_at`](Self::next_delay_at) with the current time.
    pub fn next_delay(&mut self) -> Duration {
        self.next_delay_at(Instant::now())
    }

    /// Forgets the last frame. Call when the frame sequence restarts.
    pub fn reset(&mut self) {
        self.last_tick = None;
        self.last_sleep = Duration::ZERO;
    }

    fn observe(&mut self, computation: Duration) {
        let utilization = computation.as_secs_f64() / self.budget.as_secs_f64();
        self.metrics.budget_utilization = utilization;

        if utilization >= self.config.budget_critical_threshold {
            warn!(
                frame = self.frame_count,
                elapsed_ms = computation.as_secs_f64() * 1000.0,
                budget_ms = self.budget.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "CRITICAL: frame exceeded budget"
            );
        } else if utilization >= self.config.budget_warn_threshold {
            warn!(
                frame = self.frame_count,
                elapsed_ms = computation.as_secs_f64() * 1000.0,
                budget_ms = self.budget.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "frame approaching budget limit"
            );
        }

        if !self.config.metrics_enabled {
            return;
        }
        self.metrics.total_frames += 1;
        if computation > self.budget {
            self.metrics.total_overruns += 1;
        }
        if computation > self.metrics.max_frame_time {
            self.metrics.max_frame_time = computation;
        }
        let alpha = 0.1;
        let prev = self.metrics.avg_frame_time.as_secs_f64();
        let curr = computation.as_secs_f64();
        self.metrics.avg_frame_time = Duration::from_secs_f64(prev * (1.0 - alpha) + curr * alpha);
    }

    pub fn frame_rate(&self) -> u32 {
        self.config.frame_rate
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Frames paced since creation.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn metrics(&self) -> &PacerMetrics {
        &self.metrics
    }
}
