//! Integration tests for the frame pacer.
//!
//! The pacer takes `now` explicitly, so these tests build their own
//! timelines instead of sleeping.

use std::time::{Duration, Instant};

use asciiarena_tick::{FramePacer, PacerConfig};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// =========================================================================
// PacerConfig
// =========================================================================

#[test]
fn test_default_rate_is_sixty() {
    let cfg = PacerConfig::default();
    assert_eq!(cfg.frame_rate, 60);
    assert_eq!(cfg.frame_budget(), Duration::from_secs_f64(1.0 / 60.0));
}

#[test]
fn test_validated_clamps_rate() {
    assert_eq!(PacerConfig::with_rate(500).validated().frame_rate, PacerConfig::MAX_FRAME_RATE);
    assert_eq!(PacerConfig::with_rate(0).validated().frame_rate, 1);
}

#[test]
fn test_validated_orders_thresholds() {
    let cfg = PacerConfig {
        budget_warn_threshold: 1.5,
        budget_critical_threshold: 0.5,
        ..PacerConfig::default()
    }
    .validated();
    assert_eq!(cfg.budget_critical_threshold, 0.5);
    assert_eq!(cfg.budget_warn_threshold, 0.5);
}

// =========================================================================
// Delays
// =========================================================================

#[test]
fn test_first_frame_waits_a_full_budget() {
    let mut pacer = FramePacer::with_rate(20);
    assert_eq!(pacer.budget(), ms(50));
    assert_eq!(pacer.next_delay_at(Instant::now()), ms(50));
}

#[test]
fn test_computation_time_is_subtracted() {
    let mut pacer = FramePacer::with_rate(20);
    let t0 = Instant::now();
    let first = pacer.next_delay_at(t0);

    // Slept the full 50 ms, then spent 10 ms computing.
    let t1 = t0 + first + ms(10);
    assert_eq!(pacer.next_delay_at(t1), ms(40));

    // Slept 40 ms, computed 30 ms.
    let t2 = t1 + ms(40) + ms(30);
    assert_eq!(pacer.next_delay_at(t2), ms(20));
}

#[test]
fn test_delay_is_never_negative() {
    let mut pacer = FramePacer::with_rate(20);
    let t0 = Instant::now();
    pacer.next_delay_at(t0);

    // A frame that took twice the budget.
    let t1 = t0 + ms(50) + ms(100);
    assert_eq!(pacer.next_delay_at(t1), Duration::ZERO);
    assert_eq!(pacer.metrics().total_overruns, 1);

    // A clock that did not advance at all.
    assert_eq!(pacer.next_delay_at(t1), ms(50));
}

#[test]
fn test_early_wakeup_does_not_exceed_budget() {
    let mut pacer = FramePacer::with_rate(20);
    let t0 = Instant::now();
    pacer.next_delay_at(t0);

    // The timer fired 20 ms early: elapsed is shorter than the sleep.
    let t1 = t0 + ms(30);
    assert_eq!(pacer.next_delay_at(t1), ms(50));
}

#[test]
fn test_reset_restarts_measurement() {
    let mut pacer = FramePacer::with_rate(20);
    let t0 = Instant::now();
    pacer.next_delay_at(t0);
    pacer.reset();

    // Long gap between rounds is not mistaken for a slow frame.
    let t1 = t0 + Duration::from_secs(3);
    assert_eq!(pacer.next_delay_at(t1), ms(50));
    assert_eq!(pacer.metrics().total_overruns, 0);
    assert_eq!(pacer.frame_count(), 2);
}

// =========================================================================
// Metrics
// =========================================================================

#[test]
fn test_metrics_track_max_and_utilization() {
    let mut pacer = FramePacer::with_rate(20);
    let t0 = Instant::now();
    pacer.next_delay_at(t0);
    let t1 = t0 + ms(50) + ms(10);
    pacer.next_delay_at(t1);
    let t2 = t1 + ms(40) + ms(25);
    pacer.next_delay_at(t2);

    let metrics = pacer.metrics();
    assert_eq!(metrics.total_frames, 2);
    assert_eq!(metrics.max_frame_time, ms(25));
    assert!((metrics.budget_utilization - 0.5).abs() < 1e-9);
    assert!(metrics.avg_frame_time > Duration::ZERO);
}

#[test]
fn test_metrics_can_be_disabled() {
    let mut pacer = FramePacer::new(PacerConfig {
        frame_rate: 20,
        metrics_enabled: false,
        ..PacerConfig::default()
    });
    let t0 = Instant::now();
    pacer.next_delay_at(t0);
    pacer.next_delay_at(t0 + ms(200));
    assert_eq!(pacer.metrics().total_frames, 0);
    assert_eq!(pacer.frame_count(), 2);
}
