use std::time::Duration;

use kleczewsky_world::{
    config::PerformanceOptions,
    perf::{PerformanceMonitor, Verdict},
};

fn frames(monitor: &mut PerformanceMonitor, millis: u64, count: usize) {
    for _ in 0..count {
        monitor.record_frame(Duration::from_millis(millis));
    }
}

#[test]
fn should_collect_before_judging() {
    let mut monitor = PerformanceMonitor::new(&PerformanceOptions::default());
    frames(&mut monitor, 16, 20);
    assert!((monitor.fps() - 62.5).abs() < 0.5);

    for _ in 0..3 {
        assert_eq!(monitor.sample(true), Verdict::Collecting);
    }
    assert_eq!(monitor.sample(true), Verdict::Healthy);
    assert_eq!(monitor.records().count(), 4);
}

#[test]
fn should_keep_a_bounded_window() {
    let mut monitor = PerformanceMonitor::new(&PerformanceOptions::default());
    frames(&mut monitor, 10, 20);
    for _ in 0..12 {
        monitor.sample(true);
    }
    assert_eq!(monitor.records().count(), 5);
}

#[test]
fn should_degrade_then_abort_when_slow() {
    let mut monitor = PerformanceMonitor::new(&PerformanceOptions::default());
    frames(&mut monitor, 100, 20);

    for _ in 0..3 {
        assert_eq!(monitor.sample(true), Verdict::Collecting);
    }
    assert_eq!(monitor.sample(true), Verdict::Degrade);
    assert_eq!(monitor.records().count(), 0);

    for _ in 0..3 {
        assert_eq!(monitor.sample(false), Verdict::Collecting);
    }
    assert_eq!(monitor.sample(false), Verdict::Abort);
}

#[test]
fn should_recover_when_frames_speed_up() {
    let mut monitor = PerformanceMonitor::new(&PerformanceOptions::default());
    frames(&mut monitor, 100, 20);
    for _ in 0..4 {
        monitor.sample(true);
    }
    frames(&mut monitor, 8, 20);
    let verdicts: Vec<_> = (0..4).map(|_| monitor.sample(false)).collect();
    assert_eq!(verdicts.last(), Some(&Verdict::Healthy));
}
