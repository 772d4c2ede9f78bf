use kleczewsky_world::schedule::{Debounce, Throttle, Timers};

#[test]
fn should_fire_timers_in_due_order() {
    let mut timers = Timers::new();
    timers.schedule(1.0, "a");
    timers.schedule(0.5, "b");
    timers.schedule(1.0, "c");

    assert_eq!(timers.advance(0.6), vec!["b"]);
    assert_eq!(timers.pending(), 2);
    assert_eq!(timers.advance(0.4), vec!["a", "c"]);
    assert!(timers.advance(10.0).is_empty());
}

#[test]
fn should_cancel_timers() {
    let mut timers = Timers::new();
    let first = timers.schedule(1.0, 1);
    timers.schedule(1.0, 2);
    timers.schedule(1.0, 3);

    assert!(timers.cancel(first));
    assert!(!timers.cancel(first));
    assert_eq!(timers.cancel_where(|n| *n == 3), 1);
    assert_eq!(timers.advance(1.0), vec![2]);
}

#[test]
fn trailing_debounce_restarts_on_every_call() {
    let mut debounce = Debounce::new(1.0);
    assert!(!debounce.call());
    assert!(!debounce.advance(0.5));
    assert!(!debounce.call());
    assert!(!debounce.advance(0.9));
    assert!(debounce.is_pending());
    assert!(debounce.advance(0.1));
    assert!(!debounce.is_pending());
    assert!(!debounce.advance(5.0));
}

#[test]
fn leading_debounce_fires_once_per_burst() {
    let mut debounce = Debounce::with_edges(1.0, true, false);
    assert!(debounce.call());
    assert!(!debounce.call());
    assert!(!debounce.advance(1.0));
    assert!(debounce.call());
}

#[test]
fn leading_and_trailing_debounce_needs_a_second_call_to_trail() {
    let mut debounce = Debounce::with_edges(1.0, true, true);
    assert!(debounce.call());
    assert!(!debounce.advance(1.0));

    assert!(debounce.call());
    assert!(!debounce.call());
    assert!(debounce.advance(1.0));
}

#[test]
fn cancelled_debounce_never_fires() {
    let mut debounce = Debounce::new(1.0);
    debounce.call();
    debounce.cancel();
    assert!(!debounce.advance(2.0));
}

#[test]
fn throttle_coalesces_calls_into_one_trailing_fire() {
    let mut throttle = Throttle::new(0.3);
    assert!(throttle.call());
    assert!(!throttle.call());
    assert!(!throttle.call());

    assert!(!throttle.advance(0.2));
    assert!(throttle.advance(0.1));
    // the trailing fire reopened the window; nothing queued in it
    assert!(!throttle.advance(0.3));
    assert!(throttle.call());
}

#[test]
fn timers_keep_firing_after_a_long_session() {
    let mut timers = Timers::new();
    timers.advance(600_000.0);
    timers.schedule(5.0, "idle");

    let mut frames = 0;
    while timers.advance(1.0 / 60.0).is_empty() {
        frames += 1;
        assert!(frames < 20 * 60, "timer never fired");
    }
    assert!((298..=300).contains(&frames), "fired after {} frames", frames);
}
