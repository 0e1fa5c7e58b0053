//! Gesture gating, deferred intents, and suspend/resume across the stack.

use std::time::Duration;

use crate::support::{activated, unactivated};
use dreammixer_audio::ActivationState;

#[test]
fn nothing_plays_before_the_first_gesture() {
    let mut h = unactivated();
    h.engine.toggle("rain");
    h.engine.toggle("fire");
    h.engine.pump();

    let snap = h.engine.snapshot();
    assert_eq!(snap.activation, ActivationState::Uninitialized);
    assert_eq!(snap.playing_count, 0);
    assert_eq!(h.loads.pending_count(), 0);
    assert_eq!(h.output.voice_count(), 0);
}

#[test]
fn first_gesture_replays_deferred_intents_in_order() {
    let mut h = unactivated();
    h.engine.toggle("rain");
    h.engine.set_volume("rain", 65);

    h.engine.on_user_gesture();
    h.loads.complete_all();
    h.engine.pump();

    let snap = h.engine.snapshot();
    assert_eq!(snap.activation, ActivationState::Ready);
    let rain = snap.channel("rain").unwrap();
    assert!(rain.playing);
    // The later set_volume wins over the toggle's default.
    assert_eq!(rain.volume.percent(), 65);
}

#[test]
fn suspend_is_visible_and_resume_is_transparent() {
    let mut h = activated();
    h.engine.toggle("whitenoise");
    h.loads.complete_all();
    h.engine.pump();

    h.output.suspend();
    h.engine.pump();
    assert_eq!(h.engine.snapshot().activation, ActivationState::Suspended);

    // The next audible intent resumes first, then proceeds.
    h.engine.set_volume("whitenoise", 80);
    let snap = h.engine.snapshot();
    assert_eq!(snap.activation, ActivationState::Ready);
    assert_eq!(snap.channel("whitenoise").unwrap().volume.percent(), 80);
    assert_eq!(h.output.resume_calls(), 1);
}

#[test]
fn failed_resume_drops_the_operation_but_not_the_process() {
    let mut h = activated();
    h.engine.toggle("river");
    h.loads.complete_all();
    h.engine.pump();

    h.output.suspend();
    h.output.set_fail_resume(true);
    h.engine.pump();

    h.engine.toggle("fire");
    let snap = h.engine.snapshot();
    assert_eq!(snap.activation, ActivationState::Suspended);
    assert!(!snap.channel("fire").unwrap().playing);

    // Host recovers; the user tries again and it works.
    h.output.set_fail_resume(false);
    h.engine.toggle("fire");
    h.loads.complete_all();
    h.engine.pump();
    assert!(h.engine.snapshot().channel("fire").unwrap().playing);
}

#[test]
fn manual_clock_drives_activation_backoff() {
    // The backoff schedule runs entirely on the injected clock; this test
    // performs no real sleeps.
    let mut h = unactivated();
    h.engine.on_user_gesture();
    // First construction succeeded in this harness, so no retries pend.
    assert_eq!(h.engine.snapshot().activation, ActivationState::Ready);

    h.clock.advance(Duration::from_secs(60));
    h.engine.pump();
    assert_eq!(h.engine.snapshot().activation, ActivationState::Ready);
}
