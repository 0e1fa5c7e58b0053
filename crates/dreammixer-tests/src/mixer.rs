//! End-to-end mixer behavior over the builtin catalog.

use crate::support::activated;
use dreammixer_core::effective_gain;

#[test]
fn builtin_catalog_round_trip() {
    let h = activated();
    let snap = h.engine.snapshot();
    assert_eq!(snap.channels.len(), 7);
    assert_eq!(
        snap.channels.iter().filter(|c| c.available).count(),
        6,
        "placeholder slot is not available"
    );
    assert_eq!(snap.master_volume.percent(), 70);
}

#[test]
fn rain_channel_full_lifecycle() {
    let mut h = activated();

    h.engine.toggle("rain");
    h.loads.complete_all();
    h.engine.pump();
    let snap = h.engine.snapshot();
    assert!(snap.channel("rain").unwrap().playing);
    assert_eq!(snap.channel("rain").unwrap().volume.percent(), 20);

    h.engine.set_volume("rain", 0);
    let snap = h.engine.snapshot();
    assert!(!snap.channel("rain").unwrap().playing);
    assert_eq!(snap.channel("rain").unwrap().volume.percent(), 0);

    let before = h.engine.snapshot();
    h.engine.toggle("empty1");
    let after = h.engine.snapshot();
    assert_eq!(before.playing_count, after.playing_count);
    assert_eq!(
        serde_json::to_string(&before.channels).unwrap(),
        serde_json::to_string(&after.channels).unwrap()
    );
}

#[test]
fn fire_scenario_effective_gain() {
    let mut h = activated();
    h.engine.set_volume("fire", 40);
    h.loads.complete_all();
    h.engine.pump();
    h.engine.set_master_volume(50);

    let snap = h.engine.snapshot();
    assert!(snap.channel("fire").unwrap().playing);
    let gain = snap.effective_gain("fire").unwrap();
    assert!((gain - 0.20).abs() < 1e-6);
}

#[test]
fn mixing_several_channels_and_panic_button() {
    let mut h = activated();
    for (id, vol) in [("fire", 30), ("rain", 60), ("wind", 45)] {
        h.engine.set_volume(id, vol);
    }
    h.loads.complete_all();
    h.engine.pump();

    let snap = h.engine.snapshot();
    assert_eq!(snap.playing_count, 3);
    assert_eq!(h.output.voice_count(), 3);

    h.engine.stop_all();
    h.output.finish_ramps();
    h.engine.pump();

    let snap = h.engine.snapshot();
    assert_eq!(snap.playing_count, 0);
    for view in &snap.channels {
        assert!(!view.playing);
        assert_eq!(view.volume.percent(), 0);
    }
}

#[test]
fn volume_sequences_are_last_writer_wins() {
    let mut h = activated();
    for v in [10u8, 90, 0, 35] {
        h.engine.set_volume("river", v);
    }
    h.loads.complete_all();
    h.engine.pump();

    let snap = h.engine.snapshot();
    let river = snap.channel("river").unwrap();
    assert_eq!(river.volume.percent(), 35);
    assert!(river.playing);
}

#[test]
fn effective_gain_matches_contract_formula() {
    let mut h = activated();
    h.engine.set_volume("nature", 50);
    h.loads.complete_all();
    h.engine.pump();

    let snap = h.engine.snapshot();
    let expected = effective_gain(
        snap.channel("nature").unwrap().volume,
        snap.master_volume,
    );
    assert!((expected - 0.35).abs() < 1e-6);
    assert!((h.output.voice(0).gain - expected).abs() < 1e-6);
}

#[test]
fn snapshot_is_serializable_for_the_ui() {
    let mut h = activated();
    h.engine.toggle("wind");
    h.loads.complete_all();
    h.engine.pump();

    let json = serde_json::to_value(h.engine.snapshot()).unwrap();
    assert_eq!(json["master_volume"], 70);
    assert_eq!(json["playing_count"], 1);
    assert_eq!(json["activation"], "Ready");
}
