//! Press, release and motion gating through the public encoder API.

use spiketouch_core::sns::{Channel, EncoderConfig, StimulusEncoder};

fn fires_within(encoder: &mut StimulusEncoder, ticks: usize, pressed: bool) -> bool {
    (0..ticks).any(|_| encoder.step(0.0, 0.0, 1.0, pressed).fired(Channel::Click))
}

/// A press edge and a release edge each open a click burst that fires
/// inside its sustain window.
#[test]
fn press_then_release_clicks_twice() {
    let mut encoder = StimulusEncoder::new();
    let window = encoder.config().sustain_ticks as usize + 2;

    encoder.set_pressure_input(12.0);
    assert!(fires_within(&mut encoder, window, true));

    // Settle the click channel back to rest while held
    for _ in 0..100 {
        encoder.step(0.0, 0.0, 1.0, true);
    }
    assert_eq!(encoder.click_sustain_remaining(), 0);

    encoder.set_pressure_input(0.0);
    assert!(fires_within(&mut encoder, window, false));
}

/// The burst counter counts down one per tick and the click `d` is back at
/// baseline the tick after it reaches zero.
#[test]
fn sustain_counter_counts_down() {
    let config = EncoderConfig::default();
    let mut encoder = StimulusEncoder::with_config(config.clone());

    encoder.press();
    let mut previous = None;
    for _ in 0..config.sustain_ticks {
        encoder.step(0.0, 0.0, 1.0, true);
        let remaining = encoder.click_sustain_remaining();
        if let Some(prev) = previous {
            assert_eq!(remaining + 1, prev);
        }
        previous = Some(remaining);
    }
    assert_eq!(encoder.click_sustain_remaining(), 0);

    encoder.step(0.0, 0.0, 1.0, true);
    assert_eq!(encoder.bank().channel(Channel::Click).d, config.click.d);
    assert_eq!(encoder.click_sustain_magnitude(), 0.0);
}

/// Motion current is zero whenever the pointer is up, whatever the speed
/// or roughness.
#[test]
fn motion_is_gated_by_press_state() {
    let mut encoder = StimulusEncoder::new();
    for roughness in [0.0, 0.3, 1.2, 50.0] {
        let step = encoder.step(2000.0, 2000.0, roughness, false);
        assert_eq!(step.current(Channel::Motion), 0.0);
        assert!(!step.fired(Channel::Motion));
    }
}

/// Fast strokes on a rough material drive the motion channel to spike.
#[test]
fn pressed_motion_spikes() {
    let mut encoder = StimulusEncoder::new();
    encoder.press();
    let spikes = (0..200)
        .filter(|_| encoder.step(1500.0, 1500.0, 1.2, true).fired(Channel::Motion))
        .count();
    assert!(spikes > 0);
}

/// Currents fed to the bank never leave their clip ranges.
#[test]
fn currents_stay_clipped() {
    let config = EncoderConfig::default();
    let mut encoder = StimulusEncoder::with_config(config.clone());
    encoder.set_pressure_input(500.0);
    for _ in 0..20 {
        let step = encoder.step(1.0e6, 0.0, 10.0, true);
        let motion = step.current(Channel::Motion);
        let click = step.current(Channel::Click);
        assert!(motion >= config.motion_clip.min && motion <= config.motion_clip.max);
        assert!(click >= config.click_clip.min && click <= config.click_clip.max);
    }
}

/// Held pressure adapts: spikes thin out over time, and a fresh press
/// restores sensitivity.
#[test]
fn pressure_adapts_and_recovers() {
    let mut encoder = StimulusEncoder::new();
    let baseline_a = encoder.config().pressure.a;

    encoder.press();
    let early = (0..500)
        .filter(|_| encoder.step(0.0, 0.0, 1.0, true).fired(Channel::Pressure))
        .count();
    let adapted_a = encoder.bank().channel(Channel::Pressure).a;
    assert!(early > 0);
    assert!(adapted_a < baseline_a);
    assert!(adapted_a >= encoder.config().min_pressure_a);

    encoder.release();
    encoder.press();
    assert_eq!(encoder.bank().channel(Channel::Pressure).a, baseline_a);
}
