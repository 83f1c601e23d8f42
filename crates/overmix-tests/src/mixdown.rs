//! Integration tests for the resolve-then-render path.

use overmix_core::{ChannelId, ChannelState, MixSettings};
use overmix_engine::{render_mix, resolve, BounceCancel, MemoryProvider, RenderConfig, SourceClip};

fn center_amp() -> f32 {
    std::f32::consts::FRAC_PI_4.cos()
}

#[test]
fn soloed_looped_layer_fills_but_never_extends() {
    // A soloed looped 30-frame layer next to a soloed non-looped
    // 100-frame layer: the non-looped layer sets the length, the looped
    // one tiles across all of it.
    let mut settings = MixSettings::new(
        ChannelState::new(50),
        vec![ChannelState::new(30), ChannelState::new(100)],
    );
    settings.layer_mut(0).unwrap().looped = true;
    settings.layer_mut(0).unwrap().solo = true;
    settings.layer_mut(1).unwrap().solo = true;

    let mut provider = MemoryProvider::new();
    provider.insert(ChannelId::Base, SourceClip::mono(vec![0.9; 50]));
    provider.insert(ChannelId::Layer(0), SourceClip::mono(vec![0.2; 30]));
    provider.insert(ChannelId::Layer(1), SourceClip::mono(vec![0.1; 100]));

    let mix = render_mix(
        &resolve(&settings),
        &provider,
        &RenderConfig::default(),
        &BounceCancel::new(),
        |_| {},
    )
    .unwrap();

    assert_eq!(mix.frame_count(), 100);

    // Base is not soloed, so only the two layers contribute; the looped
    // layer is still present on the final frame.
    let amp = center_amp();
    let expected = (0.2 + 0.1) * amp;
    assert!((mix.samples[2 * 99] - expected).abs() < 1e-6);
}

#[test]
fn all_looped_layers_fall_back_to_base_duration() {
    let mut settings = MixSettings::new(
        ChannelState::new(40),
        vec![ChannelState::new(200), ChannelState::new(300)],
    );
    settings.layer_mut(0).unwrap().looped = true;
    settings.layer_mut(1).unwrap().looped = true;

    let mut provider = MemoryProvider::new();
    provider.insert(ChannelId::Base, SourceClip::mono(vec![0.1; 40]));
    provider.insert(ChannelId::Layer(0), SourceClip::mono(vec![0.1; 200]));
    provider.insert(ChannelId::Layer(1), SourceClip::mono(vec![0.1; 300]));

    let mix = render_mix(
        &resolve(&settings),
        &provider,
        &RenderConfig::default(),
        &BounceCancel::new(),
        |_| {},
    )
    .unwrap();

    assert_eq!(mix.frame_count(), 40);
}

#[test]
fn muting_every_channel_renders_silence_of_base_length() {
    let mut settings = MixSettings::new(ChannelState::new(64), vec![ChannelState::new(64)]);
    settings.base_mut().muted = true;
    settings.layer_mut(0).unwrap().muted = true;

    let mut provider = MemoryProvider::new();
    provider.insert(ChannelId::Base, SourceClip::mono(vec![0.9; 64]));
    provider.insert(ChannelId::Layer(0), SourceClip::mono(vec![0.9; 64]));

    let mix = render_mix(
        &resolve(&settings),
        &provider,
        &RenderConfig::default(),
        &BounceCancel::new(),
        |_| {},
    )
    .unwrap();

    assert_eq!(mix.frame_count(), 64);
    assert!(mix.samples.iter().all(|s| s.abs() < 1e-9));
}
