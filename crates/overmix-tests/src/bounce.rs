//! End-to-end bounce tests: settings snapshot through controller, worker,
//! encoder, and back as events.

use overmix_core::{ChannelId, ChannelState, MixSettings, RenderResult};
use overmix_engine::{
    BounceController, BounceEvent, MemoryProvider, OutputKind, RenderConfig, SourceClip,
    WavEncoder,
};
use std::sync::Arc;
use uuid::Uuid;

fn session(frames: usize) -> (MixSettings, Arc<MemoryProvider>) {
    let settings = MixSettings::new(
        ChannelState::new(frames as u64),
        vec![ChannelState::new(frames as u64)],
    );
    let mut provider = MemoryProvider::new();
    provider.insert(ChannelId::Base, SourceClip::mono(vec![0.25; frames]));
    provider.insert(ChannelId::Layer(0), SourceClip::mono(vec![0.25; frames]));
    (settings, Arc::new(provider))
}

#[test]
fn bounce_produces_playable_wav_with_expected_length() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let dest = tmp.path().join("session.wav");
    let (settings, provider) = session(4096);

    let controller = BounceController::new();
    let handle = controller
        .start(
            Uuid::new_v4(),
            &settings,
            provider,
            Arc::new(WavEncoder::new(OutputKind::WavPcm16)),
            &dest,
            RenderConfig::default(),
        )
        .unwrap();

    let result = handle.wait();
    let output = match result {
        RenderResult::Completed { output } => output,
        other => panic!("expected completion, got {other:?}"),
    };

    let reader = hound::WavReader::open(&output).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 48_000);
    assert_eq!(reader.duration(), 4096);
}

#[test]
fn in_flight_edits_do_not_affect_a_running_render() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let dest = tmp.path().join("snapshot.wav");
    let (mut settings, provider) = session(4096);

    let controller = BounceController::new();
    let handle = controller
        .start(
            Uuid::new_v4(),
            &settings,
            provider,
            Arc::new(WavEncoder::new(OutputKind::WavFloat32)),
            &dest,
            RenderConfig::default(),
        )
        .unwrap();

    // Simulate the UI slamming the live settings mid-render. The worker
    // holds its own snapshot, so the output must reflect the original
    // values.
    settings.base_mut().muted = true;
    settings.layer_mut(0).unwrap().muted = true;
    settings.set_master_volume(0.0);

    assert!(handle.wait().is_completed());

    let mut reader = hound::WavReader::open(&dest).unwrap();
    let max = reader
        .samples::<f32>()
        .map(|s| s.unwrap().abs())
        .fold(0.0f32, f32::max);
    assert!(max > 0.1, "render silently picked up post-start edits");
}

#[test]
fn restart_after_terminal_state_is_legal() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let (settings, provider) = session(1024);

    let controller = BounceController::new();
    let group = Uuid::new_v4();
    let encoder = Arc::new(WavEncoder::new(OutputKind::WavPcm16));

    let first = controller
        .start(
            group,
            &settings,
            provider.clone(),
            encoder.clone(),
            tmp.path().join("first.wav"),
            RenderConfig::default(),
        )
        .unwrap();
    assert!(first.wait().is_completed());

    // Same group, fresh start: legal once the previous job reached a
    // terminal state.
    let second = controller
        .start(
            group,
            &settings,
            provider,
            encoder,
            tmp.path().join("second.wav"),
            RenderConfig::default(),
        )
        .unwrap();
    assert!(second.wait().is_completed());
    assert!(tmp.path().join("second.wav").exists());
}

#[test]
fn progress_events_precede_a_single_terminal_event() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let (settings, provider) = session(50_000);

    let controller = BounceController::new();
    let handle = controller
        .start(
            Uuid::new_v4(),
            &settings,
            provider,
            Arc::new(WavEncoder::new(OutputKind::WavPcm16)),
            tmp.path().join("events.wav"),
            RenderConfig {
                sample_rate: 48_000,
                cancel_check_interval: 2048,
            },
        )
        .unwrap();

    let mut saw_progress = false;
    let mut terminals = 0;
    for event in handle.events().iter() {
        match event {
            BounceEvent::Progress(p) => {
                assert_eq!(terminals, 0);
                assert!((0.0..=1.0).contains(&p.fraction()));
                saw_progress = true;
            }
            BounceEvent::Finished(result) => {
                terminals += 1;
                assert!(result.is_completed());
            }
        }
    }
    assert!(saw_progress);
    assert_eq!(terminals, 1);
}
