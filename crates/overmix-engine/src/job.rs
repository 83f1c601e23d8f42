//! Bounce job lifecycle — single-flight per mix group, progress events,
//! cooperative cancellation, exactly one terminal result.
//!
//! A job runs on its own worker thread; the controlling thread only
//! observes events. The settings snapshot is cloned at `start`, so the UI
//! keeps mutating the live settings without touching the running render.

use crate::encode::Encoder;
use crate::render::{render_mix, RenderConfig, SourceProvider};
use crate::resolver::resolve;
use crossbeam_channel::{Receiver, Sender};
use overmix_core::{BounceError, MixGroupId, MixSettings, RenderResult, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Handle for cancelling an in-progress bounce.
#[derive(Debug, Clone)]
pub struct BounceCancel(Arc<AtomicBool>);

impl BounceCancel {
    /// Create a new cancel handle.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation. Advisory: the render loop checks this flag at
    /// a bounded frame interval.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check if cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for BounceCancel {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounce progress information.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BounceProgress {
    /// Output frames rendered so far.
    pub frames_done: u64,
    /// Total output frames for this render.
    pub total_frames: u64,
}

impl BounceProgress {
    /// Completion fraction (0.0 to 1.0).
    pub fn fraction(&self) -> f32 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.frames_done as f32 / self.total_frames as f32
    }
}

/// Events delivered to the caller while a job runs. `Finished` is always
/// the last event; no progress arrives after it.
#[derive(Debug)]
pub enum BounceEvent {
    Progress(BounceProgress),
    Finished(RenderResult),
}

/// Handle to one running bounce job.
pub struct BounceHandle {
    group: MixGroupId,
    cancel: BounceCancel,
    events: Receiver<BounceEvent>,
}

impl BounceHandle {
    /// The mix group this job belongs to.
    pub fn group(&self) -> MixGroupId {
        self.group
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Event stream for this job: zero or more `Progress`, then exactly
    /// one `Finished`.
    pub fn events(&self) -> &Receiver<BounceEvent> {
        &self.events
    }

    /// Block until the terminal result, discarding progress events.
    pub fn wait(self) -> RenderResult {
        loop {
            match self.events.recv() {
                Ok(BounceEvent::Progress(_)) => continue,
                Ok(BounceEvent::Finished(result)) => return result,
                Err(_) => {
                    return RenderResult::Failed {
                        error: BounceError::Internal("bounce worker disconnected".into()),
                    }
                }
            }
        }
    }
}

/// Owns the asynchronous lifecycle of bounce jobs, keyed by mix group.
///
/// At most one job may be running per group; a second `start` for the
/// same group is rejected synchronously with `AlreadyRunning`. Distinct
/// groups may bounce concurrently.
#[derive(Default)]
pub struct BounceController {
    running: Arc<Mutex<HashMap<MixGroupId, BounceCancel>>>,
}

impl BounceController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a job is currently running for the group.
    pub fn is_running(&self, group: MixGroupId) -> bool {
        self.running.lock().contains_key(&group)
    }

    /// Request cancellation of the group's running job, if any.
    /// Returns false when the group is idle.
    pub fn cancel(&self, group: MixGroupId) -> bool {
        match self.running.lock().get(&group) {
            Some(cancel) => {
                cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Start a bounce for `group`, snapshotting `settings`.
    ///
    /// Fails immediately with [`BounceError::AlreadyRunning`] — leaving
    /// the in-flight job untouched — if the group already has a running
    /// job. On success the worker delivers zero or more
    /// [`BounceEvent::Progress`] followed by exactly one
    /// [`BounceEvent::Finished`]; the group is back to idle by the time
    /// the terminal event is observable, so a fresh `start` is then legal.
    pub fn start(
        &self,
        group: MixGroupId,
        settings: &MixSettings,
        provider: Arc<dyn SourceProvider + Send + Sync>,
        encoder: Arc<dyn Encoder>,
        dest: impl Into<PathBuf>,
        config: RenderConfig,
    ) -> Result<BounceHandle> {
        let cancel = BounceCancel::new();
        {
            let mut running = self.running.lock();
            if running.contains_key(&group) {
                warn!(%group, "rejecting bounce start: already running");
                return Err(BounceError::AlreadyRunning(group));
            }
            running.insert(group, cancel.clone());
        }

        // Copy-on-start: in-flight UI edits never reach this render.
        let snapshot = settings.clone();
        let dest = dest.into();
        let (tx, rx) = crossbeam_channel::unbounded();
        let running = Arc::clone(&self.running);
        let worker_cancel = cancel.clone();

        info!(%group, dest = %dest.display(), layers = snapshot.layer_count(), "bounce started");

        std::thread::spawn(move || {
            let result = run_bounce(
                group,
                &snapshot,
                provider.as_ref(),
                encoder.as_ref(),
                &dest,
                &config,
                &worker_cancel,
                &tx,
            );
            // Idle before the terminal event, so a caller reacting to
            // Finished can start again without racing the state machine.
            running.lock().remove(&group);
            let _ = tx.send(BounceEvent::Finished(result));
        });

        Ok(BounceHandle {
            group,
            cancel,
            events: rx,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn run_bounce(
    group: MixGroupId,
    snapshot: &MixSettings,
    provider: &dyn SourceProvider,
    encoder: &dyn Encoder,
    dest: &std::path::Path,
    config: &RenderConfig,
    cancel: &BounceCancel,
    tx: &Sender<BounceEvent>,
) -> RenderResult {
    let channels = resolve(snapshot);

    let rendered = render_mix(&channels, provider, config, cancel, |progress| {
        let _ = tx.send(BounceEvent::Progress(progress));
    });

    let mix = match rendered {
        Ok(mix) => mix,
        Err(BounceError::Cancelled) => {
            info!(%group, "bounce cancelled during render");
            return RenderResult::Cancelled;
        }
        Err(error) => {
            warn!(%group, %error, "bounce render failed");
            return RenderResult::Failed { error };
        }
    };

    // A cancel that lands after the last render check still wins over
    // writing output.
    if cancel.is_cancelled() {
        info!(%group, "bounce cancelled before encode");
        return RenderResult::Cancelled;
    }

    match encoder.encode(&mix, dest) {
        Ok(output) => {
            info!(%group, output = %output.display(), "bounce completed");
            RenderResult::Completed { output }
        }
        Err(error) => {
            warn!(%group, %error, "bounce encode failed");
            RenderResult::Failed { error }
        }
    }
}
