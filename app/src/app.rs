use std::path::{Path, PathBuf};
use std::sync::mpsc;
use uuid::Uuid;

use shared::api::PredictionClient;
use shared::config::{load_config, Config};
use shared::error::PredictError;
use shared::session::{PredictionSession, SessionState};
use shared::types::{guess_mime, ModelVariant, PredictionResult, UploadTarget};

use crate::playback::AudioPlayer;
use crate::recorder::EventRecorder;
use crate::worker::{spawn_submission, CancelHandle};

pub struct AuscultApp {
    pub session: PredictionSession,
    pub recorder: EventRecorder,
    pub player: Option<AudioPlayer>,

    pub config: Config,
    pub client: PredictionClient,

    cancel: Option<CancelHandle>,

    pub rx: mpsc::Receiver<UiMessage>,
    pub tx: mpsc::Sender<UiMessage>,
}

/// Settlements crossing back from the submission worker thread.
#[derive(Debug)]
pub enum UiMessage {
    Settled {
        submission: Uuid,
        outcome: Result<PredictionResult, PredictError>,
    },
}

impl AuscultApp {
    pub fn new(preload: Option<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();

        let config = load_config();
        let client = PredictionClient::new(&config);

        let mut app = Self {
            session: PredictionSession::new(ModelVariant::DiseaseClassifier),
            recorder: EventRecorder::new(),
            player: None,
            config,
            client,
            cancel: None,
            rx,
            tx,
        };

        if let Some(path) = preload {
            app.load_file(&path);
        }

        app
    }

    pub fn process_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            match message {
                UiMessage::Settled {
                    submission,
                    outcome,
                } => {
                    let applied = self.session.settle(submission, outcome);
                    if applied {
                        self.cancel = None;
                        self.sync_player();
                    } else {
                        log::debug!("Dropped stale settlement for {submission}");
                    }
                }
            }
        }
    }

    pub fn load_file(&mut self, path: &Path) {
        match std::fs::read(path) {
            Ok(bytes) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "audio".to_string());
                let mime = guess_mime(&name).to_string();
                log::info!("Loaded {} ({} bytes)", name, bytes.len());
                self.accept_target(UploadTarget::AudioFile { name, mime, bytes });
            }
            Err(e) => {
                log::error!("Failed to read {}: {}", path.display(), e);
            }
        }
    }

    /// Route every collected input through here so stale results are
    /// cleared and an in-flight request is abandoned.
    pub fn accept_target(&mut self, target: UploadTarget) {
        self.abandon_submission();
        self.player = None;
        self.session.set_target(target);
    }

    pub fn set_variant(&mut self, variant: ModelVariant) {
        if variant == self.session.variant() {
            return;
        }
        self.abandon_submission();
        self.player = None;
        if self.recorder.is_recording() {
            self.recorder.discard();
        }
        self.session.set_variant(variant);
    }

    pub fn submit(&mut self) {
        if self.recorder.is_recording() {
            // The window must be stopped first; the submit button is
            // disabled while recording, so this is just a guard.
            return;
        }
        match self.session.begin_submit() {
            Ok(submission) => {
                log::info!(
                    "Submitting {} to {}",
                    submission.request.target.describe(),
                    submission.request.variant.label()
                );
                self.cancel = Some(spawn_submission(
                    self.client.clone(),
                    submission,
                    self.tx.clone(),
                ));
            }
            Err(error) => {
                log::warn!("Submission blocked: {error}");
            }
        }
    }

    pub fn start_recording(&mut self) {
        self.player = None;
        self.recorder.start();
    }

    /// Stop the recording window and freeze the event sequence into
    /// the session's target.
    pub fn finish_recording(&mut self) {
        if let Some(target) = self.recorder.stop() {
            self.accept_target(target);
        }
    }

    pub fn reset(&mut self) {
        self.abandon_submission();
        self.player = None;
        self.recorder.discard();
        self.session.reset();
    }

    fn abandon_submission(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }

    /// After a successful event-detection settlement on a file input,
    /// wire up playback over the uploaded bytes.
    fn sync_player(&mut self) {
        self.player = None;
        let SessionState::Succeeded(PredictionResult::EventDetection(detection)) =
            self.session.state()
        else {
            return;
        };
        let Some(UploadTarget::AudioFile { bytes, .. }) = self.session.target() else {
            return;
        };
        let duration = detection.audio.duration.or_else(|| {
            detection
                .events
                .iter()
                .map(|event| event.end)
                .fold(None, |max: Option<f32>, end| {
                    Some(max.map_or(end, |m| m.max(end)))
                })
        });
        let Some(duration) = duration.filter(|d| *d > 0.0) else {
            return;
        };
        match AudioPlayer::new(bytes.clone(), duration) {
            Ok(player) => self.player = Some(player),
            Err(e) => log::error!("Playback unavailable: {e}"),
        }
    }
}

impl Drop for AuscultApp {
    fn drop(&mut self) {
        // App teardown must not leave a dangling request behind.
        self.abandon_submission();
    }
}
