use uuid::Uuid;

use crate::error::PredictError;
use crate::types::{ModelVariant, PredictionRequest, PredictionResult, UploadTarget};

#[derive(Debug)]
pub enum SessionState {
    Idle,
    Submitting,
    Succeeded(PredictionResult),
    Failed(PredictError),
}

impl SessionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SessionState::Submitting)
    }
}

/// Ticket handed out by `begin_submit`; the settlement must present the
/// same id or it is dropped as stale.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: Uuid,
    pub request: PredictionRequest,
}

/// Owns the one session the UI shows: the collected input, the active
/// model variant, and the Idle/Submitting/Succeeded/Failed state.
/// Mutated only from the UI thread.
#[derive(Debug)]
pub struct PredictionSession {
    state: SessionState,
    target: Option<UploadTarget>,
    variant: ModelVariant,
    outstanding: Option<Uuid>,
}

impl PredictionSession {
    pub fn new(variant: ModelVariant) -> Self {
        Self {
            state: SessionState::Idle,
            target: None,
            variant,
            outstanding: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn target(&self) -> Option<&UploadTarget> {
        self.target.as_ref()
    }

    /// Collect a new input. Any previous result or error is cleared so
    /// stale output is never shown next to a new input, and an
    /// outstanding submission is orphaned.
    pub fn set_target(&mut self, target: UploadTarget) {
        self.target = Some(target);
        self.outstanding = None;
        self.state = SessionState::Idle;
    }

    /// Switching variants clears an input the new variant cannot accept
    /// and always clears results, since they came from the old endpoint.
    pub fn set_variant(&mut self, variant: ModelVariant) {
        if variant == self.variant {
            return;
        }
        self.variant = variant;
        let keep = self
            .target
            .as_ref()
            .map(|target| variant.accepts(target))
            .unwrap_or(false);
        if !keep {
            self.target = None;
        }
        self.outstanding = None;
        self.state = SessionState::Idle;
    }

    pub fn can_submit(&self) -> bool {
        !self.state.is_submitting() && self.target.is_some()
    }

    /// Pre-flight validation and the transition into `Submitting`.
    /// Fails fast, with no network activity, when no input is present
    /// for the active variant or a recording holds zero events.
    pub fn begin_submit(&mut self) -> Result<Submission, PredictError> {
        if self.state.is_submitting() {
            return Err(PredictError::Busy);
        }

        let target = match self.target.as_ref() {
            Some(target) if self.variant.accepts(target) => target,
            _ => return Err(self.fail(PredictError::NoInput)),
        };
        if let UploadTarget::Recording { events, .. } = target {
            if events.is_empty() {
                return Err(self.fail(PredictError::NoEvents));
            }
        }

        let submission = Submission {
            id: Uuid::new_v4(),
            request: PredictionRequest {
                variant: self.variant,
                target: target.clone(),
            },
        };
        self.outstanding = Some(submission.id);
        self.state = SessionState::Submitting;
        Ok(submission)
    }

    /// Apply the outcome of a settled request. Returns false when the
    /// settlement is stale (superseded input, reset, or cancellation
    /// already acted on) and was dropped.
    pub fn settle(
        &mut self,
        id: Uuid,
        outcome: Result<PredictionResult, PredictError>,
    ) -> bool {
        if self.outstanding != Some(id) || !self.state.is_submitting() {
            return false;
        }
        self.outstanding = None;
        self.state = match outcome {
            Ok(result) => SessionState::Succeeded(result),
            Err(PredictError::Cancelled) => SessionState::Idle,
            Err(error) => SessionState::Failed(error),
        };
        true
    }

    /// Discard the input and result and orphan any in-flight request.
    pub fn reset(&mut self) {
        self.target = None;
        self.outstanding = None;
        self.state = SessionState::Idle;
    }

    fn fail(&mut self, error: PredictError) -> PredictError {
        self.state = SessionState::Failed(error.clone());
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ManualEvent, TagKind};

    fn file_target() -> UploadTarget {
        UploadTarget::AudioFile {
            name: "breath.wav".into(),
            mime: "audio/wav".into(),
            bytes: vec![0; 16],
        }
    }

    fn recording_target(events: usize) -> UploadTarget {
        UploadTarget::Recording {
            events: (0..events)
                .map(|i| ManualEvent {
                    kind: TagKind::Wheeze,
                    timestamp: i as f32,
                    duration: 0.5,
                })
                .collect(),
            duration: 10.0,
        }
    }

    fn succeeded_result() -> PredictionResult {
        serde_json::from_str(
            r#"{"prediction": "Healthy", "confidence": 0.9,
                "probabilities": {"Healthy": 0.9, "COPD": 0.1}}"#,
        )
        .unwrap()
    }

    #[test]
    fn submit_without_input_fails_preflight() {
        let mut session = PredictionSession::new(ModelVariant::DiseaseClassifier);
        let error = session.begin_submit().unwrap_err();
        assert_eq!(error, PredictError::NoInput);
        assert!(error.is_preflight());
        assert!(matches!(session.state(), SessionState::Failed(_)));
    }

    #[test]
    fn empty_recording_fails_preflight_and_keeps_the_target() {
        let mut session = PredictionSession::new(ModelVariant::AnnotationDetector);
        session.set_target(recording_target(0));
        let error = session.begin_submit().unwrap_err();
        assert_eq!(error, PredictError::NoEvents);
        assert!(session.target().is_some());
    }

    #[test]
    fn submission_settles_into_succeeded() {
        let mut session = PredictionSession::new(ModelVariant::DiseaseClassifier);
        session.set_target(file_target());
        let submission = session.begin_submit().unwrap();
        assert!(session.state().is_submitting());
        assert!(session.settle(submission.id, Ok(succeeded_result())));
        assert!(matches!(session.state(), SessionState::Succeeded(_)));
    }

    #[test]
    fn failure_preserves_the_input_for_resubmission() {
        let mut session = PredictionSession::new(ModelVariant::DiseaseClassifier);
        session.set_target(file_target());
        let submission = session.begin_submit().unwrap();
        assert!(session.settle(submission.id, Err(PredictError::Timeout)));
        assert!(matches!(
            session.state(),
            SessionState::Failed(PredictError::Timeout)
        ));
        assert!(session.target().is_some());
        assert!(session.begin_submit().is_ok());
    }

    #[test]
    fn double_submit_is_refused_while_outstanding() {
        let mut session = PredictionSession::new(ModelVariant::DiseaseClassifier);
        session.set_target(file_target());
        let _submission = session.begin_submit().unwrap();
        assert_eq!(session.begin_submit().unwrap_err(), PredictError::Busy);
        assert!(!session.can_submit());
    }

    #[test]
    fn new_target_clears_result_and_orphans_the_outstanding_request() {
        let mut session = PredictionSession::new(ModelVariant::DiseaseClassifier);
        session.set_target(file_target());
        let submission = session.begin_submit().unwrap();

        // User picks a new file before the request settles.
        session.set_target(file_target());
        assert!(matches!(session.state(), SessionState::Idle));

        // The late settlement must not resurface.
        assert!(!session.settle(submission.id, Ok(succeeded_result())));
        assert!(matches!(session.state(), SessionState::Idle));
    }

    #[test]
    fn stale_settlement_after_reset_is_dropped() {
        let mut session = PredictionSession::new(ModelVariant::DiseaseClassifier);
        session.set_target(file_target());
        let submission = session.begin_submit().unwrap();
        session.reset();
        assert!(!session.settle(submission.id, Err(PredictError::Server(500))));
        assert!(matches!(session.state(), SessionState::Idle));
    }

    #[test]
    fn cancelled_settlement_returns_to_idle_not_failed() {
        let mut session = PredictionSession::new(ModelVariant::DiseaseClassifier);
        session.set_target(file_target());
        let submission = session.begin_submit().unwrap();
        assert!(session.settle(submission.id, Err(PredictError::Cancelled)));
        assert!(matches!(session.state(), SessionState::Idle));
    }

    #[test]
    fn variant_switch_clears_a_mismatched_target() {
        let mut session = PredictionSession::new(ModelVariant::AnnotationDetector);
        session.set_target(recording_target(3));
        session.set_variant(ModelVariant::DiseaseClassifier);
        assert!(session.target().is_none());
    }

    #[test]
    fn variant_switch_keeps_a_file_target() {
        let mut session = PredictionSession::new(ModelVariant::DiseaseClassifier);
        session.set_target(file_target());
        session.set_variant(ModelVariant::AnnotationDetector);
        assert!(session.target().is_some());
    }
}
