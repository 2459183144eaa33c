use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Fixed label set for manually tagged respiratory events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Wheeze,
    Crackle,
    Cough,
    Normal,
}

impl TagKind {
    pub const ALL: [TagKind; 4] = [
        TagKind::Wheeze,
        TagKind::Crackle,
        TagKind::Cough,
        TagKind::Normal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TagKind::Wheeze => "Wheeze",
            TagKind::Crackle => "Crackle",
            TagKind::Cough => "Cough",
            TagKind::Normal => "Normal",
        }
    }
}

/// One tag press inside a recording window, timestamped relative to
/// window start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualEvent {
    #[serde(rename = "type")]
    pub kind: TagKind,
    pub timestamp: f32,
    pub duration: f32,
}

/// The single input collected for a session. Immutable once submitted.
#[derive(Debug, Clone)]
pub enum UploadTarget {
    AudioFile {
        name: String,
        mime: String,
        bytes: Vec<u8>,
    },
    Recording {
        events: Vec<ManualEvent>,
        duration: f32,
    },
}

impl UploadTarget {
    pub fn is_file(&self) -> bool {
        matches!(self, UploadTarget::AudioFile { .. })
    }

    pub fn size(&self) -> usize {
        match self {
            UploadTarget::AudioFile { bytes, .. } => bytes.len(),
            UploadTarget::Recording { events, .. } => events.len(),
        }
    }

    /// Short human-readable summary for status rows.
    pub fn describe(&self) -> String {
        match self {
            UploadTarget::AudioFile { name, bytes, .. } => {
                format!("{} ({:.1} KiB)", name, bytes.len() as f32 / 1024.0)
            }
            UploadTarget::Recording { events, duration } => {
                format!("{} tagged events over {:.1}s", events.len(), duration)
            }
        }
    }
}

/// Which remote endpoint the submission goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVariant {
    DiseaseClassifier,
    AnnotationDetector,
}

impl ModelVariant {
    pub fn label(&self) -> &'static str {
        match self {
            ModelVariant::DiseaseClassifier => "Disease classifier",
            ModelVariant::AnnotationDetector => "Annotation detector",
        }
    }

    /// Endpoint path under the service base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ModelVariant::DiseaseClassifier => "predict_disease",
            ModelVariant::AnnotationDetector => "predict_annotation",
        }
    }

    /// The disease classifier only takes audio files; the annotation
    /// detector takes files or manual recordings.
    pub fn accepts(&self, target: &UploadTarget) -> bool {
        match self {
            ModelVariant::DiseaseClassifier => target.is_file(),
            ModelVariant::AnnotationDetector => true,
        }
    }
}

/// Everything the dispatcher needs for one network call.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub variant: ModelVariant,
    pub target: UploadTarget,
}

/// JSON body sent to the annotation endpoint for manual recordings.
#[derive(Debug, Serialize)]
pub struct AnnotationPayload<'a> {
    pub events: &'a [ManualEvent],
    pub duration: f32,
}

/// Nominal audio metadata the service reports for file inputs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioMeta {
    pub duration: Option<f32>,
    pub sample_rate: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f32,
}

/// Classification-shape response: one label plus the full distribution.
#[derive(Debug, Clone, Deserialize)]
pub struct Classification {
    pub prediction: String,
    pub confidence: f32,
    #[serde(deserialize_with = "probabilities_in_order")]
    pub probabilities: Vec<ClassProbability>,
    #[serde(flatten)]
    pub audio: AudioMeta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectedInterval {
    pub label: String,
    pub start: f32,
    pub end: f32,
    pub confidence: f32,
}

/// Event-detection-shape response: a label plus timestamped sub-events.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDetection {
    pub prediction: String,
    pub confidence: f32,
    pub events: Vec<DetectedInterval>,
    #[serde(flatten)]
    pub audio: AudioMeta,
}

/// The two response shapes the service emits, told apart by field
/// presence: `probabilities` means classification, `events` means
/// event detection.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PredictionResult {
    Classification(Classification),
    EventDetection(EventDetection),
}

/// Deserializes the service's `{label: probability}` map into a vec
/// that keeps the document order, so ranking can stay stable on ties.
fn probabilities_in_order<'de, D>(deserializer: D) -> Result<Vec<ClassProbability>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedProbabilities;

    impl<'de> Visitor<'de> for OrderedProbabilities {
        type Value = Vec<ClassProbability>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of class label to probability")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((label, probability)) = map.next_entry::<String, f32>()? {
                entries.push(ClassProbability { label, probability });
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedProbabilities)
}

/// MIME type from the file extension, for the multipart upload.
pub fn guess_mime(name: &str) -> &'static str {
    let extension = name
        .rsplit('.')
        .next()
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "webm" => "audio/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_shape_is_picked_by_probabilities_field() {
        let body = r#"{
            "prediction": "COPD",
            "confidence": 0.91,
            "probabilities": {"COPD": 0.91, "Healthy": 0.06, "URTI": 0.03},
            "duration": 12.4,
            "sample_rate": 22050
        }"#;
        let result: PredictionResult = serde_json::from_str(body).unwrap();
        match result {
            PredictionResult::Classification(c) => {
                assert_eq!(c.prediction, "COPD");
                assert_eq!(c.probabilities.len(), 3);
                assert_eq!(c.audio.duration, Some(12.4));
                assert_eq!(c.audio.sample_rate, Some(22050));
            }
            PredictionResult::EventDetection(_) => panic!("wrong shape"),
        }
    }

    #[test]
    fn event_detection_shape_is_picked_by_events_field() {
        let body = r#"{
            "prediction": "Asthma",
            "confidence": 0.74,
            "events": [
                {"label": "wheeze", "start": 1.0, "end": 2.5, "confidence": 0.8}
            ],
            "duration": 10.0
        }"#;
        let result: PredictionResult = serde_json::from_str(body).unwrap();
        match result {
            PredictionResult::EventDetection(e) => {
                assert_eq!(e.events.len(), 1);
                assert_eq!(e.events[0].label, "wheeze");
                assert_eq!(e.audio.sample_rate, None);
            }
            PredictionResult::Classification(_) => panic!("wrong shape"),
        }
    }

    #[test]
    fn probability_map_keeps_document_order() {
        let body = r#"{
            "prediction": "Healthy",
            "confidence": 0.5,
            "probabilities": {"Zeta": 0.25, "Alpha": 0.25, "Mid": 0.5}
        }"#;
        let result: PredictionResult = serde_json::from_str(body).unwrap();
        let PredictionResult::Classification(c) = result else {
            panic!("wrong shape");
        };
        let labels: Vec<&str> = c.probabilities.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn body_matching_neither_shape_is_an_error() {
        let body = r#"{"prediction": "COPD", "confidence": 0.9}"#;
        assert!(serde_json::from_str::<PredictionResult>(body).is_err());
    }

    #[test]
    fn annotation_payload_uses_service_field_names() {
        let events = vec![ManualEvent {
            kind: TagKind::Wheeze,
            timestamp: 1.25,
            duration: 0.5,
        }];
        let payload = AnnotationPayload {
            events: &events,
            duration: 14.0,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["events"][0]["type"], "wheeze");
        assert_eq!(json["events"][0]["timestamp"], 1.25);
        assert_eq!(json["duration"], 14.0);
    }

    #[test]
    fn mime_guessing_covers_common_containers() {
        assert_eq!(guess_mime("breath.wav"), "audio/wav");
        assert_eq!(guess_mime("Breath.MP3"), "audio/mpeg");
        assert_eq!(guess_mime("clip.webm"), "audio/webm");
        assert_eq!(guess_mime("mystery"), "application/octet-stream");
    }

    #[test]
    fn disease_variant_rejects_recordings() {
        let recording = UploadTarget::Recording {
            events: Vec::new(),
            duration: 3.0,
        };
        let file = UploadTarget::AudioFile {
            name: "a.wav".into(),
            mime: "audio/wav".into(),
            bytes: vec![0; 4],
        };
        assert!(!ModelVariant::DiseaseClassifier.accepts(&recording));
        assert!(ModelVariant::DiseaseClassifier.accepts(&file));
        assert!(ModelVariant::AnnotationDetector.accepts(&recording));
        assert!(ModelVariant::AnnotationDetector.accepts(&file));
    }
}
