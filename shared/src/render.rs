//! Pure projections from prediction results to display values. No
//! session state is read or written here.

use std::cmp::Ordering;

use crate::types::{ClassProbability, Classification, DetectedInterval};

/// Class probabilities ordered descending. The sort is stable, so equal
/// probabilities keep the order the service listed them in.
pub fn ranked_probabilities(result: &Classification) -> Vec<ClassProbability> {
    let mut ranked = result.probabilities.clone();
    ranked.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

/// Detected intervals in chronological order, stable on equal starts.
pub fn chronological(events: &[DetectedInterval]) -> Vec<DetectedInterval> {
    let mut ordered = events.to_vec();
    ordered.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));
    ordered
}

/// Confidence or probability as a percentage with one decimal.
pub fn format_percent(value: f32) -> String {
    format!("{:.1}%", value.clamp(0.0, 1.0) * 100.0)
}

/// Horizontal placement of one interval on a unit-width timeline:
/// `(left, width)` with the whole span clamped into [0, 1].
pub fn interval_span(start: f32, end: f32, total: f32) -> (f32, f32) {
    if !(total > 0.0) {
        return (0.0, 0.0);
    }
    let left = (start / total).clamp(0.0, 1.0);
    let right = (end / total).clamp(left, 1.0);
    (left, right - left)
}

/// Playhead position as a fraction of total duration, clamped.
pub fn playhead_fraction(position: f32, total: f32) -> f32 {
    if total > 0.0 {
        (position / total).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
