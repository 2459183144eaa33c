use std::time::Instant;

use shared::types::{ManualEvent, TagKind, UploadTarget};

/// Nominal duration attached to each tag press.
const EVENT_DURATION: f32 = 0.5;

/// Manual annotation window. `start` opens a timed window, tag presses
/// append events timestamped relative to window start, and `stop`
/// freezes the sequence with the total elapsed duration.
pub struct EventRecorder {
    started_at: Option<Instant>,
    events: Vec<ManualEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self {
            started_at: None,
            events: Vec::new(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn events(&self) -> &[ManualEvent] {
        &self.events
    }

    pub fn elapsed(&self) -> f32 {
        self.started_at
            .map(|start| start.elapsed().as_secs_f32())
            .unwrap_or(0.0)
    }

    pub fn start(&mut self) {
        if self.started_at.is_some() {
            return;
        }
        self.events.clear();
        self.started_at = Some(Instant::now());
    }

    /// Ignored outside an open window.
    pub fn tag(&mut self, kind: TagKind) {
        let Some(start) = self.started_at else {
            return;
        };
        self.events.push(ManualEvent {
            kind,
            timestamp: start.elapsed().as_secs_f32(),
            duration: EVENT_DURATION,
        });
    }

    /// Freeze the sequence. An empty sequence still yields a target;
    /// pre-flight validation turns it into the no-events error.
    pub fn stop(&mut self) -> Option<UploadTarget> {
        let started = self.started_at.take()?;
        Some(UploadTarget::Recording {
            events: std::mem::take(&mut self.events),
            duration: started.elapsed().as_secs_f32(),
        })
    }

    pub fn discard(&mut self) {
        self.started_at = None;
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_outside_a_window_are_ignored() {
        let mut recorder = EventRecorder::new();
        recorder.tag(TagKind::Wheeze);
        assert!(recorder.events().is_empty());
        assert!(recorder.stop().is_none());
    }

    #[test]
    fn stop_freezes_events_and_duration() {
        let mut recorder = EventRecorder::new();
        recorder.start();
        recorder.tag(TagKind::Wheeze);
        recorder.tag(TagKind::Crackle);
        let target = recorder.stop().unwrap();

        let UploadTarget::Recording { events, duration } = target else {
            panic!("expected a recording target");
        };
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, TagKind::Wheeze);
        assert_eq!(events[1].kind, TagKind::Crackle);
        assert!(duration >= events[1].timestamp);
        // Frozen: the recorder is empty again.
        assert!(!recorder.is_recording());
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn timestamps_are_monotonic_within_a_window() {
        let mut recorder = EventRecorder::new();
        recorder.start();
        for _ in 0..5 {
            recorder.tag(TagKind::Cough);
        }
        let timestamps: Vec<f32> = recorder.events().iter().map(|e| e.timestamp).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
        assert!(timestamps.iter().all(|t| *t >= 0.0));
    }

    #[test]
    fn restarting_clears_the_previous_sequence() {
        let mut recorder = EventRecorder::new();
        recorder.start();
        recorder.tag(TagKind::Normal);
        recorder.stop();
        recorder.start();
        assert!(recorder.events().is_empty());
        assert!(recorder.is_recording());
    }

    #[test]
    fn stopping_an_empty_window_yields_an_empty_recording() {
        let mut recorder = EventRecorder::new();
        recorder.start();
        let target = recorder.stop().unwrap();
        let UploadTarget::Recording { events, .. } = target else {
            panic!("expected a recording target");
        };
        assert!(events.is_empty());
    }
}
