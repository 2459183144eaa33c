use std::io::Cursor;
use std::time::Instant;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

/// Plays the uploaded audio bytes and reports its position so the UI
/// can draw the playhead over the detected-interval overlay. Position
/// is tracked as accumulated progress plus wall clock since resume;
/// rodio does not expose a playback cursor.
pub struct AudioPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
    bytes: Vec<u8>,
    duration: f32,
    progress: f32,
    resumed_at: Option<Instant>,
}

impl AudioPlayer {
    pub fn new(bytes: Vec<u8>, duration: f32) -> Result<Self, String> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|error| format!("Audio init failed: {error}"))?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
            bytes,
            duration,
            progress: 0.0,
            resumed_at: None,
        })
    }

    pub fn is_playing(&self) -> bool {
        self.resumed_at.is_some()
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Current position in seconds, capped at the track duration.
    pub fn position(&self) -> f32 {
        let running = self
            .resumed_at
            .map(|resumed| resumed.elapsed().as_secs_f32())
            .unwrap_or(0.0);
        (self.progress + running).min(self.duration)
    }

    pub fn toggle(&mut self) -> Result<(), String> {
        if self.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    fn play(&mut self) -> Result<(), String> {
        // Restart from the top once the track has been played out.
        if self.position() >= self.duration {
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
            self.progress = 0.0;
        }

        if let Some(sink) = &self.sink {
            sink.play();
        } else {
            let sink = Sink::try_new(&self.handle)
                .map_err(|error| format!("Audio output failed: {error}"))?;
            let source = Decoder::new(Cursor::new(self.bytes.clone()))
                .map_err(|error| format!("Could not decode audio: {error}"))?;
            sink.append(source);
            self.sink = Some(sink);
        }
        self.resumed_at = Some(Instant::now());
        Ok(())
    }

    pub fn pause(&mut self) {
        if let Some(resumed) = self.resumed_at.take() {
            self.progress += resumed.elapsed().as_secs_f32();
        }
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    /// Called once per frame; parks the playhead at the end when the
    /// sink drains.
    pub fn tick(&mut self) {
        if !self.is_playing() {
            return;
        }
        let drained = self
            .sink
            .as_ref()
            .map(|sink| sink.empty())
            .unwrap_or(true);
        if drained || self.position() >= self.duration {
            self.pause();
            self.progress = self.duration;
        }
    }
}
