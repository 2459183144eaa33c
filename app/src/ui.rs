use eframe::egui;

use shared::render::{
    chronological, format_percent, interval_span, playhead_fraction, ranked_probabilities,
};
use shared::session::SessionState;
use shared::types::{
    guess_mime, Classification, EventDetection, ModelVariant, PredictionResult, TagKind,
    UploadTarget,
};

use crate::app::AuscultApp;

const AUDIO_EXTENSIONS: [&str; 6] = ["wav", "mp3", "ogg", "flac", "m4a", "webm"];

impl eframe::App for AuscultApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Drain settlements from the worker thread first.
        self.process_messages();
        if let Some(player) = self.player.as_mut() {
            player.tick();
        }

        // Keep the playhead and the recording clock moving.
        ctx.request_repaint();

        handle_dropped_files(ctx, self);

        egui::CentralPanel::default().show(ctx, |ui| {
            header(ui, self);
            ui.separator();
            input_section(ui, ctx, self);
            ui.separator();
            submit_row(ui, self);
            ui.separator();
            result_section(ui, self);

            ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                ui.weak(format!("Service: {}", self.config.base_url()));
            });
        });
    }
}

fn handle_dropped_files(ctx: &egui::Context, app: &mut AuscultApp) {
    let dropped = ctx.input(|i| i.raw.dropped_files.clone());
    if dropped.is_empty() {
        // Empty drop lists are silently ignored.
        return;
    }
    // One target per session: the first usable entry wins.
    for file in dropped {
        if let Some(path) = file.path {
            app.load_file(&path);
            return;
        }
        if let Some(bytes) = file.bytes {
            let name = if file.name.is_empty() {
                "dropped-audio".to_string()
            } else {
                file.name.clone()
            };
            let mime = guess_mime(&name).to_string();
            app.accept_target(UploadTarget::AudioFile {
                name,
                mime,
                bytes: bytes.to_vec(),
            });
            return;
        }
    }
}

fn header(ui: &mut egui::Ui, app: &mut AuscultApp) {
    ui.horizontal(|ui| {
        ui.heading("Auscult");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let mut selected = app.session.variant();
            egui::ComboBox::from_label("Model")
                .selected_text(selected.label())
                .show_ui(ui, |ui| {
                    for variant in [
                        ModelVariant::DiseaseClassifier,
                        ModelVariant::AnnotationDetector,
                    ] {
                        ui.selectable_value(&mut selected, variant, variant.label());
                    }
                });
            if selected != app.session.variant() {
                app.set_variant(selected);
            }
        });
    });
}

fn input_section(ui: &mut egui::Ui, ctx: &egui::Context, app: &mut AuscultApp) {
    ui.horizontal(|ui| {
        if ui.button("📂 Choose file…").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("audio", &AUDIO_EXTENSIONS)
                .pick_file()
            {
                app.load_file(&path);
            }
        }
        if ctx.input(|i| !i.raw.hovered_files.is_empty()) {
            ui.colored_label(egui::Color32::LIGHT_BLUE, "Drop the file to load it");
        } else {
            ui.label("…or drop an audio file anywhere in this window");
        }
    });

    if app.session.variant() == ModelVariant::AnnotationDetector {
        ui.add_space(6.0);
        recording_controls(ui, ctx, app);
    }

    ui.add_space(6.0);
    match app.session.target() {
        Some(target) => {
            ui.label(format!("Input: {}", target.describe()));
        }
        None if !app.recorder.is_recording() => {
            ui.weak("No input collected yet");
        }
        None => {}
    }
}

fn recording_controls(ui: &mut egui::Ui, ctx: &egui::Context, app: &mut AuscultApp) {
    if app.recorder.is_recording() {
        ui.horizontal(|ui| {
            // Pulsing red circle while the window is open.
            let time = ctx.input(|i| i.time) as f32;
            let pulse = (time * 3.0).sin() * 0.3 + 0.7;
            let red = egui::Color32::from_rgb((255.0 * pulse) as u8, 0, 0);
            let (rect, _response) =
                ui.allocate_exact_size(egui::Vec2::splat(12.0), egui::Sense::hover());
            ui.painter().circle_filled(rect.center(), 6.0, red);
            ui.label(format!(
                "Tagging… {:.1}s, {} events",
                app.recorder.elapsed(),
                app.recorder.events().len()
            ));
        });
        ui.horizontal(|ui| {
            for kind in TagKind::ALL {
                if ui.button(kind.label()).clicked() {
                    app.recorder.tag(kind);
                }
            }
            if ui.button("⏹ Stop").clicked() {
                app.finish_recording();
            }
        });
    } else if ui.button("⏺ Record events manually").clicked() {
        app.start_recording();
    }
}

fn submit_row(ui: &mut egui::Ui, app: &mut AuscultApp) {
    let submitting = app.session.state().is_submitting();
    let can_submit = app.session.can_submit() && !app.recorder.is_recording();

    ui.horizontal(|ui| {
        if ui
            .add_enabled(can_submit, egui::Button::new("⬆ Submit").min_size([110.0, 32.0].into()))
            .clicked()
        {
            app.submit();
        }
        if ui
            .add_enabled(!submitting, egui::Button::new("Reset").min_size([80.0, 32.0].into()))
            .clicked()
        {
            app.reset();
        }
        if submitting {
            ui.spinner();
            ui.label("Waiting for prediction…");
        }
    });
}

fn result_section(ui: &mut egui::Ui, app: &mut AuscultApp) {
    match app.session.state() {
        SessionState::Idle => {
            ui.weak("Results will appear here after submission.");
        }
        SessionState::Submitting => {}
        SessionState::Failed(error) => {
            ui.colored_label(egui::Color32::LIGHT_RED, error.to_string());
        }
        SessionState::Succeeded(result) => {
            // Cloned so the overlay can borrow the player mutably.
            let result = result.clone();
            match result {
                PredictionResult::Classification(classification) => {
                    classification_view(ui, &classification);
                }
                PredictionResult::EventDetection(detection) => {
                    detection_view(ui, app, &detection);
                }
            }
        }
    }
}

fn classification_view(ui: &mut egui::Ui, classification: &Classification) {
    ui.heading(&classification.prediction);
    ui.label(format!(
        "Confidence: {}",
        format_percent(classification.confidence)
    ));
    audio_meta_row(ui, classification.audio.duration, classification.audio.sample_rate);
    ui.add_space(8.0);

    egui::ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
        for entry in ranked_probabilities(classification) {
            ui.horizontal(|ui| {
                ui.add_sized([130.0, 18.0], egui::Label::new(&entry.label));
                ui.add(
                    egui::ProgressBar::new(entry.probability.clamp(0.0, 1.0))
                        .text(format_percent(entry.probability)),
                );
            });
        }
    });
}

fn detection_view(ui: &mut egui::Ui, app: &mut AuscultApp, detection: &EventDetection) {
    ui.heading(&detection.prediction);
    ui.label(format!(
        "Confidence: {}",
        format_percent(detection.confidence)
    ));
    audio_meta_row(ui, detection.audio.duration, detection.audio.sample_rate);
    ui.add_space(8.0);

    let total = detection.audio.duration.unwrap_or_else(|| {
        detection
            .events
            .iter()
            .map(|event| event.end)
            .fold(0.0, f32::max)
    });

    timeline(ui, app, detection, total);

    if let Some(player) = app.player.as_mut() {
        ui.horizontal(|ui| {
            let label = if player.is_playing() { "⏸ Pause" } else { "▶ Play" };
            if ui.button(label).clicked() {
                if let Err(e) = player.toggle() {
                    log::error!("Playback failed: {e}");
                }
            }
            ui.label(format!("{:.1}s / {:.1}s", player.position(), player.duration()));
        });
    }

    ui.add_space(8.0);
    egui::ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
        for interval in chronological(&detection.events) {
            ui.horizontal(|ui| {
                let (rect, _response) =
                    ui.allocate_exact_size(egui::Vec2::splat(10.0), egui::Sense::hover());
                ui.painter()
                    .circle_filled(rect.center(), 5.0, interval_color(&interval.label));
                ui.label(format!(
                    "{:>6.2}s – {:>6.2}s  {:<8} {}",
                    interval.start,
                    interval.end,
                    interval.label,
                    format_percent(interval.confidence)
                ));
            });
        }
    });
}

/// Unit-width timeline: each interval painted at its clamped fraction
/// of total duration, with the playhead on top.
fn timeline(ui: &mut egui::Ui, app: &AuscultApp, detection: &EventDetection, total: f32) {
    let (rect, _response) = ui.allocate_exact_size(
        egui::Vec2::new(ui.available_width(), 36.0),
        egui::Sense::hover(),
    );
    let painter = ui.painter();
    painter.rect_filled(rect, 4.0, egui::Color32::from_gray(40));

    for interval in &detection.events {
        let (left, width) = interval_span(interval.start, interval.end, total);
        let span = egui::Rect::from_min_size(
            egui::pos2(rect.left() + left * rect.width(), rect.top() + 4.0),
            egui::vec2(width * rect.width(), rect.height() - 8.0),
        );
        painter.rect_filled(span, 2.0, interval_color(&interval.label));
    }

    if let Some(player) = &app.player {
        let x = rect.left() + playhead_fraction(player.position(), total) * rect.width();
        painter.line_segment(
            [egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())],
            egui::Stroke::new(2.0, egui::Color32::WHITE),
        );
    }
}

fn audio_meta_row(ui: &mut egui::Ui, duration: Option<f32>, sample_rate: Option<u32>) {
    let mut parts = Vec::new();
    if let Some(duration) = duration {
        parts.push(format!("{duration:.1}s"));
    }
    if let Some(rate) = sample_rate {
        parts.push(format!("{rate} Hz"));
    }
    if !parts.is_empty() {
        ui.weak(parts.join(" · "));
    }
}

fn interval_color(label: &str) -> egui::Color32 {
    match label.to_ascii_lowercase().as_str() {
        "wheeze" => egui::Color32::from_rgb(230, 130, 40),
        "crackle" => egui::Color32::from_rgb(80, 160, 240),
        "cough" => egui::Color32::from_rgb(200, 80, 160),
        _ => egui::Color32::from_gray(140),
    }
}
