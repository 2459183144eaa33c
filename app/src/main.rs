use anyhow::Result;
use clap::Parser;
use eframe::egui;
use std::path::PathBuf;

mod app;
mod playback;
mod recorder;
mod ui;
mod worker;

#[derive(Parser)]
#[command(name = "auscult-app")]
#[command(about = "Respiratory audio prediction interface")]
struct Args {
    /// Audio file to load into the session at startup
    #[arg(short, long)]
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 560.0])
            .with_title("Auscult"),
        ..Default::default()
    };

    eframe::run_native(
        "Auscult",
        options,
        Box::new(|_cc| Ok(Box::new(app::AuscultApp::new(args.file)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run egui app: {}", e))
}
