use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

use shared::api::PredictionClient;
use shared::config::load_config;
use shared::render::{chronological, format_percent, ranked_probabilities};
use shared::types::{guess_mime, ModelVariant, PredictionRequest, PredictionResult, UploadTarget};

#[derive(Parser)]
#[command(name = "auscult-cli")]
#[command(about = "Submit respiratory audio to the prediction service")]
struct Args {
    /// Audio file to submit
    file: PathBuf,

    /// Which remote model to query
    #[arg(short, long, value_enum, default_value_t = Model::Disease)]
    model: Model,

    /// Override the configured service base URL
    #[arg(long)]
    api_url: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Model {
    Disease,
    Annotation,
}

impl From<Model> for ModelVariant {
    fn from(model: Model) -> Self {
        match model {
            Model::Disease => ModelVariant::DiseaseClassifier,
            Model::Annotation => ModelVariant::AnnotationDetector,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config();
    let client = match &args.api_url {
        Some(url) => PredictionClient::with_base_url(&config, url),
        None => PredictionClient::new(&config),
    };

    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    let mime = guess_mime(&name).to_string();
    info!("Submitting {} ({} bytes)", name, bytes.len());

    let request = PredictionRequest {
        variant: args.model.into(),
        target: UploadTarget::AudioFile { name, mime, bytes },
    };

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(client.predict(&request))?;
    print_result(&result);

    Ok(())
}

fn print_result(result: &PredictionResult) {
    match result {
        PredictionResult::Classification(classification) => {
            println!(
                "Prediction: {} ({})",
                classification.prediction,
                format_percent(classification.confidence)
            );
            print_audio_meta(classification.audio.duration, classification.audio.sample_rate);
            println!();
            for entry in ranked_probabilities(classification) {
                println!("  {:<18} {}", entry.label, format_percent(entry.probability));
            }
        }
        PredictionResult::EventDetection(detection) => {
            println!(
                "Prediction: {} ({})",
                detection.prediction,
                format_percent(detection.confidence)
            );
            print_audio_meta(detection.audio.duration, detection.audio.sample_rate);
            println!();
            if detection.events.is_empty() {
                println!("  No events detected");
                return;
            }
            for interval in chronological(&detection.events) {
                println!(
                    "  {:>7.2}s - {:>7.2}s  {:<10} {}",
                    interval.start,
                    interval.end,
                    interval.label,
                    format_percent(interval.confidence)
                );
            }
        }
    }
}

fn print_audio_meta(duration: Option<f32>, sample_rate: Option<u32>) {
    if let Some(duration) = duration {
        println!("Duration:   {duration:.1}s");
    }
    if let Some(rate) = sample_rate {
        println!("Sample rate: {rate} Hz");
    }
}
