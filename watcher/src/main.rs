mod inference;
mod source;
mod ui;

use scene_gate_common::config::Config;
use scene_gate_pipeline::pipeline::FramePipeline;
use scene_gate_pipeline::registration::TranslationEstimator;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
    #[error("HTTP connection failed: {0}")]
    HttpConnect(reqwest::Error),
    #[error("HTTP stream error: {0}")]
    HttpStream(reqwest::Error),
    #[error("HTTP status {0}")]
    HttpStatus(u16),
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    info!(
        url = config.stream.url,
        mode = config.stream.mode,
        history_len = config.stability.history_len,
        manhattan_threshold = config.stability.manhattan_threshold,
        endpoint = config.classification.endpoint,
        "starting scene-gate watcher"
    );

    // A broken classifier must be loud at startup: with a silently disabled
    // dispatch path, inference would simply never run.
    let classifier = match inference::HttpClassifier::new(&config.classification) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!(error = %e, "classifier setup failed, inference would never run");
            std::process::exit(1);
        }
    };

    let (presentation, ui_rx) = ui::ChannelPresentation::new();
    let presentation = Arc::new(presentation);

    let mut pipeline = FramePipeline::new(
        TranslationEstimator::new(&config.registration),
        classifier,
        Arc::clone(&presentation),
        &config.stability,
    );

    let reviewing = pipeline.reviewing_flag();
    let min_confidence = config.classification.min_confidence;
    let review_hold = Duration::from_secs_f64(config.presentation.review_hold_secs);
    tokio::spawn(async move {
        ui::run_ui_loop(ui_rx, reviewing, min_confidence, review_hold).await;
    });

    let orientation = config.stream.orientation.exif();

    match config.stream.mode.as_str() {
        "mjpeg" => {
            let url = format!(
                "{}?quality={}&fps={}",
                config.stream.url, config.stream.quality, config.stream.fps
            );
            source::run_mjpeg_watch(&url, &mut pipeline, orientation)
                .await
                .ok();
        }
        "polling" => {
            let url = format!(
                "{}?quality={}",
                config.stream.url.replace("/stream", "/frame"),
                config.stream.quality
            );
            let interval = Duration::from_secs_f64(1.0 / config.stream.fps);
            source::run_polling_watch(&url, &mut pipeline, orientation, interval)
                .await
                .ok();
        }
        other => {
            error!(mode = other, "unknown stream mode, expected 'mjpeg' or 'polling'");
            std::process::exit(1);
        }
    }
}
