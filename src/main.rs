mod config;
mod predict;
mod script;
mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use canvas::{CanvasError, Engine};
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{info, warn};

use config::{AppConfig, ConfigError};
use predict::{HttpClassifier, PredictError, PredictionSignal};
use script::{ScriptError, Step};
use session::{Command, SessionError, SessionEvent, SessionHandle};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("script: {0}")]
    Script(#[from] ScriptError),
    #[error("session: {0}")]
    Session(#[from] SessionError),
    #[error("canvas: {0}")]
    Canvas(#[from] CanvasError),
    #[error("predict: {0}")]
    Predict(#[from] PredictError),
    #[error("session ended before {0}")]
    SessionEnded(&'static str),
}

#[derive(Parser, Debug)]
#[command(name = "whiteboard", about = "Replay pointer scripts against the whiteboard canvas")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Replay a JSON-lines script and save the canvas as PNG.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON-lines event script.
    #[arg(long)]
    script: PathBuf,

    /// Where to write the final canvas.
    #[arg(long, env = "WHITEBOARD_OUT", default_value = "whiteboard.png")]
    out: PathBuf,

    /// Submit the final canvas for prediction after the script finishes.
    #[arg(long)]
    predict: bool,

    /// Canvas width; overrides `WHITEBOARD_WIDTH`.
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height; overrides `WHITEBOARD_HEIGHT`.
    #[arg(long)]
    height: Option<u32>,

    /// Classification endpoint; overrides `WHITEBOARD_PREDICT_URL`.
    #[arg(long)]
    predict_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "ignoring unreadable .env"),
    }

    let cli = Cli::parse();
    match cli.command {
        CliCommand::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> Result<(), CliError> {
    let mut config = AppConfig::from_env()?;
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(url) = args.predict_url {
        config.predict_url = url;
    }
    config.validate()?;

    let text = read(&args.script).await?;
    let events = script::parse(&String::from_utf8_lossy(&text))?;
    info!(script = %args.script.display(), events = events.len(), "script loaded");

    let classifier = Arc::new(HttpClassifier::from_config(&config)?);
    info!(url = classifier.url(), "prediction endpoint configured");
    let sink = |signal: PredictionSignal| {
        if signal.loading {
            info!("prediction loading");
        }
    };
    let engine = Engine::new(config.width, config.height)?;
    let (handle, mut session_events, task) = session::spawn(engine, classifier, Arc::new(sink), config.jpeg_quality);

    for (line, event) in events {
        match event.into_step(line)? {
            Step::Send(command) => {
                handle.send(command).await?;
                session::drain_pending(&mut session_events);
            }
            Step::Upload(path) => {
                let bytes = read(&path).await?;
                handle.send(Command::UploadImage(bytes)).await?;
                await_upload(&mut session_events, &path).await?;
            }
            Step::Predict => submit_prediction(&handle, &mut session_events).await?,
        }
    }
    if args.predict {
        submit_prediction(&handle, &mut session_events).await?;
    }

    let engine = handle.engine().await?;
    info!(
        mode = ?engine.mode.kind(),
        image = engine.image().is_some(),
        strokes = engine.snapshot().is_some(),
        "script finished"
    );

    let png = handle.export_png().await?;
    tokio::fs::write(&args.out, &png)
        .await
        .map_err(|source| CliError::Io { path: args.out.clone(), source })?;
    info!(out = %args.out.display(), bytes = png.len(), "canvas saved");

    drop(handle);
    if let Err(e) = task.await {
        warn!(error = %e, "session task failed");
    }
    Ok(())
}

async fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| CliError::Io { path: path.to_path_buf(), source })
}

/// Block until the most recent upload has been decoded or rejected.
async fn await_upload(events: &mut mpsc::UnboundedReceiver<SessionEvent>, path: &Path) -> Result<(), CliError> {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::ImageLoaded { width, height } => {
                info!(path = %path.display(), width, height, "image placed");
                return Ok(());
            }
            SessionEvent::DecodeFailed { error } => {
                warn!(path = %path.display(), %error, "upload skipped");
                return Ok(());
            }
            _ => {}
        }
    }
    Err(CliError::SessionEnded("upload decoded"))
}

async fn submit_prediction(
    handle: &SessionHandle,
    events: &mut mpsc::UnboundedReceiver<SessionEvent>,
) -> Result<(), CliError> {
    let request_id = handle.predict().await?;
    while let Some(event) = events.recv().await {
        if let SessionEvent::PredictionSettled(signal) = event {
            match (signal.label, signal.error) {
                (Some(label), _) => info!(%request_id, %label, "prediction"),
                (None, Some(error)) => warn!(%request_id, %error, "prediction failed"),
                (None, None) => {}
            }
            return Ok(());
        }
    }
    Err(CliError::SessionEnded("prediction settled"))
}
