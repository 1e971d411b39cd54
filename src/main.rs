use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use voxnote::{
    create_router, AppState, CaptureSource, Config, HttpFetcher, InputDevice, MemoryStore,
    MicrophoneSource, ModelAssetManager, RecognizerConfig, RecordingController,
};

#[derive(Parser)]
#[command(name = "voxnote", about = "Voice notes with local transcription")]
struct Cli {
    /// Config file (without extension), e.g. config/voxnote
    #[arg(long, default_value = "config/voxnote")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control server
    Serve,
    /// Record from the microphone, printing the live transcript
    Record {
        /// Stop automatically after this many seconds (default: Ctrl-C)
        #[arg(long)]
        seconds: Option<u64>,
        /// Output directory (default: from config)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Transcribe an existing WAV file
    Transcribe { file: PathBuf },
    /// Manage the speech model asset
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Report whether the model is downloaded and valid
    Status,
    /// Download the model if it is not ready
    Fetch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load_or_default(&cli.config)?;

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::Record { seconds, out } => record(cfg, seconds, out).await,
        Command::Transcribe { file } => transcribe(cfg, file).await,
        Command::Model { action } => model_command(cfg, action).await,
    }
}

fn build_model(cfg: &Config) -> Arc<ModelAssetManager> {
    Arc::new(ModelAssetManager::new(
        cfg.model_spec(),
        PathBuf::from(&cfg.model.dir),
        Arc::new(HttpFetcher::new()),
    ))
}

fn build_controller(cfg: &Config, model: Arc<ModelAssetManager>) -> RecordingController {
    let capture_cfg = cfg.capture_config();
    let device = InputDevice::new();
    let factory_cfg = capture_cfg.clone();

    let controller = RecordingController::new(move || {
        Box::new(MicrophoneSource::new(device.clone(), factory_cfg.clone()))
            as Box<dyn CaptureSource>
    })
    .with_model(model.clone())
    .with_capture_config(capture_cfg.clone())
    .with_recognizer_config(RecognizerConfig {
        sample_rate: capture_cfg.sample_rate,
        ..RecognizerConfig::default()
    });

    #[cfg(feature = "whisper")]
    let controller = {
        use voxnote::{RecognitionError, SpeechEngine};
        let model_path = model.path();
        controller.with_engine(move || -> Result<Box<dyn SpeechEngine>, RecognitionError> {
            voxnote::stt::WhisperEngine::load(&model_path)
                .map(|engine| Box::new(engine) as Box<dyn SpeechEngine>)
        })
    };

    controller
}

async fn serve(cfg: Config) -> Result<()> {
    let model = build_model(&cfg);
    let controller = Arc::new(build_controller(&cfg, model.clone()));

    let state = AppState {
        controller,
        model,
        store: Arc::new(MemoryStore::new()),
        recordings_dir: PathBuf::from(&cfg.audio.recordings_path),
    };

    let app = create_router(state);
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("{} listening on {}", cfg.service.name, addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn record(cfg: Config, seconds: Option<u64>, out: Option<PathBuf>) -> Result<()> {
    let model = build_model(&cfg);
    let controller = Arc::new(build_controller(&cfg, model));
    let out_dir = out.unwrap_or_else(|| PathBuf::from(&cfg.audio.recordings_path));

    let mut warnings = controller.warnings();
    tokio::spawn(async move {
        while let Ok(warning) = warnings.recv().await {
            warn!("{:?}", warning);
        }
    });

    let recording_id = controller.start(&out_dir).await?;
    info!("Recording {} (Ctrl-C to stop)", recording_id);

    let mut live = controller.live();
    let live_task = tokio::spawn(async move {
        while live.changed().await.is_ok() {
            let view = live.borrow().clone();
            print!("\r{}", view.display_text());
            let _ = std::io::Write::flush(&mut std::io::stdout());
        }
    });

    match seconds {
        Some(s) => tokio::time::sleep(std::time::Duration::from_secs(s)).await,
        None => {
            tokio::signal::ctrl_c().await?;
        }
    }

    let finished = controller.stop().await?;
    live_task.abort();
    println!();

    info!(
        "Saved {} ({} ms active, {} segments)",
        finished.file_path.display(),
        finished.duration_ms,
        finished.segments.len()
    );
    if !finished.transcript.is_empty() {
        println!("{}", finished.transcript);
    }

    Ok(())
}

#[cfg(feature = "whisper")]
async fn transcribe(cfg: Config, file: PathBuf) -> Result<()> {
    use voxnote::SpeechEngine;

    let model = build_model(&cfg);
    if !model.is_ready() {
        anyhow::bail!("speech model not downloaded; run `voxnote model fetch` first");
    }

    let engine = voxnote::stt::WhisperEngine::load(model.path())?;
    let outcome =
        voxnote::stt::transcribe_file(&file, "imported", Box::new(engine) as Box<dyn SpeechEngine>)
            .await?;

    for segment in &outcome.segments {
        println!(
            "[{:>7} - {:>7}] {}",
            segment.start_ms, segment.end_ms, segment.text
        );
    }
    Ok(())
}

#[cfg(not(feature = "whisper"))]
async fn transcribe(_cfg: Config, file: PathBuf) -> Result<()> {
    anyhow::bail!(
        "cannot transcribe {}: built without the `whisper` feature",
        file.display()
    )
}

async fn model_command(cfg: Config, action: ModelAction) -> Result<()> {
    let model = build_model(&cfg);

    match action {
        ModelAction::Status => {
            if model.is_ready() {
                println!("ready: {}", model.path().display());
            } else {
                println!("not downloaded (expected at {})", model.path().display());
            }
        }
        ModelAction::Fetch => {
            // Coalesce the watch stream to decile log lines.
            let mut progress = model.progress();
            let log_task = tokio::spawn(async move {
                let mut last_decile = 0u8;
                while progress.changed().await.is_ok() {
                    let decile = *progress.borrow() / 10;
                    if decile > last_decile {
                        info!("Model download: {}%", decile * 10);
                        last_decile = decile;
                    }
                }
            });

            model.ensure_ready().await?;
            log_task.abort();
            info!("Model ready: {}", model.path().display());
        }
    }

    Ok(())
}
