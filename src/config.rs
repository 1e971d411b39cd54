use crate::audio::CaptureConfig;
use crate::model::ModelSpec;
use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    pub recordings_path: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub frame_duration_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub dir: String,
    pub name: String,
    pub urls: Vec<String>,
    pub expected_bytes: u64,
    pub size_tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        let spec = ModelSpec::whisper_tiny_en();
        Self {
            service: ServiceConfig {
                name: "voxnote".to_string(),
                http: HttpConfig {
                    bind: "127.0.0.1".to_string(),
                    port: 8787,
                },
            },
            audio: AudioConfig {
                recordings_path: "recordings".to_string(),
                sample_rate: 16000,
                channels: 1,
                frame_duration_ms: 100,
            },
            model: ModelConfig {
                dir: "models".to_string(),
                name: spec.name,
                urls: spec.urls,
                expected_bytes: spec.expected_bytes,
                size_tolerance: spec.size_tolerance,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load the named config file, falling back to defaults when absent.
    pub fn load_or_default(path: &str) -> Result<Self> {
        let exists = ["toml", "yaml", "json", "ini"]
            .iter()
            .any(|ext| Path::new(&format!("{}.{}", path, ext)).exists());
        if exists {
            Self::load(path)
        } else {
            info!("No config file at {}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
            frame_duration_ms: self.audio.frame_duration_ms,
        }
    }

    pub fn model_spec(&self) -> ModelSpec {
        ModelSpec {
            name: self.model.name.clone(),
            urls: self.model.urls.clone(),
            expected_bytes: self.model.expected_bytes,
            size_tolerance: self.model.size_tolerance,
        }
    }
}
