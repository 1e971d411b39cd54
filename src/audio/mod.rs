pub mod capture;
pub mod file;
pub mod mic;
pub mod scripted;
pub mod writer;

pub use capture::{AudioFrame, CaptureConfig, CaptureEvent, CaptureSource, InputDevice};
pub use file::AudioFile;
pub use mic::MicrophoneSource;
pub use scripted::ScriptedSource;
pub use writer::{RecordedFile, RecordingWriter};
