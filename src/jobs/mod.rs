pub mod analyze;
pub mod limiter;
pub mod progress;
pub mod runner;
pub mod translate;
pub mod types;

pub use analyze::analyze_media;
pub use limiter::ExtractLimiter;
pub use progress::{ProgressBridge, ProgressReporter};
pub use runner::run_job;
pub use translate::translate_subtitle;
pub use types::{
    FormatCategory, TaskKind, TaskRecord, TaskResult, TaskStatus, TranslationArtifact,
    VideoFormat, VideoInfo,
};
