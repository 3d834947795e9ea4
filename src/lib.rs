pub mod config;
pub mod extractor;
pub mod jobs;
pub mod llm;
pub mod pot;
pub mod storage;
pub mod subtitle;
pub mod utils;
pub mod web;

use std::sync::Arc;

use config::Settings;
use extractor::MediaExtractor;
use jobs::{ExtractLimiter, ProgressBridge};
use llm::LlmTranslator;
use storage::task::TaskStore;

/// Shared application state, constructed once in `main` and handed to the
/// web layer and job bodies.
pub struct AppContext {
    pub settings: Settings,
    pub store: Arc<dyn TaskStore>,
    pub limiter: Arc<ExtractLimiter>,
    pub extractor: Arc<dyn MediaExtractor>,
    pub translator: Arc<LlmTranslator>,
    pub progress: ProgressBridge,
}

pub fn init_env() {
    dotenv::dotenv().ok();
}
