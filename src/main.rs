#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use ytparse_rs::config::Settings;
use ytparse_rs::extractor::{MediaExtractor, YtDlpExtractor};
use ytparse_rs::jobs::{ExtractLimiter, ProgressBridge};
use ytparse_rs::llm::LlmTranslator;
use ytparse_rs::storage::task::select_store;
use ytparse_rs::utils::logger;
use ytparse_rs::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    ytparse_rs::init_env();
    let _guard = logger::init("./logs".to_string())?;

    let settings = Settings::from_env();
    fs::create_dir_all(&settings.download_dir)?;

    info!("Starting media parse service...");

    info!("Initializing task store...");
    let store = select_store(&settings).await;

    info!("Initializing job pipeline...");
    let progress = ProgressBridge::start(store.clone());
    let limiter = Arc::new(ExtractLimiter::new(settings.max_concurrent_extracts));
    let extractor: Arc<dyn MediaExtractor> =
        Arc::new(YtDlpExtractor::new(settings.ytdlp_path.clone()));
    let translator = Arc::new(LlmTranslator::new(&settings));

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;

    let ctx = Arc::new(AppContext {
        settings,
        store,
        limiter,
        extractor,
        translator,
        progress,
    });

    info!("Starting HTTP server at http://{}", addr);
    match ytparse_rs::web::start_server(ctx, addr).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            tracing::error!("Server error: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
