use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::info;

use crate::jobs::progress::ProgressReporter;
use crate::jobs::types::{TaskResult, TranslationArtifact};
use crate::subtitle::{parse_srt, render_ass, LINE_BREAK, SECONDARY_STYLE};
use crate::utils::http::fetch_text;
use crate::AppContext;

const BATCH_SIZE: usize = 50;
const TASK_SUFFIX_LEN: usize = 6;

/// Translation job body: fetch, parse, translate in batches, render to ASS
/// and persist the artifact.
pub async fn translate_subtitle(
    ctx: Arc<AppContext>,
    path: String,
    reporter: ProgressReporter,
) -> Result<TaskResult> {
    let content = fetch_text(&path, ctx.settings.proxy()).await?;

    let mut blocks = parse_srt(&content);
    if blocks.is_empty() {
        return Err(anyhow::anyhow!(
            "Could not parse subtitle content as SRT/VTT"
        ));
    }
    reporter.report(10.0);

    let total = blocks.len();
    let mut processed = 0;
    for batch in blocks.chunks_mut(BATCH_SIZE) {
        let originals: Vec<String> = batch
            .iter()
            .map(|block| block.text_lines.join(LINE_BREAK))
            .collect();

        let translated = ctx.translator.translate(&originals).await;

        // translated line on top, dimmed original below
        for (block, (original, translated)) in
            batch.iter_mut().zip(originals.iter().zip(translated))
        {
            block.text_lines = vec![translated, format!("{}{}", SECONDARY_STYLE, original)];
        }

        processed += batch.len();
        reporter.report(batch_progress(processed, total));
    }

    let document = render_ass(&blocks);

    fs::create_dir_all(&ctx.settings.download_dir).await?;
    let task_id = reporter.task_id();
    let suffix = &task_id[..TASK_SUFFIX_LEN.min(task_id.len())];
    let output_name = format!("{}_{}.ass", source_stem(&path, task_id), suffix);
    let output_path = ctx.settings.download_dir.join(&output_name);
    fs::write(&output_path, document).await?;

    let absolute_path = fs::canonicalize(&output_path)
        .await
        .unwrap_or_else(|_| output_path.clone());

    info!(
        "Translation finished for {} blocks, saved to {}",
        total,
        absolute_path.display()
    );

    Ok(TaskResult::Translate(TranslationArtifact {
        output_path: absolute_path.to_string_lossy().into_owned(),
        output_name,
        source_path: path,
        format: "ass".to_string(),
    }))
}

/// Progress curve after parsing: 10% for the fetch+parse phase, the
/// remaining 90% spread over translated blocks.
pub(crate) fn batch_progress(processed: usize, total: usize) -> f64 {
    10.0 + 90.0 * processed as f64 / total as f64
}

fn source_stem(path: &str, task_id: &str) -> String {
    let base = if path.starts_with("http://") || path.starts_with("https://") {
        path.rsplit('/').next().unwrap_or("")
    } else {
        Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
    };

    let stem = base.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(base);
    if stem.is_empty() {
        task_id.to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::extractor::{ExtractOptions, ExtractProgress, MediaExtractor, RawVideoInfo};
    use crate::jobs::limiter::ExtractLimiter;
    use crate::jobs::progress::ProgressBridge;
    use crate::jobs::types::{TaskKind, TaskStatus};
    use crate::llm::LlmTranslator;
    use crate::storage::task::{InMemoryTaskStore, TaskStore};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    struct NoopExtractor;

    impl MediaExtractor for NoopExtractor {
        fn extract(
            &self,
            _url: &str,
            _opts: &ExtractOptions,
            _on_progress: &(dyn Fn(ExtractProgress) + Send + Sync),
        ) -> Result<RawVideoInfo> {
            Ok(RawVideoInfo::default())
        }
    }

    fn test_ctx(download_dir: &TempDir) -> Arc<AppContext> {
        let mut settings = Settings::from_env();
        settings.po_token_server = String::new();
        settings.llm_api_key = String::new();
        settings.global_proxy = String::new();
        settings.download_dir = download_dir.path().to_path_buf();

        let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
        let translator = Arc::new(LlmTranslator::new(&settings));
        let progress = ProgressBridge::start(store.clone());
        Arc::new(AppContext {
            settings,
            store,
            limiter: Arc::new(ExtractLimiter::new(1)),
            extractor: Arc::new(NoopExtractor),
            translator,
            progress,
        })
    }

    fn sample_srt() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".srt").tempfile().unwrap();
        write!(
            file,
            "1\n00:00:01,000 --> 00:00:03,000\nHello there.\n\n\
             2\n00:00:04,500 --> 00:00:06,000\nGeneral Kenobi!\n\n"
        )
        .unwrap();
        file
    }

    #[test]
    fn test_batch_progress_curve() {
        assert_eq!(batch_progress(0, 10), 10.0);
        assert_eq!(batch_progress(5, 10), 55.0);
        assert_eq!(batch_progress(10, 10), 100.0);
    }

    #[test]
    fn test_source_stem_derivation() {
        assert_eq!(source_stem("https://example.com/subs/movie.srt", "abcdef"), "movie");
        assert_eq!(source_stem("/data/episode.en.vtt", "abcdef"), "episode.en");
        assert_eq!(source_stem("plainname", "abcdef"), "plainname");
        assert_eq!(source_stem("https://example.com/", "abcdef123456"), "abcdef123456");
    }

    #[tokio::test]
    async fn test_translate_subtitle_writes_bilingual_artifact() {
        let dir = TempDir::new().unwrap();
        let ctx = test_ctx(&dir);
        let file = sample_srt();

        let task_id = ctx.store.create(TaskKind::Translate).await.unwrap();
        let reporter = ctx.progress.reporter(task_id.clone());
        let source = file.path().to_str().unwrap().to_string();

        let result = translate_subtitle(ctx.clone(), source.clone(), reporter)
            .await
            .unwrap();

        let TaskResult::Translate(artifact) = result else {
            panic!("wrong result variant");
        };
        assert_eq!(artifact.format, "ass");
        assert_eq!(artifact.source_path, source);
        assert!(artifact.output_name.ends_with(&format!("_{}.ass", &task_id[..6])));

        // with empty credentials the "translation" is the original text
        let rendered = std::fs::read_to_string(&artifact.output_path).unwrap();
        assert!(rendered.contains("Dialogue: 0,0:00:01.00,0:00:03.00,Default,,0,0,0,,Hello there."));
        assert!(rendered.contains(SECONDARY_STYLE));
    }

    #[tokio::test]
    async fn test_translate_subtitle_rejects_unparsable_content() {
        let dir = TempDir::new().unwrap();
        let ctx = test_ctx(&dir);

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "this is not a subtitle file\n").unwrap();

        let task_id = ctx.store.create(TaskKind::Translate).await.unwrap();
        let reporter = ctx.progress.reporter(task_id);
        let result =
            translate_subtitle(ctx, file.path().to_str().unwrap().to_string(), reporter).await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("Could not parse subtitle content"));
    }

    #[tokio::test]
    async fn test_missing_source_fails_the_job_through_the_runner() {
        let dir = TempDir::new().unwrap();
        let ctx = test_ctx(&dir);

        let task_id = ctx.store.create(TaskKind::Translate).await.unwrap();
        let job_ctx = ctx.clone();
        crate::jobs::runner::run_job(
            ctx.store.clone(),
            ctx.progress.clone(),
            task_id.clone(),
            move |reporter| translate_subtitle(job_ctx, "/no/such/file.srt".to_string(), reporter),
        )
        .await;

        let record = ctx.store.get(&task_id).await.unwrap().unwrap();
        assert_eq!(record.status, TaskStatus::Failed);
        assert!(record.error.unwrap().contains("not found"));
    }
}
