use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::extractor::{ExtractOptions, ExtractProgress, RawFormat, RawVideoInfo};
use crate::jobs::progress::ProgressReporter;
use crate::jobs::types::{FormatCategory, TaskResult, VideoFormat, VideoInfo};
use crate::pot::fetch_po_token;
use crate::AppContext;

// Coarse tick size used when the extractor reports no byte counts.
const COARSE_TICK_PCT: f64 = 5.0;
const COARSE_TICK_CAP: f64 = 95.0;

static VIDEO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:v=|/v/|youtu\.be/|/embed/|/shorts/)([a-zA-Z0-9_-]{11})").unwrap());

/// Best-effort video id extraction; an empty result is not fatal.
pub fn extract_video_id(url: &str) -> String {
    VIDEO_ID_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

fn codec_present(codec: &Option<String>) -> bool {
    matches!(codec.as_deref(), Some(c) if c != "none")
}

pub fn categorize_format(format: &RawFormat) -> FormatCategory {
    match (codec_present(&format.vcodec), codec_present(&format.acodec)) {
        (true, true) => FormatCategory::Muxed,
        (true, false) => FormatCategory::VideoOnly,
        (false, true) => FormatCategory::AudioOnly,
        (false, false) => FormatCategory::Unknown,
    }
}

fn map_format(raw: RawFormat) -> VideoFormat {
    let category = categorize_format(&raw);
    VideoFormat {
        format_id: raw.format_id.unwrap_or_default(),
        ext: raw.ext.unwrap_or_default(),
        resolution: raw.resolution,
        fps: raw.fps,
        vcodec: raw.vcodec,
        acodec: raw.acodec,
        filesize: raw.filesize,
        filesize_approx: raw.filesize_approx,
        tbr: raw.tbr,
        url: raw.url,
        format_note: raw.format_note,
        category,
    }
}

fn build_video_info(url: &str, raw: RawVideoInfo) -> VideoInfo {
    VideoInfo {
        title: raw.title.unwrap_or_else(|| "Unknown".to_string()),
        thumbnail: raw.thumbnail,
        duration: raw.duration,
        channel: raw.channel.or(raw.uploader),
        channel_url: raw.channel_url.or(raw.uploader_url),
        view_count: raw.view_count,
        upload_date: raw.upload_date,
        webpage_url: raw.webpage_url.unwrap_or_else(|| url.to_string()),
        formats: raw.formats.into_iter().map(map_format).collect(),
    }
}

/// Extraction job body: optional PO token, limiter-gated blocking extract on
/// a worker thread with progress relayed through the bridge, then mapping
/// into the normalized video info.
pub async fn analyze_media(
    ctx: Arc<AppContext>,
    url: String,
    reporter: ProgressReporter,
) -> Result<TaskResult> {
    let video_id = extract_video_id(&url);
    let token = fetch_po_token(&ctx.settings, &video_id).await;

    let opts = ExtractOptions {
        proxy: ctx.settings.proxy().map(str::to_string),
        po_token: token.as_ref().map(|t| t.po_token.clone()),
        content_binding: token
            .as_ref()
            .filter(|t| !t.content_binding.is_empty())
            .map(|t| t.content_binding.clone()),
    };

    // The permit covers only the blocking call; token fetch and mapping stay
    // outside the gate.
    let permit = ctx.limiter.acquire().await?;
    let extractor = ctx.extractor.clone();
    let target = url.clone();
    let raw = tokio::task::spawn_blocking(move || {
        let ticks = AtomicU64::new(0);
        let hook = move |observed: ExtractProgress| {
            let pct = match observed {
                ExtractProgress::Bytes {
                    downloaded,
                    total: Some(total),
                } if total > 0 => downloaded as f64 / total as f64 * 100.0,
                _ => {
                    let n = ticks.fetch_add(1, Ordering::Relaxed) + 1;
                    (n as f64 * COARSE_TICK_PCT).min(COARSE_TICK_CAP)
                }
            };
            reporter.report(pct);
        };
        extractor.extract(&target, &opts, &hook)
    })
    .await
    .context("extractor worker panicked")??;
    drop(permit);

    let video_info = build_video_info(&url, raw);
    info!(
        "Analyzed {} - {} formats found",
        video_info.webpage_url,
        video_info.formats.len()
    );
    Ok(TaskResult::Analyze(video_info))
}
