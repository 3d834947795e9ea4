use anyhow::Result;
use serde::Deserialize;

pub mod ytdlp;

pub use ytdlp::YtDlpExtractor;

/// Options injected into the extractor invocation.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub proxy: Option<String>,
    pub po_token: Option<String>,
    pub content_binding: Option<String>,
}

/// A progress observation from inside the blocking call.
#[derive(Debug, Clone, Copy)]
pub enum ExtractProgress {
    Bytes { downloaded: u64, total: Option<u64> },
    Indeterminate,
}

/// Opaque blocking metadata extraction. Implementations run on a worker
/// thread; the progress hook must therefore stay cheap and non-blocking.
pub trait MediaExtractor: Send + Sync + 'static {
    fn extract(
        &self,
        url: &str,
        opts: &ExtractOptions,
        on_progress: &(dyn Fn(ExtractProgress) + Send + Sync),
    ) -> Result<RawVideoInfo>;
}

/// Raw nested structure returned by the extractor, all fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawVideoInfo {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub channel: Option<String>,
    pub uploader: Option<String>,
    pub channel_url: Option<String>,
    pub uploader_url: Option<String>,
    pub view_count: Option<u64>,
    pub upload_date: Option<String>,
    pub webpage_url: Option<String>,
    pub formats: Vec<RawFormat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFormat {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub resolution: Option<String>,
    pub fps: Option<f64>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub filesize: Option<u64>,
    pub filesize_approx: Option<u64>,
    pub tbr: Option<f64>,
    pub url: Option<String>,
    pub format_note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_info_tolerates_sparse_json() {
        let info: RawVideoInfo = serde_json::from_str(r#"{"title": "clip"}"#).unwrap();
        assert_eq!(info.title.as_deref(), Some("clip"));
        assert!(info.formats.is_empty());
        assert!(info.duration.is_none());
    }

    #[test]
    fn test_raw_format_ignores_unknown_fields() {
        let raw = r#"{"format_id": "18", "ext": "mp4", "vcodec": "avc1", "quality": 5}"#;
        let format: RawFormat = serde_json::from_str(raw).unwrap();
        assert_eq!(format.format_id.as_deref(), Some("18"));
        assert_eq!(format.vcodec.as_deref(), Some("avc1"));
    }
}
