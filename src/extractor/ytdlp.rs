use anyhow::{Context, Result};
use std::process::Command;
use tracing::{debug, info};

use super::{ExtractOptions, ExtractProgress, MediaExtractor, RawVideoInfo};

/// Production extractor: shells out to the yt-dlp binary and parses its
/// single-JSON dump. Metadata extraction never downloads media, so progress
/// from this implementation is coarse.
pub struct YtDlpExtractor {
    binary: String,
}

impl YtDlpExtractor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn build_command(&self, url: &str, opts: &ExtractOptions) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg("--quiet");

        if let Some(proxy) = &opts.proxy {
            cmd.arg("--proxy").arg(proxy);
        }

        if let Some(token) = &opts.po_token {
            let mut extractor_args = format!("youtube:po_token=web+{}", token);
            if let Some(binding) = &opts.content_binding {
                extractor_args.push_str(&format!(";po_token_visitor_data={}", binding));
            }
            cmd.arg("--extractor-args").arg(extractor_args);
            info!("PO Token injected into yt-dlp extractor args");
        }

        cmd.arg(url);
        cmd
    }
}

impl MediaExtractor for YtDlpExtractor {
    fn extract(
        &self,
        url: &str,
        opts: &ExtractOptions,
        on_progress: &(dyn Fn(ExtractProgress) + Send + Sync),
    ) -> Result<RawVideoInfo> {
        let mut cmd = self.build_command(url, opts);
        debug!("Running extractor: {:?}", cmd);

        on_progress(ExtractProgress::Indeterminate);
        let output = cmd
            .output()
            .with_context(|| format!("failed to run {}", self.binary))?;
        on_progress(ExtractProgress::Indeterminate);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            ));
        }

        serde_json::from_slice(&output.stdout)
            .with_context(|| format!("{} produced undecodable output", self.binary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_carries_token_and_proxy() {
        let extractor = YtDlpExtractor::new("yt-dlp");
        let opts = ExtractOptions {
            proxy: Some("socks5://127.0.0.1:1080".to_string()),
            po_token: Some("TOKEN".to_string()),
            content_binding: Some("BINDING".to_string()),
        };

        let cmd = extractor.build_command("https://youtu.be/dQw4w9WgXcQ", &opts);
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert!(args.contains(&"--dump-single-json".to_string()));
        assert!(args.contains(&"socks5://127.0.0.1:1080".to_string()));
        assert!(args
            .contains(&"youtube:po_token=web+TOKEN;po_token_visitor_data=BINDING".to_string()));
        assert_eq!(args.last().unwrap(), "https://youtu.be/dQw4w9WgXcQ");
    }

    #[test]
    fn test_command_without_token() {
        let extractor = YtDlpExtractor::new("yt-dlp");
        let cmd = extractor.build_command("https://youtu.be/x", &ExtractOptions::default());
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert!(!args.iter().any(|a| a.contains("po_token")));
        assert!(!args.contains(&"--proxy".to_string()));
    }
}
