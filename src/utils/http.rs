use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::info;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch subtitle text from either an HTTP(S) URL or a local file path.
pub async fn fetch_text(source: &str, proxy: Option<&str>) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        info!("Fetching subtitle content from URL: {}", source);

        let mut builder = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .no_proxy();
        if let Some(proxy_url) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }
        let client = builder.build()?;

        let response = client
            .get(source)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("HTTP request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "HTTP request failed with status: {}",
                response.status()
            ));
        }

        Ok(response.text().await?)
    } else {
        let path = Path::new(source);
        if !path.exists() {
            return Err(anyhow::anyhow!("Local file not found: {}", source));
        }
        fs::read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read file: {}", e))
    }
}
