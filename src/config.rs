use std::env;
use std::path::PathBuf;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_PO_TOKEN_SERVER: &str = "http://localhost:4416";
const DEFAULT_LLM_BASE_URL: &str = "https://api.longcat.chat/openai/v1";
const DEFAULT_LLM_MODEL: &str = "LongCat-Flash-Chat";
const DEFAULT_MAX_CONCURRENT_EXTRACTS: usize = 3;
const DEFAULT_TASK_TTL_SECS: u64 = 3600;
const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";
const DEFAULT_YTDLP_PATH: &str = "yt-dlp";

/// Runtime configuration, read once at startup and passed around by handle.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Outbound proxy for the extractor and subtitle fetches, e.g. socks5://127.0.0.1:1080
    pub global_proxy: String,
    /// PO Token provider base URL. Empty disables token fetching.
    pub po_token_server: String,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub max_concurrent_extracts: usize,
    /// Redis connection URL. Empty selects the in-memory store directly.
    pub redis_url: String,
    /// TTL applied to task records in the durable store, refreshed on every write.
    pub task_ttl_secs: u64,
    pub download_dir: PathBuf,
    pub ytdlp_path: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            host: env_or("YTPARSE_HOST", DEFAULT_HOST),
            port: env_or("YTPARSE_PORT", &DEFAULT_PORT.to_string())
                .parse()
                .unwrap_or(DEFAULT_PORT),
            global_proxy: env_or("GLOBAL_PROXY", ""),
            po_token_server: env_or("PO_TOKEN_SERVER", DEFAULT_PO_TOKEN_SERVER),
            llm_api_key: env_or("LLM_API_KEY", ""),
            llm_base_url: env_or("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
            llm_model: env_or("LLM_MODEL", DEFAULT_LLM_MODEL),
            max_concurrent_extracts: env_or(
                "MAX_CONCURRENT_EXTRACTS",
                &DEFAULT_MAX_CONCURRENT_EXTRACTS.to_string(),
            )
            .parse()
            .unwrap_or(DEFAULT_MAX_CONCURRENT_EXTRACTS),
            redis_url: env_or("REDIS_URL", ""),
            task_ttl_secs: env_or("TASK_TTL_SECS", &DEFAULT_TASK_TTL_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_TASK_TTL_SECS),
            download_dir: PathBuf::from(env_or("DOWNLOAD_DIR", DEFAULT_DOWNLOAD_DIR)),
            ytdlp_path: env_or("YTDLP_PATH", DEFAULT_YTDLP_PATH),
        }
    }

    pub fn proxy(&self) -> Option<&str> {
        if self.global_proxy.is_empty() {
            None
        } else {
            Some(self.global_proxy.as_str())
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) => value,
        Err(_) => dotenv::var(key).unwrap_or_else(|_| default.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        let settings = Settings::from_env();
        assert!(settings.max_concurrent_extracts >= 1);
        assert!(settings.task_ttl_secs > 0);
        assert!(!settings.ytdlp_path.is_empty());
    }

    #[test]
    fn test_empty_proxy_is_none() {
        let mut settings = Settings::from_env();
        settings.global_proxy = String::new();
        assert!(settings.proxy().is_none());
        settings.global_proxy = "socks5://127.0.0.1:1080".to_string();
        assert_eq!(settings.proxy(), Some("socks5://127.0.0.1:1080"));
    }
}
