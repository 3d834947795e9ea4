use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::Settings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Subtitle translation through an OpenAI-compatible chat completion API.
/// Degrades rather than fails: missing credentials or any transport error
/// return the inputs unchanged.
pub struct LlmTranslator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl LlmTranslator {
    pub fn new(settings: &Settings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .no_proxy()
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: settings.llm_api_key.clone(),
            base_url: settings.llm_base_url.clone(),
            model: settings.llm_model.clone(),
        }
    }

    /// Translate `texts` preserving order and length. Each entry falls back
    /// to its original on any failure.
    pub async fn translate(&self, texts: &[String]) -> Vec<String> {
        if texts.is_empty() {
            return Vec::new();
        }

        if self.api_key.is_empty() {
            warn!("LLM_API_KEY is empty, skip translation and keep original text");
            return texts.to_vec();
        }

        debug!("Calling LLM API for {} lines", texts.len());
        match self.request_translation(texts).await {
            Ok(content) => map_numbered_lines(&content, texts),
            Err(e) => {
                error!("LLM API request failed: {}", e);
                texts.to_vec()
            }
        }
    }

    async fn request_translation(&self, texts: &[String]) -> anyhow::Result<String> {
        let mut prompt = String::from(
            "Translate the following English subtitles to Chinese. Maintain the exact \
             line count and formatting. Return ONLY the translated lines, each preceded \
             by its line number and a separator (e.g., '1|你好').\n\n",
        );
        for (i, text) in texts.iter().enumerate() {
            prompt.push_str(&format!("{}|{}\n", i, text));
        }

        let payload = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a professional subtitle translator. You always \
                                return exactly the same number of lines as provided, \
                                maintaining the exact 'LineNumber|TranslatedText' format.",
                },
                {"role": "user", "content": prompt},
            ],
            "max_tokens": 2000,
            "temperature": 0.3,
        });

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let data: ChatResponse = response.json().await?;
        data.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("LLM response contained no choices"))
    }
}

/// Parse `N|text` response lines back into input order, substituting the
/// original text for indices the model dropped or mangled.
fn map_numbered_lines(content: &str, texts: &[String]) -> Vec<String> {
    let mut by_index: HashMap<usize, String> = HashMap::new();
    for line in content.lines() {
        if let Some((index, text)) = line.split_once('|') {
            if let Ok(index) = index.trim().parse::<usize>() {
                by_index.insert(index, text.trim().to_string());
            }
        }
    }

    texts
        .iter()
        .enumerate()
        .map(|(i, original)| by_index.get(&i).cloned().unwrap_or_else(|| original.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator_with_key(api_key: &str) -> LlmTranslator {
        let mut settings = Settings::from_env();
        settings.llm_api_key = api_key.to_string();
        LlmTranslator::new(&settings)
    }

    #[tokio::test]
    async fn test_empty_credentials_return_inputs_unchanged() {
        let translator = translator_with_key("");
        let texts = vec!["a".to_string(), "b".to_string()];
        assert_eq!(translator.translate(&texts).await, texts);
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty() {
        let translator = translator_with_key("");
        assert!(translator.translate(&[]).await.is_empty());
    }

    #[test]
    fn test_map_numbered_lines_in_order() {
        let texts = vec!["hello".to_string(), "world".to_string()];
        let content = "0|你好\n1|世界\n";
        assert_eq!(map_numbered_lines(content, &texts), vec!["你好", "世界"]);
    }

    #[test]
    fn test_map_numbered_lines_fills_gaps_with_originals() {
        let texts = vec!["hello".to_string(), "world".to_string(), "again".to_string()];
        let content = "1|世界\ngarbage line\n";
        assert_eq!(
            map_numbered_lines(content, &texts),
            vec!["hello", "世界", "again"]
        );
    }

    #[test]
    fn test_map_numbered_lines_keeps_separators_in_text() {
        let texts = vec!["a|b".to_string()];
        let content = "0|甲|乙\n";
        assert_eq!(map_numbered_lines(content, &texts), vec!["甲|乙"]);
    }
}
