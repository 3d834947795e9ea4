use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Settings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// A Proof-of-Origin token obtained from the provider service.
#[derive(Debug, Clone)]
pub struct PoToken {
    pub content_binding: String,
    pub po_token: String,
}

/// Ask the PO Token provider for a token. Any failure (unconfigured,
/// unreachable, non-2xx, empty token) yields `None`; extraction proceeds
/// without a token.
pub async fn fetch_po_token(settings: &Settings, video_id: &str) -> Option<PoToken> {
    if settings.po_token_server.is_empty() {
        debug!("PO Token server not configured, skipping");
        return None;
    }

    let url = format!("{}/get_pot", settings.po_token_server.trim_end_matches('/'));
    let mut payload = json!({});
    if !video_id.is_empty() {
        payload["video_id"] = json!(video_id);
    }

    let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            warn!("Failed to build PO Token client: {}", e);
            return None;
        }
    };

    let response = match client.post(&url).json(&payload).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(
                "PO Token provider unreachable at {} ({}), proceeding without token",
                url, e
            );
            return None;
        }
    };

    if !response.status().is_success() {
        warn!(
            "PO Token provider returned {}, proceeding without token",
            response.status()
        );
        return None;
    }

    let data: Value = match response.json().await {
        Ok(data) => data,
        Err(e) => {
            warn!("PO Token provider returned undecodable body: {}", e);
            return None;
        }
    };

    // The provider has shipped both camelCase and snake_case key spellings.
    let content_binding = string_field(&data, &["contentBinding", "content_binding"]);
    let po_token = string_field(&data, &["poToken", "po_token"]);

    if po_token.is_empty() {
        warn!("PO Token provider returned empty token: {}", data);
        return None;
    }

    let binding_preview: String = content_binding.chars().take(16).collect();
    info!("PO Token obtained (content_binding={}...)", binding_preview);
    Some(PoToken {
        content_binding,
        po_token,
    })
}

fn string_field(data: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| data.get(*key).and_then(Value::as_str))
        .find(|value| !value.is_empty())
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_field_prefers_first_nonempty_spelling() {
        let data = json!({"contentBinding": "", "content_binding": "visitor", "poToken": "tok"});
        assert_eq!(string_field(&data, &["contentBinding", "content_binding"]), "visitor");
        assert_eq!(string_field(&data, &["poToken", "po_token"]), "tok");
        assert_eq!(string_field(&data, &["missing"]), "");
    }

    #[tokio::test]
    async fn test_unconfigured_server_yields_none() {
        let mut settings = Settings::from_env();
        settings.po_token_server = String::new();
        assert!(fetch_po_token(&settings, "dQw4w9WgXcQ").await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_yields_none() {
        let mut settings = Settings::from_env();
        settings.po_token_server = "http://127.0.0.1:1".to_string();
        assert!(fetch_po_token(&settings, "").await.is_none());
    }
}
