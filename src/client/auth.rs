//! MAAS API key and OAuth PLAINTEXT request signing

use crate::error::{Error, Result};
use urlencoding::encode;
use uuid::Uuid;

/// Parsed `consumer_key:token_key:token_secret` API key
#[derive(Clone)]
pub struct ApiKey {
    consumer_key: String,
    token_key: String,
    token_secret: String,
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("consumer_key", &self.consumer_key)
            .field("token_key", &self.token_key)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

impl ApiKey {
    pub fn parse(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.trim().split(':').collect();
        match parts.as_slice() {
            [consumer, key, secret]
                if !consumer.is_empty() && !key.is_empty() && !secret.is_empty() =>
            {
                Ok(Self {
                    consumer_key: consumer.to_string(),
                    token_key: key.to_string(),
                    token_secret: secret.to_string(),
                })
            }
            _ => Err(Error::Auth(format!(
                "API key must have 3 colon-separated parts, got {}",
                parts.len()
            ))),
        }
    }

    /// `Authorization` header value for one request
    pub fn authorization(&self) -> String {
        let nonce = Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp();
        self.authorization_with(&nonce, timestamp)
    }

    fn authorization_with(&self, nonce: &str, timestamp: i64) -> String {
        // PLAINTEXT signature is `consumer_secret&token_secret`; MAAS keys
        // have an empty consumer secret
        let signature = format!("&{}", self.token_secret);
        let params = [
            ("oauth_version", "1.0".to_string()),
            ("oauth_signature_method", "PLAINTEXT".to_string()),
            ("oauth_nonce", nonce.to_string()),
            ("oauth_timestamp", timestamp.to_string()),
            ("oauth_consumer_key", self.consumer_key.clone()),
            ("oauth_token", self.token_key.clone()),
            ("oauth_signature", signature),
        ];

        let rendered: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, encode(v)))
            .collect();
        format!("OAuth realm=\"\", {}", rendered.join(", "))
    }
}
