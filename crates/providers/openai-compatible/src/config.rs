use std::fmt;

use crate::adapter_core::transport::TransportConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Vendor client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Extra headers sent with every request (lower-case keys preferred).
    pub headers: Vec<(String, String)>,
    /// Query params appended to the request URL.
    pub query_params: Vec<(String, String)>,
    /// Retries for the initial request on rate limits, 5xx and network errors.
    pub max_retries: u32,
    pub transport: TransportConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            headers: Vec::new(),
            query_params: Vec::new(),
            max_retries: 2,
            transport: TransportConfig::default(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("headers", &self.headers.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("query_params", &self.query_params)
            .field("max_retries", &self.max_retries)
            .field("transport", &self.transport)
            .finish()
    }
}

impl ClientConfig {
    /// Defaults with `OPENAI_API_KEY` / `OPENAI_BASE_URL` applied when set.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.api_key = non_empty_env(API_KEY_ENV);
        if let Some(base_url) = non_empty_env(BASE_URL_ENV) {
            cfg.base_url = base_url;
        }
        cfg
    }

    pub fn endpoint_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let mut url = format!("{}/{}", base, CHAT_COMPLETIONS_PATH);
        if !self.query_params.is_empty() {
            let qp = self
                .query_params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&qp);
        }
        url
    }

    /// Headers for a request: content type, bearer auth, then configured extras.
    pub fn request_headers(&self) -> Vec<(String, String)> {
        let mut h = vec![("content-type".to_string(), "application/json".to_string())];
        if let Some(key) = self.api_key.as_deref() {
            h.push(("authorization".to_string(), format!("Bearer {}", key)));
        }
        h.extend(self.headers.iter().cloned());
        h
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
