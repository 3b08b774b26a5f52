use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::sdk_types::Metadata;
use crate::vendor::config::ClientConfig;

fn default_max_retries() -> u32 {
    2
}

/// Generation options held by an adapter for its whole lifetime.
///
/// Deserializes from e.g.
/// `{"model": "gpt-4o-mini", "temperature": 0.2, "timeout_secs": 30}`.
/// The API key is accepted on input but never serialized.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionsOptions {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(
        default,
        rename = "timeout_secs",
        with = "duration_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ChatCompletionsOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
            timeout: None,
            stop: None,
            max_retries: default_max_retries(),
            api_key: None,
            base_url: None,
        }
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn stop<I, S>(mut self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop = Some(stop.into_iter().map(Into::into).collect());
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Vendor client config: environment defaults overridden by these options.
    pub fn client_config(&self) -> ClientConfig {
        self.apply_to(ClientConfig::from_env())
    }

    /// Overlay these options on an existing client config.
    pub fn apply_to(&self, mut cfg: ClientConfig) -> ClientConfig {
        if let Some(key) = &self.api_key {
            cfg.api_key = Some(key.clone());
        }
        if let Some(base_url) = &self.base_url {
            cfg.base_url = base_url.clone();
        }
        cfg.max_retries = self.max_retries;
        cfg
    }

    /// Parameters that identify a model configured with these options.
    pub fn identifying_params(&self) -> Metadata {
        let mut params = Metadata::new();
        params.insert("model_name".into(), json!(self.model));
        if let Some(t) = self.temperature {
            params.insert("temperature".into(), json!(t));
        }
        if let Some(mt) = self.max_tokens {
            params.insert("max_tokens".into(), json!(mt));
        }
        if let Some(timeout) = self.timeout {
            params.insert("timeout".into(), json!(timeout.as_secs_f64()));
        }
        if let Some(stop) = &self.stop {
            params.insert("stop".into(), json!(stop));
        }
        params.insert("max_retries".into(), json!(self.max_retries));
        params
    }
}

impl fmt::Debug for ChatCompletionsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionsOptions")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("stop", &self.stop)
            .field("max_retries", &self.max_retries)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// `Option<Duration>` as fractional seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_f64(d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<f64>::deserialize(d)?;
        match secs {
            None => Ok(None),
            Some(s) if s.is_finite() && s >= 0.0 => Ok(Some(Duration::from_secs_f64(s))),
            Some(s) => Err(serde::de::Error::custom(format!(
                "timeout_secs must be a non-negative number, got {s}"
            ))),
        }
    }
}
