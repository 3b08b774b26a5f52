use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::adapter_core::error::{SdkError, TransportError};

/// `{"error": {...}}` body returned by OpenAI-compatible servers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorErrorData {
    pub error: VendorInnerError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorInnerError {
    pub message: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub param: Option<JsonValue>,
    #[serde(default)]
    pub code: Option<JsonValue>,
}

/// Extract the vendor's error message from a response body, if it has one.
pub fn parse_vendor_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<VendorErrorData>(body)
        .ok()
        .map(|data| data.error.message)
}

/// Map a transport failure to the SDK error the caller sees.
pub fn map_transport_error_to_sdk_error(te: TransportError) -> SdkError {
    match te {
        TransportError::HttpStatus { status, .. } if status == 401 || status == 403 => {
            SdkError::Unauthorized
        }
        TransportError::HttpStatus {
            status: 429,
            retry_after_ms,
            ..
        } => SdkError::RateLimited {
            retry_after_ms,
            source: Some(Box::new(te)),
        },
        TransportError::HttpStatus { status, ref body, .. } => {
            let message = parse_vendor_error_message(body)
                .unwrap_or_else(|| format!("http status {}", status));
            SdkError::Upstream {
                status,
                message,
                source: Some(Box::new(te)),
            }
        }
        TransportError::ConnectTimeout(_)
        | TransportError::RequestTimeout(_)
        | TransportError::IdleReadTimeout(_) => SdkError::Timeout,
        other => SdkError::Transport(other),
    }
}
