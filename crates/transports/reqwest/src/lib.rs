//! `HttpTransport` backed by `reqwest`.

use crate::adapter_core::error::{display_body_for_error, TransportError};
use crate::adapter_core::transport::{
    emit_transport_event, ByteStream, HttpTransport, TransportConfig, TransportEvent,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::error::Error as StdError;
use std::time::{Duration, Instant, SystemTime};
use tracing::debug;

const LOG_TARGET: &str = "chat_adapter::transport::reqwest";

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    fn try_new_with_builder(
        cfg: &TransportConfig,
        builder: reqwest::ClientBuilder,
    ) -> Result<Self, TransportError> {
        let client = builder
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(cfg.connect_timeout)
            .build()
            .map_err(|err| {
                TransportError::Other(format!(
                    "reqwest client build failed: {}",
                    format_reqwest_error_chain(&err)
                ))
            })?;
        Ok(Self { client })
    }

    pub fn try_new(cfg: &TransportConfig) -> Result<Self, TransportError> {
        Self::try_new_with_builder(cfg, Client::builder())
    }

    /// The request timeout covers the whole exchange for JSON calls. Streams
    /// bound only the wait for response headers in `send`; their body reads
    /// fall under `idle_read_timeout`.
    fn build_request(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
        cfg: &TransportConfig,
        is_stream: bool,
    ) -> RequestBuilder {
        let mut req = self.client.post(url).json(body);
        for (k, v) in headers {
            // .json() already sets it
            if !k.eq_ignore_ascii_case("content-type") {
                req = req.header(k, v);
            }
        }
        if let (false, Some(timeout)) = (is_stream, cfg.request_timeout) {
            req = req.timeout(timeout);
        }
        req
    }

    /// Send and turn transport failures and non-2xx statuses into `TransportError`.
    async fn send(
        &self,
        req: RequestBuilder,
        url: &str,
        cfg: &TransportConfig,
        is_stream: bool,
    ) -> Result<Response, TransportError> {
        let started_at = SystemTime::now();
        let start = Instant::now();
        let observe = |status: Option<u16>, size: Option<usize>, error: Option<String>| {
            emit_transport_event(TransportEvent {
                started_at,
                latency: Some(start.elapsed()),
                method: "POST".to_string(),
                url: url.to_string(),
                status,
                response_size: size,
                error,
                is_stream,
            });
        };

        let sent = match (is_stream, cfg.request_timeout) {
            (true, Some(timeout)) => match tokio::time::timeout(timeout, req.send()).await {
                Ok(sent) => sent,
                Err(_) => {
                    debug!(target: LOG_TARGET, ?timeout, "no response headers before timeout");
                    observe(None, None, Some(format!("timed out after {timeout:?}")));
                    return Err(TransportError::RequestTimeout(timeout));
                }
            },
            _ => req.send().await,
        };
        let resp = match sent {
            Ok(resp) => resp,
            Err(e) => {
                let detail = format_reqwest_error_chain(&e);
                debug!(target: LOG_TARGET, %detail, "reqwest send failed");
                observe(None, None, Some(detail.clone()));
                return Err(map_send_error(&e, detail, cfg));
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let retry_after_ms = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|h| h.to_str().ok())
                .and_then(parse_retry_after_ms);
            let body_text = resp.text().await.unwrap_or_default();
            let sanitized = display_body_for_error(&body_text);
            debug!(
                target: LOG_TARGET,
                status = status.as_u16(),
                body = %sanitized,
                "upstream returned error status"
            );
            observe(
                Some(status.as_u16()),
                Some(body_text.len()),
                Some(format!("HTTP {}: {}", status.as_u16(), sanitized)),
            );
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                body: body_text,
                retry_after_ms,
                sanitized,
            });
        }

        observe(Some(status.as_u16()), resp.content_length().map(|n| n as usize), None);
        Ok(resp)
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json_stream(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
        cfg: &TransportConfig,
    ) -> Result<ByteStream, TransportError> {
        let req = self
            .build_request(url, headers, body, cfg, true)
            .header(reqwest::header::ACCEPT, "text/event-stream");
        let resp = self.send(req, url, cfg, true).await?;

        let idle = cfg.idle_read_timeout;
        let mut inner = resp.bytes_stream();
        let s = async_stream::try_stream! {
            loop {
                match tokio::time::timeout(idle, inner.next()).await {
                    Err(_) => Err(TransportError::IdleReadTimeout(idle))?,
                    Ok(None) => break,
                    Ok(Some(Err(e))) => {
                        if e.is_timeout() { Err(TransportError::IdleReadTimeout(idle))?; }
                        else { Err(TransportError::BodyRead(e.to_string()))?; }
                    }
                    Ok(Some(Ok(bytes))) => { yield bytes; }
                }
            }
        };
        Ok(Box::pin(s))
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
        cfg: &TransportConfig,
    ) -> Result<Value, TransportError> {
        let req = self.build_request(url, headers, body, cfg, false);
        let resp = self.send(req, url, cfg, false).await?;
        let text = resp.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::RequestTimeout(cfg.request_timeout.unwrap_or_default())
            } else {
                TransportError::BodyRead(e.to_string())
            }
        })?;
        let json: Value = serde_json::from_str(&text)
            .map_err(|_| TransportError::BodyRead("invalid json".into()))?;
        Ok(json)
    }
}

fn map_send_error(e: &reqwest::Error, detail: String, cfg: &TransportConfig) -> TransportError {
    if e.is_timeout() {
        match cfg.request_timeout {
            Some(timeout) if !e.is_connect() => TransportError::RequestTimeout(timeout),
            _ => TransportError::ConnectTimeout(cfg.connect_timeout),
        }
    } else if e.is_connect() {
        TransportError::Network(format!("connect: {detail}"))
    } else {
        TransportError::Network(detail)
    }
}

fn parse_retry_after_ms(s: &str) -> Option<u64> {
    // RFC 7231 also allows an HTTP date; only delta-seconds is supported
    let secs = s.trim().parse::<f64>().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some((secs * 1000.0) as u64)
    } else {
        None
    }
}

fn format_reqwest_error_chain(err: &reqwest::Error) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(src) = current {
        out.push_str(": ");
        out.push_str(&src.to_string());
        current = src.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_returns_transport_error_when_client_build_fails() {
        let cfg = TransportConfig::default();
        let err = match ReqwestTransport::try_new_with_builder(
            &cfg,
            Client::builder().user_agent("bad\nagent"),
        ) {
            Ok(_) => panic!("invalid user-agent should fail reqwest client build"),
            Err(err) => err,
        };
        match err {
            TransportError::Other(message) => {
                assert!(
                    message.contains("reqwest client build failed"),
                    "unexpected message: {message}"
                );
            }
            other => panic!("unexpected transport error variant: {other:?}"),
        }
    }

    #[test]
    fn retry_after_accepts_delta_seconds() {
        assert_eq!(parse_retry_after_ms("3"), Some(3000));
        assert_eq!(parse_retry_after_ms(" 0.5 "), Some(500));
        assert_eq!(parse_retry_after_ms("Wed, 21 Oct 2015 07:28:00 GMT"), None);
        assert_eq!(parse_retry_after_ms("-1"), None);
    }

    #[test]
    fn request_carries_per_call_timeout() {
        let transport = ReqwestTransport::default();
        let cfg = TransportConfig::default().with_request_timeout(Some(Duration::from_secs(7)));
        let req = transport
            .build_request(
                "https://example.test/v1/chat/completions",
                &[
                    ("authorization".into(), "Bearer k".into()),
                    ("content-type".into(), "text/plain".into()),
                ],
                &serde_json::json!({"model": "m"}),
                &cfg,
                false,
            )
            .build()
            .expect("request");
        assert_eq!(req.timeout(), Some(&Duration::from_secs(7)));
        assert_eq!(req.headers()["authorization"], "Bearer k");
        assert_eq!(req.headers()["content-type"], "application/json");
    }

    #[test]
    fn stream_request_has_no_whole_body_deadline() {
        let transport = ReqwestTransport::default();
        let cfg = TransportConfig::default().with_request_timeout(Some(Duration::from_secs(7)));
        let req = transport
            .build_request(
                "https://example.test/v1/chat/completions",
                &[],
                &serde_json::json!({"model": "m"}),
                &cfg,
                true,
            )
            .build()
            .expect("request");
        assert_eq!(req.timeout(), None);
    }

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Read one HTTP request (headers plus a `content-length` body).
    async fn read_request(sock: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = sock.read(&mut chunk).await.expect("read");
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    return;
                }
            }
        }
    }

    /// Serve one SSE response: wait `header_delay`, then send `frames`
    /// `gap` apart and close.
    async fn serve_sse(header_delay: Duration, frames: Vec<&'static str>, gap: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.expect("accept");
            read_request(&mut sock).await;
            tokio::time::sleep(header_delay).await;
            let head = "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n";
            if sock.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            for frame in frames {
                tokio::time::sleep(gap).await;
                if sock.write_all(frame.as_bytes()).await.is_err() {
                    return;
                }
                let _ = sock.flush().await;
            }
            let _ = sock.shutdown().await;
        });
        format!("http://{addr}/v1/chat/completions")
    }

    fn local_transport(cfg: &TransportConfig) -> ReqwestTransport {
        ReqwestTransport::try_new_with_builder(cfg, Client::builder().no_proxy())
            .expect("client")
    }

    #[tokio::test]
    async fn slow_stream_outlives_request_timeout() {
        let frames = vec!["data: t0\n\n", "data: t1\n\n", "data: t2\n\n", "data: t3\n\n"];
        let url = serve_sse(Duration::ZERO, frames, Duration::from_millis(150)).await;
        let cfg = TransportConfig::default().with_request_timeout(Some(Duration::from_millis(300)));
        let transport = local_transport(&cfg);

        let mut body = transport
            .post_json_stream(&url, &[], &serde_json::json!({"stream": true}), &cfg)
            .await
            .expect("response headers");
        let mut received = Vec::new();
        while let Some(item) = body.next().await {
            received.extend_from_slice(&item.expect("body chunk"));
        }
        assert_eq!(
            String::from_utf8(received).unwrap(),
            "data: t0\n\ndata: t1\n\ndata: t2\n\ndata: t3\n\n"
        );
    }

    #[tokio::test]
    async fn stream_times_out_waiting_for_headers() {
        let url = serve_sse(Duration::from_millis(500), vec![], Duration::ZERO).await;
        let cfg = TransportConfig::default().with_request_timeout(Some(Duration::from_millis(100)));
        let transport = local_transport(&cfg);

        match transport
            .post_json_stream(&url, &[], &serde_json::json!({"stream": true}), &cfg)
            .await
        {
            Err(TransportError::RequestTimeout(t)) => assert_eq!(t, Duration::from_millis(100)),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected a timeout"),
        }
    }
}
