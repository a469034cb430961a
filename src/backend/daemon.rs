//! Daemon formatting strategy
//!
//! One synchronous HTTP POST per request, options encoded as headers the
//! way the daemon protocol expects: `X-Fast-Or-Safe` and an optional
//! `X-Line-Length`. Status mapping: 204 = no change, 200 = formatted
//! body, anything else = failure with the body as diagnostics.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::backend::outcome::{Backend, FormatOutcome};

/// Fast-vs-safe formatting mode, sent as the `X-Fast-Or-Safe` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatMode {
    Fast,
    #[default]
    Safe,
}

impl FormatMode {
    fn header_value(self) -> &'static str {
        match self {
            FormatMode::Fast => "fast",
            FormatMode::Safe => "safe",
        }
    }
}

/// Blocking HTTP client for a running formatter daemon.
pub struct DaemonClient {
    endpoint: String,
    timeout: Duration,
    mode: FormatMode,
    line_length: Option<u32>,
    client: reqwest::blocking::Client,
}

impl DaemonClient {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        mode: FormatMode,
        line_length: Option<u32>,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build daemon HTTP client")?;
        Ok(Self {
            endpoint: endpoint.into(),
            timeout,
            mode,
            line_length,
            client,
        })
    }

    fn request(&self, content: &[u8]) -> FormatOutcome {
        let mut req = self
            .client
            .post(&self.endpoint)
            .header("X-Fast-Or-Safe", self.mode.header_value())
            .body(content.to_vec());
        if let Some(width) = self.line_length {
            req = req.header("X-Line-Length", width);
        }

        let response = match req.send() {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return FormatOutcome::failed(
                    &self.endpoint,
                    format!(
                        "request to {} timed out after {:?}",
                        self.endpoint, self.timeout
                    ),
                );
            }
            Err(err) => return FormatOutcome::failed(&self.endpoint, format!("{err:#}")),
        };

        let status = response.status();
        debug!(%status, endpoint = %self.endpoint, "daemon response");
        let body = response.text().unwrap_or_default();

        match status.as_u16() {
            204 => FormatOutcome::NoChange,
            200 => FormatOutcome::Formatted(body),
            code => FormatOutcome::failed(&self.endpoint, format!("HTTP {code}: {body}")),
        }
    }
}

impl Backend for DaemonClient {
    fn name(&self) -> &str {
        &self.endpoint
    }

    fn format(&self, content: &[u8]) -> FormatOutcome {
        self.request(content)
    }
}
