//! Networked scale / IoT gateway source.
//!
//! `GET {base_url}/devices/{device_id}/readings?type=<gross|tare|axle>[&axle=<n>]`
//! answers `{ "reading": <number> }` on success and `{ "message": "..." }` otherwise.
use std::time::Duration;

use serde::Deserialize;
use weigh_traits::{ReadingSlot, ReadingSource};

use crate::error::{Result, SourceError};

#[derive(Debug, Deserialize)]
struct ReadingBody {
    reading: Option<f64>,
    message: Option<String>,
}

pub struct HttpSource {
    client: reqwest::blocking::Client,
    base_url: String,
    device_id: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, device_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| SourceError::Http(format!("build client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            device_id: device_id.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}/devices/{}/readings", self.base_url, self.device_id)
    }

    fn fetch(&self, slot: ReadingSlot, timeout: Duration) -> Result<f64> {
        let mut query: Vec<(&str, String)> = vec![("type", slot.kind().to_string())];
        if let Some(n) = slot.axle_number() {
            query.push(("axle", n.to_string()));
        }
        let response = self
            .client
            .get(self.url())
            .query(&query)
            .timeout(timeout)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout
                } else {
                    SourceError::Http(e.to_string())
                }
            })?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| SourceError::Http(format!("read body: {e}")))?;
        parse_body(status.is_success(), &text)
    }
}

fn parse_body(success: bool, text: &str) -> Result<f64> {
    let body: ReadingBody = serde_json::from_str(text)
        .map_err(|e| SourceError::Parse(format!("{e} ({})", text.trim())))?;
    match (success, body.reading, body.message) {
        (true, Some(v), _) if v.is_finite() => Ok(v),
        (true, Some(v), _) => Err(SourceError::Parse(format!("non-finite reading {v}"))),
        (_, _, Some(msg)) => Err(SourceError::Device(msg)),
        (true, None, None) => Err(SourceError::Unavailable("response without reading".into())),
        (false, _, None) => Err(SourceError::Http("request failed".into())),
    }
}

impl ReadingSource for HttpSource {
    fn poll(
        &mut self,
        slot: ReadingSlot,
        timeout: Duration,
    ) -> std::result::Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        match self.fetch(slot, timeout) {
            Ok(v) => {
                tracing::debug!(device = %self.device_id, %slot, reading = v, "http reading");
                Ok(v)
            }
            Err(e) => {
                tracing::warn!(device = %self.device_id, %slot, error = %e, "http reading failed");
                Err(Box::new(e))
            }
        }
    }
}
