use reqwest::Client as HttpClient;
use reqwest::Response;
use std::time::Duration;
use url::Url;

use super::decode::{decode_jwk_set, DecodedJwk};
use super::sanitize::{redact_jwks_uri, sanitize_error_body};
use super::super::constants::ERROR_BODY_PREVIEW_BYTES;
use crate::error::Error;

/// Downloads and decodes JWKS documents.
#[derive(Debug, Clone)]
pub struct JwksFetcher {
    http: HttpClient,
    timeout: Option<Duration>,
}

impl JwksFetcher {
    pub fn new() -> Result<Self, Error> {
        let http = HttpClient::builder().build()?;
        Ok(Self {
            http,
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_http_client(mut self, http: HttpClient) -> Self {
        self.http = http;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub async fn fetch(&self, jwks_uri: &Url) -> Result<Vec<DecodedJwk>, Error> {
        let mut req = self.http.get(jwks_uri.clone());
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let mut resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = read_body_preview(&mut resp).await?;
            let body_preview = sanitize_error_body(&body);
            let redacted = redact_jwks_uri(jwks_uri);
            return Err(Error::Fetch(if body_preview.is_empty() {
                format!(
                    "uri {} status {} body_read_len {}",
                    redacted,
                    status,
                    body.len()
                )
            } else {
                format!(
                    "uri {} status {} body_read_len {} body_preview {}",
                    redacted,
                    status,
                    body.len(),
                    body_preview
                )
            }));
        }
        let body = resp.bytes().await?;
        decode_jwk_set(&body)
    }
}

// Reads one byte past the preview size so the preview can mark truncation.
async fn read_body_preview(resp: &mut Response) -> Result<Vec<u8>, Error> {
    let limit = ERROR_BODY_PREVIEW_BYTES + 1;
    let mut body = Vec::new();
    while body.len() < limit {
        match resp.chunk().await? {
            Some(chunk) => {
                let take = (limit - body.len()).min(chunk.len());
                body.extend_from_slice(&chunk[..take]);
            }
            None => break,
        }
    }
    Ok(body)
}
