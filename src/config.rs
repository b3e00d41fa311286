use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::Error;
use crate::jwt::{Algorithm, ClaimsPolicy, EvictionPolicy, JwksFetcher};

const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 15 * 60;

/// Verifier settings, deserializable from the host's JSON or YAML config.
///
/// ```
/// use jwt_gatekeeper::VerifierConfig;
///
/// let config = VerifierConfig::from_json(
///     r#"{"keys": ["https://issuer.example.com/jwks.json"], "alg": "RS256"}"#,
/// )
/// .unwrap();
/// assert_eq!(config.alg.as_deref(), Some("RS256"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifierConfig {
    /// PEM certificates, PEM public keys, or JWKS URLs.
    pub keys: Vec<String>,
    /// Only accept tokens signed with this algorithm.
    pub alg: Option<String>,
    pub refresh_interval_secs: u64,
    /// Per-request JWKS fetch timeout; unset leaves the HTTP client default.
    pub fetch_timeout_secs: Option<u64>,
    pub eviction: EvictionPolicy,
    pub payload_fields: Vec<String>,
    pub required: bool,
    /// Request header name -> claim name.
    pub jwt_headers: BTreeMap<String, String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            alg: None,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            fetch_timeout_secs: None,
            eviction: EvictionPolicy::default(),
            payload_fields: Vec::new(),
            required: false,
            jwt_headers: BTreeMap::new(),
            issuer: None,
            audience: None,
        }
    }
}

impl VerifierConfig {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    pub fn with_alg(mut self, alg: impl Into<String>) -> Self {
        self.alg = Some(alg.into());
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval_secs = interval.as_secs();
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    pub fn with_payload_field(mut self, field: impl Into<String>) -> Self {
        self.payload_fields.push(field.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_jwt_header(mut self, header: impl Into<String>, claim: impl Into<String>) -> Self {
        self.jwt_headers.insert(header.into(), claim.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// The pinned algorithm; an empty string means none.
    pub fn pinned_algorithm(&self) -> Result<Option<Algorithm>, Error> {
        match self.alg.as_deref() {
            None | Some("") => Ok(None),
            Some(name) => Algorithm::from_name(name)
                .map(Some)
                .ok_or_else(|| Error::Config(format!("unknown pinned algorithm {name}"))),
        }
    }

    pub fn claims_policy(&self) -> ClaimsPolicy {
        let mut policy = ClaimsPolicy::new()
            .with_payload_fields(self.payload_fields.iter().cloned())
            .with_required(self.required);
        for (header, claim) in &self.jwt_headers {
            policy = policy.with_forwarded_header(header.clone(), claim.clone());
        }
        if let Some(issuer) = &self.issuer {
            policy = policy.with_issuer(issuer.clone());
        }
        if let Some(audience) = &self.audience {
            policy = policy.with_audience(audience.clone());
        }
        policy
    }

    pub fn fetcher(&self) -> Result<JwksFetcher, Error> {
        let fetcher = JwksFetcher::new()?;
        Ok(match self.fetch_timeout_secs {
            Some(secs) => fetcher.with_timeout(Duration::from_secs(secs)),
            None => fetcher,
        })
    }
}
