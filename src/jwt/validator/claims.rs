use log::warn;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::Error;

/// Post-verification checks and claim projection applied by
/// [`JwtVerifier::authenticate`](crate::JwtVerifier::authenticate).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimsPolicy {
    payload_fields: Vec<String>,
    required: bool,
    forwarded_headers: Vec<(String, String)>,
    issuer: Option<String>,
    audience: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrSet {
    Single(String),
    Multiple(HashSet<String>),
}

impl StringOrSet {
    fn contains(&self, expected: &str) -> bool {
        match self {
            StringOrSet::Single(value) => value == expected,
            StringOrSet::Multiple(values) => values.contains(expected),
        }
    }
}

impl ClaimsPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims every token is expected to carry.
    pub fn with_payload_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.payload_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Reject, rather than log, tokens missing a payload field.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Forward the string value of `claim` as request header `header`.
    pub fn with_forwarded_header(
        mut self,
        header: impl Into<String>,
        claim: impl Into<String>,
    ) -> Self {
        self.forwarded_headers.push((header.into(), claim.into()));
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

    pub fn payload_fields(&self) -> &[String] {
        &self.payload_fields
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn check(&self, claims: &Map<String, Value>) -> Result<(), Error> {
        for field in &self.payload_fields {
            if claims.contains_key(field) {
                continue;
            }
            if self.required {
                return Err(Error::MissingClaim(field.clone()));
            }
            warn!(
                "token missing payload field {}; sub={}",
                field,
                claims.get("sub").map(Value::to_string).unwrap_or_default()
            );
        }
        if let Some(issuer) = &self.issuer {
            check_string_or_set(claims, "iss", issuer)?;
        }
        if let Some(audience) = &self.audience {
            check_string_or_set(claims, "aud", audience)?;
        }
        Ok(())
    }

    /// `(header, value)` pairs for every configured claim present as a string.
    pub fn forwarded_headers(&self, claims: &Map<String, Value>) -> Vec<(String, String)> {
        self.forwarded_headers
            .iter()
            .filter_map(|(header, claim)| {
                let value = claims.get(claim)?.as_str()?;
                Some((header.clone(), value.to_string()))
            })
            .collect()
    }
}

fn check_string_or_set(claims: &Map<String, Value>, name: &str, expected: &str) -> Result<(), Error> {
    let Some(value) = claims.get(name) else {
        return Err(Error::InvalidClaim(format!("{name} missing")));
    };
    match StringOrSet::deserialize(value) {
        Ok(parsed) if parsed.contains(expected) => Ok(()),
        Ok(_) => Err(Error::InvalidClaim(format!("{name} does not match"))),
        Err(_) => Err(Error::InvalidClaim(format!(
            "{name} is not a string or string array"
        ))),
    }
}
