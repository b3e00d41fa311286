use serde_json::{json, Map, Value};

use super::algorithm::Algorithm;

/// Protected header members the verifier understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JwtHeader {
    pub alg: String,
    pub kid: Option<String>,
    pub typ: Option<String>,
    pub cty: Option<String>,
    pub crit: Vec<String>,
}

/// A structurally valid compact token, not yet verified.
#[derive(Debug, Clone)]
pub struct ParsedToken {
    pub header: JwtHeader,
    pub claims: Map<String, Value>,
    /// `header.payload` exactly as received; signatures are checked over these bytes.
    pub signing_input: String,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub header: JwtHeader,
    pub claims: Map<String, Value>,
    /// `None` when the verifier runs without keys and accepts claims unchecked.
    pub algorithm: Option<Algorithm>,
    /// Store entry whose key validated the signature.
    pub key_id: Option<String>,
}

/// Outcome of [`JwtVerifier::authenticate`](crate::JwtVerifier::authenticate).
#[derive(Debug, Clone)]
pub enum Authentication {
    /// No `Authorization` header, or one that is not a bearer token.
    NoToken,
    Verified(VerifiedToken),
}

impl VerifiedToken {
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn subject(&self) -> Option<&str> {
        self.claims.get("sub").and_then(Value::as_str)
    }

    pub fn signature_checked(&self) -> bool {
        self.algorithm.is_some()
    }

    /// `tokenHeader`/`tokenPayload` members of an authorization policy query.
    ///
    /// Absent header members are rendered as empty strings and an empty list.
    pub fn policy_input(&self) -> Value {
        json!({
            "tokenHeader": {
                "alg": self.header.alg,
                "kid": self.header.kid.as_deref().unwrap_or_default(),
                "typ": self.header.typ.as_deref().unwrap_or_default(),
                "cty": self.header.cty.as_deref().unwrap_or_default(),
                "crit": self.header.crit,
            },
            "tokenPayload": self.claims,
        })
    }
}

impl Authentication {
    pub fn verified(&self) -> Option<&VerifiedToken> {
        match self {
            Authentication::NoToken => None,
            Authentication::Verified(token) => Some(token),
        }
    }

    pub fn into_verified(self) -> Option<VerifiedToken> {
        match self {
            Authentication::NoToken => None,
            Authentication::Verified(token) => Some(token),
        }
    }
}
