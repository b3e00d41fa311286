use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::jwt::constants::BEARER_PREFIX;
use crate::jwt::types::{JwtHeader, ParsedToken};

struct JwtParts<'a> {
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
}

#[derive(Deserialize)]
struct RawHeader {
    #[serde(default)]
    alg: Option<String>,
    #[serde(default)]
    kid: Option<String>,
    #[serde(default)]
    typ: Option<String>,
    #[serde(default)]
    cty: Option<String>,
    #[serde(default)]
    crit: Option<Vec<String>>,
}

/// The token after the literal `Bearer ` prefix; `None` means no token was presented.
pub fn extract_bearer(authorization: Option<&str>) -> Option<&str> {
    authorization?.strip_prefix(BEARER_PREFIX)
}

/// Splits and decodes a compact JWS. Every structural failure is `MalformedToken`.
pub fn parse_token(token: &str) -> Result<ParsedToken, Error> {
    let parts = split_jwt(token)?;
    let header_bytes = base64_url_decode("header", parts.header)?;
    let payload_bytes = base64_url_decode("payload", parts.payload)?;
    let signature = base64_url_decode("signature", parts.signature)?;
    let header = decode_jwt_header(&header_bytes)?;
    let claims = decode_claims(&payload_bytes)?;
    let signing_input = token[..parts.header.len() + 1 + parts.payload.len()].to_string();
    Ok(ParsedToken {
        header,
        claims,
        signing_input,
        signature,
    })
}

/// [`extract_bearer`] followed by [`parse_token`].
pub fn parse_authorization(authorization: Option<&str>) -> Result<Option<ParsedToken>, Error> {
    extract_bearer(authorization).map(parse_token).transpose()
}

fn split_jwt(token: &str) -> Result<JwtParts<'_>, Error> {
    let mut iter = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (iter.next(), iter.next(), iter.next(), iter.next())
    else {
        return Err(Error::MalformedToken("invalid token format".to_string()));
    };
    Ok(JwtParts {
        header,
        payload,
        signature,
    })
}

fn decode_jwt_header(bytes: &[u8]) -> Result<JwtHeader, Error> {
    let raw: RawHeader = serde_json::from_slice(bytes)
        .map_err(|e| Error::MalformedToken(format!("header is not a JSON object: {e}")))?;
    Ok(JwtHeader {
        alg: raw.alg.unwrap_or_default(),
        kid: raw.kid,
        typ: raw.typ,
        cty: raw.cty,
        crit: raw.crit.unwrap_or_default(),
    })
}

fn decode_claims(bytes: &[u8]) -> Result<Map<String, Value>, Error> {
    match serde_json::from_slice(bytes) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(_) => Err(Error::MalformedToken(
            "payload is not a JSON object".to_string(),
        )),
        Err(e) => Err(Error::MalformedToken(format!("payload is not JSON: {e}"))),
    }
}

fn base64_url_decode(segment: &str, data: &str) -> Result<Vec<u8>, Error> {
    URL_SAFE_NO_PAD
        .decode(data)
        .map_err(|e| Error::MalformedToken(format!("{segment} is not base64url: {e}")))
}
