use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use log::warn;
use serde::Deserialize;

use crate::error::Error;
use crate::jwt::keys::{
    ec_thumbprint_input, jwk_thumbprint, rsa_public_key, rsa_thumbprint_input, EcCurve, EcPublicKey,
    KeyMaterial,
};

/// One `keys[]` member as published. Unused JWK members are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Jwk {
    pub kty: String,
    pub kid: String,
    pub alg: String,
    pub crv: String,
    pub n: String,
    pub e: String,
    pub x: String,
    pub y: String,
    pub k: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// A JWK that decoded into usable key material.
#[derive(Debug, Clone)]
pub struct DecodedJwk {
    pub kid: String,
    pub key: KeyMaterial,
}

/// Parses a JWKS document. Entries that cannot be used are logged and skipped.
pub fn decode_jwk_set(body: &[u8]) -> Result<Vec<DecodedJwk>, Error> {
    let set: JwkSet = serde_json::from_slice(body)?;
    let mut decoded = Vec::with_capacity(set.keys.len());
    for jwk in &set.keys {
        match decode_jwk(jwk) {
            Ok(Some(key)) => decoded.push(key),
            Ok(None) => warn!("unrecognized key type {:?} in jwks; skipping", jwk.kty),
            Err(err) => warn!(
                "skipping jwks key; kid={}, kty={}: {}",
                if jwk.kid.is_empty() { "<none>" } else { &jwk.kid },
                jwk.kty,
                err
            ),
        }
    }
    Ok(decoded)
}

/// `Ok(None)` for key types this crate does not verify with.
pub fn decode_jwk(jwk: &Jwk) -> Result<Option<DecodedJwk>, Error> {
    let decoded = match jwk.kty.as_str() {
        "RSA" => {
            let n = decode_member("n", &jwk.n)?;
            let e = decode_member("e", &jwk.e)?;
            let key = rsa_public_key(&n, &e)?;
            let kid = kid_or_else(&jwk.kid, || {
                jwk_thumbprint(&rsa_thumbprint_input(&jwk.e, &jwk.n))
            });
            DecodedJwk {
                kid,
                key: KeyMaterial::Rsa(key),
            }
        }
        "EC" => {
            let curve = resolve_curve(jwk);
            let x = decode_member("x", &jwk.x)?;
            let y = decode_member("y", &jwk.y)?;
            let key = EcPublicKey::from_coordinates(curve, &x, &y)?;
            let kid = kid_or_else(&jwk.kid, || {
                jwk_thumbprint(&ec_thumbprint_input(curve.name(), &jwk.x, &jwk.y))
            });
            DecodedJwk {
                kid,
                key: KeyMaterial::Ec(key),
            }
        }
        "oct" => {
            let secret = decode_member("k", &jwk.k)?;
            let kid = kid_or_else(&jwk.kid, || jwk_thumbprint(&jwk.k));
            DecodedJwk {
                kid,
                key: KeyMaterial::Symmetric(secret),
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(decoded))
}

/// `crv` wins, then the curve implied by `alg`, then P-256.
pub(super) fn resolve_curve(jwk: &Jwk) -> EcCurve {
    EcCurve::from_name(&jwk.crv)
        .or_else(|| EcCurve::from_alg(&jwk.alg))
        .unwrap_or(EcCurve::P256)
}

fn kid_or_else(kid: &str, thumbprint: impl FnOnce() -> String) -> String {
    if kid.is_empty() {
        thumbprint()
    } else {
        kid.to_string()
    }
}

fn decode_member(name: &str, value: &str) -> Result<Vec<u8>, Error> {
    if value.is_empty() {
        return Err(Error::Crypto(format!("jwk member {name} is missing")));
    }
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| Error::Crypto(format!("jwk member {name} is not base64url: {e}")))
}
