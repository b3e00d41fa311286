mod pem;
mod store;
mod thumbprint;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use p256::ecdsa::VerifyingKey as P256VerifyingKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p384::ecdsa::VerifyingKey as P384VerifyingKey;
use p521::ecdsa::VerifyingKey as P521VerifyingKey;
use pkcs8::spki::SubjectPublicKeyInfoRef;
use pkcs8::{DecodePublicKey, ObjectIdentifier};
use rsa::pkcs1::der::Decode;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};
use std::fmt;
use url::Url;

use super::constants::MAX_RSA_MODULUS_BITS;
use crate::error::Error;

pub use pem::{decode_key_material, KeySource};
pub use store::{EvictionPolicy, KeyStore};
pub use thumbprint::{ec_thumbprint_input, jwk_thumbprint, rsa_thumbprint_input};

const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// Verification key of one of the supported families.
#[derive(Clone)]
pub enum KeyMaterial {
    Rsa(RsaPublicKey),
    Ec(EcPublicKey),
    Symmetric(Vec<u8>),
}

#[derive(Clone)]
pub enum EcPublicKey {
    P256(P256VerifyingKey),
    P384(P384VerifyingKey),
    P521(P521VerifyingKey),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EcCurve {
    P256,
    P384,
    P521,
}

/// Where a stored key came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyOrigin {
    Local,
    Remote(Url),
}

impl KeyMaterial {
    pub fn family(&self) -> &'static str {
        match self {
            KeyMaterial::Rsa(_) => "RSA",
            KeyMaterial::Ec(_) => "EC",
            KeyMaterial::Symmetric(_) => "Symmetric",
        }
    }

    /// RFC 7638 style thumbprint of the key's canonical JWK members.
    pub fn thumbprint(&self) -> String {
        match self {
            KeyMaterial::Rsa(key) => {
                let e = URL_SAFE_NO_PAD.encode(key.e().to_bytes_be());
                let n = URL_SAFE_NO_PAD.encode(key.n().to_bytes_be());
                jwk_thumbprint(&rsa_thumbprint_input(&e, &n))
            }
            KeyMaterial::Ec(key) => {
                let (x, y) = key.coordinates();
                jwk_thumbprint(&ec_thumbprint_input(
                    key.curve().name(),
                    &URL_SAFE_NO_PAD.encode(x),
                    &URL_SAFE_NO_PAD.encode(y),
                ))
            }
            KeyMaterial::Symmetric(secret) => jwk_thumbprint(&URL_SAFE_NO_PAD.encode(secret)),
        }
    }

    /// Decodes a DER SubjectPublicKeyInfo holding an RSA or NIST EC key.
    pub(crate) fn from_public_key_der(der: &[u8]) -> Result<Self, Error> {
        let spki = SubjectPublicKeyInfoRef::try_from(der)
            .map_err(|e| Error::Crypto(format!("invalid public key info: {e}")))?;
        if spki.algorithm.oid == RSA_ENCRYPTION_OID {
            let pkcs1 = spki
                .subject_public_key
                .as_bytes()
                .ok_or_else(|| Error::Crypto("rsa public key has unused bits".to_string()))?;
            return rsa_from_pkcs1_der(pkcs1).map(KeyMaterial::Rsa);
        }
        EcPublicKey::from_public_key_der(der).map(KeyMaterial::Ec)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Rsa(key) => f
                .debug_struct("Rsa")
                .field("bits", &(key.size() * 8))
                .finish(),
            KeyMaterial::Ec(key) => f.debug_struct("Ec").field("curve", &key.curve()).finish(),
            KeyMaterial::Symmetric(secret) => f
                .debug_struct("Symmetric")
                .field("len", &secret.len())
                .finish_non_exhaustive(),
        }
    }
}

impl fmt::Debug for EcPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EcPublicKey").field(&self.curve()).finish()
    }
}

impl EcCurve {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "P-256" => Some(EcCurve::P256),
            "P-384" => Some(EcCurve::P384),
            "P-521" => Some(EcCurve::P521),
            _ => None,
        }
    }

    /// Curve implied by an ECDSA `alg` value.
    pub fn from_alg(alg: &str) -> Option<Self> {
        match alg {
            "ES256" => Some(EcCurve::P256),
            "ES384" => Some(EcCurve::P384),
            "ES512" => Some(EcCurve::P521),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EcCurve::P256 => "P-256",
            EcCurve::P384 => "P-384",
            EcCurve::P521 => "P-521",
        }
    }

    /// Size in bytes of one coordinate or scalar.
    pub fn field_size(self) -> usize {
        match self {
            EcCurve::P256 => 32,
            EcCurve::P384 => 48,
            EcCurve::P521 => 66,
        }
    }
}

impl EcPublicKey {
    pub fn curve(&self) -> EcCurve {
        match self {
            EcPublicKey::P256(_) => EcCurve::P256,
            EcPublicKey::P384(_) => EcCurve::P384,
            EcPublicKey::P521(_) => EcCurve::P521,
        }
    }

    /// Builds a key from big-endian affine coordinates; short values are left-padded.
    pub fn from_coordinates(curve: EcCurve, x: &[u8], y: &[u8]) -> Result<Self, Error> {
        let size = curve.field_size();
        let x = left_pad(x, size)
            .ok_or_else(|| Error::Crypto(format!("{} x coordinate too long", curve.name())))?;
        let y = left_pad(y, size)
            .ok_or_else(|| Error::Crypto(format!("{} y coordinate too long", curve.name())))?;
        let mut sec1 = Vec::with_capacity(1 + 2 * size);
        sec1.push(0x04);
        sec1.extend_from_slice(&x);
        sec1.extend_from_slice(&y);
        let invalid = |e: signature::Error| {
            Error::Crypto(format!("{} public key error: {e}", curve.name()))
        };
        match curve {
            EcCurve::P256 => P256VerifyingKey::from_sec1_bytes(&sec1)
                .map(EcPublicKey::P256)
                .map_err(invalid),
            EcCurve::P384 => P384VerifyingKey::from_sec1_bytes(&sec1)
                .map(EcPublicKey::P384)
                .map_err(invalid),
            EcCurve::P521 => P521VerifyingKey::from_sec1_bytes(&sec1)
                .map(EcPublicKey::P521)
                .map_err(invalid),
        }
    }

    fn from_public_key_der(der: &[u8]) -> Result<Self, Error> {
        if let Ok(public_key) = p256::PublicKey::from_public_key_der(der) {
            let encoded = public_key.to_encoded_point(false);
            let key = P256VerifyingKey::from_encoded_point(&encoded)
                .map_err(|e| Error::Crypto(format!("p256 public key error: {e}")))?;
            return Ok(EcPublicKey::P256(key));
        }
        if let Ok(public_key) = p384::PublicKey::from_public_key_der(der) {
            let encoded = public_key.to_encoded_point(false);
            let key = P384VerifyingKey::from_encoded_point(&encoded)
                .map_err(|e| Error::Crypto(format!("p384 public key error: {e}")))?;
            return Ok(EcPublicKey::P384(key));
        }
        if let Ok(public_key) = p521::PublicKey::from_public_key_der(der) {
            let encoded = public_key.to_encoded_point(false);
            let key = P521VerifyingKey::from_encoded_point(&encoded)
                .map_err(|e| Error::Crypto(format!("p521 public key error: {e}")))?;
            return Ok(EcPublicKey::P521(key));
        }
        Err(Error::Crypto("unsupported public key".to_string()))
    }

    /// Affine `(x, y)` coordinates, each padded to the curve's field size.
    pub fn coordinates(&self) -> (Vec<u8>, Vec<u8>) {
        let (x, y) = match self {
            EcPublicKey::P256(key) => {
                let point = key.to_encoded_point(false);
                (point.x().map(|v| v.to_vec()), point.y().map(|v| v.to_vec()))
            }
            EcPublicKey::P384(key) => {
                let point = key.to_encoded_point(false);
                (point.x().map(|v| v.to_vec()), point.y().map(|v| v.to_vec()))
            }
            EcPublicKey::P521(key) => {
                let point = key.to_encoded_point(false);
                (point.x().map(|v| v.to_vec()), point.y().map(|v| v.to_vec()))
            }
        };
        (x.unwrap_or_default(), y.unwrap_or_default())
    }
}

/// RSA key from big-endian modulus and exponent, allowing moduli up to 16384 bits.
pub(crate) fn rsa_public_key(n: &[u8], e: &[u8]) -> Result<RsaPublicKey, Error> {
    RsaPublicKey::new_with_max_size(
        BigUint::from_bytes_be(n),
        BigUint::from_bytes_be(e),
        MAX_RSA_MODULUS_BITS,
    )
    .map_err(|e| Error::Crypto(format!("rsa public key error: {e}")))
}

pub(crate) fn rsa_from_pkcs1_der(der: &[u8]) -> Result<RsaPublicKey, Error> {
    let key = rsa::pkcs1::RsaPublicKey::from_der(der)
        .map_err(|e| Error::Crypto(format!("invalid pkcs1 public key: {e}")))?;
    rsa_public_key(key.modulus.as_bytes(), key.public_exponent.as_bytes())
}

/// Strips leading zeros and left-pads to `size`; `None` when the value does not fit.
pub(crate) fn left_pad(bytes: &[u8], size: usize) -> Option<Vec<u8>> {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let trimmed = &bytes[start..];
    if trimmed.len() > size {
        return None;
    }
    let mut padded = vec![0u8; size - trimmed.len()];
    padded.extend_from_slice(trimmed);
    Some(padded)
}
