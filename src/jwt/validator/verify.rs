use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};
use signature::hazmat::PrehashVerifier;

use super::pss::verify_pss;
use crate::error::Error;
use crate::jwt::algorithm::{Algorithm, HashAlg, SignatureFamily};
use crate::jwt::keys::{left_pad, EcPublicKey, KeyMaterial};

impl Algorithm {
    /// Checks `signature` over `signing_input` with `key`.
    ///
    /// A key of the wrong family is a verification failure, not a different error.
    pub fn verify(
        self,
        key: &KeyMaterial,
        signing_input: &[u8],
        signature: &[u8],
    ) -> Result<(), Error> {
        match (self.family(), key) {
            (SignatureFamily::Hmac, KeyMaterial::Symmetric(secret)) => {
                verify_hmac(self.hash(), secret, signing_input, signature)
            }
            (SignatureFamily::RsaPkcs1, KeyMaterial::Rsa(key)) => {
                verify_rsa(RsaPadding::Pkcs1v15, self.hash(), key, signing_input, signature)
            }
            (SignatureFamily::RsaPss, KeyMaterial::Rsa(key)) => {
                verify_rsa(RsaPadding::Pss, self.hash(), key, signing_input, signature)
            }
            (SignatureFamily::Ecdsa, KeyMaterial::Ec(key)) => {
                verify_ecdsa(self.hash(), key, signing_input, signature)
            }
            (_, key) => Err(Error::SignatureInvalid(format!(
                "{} key cannot verify {}",
                key.family(),
                self
            ))),
        }
    }
}

#[derive(Clone, Copy)]
enum RsaPadding {
    Pkcs1v15,
    Pss,
}

fn verify_hmac(hash: HashAlg, secret: &[u8], message: &[u8], signature: &[u8]) -> Result<(), Error> {
    let matches = match hash {
        HashAlg::Sha256 => mac_matches::<Hmac<Sha256>>(secret, message, signature),
        HashAlg::Sha384 => mac_matches::<Hmac<Sha384>>(secret, message, signature),
        HashAlg::Sha512 => mac_matches::<Hmac<Sha512>>(secret, message, signature),
    };
    if matches {
        Ok(())
    } else {
        Err(Error::SignatureInvalid("hmac mismatch".to_string()))
    }
}

// verify_slice compares in constant time.
fn mac_matches<M: Mac + KeyInit>(secret: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(mut mac) = <M as KeyInit>::new_from_slice(secret) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(signature).is_ok()
}

fn verify_rsa(
    padding: RsaPadding,
    hash: HashAlg,
    key: &RsaPublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), Error> {
    let digest = hash.digest(message);
    let result = match (padding, hash) {
        (RsaPadding::Pkcs1v15, HashAlg::Sha256) => {
            key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
        }
        (RsaPadding::Pkcs1v15, HashAlg::Sha384) => {
            key.verify(Pkcs1v15Sign::new::<Sha384>(), &digest, signature)
        }
        (RsaPadding::Pkcs1v15, HashAlg::Sha512) => {
            key.verify(Pkcs1v15Sign::new::<Sha512>(), &digest, signature)
        }
        (RsaPadding::Pss, _) => return verify_pss(hash, key, &digest, signature),
    };
    result.map_err(|e| Error::SignatureInvalid(format!("rsa verify error: {e}")))
}

fn verify_ecdsa(
    hash: HashAlg,
    key: &EcPublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), Error> {
    let raw = normalize_ecdsa_signature(signature, key.curve().field_size())?;
    let digest = hash.digest(message);
    let invalid = |e: signature::Error| Error::SignatureInvalid(format!("ecdsa verify error: {e}"));
    match key {
        EcPublicKey::P256(key) => {
            let sig = p256::ecdsa::Signature::from_slice(&raw).map_err(invalid)?;
            key.verify_prehash(&digest, &sig).map_err(invalid)
        }
        EcPublicKey::P384(key) => {
            let sig = p384::ecdsa::Signature::from_slice(&raw).map_err(invalid)?;
            key.verify_prehash(&digest, &sig).map_err(invalid)
        }
        EcPublicKey::P521(key) => {
            let sig = p521::ecdsa::Signature::from_slice(&raw).map_err(invalid)?;
            key.verify_prehash(&digest, &sig).map_err(invalid)
        }
    }
}

/// Splits `r || s` in half and left-pads each half to the curve's scalar size.
fn normalize_ecdsa_signature(signature: &[u8], size: usize) -> Result<Vec<u8>, Error> {
    if signature.is_empty() || signature.len() % 2 != 0 {
        return Err(Error::SignatureInvalid(format!(
            "invalid ecdsa signature length {}",
            signature.len()
        )));
    }
    let (r, s) = signature.split_at(signature.len() / 2);
    let (Some(r), Some(s)) = (left_pad(r, size), left_pad(s, size)) else {
        return Err(Error::SignatureInvalid(
            "ecdsa signature component too large for curve".to_string(),
        ));
    };
    let mut out = r;
    out.extend_from_slice(&s);
    Ok(out)
}
