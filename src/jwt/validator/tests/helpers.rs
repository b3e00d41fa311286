use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::thread_rng;
use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::pss::BlindedSigningKey;
use rsa::{Pss, RsaPrivateKey};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Sha256, Sha384, Sha512};
use signature::{RandomizedSigner, SignatureEncoding, Signer};
use std::sync::{Arc, OnceLock};
use url::Url;

use crate::config::VerifierConfig;
use crate::jwt::algorithm::{Algorithm, HashAlg};
use crate::jwt::jwks::decode_jwk_set;
use crate::jwt::keys::{EvictionPolicy, KeyStore};
use crate::jwt::validator::JwtVerifier;

pub(super) const RSA_PRIVATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/rsa_private.pem"
));
pub(super) const RSA_PUBLIC: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/rsa_public.pem"
));
pub(super) const RSA_CERT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/rsa_cert.pem"
));
pub(super) const EC_PRIVATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/ec_p256_private.pem"
));
pub(super) const EC_PUBLIC: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/ec_p256_public.pem"
));
pub(super) const JWTIO_RSA_PUBLIC: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/jwtio_rsa_public.pem"
));
pub(super) const RSA_CERT_KID: &str = "d4g0BVkiUVjGA8HXfUCow-rzcF0";

#[derive(Debug, Deserialize)]
pub(super) struct JwsVector {
    pub(super) name: String,
    pub(super) jwks: Value,
    pub(super) token: String,
}

pub(super) fn jws_vector(name: &str) -> JwsVector {
    let vectors: Vec<JwsVector> = serde_json::from_str(include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/jws_vectors.json"
    )))
    .expect("vectors");
    vectors
        .into_iter()
        .find(|vector| vector.name == name)
        .expect("vector")
}

pub(super) fn rsa_private_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::from_pkcs8_pem(RSA_PRIVATE).expect("private key"))
}

/// Encodes header and claims and signs `header.payload` with `sign`.
pub(super) fn compact(header: &Value, claims: &Value, sign: impl FnOnce(&[u8]) -> Vec<u8>) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header).expect("header json"));
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("payload json"));
    let signing_input = format!("{}.{}", header_b64, payload_b64);
    let signature = sign(signing_input.as_bytes());
    format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature))
}

pub(super) fn rsa_pkcs1_sign(hash: HashAlg, message: &[u8]) -> Vec<u8> {
    let key = rsa_private_key().clone();
    match hash {
        HashAlg::Sha256 => RsaSigningKey::<Sha256>::new(key).sign(message).to_vec(),
        HashAlg::Sha384 => RsaSigningKey::<Sha384>::new(key).sign(message).to_vec(),
        HashAlg::Sha512 => RsaSigningKey::<Sha512>::new(key).sign(message).to_vec(),
    }
}

pub(super) fn rsa_pss_sign(hash: HashAlg, message: &[u8]) -> Vec<u8> {
    let key = rsa_private_key().clone();
    let mut rng = thread_rng();
    match hash {
        HashAlg::Sha256 => BlindedSigningKey::<Sha256>::new(key)
            .sign_with_rng(&mut rng, message)
            .to_vec(),
        HashAlg::Sha384 => BlindedSigningKey::<Sha384>::new(key)
            .sign_with_rng(&mut rng, message)
            .to_vec(),
        HashAlg::Sha512 => BlindedSigningKey::<Sha512>::new(key)
            .sign_with_rng(&mut rng, message)
            .to_vec(),
    }
}

/// PSS signature with an explicit salt length instead of the digest length.
pub(super) fn rsa_pss_sign_with_salt(hash: HashAlg, salt_len: usize, message: &[u8]) -> Vec<u8> {
    let padding = match hash {
        HashAlg::Sha256 => Pss::new_with_salt::<Sha256>(salt_len),
        HashAlg::Sha384 => Pss::new_with_salt::<Sha384>(salt_len),
        HashAlg::Sha512 => Pss::new_with_salt::<Sha512>(salt_len),
    };
    rsa_private_key()
        .sign_with_rng(&mut thread_rng(), padding, &hash.digest(message))
        .expect("pss sign")
}

pub(super) fn hmac_sign(hash: HashAlg, secret: &[u8], message: &[u8]) -> Vec<u8> {
    match hash {
        HashAlg::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("hmac key");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        HashAlg::Sha384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(secret).expect("hmac key");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        HashAlg::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(secret).expect("hmac key");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

pub(super) fn hs_token(alg: Algorithm, secret: &[u8], header: &Value, claims: &Value) -> String {
    compact(header, claims, |message| hmac_sign(alg.hash(), secret, message))
}

pub(super) fn verifier_with_keys(keys: &[&str]) -> JwtVerifier {
    let config = VerifierConfig {
        keys: keys.iter().map(|key| key.to_string()).collect(),
        ..VerifierConfig::default()
    };
    JwtVerifier::from_config(&config).expect("verifier")
}

/// A verifier whose store holds `jwks` as if fetched from a remote endpoint.
pub(super) fn verifier_with_jwks(jwks: &Value) -> JwtVerifier {
    let endpoint = Url::parse("https://issuer.example.com/jwks.json").expect("url");
    let store = KeyStore::new(vec![endpoint.clone()]);
    let keys = decode_jwk_set(jwks.to_string().as_bytes())
        .expect("jwks")
        .into_iter()
        .map(|jwk| (jwk.kid, jwk.key))
        .collect();
    store.apply_remote(&endpoint, keys, EvictionPolicy::Retain);
    JwtVerifier::new(Arc::new(store))
}
