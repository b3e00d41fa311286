#![forbid(unsafe_code)]

mod config;
mod error;
mod jwt;

pub use config::VerifierConfig;
pub use error::Error;

pub use jwt::{
    decode_jwk, decode_jwk_set, decode_key_material, ec_thumbprint_input, extract_bearer,
    jwk_thumbprint, parse_authorization, parse_token, rsa_thumbprint_input, Algorithm,
    Authentication, ClaimsPolicy, DecodedJwk, EcCurve, EcPublicKey, EvictionPolicy, HashAlg, Jwk,
    JwkSet, JwksFetcher, JwtHeader, JwtVerifier, KeyMaterial, KeyOrigin, KeyRefresher,
    KeySource, KeyStore, ParsedToken, RefreshHandle, RefreshReport, SignatureFamily,
    VerifiedToken,
};
