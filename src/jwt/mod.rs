mod algorithm;
mod constants;
mod jwks;
mod keys;
mod types;
mod validator;

pub use algorithm::{Algorithm, HashAlg, SignatureFamily};
pub use jwks::{
    decode_jwk, decode_jwk_set, DecodedJwk, Jwk, JwkSet, JwksFetcher, KeyRefresher,
    RefreshHandle, RefreshReport,
};
pub use keys::{
    decode_key_material, ec_thumbprint_input, jwk_thumbprint, rsa_thumbprint_input, EcCurve,
    EcPublicKey, EvictionPolicy, KeyMaterial, KeyOrigin, KeySource, KeyStore,
};
pub use types::{Authentication, JwtHeader, ParsedToken, VerifiedToken};
pub use validator::{
    extract_bearer, parse_authorization, parse_token, ClaimsPolicy, JwtVerifier,
};
