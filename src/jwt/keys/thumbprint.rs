use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// SHA-256 of the canonical JWK string, base64url without padding.
///
/// The input must already be canonical: required members only, in
/// lexicographic order, no whitespace. Use [`rsa_thumbprint_input`] and
/// [`ec_thumbprint_input`] to build it. Symmetric keys hash the raw `k` value.
pub fn jwk_thumbprint(canonical: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
}

pub fn rsa_thumbprint_input(e: &str, n: &str) -> String {
    format!(r#"{{"e":"{e}","kty":"RSA","n":"{n}"}}"#)
}

pub fn ec_thumbprint_input(crv: &str, x: &str, y: &str) -> String {
    format!(r#"{{"crv":"{crv}","kty":"EC","x":"{x}","y":"{y}"}}"#)
}
