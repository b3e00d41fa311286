mod decode;
mod provider;
mod refresh;
mod sanitize;

#[cfg(test)]
mod tests;

pub use decode::{decode_jwk, decode_jwk_set, DecodedJwk, Jwk, JwkSet};
pub use provider::JwksFetcher;
pub use refresh::{KeyRefresher, RefreshHandle, RefreshReport};
