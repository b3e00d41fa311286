use std::time::Duration;

/// Header names a token may list in `crit`.
pub(super) const SUPPORTED_HEADER_NAMES: &[&str] = &["alg", "kid", "typ", "cty", "crit"];
pub(super) const BEARER_PREFIX: &str = "Bearer ";
pub(crate) const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);
pub(super) const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);
pub(super) const ERROR_BODY_PREVIEW_BYTES: usize = 128;
pub(super) const MAX_RSA_MODULUS_BITS: usize = 16384;
