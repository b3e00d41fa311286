#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid key configuration: {0}")]
    Config(String),
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("unsupported header: {0}")]
    UnsupportedHeader(String),
    #[error("unknown JWS algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("incorrect alg, expected {expected} got {actual}")]
    AlgorithmMismatch { expected: String, actual: String },
    #[error("signature invalid: {0}")]
    SignatureInvalid(String),
    #[error("payload missing required field {0}")]
    MissingClaim(String),
    #[error("invalid claim: {0}")]
    InvalidClaim(String),
    #[error("crypto error: {0}")]
    Crypto(String),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("jwks fetch failed: {0}")]
    Fetch(String),
}

impl Error {
    /// True for every failure produced while checking a presented token.
    ///
    /// Callers treat all of these the same way: the request is unauthenticated.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::MalformedToken(_)
                | Error::UnsupportedHeader(_)
                | Error::UnsupportedAlgorithm(_)
                | Error::AlgorithmMismatch { .. }
                | Error::SignatureInvalid(_)
                | Error::MissingClaim(_)
                | Error::InvalidClaim(_)
        )
    }

    /// Single diagnostic line for logs and error headers.
    pub fn rejection_message(&self) -> String {
        format!("token validation failed: {self}")
    }
}
