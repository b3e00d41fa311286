mod claims;
mod parts;
mod pss;
mod verify;

#[cfg(test)]
mod tests;

use log::debug;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::algorithm::Algorithm;
use super::constants::SUPPORTED_HEADER_NAMES;
use super::jwks::{KeyRefresher, RefreshHandle};
use super::keys::KeyStore;
use super::types::{Authentication, ParsedToken, VerifiedToken};
use crate::config::VerifierConfig;
use crate::error::Error;

pub use claims::ClaimsPolicy;
pub use parts::{extract_bearer, parse_authorization, parse_token};

/// Checks bearer tokens against a shared [`KeyStore`].
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    store: Arc<KeyStore>,
    pinned_alg: Option<Algorithm>,
    claims: ClaimsPolicy,
}

impl JwtVerifier {
    pub fn new(store: Arc<KeyStore>) -> Self {
        Self {
            store,
            pinned_alg: None,
            claims: ClaimsPolicy::default(),
        }
    }

    pub fn from_config(config: &VerifierConfig) -> Result<Self, Error> {
        let store = KeyStore::from_sources(&config.keys)?;
        let mut verifier = Self::new(Arc::new(store)).with_claims_policy(config.claims_policy());
        if let Some(alg) = config.pinned_algorithm()? {
            verifier = verifier.with_pinned_algorithm(alg);
        }
        Ok(verifier)
    }

    /// Builds the verifier and, when JWKS endpoints are configured, starts refreshing them.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &VerifierConfig) -> Result<(Arc<Self>, Option<RefreshHandle>), Error> {
        let verifier = Arc::new(Self::from_config(config)?);
        let handle = if verifier.store.endpoints().is_empty() {
            None
        } else {
            Some(
                verifier
                    .refresher(config)?
                    .spawn(CancellationToken::new()),
            )
        };
        Ok((verifier, handle))
    }

    pub fn refresher(&self, config: &VerifierConfig) -> Result<KeyRefresher, Error> {
        Ok(KeyRefresher::new(Arc::clone(&self.store), config.fetcher()?)
            .with_interval(config.refresh_interval())
            .with_eviction(config.eviction))
    }

    pub fn with_pinned_algorithm(mut self, alg: Algorithm) -> Self {
        self.pinned_alg = Some(alg);
        self
    }

    pub fn with_claims_policy(mut self, claims: ClaimsPolicy) -> Self {
        self.claims = claims;
        self
    }

    pub fn store(&self) -> &Arc<KeyStore> {
        &self.store
    }

    pub fn pinned_algorithm(&self) -> Option<Algorithm> {
        self.pinned_alg
    }

    pub fn claims_policy(&self) -> &ClaimsPolicy {
        &self.claims
    }

    /// With no keys and no endpoints configured the token is accepted unchecked.
    pub fn verify_token(&self, token: ParsedToken) -> Result<VerifiedToken, Error> {
        if self.store.is_unconfigured() {
            return Ok(VerifiedToken {
                header: token.header,
                claims: token.claims,
                algorithm: None,
                key_id: None,
            });
        }

        if let Some(name) = token
            .header
            .crit
            .iter()
            .find(|name| !SUPPORTED_HEADER_NAMES.contains(&name.as_str()))
        {
            return Err(Error::UnsupportedHeader(name.clone()));
        }
        let alg = Algorithm::from_name(&token.header.alg)
            .ok_or_else(|| Error::UnsupportedAlgorithm(token.header.alg.clone()))?;
        if let Some(expected) = self.pinned_alg {
            if expected != alg {
                return Err(Error::AlgorithmMismatch {
                    expected: expected.to_string(),
                    actual: alg.to_string(),
                });
            }
        }

        let message = token.signing_input.as_bytes();
        let key_id = match token
            .header
            .kid
            .as_deref()
            .and_then(|kid| self.store.get(kid).map(|key| (kid, key)))
        {
            Some((kid, key)) => {
                alg.verify(&key, message, &token.signature)?;
                kid.to_string()
            }
            None => self.search_all_keys(alg, message, &token.signature)?,
        };

        Ok(VerifiedToken {
            header: token.header,
            claims: token.claims,
            algorithm: Some(alg),
            key_id: Some(key_id),
        })
    }

    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Authentication, Error> {
        let Some(token) = parse_authorization(authorization)? else {
            return Ok(Authentication::NoToken);
        };
        let verified = self.verify_token(token)?;
        self.claims.check(&verified.claims)?;
        Ok(Authentication::Verified(verified))
    }

    pub fn forwarded_headers(&self, token: &VerifiedToken) -> Vec<(String, String)> {
        self.claims.forwarded_headers(&token.claims)
    }

    // Tokens without a usable kid are tried against every stored key.
    fn search_all_keys(&self, alg: Algorithm, message: &[u8], signature: &[u8]) -> Result<String, Error> {
        let keys = self.store.snapshot();
        debug!("token kid not in key store; trying {} key(s)", keys.len());
        keys.into_iter()
            .find(|(_, key)| alg.verify(key, message, signature).is_ok())
            .map(|(kid, _)| kid)
            .ok_or_else(|| Error::SignatureInvalid("no key validated the token".to_string()))
    }
}
