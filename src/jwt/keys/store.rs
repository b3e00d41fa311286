use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use url::Url;

use super::{decode_key_material, KeyMaterial, KeyOrigin, KeySource};
use crate::error::Error;

/// What a refresh does with keys an endpoint stopped publishing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EvictionPolicy {
    #[default]
    Retain,
    ReplaceRemote,
}

#[derive(Debug, Clone)]
struct StoredKey {
    key: Arc<KeyMaterial>,
    origin: KeyOrigin,
}

/// Concurrent kid -> key map plus the JWKS endpoints that feed it.
#[derive(Debug, Default)]
pub struct KeyStore {
    keys: RwLock<HashMap<String, StoredKey>>,
    endpoints: Vec<Url>,
}

impl KeyStore {
    pub fn new(endpoints: Vec<Url>) -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
            endpoints,
        }
    }

    pub fn from_sources<S: AsRef<str>>(entries: &[S]) -> Result<Self, Error> {
        let mut keys = HashMap::new();
        let mut endpoints = Vec::new();
        for entry in entries {
            match decode_key_material(entry.as_ref(), keys.len())? {
                KeySource::Local { kid, key } => {
                    keys.insert(
                        kid,
                        StoredKey {
                            key: Arc::new(key),
                            origin: KeyOrigin::Local,
                        },
                    );
                }
                KeySource::Remote(url) => endpoints.push(url),
            }
        }
        Ok(Self {
            keys: RwLock::new(keys),
            endpoints,
        })
    }

    pub fn endpoints(&self) -> &[Url] {
        &self.endpoints
    }

    /// Stores `key` under `kid`; returns true when an existing entry was replaced.
    pub fn insert(&self, kid: impl Into<String>, key: KeyMaterial, origin: KeyOrigin) -> bool {
        let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        keys.insert(
            kid.into(),
            StoredKey {
                key: Arc::new(key),
                origin,
            },
        )
        .is_some()
    }

    pub fn get(&self, kid: &str) -> Option<Arc<KeyMaterial>> {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        keys.get(kid).map(|stored| Arc::clone(&stored.key))
    }

    pub fn origin(&self, kid: &str) -> Option<KeyOrigin> {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        keys.get(kid).map(|stored| stored.origin.clone())
    }

    pub fn snapshot(&self) -> Vec<(String, Arc<KeyMaterial>)> {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        keys.iter()
            .map(|(kid, stored)| (kid.clone(), Arc::clone(&stored.key)))
            .collect()
    }

    pub fn kids(&self) -> Vec<String> {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        let mut kids: Vec<String> = keys.keys().cloned().collect();
        kids.sort();
        kids
    }

    pub fn len(&self) -> usize {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_unconfigured(&self) -> bool {
        self.endpoints.is_empty() && self.is_empty()
    }

    /// Merges one endpoint's decoded keys. Returns `(stored, evicted)` counts.
    pub(crate) fn apply_remote(
        &self,
        endpoint: &Url,
        fetched: Vec<(String, KeyMaterial)>,
        policy: EvictionPolicy,
    ) -> (usize, usize) {
        let fetched_kids: HashSet<String> = fetched.iter().map(|(kid, _)| kid.clone()).collect();
        let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        let mut evicted = 0;
        if policy == EvictionPolicy::ReplaceRemote {
            let before = keys.len();
            keys.retain(|kid, stored| match &stored.origin {
                KeyOrigin::Remote(url) if url == endpoint => fetched_kids.contains(kid),
                _ => true,
            });
            evicted = before - keys.len();
        }
        let stored = fetched.len();
        for (kid, key) in fetched {
            keys.insert(
                kid,
                StoredKey {
                    key: Arc::new(key),
                    origin: KeyOrigin::Remote(endpoint.clone()),
                },
            );
        }
        (stored, evicted)
    }
}
