#![warn(missing_docs)]
//! # palm-lens-cache
//!
//! ## Purpose
//! Implements the background caching agent that keeps a versioned local cache
//! of the application shell for offline visits.
//!
//! ## Responsibilities
//! - Install: pre-fetch and store every manifest asset of the current cache
//!   generation, degrading instead of failing when a store write breaks.
//! - Activate: delete every stored generation other than the current one so
//!   storage growth stays bounded across deploys.
//! - Intercept: serve cached GET responses outside the analysis-API
//!   namespace, falling through to the network otherwise.
//!
//! ## Data flow
//! [`CacheManifest`] -> [`CacheAgent::install`] populates a [`CacheStore`];
//! navigation/asset requests flow through [`CacheAgent::handle`].
//!
//! ## Ownership and lifetimes
//! The agent runs in a lifecycle independent of any page view and talks to
//! the UI core only through intercepted requests; the store therefore hides
//! its interior mutability behind a `Mutex`.
//!
//! ## Error model
//! Store and fetch failures surface as [`CacheError`]; during install they
//! are swallowed by design, so offline support degrades rather than blocking.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Cache generation identifier for the current shell deploy.
///
/// Bumping this string is the sole cache-invalidation mechanism.
pub const SHELL_CACHE_GENERATION: &str = "palm-lens-shell-v1";

/// Ordered shell asset paths pre-cached for offline visits.
pub const SHELL_ASSET_PATHS: [&str; 4] = ["/", "/styles.css", "/app.js", "/manifest.json"];

/// Path namespace that must always stay live, never served stale.
pub const ANALYSIS_API_NAMESPACE: &str = "/api/";

/// Fixed, versioned set of shell asset URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheManifest {
    /// Cache generation identifier.
    pub generation: String,
    /// Asset paths belonging to this generation.
    pub assets: Vec<String>,
}

impl CacheManifest {
    /// Creates a validated manifest.
    ///
    /// # Errors
    /// Returns [`CacheError::EmptyGeneration`] for a blank generation id.
    pub fn new(
        generation: impl Into<String>,
        assets: Vec<String>,
    ) -> Result<Self, CacheError> {
        let generation = generation.into();
        if generation.trim().is_empty() {
            return Err(CacheError::EmptyGeneration);
        }

        Ok(Self { generation, assets })
    }

    /// Returns the default shell manifest for the current deploy.
    pub fn shell_default() -> Self {
        Self {
            generation: SHELL_CACHE_GENERATION.to_string(),
            assets: SHELL_ASSET_PATHS
                .iter()
                .map(|path| (*path).to_string())
                .collect(),
        }
    }
}

/// One cached response body with its integrity digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAsset {
    /// Request path this asset answers.
    pub path: String,
    /// Response content type.
    pub content_type: String,
    /// Response body bytes.
    pub body: Vec<u8>,
    /// Hex sha-256 digest of the body recorded at store time.
    pub digest: String,
}

impl CachedAsset {
    /// Creates an asset with its digest computed from the body.
    pub fn new(path: impl Into<String>, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        let digest = body_digest(&body);
        Self {
            path: path.into(),
            content_type: content_type.into(),
            body,
            digest,
        }
    }

    /// Returns `true` when the stored digest still matches the body.
    pub fn integrity_ok(&self) -> bool {
        body_digest(&self.body) == self.digest
    }
}

fn body_digest(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}

/// Network fetch abstraction used during install and fall-through.
pub trait AssetFetcher: Send + Sync {
    /// Fetches one asset from the live network.
    ///
    /// # Errors
    /// Returns [`CacheError::Fetch`] on network failure.
    fn fetch(&self, path: &str) -> Result<CachedAsset, CacheError>;
}

/// Storage abstraction over versioned cache generations.
pub trait CacheStore: Send + Sync {
    /// Stores one asset under a generation.
    ///
    /// # Errors
    /// Returns [`CacheError::Store`] on write failure.
    fn put(&self, generation: &str, asset: CachedAsset) -> Result<(), CacheError>;

    /// Looks up one asset by generation and path.
    fn get(&self, generation: &str, path: &str) -> Option<CachedAsset>;

    /// Enumerates all stored generation identifiers.
    fn generations(&self) -> Vec<String>;

    /// Deletes one generation and everything stored under it.
    ///
    /// # Errors
    /// Returns [`CacheError::Store`] on delete failure.
    fn delete_generation(&self, generation: &str) -> Result<(), CacheError>;
}

/// In-memory store used by CI and as the reference store semantics.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    generations: Mutex<BTreeMap<String, BTreeMap<String, CachedAsset>>>,
}

impl MemoryCacheStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn put(&self, generation: &str, asset: CachedAsset) -> Result<(), CacheError> {
        let mut generations = self
            .generations
            .lock()
            .map_err(|_| CacheError::Store("cache store lock poisoned".to_string()))?;
        generations
            .entry(generation.to_string())
            .or_default()
            .insert(asset.path.clone(), asset);
        Ok(())
    }

    fn get(&self, generation: &str, path: &str) -> Option<CachedAsset> {
        let generations = self.generations.lock().ok()?;
        generations.get(generation)?.get(path).cloned()
    }

    fn generations(&self) -> Vec<String> {
        self.generations
            .lock()
            .map(|generations| generations.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn delete_generation(&self, generation: &str) -> Result<(), CacheError> {
        let mut generations = self
            .generations
            .lock()
            .map_err(|_| CacheError::Store("cache store lock poisoned".to_string()))?;
        generations.remove(generation);
        Ok(())
    }
}

/// Summary of one install pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Assets fetched and stored.
    pub cached: usize,
    /// Assets skipped because fetching or storing failed.
    pub skipped: usize,
}

/// Summary of one activate pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    /// Superseded generations that were deleted.
    pub removed_generations: Vec<String>,
}

/// Routing decision for one incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    /// Cache may answer; fall through to the network on a miss.
    Intercept,
    /// Never intercepted (non-GET or analysis-API request).
    Bypass,
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    /// Answered from the local cache without a network round trip.
    Cache,
    /// Fetched from the live network.
    Network,
}

/// One response served through the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedResponse {
    /// Response origin.
    pub source: ServedFrom,
    /// The asset body served to the page.
    pub asset: CachedAsset,
}

/// Background caching agent over a versioned shell-asset store.
#[derive(Clone)]
pub struct CacheAgent {
    manifest: CacheManifest,
    store: Arc<dyn CacheStore>,
}

impl CacheAgent {
    /// Creates an agent for the given manifest and store.
    pub fn new(manifest: CacheManifest, store: Arc<dyn CacheStore>) -> Self {
        Self { manifest, store }
    }

    /// Returns the manifest this agent serves.
    pub fn manifest(&self) -> &CacheManifest {
        &self.manifest
    }

    /// Pre-fetches and stores every manifest asset.
    ///
    /// Individual fetch or store failures are swallowed and counted: offline
    /// support degrades instead of blocking installation.
    pub fn install(&self, fetcher: &dyn AssetFetcher) -> InstallReport {
        let mut cached = 0;
        let mut skipped = 0;

        for path in &self.manifest.assets {
            let stored = fetcher
                .fetch(path)
                .and_then(|asset| self.store.put(&self.manifest.generation, asset));
            match stored {
                Ok(()) => cached += 1,
                Err(_) => skipped += 1,
            }
        }

        InstallReport { cached, skipped }
    }

    /// Deletes every stored generation other than the current one.
    ///
    /// Guarantees at most one live generation afterwards; deletion failures
    /// are swallowed like install failures.
    pub fn activate(&self) -> ActivateReport {
        let mut removed_generations = Vec::new();

        for generation in self.store.generations() {
            if generation == self.manifest.generation {
                continue;
            }
            if self.store.delete_generation(&generation).is_ok() {
                removed_generations.push(generation);
            }
        }

        ActivateReport {
            removed_generations,
        }
    }

    /// Routes one request: GET outside the analysis-API namespace may be
    /// intercepted, everything else bypasses the agent untouched.
    pub fn decide(method: &str, path: &str) -> RequestDecision {
        if !method.eq_ignore_ascii_case("GET") || path.starts_with(ANALYSIS_API_NAMESPACE) {
            return RequestDecision::Bypass;
        }
        RequestDecision::Intercept
    }

    /// Handles one request through the intercept path.
    ///
    /// Returns `Ok(None)` for bypassed requests (the caller goes to the
    /// network directly). Intercepted requests are answered from the cache
    /// when a stored asset passes its integrity check, otherwise fall through
    /// to the network.
    ///
    /// # Errors
    /// Returns [`CacheError::Fetch`] when the network fall-through fails.
    pub fn handle(
        &self,
        method: &str,
        path: &str,
        fetcher: &dyn AssetFetcher,
    ) -> Result<Option<ServedResponse>, CacheError> {
        if Self::decide(method, path) == RequestDecision::Bypass {
            return Ok(None);
        }

        if let Some(asset) = self.store.get(&self.manifest.generation, path)
            && asset.integrity_ok()
        {
            return Ok(Some(ServedResponse {
                source: ServedFrom::Cache,
                asset,
            }));
        }

        let asset = fetcher.fetch(path)?;
        Ok(Some(ServedResponse {
            source: ServedFrom::Network,
            asset,
        }))
    }
}

/// Cache layer error type.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Manifest generation id cannot be blank.
    #[error("cache generation id is empty")]
    EmptyGeneration,
    /// Store read/write failure.
    #[error("cache store failure: {0}")]
    Store(String),
    /// Network fetch failure.
    #[error("asset fetch failure for '{path}': {detail}")]
    Fetch {
        /// Requested asset path.
        path: String,
        /// Transport detail.
        detail: String,
    },
}
