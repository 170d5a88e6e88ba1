//! # Masking Context
//!
//! Everything one masking run needs, passed explicitly instead of living in
//! globals: the key, the policy registry, the category vocabulary, the
//! identity cache, the noise source and the run id.
//!
//! A context is `Send + Sync` and is shared by reference across the
//! orchestrator's workers. The identity cache is its only mutable state.
//! Immutable parts are `Arc`s so several contexts can share one key and one
//! registry.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use shield_core::MaskingError;
use shield_crypto::{KeyProvider, SecretKey};

use crate::category::CategoryVocabulary;
use crate::date_shift::DEFAULT_DATE_SENTINELS;
use crate::identity::{CollisionPolicy, IdentityCache};
use crate::noise::NoiseSource;
use crate::policy::PolicyRegistry;
use crate::replay::{MappingTable, MAPPING_TABLE_VERSION};
use crate::scrub::EmbeddedScrubber;

/// Per-run masking state.
#[derive(Debug)]
pub struct MaskingContext {
    pub(crate) run_id: Uuid,
    pub(crate) key: Arc<SecretKey>,
    pub(crate) key_fingerprint: String,
    pub(crate) registry: Arc<PolicyRegistry>,
    pub(crate) vocabulary: Arc<CategoryVocabulary>,
    pub(crate) cache: IdentityCache,
    pub(crate) noise: NoiseSource,
    pub(crate) collision: CollisionPolicy,
    pub(crate) date_sentinels: Vec<String>,
    pub(crate) scrubber: EmbeddedScrubber,
}

impl MaskingContext {
    /// A fresh run context with the standard vocabulary, entropy noise and
    /// the default date sentinels.
    ///
    /// # Errors
    ///
    /// `UnsupportedField` if the registry lacks a policy for any
    /// classification.
    pub fn new(key: Arc<SecretKey>, registry: Arc<PolicyRegistry>) -> Result<Self, MaskingError> {
        registry.ensure_complete()?;
        let run_id = Uuid::new_v4();
        let key_fingerprint = key.fingerprint();
        tracing::debug!(%run_id, key_fingerprint = %key_fingerprint, "masking context created");
        Ok(Self {
            run_id,
            key,
            key_fingerprint,
            registry,
            vocabulary: Arc::new(CategoryVocabulary::standard()),
            cache: IdentityCache::new(),
            noise: NoiseSource::default(),
            collision: CollisionPolicy::default(),
            date_sentinels: DEFAULT_DATE_SENTINELS.iter().map(|s| s.to_string()).collect(),
            scrubber: EmbeddedScrubber::new()?,
        })
    }

    /// Load the key from `provider` and build a context.
    pub fn from_provider(
        provider: &dyn KeyProvider,
        registry: Arc<PolicyRegistry>,
    ) -> Result<Self, MaskingError> {
        Self::new(Arc::new(provider.load()?), registry)
    }

    /// Replace the category vocabulary.
    pub fn with_vocabulary(mut self, vocabulary: CategoryVocabulary) -> Result<Self, MaskingError> {
        self.vocabulary = Arc::new(vocabulary.validated()?);
        Ok(self)
    }

    /// Replace the noise source.
    pub fn with_noise(mut self, noise: NoiseSource) -> Self {
        self.noise = noise;
        self
    }

    /// Replace the collision policy.
    pub fn with_collision_policy(mut self, collision: CollisionPolicy) -> Self {
        self.collision = collision;
        self
    }

    /// Replace the date sentinels.
    pub fn with_date_sentinels<I, S>(mut self, sentinels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_sentinels = sentinels.into_iter().map(Into::into).collect();
        self
    }

    /// Seed the identity cache from an earlier run's mapping table.
    ///
    /// # Errors
    ///
    /// `KeyMismatch` if the table was exported under another key, and the
    /// cache's insertion errors for conflicting entries.
    pub fn with_mapping_table(self, table: &MappingTable) -> Result<Self, MaskingError> {
        if table.key_fingerprint != self.key_fingerprint {
            return Err(MaskingError::KeyMismatch {
                expected: self.key_fingerprint.clone(),
                found: table.key_fingerprint.clone(),
            });
        }
        let restored = self.cache.restore(table.entries.iter().cloned())?;
        tracing::info!(
            run_id = %self.run_id,
            source_run = %table.run_id,
            restored,
            "identity cache restored from mapping table"
        );
        Ok(self)
    }

    /// Export the identity cache.
    pub fn mapping_table(&self) -> MappingTable {
        MappingTable {
            version: MAPPING_TABLE_VERSION,
            key_fingerprint: self.key_fingerprint.clone(),
            run_id: self.run_id,
            generated_at: Utc::now(),
            entries: self.cache.snapshot(),
        }
    }

    /// Identifier of this run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Fingerprint of the active key.
    pub fn key_fingerprint(&self) -> &str {
        &self.key_fingerprint
    }

    /// The policy registry.
    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// The category vocabulary.
    pub fn vocabulary(&self) -> &CategoryVocabulary {
        &self.vocabulary
    }

    /// The identity cache.
    pub fn cache(&self) -> &IdentityCache {
        &self.cache
    }

    /// The noise source.
    pub fn noise(&self) -> NoiseSource {
        self.noise
    }

    /// The collision policy.
    pub fn collision_policy(&self) -> CollisionPolicy {
        self.collision
    }

    /// True if `raw` is a configured "no date" value.
    pub fn is_date_sentinel(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        self.date_sentinels.iter().any(|s| s == trimmed)
    }
}
