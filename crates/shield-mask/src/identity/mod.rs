//! # Identity Cache — Per-Run Referential Integrity
//!
//! One run-scoped arena of `(classification, raw) → masked` mappings shared
//! by every worker. An entry is created at most once and never overwritten,
//! so a raw identity that recurs across tables, rows or threads resolves to
//! the value stored by whichever caller reached it first.
//!
//! ## Concurrency
//!
//! Both maps are `DashMap`s. Generation runs inside the forward map's entry
//! lock (`or_try_insert_with`), so two callers can never both store a
//! substitute for the same raw value. The reverse map is only ever locked
//! while a forward entry is held, never the other way round.
//!
//! ## Collisions
//!
//! Identifier strategies also claim `(classification, masked) → raw`. A
//! second raw value arriving at an already-claimed masked value is a token
//! collision, handled per [`CollisionPolicy`].

pub mod generator;
mod lexicon;

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use shield_core::{FieldClassification, MaskingError};

use crate::replay::MappingEntry;

pub use generator::{fit_width, generate};

type CacheKey = (FieldClassification, String);

/// What to do when two raw identifiers produce the same masked value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Abort the run with `TokenCollision`.
    #[default]
    Fail,
    /// Log a warning and keep both mappings.
    Warn,
}

/// Run-scoped memo of every deterministic mapping.
#[derive(Default)]
pub struct IdentityCache {
    forward: DashMap<CacheKey, String>,
    reverse: DashMap<CacheKey, String>,
    collisions: AtomicUsize,
}

impl std::fmt::Debug for IdentityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityCache")
            .field("entries", &self.forward.len())
            .field("collisions", &self.collisions())
            .finish()
    }
}

impl IdentityCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `(classification, raw)`, generating and storing the masked
    /// value on first sight.
    ///
    /// `generate` runs at most once per key per cache. If it fails nothing
    /// is stored.
    pub fn resolve<F>(
        &self,
        classification: FieldClassification,
        raw: &str,
        generate: F,
    ) -> Result<String, MaskingError>
    where
        F: FnOnce() -> Result<String, MaskingError>,
    {
        let key = (classification, raw.to_string());
        if let Some(hit) = self.forward.get(&key) {
            return Ok(hit.value().clone());
        }
        let entry = self.forward.entry(key).or_try_insert_with(generate)?;
        Ok(entry.value().clone())
    }

    /// Like [`IdentityCache::resolve`], and additionally claims the masked
    /// value for `raw` so no other raw value of the classification can map
    /// to it unnoticed.
    pub fn resolve_unique<F>(
        &self,
        classification: FieldClassification,
        raw: &str,
        collision: CollisionPolicy,
        generate: F,
    ) -> Result<String, MaskingError>
    where
        F: FnOnce() -> Result<String, MaskingError>,
    {
        let key = (classification, raw.to_string());
        if let Some(hit) = self.forward.get(&key) {
            return Ok(hit.value().clone());
        }
        let entry = self.forward.entry(key).or_try_insert_with(|| {
            let masked = generate()?;
            self.claim(classification, raw, &masked, collision)?;
            Ok(masked)
        })?;
        Ok(entry.value().clone())
    }

    /// Record an externally supplied mapping.
    ///
    /// Re-inserting an identical mapping is a no-op. A different masked value
    /// for a raw value already present is `ConcurrencyViolation`.
    pub fn insert(
        &self,
        classification: FieldClassification,
        raw: &str,
        masked: &str,
    ) -> Result<(), MaskingError> {
        match self.forward.entry((classification, raw.to_string())) {
            Entry::Occupied(existing) if existing.get() == masked => Ok(()),
            Entry::Occupied(_) => Err(MaskingError::ConcurrencyViolation {
                classification,
                detail: "a different masked value is already recorded for this raw value".to_string(),
            }),
            Entry::Vacant(slot) => {
                if classification.is_identifier() {
                    self.claim(classification, raw, masked, CollisionPolicy::Fail)?;
                }
                slot.insert(masked.to_string());
                Ok(())
            }
        }
    }

    /// Insert every entry of a replayed mapping table. Returns the number
    /// of entries processed.
    pub fn restore<I>(&self, entries: I) -> Result<usize, MaskingError>
    where
        I: IntoIterator<Item = MappingEntry>,
    {
        let mut count = 0;
        for entry in entries {
            self.insert(entry.classification, &entry.raw, &entry.masked)?;
            count += 1;
        }
        Ok(count)
    }

    /// Copy every mapping of `other` into this cache.
    pub fn merge(&self, other: &IdentityCache) -> Result<usize, MaskingError> {
        self.restore(other.snapshot())
    }

    /// All mappings, sorted by classification then raw value.
    pub fn snapshot(&self) -> Vec<MappingEntry> {
        let mut entries: Vec<MappingEntry> = self
            .forward
            .iter()
            .map(|e| MappingEntry {
                classification: e.key().0,
                raw: e.key().1.clone(),
                masked: e.value().clone(),
            })
            .collect();
        entries.sort_by(|a, b| (a.classification, &a.raw).cmp(&(b.classification, &b.raw)));
        entries
    }

    /// Number of stored mappings.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// True if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Collisions tolerated under [`CollisionPolicy::Warn`].
    pub fn collisions(&self) -> usize {
        self.collisions.load(Ordering::Relaxed)
    }

    fn claim(
        &self,
        classification: FieldClassification,
        raw: &str,
        masked: &str,
        collision: CollisionPolicy,
    ) -> Result<(), MaskingError> {
        match self.reverse.entry((classification, masked.to_string())) {
            Entry::Vacant(slot) => {
                slot.insert(raw.to_string());
                Ok(())
            }
            Entry::Occupied(owner) if owner.get() == raw => Ok(()),
            Entry::Occupied(_) => match collision {
                CollisionPolicy::Fail => Err(MaskingError::TokenCollision { classification }),
                CollisionPolicy::Warn => {
                    self.collisions.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        classification = %classification,
                        "two raw values share one masked value"
                    );
                    Ok(())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const ACCOUNT: FieldClassification = FieldClassification::AccountIdentifier;

    #[test]
    fn resolve_generates_once() {
        let cache = IdentityCache::new();
        let calls = AtomicUsize::new(0);
        let generate_once = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("MASKED".to_string())
        };
        assert_eq!(cache.resolve(FieldClassification::Name, "JANE", generate_once).unwrap(), "MASKED");
        let again = cache
            .resolve(FieldClassification::Name, "JANE", || Ok("OTHER".to_string()))
            .unwrap();
        assert_eq!(again, "MASKED");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn classification_is_part_of_the_key() {
        let cache = IdentityCache::new();
        cache.resolve(FieldClassification::Name, "X", || Ok("a".into())).unwrap();
        let other = cache
            .resolve(FieldClassification::Address, "X", || Ok("b".into()))
            .unwrap();
        assert_eq!(other, "b");
    }

    #[test]
    fn failed_generation_stores_nothing() {
        let cache = IdentityCache::new();
        let err = cache.resolve(ACCOUNT, "1", || {
            Err(MaskingError::invalid_input(ACCOUNT, "too short"))
        });
        assert!(err.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn collision_fails_by_default() {
        let cache = IdentityCache::new();
        cache
            .resolve_unique(ACCOUNT, "1111", CollisionPolicy::Fail, || Ok("9999".into()))
            .unwrap();
        let err = cache
            .resolve_unique(ACCOUNT, "2222", CollisionPolicy::Fail, || Ok("9999".into()))
            .unwrap_err();
        assert!(matches!(err, MaskingError::TokenCollision { classification } if classification == ACCOUNT));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn collision_warn_keeps_both() {
        let cache = IdentityCache::new();
        cache
            .resolve_unique(ACCOUNT, "1111", CollisionPolicy::Warn, || Ok("9999".into()))
            .unwrap();
        cache
            .resolve_unique(ACCOUNT, "2222", CollisionPolicy::Warn, || Ok("9999".into()))
            .unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.collisions(), 1);
    }

    #[test]
    fn insert_conflict_is_concurrency_violation() {
        let cache = IdentityCache::new();
        cache.insert(FieldClassification::Name, "JANE", "MARY").unwrap();
        cache.insert(FieldClassification::Name, "JANE", "MARY").unwrap();
        assert!(matches!(
            cache.insert(FieldClassification::Name, "JANE", "SUSAN"),
            Err(MaskingError::ConcurrencyViolation { .. })
        ));
    }

    #[test]
    fn insert_claims_identifier_tokens() {
        let cache = IdentityCache::new();
        cache.insert(ACCOUNT, "1111", "5555").unwrap();
        assert!(matches!(
            cache.insert(ACCOUNT, "2222", "5555"),
            Err(MaskingError::TokenCollision { .. })
        ));
    }

    #[test]
    fn snapshot_restore_merge() {
        let a = IdentityCache::new();
        a.insert(FieldClassification::Name, "ZED", "AMY").unwrap();
        a.insert(FieldClassification::Name, "ANN", "BOB").unwrap();
        a.insert(ACCOUNT, "1234", "8834").unwrap();
        let snap = a.snapshot();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap[0].raw, "ANN");
        assert_eq!(snap[2].classification, ACCOUNT);

        let b = IdentityCache::new();
        assert_eq!(b.restore(snap.clone()).unwrap(), 3);
        assert_eq!(b.snapshot(), snap);

        let c = IdentityCache::new();
        c.insert(FieldClassification::Name, "ZED", "AMY").unwrap();
        assert_eq!(c.merge(&a).unwrap(), 3);
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn concurrent_resolution_yields_one_value() {
        let cache = Arc::new(IdentityCache::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let results: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let cache = Arc::clone(&cache);
                    let counter = Arc::clone(&counter);
                    s.spawn(move || {
                        cache
                            .resolve(FieldClassification::Name, "SAME", || {
                                let n = counter.fetch_add(1, Ordering::SeqCst);
                                Ok(format!("FAKE-{n}"))
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(results.iter().all(|r| r == &results[0]));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn collision_policy_yaml() {
        let p: CollisionPolicy = serde_yaml::from_str("warn").unwrap();
        assert_eq!(p, CollisionPolicy::Warn);
        assert_eq!(CollisionPolicy::default(), CollisionPolicy::Fail);
    }
}
