//! # Engine Configuration
//!
//! One YAML (or JSON) document describing where the key comes from, how
//! noise is drawn, how many workers run, and which policies override the
//! standard registry:
//!
//! ```yaml
//! key: { source: env, var: SHIELD_PSEUDO_KEY, encoding: utf8 }
//! noise: { mode: seeded, seed: 12345 }
//! workers: 4
//! collision: fail
//! date_sentinels: ["00/00/00"]
//! policies:
//!   account_identifier: { strategy: tokenize, preserve_last_n: 4 }
//! ```
//!
//! Every field is optional. The file never contains key material, only a
//! reference to where it lives.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use shield_core::{FieldClassification, MaskingError};
use shield_crypto::{
    EnvKeyProvider, FileKeyProvider, KeyEncoding, KeyProvider, SecretKey, DEFAULT_KEY_VAR,
};

use crate::category::CategoryVocabulary;
use crate::context::MaskingContext;
use crate::date_shift::DEFAULT_DATE_SENTINELS;
use crate::identity::CollisionPolicy;
use crate::noise::NoiseSource;
use crate::orchestrator::MaskingOrchestrator;
use crate::policy::{MaskingStrategy, PolicyRegistry};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A file could not be read or written.
    #[error("cannot access {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A file's contents are malformed.
    #[error("cannot parse {path}: {reason}")]
    Parse {
        /// File path, or `<inline>` for in-memory documents.
        path: String,
        /// What was wrong.
        reason: String,
    },

    /// Valid syntax, invalid engine settings.
    #[error(transparent)]
    Masking(#[from] MaskingError),
}

/// Where the secret key is loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum KeySource {
    /// An environment variable.
    Env {
        /// Variable name.
        #[serde(default = "default_key_var")]
        var: String,
        /// Encoding of the value.
        #[serde(default)]
        encoding: KeyEncoding,
    },
    /// A file, e.g. a mounted secret volume.
    File {
        /// Path to the key file.
        path: PathBuf,
        /// Encoding of the contents.
        #[serde(default)]
        encoding: KeyEncoding,
    },
}

fn default_key_var() -> String {
    DEFAULT_KEY_VAR.to_string()
}

impl Default for KeySource {
    fn default() -> Self {
        Self::Env {
            var: default_key_var(),
            encoding: KeyEncoding::Utf8,
        }
    }
}

impl KeySource {
    /// The provider for this source.
    pub fn provider(&self) -> Box<dyn KeyProvider> {
        match self {
            Self::Env { var, encoding } => {
                Box::new(EnvKeyProvider::new(var.clone()).with_encoding(*encoding))
            }
            Self::File { path, encoding } => {
                Box::new(FileKeyProvider::new(path.clone()).with_encoding(*encoding))
            }
        }
    }

    /// Load the key.
    pub fn load(&self) -> Result<SecretKey, MaskingError> {
        self.provider().load()
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Key source.
    #[serde(default)]
    pub key: KeySource,
    /// Noise mode for perturbation and date shifting.
    #[serde(default)]
    pub noise: NoiseSource,
    /// Worker threads for the orchestrator.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Token collision handling.
    #[serde(default)]
    pub collision: CollisionPolicy,
    /// Date values passed through unchanged.
    #[serde(default = "default_date_sentinels")]
    pub date_sentinels: Vec<String>,
    /// Per-classification overrides of the standard registry.
    #[serde(default)]
    pub policies: BTreeMap<FieldClassification, MaskingStrategy>,
    /// Description categories.
    #[serde(default)]
    pub vocabulary: CategoryVocabulary,
}

fn default_workers() -> usize {
    1
}

fn default_date_sentinels() -> Vec<String> {
    DEFAULT_DATE_SENTINELS.iter().map(|s| s.to_string()).collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key: KeySource::default(),
            noise: NoiseSource::default(),
            workers: default_workers(),
            collision: CollisionPolicy::default(),
            date_sentinels: default_date_sentinels(),
            policies: BTreeMap::new(),
            vocabulary: CategoryVocabulary::standard(),
        }
    }
}

impl EngineConfig {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Parse and validate an in-memory document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, "<inline>")
    }

    fn parse(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check worker count, policy overrides and the vocabulary.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Parse {
                path: "<config>".to_string(),
                reason: "workers must be at least 1".to_string(),
            });
        }
        self.registry()?;
        self.vocabulary.clone().validated()?;
        Ok(())
    }

    /// The standard registry with this configuration's overrides applied.
    pub fn registry(&self) -> Result<PolicyRegistry, MaskingError> {
        let mut registry = PolicyRegistry::standard();
        for (classification, strategy) in &self.policies {
            registry.register(*classification, strategy.clone())?;
        }
        Ok(registry)
    }

    /// Build a run context around an already loaded key.
    pub fn build_context(&self, key: Arc<SecretKey>) -> Result<MaskingContext, MaskingError> {
        Ok(MaskingContext::new(key, Arc::new(self.registry()?))?
            .with_vocabulary(self.vocabulary.clone())?
            .with_noise(self.noise)
            .with_collision_policy(self.collision)
            .with_date_sentinels(self.date_sentinels.iter().cloned()))
    }

    /// An orchestrator with the configured worker count.
    pub fn orchestrator(&self) -> MaskingOrchestrator {
        MaskingOrchestrator::new().with_workers(self.workers)
    }
}
