//! # Key Provider Abstraction
//!
//! Abstracts where the secret key comes from, so the engine never reads a
//! process-wide global:
//!
//! - [`EnvKeyProvider`]: reads an environment variable (default
//!   `SHIELD_PSEUDO_KEY`). Suitable for container deployments where secrets
//!   are injected through the environment.
//! - [`FileKeyProvider`]: reads a key file, e.g. a mounted secret-store
//!   volume.
//! - [`StaticKeyProvider`]: in-memory bytes for tests and embedding.
//!
//! Every backend reports an absent or empty key as
//! [`MaskingError::MissingKey`]. None of them falls back to a default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use shield_core::MaskingError;

use crate::secret::SecretKey;

/// Environment variable consulted when no other name is configured.
pub const DEFAULT_KEY_VAR: &str = "SHIELD_PSEUDO_KEY";

/// How key material is encoded at its source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEncoding {
    /// The source text's UTF-8 bytes are the key.
    #[default]
    Utf8,
    /// The source text is hex and decodes to the key.
    Hex,
}

impl KeyEncoding {
    fn decode(&self, text: &str) -> Result<SecretKey, MaskingError> {
        match self {
            Self::Utf8 => SecretKey::from_bytes(text.as_bytes().to_vec()),
            Self::Hex => SecretKey::from_hex(text),
        }
    }
}

/// Trait for secret-key sources.
///
/// Implementations must be `Send + Sync` so a provider can be shared by a
/// long-lived service.
pub trait KeyProvider: Send + Sync {
    /// Load the key. Called once per process or run.
    fn load(&self) -> Result<SecretKey, MaskingError>;

    /// Human-readable name for this provider (diagnostics only).
    fn provider_name(&self) -> &str;
}

// ─── StaticKeyProvider ───────────────────────────────────────────────────

/// In-memory key provider for tests and embedding.
pub struct StaticKeyProvider {
    bytes: Zeroizing<Vec<u8>>,
}

impl StaticKeyProvider {
    /// Create from raw key bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Zeroizing::new(bytes.into()),
        }
    }
}

impl KeyProvider for StaticKeyProvider {
    fn load(&self) -> Result<SecretKey, MaskingError> {
        SecretKey::from_bytes(self.bytes.to_vec())
    }

    fn provider_name(&self) -> &str {
        "StaticKeyProvider"
    }
}

// ─── EnvKeyProvider ──────────────────────────────────────────────────────

/// Loads the key from an environment variable.
///
/// ```bash
/// export SHIELD_PSEUDO_KEY="a-long-random-secret-from-the-vault"
/// ```
pub struct EnvKeyProvider {
    var_name: String,
    encoding: KeyEncoding,
}

impl EnvKeyProvider {
    /// Read from the named variable, UTF-8 encoded.
    pub fn new(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
            encoding: KeyEncoding::Utf8,
        }
    }

    /// Set the encoding of the variable's value.
    pub fn with_encoding(mut self, encoding: KeyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// The environment variable this provider reads.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

impl Default for EnvKeyProvider {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_VAR)
    }
}

impl KeyProvider for EnvKeyProvider {
    fn load(&self) -> Result<SecretKey, MaskingError> {
        let value = Zeroizing::new(std::env::var(&self.var_name).map_err(|_| {
            MaskingError::MissingKey(format!(
                "environment variable {} is not set",
                self.var_name
            ))
        })?);
        if value.is_empty() {
            return Err(MaskingError::MissingKey(format!(
                "environment variable {} is empty",
                self.var_name
            )));
        }
        let key = self.encoding.decode(&value)?;
        tracing::debug!(
            provider = self.provider_name(),
            var = %self.var_name,
            fingerprint = %key.fingerprint(),
            "loaded secret key"
        );
        Ok(key)
    }

    fn provider_name(&self) -> &str {
        "EnvKeyProvider"
    }
}

// ─── FileKeyProvider ─────────────────────────────────────────────────────

/// Loads the key from a file. A single trailing newline is ignored.
pub struct FileKeyProvider {
    path: PathBuf,
    encoding: KeyEncoding,
}

impl FileKeyProvider {
    /// Read from the given path, UTF-8 encoded.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encoding: KeyEncoding::Utf8,
        }
    }

    /// Set the encoding of the file contents.
    pub fn with_encoding(mut self, encoding: KeyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// The key file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyProvider for FileKeyProvider {
    fn load(&self) -> Result<SecretKey, MaskingError> {
        let contents = Zeroizing::new(std::fs::read_to_string(&self.path).map_err(|e| {
            MaskingError::MissingKey(format!(
                "key file {} unreadable: {}",
                self.path.display(),
                e.kind()
            ))
        })?);
        let text = contents
            .strip_suffix("\r\n")
            .or_else(|| contents.strip_suffix('\n'))
            .unwrap_or(contents.as_str());
        if text.is_empty() {
            return Err(MaskingError::MissingKey(format!(
                "key file {} is empty",
                self.path.display()
            )));
        }
        let key = self.encoding.decode(text)?;
        tracing::debug!(
            provider = self.provider_name(),
            path = %self.path.display(),
            fingerprint = %key.fingerprint(),
            "loaded secret key"
        );
        Ok(key)
    }

    fn provider_name(&self) -> &str {
        "FileKeyProvider"
    }
}
