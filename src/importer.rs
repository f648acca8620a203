//! Configuration store
//!
//! The importer tracks, per setting key, the value the host held when the
//! key was first touched (ORIGIN) and the live merged value (TARGET). Every
//! merge and restore is written straight back into the [`HostConfig`].
//!
//! ORIGIN is captured once and never re-captured, so [`Importer::restore`]
//! always returns a key to its pre-integration value no matter how many
//! contributors merged into it.

use integrator_merge::{merge, ConfigValue, MergeError};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::settings::HostConfig;

/// Importer errors
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Cannot merge into setting '{key}': {source}")]
    Merge {
        key: String,
        #[source]
        source: MergeError,
    },

    #[error("Setting '{0}' was never observed; nothing to restore")]
    KeyNotObserved(String),

    #[error("Failed to canonicalize setting '{key}': {reason}")]
    Canonical { key: String, reason: String },
}

/// Snapshot pair for one setting key
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Value at first observation; None when the host lacked the key
    origin: Option<ConfigValue>,

    /// Live merged value
    target: Option<ConfigValue>,

    /// Successful merges since capture or the last restore
    merges: usize,
}

impl Snapshot {
    fn capture(current: Option<&ConfigValue>) -> Self {
        Self {
            origin: current.cloned(),
            target: current.cloned(),
            merges: 0,
        }
    }

    pub fn origin(&self) -> Option<&ConfigValue> {
        self.origin.as_ref()
    }

    pub fn target(&self) -> Option<&ConfigValue> {
        self.target.as_ref()
    }

    pub fn merges(&self) -> usize {
        self.merges
    }

    /// True when TARGET still equals ORIGIN
    pub fn is_pristine(&self) -> bool {
        self.origin == self.target
    }
}

/// Per-key ORIGIN/TARGET store
#[derive(Debug, Clone, Default)]
pub struct Importer {
    snapshots: BTreeMap<String, Snapshot>,
}

impl Importer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture ORIGIN for `key` if it has not been observed yet.
    ///
    /// Returns true when a snapshot was taken.
    pub fn observe(&mut self, key: &str, current: Option<&ConfigValue>) -> bool {
        if self.snapshots.contains_key(key) {
            tracing::debug!(key, "already observed; keeping first origin");
            return false;
        }
        tracing::debug!(key, present = current.is_some(), "observing setting");
        self.snapshots
            .insert(key.to_string(), Snapshot::capture(current));
        true
    }

    /// Merge `value` into TARGET for `key` and write the result to `host`.
    ///
    /// A host without `key` takes the contributed value as-is. On a merge
    /// error the partially merged TARGET is still written back.
    pub fn merge_into(
        &mut self,
        host: &mut HostConfig,
        key: &str,
        value: &ConfigValue,
    ) -> Result<(), ImportError> {
        self.observe(key, host.get(key));
        let snapshot = self
            .snapshots
            .get_mut(key)
            .ok_or_else(|| ImportError::KeyNotObserved(key.to_string()))?;

        let result = match snapshot.target.as_mut() {
            Some(target) => merge(value, target),
            None => {
                snapshot.target = Some(value.clone());
                Ok(())
            }
        };

        if let Some(target) = &snapshot.target {
            host.set(key, target.clone());
        }

        match result {
            Ok(()) => {
                snapshot.merges += 1;
                tracing::debug!(key, merges = snapshot.merges, "merged setting");
                Ok(())
            }
            Err(source) => Err(ImportError::Merge {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Reset TARGET for `key` to ORIGIN and write it to `host`.
    ///
    /// Drops every merge since the key was first observed. A key the host
    /// did not have at that point is removed from `host`.
    pub fn restore(&mut self, host: &mut HostConfig, key: &str) -> Result<(), ImportError> {
        let snapshot = self
            .snapshots
            .get_mut(key)
            .ok_or_else(|| ImportError::KeyNotObserved(key.to_string()))?;

        snapshot.target = snapshot.origin.clone();
        snapshot.merges = 0;
        match &snapshot.target {
            Some(origin) => host.set(key, origin.clone()),
            None => {
                host.remove(key);
            }
        }
        tracing::debug!(key, "restored setting to origin");
        Ok(())
    }

    /// Restore every observed key
    pub fn restore_all(&mut self, host: &mut HostConfig) {
        for (key, snapshot) in self.snapshots.iter_mut() {
            snapshot.target = snapshot.origin.clone();
            snapshot.merges = 0;
            match &snapshot.target {
                Some(origin) => host.set(key.clone(), origin.clone()),
                None => {
                    host.remove(key);
                }
            }
        }
        tracing::debug!(keys = self.snapshots.len(), "restored all settings");
    }

    pub fn is_observed(&self, key: &str) -> bool {
        self.snapshots.contains_key(key)
    }

    pub fn snapshot(&self, key: &str) -> Option<&Snapshot> {
        self.snapshots.get(key)
    }

    pub fn origin(&self, key: &str) -> Option<&ConfigValue> {
        self.snapshots.get(key).and_then(Snapshot::origin)
    }

    pub fn target(&self, key: &str) -> Option<&ConfigValue> {
        self.snapshots.get(key).and_then(Snapshot::target)
    }

    pub fn merge_count(&self, key: &str) -> usize {
        self.snapshots.get(key).map_or(0, Snapshot::merges)
    }

    /// Observed keys, sorted
    pub fn observed_keys(&self) -> impl Iterator<Item = &str> {
        self.snapshots.keys().map(String::as_str)
    }

    /// SHA-256 hex digest of the canonical JSON (RFC 8785) of TARGET.
    ///
    /// An absent TARGET hashes as JSON `null`.
    pub fn fingerprint(&self, key: &str) -> Result<String, ImportError> {
        let snapshot = self
            .snapshots
            .get(key)
            .ok_or_else(|| ImportError::KeyNotObserved(key.to_string()))?;

        let json = snapshot
            .target
            .as_ref()
            .map_or(serde_json::Value::Null, ConfigValue::to_json);
        let jcs_bytes =
            serde_json_canonicalizer::to_vec(&json).map_err(|e| ImportError::Canonical {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        let mut hasher = Sha256::new();
        hasher.update(&jcs_bytes);
        Ok(hex::encode(hasher.finalize()))
    }
}
