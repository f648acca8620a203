//! Shape-dispatched merge of configuration values.
//!
//! Merge semantics:
//! - Sequences: anchor-preserving list merge (see [`merge_list`])
//! - Mappings: new keys are inserted, shared keys merge recursively,
//!   target-only keys are untouched
//! - Anything else: [`MergeError::Unsupported`]

use crate::error::MergeError;
use crate::list::merge_list;
use crate::value::ConfigValue;

/// Merge `source` into `target` in place.
///
/// A top-level shape mismatch leaves `target` untouched. A failure nested
/// inside a mapping leaves the keys merged so far in place.
pub fn merge(source: &ConfigValue, target: &mut ConfigValue) -> Result<(), MergeError> {
    merge_at(source, target, "")
}

fn merge_at(source: &ConfigValue, target: &mut ConfigValue, path: &str) -> Result<(), MergeError> {
    match (source, target) {
        (ConfigValue::Sequence(items), ConfigValue::Sequence(existing)) => {
            merge_list(items, existing);
            Ok(())
        }
        (ConfigValue::Mapping(entries), ConfigValue::Mapping(existing)) => {
            for (key, value) in entries {
                match existing.get_mut(key) {
                    Some(current) => merge_at(value, current, &join(path, key))?,
                    None => {
                        existing.insert(key.clone(), value.clone());
                    }
                }
            }
            Ok(())
        }
        (source, target) => Err(MergeError::unsupported(path, source.shape(), target.shape())),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
