//! Merge error types.

use crate::value::Shape;

/// Error raised when two values cannot be merged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// Source and target are not both sequences or both mappings.
    #[error("Unsupported merge at '{path}': cannot merge {source_shape} into {target_shape}")]
    Unsupported {
        /// Dot-separated key path of the conflict ("" at the top level)
        path: String,
        source_shape: Shape,
        target_shape: Shape,
    },
}

impl MergeError {
    pub(crate) fn unsupported(path: &str, source_shape: Shape, target_shape: Shape) -> Self {
        MergeError::Unsupported {
            path: path.to_string(),
            source_shape,
            target_shape,
        }
    }

    /// Key path where the merge failed
    pub fn path(&self) -> &str {
        match self {
            MergeError::Unsupported { path, .. } => path,
        }
    }
}
