//! Merge primitives for composing contributed configuration into a host.
//!
//! Two algorithms live here:
//! - [`merge_list`]: ordered-sequence merge that keeps the target's order and
//!   positions new items using anchors shared with the source.
//! - [`merge`]: shape dispatch over [`ConfigValue`]. Sequences go through
//!   [`merge_list`], mappings merge key by key, everything else is rejected.

mod error;
mod list;
mod merge;
mod value;

pub use error::MergeError;
pub use list::merge_list;
pub use merge::merge;
pub use value::{ConfigValue, Mapping, Scalar, Shape, ShapeParseError};
