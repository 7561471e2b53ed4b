//! # Attribute System
//!
//! Targets expose their object as a flat map from string keys to
//! [`AttrValue`]s. The value type is closed so printers and drivers can
//! match on it exhaustively; the [`keys`] registry names the keys each
//! object type materializes.
//!
//! | Variant | Examples |
//! |---------|----------|
//! | `Str` | `name`, `handle`, `mimeType` |
//! | `Int` | `id`, `size` |
//! | `Bool` | `withdrawn`, `embargoed` |
//! | `Object` | `object`, `parent`, `up`, `template` |
//! | `List` | multi-valued metadata |
//! | `Null` | known key without a value |

pub mod keys;
mod value;

pub use keys::{available_keys, default_columns};
pub use value::AttrValue;
