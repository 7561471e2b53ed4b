//! Attribute key registry.
//!
//! Every target carries the [`COMMON_KEYS`]; each listable type adds its
//! own. This table only feeds help output, lookups are never validated
//! against it since callers may overlay any key they like.

use crate::model::ObjectType;

pub const OBJECT: &str = "object";
pub const TYPE: &str = "type";
pub const ID: &str = "id";
pub const PARENT: &str = "parent";
pub const UP: &str = "up";
pub const HANDLE: &str = "handle";

/// Holds the message of a failed field lookup during materialization.
pub const EXCEPTION: &str = "exception";

/// Per-object outcome written by the mutating drivers.
pub const RESULT: &str = "result";

pub const NAME: &str = "name";
pub const TEMPLATE: &str = "template";
pub const WITHDRAWN: &str = "withdrawn";
pub const EMBARGOED: &str = "embargoed";
pub const MIME_TYPE: &str = "mimeType";
pub const SIZE: &str = "size";
pub const INTERNAL_ID: &str = "internalId";
pub const CHECKSUM: &str = "checksum";
pub const CHECKSUM_ALGORITHM: &str = "checksumAlgorithm";

pub const COMMON_KEYS: &[&str] = &[OBJECT, TYPE, ID, PARENT, UP, HANDLE];

pub const COLLECTION_KEYS: &[&str] = &[NAME, TEMPLATE];
pub const ITEM_KEYS: &[&str] = &[WITHDRAWN, NAME];
pub const BUNDLE_KEYS: &[&str] = &[EMBARGOED, NAME];
pub const BITSTREAM_KEYS: &[&str] = &[
    MIME_TYPE,
    NAME,
    SIZE,
    INTERNAL_ID,
    CHECKSUM,
    CHECKSUM_ALGORITHM,
];

/// Columns printed when the user does not pass `--include`.
pub const DEFAULT_COLUMNS: &[&str] = &[OBJECT, HANDLE, PARENT, NAME];

/// Keys a target of `kind` materializes: common keys first.
pub fn available_keys(kind: ObjectType) -> Vec<&'static str> {
    let extra: &[&str] = match kind {
        ObjectType::Collection => COLLECTION_KEYS,
        ObjectType::Item => ITEM_KEYS,
        ObjectType::Bundle => BUNDLE_KEYS,
        ObjectType::Bitstream => BITSTREAM_KEYS,
        _ => &[],
    };
    COMMON_KEYS.iter().chain(extra.iter()).copied().collect()
}

pub fn default_columns() -> Vec<String> {
    DEFAULT_COLUMNS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_keys_come_first() {
        let keys = available_keys(ObjectType::Bitstream);
        assert_eq!(&keys[..COMMON_KEYS.len()], COMMON_KEYS);
        assert!(keys.contains(&CHECKSUM_ALGORITHM));
        assert_eq!(keys.len(), COMMON_KEYS.len() + BITSTREAM_KEYS.len());
    }

    #[test]
    fn other_kinds_only_have_common_keys() {
        assert_eq!(available_keys(ObjectType::Community), COMMON_KEYS.to_vec());
        assert_eq!(available_keys(ObjectType::Group), COMMON_KEYS.to_vec());
    }

    #[test]
    fn default_columns_are_fixed() {
        assert_eq!(default_columns(), vec!["object", "handle", "parent", "name"]);
    }
}
