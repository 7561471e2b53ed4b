//! Core value types shared by the repository collaborators and the engine.
//!
//! Repository objects are never held directly: the engine passes around
//! [`DsoRef`] handles and asks the [`ContentRepository`](crate::store::ContentRepository)
//! for everything else.

use crate::error::{BulkError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed categories of repository objects.
///
/// The first five form the containment order, shallowest first. The rest
/// exist in the repository but are never listed or wrapped with extra keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectType {
    Community,
    Collection,
    Item,
    Bundle,
    Bitstream,
    EPerson,
    Group,
    Site,
}

impl ObjectType {
    /// Types a listing can stop at, in traversal order.
    pub const LISTABLE: [ObjectType; 4] = [
        ObjectType::Collection,
        ObjectType::Item,
        ObjectType::Bundle,
        ObjectType::Bitstream,
    ];

    /// Types a listing can start from.
    pub const ROOTS: [ObjectType; 5] = [
        ObjectType::Community,
        ObjectType::Collection,
        ObjectType::Item,
        ObjectType::Bundle,
        ObjectType::Bitstream,
    ];

    /// Containment depth, `None` for types outside the hierarchy.
    pub fn depth(self) -> Option<usize> {
        match self {
            ObjectType::Community => Some(0),
            ObjectType::Collection => Some(1),
            ObjectType::Item => Some(2),
            ObjectType::Bundle => Some(3),
            ObjectType::Bitstream => Some(4),
            _ => None,
        }
    }

    pub fn is_listable(self) -> bool {
        Self::LISTABLE.contains(&self)
    }

    pub fn is_root(self) -> bool {
        Self::ROOTS.contains(&self)
    }

    /// True when `self` sits strictly above `other` in the containment order.
    pub fn is_above(self, other: ObjectType) -> bool {
        match (self.depth(), other.depth()) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Community => "COMMUNITY",
            ObjectType::Collection => "COLLECTION",
            ObjectType::Item => "ITEM",
            ObjectType::Bundle => "BUNDLE",
            ObjectType::Bitstream => "BITSTREAM",
            ObjectType::EPerson => "EPERSON",
            ObjectType::Group => "GROUP",
            ObjectType::Site => "SITE",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = BulkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COMMUNITY" => Ok(ObjectType::Community),
            "COLLECTION" => Ok(ObjectType::Collection),
            "ITEM" => Ok(ObjectType::Item),
            "BUNDLE" => Ok(ObjectType::Bundle),
            "BITSTREAM" => Ok(ObjectType::Bitstream),
            "EPERSON" => Ok(ObjectType::EPerson),
            "GROUP" => Ok(ObjectType::Group),
            "SITE" => Ok(ObjectType::Site),
            _ => Err(BulkError::InvalidArgument(format!("unknown type '{}'", s))),
        }
    }
}

/// Opaque handle on one repository object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DsoRef {
    pub kind: ObjectType,
    pub id: i64,
}

impl DsoRef {
    pub fn new(kind: ObjectType, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for DsoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.id)
    }
}

/// Parses the `type.id` form, e.g. `item.12`.
impl FromStr for DsoRef {
    type Err = BulkError;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, id) = s
            .split_once('.')
            .ok_or_else(|| BulkError::InvalidArgument(format!("'{}' is not TYPE.ID", s)))?;
        let kind = kind.parse::<ObjectType>()?;
        let id = id
            .trim()
            .parse::<i64>()
            .map_err(|_| BulkError::InvalidArgument(format!("'{}' is not a numeric id", id)))?;
        Ok(DsoRef { kind, id })
    }
}

/// A metadata field name: `schema.element[.qualifier]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetadataField {
    pub schema: String,
    pub element: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

impl MetadataField {
    pub fn new(schema: &str, element: &str, qualifier: Option<&str>) -> Self {
        Self {
            schema: schema.to_string(),
            element: element.to_string(),
            qualifier: qualifier.map(str::to_string),
        }
    }

    /// Splits `schema.element[.qualifier]=value` on the first `=`.
    pub fn parse_assignment(s: &str) -> Result<(MetadataField, String)> {
        let (field, value) = s.split_once('=').ok_or_else(|| {
            BulkError::args(format!(
                "metadata '{}' must look like schema.element[.qualifier]=value",
                s
            ))
        })?;
        let field = field.parse::<MetadataField>()?;
        Ok((field, value.to_string()))
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}.{}.{}", self.schema, self.element, q),
            None => write!(f, "{}.{}", self.schema, self.element),
        }
    }
}

impl FromStr for MetadataField {
    type Err = BulkError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.is_empty()) {
            return Err(BulkError::args(format!(
                "'{}' is not a metadata field (schema.element[.qualifier])",
                s
            )));
        }
        Ok(MetadataField::new(parts[0], parts[1], parts.get(2).copied()))
    }
}

/// Stored properties of a bitstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitstreamInfo {
    pub name: String,
    pub mime_type: String,
    pub size: i64,
    pub internal_id: String,
    pub checksum: String,
    pub checksum_algorithm: String,
}

/// Who a policy grants an action to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "UPPERCASE")]
pub enum Principal {
    Group(String),
    EPerson(String),
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Group(name) => write!(f, "GROUP:{}", name),
            Principal::EPerson(email) => write!(f, "EPERSON:{}", email),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyAction {
    Read,
    Write,
    Add,
    Remove,
    Delete,
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PolicyAction::Read => "READ",
            PolicyAction::Write => "WRITE",
            PolicyAction::Add => "ADD",
            PolicyAction::Remove => "REMOVE",
            PolicyAction::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

impl FromStr for PolicyAction {
    type Err = BulkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "READ" => Ok(PolicyAction::Read),
            "WRITE" => Ok(PolicyAction::Write),
            "ADD" => Ok(PolicyAction::Add),
            "REMOVE" => Ok(PolicyAction::Remove),
            "DELETE" => Ok(PolicyAction::Delete),
            _ => Err(BulkError::args(format!("unknown policy action '{}'", s))),
        }
    }
}

/// A resource policy granting `action` to `principal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub action: PolicyAction,
    pub principal: Principal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
}

impl Policy {
    pub fn new(action: PolicyAction, principal: Principal) -> Self {
        Self {
            action,
            principal,
            start_date: None,
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action, self.principal)
    }
}
