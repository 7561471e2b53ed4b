//! Attribute value type.

use crate::model::DsoRef;
use std::fmt;

/// Runtime representation of one attribute value.
///
/// `Null` marks a key that is known but has no value (a bundle without a
/// handle, an unresolved `up`). Reads treat it the same as a missing key.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Object(DsoRef),
    List(Vec<AttrValue>),
    Null,
}

impl AttrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(v) => Some(v),
            _ => None,
        }
    }

    /// Builds the value for a multi-valued lookup: one value collapses to a
    /// string, several become a list, none is `None`.
    pub fn from_values(mut values: Vec<String>) -> Option<AttrValue> {
        match values.len() {
            0 => None,
            1 => values.pop().map(AttrValue::Str),
            _ => Some(AttrValue::List(
                values.into_iter().map(AttrValue::Str).collect(),
            )),
        }
    }
}

/// Human-readable form used by the printers. Lists nest as `[a, [b, c]]`.
impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::Object(r) => write!(f, "{}", r),
            AttrValue::List(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
            AttrValue::Null => Ok(()),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<DsoRef> for AttrValue {
    fn from(r: DsoRef) -> Self {
        AttrValue::Object(r)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(AttrValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectType;

    #[test]
    fn display_scalars() {
        assert_eq!(AttrValue::from("a.pdf").to_string(), "a.pdf");
        assert_eq!(AttrValue::from("a.pdf").as_str(), Some("a.pdf"));
        assert_eq!(AttrValue::Int(100).to_string(), "100");
        assert_eq!(AttrValue::Bool(false).to_string(), "false");
        assert_eq!(AttrValue::Null.to_string(), "");
        assert_eq!(
            AttrValue::Object(DsoRef::new(ObjectType::Bundle, 3)).to_string(),
            "BUNDLE.3"
        );
    }

    #[test]
    fn display_nested_lists() {
        let v = AttrValue::List(vec![
            "a".into(),
            AttrValue::List(vec![AttrValue::Int(1), AttrValue::Null]),
        ]);
        assert_eq!(v.to_string(), "[a, [1, ]]");
    }

    #[test]
    fn from_values_collapses_by_count() {
        assert_eq!(AttrValue::from_values(vec![]), None);
        assert_eq!(
            AttrValue::from_values(vec!["x".into()]),
            Some(AttrValue::Str("x".into()))
        );
        let many = AttrValue::from_values(vec!["x".into(), "y".into()]).unwrap();
        assert_eq!(many.as_list().map(|l| l.len()), Some(2));
    }

    #[test]
    fn option_maps_to_null() {
        let none: Option<String> = None;
        assert!(AttrValue::from(none).is_null());
        assert_eq!(AttrValue::from(Some(5i64)).as_int(), Some(5));
    }
}
