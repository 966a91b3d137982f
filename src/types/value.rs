//! Tri-state attribute values.
//!
//! During planning an attribute is either explicitly absent, not yet known,
//! or holds a concrete value (which may be a zero value such as `""` or
//! `false`). The diff engine and response mapper both reason over all three.

use std::fmt;

/// A tri-state attribute value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AttrValue<T> {
    /// Explicitly absent.
    #[default]
    Null,
    /// Not yet computed (plan-time placeholder).
    Unknown,
    /// A concrete value.
    Known(T),
}

impl<T> AttrValue<T> {
    /// Returns true for [`AttrValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for [`AttrValue::Unknown`].
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns true when the value is neither null nor unknown.
    #[must_use]
    pub const fn is_defined(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Borrows the concrete value, if any.
    #[must_use]
    pub const fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            Self::Null | Self::Unknown => None,
        }
    }

    /// Maps the concrete value, keeping null and unknown as they are.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AttrValue<U> {
        match self {
            Self::Null => AttrValue::Null,
            Self::Unknown => AttrValue::Unknown,
            Self::Known(value) => AttrValue::Known(f(value)),
        }
    }

    /// Converts an optional response field, mapping `None` to null.
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Known)
    }
}

impl AttrValue<String> {
    /// True for a concrete empty string (not null, not unknown).
    #[must_use]
    pub fn is_empty_string(&self) -> bool {
        matches!(self, Self::Known(s) if s.is_empty())
    }

    /// True for a concrete, non-empty string.
    #[must_use]
    pub fn is_non_empty_string(&self) -> bool {
        matches!(self, Self::Known(s) if !s.is_empty())
    }
}

impl<T: fmt::Display> fmt::Display for AttrValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Unknown => write!(f, "(known after apply)"),
            Self::Known(value) => write!(f, "{value}"),
        }
    }
}

/// Gets a string value from an optional response field.
///
/// The directory server treats an absent value and an empty string the same
/// way, but a plan does not. When the expected value was an empty string the
/// empty string is kept so the state keeps matching the plan.
#[must_use]
pub fn string_or_null(value: Option<&str>, use_empty_string_for_null: bool) -> AttrValue<String> {
    match value {
        Some(s) => AttrValue::Known(s.to_string()),
        None if use_empty_string_for_null => AttrValue::Known(String::new()),
        None => AttrValue::Null,
    }
}
