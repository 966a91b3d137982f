//! Attribute descriptors.
//!
//! Each resource type lists its attributes as [`AttributeDescriptor`]s built
//! with a small fluent API, for example:
//!
//! ```
//! use dirconfig::schema::AttributeDescriptor;
//!
//! let attr = AttributeDescriptor::string("connection_security")
//!     .optional_computed()
//!     .one_of(&["none", "ssl", "start-tls"]);
//! assert_eq!(attr.path, "connection-security");
//! ```

use crate::types::AttrKind;

/// Describes one configurable attribute of a resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    /// Attribute name as used in declarations and state.
    pub name: &'static str,
    /// Operation path in update requests (`admin-permission`).
    pub path: String,
    /// JSON property name in request and response bodies (`adminPermission`).
    pub field: String,
    /// Value kind.
    pub kind: AttrKind,
    /// Must be set in the declaration.
    pub required: bool,
    /// Filled from the server when not declared.
    pub computed: bool,
    /// Never returned by the server; the declared value is kept as-is.
    pub write_only: bool,
    /// The server may reformat the value (durations, sizes).
    pub formatted: bool,
    /// Treat the empty string like null when diffing and mapping.
    pub empty_string_is_null: bool,
    /// Allowed values for enum-typed attributes.
    pub allowed: Option<&'static [&'static str]>,
    /// Help text shown by the `schema` command.
    pub doc: &'static str,
}

impl AttributeDescriptor {
    /// Creates an optional attribute of the given kind.
    #[must_use]
    pub fn new(name: &'static str, kind: AttrKind) -> Self {
        Self {
            name,
            path: name.replace('_', "-"),
            field: camel_case(name),
            kind,
            required: false,
            computed: false,
            write_only: false,
            formatted: false,
            empty_string_is_null: true,
            allowed: None,
            doc: "",
        }
    }

    /// Optional string attribute.
    #[must_use]
    pub fn string(name: &'static str) -> Self {
        Self::new(name, AttrKind::String)
    }

    /// Optional boolean attribute.
    #[must_use]
    pub fn bool(name: &'static str) -> Self {
        Self::new(name, AttrKind::Bool)
    }

    /// Optional integer attribute.
    #[must_use]
    pub fn int(name: &'static str) -> Self {
        Self::new(name, AttrKind::Int)
    }

    /// Optional string-set attribute.
    #[must_use]
    pub fn set(name: &'static str) -> Self {
        Self::new(name, AttrKind::Set)
    }

    /// Marks the attribute required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self.computed = false;
        self
    }

    /// Marks the attribute optional and computed by the server.
    #[must_use]
    pub const fn optional_computed(mut self) -> Self {
        self.required = false;
        self.computed = true;
        self
    }

    /// Restricts values to an enumeration.
    #[must_use]
    pub const fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    /// Marks the attribute write-only (sensitive).
    #[must_use]
    pub const fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    /// Marks the attribute as reformatted by the server.
    #[must_use]
    pub const fn formatted(mut self) -> Self {
        self.formatted = true;
        self
    }

    /// Keeps the empty string as a distinct value instead of a removal.
    #[must_use]
    pub const fn preserve_empty(mut self) -> Self {
        self.empty_string_is_null = false;
        self
    }

    /// Overrides the configuration API property name.
    #[must_use]
    pub fn api_name(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self.field = camel_case(&path.replace('-', "_"));
        self
    }

    /// Overrides only the JSON property name.
    #[must_use]
    pub fn json_name(mut self, field: &str) -> Self {
        self.field = field.to_string();
        self
    }

    /// Sets the help text.
    #[must_use]
    pub const fn doc(mut self, doc: &'static str) -> Self {
        self.doc = doc;
        self
    }

    /// True when the attribute takes values from an enumeration.
    #[must_use]
    pub const fn is_enum(&self) -> bool {
        self.allowed.is_some()
    }

    /// Checks a single value against the enumeration, if any.
    #[must_use]
    pub fn allows(&self, value: &str) -> bool {
        self.allowed.is_none_or(|allowed| allowed.contains(&value))
    }

    /// Short flag summary used by the `schema` command.
    #[must_use]
    pub fn flags(&self) -> String {
        let mut flags = Vec::new();
        if self.required {
            flags.push("required");
        } else {
            flags.push("optional");
        }
        if self.computed {
            flags.push("computed");
        }
        if self.write_only {
            flags.push("sensitive");
        }
        flags.join(", ")
    }
}

/// Converts `snake_case` to `camelCase`.
#[must_use]
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
