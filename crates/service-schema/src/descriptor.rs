// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Type descriptors
//!
//! A [`TypeDescriptor`] is an explicit, data-level description of a payload
//! type drawn from the representable set: primitives, sequences, string-keyed
//! mappings, optionals and named records, nested arbitrarily.

use std::fmt;

use crate::schema::Schema;

/// Description of a representable payload type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// Any JSON value; carries no type information
    Any,
    /// JSON `null` only
    Null,
    /// JSON boolean
    Boolean,
    /// Integral JSON number, optionally bounded (inclusive)
    Integer {
        /// Smallest accepted value
        minimum: Option<i64>,
        /// Largest accepted value
        maximum: Option<i64>,
    },
    /// Any JSON number
    Number,
    /// JSON string
    String,
    /// Homogeneous JSON array
    Array(Box<TypeDescriptor>),
    /// JSON object with string keys and homogeneous values
    Map(Box<TypeDescriptor>),
    /// `null` or the inner type; optional when used as a record field
    Optional(Box<TypeDescriptor>),
    /// Named structured record
    Record(RecordSchema),
}

impl TypeDescriptor {
    /// Unbounded integer
    pub const fn integer() -> Self {
        Self::Integer {
            minimum: None,
            maximum: None,
        }
    }

    /// Integer within the inclusive `[minimum, maximum]` range
    pub const fn bounded_integer(minimum: Option<i64>, maximum: Option<i64>) -> Self {
        Self::Integer { minimum, maximum }
    }

    /// Array of `items`
    pub fn array(items: TypeDescriptor) -> Self {
        Self::Array(Box::new(items))
    }

    /// String-keyed map of `values`
    pub fn map(values: TypeDescriptor) -> Self {
        Self::Map(Box::new(values))
    }

    /// Optional `inner`
    pub fn optional(inner: TypeDescriptor) -> Self {
        match inner {
            already @ Self::Optional(_) => already,
            other => Self::Optional(Box::new(other)),
        }
    }

    /// Whether the value may be `null` or omitted
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_) | Self::Any | Self::Null)
    }

    /// Whether this descriptor carries full type information at every depth
    pub fn is_complete(&self) -> bool {
        self.find_unspecified().is_none()
    }

    /// Location of the first [`TypeDescriptor::Any`] within this descriptor
    ///
    /// Returns `Some("")` when the descriptor itself is `Any`, `Some("[]")` for
    /// the items of an array, `Some("{}")` for map values and `Some(".field")`
    /// for record fields, composed for nested positions.
    pub fn find_unspecified(&self) -> Option<String> {
        match self {
            Self::Any => Some(String::new()),
            Self::Null | Self::Boolean | Self::Integer { .. } | Self::Number | Self::String => None,
            Self::Array(items) => items.find_unspecified().map(|rest| format!("[]{rest}")),
            Self::Map(values) => values.find_unspecified().map(|rest| format!("{{}}{rest}")),
            Self::Optional(inner) => inner.find_unspecified(),
            Self::Record(record) => record.fields.iter().find_map(|field| {
                field
                    .descriptor
                    .find_unspecified()
                    .map(|rest| format!(".{}{rest}", field.name))
            }),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Null => write!(f, "null"),
            Self::Boolean => write!(f, "bool"),
            Self::Integer { .. } => write!(f, "int"),
            Self::Number => write!(f, "float"),
            Self::String => write!(f, "str"),
            Self::Array(items) => write!(f, "list[{items}]"),
            Self::Map(values) => write!(f, "dict[str, {values}]"),
            Self::Optional(inner) => write!(f, "optional[{inner}]"),
            Self::Record(record) => write!(f, "{}", record.name),
        }
    }
}

impl From<RecordSchema> for TypeDescriptor {
    fn from(record: RecordSchema) -> Self {
        Self::Record(record)
    }
}

/// A named field of a [`RecordSchema`]
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name as it appears on the wire
    pub name: String,
    /// Declared type of the field
    pub descriptor: TypeDescriptor,
}

impl Field {
    /// Whether the field must be present
    pub fn is_required(&self) -> bool {
        !self.descriptor.is_optional()
    }
}

/// Named collection of typed fields
///
/// Field order is preserved for documentation; validation and equality of
/// decoded values do not depend on it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    name: String,
    fields: Vec<Field>,
}

impl RecordSchema {
    /// Create an empty record schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field typed by a [`Schema`] implementor
    #[must_use]
    pub fn field<T: Schema>(self, name: impl Into<String>) -> Self {
        self.field_with(name, T::schema())
    }

    /// Add a field with an explicit descriptor
    #[must_use]
    pub fn field_with(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.fields.push(Field {
            name: name.into(),
            descriptor,
        });
        self
    }

    /// Record name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Names of fields that must be present
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|field| field.is_required())
            .map(|field| field.name.as_str())
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record declares no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_does_not_nest() {
        let once = TypeDescriptor::optional(TypeDescriptor::String);
        let twice = TypeDescriptor::optional(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn complete_descriptors() {
        assert!(TypeDescriptor::array(TypeDescriptor::array(TypeDescriptor::Number)).is_complete());
        assert!(
            RecordSchema::new("Fit")
                .field::<Vec<Vec<f64>>>("X")
                .field::<Vec<f64>>("y")
                .fields()
                .iter()
                .all(|field| field.descriptor.is_complete())
        );
    }

    #[test]
    fn unspecified_locations() {
        assert_eq!(TypeDescriptor::Any.find_unspecified().as_deref(), Some(""));
        assert_eq!(
            TypeDescriptor::array(TypeDescriptor::Any)
                .find_unspecified()
                .as_deref(),
            Some("[]")
        );
        assert_eq!(
            TypeDescriptor::map(TypeDescriptor::array(TypeDescriptor::Any))
                .find_unspecified()
                .as_deref(),
            Some("{}[]")
        );

        let record: TypeDescriptor = RecordSchema::new("Outer")
            .field::<String>("name")
            .field_with("payload", TypeDescriptor::optional(TypeDescriptor::Any))
            .into();
        assert_eq!(record.find_unspecified().as_deref(), Some(".payload"));
    }

    #[test]
    fn required_fields_skip_optionals() {
        let record = RecordSchema::new("Query")
            .field::<String>("text")
            .field::<Option<i64>>("limit");
        let required: Vec<_> = record.required_fields().collect();
        assert_eq!(required, vec!["text"]);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn display_names() {
        assert_eq!(
            TypeDescriptor::array(TypeDescriptor::array(TypeDescriptor::Number)).to_string(),
            "list[list[float]]"
        );
        assert_eq!(
            TypeDescriptor::map(TypeDescriptor::integer()).to_string(),
            "dict[str, int]"
        );
        assert_eq!(
            TypeDescriptor::from(RecordSchema::new("Predictions")).to_string(),
            "Predictions"
        );
    }
}
