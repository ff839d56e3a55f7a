// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Structural validation of JSON values
//!
//! Validation walks a [`serde_json::Value`] alongside a [`TypeDescriptor`] and
//! collects every mismatch rather than stopping at the first one. Issues use the
//! `loc` / `msg` / `type` shape that FastAPI clients already understand.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::descriptor::{RecordSchema, TypeDescriptor};

/// One step into a JSON document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LocationSegment {
    /// Object key
    Key(String),
    /// Array index
    Index(usize),
}

impl fmt::Display for LocationSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for LocationSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for LocationSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Path from the document root to an offending value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Location(Vec<LocationSegment>);

impl Location {
    /// The document root
    pub fn root() -> Self {
        Self::default()
    }

    /// Location built from segments
    pub fn from_segments(segments: impl IntoIterator<Item = LocationSegment>) -> Self {
        Self(segments.into_iter().collect())
    }

    /// Segments from the root outwards
    pub fn segments(&self) -> &[LocationSegment] {
        &self.0
    }

    /// Prepend `segment`
    #[must_use]
    pub fn prefixed(mut self, segment: impl Into<LocationSegment>) -> Self {
        self.0.insert(0, segment.into());
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "__root__");
        }
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");
        write!(f, "{joined}")
    }
}

/// Category of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Required field absent
    Missing,
    /// Expected an integer
    Integer,
    /// Expected a number
    Float,
    /// Expected a string
    Str,
    /// Expected a boolean
    Bool,
    /// Expected an array
    List,
    /// Expected an object
    Dict,
    /// `null` where a value is required
    NoneNotAllowed,
    /// Value where only `null` is allowed
    NoneAllowed,
    /// Integer below its minimum
    NotGreaterOrEqual,
    /// Integer above its maximum
    NotLessOrEqual,
    /// Body could not be decoded as JSON
    JsonDecode,
}

impl IssueKind {
    /// Machine readable issue code
    pub const fn code(self) -> &'static str {
        match self {
            Self::Missing => "value_error.missing",
            Self::Integer => "type_error.integer",
            Self::Float => "type_error.float",
            Self::Str => "type_error.str",
            Self::Bool => "type_error.bool",
            Self::List => "type_error.list",
            Self::Dict => "type_error.dict",
            Self::NoneNotAllowed => "type_error.none.not_allowed",
            Self::NoneAllowed => "type_error.none.allowed",
            Self::NotGreaterOrEqual => "value_error.number.not_ge",
            Self::NotLessOrEqual => "value_error.number.not_le",
            Self::JsonDecode => "value_error.jsondecode",
        }
    }

    const fn message(self) -> &'static str {
        match self {
            Self::Missing => "field required",
            Self::Integer => "value is not a valid integer",
            Self::Float => "value is not a valid float",
            Self::Str => "str type expected",
            Self::Bool => "value could not be parsed to a boolean",
            Self::List => "value is not a valid list",
            Self::Dict => "value is not a valid dict",
            Self::NoneNotAllowed => "none is not an allowed value",
            Self::NoneAllowed => "value is not none",
            Self::NotGreaterOrEqual => "ensure this value is greater than or equal to the minimum",
            Self::NotLessOrEqual => "ensure this value is less than or equal to the maximum",
            Self::JsonDecode => "request body is not valid JSON",
        }
    }
}

impl Serialize for IssueKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// A single mismatch between a value and its descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Where the mismatch occurred
    pub loc: Location,
    /// Human readable explanation
    pub msg: String,
    /// Issue category
    #[serde(rename = "type")]
    pub kind: IssueKind,
}

impl ValidationIssue {
    /// Issue with the default message for `kind`
    pub fn new(loc: Location, kind: IssueKind) -> Self {
        Self {
            loc,
            msg: kind.message().to_string(),
            kind,
        }
    }

    /// Issue with a custom message
    pub fn with_message(loc: Location, kind: IssueKind, msg: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind,
        }
    }
}

/// A payload failed structural validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summarize(.issues))]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Error wrapping the collected `issues`
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Error with a single issue
    pub fn single(issue: ValidationIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    /// All collected issues in discovery order
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Consume the error, returning its issues
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    /// Prepend `segment` to the location of every issue
    #[must_use]
    pub fn prefixed(self, segment: &str) -> Self {
        Self {
            issues: self
                .issues
                .into_iter()
                .map(|issue| ValidationIssue {
                    loc: issue.loc.prefixed(segment),
                    ..issue
                })
                .collect(),
        }
    }
}

fn summarize(issues: &[ValidationIssue]) -> String {
    let count = issues.len();
    let noun = if count == 1 { "error" } else { "errors" };
    let mut summary = format!("{count} validation {noun}");
    for issue in issues {
        summary.push_str(&format!("; {}: {} ({})", issue.loc, issue.msg, issue.kind.code()));
    }
    summary
}

impl TypeDescriptor {
    /// Validate `value` against this descriptor
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let mut walker = Walker::default();
        walker.check(self, value);
        walker.finish()
    }
}

impl RecordSchema {
    /// Validate that `value` is an object matching this record
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let mut walker = Walker::default();
        walker.check_record(self, value);
        walker.finish()
    }

    /// Validate the fields of an already decoded object
    pub fn validate_object(&self, object: &Map<String, Value>) -> Result<(), ValidationError> {
        let mut walker = Walker::default();
        walker.check_fields(self, object);
        walker.finish()
    }
}

#[derive(Default)]
struct Walker {
    path: Vec<LocationSegment>,
    issues: Vec<ValidationIssue>,
}

impl Walker {
    fn finish(self) -> Result<(), ValidationError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.issues))
        }
    }

    fn location(&self) -> Location {
        Location::from_segments(self.path.iter().cloned())
    }

    fn report(&mut self, kind: IssueKind) {
        let issue = ValidationIssue::new(self.location(), kind);
        self.issues.push(issue);
    }

    fn report_message(&mut self, kind: IssueKind, msg: String) {
        let issue = ValidationIssue::with_message(self.location(), kind, msg);
        self.issues.push(issue);
    }

    fn nested(&mut self, segment: LocationSegment, descriptor: &TypeDescriptor, value: &Value) {
        self.path.push(segment);
        self.check(descriptor, value);
        self.path.pop();
    }

    fn check(&mut self, descriptor: &TypeDescriptor, value: &Value) {
        if value.is_null() && !descriptor.is_optional() {
            self.report(IssueKind::NoneNotAllowed);
            return;
        }

        match descriptor {
            TypeDescriptor::Any => {}
            TypeDescriptor::Null => {
                if !value.is_null() {
                    self.report(IssueKind::NoneAllowed);
                }
            }
            TypeDescriptor::Boolean => {
                if !value.is_boolean() {
                    self.report(IssueKind::Bool);
                }
            }
            TypeDescriptor::Integer { minimum, maximum } => {
                self.check_integer(*minimum, *maximum, value);
            }
            TypeDescriptor::Number => {
                if !value.is_number() {
                    self.report(IssueKind::Float);
                }
            }
            TypeDescriptor::String => {
                if !value.is_string() {
                    self.report(IssueKind::Str);
                }
            }
            TypeDescriptor::Array(items) => match value {
                Value::Array(elements) => {
                    for (index, element) in elements.iter().enumerate() {
                        self.nested(LocationSegment::Index(index), items, element);
                    }
                }
                _ => self.report(IssueKind::List),
            },
            TypeDescriptor::Map(values) => match value {
                Value::Object(entries) => {
                    for (key, entry) in entries {
                        self.nested(LocationSegment::Key(key.clone()), values, entry);
                    }
                }
                _ => self.report(IssueKind::Dict),
            },
            TypeDescriptor::Optional(inner) => {
                if !value.is_null() {
                    self.check(inner, value);
                }
            }
            TypeDescriptor::Record(record) => self.check_record(record, value),
        }
    }

    fn check_integer(&mut self, minimum: Option<i64>, maximum: Option<i64>, value: &Value) {
        let Value::Number(number) = value else {
            self.report(IssueKind::Integer);
            return;
        };

        if let Some(int) = number.as_i64() {
            if let Some(min) = minimum
                && int < min
            {
                self.report_message(
                    IssueKind::NotGreaterOrEqual,
                    format!("ensure this value is greater than or equal to {min}"),
                );
            }
            if let Some(max) = maximum
                && int > max
            {
                self.report_message(
                    IssueKind::NotLessOrEqual,
                    format!("ensure this value is less than or equal to {max}"),
                );
            }
        } else if number.is_u64() {
            // Beyond i64::MAX, so only an unbounded maximum admits it.
            if let Some(max) = maximum {
                self.report_message(
                    IssueKind::NotLessOrEqual,
                    format!("ensure this value is less than or equal to {max}"),
                );
            }
        } else {
            self.report(IssueKind::Integer);
        }
    }

    fn check_record(&mut self, record: &RecordSchema, value: &Value) {
        match value {
            Value::Object(object) => self.check_fields(record, object),
            _ => self.report(IssueKind::Dict),
        }
    }

    fn check_fields(&mut self, record: &RecordSchema, object: &Map<String, Value>) {
        for field in record.fields() {
            match object.get(&field.name) {
                Some(value) => {
                    self.nested(
                        LocationSegment::Key(field.name.clone()),
                        &field.descriptor,
                        value,
                    );
                }
                None if field.is_required() => {
                    self.path.push(LocationSegment::Key(field.name.clone()));
                    self.report(IssueKind::Missing);
                    self.path.pop();
                }
                None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn add_params() -> RecordSchema {
        RecordSchema::new("AddParams")
            .field::<i64>("a")
            .field::<i64>("b")
    }

    #[test]
    fn accepts_matching_record() {
        assert!(add_params().validate(&json!({"a": 2, "b": 3})).is_ok());
    }

    #[test]
    fn ignores_unknown_fields() {
        assert!(
            add_params()
                .validate(&json!({"a": 2, "b": 3, "c": "extra"}))
                .is_ok()
        );
    }

    #[test]
    fn rejects_type_mismatch() {
        let err = add_params()
            .validate(&json!({"a": "x", "b": 3}))
            .expect_err("string is not an integer");
        assert_eq!(err.issues().len(), 1);
        let issue = &err.issues()[0];
        assert_eq!(issue.kind, IssueKind::Integer);
        assert_eq!(issue.msg, "value is not a valid integer");
        assert_eq!(issue.loc, Location::from_segments([LocationSegment::from("a")]));
    }

    #[test]
    fn collects_every_issue() {
        let err = add_params()
            .validate(&json!({"a": 1.5}))
            .expect_err("two problems");
        let kinds: Vec<_> = err.issues().iter().map(|issue| issue.kind).collect();
        assert_eq!(kinds, vec![IssueKind::Integer, IssueKind::Missing]);
        assert_eq!(err.issues()[1].msg, "field required");
    }

    #[test]
    fn nested_locations() {
        let params = RecordSchema::new("Predict").field::<Vec<Vec<f64>>>("X");
        let err = params
            .validate(&json!({"X": [[1.0], ["b"], [3]]}))
            .expect_err("string in matrix");
        assert_eq!(
            err.issues()[0].loc,
            Location::from_segments([
                LocationSegment::from("X"),
                LocationSegment::Index(1),
                LocationSegment::Index(0),
            ])
        );
        assert_eq!(err.issues()[0].msg, "value is not a valid float");

        let prefixed = err.prefixed("body");
        assert_eq!(
            serde_json::to_value(&prefixed.issues()[0]).expect("issue serializes"),
            json!({"loc": ["body", "X", 1, 0], "msg": "value is not a valid float", "type": "type_error.float"})
        );
    }

    #[test]
    fn rejects_integers_beyond_i64() {
        let err = add_params()
            .validate(&json!({"a": 9_223_372_036_854_775_808_u64, "b": 1}))
            .expect_err("does not fit in i64");
        let issue = &err.issues()[0];
        assert_eq!(issue.kind, IssueKind::NotLessOrEqual);
        assert_eq!(
            issue.msg,
            format!("ensure this value is less than or equal to {}", i64::MAX)
        );
    }

    #[test]
    fn integers_are_accepted_as_numbers() {
        assert!(TypeDescriptor::Number.validate(&json!(8)).is_ok());
        assert!(TypeDescriptor::integer().validate(&json!(8.0)).is_err());
    }

    #[test]
    fn integer_bounds() {
        let byte = TypeDescriptor::bounded_integer(Some(0), Some(255));
        assert!(byte.validate(&json!(255)).is_ok());

        let err = byte.validate(&json!(-1)).expect_err("below minimum");
        assert_eq!(err.issues()[0].kind, IssueKind::NotGreaterOrEqual);
        assert_eq!(
            err.issues()[0].msg,
            "ensure this value is greater than or equal to 0"
        );

        let err = byte.validate(&json!(u64::MAX)).expect_err("above maximum");
        assert_eq!(err.issues()[0].kind, IssueKind::NotLessOrEqual);

        let unsigned = TypeDescriptor::bounded_integer(Some(0), None);
        assert!(unsigned.validate(&json!(u64::MAX)).is_ok());
    }

    #[test]
    fn null_handling() {
        let err = TypeDescriptor::String
            .validate(&Value::Null)
            .expect_err("null string");
        assert_eq!(err.issues()[0].kind, IssueKind::NoneNotAllowed);

        let optional = TypeDescriptor::optional(TypeDescriptor::String);
        assert!(optional.validate(&Value::Null).is_ok());
        assert!(optional.validate(&json!("text")).is_ok());
        assert!(optional.validate(&json!(1)).is_err());

        assert!(TypeDescriptor::Null.validate(&Value::Null).is_ok());
        assert_eq!(
            TypeDescriptor::Null.validate(&json!(0)).expect_err("not null").issues()[0].kind,
            IssueKind::NoneAllowed
        );
    }

    #[test]
    fn optional_fields_may_be_omitted() {
        let record = RecordSchema::new("Query")
            .field::<String>("text")
            .field::<Option<u32>>("limit");
        assert!(record.validate(&json!({"text": "hi"})).is_ok());
        assert!(record.validate(&json!({"text": "hi", "limit": null})).is_ok());
        assert!(record.validate(&json!({"text": "hi", "limit": -3})).is_err());
    }

    #[test]
    fn maps_and_records() {
        let scores = TypeDescriptor::map(TypeDescriptor::Number);
        assert!(scores.validate(&json!({"a": 0.5, "b": 1})).is_ok());
        let err = scores
            .validate(&json!({"a": true}))
            .expect_err("bool is not a float");
        assert_eq!(err.issues()[0].loc, Location::from_segments([LocationSegment::from("a")]));

        let err = add_params()
            .validate(&json!([1, 2]))
            .expect_err("array is not a record");
        assert_eq!(err.issues()[0].kind, IssueKind::Dict);
        assert_eq!(err.issues()[0].loc, Location::root());
    }

    #[test]
    fn display_lists_issues() {
        let err = add_params()
            .validate(&json!({}))
            .expect_err("both missing");
        assert_eq!(
            err.to_string(),
            "2 validation errors; a: field required (value_error.missing); b: field required (value_error.missing)"
        );
    }
}
