// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Schema descriptors for model service payloads
//!
//! This crate describes the shape of request and response payloads explicitly,
//! so that an HTTP surface can be generated for a model without inspecting
//! method signatures at runtime.
//!
//! # Module Structure
//!
//! - [`descriptor`]: The [`TypeDescriptor`] tree and named [`RecordSchema`]s
//! - [`schema`]: The [`Schema`] trait mapping Rust types onto descriptors
//! - [`validate`]: Structural validation of JSON values against descriptors
//! - [`openapi`]: Conversion of descriptors into `OpenAPI` schema objects
//!
//! # Example
//!
//! ```rust
//! use service_schema::{RecordSchema, Schema, TypeDescriptor};
//! use serde_json::json;
//!
//! let params = RecordSchema::new("AddParams")
//!     .field::<i64>("a")
//!     .field::<i64>("b");
//!
//! assert!(params.validate(&json!({"a": 2, "b": 3})).is_ok());
//! assert!(params.validate(&json!({"a": "x", "b": 3})).is_err());
//! assert_eq!(Vec::<f64>::schema(), TypeDescriptor::array(TypeDescriptor::Number));
//! ```

pub mod descriptor;
pub mod openapi;
pub mod schema;
pub mod validate;

pub use descriptor::{Field, RecordSchema, TypeDescriptor};
pub use openapi::to_openapi_schema;
pub use schema::Schema;
pub use validate::{IssueKind, Location, LocationSegment, ValidationError, ValidationIssue};
