// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Mapping of Rust types onto [`TypeDescriptor`]s
//!
//! Implement [`Schema`] for your own request and response records by building a
//! [`RecordSchema`](crate::RecordSchema) whose fields mirror the serde
//! representation of the type.

use std::collections::{BTreeMap, HashMap};

use crate::descriptor::TypeDescriptor;

/// Types with a known payload descriptor
pub trait Schema {
    /// Descriptor of the serialized form of `Self`
    fn schema() -> TypeDescriptor;
}

macro_rules! bounded_integer_schema {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Schema for $ty {
                fn schema() -> TypeDescriptor {
                    TypeDescriptor::bounded_integer(
                        Some(i64::from(<$ty>::MIN)),
                        Some(i64::from(<$ty>::MAX)),
                    )
                }
            }
        )*
    };
}

bounded_integer_schema!(i8, i16, i32, u8, u16, u32);

impl Schema for i64 {
    fn schema() -> TypeDescriptor {
        TypeDescriptor::bounded_integer(Some(i64::MIN), Some(i64::MAX))
    }
}

impl Schema for u64 {
    fn schema() -> TypeDescriptor {
        TypeDescriptor::bounded_integer(Some(0), None)
    }
}

impl Schema for usize {
    fn schema() -> TypeDescriptor {
        TypeDescriptor::bounded_integer(Some(0), None)
    }
}

/// Validated as any JSON number. Values outside the `f32` range decode to
/// infinity, so models needing the full range should take `f64`.
impl Schema for f32 {
    fn schema() -> TypeDescriptor {
        TypeDescriptor::Number
    }
}

impl Schema for f64 {
    fn schema() -> TypeDescriptor {
        TypeDescriptor::Number
    }
}

impl Schema for bool {
    fn schema() -> TypeDescriptor {
        TypeDescriptor::Boolean
    }
}

impl Schema for String {
    fn schema() -> TypeDescriptor {
        TypeDescriptor::String
    }
}

impl Schema for () {
    fn schema() -> TypeDescriptor {
        TypeDescriptor::Null
    }
}

impl Schema for serde_json::Value {
    fn schema() -> TypeDescriptor {
        TypeDescriptor::Any
    }
}

impl<T: Schema> Schema for Option<T> {
    fn schema() -> TypeDescriptor {
        TypeDescriptor::optional(T::schema())
    }
}

impl<T: Schema> Schema for Vec<T> {
    fn schema() -> TypeDescriptor {
        TypeDescriptor::array(T::schema())
    }
}

impl<T: Schema> Schema for Box<T> {
    fn schema() -> TypeDescriptor {
        T::schema()
    }
}

impl<T: Schema, S> Schema for HashMap<String, T, S> {
    fn schema() -> TypeDescriptor {
        TypeDescriptor::map(T::schema())
    }
}

impl<T: Schema> Schema for BTreeMap<String, T> {
    fn schema() -> TypeDescriptor {
        TypeDescriptor::map(T::schema())
    }
}
