// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` schema generation from descriptors

use utoipa::openapi::{
    RefOr,
    schema::{
        AdditionalProperties, ArrayBuilder, KnownFormat, ObjectBuilder, OneOfBuilder, Schema,
        SchemaFormat, SchemaType, Type,
    },
};

use crate::descriptor::{RecordSchema, TypeDescriptor};

/// Convert a descriptor into an inline `OpenAPI` schema
pub fn to_openapi_schema(descriptor: &TypeDescriptor) -> RefOr<Schema> {
    let schema = match descriptor {
        TypeDescriptor::Any => Schema::Object(
            ObjectBuilder::new()
                .schema_type(SchemaType::AnyValue)
                .build(),
        ),
        TypeDescriptor::Null => Schema::Object(ObjectBuilder::new().schema_type(Type::Null).build()),
        TypeDescriptor::Boolean => {
            Schema::Object(ObjectBuilder::new().schema_type(Type::Boolean).build())
        }
        TypeDescriptor::Integer { minimum, maximum } => {
            let format = if fits_i32(*minimum, *maximum) {
                KnownFormat::Int32
            } else {
                KnownFormat::Int64
            };
            Schema::Object(
                ObjectBuilder::new()
                    .schema_type(Type::Integer)
                    .format(Some(SchemaFormat::KnownFormat(format)))
                    .minimum(*minimum)
                    .maximum(*maximum)
                    .build(),
            )
        }
        TypeDescriptor::Number => Schema::Object(
            ObjectBuilder::new()
                .schema_type(Type::Number)
                .format(Some(SchemaFormat::KnownFormat(KnownFormat::Double)))
                .build(),
        ),
        TypeDescriptor::String => {
            Schema::Object(ObjectBuilder::new().schema_type(Type::String).build())
        }
        TypeDescriptor::Array(items) => {
            Schema::Array(ArrayBuilder::new().items(to_openapi_schema(items)).build())
        }
        TypeDescriptor::Map(values) => Schema::Object(
            ObjectBuilder::new()
                .schema_type(Type::Object)
                .additional_properties(Some(AdditionalProperties::RefOr(to_openapi_schema(
                    values,
                ))))
                .build(),
        ),
        TypeDescriptor::Optional(inner) => Schema::OneOf(
            OneOfBuilder::new()
                .item(to_openapi_schema(inner))
                .item(Schema::Object(
                    ObjectBuilder::new().schema_type(Type::Null).build(),
                ))
                .build(),
        ),
        TypeDescriptor::Record(record) => return record_schema(record),
    };
    RefOr::T(schema)
}

/// Convert a record into an object schema with required fields listed
pub fn record_schema(record: &RecordSchema) -> RefOr<Schema> {
    let mut object = ObjectBuilder::new()
        .schema_type(Type::Object)
        .title(Some(record.name()));

    for field in record.fields() {
        object = object.property(field.name.clone(), to_openapi_schema(&field.descriptor));
        if field.is_required() {
            object = object.required(field.name.clone());
        }
    }

    RefOr::T(Schema::Object(object.build()))
}

fn fits_i32(minimum: Option<i64>, maximum: Option<i64>) -> bool {
    matches!(
        (minimum, maximum),
        (Some(min), Some(max)) if min >= i64::from(i32::MIN) && max <= i64::from(i32::MAX)
    )
}
