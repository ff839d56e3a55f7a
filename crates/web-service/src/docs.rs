// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` document generation
//!
//! The document combines the routes the application serves itself with one
//! operation per materialized route. Request and response schemas come from
//! the endpoint descriptors.

use service_schema::{openapi::record_schema, to_openapi_schema};
use utoipa::openapi::{
    ComponentsBuilder, ContentBuilder, HttpMethod, InfoBuilder, OpenApi, OpenApiBuilder, PathItem,
    PathsBuilder, Ref, RefOr, Required, ResponseBuilder, Schema,
    path::OperationBuilder,
    request_body::RequestBodyBuilder,
    schema::{ArrayBuilder, ObjectBuilder, Type},
    tag::TagBuilder,
};

use crate::{
    endpoint::EndpointMethod,
    route_table::{Route, ServiceApp},
    state::{HealthCheck, HealthStatus},
};

const JSON: &str = "application/json";
const VALIDATION_ERROR_SCHEMA: &str = "HTTPValidationError";
const SERVICE_TAG: &str = "service";
const MODEL_TAG: &str = "model";

/// Build the `OpenAPI` document describing `app`
pub fn build_openapi(app: &ServiceApp) -> OpenApi {
    let mut paths = PathsBuilder::new()
        .path("/", PathItem::new(HttpMethod::Get, landing_operation()))
        .path("/health", PathItem::new(HttpMethod::Get, health_operation()));

    for route in app.routes().iter() {
        let method = match route.endpoint().http_method() {
            EndpointMethod::Get => HttpMethod::Get,
            EndpointMethod::Post => HttpMethod::Post,
        };
        paths = paths.path(route.path(), PathItem::new(method, route_operation(route)));
    }

    let components = ComponentsBuilder::new()
        .schema_from::<HealthCheck>()
        .schema_from::<HealthStatus>()
        .schema(VALIDATION_ERROR_SCHEMA, validation_error_schema())
        .build();

    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title(app.service_name())
                .version(env!("CARGO_PKG_VERSION"))
                .description(Some(format!(
                    "This web service was generated for the {} model.",
                    app.service_name()
                )))
                .build(),
        )
        .paths(paths.build())
        .components(Some(components))
        .tags(Some(vec![
            TagBuilder::new()
                .name(SERVICE_TAG)
                .description(Some("Landing page and health"))
                .build(),
            TagBuilder::new()
                .name(MODEL_TAG)
                .description(Some("Marked model endpoints"))
                .build(),
        ]))
        .build()
}

fn route_operation(route: &Route) -> OperationBuilder {
    let endpoint = route.endpoint();
    let tags = if endpoint.tags().is_empty() {
        vec![MODEL_TAG.to_string()]
    } else {
        endpoint.tags().to_vec()
    };
    let summary = endpoint
        .summary_text()
        .map_or_else(|| title_case(endpoint.name()), str::to_string);

    let returns = endpoint
        .return_type()
        .map(|returns| to_openapi_schema(&returns.descriptor()));

    let mut operation = OperationBuilder::new()
        .operation_id(Some(endpoint.name()))
        .summary(Some(summary))
        .tags(Some(tags))
        .response(
            "200",
            ResponseBuilder::new()
                .description("Successful Response")
                .content(JSON, ContentBuilder::new().schema(returns).build())
                .build(),
        )
        .response(
            "500",
            ResponseBuilder::new().description("Internal error").build(),
        );

    if !route.parameters().is_empty() {
        operation = operation
            .request_body(Some(
                RequestBodyBuilder::new()
                    .content(
                        JSON,
                        ContentBuilder::new()
                            .schema(Some(record_schema(route.parameters())))
                            .build(),
                    )
                    .required(Some(Required::True))
                    .build(),
            ))
            .response(
                "422",
                ResponseBuilder::new()
                    .description("Validation Error")
                    .content(
                        JSON,
                        ContentBuilder::new()
                            .schema(Some(RefOr::Ref(Ref::from_schema_name(
                                VALIDATION_ERROR_SCHEMA,
                            ))))
                            .build(),
                    )
                    .build(),
            );
    }

    operation
}

fn landing_operation() -> OperationBuilder {
    OperationBuilder::new()
        .operation_id(Some("landing"))
        .summary(Some("Service description"))
        .tag(SERVICE_TAG)
        .response(
            "200",
            ResponseBuilder::new()
                .description("Service name, routes and documentation links")
                .content(
                    JSON,
                    ContentBuilder::new()
                        .schema(Some(typed(Type::Object)))
                        .build(),
                )
                .build(),
        )
}

fn health_operation() -> OperationBuilder {
    OperationBuilder::new()
        .operation_id(Some("health"))
        .summary(Some("Health check endpoint"))
        .tag(SERVICE_TAG)
        .response(
            "200",
            ResponseBuilder::new()
                .description("Service is healthy")
                .content(
                    JSON,
                    ContentBuilder::new()
                        .schema(Some(RefOr::Ref(Ref::from_schema_name(
                            "HealthCheck",
                        ))))
                        .build(),
                )
                .build(),
        )
        .response(
            "503",
            ResponseBuilder::new()
                .description("Service is shutting down")
                .build(),
        )
}

fn typed(schema_type: Type) -> Schema {
    Schema::Object(ObjectBuilder::new().schema_type(schema_type).build())
}

fn array_of(items: Schema) -> Schema {
    Schema::Array(ArrayBuilder::new().items(RefOr::T(items)).build())
}

/// Body of a 422 response: one entry per issue
fn validation_error_schema() -> Schema {
    let issue = ObjectBuilder::new()
        .schema_type(Type::Object)
        .title(Some("ValidationError"))
        .property("loc", array_of(typed(Type::String)))
        .required("loc")
        .property("msg", typed(Type::String))
        .required("msg")
        .property("type", typed(Type::String))
        .required("type")
        .build();

    Schema::Object(
        ObjectBuilder::new()
            .schema_type(Type::Object)
            .title(Some(VALIDATION_ERROR_SCHEMA))
            .property("detail", array_of(Schema::Object(issue)))
            .build(),
    )
}

fn title_case(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
