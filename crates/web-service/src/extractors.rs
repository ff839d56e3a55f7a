// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Custom extractors for improved error handling
//!
//! The request body of an endpoint is read as raw JSON here and validated
//! against the endpoint's parameter schema later. Decoding failures become
//! validation errors located at `body`, with hints describing the syntax
//! problem.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{StatusCode, header},
};
use serde_json::Value;
use service_schema::{IssueKind, Location, LocationSegment, ValidationError, ValidationIssue};

use crate::{error::ServerError, route_table::BODY_LOCATION};

mod error_hints {
    pub const MISSING_COMMA: &str =
        "check for missing or extra commas between object properties or array elements";
    pub const MISSING_BRACE: &str = "check for missing closing brace '}' for JSON object";
    pub const MISSING_BRACKET: &str = "check for missing closing bracket ']' for JSON array";
    pub const MISSING_QUOTES: &str =
        "check for missing or improperly escaped quotes around string values";
    pub const CONTROL_CHARS: &str = "JSON contains invalid control characters that must be escaped";
    pub const EXPECTED_VALUE: &str =
        "expected a valid JSON value (string, number, boolean, null, object, or array)";
    pub const DEFAULT_SYNTAX: &str = "check JSON formatting and structure";
    pub const TRUNCATED_JSON: &str =
        "unexpected end of JSON input, request appears to be truncated";
}

/// Raw JSON request body; `None` when the body is empty
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Option<Value>);

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(content_type) = req.headers().get(header::CONTENT_TYPE)
            && let Ok(content_type_str) = content_type.to_str()
            && !content_type_str.starts_with("application/json")
        {
            return Err(decode_error(format!(
                "invalid content-type: expected 'application/json', got '{content_type_str}'"
            )));
        }

        let bytes = match Bytes::from_request(req, state).await {
            Ok(bytes) => bytes,
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(ServerError::PayloadTooLarge);
            }
            Err(rejection) => {
                return Err(decode_error(format!(
                    "failed to read request body: {rejection}"
                )));
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }

        serde_json::from_slice::<Value>(&bytes)
            .map(|value| Self(Some(value)))
            .map_err(|err| decode_error(describe_json_error(&err)))
    }
}

fn decode_error(message: String) -> ServerError {
    ServerError::Validation(ValidationError::single(ValidationIssue::with_message(
        Location::from_segments([LocationSegment::from(BODY_LOCATION)]),
        IssueKind::JsonDecode,
        message,
    )))
}

fn describe_json_error(err: &serde_json::Error) -> String {
    if err.is_eof() {
        error_hints::TRUNCATED_JSON.to_string()
    } else if err.is_syntax() {
        format!(
            "invalid JSON syntax at line {}, column {}: {}",
            err.line(),
            err.column(),
            get_json_syntax_hint(err)
        )
    } else {
        format!("JSON parsing error: {err}")
    }
}

/// Provides helpful hints for JSON syntax errors
fn get_json_syntax_hint(err: &serde_json::Error) -> &'static str {
    let err_msg = err.to_string();

    if err_msg.contains("expected ','") || err_msg.contains("trailing comma") {
        error_hints::MISSING_COMMA
    } else if err_msg.contains("expected '}'") {
        error_hints::MISSING_BRACE
    } else if err_msg.contains("expected ']'") {
        error_hints::MISSING_BRACKET
    } else if err_msg.contains("expected '\"'") {
        error_hints::MISSING_QUOTES
    } else if err_msg.contains("control character") {
        error_hints::CONTROL_CHARS
    } else if err_msg.contains("expected value") {
        error_hints::EXPECTED_VALUE
    } else {
        error_hints::DEFAULT_SYNTAX
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{HeaderValue, Method},
    };
    use serde_json::json;

    use super::*;

    fn create_request(body: &str) -> Request {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri("/test")
            .body(Body::from(body.to_string()))
            .unwrap();

        req.headers_mut()
            .insert("content-type", HeaderValue::from_static("application/json"));

        req
    }

    fn decode_message(error: ServerError) -> String {
        match error {
            ServerError::Validation(error) => {
                let issue = &error.issues()[0];
                assert_eq!(issue.kind, IssueKind::JsonDecode);
                assert_eq!(issue.loc.to_string(), "body");
                issue.msg.clone()
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[tokio::test]
    async fn valid_json_parsing() {
        let req = create_request(r#"{"a": 2, "b": 3}"#);
        let JsonBody(value) = JsonBody::from_request(req, &()).await.unwrap();
        assert_eq!(value, Some(json!({"a": 2, "b": 3})));
    }

    #[tokio::test]
    async fn empty_body_is_none() {
        let req = create_request("  \n");
        let JsonBody(value) = JsonBody::from_request(req, &()).await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn truncated_json() {
        let req = create_request(r#"{"a": 2, "b": 3"#);
        let message = decode_message(JsonBody::from_request(req, &()).await.unwrap_err());
        assert!(message.contains("unexpected end of JSON input"));
    }

    #[tokio::test]
    async fn syntax_error_with_comma() {
        let req = create_request(r#"{"a": 2,, "b": 3}"#);
        let message = decode_message(JsonBody::from_request(req, &()).await.unwrap_err());
        assert!(message.contains("invalid JSON syntax at line 1"));
    }

    #[tokio::test]
    async fn invalid_content_type() {
        let mut req = create_request(r#"{"a": 2}"#);
        req.headers_mut()
            .insert("content-type", HeaderValue::from_static("text/plain"));
        let message = decode_message(JsonBody::from_request(req, &()).await.unwrap_err());
        assert!(message.contains("invalid content-type"));
    }
}
