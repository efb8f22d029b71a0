//! HTTP helpers for Lambda functions.

use lambda_http::{Body, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::ErrorResponse;
use crate::{Error, Result};

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(data)?))
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}

/// Create an `{"error": ...}` response with the given status code.
///
/// Falls back to a fixed 500 body so callers always get JSON back.
pub fn error_response(status: u16, message: impl Into<String>) -> Response<Body> {
    let body = ErrorResponse {
        error: message.into(),
    };

    json_response(status, &body).unwrap_or_else(|_| {
        let mut response = Response::new(Body::from(r#"{"error":"Internal server error"}"#));
        *response.status_mut() = lambda_http::http::StatusCode::INTERNAL_SERVER_ERROR;
        response.headers_mut().insert(
            "content-type",
            lambda_http::http::HeaderValue::from_static("application/json"),
        );
        response
    })
}

/// Response for an [`Error`], using its status and redacted message.
pub fn error_for(err: &Error) -> Response<Body> {
    error_response(err.status_code(), err.public_message())
}

/// Parse a request body as a JSON object.
///
/// Empty bodies, malformed JSON, non-object values and type mismatches are
/// all `Error::Serialization`, which surfaces as a redacted 500.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<T> {
    let value: serde_json::Value = serde_json::from_slice(body.as_ref())?;
    if !value.is_object() {
        return Err(Error::Serialization(serde::de::Error::custom(
            "request body must be a JSON object",
        )));
    }

    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRequest;

    fn body_json(response: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    #[test]
    fn test_json_response() {
        let response = json_response(201, &serde_json::json!({"ok": true})).unwrap();
        assert_eq!(response.status(), 201);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(body_json(&response)["ok"], true);
    }

    #[test]
    fn test_error_for_redacts_internal_errors() {
        let response = error_for(&Error::Internal("stack trace here".into()));
        assert_eq!(response.status(), 500);
        assert_eq!(body_json(&response)["error"], "Internal server error");
    }

    #[test]
    fn test_parse_json_body() {
        let parsed: ChatRequest = parse_json_body(&Body::from(r#"{"message":"hi"}"#)).unwrap();
        assert_eq!(parsed.text(), "hi");

        let empty_object: ChatRequest = parse_json_body(&Body::from("{}")).unwrap();
        assert_eq!(empty_object.text(), "");
    }

    #[test]
    fn test_unusable_bodies_are_server_errors() {
        for body in [Body::Empty, Body::from("not json"), Body::from("[]"), Body::from("\"hi\"")] {
            let err = parse_json_body::<ChatRequest>(&body).unwrap_err();
            assert!(matches!(err, Error::Serialization(_)), "{:?}", err);
            assert_eq!(err.status_code(), 500);
        }

        let err = parse_json_body::<ChatRequest>(&Body::from(r#"{"message":42}"#)).unwrap_err();
        assert_eq!(err.status_code(), 500);
    }
}
