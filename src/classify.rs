//! Ordered error-classification chain.
//!
//! Every response from every endpoint (token, GET, POST, DELETE) is passed
//! through [`classify`]. The chain is an ordered slice of [`Rule`]s; the
//! first rule whose predicate matches decides the outcome. If no rule
//! matches, the response is a success and its parsed body is returned
//! unchanged.
//!
//! Rules are not mutually exclusive: a 400 is checked for
//! `error == "invalid_request"` (rule 2) before the generic missing-`error`
//! case (rule 5), and a 400 with any other `error` value falls through to
//! the catch-all (rule 6).

use serde_json::Value;

use crate::error::{ApiFailure, FailureKind};

/// Message used when a nested `messageTxt` is absent or empty.
pub const DEFAULT_MESSAGE: &str = "No error message provided";

/// Fixed message for 400 responses without an `error` field.
pub const BAD_REQUEST_MESSAGE: &str = "Bad request";

const SERVER_ERROR_POINTER: &str =
    "/confirmMessage/resourceMessages/0/processMessages/0/userMessage/messageTxt";
const NOT_FOUND_POINTER: &str = "/confirmMessage/processMessages/0/userMessage/messageTxt";

/// A completed HTTP response, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Body parsed as JSON; `Value::Null` when empty or not JSON.
    pub parsed_body: Value,
    /// Body bytes exactly as received.
    pub raw_body: Vec<u8>,
    /// Host the request was sent to.
    pub host: String,
}

impl RawResponse {
    /// Builds a response from a status and raw bytes, parsing the body as
    /// JSON when possible.
    pub fn new(status_code: u16, raw_body: Vec<u8>, host: impl Into<String>) -> Self {
        let parsed_body = serde_json::from_slice(&raw_body).unwrap_or(Value::Null);
        RawResponse {
            status_code,
            parsed_body,
            raw_body,
            host: host.into(),
        }
    }

    fn top_level_str(&self, field: &str) -> Option<&str> {
        self.parsed_body.get(field).and_then(Value::as_str)
    }

    fn has_error_field(&self) -> bool {
        matches!(self.parsed_body.get("error"), Some(v) if !v.is_null())
    }
}

/// Result of running a response through the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// No error rule matched; carries the parsed body.
    Success(Value),
    /// An error rule matched.
    Failure(ApiFailure),
}

impl Outcome {
    /// Converts into a `Result`, discarding nothing.
    pub fn into_result(self) -> Result<Value, ApiFailure> {
        match self {
            Outcome::Success(body) => Ok(body),
            Outcome::Failure(failure) => Err(failure),
        }
    }
}

/// One link in the chain: a predicate paired with the failure it produces.
pub struct Rule {
    /// Failure kind produced when `matches` is true.
    pub kind: FailureKind,
    /// Predicate over the response.
    pub matches: fn(&RawResponse) -> bool,
    /// Builds the human-readable message.
    pub message: fn(&RawResponse) -> String,
    /// Whether the failure carries the full parsed body.
    pub keeps_body: bool,
}

/// The chain, in precedence order. Reordering changes which error callers
/// see for identical responses.
pub static RULES: &[Rule] = &[
    Rule {
        kind: FailureKind::ServerError,
        matches: |r| r.status_code == 500,
        message: |r| nested_message(r, SERVER_ERROR_POINTER),
        keeps_body: true,
    },
    Rule {
        kind: FailureKind::InvalidRequest,
        matches: |r| r.status_code == 400 && r.top_level_str("error") == Some("invalid_request"),
        message: error_and_description,
        keeps_body: false,
    },
    Rule {
        kind: FailureKind::ResourceNotFound,
        matches: |r| r.status_code == 404,
        message: |r| nested_message(r, NOT_FOUND_POINTER),
        keeps_body: false,
    },
    Rule {
        kind: FailureKind::Unauthorized,
        matches: |r| r.status_code == 401,
        message: error_and_description,
        keeps_body: false,
    },
    Rule {
        kind: FailureKind::BadRequest,
        matches: |r| r.status_code == 400 && !r.has_error_field(),
        message: |_| BAD_REQUEST_MESSAGE.to_string(),
        keeps_body: true,
    },
    Rule {
        kind: FailureKind::UnknownError,
        matches: |r| !(200..300).contains(&r.status_code),
        message: |r| {
            format!(
                "Code {}: {}",
                r.status_code,
                String::from_utf8_lossy(&r.raw_body)
            )
        },
        keeps_body: false,
    },
];

/// Runs `response` through [`RULES`] and returns the first matching outcome.
pub fn classify(response: &RawResponse) -> Outcome {
    match RULES.iter().find(|rule| (rule.matches)(response)) {
        Some(rule) => Outcome::Failure(ApiFailure {
            kind: rule.kind,
            status: response.status_code,
            message: (rule.message)(response),
            body: rule.keeps_body.then(|| response.parsed_body.clone()),
        }),
        None => Outcome::Success(response.parsed_body.clone()),
    }
}

fn nested_message(response: &RawResponse, pointer: &str) -> String {
    response
        .parsed_body
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .unwrap_or(DEFAULT_MESSAGE)
        .to_string()
}

fn error_and_description(response: &RawResponse) -> String {
    format!(
        "{}: {}",
        response.top_level_str("error").unwrap_or_default(),
        response.top_level_str("error_description").unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: Value) -> RawResponse {
        RawResponse::new(status, serde_json::to_vec(&body).unwrap(), "api.example.com")
    }

    fn failure(outcome: Outcome) -> ApiFailure {
        match outcome {
            Outcome::Failure(f) => f,
            Outcome::Success(body) => panic!("expected failure, got success: {body}"),
        }
    }

    // ── Rule 1: ServerError ──────────────────────────────────────────

    #[test]
    fn server_error_extracts_nested_message_and_keeps_body() {
        let body = json!({
            "confirmMessage": {
                "resourceMessages": [{
                    "processMessages": [{
                        "userMessage": { "messageTxt": "Backend unavailable" }
                    }]
                }]
            }
        });
        let f = failure(classify(&response(500, body.clone())));
        assert_eq!(f.kind, FailureKind::ServerError);
        assert_eq!(f.message, "Backend unavailable");
        assert_eq!(f.body, Some(body));
    }

    #[test]
    fn server_error_defaults_when_any_segment_is_missing() {
        for body in [
            json!({}),
            json!({"confirmMessage": {}}),
            json!({"confirmMessage": {"resourceMessages": []}}),
            json!({"confirmMessage": {"resourceMessages": [{"processMessages": [{}]}]}}),
            json!({"confirmMessage": {"resourceMessages": [{"processMessages": [
                {"userMessage": {"messageTxt": ""}}
            ]}]}}),
            Value::Null,
        ] {
            let f = failure(classify(&response(500, body.clone())));
            assert_eq!(f.kind, FailureKind::ServerError, "body: {body}");
            assert_eq!(f.message, DEFAULT_MESSAGE, "body: {body}");
        }
    }

    #[test]
    fn server_error_with_non_json_body_keeps_null() {
        let r = RawResponse::new(500, b"<html>oops</html>".to_vec(), "h");
        let f = failure(classify(&r));
        assert_eq!(f.kind, FailureKind::ServerError);
        assert_eq!(f.body, Some(Value::Null));
    }

    // ── Rule 2 vs rule 5: the two 400 cases ──────────────────────────

    #[test]
    fn invalid_request_formats_error_and_description() {
        let f = failure(classify(&response(
            400,
            json!({"error": "invalid_request", "error_description": "Missing grant_type"}),
        )));
        assert_eq!(f.kind, FailureKind::InvalidRequest);
        assert_eq!(f.message, "invalid_request: Missing grant_type");
        assert_eq!(f.body, None);
    }

    #[test]
    fn invalid_request_without_description_renders_empty() {
        let f = failure(classify(&response(400, json!({"error": "invalid_request"}))));
        assert_eq!(f.kind, FailureKind::InvalidRequest);
        assert_eq!(f.message, "invalid_request: ");
    }

    #[test]
    fn bad_request_when_error_field_absent() {
        let body = json!({"fieldErrors": [{"field": "name"}]});
        let f = failure(classify(&response(400, body.clone())));
        assert_eq!(f.kind, FailureKind::BadRequest);
        assert_eq!(f.message, BAD_REQUEST_MESSAGE);
        assert_eq!(f.body, Some(body));
    }

    #[test]
    fn bad_request_treats_null_error_and_non_object_bodies_as_absent() {
        for body in [json!({"error": null}), json!([1, 2]), Value::Null] {
            let f = failure(classify(&response(400, body.clone())));
            assert_eq!(f.kind, FailureKind::BadRequest, "body: {body}");
        }
    }

    #[test]
    fn bad_request_with_empty_body() {
        let r = RawResponse::new(400, Vec::new(), "h");
        assert_eq!(failure(classify(&r)).kind, FailureKind::BadRequest);
    }

    #[test]
    fn other_400_error_falls_through_to_unknown() {
        let r = RawResponse::new(400, br#"{"error":"unsupported_grant_type"}"#.to_vec(), "h");
        let f = failure(classify(&r));
        assert_eq!(f.kind, FailureKind::UnknownError);
        assert_eq!(f.message, r#"Code 400: {"error":"unsupported_grant_type"}"#);
    }

    // ── Rule 3: ResourceNotFound ─────────────────────────────────────

    #[test]
    fn not_found_extracts_process_message() {
        let f = failure(classify(&response(
            404,
            json!({"confirmMessage": {"processMessages": [
                {"userMessage": {"messageTxt": "Requested eventid not found"}}
            ]}}),
        )));
        assert_eq!(f.kind, FailureKind::ResourceNotFound);
        assert_eq!(f.message, "Requested eventid not found");
    }

    #[test]
    fn not_found_regardless_of_body_shape() {
        for body in [json!({}), json!([]), json!({"error": "invalid_request"}), Value::Null] {
            let f = failure(classify(&response(404, body.clone())));
            assert_eq!(f.kind, FailureKind::ResourceNotFound, "body: {body}");
            assert_eq!(f.message, DEFAULT_MESSAGE);
        }
    }

    // ── Rule 4: Unauthorized ─────────────────────────────────────────

    #[test]
    fn unauthorized_formats_error_and_description() {
        let f = failure(classify(&response(
            401,
            json!({"error": "invalid_client", "error_description": "Client authentication failed"}),
        )));
        assert_eq!(f.kind, FailureKind::Unauthorized);
        assert_eq!(f.message, "invalid_client: Client authentication failed");
    }

    #[test]
    fn unauthorized_with_empty_body() {
        let f = failure(classify(&RawResponse::new(401, Vec::new(), "h")));
        assert_eq!(f.kind, FailureKind::Unauthorized);
        assert_eq!(f.message, ": ");
    }

    // ── Rule 6 and success ───────────────────────────────────────────

    #[test]
    fn unknown_error_includes_status_and_raw_body() {
        let f = failure(classify(&RawResponse::new(503, b"Service Unavailable".to_vec(), "h")));
        assert_eq!(f.kind, FailureKind::UnknownError);
        assert_eq!(f.status, 503);
        assert_eq!(f.message, "Code 503: Service Unavailable");
    }

    #[test]
    fn redirects_and_informational_codes_are_not_success() {
        for status in [101, 302, 403, 409] {
            let f = failure(classify(&RawResponse::new(status, Vec::new(), "h")));
            assert_eq!(f.kind, FailureKind::UnknownError, "status {status}");
        }
    }

    #[test]
    fn success_returns_body_unchanged() {
        let body = json!({"confirmMessage": {"id": 7, "tags": ["a", "b"]}, "n": 1.5});
        for status in [200, 201, 204, 299] {
            assert_eq!(
                classify(&response(status, body.clone())),
                Outcome::Success(body.clone())
            );
        }
    }

    #[test]
    fn success_with_empty_body_is_null() {
        assert_eq!(
            classify(&RawResponse::new(204, Vec::new(), "h")),
            Outcome::Success(Value::Null)
        );
    }

    #[test]
    fn rules_are_in_documented_order() {
        let kinds: Vec<FailureKind> = RULES.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FailureKind::ServerError,
                FailureKind::InvalidRequest,
                FailureKind::ResourceNotFound,
                FailureKind::Unauthorized,
                FailureKind::BadRequest,
                FailureKind::UnknownError,
            ]
        );
    }

    #[test]
    fn into_result_maps_variants() {
        assert_eq!(
            classify(&response(200, json!({"ok": true}))).into_result(),
            Ok(json!({"ok": true}))
        );
        assert!(classify(&response(404, json!({}))).into_result().is_err());
    }
}
