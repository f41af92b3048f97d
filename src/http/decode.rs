use serde_json::{Map, Value};

use crate::error::{InstagramError, InstagramResult, TransportError};

use super::HttpResponse;

/// Decoded JSON object returned by every successful API call.
pub type ApiPayload = Map<String, Value>;

/// Classifies a transport outcome. The order matters: Instagram can answer
/// HTTP 200 with an embedded `error` object.
pub fn decode_response(outcome: Result<HttpResponse, TransportError>) -> InstagramResult<ApiPayload> {
    let response = outcome?;

    if !response.status.is_success() {
        warn!("Instagram returned status {}", response.status);
        return Err(InstagramError::Http {
            status: response.status,
            body: response.body,
        });
    }

    let value: Value = serde_json::from_str(&response.body).map_err(|e| InstagramError::Decode(e.to_string()))?;

    let payload = match value {
        Value::Object(payload) => payload,
        other => {
            return Err(InstagramError::Decode(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    if let Some(error) = payload
        .get("error")
        .filter(|e| !matches!(e, Value::Null | Value::Bool(false)))
    {
        let mut message = format!("Instagram API Error: {}", describe_error(error));
        if let Some(description) = payload.get("error_description").and_then(|d| d.as_str()) {
            message.push_str(" - ");
            message.push_str(description);
        }
        warn!("{}", message);
        return Err(InstagramError::Api(message));
    }

    Ok(payload)
}

/// Graph API errors are objects with a `message`; OAuth errors are plain strings.
fn describe_error(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reads an id field that the API may send as a string or a number.
pub fn extract_id(payload: &ApiPayload, field: &str) -> InstagramResult<String> {
    match payload.get(field) {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(InstagramError::UnexpectedResponse(format!(
            "missing `{}` in response",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn ok(body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(StatusCode::OK, body))
    }

    #[test]
    fn test_transport_failure_is_transport_error() {
        let result = decode_response(Err(TransportError("dns failure".into())));

        assert!(matches!(result, Err(InstagramError::Transport(TransportError(msg))) if msg == "dns failure"));
    }

    #[test]
    fn test_non_success_status_is_http_error() {
        let body = r#"{"error": {"message": "Invalid OAuth access token"}}"#;
        let result = decode_response(Ok(HttpResponse::new(StatusCode::BAD_REQUEST, body)));

        match result {
            Err(InstagramError::Http { status, body: raw }) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(raw, body);
            }
            other => panic!("expected HTTP error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        assert!(matches!(decode_response(ok("{not json")), Err(InstagramError::Decode(_))));
        assert!(matches!(decode_response(ok("")), Err(InstagramError::Decode(_))));
        assert!(matches!(decode_response(ok("[1, 2]")), Err(InstagramError::Decode(_))));
    }

    #[test]
    fn test_embedded_error_in_200_is_api_error() {
        let result = decode_response(ok(r#"{"error": "x", "error_description": "y"}"#));

        match result {
            Err(InstagramError::Api(message)) => {
                assert_eq!(message, "Instagram API Error: x - y");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_graph_error_object_uses_message() {
        let result = decode_response(ok(r#"{"error": {"message": "Media ID is not available", "code": 9007}}"#));

        assert!(matches!(result, Err(InstagramError::Api(m)) if m == "Instagram API Error: Media ID is not available"));
    }

    #[test]
    fn test_success_payload() {
        let payload = decode_response(ok(r#"{"id": "17889455560051444", "error": null}"#)).unwrap();

        assert_eq!(extract_id(&payload, "id").unwrap(), "17889455560051444");
    }

    #[test]
    fn test_false_error_field_is_success() {
        let payload = decode_response(ok(r#"{"id": "1", "error": false}"#)).unwrap();
        assert_eq!(extract_id(&payload, "id").unwrap(), "1");

        assert!(matches!(
            decode_response(ok(r#"{"id": "1", "error": true}"#)),
            Err(InstagramError::Api(m)) if m == "Instagram API Error: true"
        ));
    }

    #[test]
    fn test_extract_id_accepts_numbers_and_rejects_missing() {
        let payload = decode_response(ok(r#"{"id": 42}"#)).unwrap();
        assert_eq!(extract_id(&payload, "id").unwrap(), "42");

        let payload = decode_response(ok(r#"{"name": "nope"}"#)).unwrap();
        assert!(matches!(
            extract_id(&payload, "id"),
            Err(InstagramError::UnexpectedResponse(_))
        ));
    }
}
