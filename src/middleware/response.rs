use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

/// Success envelope: the payload's fields sit next to `"ok": true`.
///
/// Payloads must serialize to a JSON object; anything else is a server error.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
        }
    }

    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self {
            data,
            status_code: Some(status_code),
        }
    }

    /// Build the `{ "ok": true, ... }` body.
    pub fn envelope(&self) -> Result<Value, String> {
        match serde_json::to_value(&self.data) {
            Ok(Value::Object(mut fields)) => {
                fields.insert("ok".to_string(), Value::Bool(true));
                Ok(Value::Object(fields))
            }
            Ok(other) => Err(format!("response payload is not an object: {}", other)),
            Err(e) => Err(e.to_string()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        match self.envelope() {
            Ok(body) => (status, Json(body)).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to serialize response data" })),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Tables {
        tables: Vec<&'static str>,
    }

    #[test]
    fn payload_fields_are_flattened() {
        let response = ApiResponse::success(Tables { tables: vec!["widgets"] });
        assert_eq!(
            response.envelope().unwrap(),
            json!({ "ok": true, "tables": ["widgets"] })
        );
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(ApiResponse::success(vec![1, 2]).envelope().is_err());
        let response = ApiResponse::success("plain").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
