//! Request handlers for the `/api/songs` and `/api/recommendations` endpoints.
//!
//! They are independent of any HTTP framework: callers pass the method, the
//! `q` query parameter and the raw body, and get a status plus JSON body back.
//! Gateway failures are logged in full but answered with a generic message.

use serde_json::{Value, json};
use tracing::warn;

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::models::{ErrorBody, RecommendRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        ApiResponse { status: 200, body }
    }

    fn error(status: u16, body: ErrorBody) -> Self {
        ApiResponse {
            status,
            body: json!(body),
        }
    }

    fn method_not_allowed() -> Self {
        Self::error(405, ErrorBody::new("Method not allowed"))
    }

    fn from_gateway_error(context: &str, err: GatewayError) -> Self {
        if let GatewayError::Validation(reason) = &err {
            warn!("Rejecting request: {reason}");
            let body = ErrorBody::new(format!("Invalid request: {reason}"));
            return Self::error(err.http_status(), body);
        }
        err.log(context);
        Self::error(err.http_status(), ErrorBody::with_details(context, err.to_string()))
    }
}

/// `GET` searches, `POST` recommends.
pub async fn songs(
    gateway: &Gateway,
    method: &str,
    query: Option<&str>,
    body: Option<&str>,
) -> ApiResponse {
    match method.to_ascii_uppercase().as_str() {
        "GET" => {
            let query = query.unwrap_or("");
            match gateway.search(query).await {
                Ok(songs) => ApiResponse::ok(json!(songs)),
                Err(e) => ApiResponse::from_gateway_error("Error fetching suggestions", e),
            }
        }
        "POST" => recommend(gateway, body, "Error getting recommendations").await,
        _ => ApiResponse::method_not_allowed(),
    }
}

/// `POST` only.
pub async fn recommendations(gateway: &Gateway, method: &str, body: Option<&str>) -> ApiResponse {
    if !method.eq_ignore_ascii_case("POST") {
        return ApiResponse::method_not_allowed();
    }
    recommend(gateway, body, "Error fetching recommendations").await
}

async fn recommend(gateway: &Gateway, body: Option<&str>, context: &str) -> ApiResponse {
    let request: RecommendRequest = match serde_json::from_str(body.unwrap_or("")) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejecting recommendation request: {e}");
            return ApiResponse::error(
                400,
                ErrorBody::with_details("Request body must be {\"songs\": [...]}", e.to_string()),
            );
        }
    };

    match gateway.recommend(&request.songs).await {
        Ok(payload) => ApiResponse::ok(payload),
        Err(e) => ApiResponse::from_gateway_error(context, e),
    }
}
