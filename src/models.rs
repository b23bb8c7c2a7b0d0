use serde::{Deserialize, Serialize};

/// A user-displayable song name. No artist/id structure is assumed.
pub type SongTitle = String;

/// Request body for the recommend endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub songs: Vec<SongTitle>,
}

/// Error body returned by the API handlers (and by remote providers)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorBody {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        ErrorBody {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommend_request_wire_shape() {
        let request = RecommendRequest {
            songs: vec!["Song A".to_string(), "Song B".to_string()],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({ "songs": ["Song A", "Song B"] }));
    }

    #[test]
    fn test_error_body_omits_missing_details() {
        let json = serde_json::to_value(ErrorBody::new("Method not allowed")).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Method not allowed" }));

        let json = serde_json::to_value(ErrorBody::with_details("boom", "status 502")).unwrap();
        assert_eq!(json["details"], "status 502");
    }
}
