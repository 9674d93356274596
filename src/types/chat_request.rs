use serde::{Deserialize, Serialize};

/// Request body for the backend's `POST /chat` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// Opaque identifier of the session the message belongs to.
    pub session_id: String,

    /// The user's message text.
    pub message: String,
}

impl ChatRequest {
    /// Create a new `ChatRequest`.
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_snake_case_fields() {
        let req = ChatRequest::new("42", "what is AAPL doing");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["session_id"], "42");
        assert_eq!(json["message"], "what is AAPL doing");
    }
}
