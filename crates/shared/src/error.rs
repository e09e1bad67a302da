use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the risk API on non-2xx responses.
///
/// `detail` is usually a string (`"occupation not found"`) but validation
/// failures carry a list of objects, so it stays untyped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl ApiErrorBody {
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort key '{0}', expected 'ai' or 'employment'")]
pub struct ParseSortKeyError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_is_used_verbatim() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"detail":"occupation not found"}"#).expect("decode");
        assert_eq!(body.message().as_deref(), Some("occupation not found"));
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"detail":[{"loc":["query","page"]}]}"#).expect("decode");
        let message = body.message().expect("message");
        assert!(message.contains("page"));
    }

    #[test]
    fn missing_detail_has_no_message() {
        let body: ApiErrorBody = serde_json::from_str("{}").expect("decode");
        assert!(body.message().is_none());
    }
}
