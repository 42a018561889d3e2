use std::fmt;

use serde_json::Value;

/// A failed backend call, already reduced to the text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected before any request was made.
    Validation,
    InvalidUrl,
    HttpStatus(u16),
    Network,
    Timeout,
    /// The backend answered 2xx with a body that is not the expected JSON.
    Parse,
    /// Reading the local upload source failed.
    Io,
    Unexpected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Validation => write!(f, "validation error"),
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Parse => write!(f, "parse error"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Best-effort human message from a JSON error body.
///
/// Tries `detail` as a string, then `detail.message`/`detail.detail`, then
/// the messages of a validation error list, then the serialized `detail`,
/// then a top-level `message`, and finally `default`.
pub fn error_detail(body: &Value, default: &str) -> String {
    match body.get("detail") {
        Some(Value::String(detail)) if !detail.trim().is_empty() => detail.clone(),
        Some(Value::Object(detail)) => ["message", "detail"]
            .iter()
            .find_map(|key| non_empty_str(detail.get(*key)))
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| Value::Object(detail.clone()).to_string()),
        Some(Value::Array(entries)) if !entries.is_empty() => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|entry| non_empty_str(entry.get("msg")))
                .collect();
            if messages.len() == entries.len() {
                messages.join("; ")
            } else {
                Value::Array(entries.clone()).to_string()
            }
        }
        _ => non_empty_str(body.get("message"))
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| default.to_string()),
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error, network_message: &str) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, "Request timed out");
    }
    ApiError::new(FailureKind::Network, format!("{network_message}: {err}"))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::error_detail;

    #[test]
    fn detail_string_wins() {
        let body = json!({"detail": "Question too long", "message": "ignored"});
        assert_eq!(error_detail(&body, "default"), "Question too long");
    }

    #[test]
    fn nested_detail_object_uses_message_then_detail_then_json() {
        assert_eq!(
            error_detail(&json!({"detail": {"message": "Index missing"}}), "d"),
            "Index missing"
        );
        assert_eq!(
            error_detail(&json!({"detail": {"detail": "Inner"}}), "d"),
            "Inner"
        );
        assert_eq!(
            error_detail(&json!({"detail": {"code": 7}}), "d"),
            r#"{"code":7}"#
        );
    }

    #[test]
    fn validation_lists_join_messages() {
        let body = json!({"detail": [
            {"loc": ["body", "question"], "msg": "field required"},
            {"loc": ["body", "file"], "msg": "too large"}
        ]});
        assert_eq!(error_detail(&body, "d"), "field required; too large");
    }

    #[test]
    fn falls_back_to_message_then_default() {
        assert_eq!(error_detail(&json!({"message": "Busy"}), "d"), "Busy");
        assert_eq!(error_detail(&json!({}), "Failed to send message"), "Failed to send message");
        assert_eq!(error_detail(&json!({"detail": ""}), "fallback"), "fallback");
        assert_eq!(error_detail(&json!("plain"), "fallback"), "fallback");
    }
}
