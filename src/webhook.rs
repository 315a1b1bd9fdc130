use ahash::AHashMap;
use axum::http::HeaderMap;
use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Local wall-clock time, second resolution.
pub type Timestamp = NaiveDateTime;

/// Header name (lowercase) to every value received under that name.
pub type Headers = AHashMap<String, Vec<String>>;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const UNKNOWN_ALERT_NAME: &str = "Unknown Alert";
const UNKNOWN_ALERT_TYPE: &str = "unknown";

/// Errors that can occur while turning an inbound request into a record.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Header '{0}' has a value that is not valid UTF-8")]
    HeaderEncoding(String),
}

/// A single received webhook.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WebhookRecord {
    #[serde(with = "timestamp_format")]
    pub received_at: Timestamp,
    pub payload: Value,
    pub headers: Headers,
}

impl WebhookRecord {
    /// Builds a record stamped with the current time.
    ///
    /// Fails without side effects if any header cannot be represented as text.
    pub fn from_request(headers: &HeaderMap, payload: Value) -> Result<Self, RecordError> {
        Ok(Self {
            received_at: now(),
            payload,
            headers: capture_headers(headers)?,
        })
    }

    /// Values received for `name`, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&[String]> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    pub fn alert(&self) -> AlertSummary {
        AlertSummary::from_payload(&self.payload)
    }
}

/// Display name and type of the alert carried by a payload, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSummary {
    pub name: String,
    pub alert_type: String,
}

impl AlertSummary {
    /// Reads `alert.name` and `alert.type`, falling back to placeholders when
    /// the payload has no such fields (or is not an object at all).
    pub fn from_payload(payload: &Value) -> Self {
        let alert = payload.get("alert");
        let field = |key: &str, fallback: &str| {
            match alert.and_then(|alert| alert.get(key)) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => fallback.to_string(),
                Some(other) => other.to_string(),
            }
        };
        Self {
            name: field("name", UNKNOWN_ALERT_NAME),
            alert_type: field("type", UNKNOWN_ALERT_TYPE),
        }
    }
}

/// Current local time truncated to whole seconds.
pub fn now() -> Timestamp {
    Local::now().naive_local().trunc_subsecs(0)
}

pub fn format_timestamp(timestamp: &Timestamp) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn capture_headers(headers: &HeaderMap) -> Result<Headers, RecordError> {
    let mut captured = Headers::new();
    for (name, value) in headers {
        let value = match value.to_str() {
            Ok(value) => value.to_string(),
            // Non-ASCII but still UTF-8 values are kept.
            Err(_) => String::from_utf8(value.as_bytes().to_vec())
                .map_err(|_| RecordError::HeaderEncoding(name.to_string()))?,
        };
        captured
            .entry(name.as_str().to_string())
            .or_default()
            .push(value);
    }
    Ok(captured)
}

/// Serializes timestamps as `YYYY-MM-DD HH:MM:SS`.
pub mod timestamp_format {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::{TIMESTAMP_FORMAT, Timestamp, format_timestamp};

    pub fn serialize<S: Serializer>(timestamp: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(timestamp))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(D::Error::custom)
    }

    pub mod option {
        use serde::Serializer;

        use super::super::{Timestamp, format_timestamp};

        pub fn serialize<S: Serializer>(
            timestamp: &Option<Timestamp>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match timestamp {
                Some(timestamp) => serializer.serialize_some(&format_timestamp(timestamp)),
                None => serializer.serialize_none(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    #[test]
    fn test_alert_summary() {
        let payload = serde_json::json!({"alert": {"name": "High CPU", "type": "threshold"}});
        assert_eq!(
            AlertSummary::from_payload(&payload),
            AlertSummary {
                name: "High CPU".to_string(),
                alert_type: "threshold".to_string(),
            }
        );

        let payload = serde_json::json!({"alert": {"name": 42}});
        let summary = AlertSummary::from_payload(&payload);
        assert_eq!(summary.name, "42");
        assert_eq!(summary.alert_type, "unknown");

        for payload in [
            serde_json::json!({"event": "push"}),
            serde_json::json!([1, 2, 3]),
            serde_json::json!("alert"),
        ] {
            let summary = AlertSummary::from_payload(&payload);
            assert_eq!(summary.name, "Unknown Alert");
            assert_eq!(summary.alert_type, "unknown");
        }
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.append("x-tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));

        let record = WebhookRecord::from_request(&headers, serde_json::json!({})).unwrap();
        assert_eq!(
            record.header("Content-Type"),
            Some(&["application/json".to_string()][..])
        );
        assert_eq!(
            record.header("X-TAG"),
            Some(&["a".to_string(), "b".to_string()][..])
        );
        assert_eq!(record.header("x-missing"), None);
    }

    #[test]
    fn test_header_encoding_error() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-binary"),
            HeaderValue::from_bytes(&[0x66, 0xff, 0x6f]).unwrap(),
        );
        let err = WebhookRecord::from_request(&headers, serde_json::json!({"a": 1})).unwrap_err();
        assert!(matches!(err, RecordError::HeaderEncoding(name) if name == "x-binary"));
    }

    #[test]
    fn test_timestamp_serialization() {
        let record = WebhookRecord {
            received_at: Timestamp::parse_from_str("2024-03-01 12:30:45", TIMESTAMP_FORMAT)
                .unwrap(),
            payload: serde_json::json!({"k": "v"}),
            headers: Headers::new(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["received_at"], "2024-03-01 12:30:45");
        assert_eq!(serde_json::from_value::<WebhookRecord>(json).unwrap(), record);
    }
}
