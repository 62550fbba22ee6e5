//! SNS notification envelope.
//!
//! Only `Records[0].Sns.Message` is read. Other fields and any additional
//! records are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExtractError;

/// Notification delivered by the SNS transport.
///
/// Records stay as raw JSON until read, so a malformed record after the
/// first never fails extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Delivered records, in order
    #[serde(rename = "Records")]
    pub records: Vec<Value>,
}

/// A single delivered record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// SNS notification body
    #[serde(rename = "Sns")]
    pub sns: SnsNotification,
}

/// The SNS part of a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnsNotification {
    /// Application message published to the topic
    #[serde(rename = "Message")]
    pub message: String,
}

impl Envelope {
    /// Decode the first record.
    pub fn first_record(&self) -> Result<Record, ExtractError> {
        let first = self.records.first().ok_or(ExtractError::NoRecords)?;
        Ok(Record::deserialize(first)?)
    }
}

/// Pull the application message out of a raw envelope.
pub fn extract_message(event: &Value) -> Result<String, ExtractError> {
    let envelope = Envelope::deserialize(event)?;
    Ok(envelope.first_record()?.sns.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_first_message() {
        let event = json!({"Records": [{"Sns": {"Message": "disk full"}}]});
        assert_eq!(extract_message(&event).unwrap(), "disk full");
    }

    #[test]
    fn test_ignores_extra_records_and_fields() {
        let event = json!({
            "Records": [
                {
                    "EventSource": "aws:sns",
                    "Sns": {"Message": "first", "Subject": "alarm", "Type": "Notification"}
                },
                {"Sns": {"Message": "second"}}
            ]
        });
        assert_eq!(extract_message(&event).unwrap(), "first");
    }

    #[test]
    fn test_malformed_later_records_are_ignored() {
        let event = json!({
            "Records": [
                {"Sns": {"Message": "first"}},
                {"EventSource": "aws:sqs", "body": "not sns"}
            ]
        });
        assert_eq!(extract_message(&event).unwrap(), "first");

        let event = json!({
            "Records": [
                {"Sns": {"Message": "first"}},
                {"Sns": {"Message": null}},
                "not even an object"
            ]
        });
        assert_eq!(extract_message(&event).unwrap(), "first");
    }

    #[test]
    fn test_malformed_first_record_fails() {
        let event = json!({
            "Records": [
                {"Sns": {"Message": null}},
                {"Sns": {"Message": "second"}}
            ]
        });
        assert!(matches!(
            extract_message(&event),
            Err(ExtractError::Malformed(_))
        ));
    }

    #[test]
    fn test_message_is_returned_verbatim() {
        let raw = "{\"AlarmName\":\"cpu-high\",\"NewStateValue\":\"ALARM\"}";
        let event = json!({"Records": [{"Sns": {"Message": raw}}]});
        assert_eq!(extract_message(&event).unwrap(), raw);
    }

    #[test]
    fn test_empty_records_fails() {
        let event = json!({"Records": []});
        assert!(matches!(
            extract_message(&event),
            Err(ExtractError::NoRecords)
        ));
    }

    #[test]
    fn test_missing_records_fails() {
        let event = json!({"detail": "not sns"});
        assert!(matches!(
            extract_message(&event),
            Err(ExtractError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_message_fails() {
        let event = json!({"Records": [{"Sns": {"Subject": "no body"}}]});
        assert!(matches!(
            extract_message(&event),
            Err(ExtractError::Malformed(_))
        ));
    }

    #[test]
    fn test_non_string_message_fails() {
        let event = json!({"Records": [{"Sns": {"Message": 42}}]});
        assert!(extract_message(&event).is_err());
    }
}
