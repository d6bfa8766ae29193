//! Canonical email record: flattening and validation of the inbound payload.
//!
//! The webhook body arrives as a nested JSON object (`envelope`, `headers`,
//! `plain`, `html`). Normalization is two staged:
//!
//! 1. `flatten_payload` — pull nested fields into a flat shape. Tolerates
//!    missing fields (they become `None`) and only fails on a non-object
//!    payload.
//! 2. `from_flat` — enforce required fields, address syntax, and the date
//!    format. Field errors are aggregated, never short-circuited.
//!
//! `from_payload` composes the two and is what the request path calls.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde_json::{Value, json};

use crate::error::{FieldError, ValidationError};

/// Source format of the `headers.date` field, e.g.
/// `"Mon, 16 Jan 2012 17:00:01 +0000"`.
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// local-part@domain, at least one dot in the domain, no whitespace.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// The canonical validated email record.
///
/// Logically immutable: pipeline steps take it by value and return an
/// updated copy, so no step ever mutates state visible outside itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub date: DateTime<FixedOffset>,
    pub plain: Option<String>,
    pub html: Option<String>,
    /// Assigned by pipeline steps; `None` until a step sets it.
    pub campaign_type: Option<String>,
}

/// Output of the flatten stage. All fields optional — enforcement
/// happens in validation, not here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatPayload {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub date: Option<String>,
    pub plain: Option<String>,
    pub html: Option<String>,
}

impl Email {
    /// Flatten the nested webhook payload into the canonical flat shape.
    ///
    /// Missing fields become `None`; the only failure mode is a payload
    /// that is not a JSON object.
    pub fn flatten_payload(payload: &Value) -> Result<FlatPayload, ValidationError> {
        let Some(map) = payload.as_object() else {
            return Err(ValidationError::single("payload", "input must be a mapping"));
        };

        let envelope = map.get("envelope").and_then(Value::as_object);
        let headers = map.get("headers").and_then(Value::as_object);

        let pick = |obj: Option<&serde_json::Map<String, Value>>, key: &str| {
            obj.and_then(|o| o.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Ok(FlatPayload {
            sender: pick(envelope, "from"),
            recipient: pick(envelope, "to"),
            subject: pick(headers, "subject"),
            date: pick(headers, "date"),
            plain: map.get("plain").and_then(Value::as_str).map(str::to_string),
            html: map.get("html").and_then(Value::as_str).map(str::to_string),
        })
    }

    /// Validate a flat payload into an `Email`.
    ///
    /// `sender`, `recipient`, `subject`, and `date` are required; `plain`
    /// and `html` are not. Every violated field produces its own
    /// `FieldError` so the caller gets a complete diagnostic.
    pub fn from_flat(flat: FlatPayload) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();

        let sender = require_address(&mut errors, "sender", flat.sender);
        let recipient = require_address(&mut errors, "recipient", flat.recipient);

        let subject = match flat.subject {
            Some(s) if !s.is_empty() => Some(s),
            _ => {
                errors.push(FieldError::new("subject", "field required"));
                None
            }
        };

        let date = match flat.date {
            Some(raw) if !raw.is_empty() => {
                match DateTime::parse_from_str(&raw, DATE_FORMAT) {
                    Ok(parsed) => Some(parsed),
                    Err(_) => {
                        errors.push(FieldError::new(
                            "date",
                            format!("invalid date format: '{raw}'"),
                        ));
                        None
                    }
                }
            }
            _ => {
                errors.push(FieldError::new("date", "field required"));
                None
            }
        };

        match (sender, recipient, subject, date) {
            (Some(sender), Some(recipient), Some(subject), Some(date)) if errors.is_empty() => {
                Ok(Self {
                    sender,
                    recipient,
                    subject,
                    date,
                    plain: flat.plain,
                    html: flat.html,
                    campaign_type: None,
                })
            }
            _ => Err(ValidationError::new(errors)),
        }
    }

    /// Flatten and validate an inbound payload in one call.
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationError> {
        Self::from_flat(Self::flatten_payload(payload)?)
    }

    /// The flat key-value record handed to storage and echoed in the
    /// HTTP response. `date` is rendered RFC 2822.
    pub fn to_record(&self) -> Value {
        json!({
            "sender": self.sender,
            "recipient": self.recipient,
            "subject": self.subject,
            "date": self.date.to_rfc2822(),
            "plain": self.plain,
            "html": self.html,
            "campaign_type": self.campaign_type,
        })
    }

    /// Copy-on-write update of `campaign_type`.
    pub fn with_campaign_type(self, campaign_type: impl Into<String>) -> Self {
        Self {
            campaign_type: Some(campaign_type.into()),
            ..self
        }
    }
}

/// Whether a string is a syntactically valid email address.
pub fn is_valid_address(addr: &str) -> bool {
    EMAIL_RE.is_match(addr)
}

fn require_address(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: Option<String>,
) -> Option<String> {
    match value {
        Some(addr) if addr.is_empty() => {
            errors.push(FieldError::new(field, "field required"));
            None
        }
        Some(addr) if !is_valid_address(&addr) => {
            errors.push(FieldError::new(
                field,
                format!("'{addr}' is not a valid email address"),
            ));
            None
        }
        Some(addr) => Some(addr),
        None => {
            errors.push(FieldError::new(field, "field required"));
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{valid_email, valid_nested_payload};
    use super::*;

    // ── Flatten stage ───────────────────────────────────────────────

    #[test]
    fn flatten_transforms_nested_payload() {
        let flat = Email::flatten_payload(&valid_nested_payload()).unwrap();
        assert_eq!(flat.sender.as_deref(), Some("sender@example.com"));
        assert_eq!(flat.recipient.as_deref(), Some("recipient@example.com"));
        assert_eq!(flat.subject.as_deref(), Some("Test Subject"));
        assert_eq!(flat.date.as_deref(), Some("Mon, 16 Jan 2012 17:00:01 +0000"));
        assert_eq!(flat.plain.as_deref(), Some("Test Plain Body."));
        assert!(flat.html.as_deref().unwrap().contains("HTML"));
    }

    #[test]
    fn flatten_missing_fields_become_none() {
        let mut payload = valid_nested_payload();
        payload["envelope"].as_object_mut().unwrap().remove("to");
        payload["headers"].as_object_mut().unwrap().remove("date");
        payload.as_object_mut().unwrap().remove("plain");

        let flat = Email::flatten_payload(&payload).unwrap();
        assert!(flat.recipient.is_none());
        assert!(flat.date.is_none());
        assert!(flat.plain.is_none());
        // Untouched fields still come through
        assert_eq!(flat.sender.as_deref(), Some("sender@example.com"));
    }

    #[test]
    fn flatten_missing_envelope_entirely() {
        let flat = Email::flatten_payload(&json!({"headers": {"subject": "x"}})).unwrap();
        assert!(flat.sender.is_none());
        assert!(flat.recipient.is_none());
        assert_eq!(flat.subject.as_deref(), Some("x"));
    }

    #[test]
    fn flatten_rejects_non_mapping_input() {
        let err = Email::flatten_payload(&json!(["invalid", "structure"])).unwrap_err();
        assert_eq!(err.errors[0].msg, "input must be a mapping");
    }

    // ── Validation stage ────────────────────────────────────────────

    #[test]
    fn from_payload_builds_valid_email() {
        let email = valid_email();
        assert_eq!(email.sender, "sender@example.com");
        assert_eq!(email.recipient, "recipient@example.com");
        assert_eq!(email.subject, "Test Subject");
        assert_eq!(
            email.date,
            DateTime::parse_from_str("Mon, 16 Jan 2012 17:00:01 +0000", DATE_FORMAT).unwrap()
        );
        assert_eq!(email.plain.as_deref(), Some("Test Plain Body."));
        assert!(email.campaign_type.is_none());
    }

    #[test]
    fn missing_required_field_reports_that_field() {
        for (remove_from, key, field) in [
            ("envelope", "from", "sender"),
            ("envelope", "to", "recipient"),
            ("headers", "subject", "subject"),
            ("headers", "date", "date"),
        ] {
            let mut payload = valid_nested_payload();
            payload[remove_from].as_object_mut().unwrap().remove(key);
            let err = Email::from_payload(&payload).unwrap_err();
            assert!(err.references(field), "expected error for {field}");
            assert_eq!(err.errors.len(), 1);
        }
    }

    #[test]
    fn plain_and_html_are_optional() {
        let mut payload = valid_nested_payload();
        payload.as_object_mut().unwrap().remove("plain");
        payload.as_object_mut().unwrap().remove("html");
        let email = Email::from_payload(&payload).unwrap();
        assert!(email.plain.is_none());
        assert!(email.html.is_none());
    }

    #[test]
    fn empty_subject_fails_like_missing_subject() {
        let mut payload = valid_nested_payload();
        payload["headers"]["subject"] = json!("");
        let err = Email::from_payload(&payload).unwrap_err();
        assert!(err.references("subject"));
        assert_eq!(err.errors[0].msg, "field required");
    }

    #[test]
    fn invalid_sender_address_rejected() {
        let mut payload = valid_nested_payload();
        payload["envelope"]["from"] = json!("not-an-email");
        let err = Email::from_payload(&payload).unwrap_err();
        assert!(err.references("sender"));
        assert!(err.errors[0].msg.contains("not-an-email"));
    }

    #[test]
    fn invalid_date_error_names_offending_string() {
        let mut payload = valid_nested_payload();
        payload["headers"]["date"] = json!("Invalid Date");
        let err = Email::from_payload(&payload).unwrap_err();
        assert!(err.references("date"));
        assert!(err.errors[0].msg.contains("Invalid Date"));
    }

    #[test]
    fn multiple_invalid_fields_all_reported() {
        let mut payload = valid_nested_payload();
        payload["envelope"]["from"] = json!("bogus");
        payload["headers"].as_object_mut().unwrap().remove("subject");
        payload["headers"]["date"] = json!("nope");

        let err = Email::from_payload(&payload).unwrap_err();
        assert_eq!(err.errors.len(), 3);
        assert!(err.references("sender"));
        assert!(err.references("subject"));
        assert!(err.references("date"));
    }

    // ── Address syntax ──────────────────────────────────────────────

    #[test]
    fn address_syntax_rules() {
        assert!(is_valid_address("user@example.com"));
        assert!(is_valid_address("first.last@sub.example.co.uk"));
        assert!(!is_valid_address("not-an-email"));
        assert!(!is_valid_address("user@nodot"));
        assert!(!is_valid_address("user @example.com"));
        assert!(!is_valid_address("@example.com"));
        assert!(!is_valid_address(""));
    }

    // ── Record serialization ────────────────────────────────────────

    #[test]
    fn to_record_is_flat_with_rfc2822_date() {
        let record = valid_email().to_record();
        assert_eq!(record["sender"], "sender@example.com");
        assert_eq!(record["date"], "Mon, 16 Jan 2012 17:00:01 +0000");
        assert_eq!(record["campaign_type"], Value::Null);
    }

    #[test]
    fn with_campaign_type_leaves_other_fields_unchanged() {
        let email = valid_email();
        let updated = email.clone().with_campaign_type("promotion");
        assert_eq!(updated.campaign_type.as_deref(), Some("promotion"));
        assert_eq!(updated.sender, email.sender);
        assert_eq!(updated.subject, email.subject);
        assert_eq!(updated.date, email.date);
    }
}
