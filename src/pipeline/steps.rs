//! Pipeline steps — named pure transforms over the email record.
//!
//! A step takes the record by value and returns an updated copy. Steps
//! must not perform I/O and must leave every field unrelated to their
//! stated purpose unchanged. Handlers compose them left to right.

use crate::email::Email;

/// A named pure transformation `Email -> Email`.
#[derive(Debug, Clone, Copy)]
pub struct Step {
    name: &'static str,
    apply: fn(Email) -> Email,
}

impl Step {
    pub const fn new(name: &'static str, apply: fn(Email) -> Email) -> Self {
        Self { name, apply }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, email: Email) -> Email {
        (self.apply)(email)
    }
}

/// Classify the email by subject: a case-insensitive `"sale"` match
/// assigns `campaign_type = "promotion"`, anything else `"unclassified"`.
/// Pure function of `subject` only; idempotent.
pub fn assign_campaign_type(email: Email) -> Email {
    let campaign_type = if email.subject.to_lowercase().contains("sale") {
        "promotion"
    } else {
        "unclassified"
    };
    email.with_campaign_type(campaign_type)
}

pub const ASSIGN_CAMPAIGN_TYPE: Step = Step::new("assign_campaign_type", assign_campaign_type);

/// Step catalogue — every step a configuration file may reference.
const STEP_CATALOGUE: &[Step] = &[ASSIGN_CAMPAIGN_TYPE];

/// Resolve a configured step name against the catalogue.
///
/// Accepts either the bare step name or a dotted path whose final
/// segment matches (legacy configs qualify step names by module).
pub fn step_by_name(name: &str) -> Option<&'static Step> {
    let bare = name.rsplit('.').next().unwrap_or(name);
    STEP_CATALOGUE.iter().find(|step| step.name == bare)
}
