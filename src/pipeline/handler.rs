//! Handlers — what happens to a validated email for a given sender class.
//!
//! A handler is an ordered step list plus a terminal storage action.
//! Variants differ only by their step list. Persistence is best effort:
//! a store failure is logged with full context and swallowed, so the
//! webhook response never fails merely because the store was unreachable.

use async_trait::async_trait;
use tracing::{error, info};

use crate::email::Email;
use crate::pipeline::steps::{ASSIGN_CAMPAIGN_TYPE, Step};
use crate::store::EmailStore;

/// A sender-class email processor.
///
/// `handle` threads the record through `steps()` in order, persists the
/// final record, and returns it. Handlers are cheap and stateless, built
/// per use from a [`HandlerKind`].
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handler type name, used in logs and the response body.
    fn name(&self) -> &'static str;

    /// The ordered step list. Fixed per variant.
    fn steps(&self) -> &[Step];

    async fn handle(&self, email: Email, store: &dyn EmailStore, collection: &str) -> Email {
        info!(
            handler = self.name(),
            sender = %email.sender,
            "Processing email"
        );

        let mut email = email;
        for step in self.steps() {
            email = step.apply(email);
        }

        // Best-effort persistence: log and continue on failure.
        match store.store(collection, &email.to_record()).await {
            Ok(()) => info!(
                handler = self.name(),
                subject = %email.subject,
                collection,
                "Stored email"
            ),
            Err(e) => error!(
                handler = self.name(),
                subject = %email.subject,
                collection,
                error = %e,
                "Failed to store email"
            ),
        }

        email
    }
}

/// Default handler: no steps, identity transform before storage.
#[derive(Debug, Default)]
pub struct BaseHandler;

#[async_trait]
impl Handler for BaseHandler {
    fn name(&self) -> &'static str {
        "BaseHandler"
    }

    fn steps(&self) -> &[Step] {
        &[]
    }
}

/// Classifies emails into campaign types before storage.
#[derive(Debug, Default)]
pub struct CampaignClassifierHandler;

#[async_trait]
impl Handler for CampaignClassifierHandler {
    fn name(&self) -> &'static str {
        "CampaignClassifierHandler"
    }

    fn steps(&self) -> &[Step] {
        const STEPS: &[Step] = &[ASSIGN_CAMPAIGN_TYPE];
        STEPS
    }
}

/// Discriminator stored per sender in the registry.
///
/// The registry holds kinds rather than live instances; `build` produces
/// a fresh handler per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Base,
    CampaignClassifier,
}

impl HandlerKind {
    /// The fixed handler catalogue: configuration names resolve here.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "BaseHandler" => Some(Self::Base),
            "CampaignClassifierHandler" => Some(Self::CampaignClassifier),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Base => "BaseHandler",
            Self::CampaignClassifier => "CampaignClassifierHandler",
        }
    }

    pub fn build(self) -> Box<dyn Handler> {
        match self {
            Self::Base => Box::new(BaseHandler),
            Self::CampaignClassifier => Box::new(CampaignClassifierHandler),
        }
    }
}
