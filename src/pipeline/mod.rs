//! Per-sender email processing pipeline: steps and handlers.

pub mod handler;
pub mod steps;

pub use handler::{BaseHandler, CampaignClassifierHandler, Handler, HandlerKind};
pub use steps::{ASSIGN_CAMPAIGN_TYPE, Step, step_by_name};
