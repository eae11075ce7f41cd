//! Service layer for business logic
//!
//! Shared between the HTTP handlers and the CLI `run` command.

mod click_redirect;
mod connection_log;
mod deal_clicks;
pub mod jobs;
mod rate_limit;

pub use click_redirect::{ClickOutcome, ClickRedirectService};
pub use connection_log::ConnectionLogger;
pub use deal_clicks::{
    DealClickResponse, DealClickService, DealClickStats, click_rate, click_rate_label,
};
pub use jobs::{JobKind, JobOutcome, JobReport, JobRunner};
pub use rate_limit::{FixedWindowRateLimiter, RateDecision};
