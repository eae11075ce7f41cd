pub mod admin;
pub mod click;
pub mod cron;
pub mod deals;
pub mod health;

pub use admin::{AdminService, admin_routes};
pub use click::{ClickService, click_routes};
pub use cron::{CronService, cron_routes};
pub use deals::{DealService, deal_routes};
pub use health::{HealthService, health_routes};
