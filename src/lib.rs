//! dealtracker - backend of a deals and coupons affiliate site
//!
//! Covers the outbound click redirect, per-deal click counters, the scheduled
//! sync jobs (price sync, campaign import, bot notifications) and the
//! connection log that records every outbound integration call.
//!
//! # Architecture
//! - `api`: HTTP routes and middleware (bearer auth, fixed-window rate limit)
//! - `services`: business logic shared by the HTTP API and the CLI
//! - `integrations`: affiliate network, marketplace and messaging clients
//! - `storage`: SeaORM storage backend
//! - `config`: static configuration (TOML + `DT__*` environment)
//! - `runtime`: startup, server and one-shot job modes
//! - `system`: logging

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod integrations;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
