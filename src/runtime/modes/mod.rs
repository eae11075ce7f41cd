//! Execution modes
//!
//! - `server`: HTTP server (default)
//! - `job`: run one sync job from the command line and exit

pub mod job;
pub mod server;

pub use job::run_job;
pub use server::run_server;
