mod r#impl;
mod structs;

pub use r#impl::{get_config, init_config, replace_config};
pub use structs::*;
