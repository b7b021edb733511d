//! CLI command modules.

pub mod apis;
pub mod http;
pub mod status;
