pub mod api;
pub mod config;
pub mod error;
mod main_lib;
pub mod rate_limit;

pub use main_lib::{build_state, build_state_with_http, init_tracing, AppState};
