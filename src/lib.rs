pub mod apis;
pub mod config;
pub mod constants;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod logging;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod session;
pub mod types;
