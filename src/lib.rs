pub mod collector;
pub mod config;
pub mod github;
pub mod logging;
pub mod metrics;
pub mod run;
pub mod server;
