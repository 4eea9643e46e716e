//! Demo driver: configuration plus a scripted shopping session.

pub mod config;
pub mod script;

pub use config::DemoConfig;
pub use script::run;
