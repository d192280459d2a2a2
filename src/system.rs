pub mod build_config;
pub mod config;
pub mod locale;
pub mod logging;
pub mod versioning;
