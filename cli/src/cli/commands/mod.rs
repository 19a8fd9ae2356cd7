pub mod start;
pub mod status;
pub mod check_config;
