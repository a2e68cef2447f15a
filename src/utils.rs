pub mod config;
pub mod errors;
pub mod greeting_pipeline;
pub mod greeting_types;
pub mod greeting_utils;
