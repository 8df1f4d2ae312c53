//! Configuration file and environment overrides

mod paths;
mod settings;

pub use paths::{current_user, Paths, CONFIG_ENV};
pub use settings::{
    CacheConfig, CommandsConfig, Config, LoggingConfig, DEFAULT_LIFETIME_SECS, SETTABLE_KEYS,
};
