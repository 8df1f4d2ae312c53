mod cache;
mod common;
mod config;
mod watch;

pub use self::cache::cache;
pub use self::config::config;
pub use self::watch::watch;
