pub mod audit;
pub mod cache;
pub mod cli;
pub mod config;
pub mod duration;
pub mod error;
pub mod exec;
pub mod notify;
pub mod query;
pub mod scheduler;
pub mod watch;
