//! The real scheduler commands and the shape of their output

mod kind;
mod runner;
#[cfg(test)]
pub(crate) mod testing;

pub use kind::{CommandKind, NotFound, Stream};
pub use runner::{locate, CommandOutput, Scheduler, SystemScheduler};
