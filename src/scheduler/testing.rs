//! Scripted scheduler for unit tests

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use super::{CommandKind, CommandOutput, Scheduler};
use crate::error::Result;

/// Answers full listings from a queue of canned outputs
///
/// Each `list_all` pops the next `(exit code, stdout)` pair; once the queue is
/// down to one entry that entry is repeated.
#[derive(Default)]
pub(crate) struct FakeScheduler {
    listings: RefCell<VecDeque<(i32, String)>>,
    write_delay: Option<Duration>,
    pub calls: Cell<usize>,
    pub extra_args_seen: RefCell<Vec<Vec<String>>>,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a listing
    pub fn listing(self, exit_code: i32, stdout: &str) -> Self {
        self.listings
            .borrow_mut()
            .push_back((exit_code, stdout.to_string()));
        self
    }

    /// Pause half way through writing each listing
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    fn next_listing(&self) -> (i32, String) {
        let mut listings = self.listings.borrow_mut();
        if listings.len() > 1 {
            listings.pop_front().unwrap_or_default()
        } else {
            listings.front().cloned().unwrap_or((1, String::new()))
        }
    }
}

impl Scheduler for FakeScheduler {
    fn program(&self, kind: CommandKind) -> Result<PathBuf> {
        Ok(PathBuf::from("/fake").join(kind.program_name()))
    }

    fn list_all(&self, _kind: CommandKind, extra_args: &[String], mut sink: File) -> Result<i32> {
        self.calls.set(self.calls.get() + 1);
        self.extra_args_seen.borrow_mut().push(extra_args.to_vec());

        let (code, text) = self.next_listing();
        match self.write_delay {
            Some(delay) => {
                let (head, tail) = text.split_at(text.len() / 2);
                sink.write_all(head.as_bytes())?;
                sink.flush()?;
                thread::sleep(delay);
                sink.write_all(tail.as_bytes())?;
            }
            None => sink.write_all(text.as_bytes())?,
        }
        Ok(code)
    }

    fn capture(&self, _kind: CommandKind, _args: &[OsString]) -> Result<CommandOutput> {
        self.calls.set(self.calls.get() + 1);
        let (code, text) = self.next_listing();
        Ok(CommandOutput {
            stdout: text.into_bytes(),
            stderr: Vec::new(),
            exit_code: code,
        })
    }
}
