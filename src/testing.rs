//! Test doubles shared by the aggregator tests.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use crate::command::CommandRunner;
use crate::error::{RaidError, Result};

pub const LDINFO: &str = include_str!("../testdata/megacli_ldinfo.txt");
pub const PDLIST: &str = include_str!("../testdata/megacli_pdlist.txt");
pub const MFI_VOLUMES: &str = include_str!("../testdata/mfiutil_volumes.txt");
pub const MFI_DRIVES: &str = include_str!("../testdata/mfiutil_drives.txt");

/// Answers queries from a table keyed by argument string; unknown
/// arguments fail as if the utility exited non-zero.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, args: &str, output: &str) -> Self {
        self.replies.insert(args.to_string(), output.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &Path, args: &str) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(args.to_string());
        }
        self.replies
            .get(args)
            .cloned()
            .ok_or_else(|| RaidError::Invocation {
                command: program.display().to_string(),
                args: args.to_string(),
                source: io::Error::new(io::ErrorKind::Other, "exited with exit status: 1"),
            })
    }
}
