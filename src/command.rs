//! Controller utility invocation.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{RaidError, Result};

/// Runs the controller utility and returns its standard output.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` split on single spaces.
    ///
    /// Arguments containing spaces cannot be expressed.
    fn run(&self, program: &Path, args: &str) -> Result<String>;
}

/// Split an argument string on single spaces; an empty string yields no arguments.
pub fn split_args(args: &str) -> Vec<&str> {
    if args.is_empty() {
        Vec::new()
    } else {
        args.split(' ').collect()
    }
}

/// Blocking runner backed by `std::process::Command`.
///
/// There is no timeout: a hung utility blocks the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &str) -> Result<String> {
        log::debug!("running {} {}", program.display(), args);

        let outcome = Command::new(program)
            .args(split_args(args))
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .and_then(|out| {
                if out.status.success() {
                    Ok(out.stdout)
                } else {
                    Err(io::Error::new(
                        io::ErrorKind::Other,
                        format!("exited with {}", out.status),
                    ))
                }
            });

        match outcome {
            Ok(stdout) => Ok(String::from_utf8_lossy(&stdout).into_owned()),
            Err(source) => {
                log::error!(
                    "The command failed to perform: {} (Command: {}, Arguments: {})",
                    source,
                    program.display(),
                    args
                );
                Err(RaidError::Invocation {
                    command: program.display().to_string(),
                    args: args.to_string(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("-pdlist -a0"), vec!["-pdlist", "-a0"]);
        assert_eq!(split_args("-u 0 show volumes"), vec!["-u", "0", "show", "volumes"]);
        assert!(split_args("").is_empty());
        // No quoting: repeated spaces produce empty arguments.
        assert_eq!(split_args("a  b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_missing_program_is_invocation_error() {
        let err = SystemRunner
            .run(Path::new("/nonexistent/raid/MegaCli64"), "-pdlist -a0")
            .unwrap_err();
        match err {
            RaidError::Invocation { command, args, .. } => {
                assert_eq!(command, "/nonexistent/raid/MegaCli64");
                assert_eq!(args, "-pdlist -a0");
            }
            other => panic!("Expected Invocation, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout() {
        let out = SystemRunner.run(Path::new("echo"), "Exit Code: 0x00").unwrap();
        assert_eq!(out, "Exit Code: 0x00\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_invocation_error() {
        let err = SystemRunner.run(Path::new("false"), "").unwrap_err();
        assert!(matches!(err, RaidError::Invocation { .. }));
    }
}
