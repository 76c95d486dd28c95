//! Scripted command runner for testing the `lctl` source.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::collector::traits::{CommandError, CommandRunner};

#[derive(Debug, Clone)]
enum Reply {
    Output(String),
    Fail { code: i32, stderr: String },
}

/// Command runner that answers from a table of canned replies.
///
/// Each invocation is recorded as `program arg1 arg2 ...`.
#[derive(Debug, Default)]
pub struct MockCommands {
    replies: HashMap<String, Reply>,
    missing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl Clone for MockCommands {
    fn clone(&self) -> Self {
        Self {
            replies: self.replies.clone(),
            missing: self.missing.clone(),
            calls: Mutex::new(self.calls()),
        }
    }
}

fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

impl MockCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers stdout for an exact command line.
    pub fn on(mut self, program: &str, args: &[&str], stdout: impl Into<String>) -> Self {
        self.replies
            .insert(command_line(program, args), Reply::Output(stdout.into()));
        self
    }

    /// Registers a non-zero exit for an exact command line.
    pub fn fail(mut self, program: &str, args: &[&str], code: i32, stderr: &str) -> Self {
        self.replies.insert(
            command_line(program, args),
            Reply::Fail {
                code,
                stderr: stderr.to_string(),
            },
        );
        self
    }

    /// Marks a program as not installed.
    pub fn without(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    /// Command lines run so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl CommandRunner for MockCommands {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, CommandError> {
        let line = command_line(program, args);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }

        match self.replies.get(&line) {
            Some(Reply::Output(stdout)) => Ok(stdout.clone()),
            Some(Reply::Fail { code, stderr }) => Err(CommandError::Status {
                code: Some(*code),
                stderr: stderr.clone(),
            }),
            None => Err(CommandError::Spawn(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no scripted reply for '{}'", line),
            ))),
        }
    }

    fn is_available(&self, program: &str) -> bool {
        !self.missing.iter().any(|missing| missing == program)
    }
}
