//! Canned git responses for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::runner::{CommandRunner, display_command};

#[derive(Debug, Clone)]
enum Response {
    Output(Vec<u8>),
    Failure { code: i32, stderr: String },
}

/// [`CommandRunner`] answering from a table keyed by `"command arg1 arg2"`.
#[derive(Debug, Default)]
pub struct MockRunner {
    responses: HashMap<String, Response>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, command: &str, output: impl Into<Vec<u8>>) -> Self {
        self.responses
            .insert(command.to_string(), Response::Output(output.into()));
        self
    }

    pub fn with_failure(mut self, command: &str, code: i32, stderr: &str) -> Self {
        self.responses.insert(
            command.to_string(),
            Response::Failure {
                code,
                stderr: stderr.to_string(),
            },
        );
        self
    }

    /// Shared log of every command run, to count invocations after the
    /// runner moved into a repository.
    pub fn calls(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.calls)
    }
}

impl CommandRunner for MockRunner {
    fn run_raw(&self, command: &str, args: &[&str]) -> Result<Vec<u8>> {
        let key = display_command(command, args);
        self.calls.borrow_mut().push(key.clone());
        match self.responses.get(&key) {
            Some(Response::Output(bytes)) => Ok(bytes.clone()),
            Some(Response::Failure { code, stderr }) => Err(Error::Process {
                command: key,
                exit_code: Some(*code),
                stdout: String::new(),
                stderr: stderr.clone(),
            }),
            None => Err(Error::Process {
                command: key.clone(),
                exit_code: Some(128),
                stdout: String::new(),
                stderr: format!("unexpected command: {key}"),
            }),
        }
    }
}

/// Count calls whose key starts with `prefix`.
pub fn count_calls(calls: &Rc<RefCell<Vec<String>>>, prefix: &str) -> usize {
    calls.borrow().iter().filter(|c| c.starts_with(prefix)).count()
}
