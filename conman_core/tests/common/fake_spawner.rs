//! A deterministic **in‑process stand‑in** for `conman_core::Spawner`.
//!
//! *  Every spawn request is recorded as `(program, args)` instead of
//!    starting a process, so tests can assert on exact argument vectors.
//! *  Programs listed in `missing` fail the way a binary absent from `PATH`
//!    would.

use std::cell::RefCell;
use std::io;

use conman_core::{ProcessHandle, Spawner};

#[derive(Default)]
pub struct FakeSpawner {
    pub calls: RefCell<Vec<(String, Vec<String>)>>,
    pub missing: Vec<String>,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A spawner on which `program` cannot be found.
    pub fn without(program: &str) -> Self {
        FakeSpawner {
            calls: RefCell::new(Vec::new()),
            missing: vec![program.to_string()],
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.borrow().clone()
    }
}

impl Spawner for FakeSpawner {
    fn spawn(&self, program: &str, args: &[String]) -> io::Result<ProcessHandle> {
        if self.missing.iter().any(|m| m == program) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{program}: not found"),
            ));
        }
        self.calls
            .borrow_mut()
            .push((program.to_string(), args.to_vec()));
        Ok(ProcessHandle::untracked(program))
    }
}
