//! The host capabilities the resolver needs, kept behind a trait so the core
//! never touches a file system or an editor API itself.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::{Error, Result};

/// Supplied by the host (editor extension, CLI, test harness).
pub trait Workspace {
    /// Candidate step-definition files, in the order they should be indexed.
    fn enumerate_files(&self) -> Result<Vec<String>>;

    fn read_file(&self, path: &str) -> Result<String>;

    /// Moves the host's cursor to the zero-based `line` of `path`.
    fn reveal_location(&self, path: &str, line: usize) -> Result<()>;
}

/// An in-memory workspace. Files enumerate in insertion order.
#[derive(Debug, Default)]
pub struct MemoryWorkspace {
    order: Vec<String>,
    files: BTreeMap<String, String>,
    revealed: Mutex<Vec<(String, usize)>>,
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file. Replacing keeps its enumeration position.
    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        let path = path.into();
        if !self.files.contains_key(&path) {
            self.order.push(path.clone());
        }
        self.files.insert(path, text.into());
    }

    /// Lists a path without content, so reading it fails.
    pub fn insert_unreadable(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.files.remove(&path);
        if !self.order.contains(&path) {
            self.order.push(path);
        }
    }

    /// Every location revealed so far, oldest first.
    pub fn revealed(&self) -> Vec<(String, usize)> {
        match self.revealed.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Workspace for MemoryWorkspace {
    fn enumerate_files(&self) -> Result<Vec<String>> {
        Ok(self.order.clone())
    }

    fn read_file(&self, path: &str) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::io(path, "file not found"))
    }

    fn reveal_location(&self, path: &str, line: usize) -> Result<()> {
        if !self.files.contains_key(path) {
            return Err(Error::io(path, "file not found"));
        }
        match self.revealed.lock() {
            Ok(mut guard) => guard.push((path.to_string(), line)),
            Err(poisoned) => poisoned.into_inner().push((path.to_string(), line)),
        }
        Ok(())
    }
}
