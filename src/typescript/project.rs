//! In-memory project holding the file being compiled.

use std::collections::HashMap;

/// A file system that only exists in memory.
///
/// The runtime registers one file per call through a [`CompilationSlot`] and
/// the slot removes it again, so between calls the project is empty.
#[derive(Debug, Default)]
pub struct VirtualProject {
    files: HashMap<String, String>,
}

impl VirtualProject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files currently registered.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Check if a file is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Source text of a registered file.
    pub fn source(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    /// Register `source` under `name`, overwriting any previous content,
    /// and return a slot that removes the file when dropped.
    pub fn open_slot(&mut self, name: &str, source: &str) -> CompilationSlot<'_> {
        self.files.insert(name.to_string(), source.to_string());
        CompilationSlot {
            project: self,
            name: name.to_string(),
        }
    }
}

/// Scoped registration of one source file.
///
/// Dropping the slot removes the file on every exit path, including early
/// returns and unwinding.
#[derive(Debug)]
pub struct CompilationSlot<'p> {
    project: &'p mut VirtualProject,
    name: String,
}

impl CompilationSlot<'_> {
    /// Name of the registered file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source text of the registered file.
    pub fn source(&self) -> &str {
        self.project.source(&self.name).unwrap_or_default()
    }
}

impl Drop for CompilationSlot<'_> {
    fn drop(&mut self) {
        self.project.files.remove(&self.name);
    }
}
