//! Fixed compiler options for the TypeScript runtime.

/// Name of the single virtual source file.
pub const DEFAULT_FILE_NAME: &str = "main.ts";

/// Options applied to every compilation.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Strict null checks: `null` and `undefined` are only assignable to
    /// types that include them.
    pub strict: bool,
    /// Name the source is registered under in the virtual project.
    pub file_name: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            strict: true,
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

impl CompilerOptions {
    /// Set strict checking.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the virtual file name.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }
}
