//! Checker findings and their conversion to positioned diagnostics.

use crate::sandbox::result::Diagnostic;

/// Type '{0}' is not assignable to type '{1}'.
pub const NOT_ASSIGNABLE: u32 = 2322;
/// Cannot find module '{0}' or its corresponding type declarations.
pub const MODULE_NOT_FOUND: u32 = 2307;
/// Argument of type '{0}' is not assignable to parameter of type '{1}'.
pub const ARGUMENT_NOT_ASSIGNABLE: u32 = 2345;
/// A function whose declared type is neither 'undefined', 'void', nor 'any' must return a value.
pub const MISSING_RETURN: u32 = 2355;
/// The left-hand side of an arithmetic operation must be of type ...
pub const ARITHMETIC_LEFT: u32 = 2362;
/// The right-hand side of an arithmetic operation must be of type ...
pub const ARITHMETIC_RIGHT: u32 = 2363;
/// Expected {0} arguments, but got {1}.
pub const WRONG_ARITY: u32 = 2554;
/// Cannot assign to '{0}' because it is a constant.
pub const CONST_ASSIGNMENT: u32 = 2588;
/// Cannot find name '{0}'.
pub const CANNOT_FIND_NAME: u32 = 2304;
/// Cannot find name '{0}'. Do you need to install type definitions for node? ...
pub const CANNOT_FIND_NODE_NAME: u32 = 2580;
/// Property '{0}' does not exist on type '{1}'.
pub const PROPERTY_NOT_FOUND: u32 = 2339;
/// Object literal may only specify known properties, and '{0}' does not exist in type '{1}'.
pub const EXCESS_PROPERTY: u32 = 2353;
/// Type '{0}' is missing the following properties from type '{1}': {2}
pub const PROPERTIES_MISSING: u32 = 2739;
/// Type '{0}' is missing the following properties from type '{1}': {2}, and {3} more.
pub const PROPERTIES_MISSING_MORE: u32 = 2740;
/// Property '{0}' is missing in type '{1}' but required in type '{2}'.
pub const PROPERTY_MISSING: u32 = 2741;

/// A diagnostic message with optional nested detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageChain {
    text: String,
    next: Vec<MessageChain>,
}

impl MessageChain {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next: Vec::new(),
        }
    }

    /// Attach a nested detail message.
    pub fn with_next(mut self, next: MessageChain) -> Self {
        self.next.push(next);
        self
    }

    /// Render the chain: the head message, then each nested message on its
    /// own line, indented by depth and marked with `→`.
    pub fn flatten(&self) -> String {
        let mut out = self.text.clone();
        self.flatten_into(&mut out, 1);
        out
    }

    fn flatten_into(&self, out: &mut String, depth: usize) {
        for child in &self.next {
            out.push('\n');
            out.push_str(&"  ".repeat(depth));
            out.push_str("→ ");
            out.push_str(&child.text);
            child.flatten_into(out, depth + 1);
        }
    }
}

/// An error found at a byte offset of the source, not yet positioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// tsc error code, when the finding mirrors one.
    pub code: Option<u32>,
    /// Byte offset into the checked source.
    pub offset: u32,
    pub message: MessageChain,
}

impl Finding {
    pub fn new(code: u32, offset: u32, message: MessageChain) -> Self {
        Self {
            code: Some(code),
            offset,
            message,
        }
    }

    /// A finding reported by the parser or the semantic pass.
    pub fn syntax(offset: u32, message: impl Into<String>) -> Self {
        Self {
            code: None,
            offset,
            message: MessageChain::new(message),
        }
    }

    /// Resolve the offset and render the message.
    pub fn to_diagnostic(&self, index: &LineIndex) -> Diagnostic {
        let (line, column) = index.position(self.offset);
        Diagnostic {
            line,
            column,
            message: self.message.flatten(),
        }
    }
}

/// Maps byte offsets to 1-based line and column numbers.
///
/// Columns count UTF-16 code units, matching what editors and tsc report.
#[derive(Debug, Clone)]
pub struct LineIndex<'s> {
    source: &'s str,
    line_starts: Vec<usize>,
}

impl<'s> LineIndex<'s> {
    pub fn new(source: &'s str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            source,
            line_starts,
        }
    }

    /// 1-based `(line, column)` of a byte offset.
    ///
    /// Offsets past the end clamp to the end of the source.
    pub fn position(&self, offset: u32) -> (u32, u32) {
        let offset = (offset as usize).min(self.source.len());
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[line];

        let column: usize = self.source[start..]
            .char_indices()
            .take_while(|(i, _)| start + i < offset)
            .map(|(_, c)| c.len_utf16())
            .sum();

        (line as u32 + 1, column as u32 + 1)
    }
}
