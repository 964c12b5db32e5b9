//! TypeScript to JavaScript emit.

use std::ops::Range;
use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::{ExportDefaultDeclarationKind, Statement};
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::{GetSpan, SourceType};
use oxc_transformer::{TransformOptions, Transformer};

use crate::error::{Result, SandboxError};
use crate::typescript::options::CompilerOptions;

/// Binding that receives an `export default` expression.
const DEFAULT_EXPORT_BINDING: &str = "const __default_export = ";

/// Strip types and module syntax from a checked source.
///
/// The result is a script body: `export` modifiers are removed so exported
/// declarations run as plain locals inside the sandbox function.
pub fn transpile(source: &str, options: &CompilerOptions) -> Result<String> {
    let erased = erase_module_syntax(source)?;

    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, &erased, SourceType::ts()).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(SandboxError::Transpile(error.message.to_string()));
    }
    let mut program = parsed.program;

    let (symbols, scopes) = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_symbol_table_and_scope_tree();
    let transformed = Transformer::new(
        &allocator,
        Path::new(&options.file_name),
        &TransformOptions::default(),
    )
    .build_with_symbols_and_scopes(symbols, scopes, &mut program);
    if let Some(error) = transformed.errors.first() {
        return Err(SandboxError::Transpile(error.message.to_string()));
    }

    let code = Codegen::new().build(&program).code;
    Ok(code
        .lines()
        .filter(|line| line.trim() != "export {};")
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Rewrite top-level `export` syntax into plain script statements.
fn erase_module_syntax(source: &str) -> Result<String> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::ts()).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(SandboxError::Transpile(error.message.to_string()));
    }

    let mut edits: Vec<(Range<usize>, &str)> = Vec::new();
    for statement in &parsed.program.body {
        match statement {
            Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(declaration) => edits.push((
                    span_range(export.span.start, declaration.span().start),
                    "",
                )),
                None => edits.push((span_range(export.span.start, export.span.end), "")),
            },
            Statement::ExportDefaultDeclaration(export) => {
                let start = export.declaration.span().start;
                let replacement = match &export.declaration {
                    ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => "",
                    _ => DEFAULT_EXPORT_BINDING,
                };
                edits.push((span_range(export.span.start, start), replacement));
            }
            Statement::ExportAllDeclaration(export) => {
                edits.push((span_range(export.span.start, export.span.end), ""));
            }
            Statement::TSExportAssignment(export) => {
                edits.push((span_range(export.span.start, export.span.end), ""));
            }
            _ => {}
        }
    }

    Ok(apply_edits(source, &edits))
}

fn span_range(start: u32, end: u32) -> Range<usize> {
    start as usize..end as usize
}

/// Replace each range, in order, keeping line breaks inside removed text.
fn apply_edits(source: &str, edits: &[(Range<usize>, &str)]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for (range, replacement) in edits {
        out.push_str(&source[cursor..range.start]);
        out.push_str(replacement);
        out.extend(source[range.clone()].chars().filter(|c| *c == '\n'));
        cursor = range.end;
    }
    out.push_str(&source[cursor..]);
    out
}
