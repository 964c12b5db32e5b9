//! Type checking for the single-file TypeScript project.
//!
//! Parser and semantic errors are reported first. A clean parse then gets two
//! passes: references no declaration resolves are matched against the
//! ambient [`globals`](super::globals), and a checker walks the program
//! tracking the types of local bindings, functions, interfaces and type
//! aliases, reporting the tsc errors listed in
//! [`diagnostics`](super::diagnostics). Their findings are merged in source
//! order. Whatever the checker cannot type is treated as `any`, so it stays
//! silent rather than guess.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    ArrowFunctionExpression, AssignmentTarget, BindingPattern, BindingPatternKind, CallExpression,
    Declaration, ExportDefaultDeclarationKind, Expression, ForStatementInit, ForStatementLeft,
    FormalParameters, Function, FunctionBody, ObjectExpression, ObjectPropertyKind, PropertyKind,
    SimpleAssignmentTarget, Statement, TSInterfaceDeclaration, TSMethodSignatureKind, TSSignature,
    TSType, TSTypeAliasDeclaration, TSTypeAnnotation, TSTypeName, VariableDeclaration,
    VariableDeclarationKind,
};
use oxc_diagnostics::OxcDiagnostic;
use oxc_parser::Parser;
use oxc_semantic::{Semantic, SemanticBuilder};
use oxc_span::{GetSpan, SourceType};
use oxc_syntax::operator::{AssignmentOperator, BinaryOperator, UnaryOperator};
use tracing::debug;

use crate::sandbox::result::Diagnostic;
use crate::typescript::diagnostics::{
    Finding, LineIndex, MessageChain, ARGUMENT_NOT_ASSIGNABLE, ARITHMETIC_LEFT, ARITHMETIC_RIGHT,
    CONST_ASSIGNMENT, EXCESS_PROPERTY, MISSING_RETURN, MODULE_NOT_FOUND, NOT_ASSIGNABLE,
    PROPERTIES_MISSING, PROPERTIES_MISSING_MORE, PROPERTY_MISSING, PROPERTY_NOT_FOUND,
    WRONG_ARITY,
};
use crate::typescript::globals::{self, Member};
use crate::typescript::options::CompilerOptions;
use crate::typescript::types::{Param, Property, Shape, Signature, Ty};

/// Type-check `source` and return its error diagnostics in traversal order.
pub fn check(source: &str, options: &CompilerOptions) -> Vec<Diagnostic> {
    let index = LineIndex::new(source);
    let findings = collect_findings(source, options);
    debug!(count = findings.len(), "type check finished");
    findings.iter().map(|f| f.to_diagnostic(&index)).collect()
}

fn collect_findings(source: &str, options: &CompilerOptions) -> Vec<Finding> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::ts()).parse();

    // Checking a partial tree only produces noise.
    if !parsed.errors.is_empty() {
        return parsed.errors.iter().map(syntax_finding).collect();
    }
    if parsed.panicked {
        return vec![Finding::syntax(0, "Unexpected end of input.")];
    }

    let semantic = SemanticBuilder::new()
        .with_check_syntax_error(true)
        .build(&parsed.program);
    let mut findings: Vec<Finding> = semantic.errors.iter().map(syntax_finding).collect();

    let (mut checked, library) = unresolved_references(&semantic.semantic);
    let mut checker = Checker::new(options.strict, library);
    checker.check_statements(&parsed.program.body);
    checked.extend(checker.findings);
    checked.sort_by_key(|finding| finding.offset);

    findings.extend(checked);
    findings
}

/// Report value references that neither the source nor the default
/// libraries declare.
///
/// Also returns the names that resolve to library globals, so the checker
/// can type them.
fn unresolved_references(semantic: &Semantic<'_>) -> (Vec<Finding>, HashSet<String>) {
    let mut findings = Vec::new();
    let mut library = HashSet::new();

    for (name, references) in semantic.scopes().root_unresolved_references() {
        let name = name.as_str();
        let Some((code, message)) = globals::unresolved_message(name) else {
            library.insert(name.to_string());
            continue;
        };
        for &reference_id in references {
            let reference = semantic.symbols().get_reference(reference_id);
            if !reference.is_value() {
                continue;
            }
            let offset = semantic.nodes().kind(reference.node_id()).span().start;
            findings.push(Finding::new(code, offset, message.clone()));
        }
    }
    (findings, library)
}

fn syntax_finding(error: &OxcDiagnostic) -> Finding {
    let offset = error
        .labels
        .as_ref()
        .and_then(|labels| labels.first())
        .map_or(0, |label| label.offset() as u32);
    Finding::syntax(offset, error.message.to_string())
}

#[derive(Debug, Clone)]
struct Binding {
    ty: Ty,
    constant: bool,
}

struct FunctionContext {
    ret: Option<Ty>,
}

/// Values and named types declared in one block.
#[derive(Default)]
struct Scope {
    values: HashMap<String, Binding>,
    types: HashMap<String, Ty>,
}

struct Checker {
    strict: bool,
    /// Unshadowed names that refer to library globals.
    library: HashSet<String>,
    scopes: Vec<Scope>,
    functions: Vec<FunctionContext>,
    findings: Vec<Finding>,
}

impl Checker {
    fn new(strict: bool, library: HashSet<String>) -> Self {
        Self {
            strict,
            library,
            scopes: vec![Scope::default()],
            functions: Vec::new(),
            findings: Vec::new(),
        }
    }

    fn report(&mut self, code: u32, offset: u32, message: MessageChain) {
        self.findings.push(Finding::new(code, offset, message));
    }

    fn declare(&mut self, name: &str, ty: Ty, constant: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.values.insert(name.to_string(), Binding { ty, constant });
        }
    }

    fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.values.get(name))
    }

    fn lookup_type(&self, name: &str) -> Option<Ty> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.types.get(name))
            .cloned()
    }

    fn with_scope(&mut self, f: impl FnOnce(&mut Self)) {
        self.scopes.push(Scope::default());
        f(self);
        self.scopes.pop();
    }

    // Statements

    fn check_statements(&mut self, statements: &[Statement<'_>]) {
        self.hoist_types(statements);
        for statement in statements {
            self.hoist(statement);
        }
        for statement in statements {
            self.check_statement(statement);
        }
    }

    /// Interfaces and type aliases are visible to the whole block.
    ///
    /// Two rounds let a declaration refer to one that comes later, or to
    /// itself one level deep; anything deeper resolves to `any`.
    fn hoist_types(&mut self, statements: &[Statement<'_>]) {
        for _ in 0..2 {
            let mut declared: HashMap<String, Ty> = HashMap::new();
            for statement in statements {
                let (name, ty) = match statement {
                    Statement::TSInterfaceDeclaration(interface) => {
                        (interface.id.name.as_str(), self.interface(interface))
                    }
                    Statement::TSTypeAliasDeclaration(alias) => {
                        (alias.id.name.as_str(), self.alias(alias))
                    }
                    Statement::ExportNamedDeclaration(export) => match &export.declaration {
                        Some(Declaration::TSInterfaceDeclaration(interface)) => {
                            (interface.id.name.as_str(), self.interface(interface))
                        }
                        Some(Declaration::TSTypeAliasDeclaration(alias)) => {
                            (alias.id.name.as_str(), self.alias(alias))
                        }
                        _ => continue,
                    },
                    _ => continue,
                };
                // Interfaces with the same name merge.
                let ty = match (declared.remove(name), ty) {
                    (None, ty) => ty,
                    (Some(Ty::Record(first)), Ty::Record(second)) => {
                        let mut properties = first.properties.clone();
                        for property in &second.properties {
                            if first.property(&property.name).is_none() {
                                properties.push(property.clone());
                            }
                        }
                        Ty::Record(Rc::new(Shape {
                            name: first.name.clone(),
                            properties,
                        }))
                    }
                    (Some(_), _) => Ty::Any,
                };
                declared.insert(name.to_string(), ty);
            }
            if let Some(scope) = self.scopes.last_mut() {
                scope.types = declared;
            }
        }
    }

    /// Function declarations are callable before the line that declares them.
    fn hoist(&mut self, statement: &Statement<'_>) {
        let function = match statement {
            Statement::FunctionDeclaration(function) => function,
            Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(Declaration::FunctionDeclaration(function)) => function,
                _ => return,
            },
            Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(function) => function,
                _ => return,
            },
            _ => return,
        };
        if let Some(id) = &function.id {
            let signature = self.signature(&function.params, function.return_type.as_deref());
            self.declare(id.name.as_str(), Ty::Function(Rc::new(signature)), false);
        }
    }

    fn check_statement(&mut self, statement: &Statement<'_>) {
        match statement {
            Statement::VariableDeclaration(declaration) => self.check_variables(declaration),
            Statement::FunctionDeclaration(function) => self.check_function(function),
            Statement::ExpressionStatement(statement) => {
                self.infer(&statement.expression);
            }
            Statement::ReturnStatement(statement) => {
                let ty = match &statement.argument {
                    Some(argument) => self.infer(argument),
                    None => Ty::Undefined,
                };
                let expected = self.functions.last().and_then(|f| f.ret.clone());
                match (expected, &statement.argument) {
                    (Some(expected), Some(argument)) => {
                        self.check_assignable(argument, &ty, &expected, statement.span.start)
                    }
                    (Some(expected), None) if !ty.is_assignable_to(&expected, self.strict) => {
                        self.report(NOT_ASSIGNABLE, statement.span.start, mismatch(&ty, &expected))
                    }
                    _ => {}
                }
            }
            Statement::BlockStatement(block) => {
                self.with_scope(|checker| checker.check_statements(&block.body));
            }
            Statement::IfStatement(statement) => {
                self.infer(&statement.test);
                self.check_nested(&statement.consequent);
                if let Some(alternate) = &statement.alternate {
                    self.check_nested(alternate);
                }
            }
            Statement::ForStatement(statement) => self.with_scope(|checker| {
                match &statement.init {
                    Some(ForStatementInit::VariableDeclaration(declaration)) => {
                        checker.check_variables(declaration)
                    }
                    Some(init) => {
                        if let Some(expression) = init.as_expression() {
                            checker.infer(expression);
                        }
                    }
                    None => {}
                }
                if let Some(test) = &statement.test {
                    checker.infer(test);
                }
                if let Some(update) = &statement.update {
                    checker.infer(update);
                }
                checker.check_nested(&statement.body);
            }),
            Statement::ForOfStatement(statement) => {
                self.infer(&statement.right);
                self.check_loop_body(&statement.left, &statement.body);
            }
            Statement::ForInStatement(statement) => {
                self.infer(&statement.right);
                self.check_loop_body(&statement.left, &statement.body);
            }
            Statement::WhileStatement(statement) => {
                self.infer(&statement.test);
                self.check_nested(&statement.body);
            }
            Statement::DoWhileStatement(statement) => {
                self.check_nested(&statement.body);
                self.infer(&statement.test);
            }
            Statement::TryStatement(statement) => {
                self.with_scope(|checker| checker.check_statements(&statement.block.body));
                if let Some(handler) = &statement.handler {
                    self.with_scope(|checker| {
                        if let Some(param) = &handler.param {
                            checker.declare_pattern(&param.pattern, false);
                        }
                        checker.check_statements(&handler.body.body);
                    });
                }
                if let Some(finalizer) = &statement.finalizer {
                    self.with_scope(|checker| checker.check_statements(&finalizer.body));
                }
            }
            Statement::ThrowStatement(statement) => {
                self.infer(&statement.argument);
            }
            Statement::SwitchStatement(statement) => {
                self.infer(&statement.discriminant);
                self.with_scope(|checker| {
                    for case in &statement.cases {
                        if let Some(test) = &case.test {
                            checker.infer(test);
                        }
                        checker.check_statements(&case.consequent);
                    }
                });
            }
            Statement::LabeledStatement(statement) => self.check_nested(&statement.body),
            Statement::ImportDeclaration(import) => {
                let module = import.source.value.as_str();
                self.report(
                    MODULE_NOT_FOUND,
                    import.source.span.start,
                    MessageChain::new(format!(
                        "Cannot find module '{}' or its corresponding type declarations.",
                        module
                    )),
                );
            }
            Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(Declaration::VariableDeclaration(declaration)) => {
                    self.check_variables(declaration)
                }
                Some(Declaration::FunctionDeclaration(function)) => self.check_function(function),
                _ => {}
            },
            Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(function) => {
                    self.check_function(function)
                }
                other => {
                    if let Some(expression) = other.as_expression() {
                        self.infer(expression);
                    }
                }
            },
            _ => {}
        }
    }

    /// A statement in a position that introduces its own scope.
    fn check_nested(&mut self, statement: &Statement<'_>) {
        self.with_scope(|checker| checker.check_statements(std::slice::from_ref(statement)));
    }

    fn check_loop_body(&mut self, left: &ForStatementLeft<'_>, body: &Statement<'_>) {
        self.with_scope(|checker| {
            if let ForStatementLeft::VariableDeclaration(declaration) = left {
                let constant = declaration.kind == VariableDeclarationKind::Const;
                for declarator in &declaration.declarations {
                    checker.declare_pattern(&declarator.id, constant);
                }
            }
            checker.check_nested(body);
        });
    }

    fn check_variables(&mut self, declaration: &VariableDeclaration<'_>) {
        let constant = declaration.kind == VariableDeclarationKind::Const;
        for declarator in &declaration.declarations {
            let declared = declarator
                .id
                .type_annotation
                .as_deref()
                .map(|annotation| self.resolve(&annotation.type_annotation));
            let initial = declarator.init.as_ref().map(|init| (init, self.infer(init)));

            let BindingPatternKind::BindingIdentifier(id) = &declarator.id.kind else {
                continue;
            };

            if let (Some(target), Some((init, source))) = (&declared, &initial) {
                self.check_assignable(init, source, target, id.span.start);
            }

            let ty = match (declared, initial) {
                (Some(declared), _) => declared,
                (None, Some((_, inferred))) => binding_type(inferred),
                (None, None) => Ty::Any,
            };
            self.declare(id.name.as_str(), ty, constant);
        }
    }

    fn declare_pattern(&mut self, pattern: &BindingPattern<'_>, constant: bool) {
        if let BindingPatternKind::BindingIdentifier(id) = &pattern.kind {
            let ty = pattern
                .type_annotation
                .as_deref()
                .map_or(Ty::Any, |annotation| self.resolve(&annotation.type_annotation));
            self.declare(id.name.as_str(), ty, constant);
        }
    }

    // Functions

    fn signature(
        &self,
        params: &FormalParameters<'_>,
        return_type: Option<&TSTypeAnnotation<'_>>,
    ) -> Signature {
        let items = params
            .items
            .iter()
            .map(|param| {
                let pattern = &param.pattern;
                let (name, defaulted) = match &pattern.kind {
                    BindingPatternKind::BindingIdentifier(id) => (id.name.to_string(), false),
                    BindingPatternKind::AssignmentPattern(assignment) => {
                        match &assignment.left.kind {
                            BindingPatternKind::BindingIdentifier(id) => {
                                (id.name.to_string(), true)
                            }
                            _ => ("arg".to_string(), true),
                        }
                    }
                    _ => ("arg".to_string(), false),
                };
                Param {
                    name,
                    ty: pattern
                        .type_annotation
                        .as_deref()
                        .map_or(Ty::Any, |annotation| self.resolve(&annotation.type_annotation)),
                    optional: pattern.optional || defaulted,
                }
            })
            .collect();

        let rest = params.rest.as_ref().map(|rest| {
            rest.argument
                .type_annotation
                .as_deref()
                .map_or(Ty::Any, |annotation| self.resolve(&annotation.type_annotation))
        });
        let ret = return_type.map_or(Ty::Any, |annotation| self.resolve(&annotation.type_annotation));
        Signature {
            params: items,
            rest,
            ret,
        }
    }

    fn check_function(&mut self, function: &Function<'_>) {
        let Some(body) = &function.body else {
            return;
        };
        let ret = function
            .return_type
            .as_deref()
            .map(|annotation| self.resolve(&annotation.type_annotation));
        if let (Some(ret), Some(annotation)) = (&ret, function.return_type.as_deref()) {
            if !function.r#async && requires_return(ret) && !always_exits(&body.statements) {
                self.report(
                    MISSING_RETURN,
                    annotation.type_annotation.span().start,
                    MessageChain::new(
                        "A function whose declared type is neither 'undefined', 'void', nor 'any' must return a value.",
                    ),
                );
            }
        }
        self.check_body(&function.params, body, ret);
    }

    fn check_arrow(&mut self, arrow: &ArrowFunctionExpression<'_>) -> Ty {
        let signature = self.signature(&arrow.params, arrow.return_type.as_deref());
        let ret = arrow
            .return_type
            .as_deref()
            .map(|annotation| self.resolve(&annotation.type_annotation));

        if arrow.expression {
            self.with_scope(|checker| {
                checker.declare_params(&arrow.params);
                if let Some(Statement::ExpressionStatement(statement)) = arrow.body.statements.first() {
                    let ty = checker.infer(&statement.expression);
                    if let Some(ret) = &ret {
                        checker.check_assignable(
                            &statement.expression,
                            &ty,
                            ret,
                            statement.expression.span().start,
                        );
                    }
                }
            });
        } else {
            self.check_body(&arrow.params, &arrow.body, ret);
        }
        Ty::Function(Rc::new(signature))
    }

    fn check_body(&mut self, params: &FormalParameters<'_>, body: &FunctionBody<'_>, ret: Option<Ty>) {
        self.functions.push(FunctionContext { ret });
        self.with_scope(|checker| {
            checker.declare_params(params);
            checker.check_statements(&body.statements);
        });
        self.functions.pop();
    }

    fn declare_params(&mut self, params: &FormalParameters<'_>) {
        for param in &params.items {
            let pattern = &param.pattern;
            let ty = pattern
                .type_annotation
                .as_deref()
                .map_or(Ty::Any, |annotation| self.resolve(&annotation.type_annotation));
            let ty = if pattern.optional {
                Ty::union([ty, Ty::Undefined])
            } else {
                ty
            };
            match &pattern.kind {
                BindingPatternKind::BindingIdentifier(id) => self.declare(id.name.as_str(), ty, false),
                BindingPatternKind::AssignmentPattern(assignment) => {
                    self.declare_pattern(&assignment.left, false)
                }
                _ => {}
            }
        }
        if let Some(rest) = &params.rest {
            self.declare_pattern(&rest.argument, false);
        }
    }

    // Expressions

    fn infer(&mut self, expression: &Expression<'_>) -> Ty {
        match expression {
            Expression::NumericLiteral(_) => Ty::Number,
            Expression::StringLiteral(_) => Ty::String,
            Expression::BooleanLiteral(_) => Ty::Boolean,
            Expression::NullLiteral(_) => Ty::Null,
            Expression::BigIntLiteral(_) => Ty::BigInt,
            Expression::TemplateLiteral(template) => {
                for part in &template.expressions {
                    self.infer(part);
                }
                Ty::String
            }
            Expression::Identifier(ident) => match ident.name.as_str() {
                "undefined" => Ty::Undefined,
                name => match self.lookup(name) {
                    Some(binding) => binding.ty.clone(),
                    None if self.library.contains(name) => globals::global_type(name),
                    None => Ty::Any,
                },
            },
            Expression::ArrayExpression(array) => {
                let mut elements = Vec::new();
                for element in &array.elements {
                    match element.as_expression() {
                        Some(expression) => elements.push(self.infer(expression)),
                        None => return Ty::Any,
                    }
                }
                if elements.is_empty() {
                    Ty::Any
                } else {
                    Ty::Array(Box::new(Ty::union(elements)))
                }
            }
            Expression::ObjectExpression(object) => self.object_literal(object),
            Expression::ParenthesizedExpression(inner) => self.infer(&inner.expression),
            Expression::TSAsExpression(cast) => {
                self.infer(&cast.expression);
                self.resolve(&cast.type_annotation)
            }
            Expression::TSSatisfiesExpression(satisfies) => self.infer(&satisfies.expression),
            Expression::TSNonNullExpression(inner) => {
                self.infer(&inner.expression);
                Ty::Any
            }
            Expression::AwaitExpression(await_expression) => {
                self.infer(&await_expression.argument);
                Ty::Any
            }
            Expression::SequenceExpression(sequence) => {
                let mut last = Ty::Any;
                for expression in &sequence.expressions {
                    last = self.infer(expression);
                }
                last
            }
            Expression::UnaryExpression(unary) => {
                let operand = self.infer(&unary.argument);
                match unary.operator {
                    UnaryOperator::Typeof => Ty::String,
                    UnaryOperator::LogicalNot | UnaryOperator::Delete => Ty::Boolean,
                    UnaryOperator::Void => Ty::Undefined,
                    UnaryOperator::UnaryNegation | UnaryOperator::BitwiseNot if operand == Ty::BigInt => {
                        Ty::BigInt
                    }
                    _ => Ty::Number,
                }
            }
            Expression::BinaryExpression(binary) => {
                let left = self.infer(&binary.left);
                let right = self.infer(&binary.right);
                self.binary(binary.operator, &binary.left, &left, &binary.right, &right)
            }
            Expression::LogicalExpression(logical) => {
                let left = self.infer(&logical.left);
                let right = self.infer(&logical.right);
                if left == right {
                    left
                } else {
                    Ty::Any
                }
            }
            Expression::ConditionalExpression(conditional) => {
                self.infer(&conditional.test);
                let consequent = self.infer(&conditional.consequent);
                let alternate = self.infer(&conditional.alternate);
                if consequent == alternate {
                    consequent
                } else {
                    Ty::Any
                }
            }
            Expression::AssignmentExpression(assignment) => {
                let value = self.infer(&assignment.right);
                if let AssignmentTarget::AssignmentTargetIdentifier(target) = &assignment.left {
                    self.assign(
                        target.name.as_str(),
                        target.span.start,
                        (assignment.operator == AssignmentOperator::Assign)
                            .then_some((&assignment.right, &value)),
                    );
                }
                value
            }
            Expression::UpdateExpression(update) => {
                if let SimpleAssignmentTarget::AssignmentTargetIdentifier(target) = &update.argument {
                    self.assign(target.name.as_str(), target.span.start, None);
                }
                Ty::Number
            }
            Expression::CallExpression(call) => self.call(call),
            Expression::NewExpression(new) => {
                self.infer(&new.callee);
                for argument in &new.arguments {
                    if let Some(expression) = argument.as_expression() {
                        self.infer(expression);
                    }
                }
                Ty::Any
            }
            Expression::StaticMemberExpression(member) => {
                let object = self.infer(&member.object);
                self.property(&object, member.property.name.as_str(), member.property.span.start)
            }
            Expression::ComputedMemberExpression(member) => {
                self.infer(&member.object);
                self.infer(&member.expression);
                Ty::Any
            }
            Expression::ArrowFunctionExpression(arrow) => self.check_arrow(arrow),
            Expression::FunctionExpression(function) => {
                let signature = self.signature(&function.params, function.return_type.as_deref());
                self.check_function(function);
                Ty::Function(Rc::new(signature))
            }
            _ => Ty::Any,
        }
    }

    /// Type of an object literal. Spreads, computed keys and accessors make
    /// the shape unknown.
    fn object_literal(&mut self, object: &ObjectExpression<'_>) -> Ty {
        let mut properties: Vec<Property> = Vec::new();
        let mut open = false;
        for property in &object.properties {
            match property {
                ObjectPropertyKind::ObjectProperty(property) => {
                    let ty = self.infer(&property.value);
                    let name = (!property.computed && property.kind == PropertyKind::Init)
                        .then(|| property.key.static_name())
                        .flatten();
                    match name {
                        Some(name) => {
                            properties.retain(|p| p.name != name);
                            properties.push(Property {
                                name: name.into_owned(),
                                ty,
                                optional: false,
                            });
                        }
                        None => open = true,
                    }
                }
                ObjectPropertyKind::SpreadProperty(spread) => {
                    self.infer(&spread.argument);
                    open = true;
                }
            }
        }
        if open {
            Ty::Any
        } else {
            Ty::Record(Rc::new(Shape {
                name: None,
                properties,
            }))
        }
    }

    /// Type of reading `name` from a value of type `object`.
    fn property(&mut self, object: &Ty, name: &str, offset: u32) -> Ty {
        match globals::member(object, name) {
            Member::Known(ty) => ty,
            Member::Unknown => Ty::Any,
            Member::Missing => {
                self.report(
                    PROPERTY_NOT_FOUND,
                    offset,
                    MessageChain::new(format!(
                        "Property '{}' does not exist on type '{}'.",
                        name, object
                    )),
                );
                Ty::Any
            }
        }
    }

    fn binary(
        &mut self,
        operator: BinaryOperator,
        left_expression: &Expression<'_>,
        left: &Ty,
        right_expression: &Expression<'_>,
        right: &Ty,
    ) -> Ty {
        match operator {
            BinaryOperator::Addition => match (left, right) {
                (Ty::String, _) | (_, Ty::String) => Ty::String,
                (Ty::Number, Ty::Number) => Ty::Number,
                (Ty::BigInt, Ty::BigInt) => Ty::BigInt,
                _ => Ty::Any,
            },
            BinaryOperator::Subtraction
            | BinaryOperator::Multiplication
            | BinaryOperator::Division
            | BinaryOperator::Remainder
            | BinaryOperator::Exponential
            | BinaryOperator::ShiftLeft
            | BinaryOperator::ShiftRight
            | BinaryOperator::ShiftRightZeroFill
            | BinaryOperator::BitwiseOR
            | BinaryOperator::BitwiseXOR
            | BinaryOperator::BitwiseAnd => {
                if !left.is_arithmetic_operand() {
                    self.report(
                        ARITHMETIC_LEFT,
                        left_expression.span().start,
                        MessageChain::new(
                            "The left-hand side of an arithmetic operation must be of type 'any', 'number', 'bigint' or an enum type.",
                        ),
                    );
                }
                if !right.is_arithmetic_operand() {
                    self.report(
                        ARITHMETIC_RIGHT,
                        right_expression.span().start,
                        MessageChain::new(
                            "The right-hand side of an arithmetic operation must be of type 'any', 'number', 'bigint' or an enum type.",
                        ),
                    );
                }
                if *left == Ty::BigInt && *right == Ty::BigInt {
                    Ty::BigInt
                } else {
                    Ty::Number
                }
            }
            _ => Ty::Boolean,
        }
    }

    /// Check an assignment to a named binding. `value` is set for plain `=`.
    fn assign(&mut self, name: &str, offset: u32, value: Option<(&Expression<'_>, &Ty)>) {
        let Some(binding) = self.lookup(name).cloned() else {
            return;
        };
        if binding.constant {
            self.report(
                CONST_ASSIGNMENT,
                offset,
                MessageChain::new(format!(
                    "Cannot assign to '{}' because it is a constant.",
                    name
                )),
            );
            return;
        }
        if let Some((expression, ty)) = value {
            self.check_assignable(expression, ty, &binding.ty, offset);
        }
    }

    fn call(&mut self, call: &CallExpression<'_>) -> Ty {
        let callee = self.infer(&call.callee);
        let mut arguments = Vec::with_capacity(call.arguments.len());
        let mut spread = false;
        for argument in &call.arguments {
            match argument.as_expression() {
                Some(expression) => {
                    let ty = self.infer(expression);
                    arguments.push((expression, ty));
                }
                None => spread = true,
            }
        }

        let Ty::Function(signature) = callee else {
            return Ty::Any;
        };
        if spread {
            return signature.ret.clone();
        }

        if !signature.accepts_arity(arguments.len()) {
            let offset = arguments
                .get(signature.params.len())
                .map_or(call.span.start, |(expression, _)| expression.span().start);
            self.report(
                WRONG_ARITY,
                offset,
                MessageChain::new(format!(
                    "Expected {} arguments, but got {}.",
                    signature.expected_arity(),
                    arguments.len()
                )),
            );
            return signature.ret.clone();
        }

        for ((expression, ty), param) in arguments.iter().zip(&signature.params) {
            let accepted = ty.is_assignable_to(&param.ty, self.strict)
                || (param.optional && *ty == Ty::Undefined);
            if !accepted {
                self.report(
                    ARGUMENT_NOT_ASSIGNABLE,
                    expression.span().start,
                    MessageChain::new(format!(
                        "Argument of type '{}' is not assignable to parameter of type '{}'.",
                        ty, param.ty
                    )),
                );
            }
        }
        signature.ret.clone()
    }

    /// Report TS2322 if `source` does not fit `target`.
    ///
    /// Like tsc, fresh object literals are checked for excess properties and
    /// blamed per property, object types missing required properties get
    /// TS2741/TS2739, and array literals assigned to an array type are
    /// elaborated per element when every element is a literal.
    fn check_assignable(&mut self, expression: &Expression<'_>, source: &Ty, target: &Ty, offset: u32) {
        if let (Expression::ObjectExpression(object), Ty::Record(shape)) = (expression, target) {
            if self.check_excess(object, target, shape) {
                return;
            }
        }
        if source.is_assignable_to(target, self.strict) {
            return;
        }
        if let (Expression::ObjectExpression(object), Ty::Record(_), Ty::Record(target_shape)) =
            (expression, source, target)
        {
            if self.elaborate_object(object, source, target_shape) {
                return;
            }
        }
        if let (Ty::Record(source_shape), Ty::Record(target_shape)) = (source, target) {
            let missing = target_shape.missing_from(source_shape);
            if !missing.is_empty() {
                self.report_missing(offset, source, target, &missing);
                return;
            }
        }
        if let (Expression::ArrayExpression(array), Ty::Array(element_target)) = (expression, target) {
            let literals: Option<Vec<(u32, Ty)>> = array
                .elements
                .iter()
                .map(|element| {
                    let expression = element.as_expression()?;
                    literal_type(expression).map(|ty| (expression.span().start, ty))
                })
                .collect();
            if let Some(literals) = literals {
                for (element_offset, ty) in literals {
                    if !ty.is_assignable_to(element_target, self.strict) {
                        self.report(NOT_ASSIGNABLE, element_offset, mismatch(&ty, element_target));
                    }
                }
                return;
            }
        }
        self.report(NOT_ASSIGNABLE, offset, mismatch(source, target));
    }

    /// Report the first property of a fresh object literal that `target`
    /// does not declare.
    fn check_excess(&mut self, object: &ObjectExpression<'_>, target: &Ty, shape: &Shape) -> bool {
        let excess = object.properties.iter().find_map(|property| match property {
            ObjectPropertyKind::ObjectProperty(property) if !property.computed => {
                let name = property.key.static_name()?;
                shape
                    .property(&name)
                    .is_none()
                    .then(|| (name.into_owned(), property.key.span().start))
            }
            _ => None,
        });
        let Some((name, offset)) = excess else {
            return false;
        };
        self.report(
            EXCESS_PROPERTY,
            offset,
            MessageChain::new(format!(
                "Object literal may only specify known properties, and '{}' does not exist in type '{}'.",
                name, target
            )),
        );
        true
    }

    /// Report mismatching properties of an object literal at their keys.
    ///
    /// Returns `false` if no property could be blamed.
    fn elaborate_object(&mut self, object: &ObjectExpression<'_>, source: &Ty, target: &Shape) -> bool {
        let Ty::Record(source) = source else {
            return false;
        };
        let before = self.findings.len();
        for property in &object.properties {
            let ObjectPropertyKind::ObjectProperty(property) = property else {
                continue;
            };
            let Some(name) = property.key.static_name() else {
                continue;
            };
            let (Some(found), Some(expected)) = (source.property(&name), target.property(&name))
            else {
                continue;
            };
            let expected = expected.read_type();
            if !found.ty.is_assignable_to(&expected, self.strict) {
                self.check_assignable(&property.value, &found.ty, &expected, property.key.span().start);
            }
        }
        self.findings.len() > before
    }

    fn report_missing(&mut self, offset: u32, source: &Ty, target: &Ty, missing: &[&str]) {
        let (code, message) = match missing {
            [name] => (
                PROPERTY_MISSING,
                format!(
                    "Property '{}' is missing in type '{}' but required in type '{}'.",
                    name, source, target
                ),
            ),
            names if names.len() <= 4 => (
                PROPERTIES_MISSING,
                format!(
                    "Type '{}' is missing the following properties from type '{}': {}",
                    source,
                    target,
                    names.join(", ")
                ),
            ),
            names => (
                PROPERTIES_MISSING_MORE,
                format!(
                    "Type '{}' is missing the following properties from type '{}': {}, and {} more.",
                    source,
                    target,
                    names[..4].join(", "),
                    names.len() - 4
                ),
            ),
        };
        self.report(code, offset, MessageChain::new(message));
    }

    // Types

    fn resolve(&self, ty: &TSType<'_>) -> Ty {
        match ty {
            TSType::TSAnyKeyword(_) => Ty::Any,
            TSType::TSUnknownKeyword(_) => Ty::Unknown,
            TSType::TSNumberKeyword(_) => Ty::Number,
            TSType::TSStringKeyword(_) => Ty::String,
            TSType::TSBooleanKeyword(_) => Ty::Boolean,
            TSType::TSBigIntKeyword(_) => Ty::BigInt,
            TSType::TSSymbolKeyword(_) => Ty::Symbol,
            TSType::TSNullKeyword(_) => Ty::Null,
            TSType::TSUndefinedKeyword(_) => Ty::Undefined,
            TSType::TSVoidKeyword(_) => Ty::Void,
            TSType::TSNeverKeyword(_) => Ty::Never,
            TSType::TSObjectKeyword(_) => Ty::Object,
            TSType::TSArrayType(array) => Ty::Array(Box::new(self.resolve(&array.element_type))),
            TSType::TSUnionType(union) => Ty::union(union.types.iter().map(|t| self.resolve(t))),
            TSType::TSParenthesizedType(inner) => self.resolve(&inner.type_annotation),
            TSType::TSTypeLiteral(literal) => self.shape(None, &literal.members),
            TSType::TSTypeReference(reference) => match &reference.type_name {
                TSTypeName::IdentifierReference(ident) if reference.type_parameters.is_none() => {
                    self.lookup_type(ident.name.as_str()).unwrap_or(Ty::Any)
                }
                _ => Ty::Any,
            },
            _ => Ty::Any,
        }
    }

    /// Object type from property and method signatures. Index, call and
    /// construct signatures, accessors and computed keys are not modelled.
    fn shape(&self, name: Option<&str>, members: &[TSSignature<'_>]) -> Ty {
        let mut properties = Vec::with_capacity(members.len());
        for member in members {
            let (key, ty, optional) = match member {
                TSSignature::TSPropertySignature(signature) if !signature.computed => (
                    signature.key.static_name(),
                    signature
                        .type_annotation
                        .as_deref()
                        .map_or(Ty::Any, |annotation| self.resolve(&annotation.type_annotation)),
                    signature.optional,
                ),
                TSSignature::TSMethodSignature(method)
                    if !method.computed && method.kind == TSMethodSignatureKind::Method =>
                {
                    let signature = self.signature(&method.params, method.return_type.as_deref());
                    (method.key.static_name(), Ty::Function(Rc::new(signature)), method.optional)
                }
                _ => return Ty::Any,
            };
            let Some(key) = key else {
                return Ty::Any;
            };
            properties.push(Property {
                name: key.into_owned(),
                ty,
                optional,
            });
        }
        Ty::Record(Rc::new(Shape {
            name: name.map(str::to_string),
            properties,
        }))
    }

    fn interface(&self, interface: &TSInterfaceDeclaration<'_>) -> Ty {
        if interface.type_parameters.is_some() {
            return Ty::Any;
        }
        let mut inherited: Vec<Property> = Vec::new();
        if let Some(extends) = &interface.extends {
            for heritage in extends.iter() {
                let parent = match &heritage.expression {
                    Expression::Identifier(ident) if heritage.type_parameters.is_none() => {
                        self.lookup_type(ident.name.as_str())
                    }
                    _ => None,
                };
                let Some(Ty::Record(parent)) = parent else {
                    return Ty::Any;
                };
                inherited.extend(parent.properties.iter().cloned());
            }
        }

        let Ty::Record(own) = self.shape(Some(interface.id.name.as_str()), &interface.body.body) else {
            return Ty::Any;
        };
        let mut properties = own.properties.clone();
        for property in inherited {
            if own.property(&property.name).is_none() {
                properties.push(property);
            }
        }
        Ty::Record(Rc::new(Shape {
            name: own.name.clone(),
            properties,
        }))
    }

    fn alias(&self, alias: &TSTypeAliasDeclaration<'_>) -> Ty {
        if alias.type_parameters.is_some() {
            return Ty::Any;
        }
        match self.resolve(&alias.type_annotation) {
            Ty::Record(shape) if shape.name.is_none() => Ty::Record(Rc::new(Shape {
                name: Some(alias.id.name.to_string()),
                properties: shape.properties.clone(),
            })),
            other => other,
        }
    }
}

/// Type of a literal that cannot contain nested findings.
fn literal_type(expression: &Expression<'_>) -> Option<Ty> {
    match expression {
        Expression::NumericLiteral(_) => Some(Ty::Number),
        Expression::StringLiteral(_) => Some(Ty::String),
        Expression::BooleanLiteral(_) => Some(Ty::Boolean),
        Expression::NullLiteral(_) => Some(Ty::Null),
        Expression::BigIntLiteral(_) => Some(Ty::BigInt),
        Expression::TemplateLiteral(template) if template.expressions.is_empty() => Some(Ty::String),
        _ => None,
    }
}

/// Type given to an unannotated binding from its initializer.
///
/// `null`, `undefined` and `[]` initializers evolve in tsc; treat them as `any`.
fn binding_type(inferred: Ty) -> Ty {
    match inferred {
        Ty::Null | Ty::Undefined | Ty::Never => Ty::Any,
        other => other,
    }
}

fn mismatch(source: &Ty, target: &Ty) -> MessageChain {
    let head = MessageChain::new(format!(
        "Type '{}' is not assignable to type '{}'.",
        source, target
    ));
    match (source, target) {
        (Ty::Array(source), Ty::Array(target)) => head.with_next(mismatch(source, target)),
        (Ty::Record(source_shape), Ty::Record(target_shape)) => {
            match target_shape.incompatible_with(source_shape, true) {
                Some((found, expected)) => head.with_next(
                    MessageChain::new(format!(
                        "Types of property '{}' are incompatible.",
                        expected.name
                    ))
                    .with_next(mismatch(found, &expected.read_type())),
                ),
                None => head,
            }
        }
        _ => head,
    }
}

fn requires_return(ret: &Ty) -> bool {
    match ret {
        Ty::Any | Ty::Unknown | Ty::Void | Ty::Undefined | Ty::Never => false,
        Ty::Union(members) => members.iter().all(requires_return),
        _ => true,
    }
}

/// Check if a body contains a `return` or `throw` outside nested functions.
fn always_exits(statements: &[Statement<'_>]) -> bool {
    statements.iter().any(|statement| match statement {
        Statement::ReturnStatement(_) | Statement::ThrowStatement(_) => true,
        Statement::BlockStatement(block) => always_exits(&block.body),
        Statement::IfStatement(statement) => {
            always_exits(std::slice::from_ref(&statement.consequent))
                || statement
                    .alternate
                    .as_ref()
                    .is_some_and(|alternate| always_exits(std::slice::from_ref(alternate)))
        }
        Statement::ForStatement(statement) => always_exits(std::slice::from_ref(&statement.body)),
        Statement::ForOfStatement(statement) => always_exits(std::slice::from_ref(&statement.body)),
        Statement::ForInStatement(statement) => always_exits(std::slice::from_ref(&statement.body)),
        Statement::WhileStatement(statement) => always_exits(std::slice::from_ref(&statement.body)),
        Statement::DoWhileStatement(statement) => always_exits(std::slice::from_ref(&statement.body)),
        Statement::LabeledStatement(statement) => always_exits(std::slice::from_ref(&statement.body)),
        Statement::TryStatement(statement) => {
            always_exits(&statement.block.body)
                || statement
                    .handler
                    .as_ref()
                    .is_some_and(|handler| always_exits(&handler.body.body))
                || statement
                    .finalizer
                    .as_ref()
                    .is_some_and(|finalizer| always_exits(&finalizer.body))
        }
        Statement::SwitchStatement(statement) => statement
            .cases
            .iter()
            .any(|case| always_exits(&case.consequent)),
        _ => false,
    })
}
