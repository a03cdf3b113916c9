//! Identifier renaming, applying the Name Scrambler across the AST.
//!
//! This runs outside the fixed seven-pass order that runs comment strip
//! through statement shuffle: renaming mutates leaf string fields (`Variable.name`,
//! `FunctionDecl.name`, ...) in place rather than replacing or reordering nodes, so it
//! has none of the structural-edit concerns the Parent Tracker and AST Replacer exist
//! for. It runs once, before the structural passes, so that later passes (in
//! particular the array-access and arithmetic rewriters, which synthesize new
//! `Name`/`Variable` nodes of their own) never see a name get renamed out from under
//! them after the fact.
//!
//! Renaming is per-identifier-name, not per-binding (cross-file symbol resolution is
//! out of scope): within one file, every call-site/read-site whose text matches
//! a name *declared* in this same file is renamed identically to the declaration.
//! Calls to names never declared in the file (built-in functions, external library
//! functions) are left alone, since nothing here performs the symbol resolution that
//! would be needed to tell a user function from a built-in by name alone. Variables
//! need no such declared-set: every `$name` occurrence is renamed unconditionally
//! (the scrambler's always-ignored superglobal/magic-name rules still apply).
//!
//! This grammar has no `goto`/label construct, so the Label category is carried in
//! configuration for completeness but never has anything to rename.
//!
//! Class constant *reads* (`Class::NAME`) are not a distinct expression this parser
//! produces — only static *method calls* parse through `::` — so class-constant
//! renaming only reaches the declaration (`ClassConst.name`), never a read site; this
//! is a grammar limitation, not a renaming-logic gap.

use crate::config::IdentifierConfig;
use crate::context::ObfuscationContext;
use phpmix_scrambler::Category;
use phpmix_syntax::ast::*;
use std::collections::HashSet;

#[derive(Default)]
struct Declared {
    functions: HashSet<String>,
    methods: HashSet<String>,
    properties: HashSet<String>,
    global_constants: HashSet<String>,
}

pub fn run(program: &mut Program, cfg: &IdentifierConfig, ctx: &mut ObfuscationContext) {
    let mut declared = Declared::default();
    collect_declared_statements(&program.statements, &mut declared);

    for statement in &mut program.statements {
        rename_statement(statement, cfg, ctx, &declared);
    }
}

fn collect_declared_statements(statements: &[Statement], declared: &mut Declared) {
    for statement in statements {
        match statement {
            Statement::Function(f) => {
                declared.functions.insert(f.name.clone());
                collect_declared_statements(&f.body.statements, declared);
            }
            Statement::Class(c) => {
                for method in &c.methods {
                    declared.methods.insert(method.name.clone());
                }
                for property in &c.properties {
                    declared.properties.insert(property.name.clone());
                }
            }
            Statement::Expression(s) => collect_declared_expression(&s.expression, declared),
            Statement::Block(b) => collect_declared_statements(&b.statements, declared),
            Statement::If(i) => {
                collect_declared_statements(&i.then.statements, declared);
                for (_, body) in &i.else_ifs {
                    collect_declared_statements(&body.statements, declared);
                }
                if let Some(otherwise) = &i.otherwise {
                    collect_declared_statements(&otherwise.statements, declared);
                }
            }
            Statement::While(w) => collect_declared_statements(&w.body.statements, declared),
            Statement::DoWhile(d) => collect_declared_statements(&d.body.statements, declared),
            Statement::For(f) => collect_declared_statements(&f.body.statements, declared),
            Statement::Foreach(f) => collect_declared_statements(&f.body.statements, declared),
            Statement::Switch(s) => {
                for case in &s.cases {
                    collect_declared_statements(&case.body, declared);
                }
            }
            _ => {}
        }
    }
}

/// Recognizes `define('NAME', value)` call statements, the only way this grammar can
/// observe a global constant being introduced (there is no dedicated `const`
/// top-level statement in this AST).
fn collect_declared_expression(expression: &Expression, declared: &mut Declared) {
    if let Expression::Call(call) = expression {
        if let CallTarget::Function(name) = &call.target {
            if name.value == "define" {
                if let Some(Expression::Literal(Literal::String { value, .. })) = call.arguments.first() {
                    declared.global_constants.insert(value.clone());
                }
            }
        }
    }
}

fn rename_statement(statement: &mut Statement, cfg: &IdentifierConfig, ctx: &mut ObfuscationContext, declared: &Declared) {
    match statement {
        Statement::Block(b) => rename_statements(&mut b.statements, cfg, ctx, declared),
        Statement::Expression(s) => rename_expression(&mut s.expression, cfg, ctx, declared),
        Statement::Echo(s) => {
            for value in &mut s.values {
                rename_expression(value, cfg, ctx, declared);
            }
        }
        Statement::Function(f) => {
            if cfg.function {
                f.name = ctx.scrambler(Category::Function).scramble(&f.name);
            }
            for param in &mut f.params {
                if let Some(default) = &mut param.default {
                    rename_expression(default, cfg, ctx, declared);
                }
            }
            rename_statements(&mut f.body.statements, cfg, ctx, declared);
        }
        Statement::Class(c) => {
            for constant in &mut c.consts {
                if cfg.class_constant {
                    constant.name = ctx.scrambler(Category::ClassConstant).scramble(&constant.name);
                }
                rename_expression(&mut constant.value, cfg, ctx, declared);
            }
            for property in &mut c.properties {
                if cfg.property {
                    property.name = ctx.scrambler(Category::Property).scramble(&property.name);
                }
                if let Some(default) = &mut property.default {
                    rename_expression(default, cfg, ctx, declared);
                }
            }
            for method in &mut c.methods {
                if cfg.method {
                    method.name = ctx.scrambler(Category::Method).scramble(&method.name);
                }
                for param in &mut method.params {
                    if let Some(default) = &mut param.default {
                        rename_expression(default, cfg, ctx, declared);
                    }
                }
                if let Some(body) = &mut method.body {
                    rename_statements(&mut body.statements, cfg, ctx, declared);
                }
            }
        }
        Statement::If(i) => {
            rename_expression(&mut i.condition, cfg, ctx, declared);
            rename_statements(&mut i.then.statements, cfg, ctx, declared);
            for (condition, body) in &mut i.else_ifs {
                rename_expression(condition, cfg, ctx, declared);
                rename_statements(&mut body.statements, cfg, ctx, declared);
            }
            if let Some(otherwise) = &mut i.otherwise {
                rename_statements(&mut otherwise.statements, cfg, ctx, declared);
            }
        }
        Statement::While(w) => {
            rename_expression(&mut w.condition, cfg, ctx, declared);
            rename_statements(&mut w.body.statements, cfg, ctx, declared);
        }
        Statement::DoWhile(d) => {
            rename_statements(&mut d.body.statements, cfg, ctx, declared);
            rename_expression(&mut d.condition, cfg, ctx, declared);
        }
        Statement::For(f) => {
            for e in f.init.iter_mut().chain(f.condition.iter_mut()).chain(f.step.iter_mut()) {
                rename_expression(e, cfg, ctx, declared);
            }
            rename_statements(&mut f.body.statements, cfg, ctx, declared);
        }
        Statement::Foreach(f) => {
            rename_expression(&mut f.subject, cfg, ctx, declared);
            if let Some(key) = &mut f.key {
                rename_expression(key, cfg, ctx, declared);
            }
            rename_expression(&mut f.value, cfg, ctx, declared);
            rename_statements(&mut f.body.statements, cfg, ctx, declared);
        }
        Statement::Switch(s) => {
            rename_expression(&mut s.subject, cfg, ctx, declared);
            for case in &mut s.cases {
                if let Some(test) = &mut case.test {
                    rename_expression(test, cfg, ctx, declared);
                }
                rename_statements(&mut case.body, cfg, ctx, declared);
            }
        }
        Statement::Return(r) => {
            if let Some(value) = &mut r.value {
                rename_expression(value, cfg, ctx, declared);
            }
        }
        Statement::Break(_) | Statement::Continue(_) | Statement::Global(_) | Statement::InlineHtml(_) | Statement::Noop(_, _) => {}
    }
}

fn rename_statements(statements: &mut Vec<Statement>, cfg: &IdentifierConfig, ctx: &mut ObfuscationContext, declared: &Declared) {
    for statement in statements {
        rename_statement(statement, cfg, ctx, declared);
    }
}

fn rename_expression(expression: &mut Expression, cfg: &IdentifierConfig, ctx: &mut ObfuscationContext, declared: &Declared) {
    match expression {
        Expression::Literal(_) => {}
        Expression::Variable(v) => {
            if cfg.variable {
                v.name = ctx.scrambler(Category::Variable).scramble(&v.name);
            }
        }
        Expression::Name(n) => {
            if cfg.global_constant && declared.global_constants.contains(&n.value) {
                n.value = ctx.scrambler(Category::GlobalConstant).scramble(&n.value);
            }
        }
        Expression::InterpolatedString(s) => {
            for part in &mut s.parts {
                match part {
                    StringPart::Variable(v) if cfg.variable => {
                        v.name = ctx.scrambler(Category::Variable).scramble(&v.name);
                    }
                    StringPart::BracedExpression(inner) => rename_expression(inner, cfg, ctx, declared),
                    _ => {}
                }
            }
        }
        Expression::Assignment(a) => {
            rename_expression(&mut a.target, cfg, ctx, declared);
            rename_expression(&mut a.value, cfg, ctx, declared);
        }
        Expression::Binary(b) => {
            rename_expression(&mut b.lhs, cfg, ctx, declared);
            rename_expression(&mut b.rhs, cfg, ctx, declared);
        }
        Expression::Unary(u) => rename_expression(&mut u.operand, cfg, ctx, declared),
        Expression::IncDec(i) => rename_expression(&mut i.operand, cfg, ctx, declared),
        Expression::Call(call) => {
            match &mut call.target {
                CallTarget::Function(name) => {
                    // Rewriting the 'NAME' string literal argument of a recognized
                    // `define()` call keeps the registered constant's text in sync
                    // with the renamed read sites.
                    if name.value == "define" && cfg.global_constant {
                        if let Some(Expression::Literal(Literal::String { value, .. })) = call.arguments.first_mut() {
                            if declared.global_constants.contains(value.as_str()) {
                                *value = ctx.scrambler(Category::GlobalConstant).scramble(value);
                            }
                        }
                    } else if cfg.function && declared.functions.contains(&name.value) {
                        name.value = ctx.scrambler(Category::Function).scramble(&name.value);
                    }
                }
                CallTarget::Method { object, name } => {
                    rename_expression(object, cfg, ctx, declared);
                    if cfg.method && declared.methods.contains(name.as_str()) {
                        *name = ctx.scrambler(Category::Method).scramble(name);
                    }
                }
                CallTarget::StaticMethod { name, .. } => {
                    if cfg.method && declared.methods.contains(name.as_str()) {
                        *name = ctx.scrambler(Category::Method).scramble(name);
                    }
                }
            }
            for argument in &mut call.arguments {
                rename_expression(argument, cfg, ctx, declared);
            }
        }
        Expression::PropertyAccess(p) => {
            rename_expression(&mut p.object, cfg, ctx, declared);
            if cfg.property && declared.properties.contains(&p.name) {
                p.name = ctx.scrambler(Category::Property).scramble(&p.name);
            }
        }
        Expression::ArrayAccess(a) => {
            rename_expression(&mut a.array, cfg, ctx, declared);
            rename_expression(&mut a.index, cfg, ctx, declared);
        }
        Expression::Array(a) => {
            for element in &mut a.elements {
                if let Some(key) = &mut element.key {
                    rename_expression(key, cfg, ctx, declared);
                }
                rename_expression(&mut element.value, cfg, ctx, declared);
            }
        }
        Expression::Ternary(t) => {
            rename_expression(&mut t.condition, cfg, ctx, declared);
            if let Some(then) = &mut t.then {
                rename_expression(then, cfg, ctx, declared);
            }
            rename_expression(&mut t.otherwise, cfg, ctx, declared);
        }
        Expression::Isset(i) => {
            for v in &mut i.variables {
                rename_expression(v, cfg, ctx, declared);
            }
        }
        Expression::Unset(u) => {
            for v in &mut u.variables {
                rename_expression(v, cfg, ctx, declared);
            }
        }
        Expression::Empty(e) => rename_expression(&mut e.value, cfg, ctx, declared),
        Expression::Parenthesized(inner) => rename_expression(inner, cfg, ctx, declared),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObfuscatorConfig;
    use phpmix_syntax::parser::parse;
    use phpmix_syntax::printer::print_program;

    #[test]
    fn renames_declared_function_and_its_call_site_identically() {
        let mut result = parse("<?php function greet(){ echo 1; } greet();");
        let mut ctx = ObfuscationContext::new(ObfuscatorConfig::default());
        let cfg = ctx.config.identifiers.clone();
        run(&mut result.program, &cfg, &mut ctx);
        let out = print_program(&result.program);
        assert!(!out.contains("greet"), "{out}");
        let decl_name = out.split("function ").nth(1).unwrap().split('(').next().unwrap();
        assert!(out.contains(&format!("{decl_name}();")), "{out}");
    }

    #[test]
    fn leaves_builtin_function_calls_alone() {
        let mut result = parse(r#"<?php strlen($x);"#);
        let mut ctx = ObfuscationContext::new(ObfuscatorConfig::default());
        let cfg = ctx.config.identifiers.clone();
        run(&mut result.program, &cfg, &mut ctx);
        let out = print_program(&result.program);
        assert!(out.contains("strlen("), "{out}");
    }
}
