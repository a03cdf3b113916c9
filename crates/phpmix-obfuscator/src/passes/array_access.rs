//! Array-Access Rewriter: replaces subscript reads used as values with
//! `_phpmix_array_get` calls, via the Parent Tracker + AST Replacer rather
//! than a direct in-place mutation — this is the pass the two side-table crates exist
//! for, since "is this a value read or an assignment target" is exactly a parent-slot
//! question.

use crate::config::ArrayAccessConfig;
use crate::context::ObfuscationContext;
use crate::ids::NodeIdGen;
use phpmix_rewrite::{ParentTracker, ReplacementQueue, Replacer, Slot};
use phpmix_syntax::ast::*;
use phpmix_syntax::token::Span;

pub fn run(program: &mut Program, cfg: &ArrayAccessConfig, ctx: &mut ObfuscationContext, ids: &mut NodeIdGen) {
    if !cfg.enabled {
        return;
    }

    let tracker = ParentTracker::build(program);
    let mut queue = ReplacementQueue::new();
    let mut found_any = false;
    for statement in &program.statements {
        collect_statement(statement, &tracker, &mut queue, ids, &mut found_any);
    }

    if found_any {
        ctx.mark_needs_array_access_helper();
    }
    Replacer::apply(queue, program);
}

/// True if `id` is a subscript that must be left alone: a direct assignment target,
/// or the base of a chain of subscripts whose outermost link is an assignment target
/// (`$a[0][1] = x` must not touch `$a[0]` either, since the whole chain is an lvalue
/// path). Also excludes `unset`/`isset` operands, which read-or-presence-test rather
/// than "read the value", and pre/post increment/decrement operands.
fn is_excluded(tracker: &ParentTracker, mut id: NodeId) -> bool {
    loop {
        match tracker.parent_of(id) {
            Some(info) if info.slot == Slot::AssignmentTarget => return true,
            Some(info) if info.slot == Slot::ArrayAccessBase => id = info.parent,
            Some(info) if matches!(info.slot, Slot::UnsetVariable | Slot::IssetVariable | Slot::IncDecOperand) => return true,
            _ => return false,
        }
    }
}

fn queue_array_access(a: &ArrayAccess, tracker: &ParentTracker, queue: &mut ReplacementQueue, ids: &mut NodeIdGen, found_any: &mut bool) {
    if is_excluded(tracker, a.id) {
        return;
    }
    let name = Name { id: ids.fresh(), span: Span::new(0, 0), value: "_phpmix_array_get".to_string() };
    let call = Expression::Call(Call {
        id: ids.fresh(),
        span: Span::new(0, 0),
        target: CallTarget::Function(name),
        arguments: vec![(*a.array).clone(), (*a.index).clone()],
    });
    queue.replace_expression(a.id, call);
    *found_any = true;
}

fn collect_statement(statement: &Statement, tracker: &ParentTracker, queue: &mut ReplacementQueue, ids: &mut NodeIdGen, found_any: &mut bool) {
    match statement {
        Statement::Block(b) => {
            for s in &b.statements {
                collect_statement(s, tracker, queue, ids, found_any);
            }
        }
        Statement::Expression(s) => collect_expression(&s.expression, tracker, queue, ids, found_any),
        Statement::Echo(s) => {
            for value in &s.values {
                collect_expression(value, tracker, queue, ids, found_any);
            }
        }
        Statement::Function(f) => {
            for param in &f.params {
                if let Some(default) = &param.default {
                    collect_expression(default, tracker, queue, ids, found_any);
                }
            }
            for s in &f.body.statements {
                collect_statement(s, tracker, queue, ids, found_any);
            }
        }
        Statement::Class(c) => {
            for constant in &c.consts {
                collect_expression(&constant.value, tracker, queue, ids, found_any);
            }
            for property in &c.properties {
                if let Some(default) = &property.default {
                    collect_expression(default, tracker, queue, ids, found_any);
                }
            }
            for method in &c.methods {
                for param in &method.params {
                    if let Some(default) = &param.default {
                        collect_expression(default, tracker, queue, ids, found_any);
                    }
                }
                if let Some(body) = &method.body {
                    for s in &body.statements {
                        collect_statement(s, tracker, queue, ids, found_any);
                    }
                }
            }
        }
        Statement::If(i) => {
            collect_expression(&i.condition, tracker, queue, ids, found_any);
            for s in &i.then.statements {
                collect_statement(s, tracker, queue, ids, found_any);
            }
            for (cond, body) in &i.else_ifs {
                collect_expression(cond, tracker, queue, ids, found_any);
                for s in &body.statements {
                    collect_statement(s, tracker, queue, ids, found_any);
                }
            }
            if let Some(otherwise) = &i.otherwise {
                for s in &otherwise.statements {
                    collect_statement(s, tracker, queue, ids, found_any);
                }
            }
        }
        Statement::While(w) => {
            collect_expression(&w.condition, tracker, queue, ids, found_any);
            for s in &w.body.statements {
                collect_statement(s, tracker, queue, ids, found_any);
            }
        }
        Statement::DoWhile(d) => {
            for s in &d.body.statements {
                collect_statement(s, tracker, queue, ids, found_any);
            }
            collect_expression(&d.condition, tracker, queue, ids, found_any);
        }
        Statement::For(f) => {
            for e in f.init.iter().chain(f.condition.iter()).chain(f.step.iter()) {
                collect_expression(e, tracker, queue, ids, found_any);
            }
            for s in &f.body.statements {
                collect_statement(s, tracker, queue, ids, found_any);
            }
        }
        Statement::Foreach(f) => {
            collect_expression(&f.subject, tracker, queue, ids, found_any);
            if let Some(key) = &f.key {
                collect_expression(key, tracker, queue, ids, found_any);
            }
            collect_expression(&f.value, tracker, queue, ids, found_any);
            for s in &f.body.statements {
                collect_statement(s, tracker, queue, ids, found_any);
            }
        }
        Statement::Switch(s) => {
            collect_expression(&s.subject, tracker, queue, ids, found_any);
            for case in &s.cases {
                if let Some(test) = &case.test {
                    collect_expression(test, tracker, queue, ids, found_any);
                }
                for stmt in &case.body {
                    collect_statement(stmt, tracker, queue, ids, found_any);
                }
            }
        }
        Statement::Return(r) => {
            if let Some(value) = &r.value {
                collect_expression(value, tracker, queue, ids, found_any);
            }
        }
        Statement::Break(_) | Statement::Continue(_) | Statement::Global(_) | Statement::InlineHtml(_) | Statement::Noop(_, _) => {}
    }
}

fn collect_expression(expression: &Expression, tracker: &ParentTracker, queue: &mut ReplacementQueue, ids: &mut NodeIdGen, found_any: &mut bool) {
    match expression {
        Expression::Literal(_) | Expression::Variable(_) | Expression::Name(_) => {}
        Expression::InterpolatedString(s) => {
            for part in &s.parts {
                if let StringPart::BracedExpression(inner) = part {
                    collect_expression(inner, tracker, queue, ids, found_any);
                }
            }
        }
        Expression::Assignment(a) => {
            // The target is reached too (its own subscript chain handled by
            // `is_excluded`'s transitive check), but we still must recurse into the
            // value side.
            collect_expression(&a.target, tracker, queue, ids, found_any);
            collect_expression(&a.value, tracker, queue, ids, found_any);
        }
        Expression::Binary(b) => {
            collect_expression(&b.lhs, tracker, queue, ids, found_any);
            collect_expression(&b.rhs, tracker, queue, ids, found_any);
        }
        Expression::Unary(u) => collect_expression(&u.operand, tracker, queue, ids, found_any),
        Expression::IncDec(i) => collect_expression(&i.operand, tracker, queue, ids, found_any),
        Expression::Call(c) => {
            if let CallTarget::Method { object, .. } = &c.target {
                collect_expression(object, tracker, queue, ids, found_any);
            }
            for argument in &c.arguments {
                collect_expression(argument, tracker, queue, ids, found_any);
            }
        }
        Expression::PropertyAccess(p) => collect_expression(&p.object, tracker, queue, ids, found_any),
        Expression::ArrayAccess(a) => {
            collect_expression(&a.array, tracker, queue, ids, found_any);
            collect_expression(&a.index, tracker, queue, ids, found_any);
            queue_array_access(a, tracker, queue, ids, found_any);
        }
        Expression::Array(a) => {
            for element in &a.elements {
                if let Some(key) = &element.key {
                    collect_expression(key, tracker, queue, ids, found_any);
                }
                collect_expression(&element.value, tracker, queue, ids, found_any);
            }
        }
        Expression::Ternary(t) => {
            collect_expression(&t.condition, tracker, queue, ids, found_any);
            if let Some(then) = &t.then {
                collect_expression(then, tracker, queue, ids, found_any);
            }
            collect_expression(&t.otherwise, tracker, queue, ids, found_any);
        }
        Expression::Isset(i) => {
            for v in &i.variables {
                collect_expression(v, tracker, queue, ids, found_any);
            }
        }
        Expression::Unset(u) => {
            for v in &u.variables {
                collect_expression(v, tracker, queue, ids, found_any);
            }
        }
        Expression::Empty(e) => collect_expression(&e.value, tracker, queue, ids, found_any),
        Expression::Parenthesized(inner) => collect_expression(inner, tracker, queue, ids, found_any),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phpmix_syntax::parser::parse;
    use phpmix_syntax::printer::print_program;

    #[test]
    fn rewrites_subscript_read() {
        let mut result = parse("<?php echo $a[0];");
        let cfg = ArrayAccessConfig { enabled: true, force_helper: false };
        let mut ctx = ObfuscationContext::new(crate::config::ObfuscatorConfig::default());
        let mut ids = NodeIdGen::for_program(&result.program);
        run(&mut result.program, &cfg, &mut ctx, &mut ids);
        let out = print_program(&result.program);
        assert!(out.contains("_phpmix_array_get($a, 0)"), "{out}");
        assert!(ctx.needs_array_access_helper());
    }

    #[test]
    fn leaves_assignment_target_untouched() {
        let mut result = parse("<?php $a[0] = 1;");
        let cfg = ArrayAccessConfig { enabled: true, force_helper: false };
        let mut ctx = ObfuscationContext::new(crate::config::ObfuscatorConfig::default());
        let mut ids = NodeIdGen::for_program(&result.program);
        run(&mut result.program, &cfg, &mut ctx, &mut ids);
        let out = print_program(&result.program);
        assert!(out.contains("$a[0] = 1;"), "{out}");
    }
}
