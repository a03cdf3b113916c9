//! AST Replacer: applies a queue of `(old, new)` pairs.
//!
//! A zipper-style functional rewrite would be an acceptable alternative to replaying
//! replacements through the parent-tracker side table, since it eliminates the
//! parent table entirely. That's the shape used here: a single downward pass over
//! the *original* tree substitutes each node as it's reached, and simply never
//! descends into a just-substituted subtree. That gives the rule that a later
//! replacement whose target lies inside an earlier replacement's new subtree is
//! silently dropped, for free, since such a target is never visited.

use phpmix_syntax::ast::*;
use std::collections::HashMap;

#[derive(Default)]
pub struct ReplacementQueue {
    /// A statement id maps to zero or more replacement statements: empty removes it,
    /// one substitutes it, more than one splices extra statements in (dead/junk
    /// injection, or a shuffled run being spliced back in as a unit).
    statements: HashMap<NodeId, Vec<Statement>>,
    expressions: HashMap<NodeId, Expression>,
}

impl ReplacementQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty() && self.expressions.is_empty()
    }

    pub fn replace_statement(&mut self, old: NodeId, new: Statement) {
        self.statements.insert(old, vec![new]);
    }

    pub fn splice_statements(&mut self, old: NodeId, new: Vec<Statement>) {
        self.statements.insert(old, new);
    }

    pub fn remove_statement(&mut self, old: NodeId) {
        self.statements.insert(old, Vec::new());
    }

    pub fn replace_expression(&mut self, old: NodeId, new: Expression) {
        self.expressions.insert(old, new);
    }
}

pub struct Replacer;

impl Replacer {
    pub fn apply(queue: ReplacementQueue, program: &mut Program) {
        if queue.is_empty() {
            return;
        }
        apply_statements(&queue, &mut program.statements);
    }
}

fn apply_statements(queue: &ReplacementQueue, statements: &mut Vec<Statement>) {
    let mut rebuilt = Vec::with_capacity(statements.len());
    for mut statement in std::mem::take(statements) {
        if let Some(replacement) = queue.statements.get(&statement.id()) {
            rebuilt.extend(replacement.iter().cloned());
            continue;
        }
        apply_statement_children(queue, &mut statement);
        rebuilt.push(statement);
    }
    *statements = rebuilt;
}

fn apply_statement_children(queue: &ReplacementQueue, statement: &mut Statement) {
    match statement {
        Statement::Block(b) => apply_statements(queue, &mut b.statements),
        Statement::Expression(s) => apply_expression(queue, &mut s.expression),
        Statement::Echo(s) => {
            for value in &mut s.values {
                apply_expression(queue, value);
            }
        }
        Statement::Function(f) => {
            for param in &mut f.params {
                if let Some(default) = &mut param.default {
                    apply_expression(queue, default);
                }
            }
            apply_statements(queue, &mut f.body.statements);
        }
        Statement::Class(c) => {
            for constant in &mut c.consts {
                apply_expression(queue, &mut constant.value);
            }
            for property in &mut c.properties {
                if let Some(default) = &mut property.default {
                    apply_expression(queue, default);
                }
            }
            for method in &mut c.methods {
                for param in &mut method.params {
                    if let Some(default) = &mut param.default {
                        apply_expression(queue, default);
                    }
                }
                if let Some(body) = &mut method.body {
                    apply_statements(queue, &mut body.statements);
                }
            }
        }
        Statement::If(i) => {
            apply_expression(queue, &mut i.condition);
            apply_statements(queue, &mut i.then.statements);
            for (condition, body) in &mut i.else_ifs {
                apply_expression(queue, condition);
                apply_statements(queue, &mut body.statements);
            }
            if let Some(otherwise) = &mut i.otherwise {
                apply_statements(queue, &mut otherwise.statements);
            }
        }
        Statement::While(w) => {
            apply_expression(queue, &mut w.condition);
            apply_statements(queue, &mut w.body.statements);
        }
        Statement::DoWhile(d) => {
            apply_statements(queue, &mut d.body.statements);
            apply_expression(queue, &mut d.condition);
        }
        Statement::For(f) => {
            for e in f.init.iter_mut().chain(f.condition.iter_mut()).chain(f.step.iter_mut()) {
                apply_expression(queue, e);
            }
            apply_statements(queue, &mut f.body.statements);
        }
        Statement::Foreach(f) => {
            apply_expression(queue, &mut f.subject);
            if let Some(key) = &mut f.key {
                apply_expression(queue, key);
            }
            apply_expression(queue, &mut f.value);
            apply_statements(queue, &mut f.body.statements);
        }
        Statement::Switch(s) => {
            apply_expression(queue, &mut s.subject);
            for case in &mut s.cases {
                if let Some(test) = &mut case.test {
                    apply_expression(queue, test);
                }
                apply_statements(queue, &mut case.body);
            }
        }
        Statement::Return(r) => {
            if let Some(value) = &mut r.value {
                apply_expression(queue, value);
            }
        }
        Statement::Break(_) | Statement::Continue(_) | Statement::Global(_) | Statement::InlineHtml(_) | Statement::Noop(_, _) => {}
    }
}

fn apply_expression(queue: &ReplacementQueue, expression: &mut Expression) {
    if let Some(replacement) = queue.expressions.get(&expression.id()) {
        *expression = replacement.clone();
        return;
    }
    match expression {
        Expression::Literal(_) | Expression::Variable(_) | Expression::Name(_) => {}
        Expression::InterpolatedString(s) => {
            for part in &mut s.parts {
                if let StringPart::BracedExpression(inner) = part {
                    apply_expression(queue, inner);
                }
            }
        }
        Expression::Assignment(a) => {
            apply_expression(queue, &mut a.target);
            apply_expression(queue, &mut a.value);
        }
        Expression::Binary(b) => {
            apply_expression(queue, &mut b.lhs);
            apply_expression(queue, &mut b.rhs);
        }
        Expression::Unary(u) => apply_expression(queue, &mut u.operand),
        Expression::IncDec(i) => apply_expression(queue, &mut i.operand),
        Expression::Call(c) => {
            if let CallTarget::Method { object, .. } = &mut c.target {
                apply_expression(queue, object);
            }
            for argument in &mut c.arguments {
                apply_expression(queue, argument);
            }
        }
        Expression::PropertyAccess(p) => apply_expression(queue, &mut p.object),
        Expression::ArrayAccess(a) => {
            apply_expression(queue, &mut a.array);
            apply_expression(queue, &mut a.index);
        }
        Expression::Array(a) => {
            for element in &mut a.elements {
                if let Some(key) = &mut element.key {
                    apply_expression(queue, key);
                }
                apply_expression(queue, &mut element.value);
            }
        }
        Expression::Ternary(t) => {
            apply_expression(queue, &mut t.condition);
            if let Some(then) = &mut t.then {
                apply_expression(queue, then);
            }
            apply_expression(queue, &mut t.otherwise);
        }
        Expression::Isset(i) => {
            for v in &mut i.variables {
                apply_expression(queue, v);
            }
        }
        Expression::Unset(u) => {
            for v in &mut u.variables {
                apply_expression(queue, v);
            }
        }
        Expression::Empty(e) => apply_expression(queue, &mut e.value),
        Expression::Parenthesized(inner) => apply_expression(queue, inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phpmix_syntax::parser::parse;
    use phpmix_syntax::printer::print_program;

    #[test]
    fn replaces_single_expression_by_id() {
        let mut result = parse("<?php echo 1;");
        let Statement::Echo(echo) = &result.program.statements[0] else { panic!("expected echo") };
        let target_id = echo.values[0].id();

        let mut queue = ReplacementQueue::new();
        queue.replace_expression(
            target_id,
            Expression::Literal(Literal::Integer { id: 9999, span: Span::new(0, 0), raw: "2".to_string(), value: 2 }),
        );
        Replacer::apply(queue, &mut result.program);

        assert_eq!(print_program(&result.program), "<?php\necho 2;\n");
    }

    #[test]
    fn dropping_a_replacement_inside_a_replaced_subtree() {
        let mut result = parse("<?php echo 1 + 2;");
        let Statement::Echo(echo) = &result.program.statements[0] else { panic!("expected echo") };
        let Expression::Binary(binary) = &echo.values[0] else { panic!("expected binary") };
        let whole_id = binary.id;
        let lhs_id = binary.lhs.id();

        let mut queue = ReplacementQueue::new();
        queue.replace_expression(
            whole_id,
            Expression::Literal(Literal::Integer { id: 9998, span: Span::new(0, 0), raw: "3".to_string(), value: 3 }),
        );
        // This target lives inside the subtree `whole_id` just replaced; it must be
        // silently dropped rather than panicking or corrupting the new subtree.
        queue.replace_expression(
            lhs_id,
            Expression::Literal(Literal::Integer { id: 9997, span: Span::new(0, 0), raw: "100".to_string(), value: 100 }),
        );
        Replacer::apply(queue, &mut result.program);

        assert_eq!(print_program(&result.program), "<?php\necho 3;\n");
    }

    #[test]
    fn splices_extra_statements_around_a_target() {
        let mut result = parse("<?php echo 1;");
        let target_id = result.program.statements[0].id();

        let junk = Statement::Noop(42, Span::new(0, 0));
        let original = result.program.statements[0].clone();

        let mut queue = ReplacementQueue::new();
        queue.splice_statements(target_id, vec![junk, original]);
        Replacer::apply(queue, &mut result.program);

        assert_eq!(result.program.statements.len(), 2);
    }
}
