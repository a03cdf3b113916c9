//! Mutable tree-walking visitor.
//!
//! Every obfuscation pass implements [`MutWalker`] and overrides just the hooks it
//! cares about; the default implementation of each hook recurses into the node's
//! children via the matching `walk_*` free function, so a pass that only needs to,
//! say, rewrite string literals does not have to re-implement traversal of `if`
//! statements, loops, function bodies, and so on.

use crate::ast::*;

pub trait MutWalker {
    fn visit_program(&mut self, program: &mut Program) {
        walk_statements(self, &mut program.statements);
    }

    fn visit_statement(&mut self, statement: &mut Statement) {
        walk_statement_children(self, statement);
    }

    fn visit_expression(&mut self, expression: &mut Expression) {
        walk_expression_children(self, expression);
    }
}

pub fn walk_statements<W: MutWalker + ?Sized>(walker: &mut W, statements: &mut Vec<Statement>) {
    for statement in statements.iter_mut() {
        walker.visit_statement(statement);
    }
}

pub fn walk_block<W: MutWalker + ?Sized>(walker: &mut W, block: &mut Block) {
    walk_statements(walker, &mut block.statements);
}

pub fn walk_expressions<W: MutWalker + ?Sized>(walker: &mut W, expressions: &mut [Expression]) {
    for expression in expressions.iter_mut() {
        walker.visit_expression(expression);
    }
}

/// Recurses into a statement's children, invoking `visit_statement`/`visit_expression`
/// on each. Call this from an overridden `visit_statement` after handling the node
/// itself, to continue the traversal downward.
pub fn walk_statement_children<W: MutWalker + ?Sized>(walker: &mut W, statement: &mut Statement) {
    match statement {
        Statement::Block(block) => walk_block(walker, block),
        Statement::Expression(s) => walker.visit_expression(&mut s.expression),
        Statement::Echo(s) => walk_expressions(walker, &mut s.values),
        Statement::Function(f) => {
            for param in &mut f.params {
                if let Some(default) = &mut param.default {
                    walker.visit_expression(default);
                }
            }
            walk_block(walker, &mut f.body);
        }
        Statement::Class(c) => {
            for constant in &mut c.consts {
                walker.visit_expression(&mut constant.value);
            }
            for property in &mut c.properties {
                if let Some(default) = &mut property.default {
                    walker.visit_expression(default);
                }
            }
            for method in &mut c.methods {
                for param in &mut method.params {
                    if let Some(default) = &mut param.default {
                        walker.visit_expression(default);
                    }
                }
                if let Some(body) = &mut method.body {
                    walk_block(walker, body);
                }
            }
        }
        Statement::If(i) => {
            walker.visit_expression(&mut i.condition);
            walk_block(walker, &mut i.then);
            for (condition, body) in &mut i.else_ifs {
                walker.visit_expression(condition);
                walk_block(walker, body);
            }
            if let Some(otherwise) = &mut i.otherwise {
                walk_block(walker, otherwise);
            }
        }
        Statement::While(w) => {
            walker.visit_expression(&mut w.condition);
            walk_block(walker, &mut w.body);
        }
        Statement::DoWhile(d) => {
            walk_block(walker, &mut d.body);
            walker.visit_expression(&mut d.condition);
        }
        Statement::For(f) => {
            walk_expressions(walker, &mut f.init);
            walk_expressions(walker, &mut f.condition);
            walk_expressions(walker, &mut f.step);
            walk_block(walker, &mut f.body);
        }
        Statement::Foreach(f) => {
            walker.visit_expression(&mut f.subject);
            if let Some(key) = &mut f.key {
                walker.visit_expression(key);
            }
            walker.visit_expression(&mut f.value);
            walk_block(walker, &mut f.body);
        }
        Statement::Switch(s) => {
            walker.visit_expression(&mut s.subject);
            for case in &mut s.cases {
                if let Some(test) = &mut case.test {
                    walker.visit_expression(test);
                }
                walk_statements(walker, &mut case.body);
            }
        }
        Statement::Return(r) => {
            if let Some(value) = &mut r.value {
                walker.visit_expression(value);
            }
        }
        Statement::Break(_)
        | Statement::Continue(_)
        | Statement::Global(_)
        | Statement::InlineHtml(_)
        | Statement::Noop(_, _) => {}
    }
}

pub fn walk_expression_children<W: MutWalker + ?Sized>(walker: &mut W, expression: &mut Expression) {
    match expression {
        Expression::Literal(_) | Expression::Variable(_) | Expression::Name(_) => {}
        Expression::InterpolatedString(s) => {
            for part in &mut s.parts {
                if let StringPart::BracedExpression(inner) = part {
                    walker.visit_expression(inner);
                }
            }
        }
        Expression::Assignment(a) => {
            walker.visit_expression(&mut a.target);
            walker.visit_expression(&mut a.value);
        }
        Expression::Binary(b) => {
            walker.visit_expression(&mut b.lhs);
            walker.visit_expression(&mut b.rhs);
        }
        Expression::Unary(u) => walker.visit_expression(&mut u.operand),
        Expression::IncDec(i) => walker.visit_expression(&mut i.operand),
        Expression::Call(c) => {
            if let CallTarget::Method { object, .. } = &mut c.target {
                walker.visit_expression(object);
            }
            walk_expressions(walker, &mut c.arguments);
        }
        Expression::PropertyAccess(p) => walker.visit_expression(&mut p.object),
        Expression::ArrayAccess(a) => {
            walker.visit_expression(&mut a.array);
            walker.visit_expression(&mut a.index);
        }
        Expression::Array(a) => {
            for element in &mut a.elements {
                if let Some(key) = &mut element.key {
                    walker.visit_expression(key);
                }
                walker.visit_expression(&mut element.value);
            }
        }
        Expression::Ternary(t) => {
            walker.visit_expression(&mut t.condition);
            if let Some(then) = &mut t.then {
                walker.visit_expression(then);
            }
            walker.visit_expression(&mut t.otherwise);
        }
        Expression::Isset(i) => walk_expressions(walker, &mut i.variables),
        Expression::Unset(u) => walk_expressions(walker, &mut u.variables),
        Expression::Empty(e) => walker.visit_expression(&mut e.value),
        Expression::Parenthesized(inner) => walker.visit_expression(inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    struct CountVariables {
        count: usize,
    }

    impl MutWalker for CountVariables {
        fn visit_expression(&mut self, expression: &mut Expression) {
            if matches!(expression, Expression::Variable(_)) {
                self.count += 1;
            }
            walk_expression_children(self, expression);
        }
    }

    #[test]
    fn visits_every_variable_reference() {
        let mut result = parse("<?php $a = $b + $c;");
        let mut counter = CountVariables { count: 0 };
        counter.visit_program(&mut result.program);
        assert_eq!(counter.count, 3);
    }
}
