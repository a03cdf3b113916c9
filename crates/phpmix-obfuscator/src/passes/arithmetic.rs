//! Arithmetic Rewriter: replaces binary arithmetic nodes with
//! algebraically equivalent, more convoluted expressions.

use crate::config::ArithmeticConfig;
use crate::ids::NodeIdGen;
use phpmix_syntax::ast::*;
use phpmix_syntax::token::Span;
use phpmix_syntax::walker::{walk_expression_children, MutWalker};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct ArithmeticRewriter<'a> {
    cfg: &'a ArithmeticConfig,
    ids: &'a mut NodeIdGen,
    site: u64,
}

pub fn run(program: &mut Program, cfg: &ArithmeticConfig, ids: &mut NodeIdGen) {
    if !cfg.enabled {
        return;
    }
    let mut rewriter = ArithmeticRewriter { cfg, ids, site: 0 };
    for statement in &mut program.statements {
        rewriter.visit_statement(statement);
    }
}

fn is_literal_zero(expression: &Expression) -> bool {
    match expression {
        Expression::Literal(Literal::Integer { value, .. }) => *value == 0,
        Expression::Literal(Literal::Float { value, .. }) => *value == 0.0,
        _ => false,
    }
}

impl<'a> MutWalker for ArithmeticRewriter<'a> {
    fn visit_expression(&mut self, expression: &mut Expression) {
        walk_expression_children(self, expression);

        let Expression::Binary(binary) = expression else { return };
        if !binary.op.is_arithmetic() {
            return;
        }
        if matches!(binary.op, BinaryOp::Div | BinaryOp::Mod) && is_literal_zero(&binary.rhs) {
            return;
        }

        self.site += 1;
        let mut rng = StdRng::seed_from_u64(self.site);
        if rng.random_range(0..100u32) >= u32::from(self.cfg.normalized_rate()) {
            return;
        }

        let depth = self.cfg.normalized_complexity();
        let lhs = (*binary.lhs).clone();
        let rhs = (*binary.rhs).clone();
        let mut replacement = match binary.op {
            BinaryOp::Add => self.equivalent_add(lhs, rhs),
            BinaryOp::Sub => self.equivalent_sub(lhs, rhs),
            BinaryOp::Mul => self.equivalent_mul(lhs, rhs),
            BinaryOp::Div => self.equivalent_div(lhs, rhs),
            BinaryOp::Mod => self.equivalent_mod(lhs, rhs),
            _ => return,
        };
        for _ in 1..depth {
            replacement = self.wrap_once(replacement);
        }
        *expression = replacement;
    }
}

impl<'a> ArithmeticRewriter<'a> {
    fn binary(&mut self, op: BinaryOp, lhs: Expression, rhs: Expression) -> Expression {
        Expression::Binary(Binary { id: self.ids.fresh(), span: Span::new(0, 0), op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
    }

    fn negate(&mut self, operand: Expression) -> Expression {
        Expression::Unary(Unary { id: self.ids.fresh(), span: Span::new(0, 0), op: UnaryOp::Negate, operand: Box::new(operand) })
    }

    fn parenthesize(&mut self, expression: Expression) -> Expression {
        Expression::Parenthesized(Box::new(expression))
    }

    /// `a + b -> a - (-b)`.
    fn equivalent_add(&mut self, a: Expression, b: Expression) -> Expression {
        let neg_b = self.negate(b);
        self.binary(BinaryOp::Sub, a, self.parenthesize(neg_b))
    }

    /// `a - b -> a + (-b)`.
    fn equivalent_sub(&mut self, a: Expression, b: Expression) -> Expression {
        let neg_b = self.negate(b);
        self.binary(BinaryOp::Add, a, self.parenthesize(neg_b))
    }

    /// `a * b -> ((a+b)^2 - (a-b)^2) / 4`, safe for integers since the numerator is
    /// always divisible by 4 when `a` and `b` are integers.
    fn equivalent_mul(&mut self, a: Expression, b: Expression) -> Expression {
        let sum = self.binary(BinaryOp::Add, a.clone(), b.clone());
        let sum_sq = self.binary(BinaryOp::Mul, self.parenthesize(sum.clone()), self.parenthesize(sum));
        let diff = self.binary(BinaryOp::Sub, a, b);
        let diff_sq = self.binary(BinaryOp::Mul, self.parenthesize(diff.clone()), self.parenthesize(diff));
        let numerator = self.binary(BinaryOp::Sub, sum_sq, self.parenthesize(diff_sq));
        let four = Expression::Literal(Literal::Integer { id: self.ids.fresh(), span: Span::new(0, 0), raw: "4".to_string(), value: 4 });
        self.binary(BinaryOp::Div, self.parenthesize(numerator), four)
    }

    /// `a / b -> -((-a) / b)`, valid for any non-zero `b` since PHP's `/` always
    /// performs true division regardless of operand types.
    fn equivalent_div(&mut self, a: Expression, b: Expression) -> Expression {
        let neg_a = self.negate(a);
        let inner = self.binary(BinaryOp::Div, self.parenthesize(neg_a), b);
        self.negate(self.parenthesize(inner))
    }

    /// `a % b -> -((-a) % b)`, valid for any non-zero `b`: PHP's `%` truncates toward
    /// zero, so negating the dividend negates the result.
    fn equivalent_mod(&mut self, a: Expression, b: Expression) -> Expression {
        let neg_a = self.negate(a);
        let inner = self.binary(BinaryOp::Mod, self.parenthesize(neg_a), b);
        self.negate(self.parenthesize(inner))
    }

    /// Adds one more layer of nesting for `complexity > 1`: wraps in `(expr + 0)`.
    fn wrap_once(&mut self, expression: Expression) -> Expression {
        let zero = Expression::Literal(Literal::Integer { id: self.ids.fresh(), span: Span::new(0, 0), raw: "0".to_string(), value: 0 });
        self.binary(BinaryOp::Add, self.parenthesize(expression), zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phpmix_syntax::parser::parse;
    use phpmix_syntax::printer::print_program;

    #[test]
    fn rewrites_addition_when_rate_is_full() {
        let mut result = parse("<?php echo 1 + 2;");
        let cfg = ArithmeticConfig { enabled: true, complexity: 1, transformation_rate: 100 };
        let mut ids = NodeIdGen::for_program(&result.program);
        run(&mut result.program, &cfg, &mut ids);
        let out = print_program(&result.program);
        assert!(out.contains("- (-2)") || out.contains("-(-2)"), "{out}");
    }

    #[test]
    fn never_touches_division_by_literal_zero() {
        let mut result = parse("<?php echo 1 / 0;");
        let cfg = ArithmeticConfig { enabled: true, complexity: 1, transformation_rate: 100 };
        let mut ids = NodeIdGen::for_program(&result.program);
        run(&mut result.program, &cfg, &mut ids);
        let out = print_program(&result.program);
        assert!(out.contains("echo 1 / 0;"), "{out}");
    }

    #[test]
    fn never_touches_modulo_by_literal_zero() {
        let mut result = parse("<?php echo 5 % 0;");
        let cfg = ArithmeticConfig { enabled: true, complexity: 1, transformation_rate: 100 };
        let mut ids = NodeIdGen::for_program(&result.program);
        run(&mut result.program, &cfg, &mut ids);
        let out = print_program(&result.program);
        assert!(out.contains("echo 5 % 0;"), "{out}");
    }

    #[test]
    fn rewrites_division_by_nonzero_literal() {
        let mut result = parse("<?php echo 10 / 2;");
        let cfg = ArithmeticConfig { enabled: true, complexity: 1, transformation_rate: 100 };
        let mut ids = NodeIdGen::for_program(&result.program);
        run(&mut result.program, &cfg, &mut ids);
        let out = print_program(&result.program);
        assert!(out.contains("-((-10) / 2)"), "{out}");
        assert!(!out.contains("echo 10 / 2;"), "{out}");
    }

    #[test]
    fn rewrites_modulo_by_nonzero_literal() {
        let mut result = parse("<?php echo 10 % 3;");
        let cfg = ArithmeticConfig { enabled: true, complexity: 1, transformation_rate: 100 };
        let mut ids = NodeIdGen::for_program(&result.program);
        run(&mut result.program, &cfg, &mut ids);
        let out = print_program(&result.program);
        assert!(!out.contains("echo 10 % 3;"), "{out}");
        assert!(out.contains("% 3"), "{out}");
    }
}
