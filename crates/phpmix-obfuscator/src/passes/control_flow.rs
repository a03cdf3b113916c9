//! Control-Flow Wrapper: wraps function/method/loop bodies in nested
//! `if (<opaque-true>) { ... }` guards.

use crate::config::ControlFlowConfig;
use crate::ids::NodeIdGen;
use crate::passes::junk;
use phpmix_syntax::ast::*;
use phpmix_syntax::token::Span;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A small pool of tautologies, selected at pass time when `random-conditions` is on.
/// Each is built fresh per call since every use needs its own `NodeId`s.
fn opaque_predicate(ids: &mut NodeIdGen, random: bool, seed: u64) -> Expression {
    if !random {
        return int_literal(ids, 1);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    match rng.random_range(0..3u8) {
        // 1 == 1
        0 => {
            let lhs = int_literal(ids, 1);
            let rhs = int_literal(ids, 1);
            binary(ids, BinaryOp::Eq, lhs, rhs)
        }
        // 2 > 1
        1 => {
            let lhs = int_literal(ids, 2);
            let rhs = int_literal(ids, 1);
            binary(ids, BinaryOp::Gt, lhs, rhs)
        }
        // !0
        _ => {
            let zero = int_literal(ids, 0);
            Expression::Unary(Unary { id: ids.fresh(), span: Span::new(0, 0), op: UnaryOp::Not, operand: Box::new(zero) })
        }
    }
}

fn int_literal(ids: &mut NodeIdGen, value: i64) -> Expression {
    Expression::Literal(Literal::Integer { id: ids.fresh(), span: Span::new(0, 0), raw: value.to_string(), value })
}

fn binary(ids: &mut NodeIdGen, op: BinaryOp, lhs: Expression, rhs: Expression) -> Expression {
    Expression::Binary(Binary { id: ids.fresh(), span: Span::new(0, 0), op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
}

fn wrap_block(block: Block, ids: &mut NodeIdGen, cfg: &ControlFlowConfig, seed_base: u64) -> Block {
    let mut current = block;
    for depth in 0..cfg.max_nesting_depth.max(1) {
        let condition = opaque_predicate(ids, cfg.random_conditions, seed_base.wrapping_add(depth as u64));
        let otherwise = if cfg.add_dead_branches {
            Some(Block { id: ids.fresh(), span: Span::new(0, 0), statements: vec![junk::dead_statement(ids)] })
        } else {
            None
        };
        let wrapper = Statement::If(If {
            id: ids.fresh(),
            span: Span::new(0, 0),
            condition: Box::new(condition),
            then: current,
            else_ifs: Vec::new(),
            otherwise,
        });
        current = Block { id: ids.fresh(), span: Span::new(0, 0), statements: vec![wrapper] };
    }
    current
}

pub fn run(program: &mut Program, cfg: &ControlFlowConfig, ids: &mut NodeIdGen) {
    if !cfg.enabled {
        return;
    }
    wrap_statements(&mut program.statements, cfg, ids, 0);
}

fn wrap_statements(statements: &mut Vec<Statement>, cfg: &ControlFlowConfig, ids: &mut NodeIdGen, mut seed: u64) {
    for statement in statements.iter_mut() {
        seed = seed.wrapping_add(1);
        match statement {
            Statement::Function(f) => {
                wrap_statements(&mut f.body.statements, cfg, ids, seed);
                let body = std::mem::replace(&mut f.body, Block { id: 0, span: Span::new(0, 0), statements: Vec::new() });
                f.body = wrap_block(body, ids, cfg, seed);
            }
            Statement::Class(c) => {
                for method in &mut c.methods {
                    if let Some(body) = method.body.take() {
                        let mut body = body;
                        wrap_statements(&mut body.statements, cfg, ids, seed);
                        method.body = Some(wrap_block(body, ids, cfg, seed));
                    }
                }
            }
            Statement::While(w) if cfg.wrap_loops => {
                wrap_statements(&mut w.body.statements, cfg, ids, seed);
                let body = std::mem::replace(&mut w.body, Block { id: 0, span: Span::new(0, 0), statements: Vec::new() });
                w.body = wrap_block(body, ids, cfg, seed);
            }
            Statement::DoWhile(d) if cfg.wrap_loops => {
                wrap_statements(&mut d.body.statements, cfg, ids, seed);
                let body = std::mem::replace(&mut d.body, Block { id: 0, span: Span::new(0, 0), statements: Vec::new() });
                d.body = wrap_block(body, ids, cfg, seed);
            }
            Statement::For(f) if cfg.wrap_loops => {
                wrap_statements(&mut f.body.statements, cfg, ids, seed);
                let body = std::mem::replace(&mut f.body, Block { id: 0, span: Span::new(0, 0), statements: Vec::new() });
                f.body = wrap_block(body, ids, cfg, seed);
            }
            Statement::Foreach(f) if cfg.wrap_loops => {
                wrap_statements(&mut f.body.statements, cfg, ids, seed);
                let body = std::mem::replace(&mut f.body, Block { id: 0, span: Span::new(0, 0), statements: Vec::new() });
                f.body = wrap_block(body, ids, cfg, seed);
            }
            Statement::If(i) => {
                wrap_statements(&mut i.then.statements, cfg, ids, seed);
                for (_, body) in &mut i.else_ifs {
                    wrap_statements(&mut body.statements, cfg, ids, seed);
                }
                if let Some(otherwise) = &mut i.otherwise {
                    wrap_statements(&mut otherwise.statements, cfg, ids, seed);
                }
            }
            Statement::Block(b) => wrap_statements(&mut b.statements, cfg, ids, seed),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phpmix_syntax::parser::parse;
    use phpmix_syntax::printer::print_program;

    #[test]
    fn wraps_function_body_in_literal_true_guard() {
        let mut result = parse("<?php function f(){ echo 1; return 2; }");
        let cfg = ControlFlowConfig { enabled: true, max_nesting_depth: 1, random_conditions: false, add_dead_branches: false, wrap_loops: false };
        let mut ids = NodeIdGen::for_program(&result.program);
        run(&mut result.program, &cfg, &mut ids);
        let out = print_program(&result.program);
        assert!(out.contains("function f() {\n    if (1) {\n        echo 1;\n        return 2;\n    }\n}"), "{out}");
    }
}
