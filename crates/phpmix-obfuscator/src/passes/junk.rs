//! Dead / Junk Code Injector: inserts unreachable blocks and no-op
//! statements between existing statements.

use crate::config::DeadJunkConfig;
use crate::ids::NodeIdGen;
use phpmix_syntax::ast::*;
use phpmix_syntax::token::Span;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A single never-read assignment: `$_phpmix_junk_<n> = <int>;`. Shared with the
/// control-flow wrapper's dead `else` branches, which need the same kind of
/// plausible-but-inert filler.
pub fn dead_statement(ids: &mut NodeIdGen) -> Statement {
    let id = ids.fresh();
    let target = Expression::Variable(Variable { id: ids.fresh(), span: Span::new(0, 0), name: format!("_phpmix_junk_{id}") });
    let value = Expression::Literal(Literal::Integer { id: ids.fresh(), span: Span::new(0, 0), raw: "0".to_string(), value: 0 });
    let assignment =
        Expression::Assignment(Assignment { id: ids.fresh(), span: Span::new(0, 0), target: Box::new(target), op: AssignOp::Assign, value: Box::new(value) });
    Statement::Expression(ExpressionStatement { id, span: Span::new(0, 0), expression: assignment })
}

fn dead_block(ids: &mut NodeIdGen) -> Statement {
    let condition = Expression::Literal(Literal::Integer { id: ids.fresh(), span: Span::new(0, 0), raw: "0".to_string(), value: 0 });
    let body = Block { id: ids.fresh(), span: Span::new(0, 0), statements: vec![dead_statement(ids)] };
    Statement::If(If { id: ids.fresh(), span: Span::new(0, 0), condition: Box::new(condition), then: body, else_ifs: Vec::new(), otherwise: None })
}

pub fn run(program: &mut Program, cfg: &DeadJunkConfig, ids: &mut NodeIdGen) {
    if !cfg.enabled {
        return;
    }
    inject(&mut program.statements, cfg, ids, 0, 0);
}

fn inject(statements: &mut Vec<Statement>, cfg: &DeadJunkConfig, ids: &mut NodeIdGen, depth: u32, seed_base: u64) {
    for (i, statement) in statements.iter_mut().enumerate() {
        let seed = seed_base.wrapping_add(i as u64).wrapping_add((depth as u64) << 32);
        recurse_into(statement, cfg, ids, depth, seed);
    }

    if depth >= cfg.max_depth {
        return;
    }

    let rate = f64::from(cfg.injection_rate.min(100)) / 100.0;
    let mut rebuilt = Vec::with_capacity(statements.len() * 2);
    for (i, statement) in std::mem::take(statements).into_iter().enumerate() {
        let mut rng = StdRng::seed_from_u64(seed_base.wrapping_add(i as u64).wrapping_add(0xA5A5_0000));
        if rng.random_bool(rate) {
            let junk = if rng.random_bool(0.5) { dead_block(ids) } else { dead_statement(ids) };
            rebuilt.push(junk);
        }
        rebuilt.push(statement);
    }
    *statements = rebuilt;
}

/// Declarations and control-flow bodies still get walked for nested injection, but
/// injection never happens *between* a construct and its continuation (e.g. `if` and
/// its `else`) because those live inside a single `Statement`, never as separate
/// list entries.
fn recurse_into(statement: &mut Statement, cfg: &DeadJunkConfig, ids: &mut NodeIdGen, depth: u32, seed: u64) {
    match statement {
        Statement::Block(b) => inject(&mut b.statements, cfg, ids, depth + 1, seed),
        Statement::Function(f) => inject(&mut f.body.statements, cfg, ids, depth + 1, seed),
        Statement::Class(c) => {
            for method in &mut c.methods {
                if let Some(body) = &mut method.body {
                    inject(&mut body.statements, cfg, ids, depth + 1, seed);
                }
            }
        }
        Statement::If(i) => {
            inject(&mut i.then.statements, cfg, ids, depth + 1, seed);
            for (_, body) in &mut i.else_ifs {
                inject(&mut body.statements, cfg, ids, depth + 1, seed);
            }
            if let Some(otherwise) = &mut i.otherwise {
                inject(&mut otherwise.statements, cfg, ids, depth + 1, seed);
            }
        }
        Statement::While(w) => inject(&mut w.body.statements, cfg, ids, depth + 1, seed),
        Statement::DoWhile(d) => inject(&mut d.body.statements, cfg, ids, depth + 1, seed),
        Statement::For(f) => inject(&mut f.body.statements, cfg, ids, depth + 1, seed),
        Statement::Foreach(f) => inject(&mut f.body.statements, cfg, ids, depth + 1, seed),
        Statement::Switch(s) => {
            for case in &mut s.cases {
                inject(&mut case.body, cfg, ids, depth + 1, seed);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phpmix_syntax::parser::parse;
    use phpmix_syntax::printer::print_program;

    #[test]
    fn never_splits_if_from_its_else() {
        let mut result = parse("<?php if (1) { echo 1; } else { echo 2; }");
        let cfg = DeadJunkConfig { enabled: true, injection_rate: 100, max_depth: 2 };
        let mut ids = NodeIdGen::for_program(&result.program);
        run(&mut result.program, &cfg, &mut ids);
        let out = print_program(&result.program);
        assert!(out.contains("} else {"), "{out}");
    }
}
