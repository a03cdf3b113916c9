//! Statement Shuffler: permutes maximal runs of reorder-safe adjacent
//! statements.

use crate::config::{ChunkMode, ShuffleConfig};
use phpmix_syntax::ast::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;

pub fn run(program: &mut Program, cfg: &ShuffleConfig) {
    if !cfg.enabled {
        return;
    }
    shuffle_statements(&mut program.statements, cfg, 0);
}

fn shuffle_statements(statements: &mut Vec<Statement>, cfg: &ShuffleConfig, seed_base: u64) {
    for (i, statement) in statements.iter_mut().enumerate() {
        recurse_into(statement, cfg, seed_base.wrapping_add(i as u64));
    }

    let runs = find_reorder_safe_runs(statements);
    for (start, end) in runs.into_iter().rev() {
        let run = &mut statements[start..end];
        if run.len() < 2 {
            continue;
        }
        let chunks = chunk(run.len(), cfg);
        if chunks.len() < 2 {
            continue;
        }
        let mut rng = StdRng::seed_from_u64(seed_base.wrapping_add(start as u64).wrapping_add(0xC0FF_EE00));
        let mut order: Vec<usize> = (0..chunks.len()).collect();
        order.shuffle(&mut rng);

        let original: Vec<Statement> = run.to_vec();
        let mut rebuilt = Vec::with_capacity(original.len());
        for chunk_index in order {
            let (from, to) = chunks[chunk_index];
            rebuilt.extend_from_slice(&original[from..to]);
        }
        run.clone_from_slice(&rebuilt);
    }
}

/// Splits `len` items into chunks of size `min_chunk_size` (count mode) or
/// `len as f64 * chunk_ratio` chunks (ratio mode).
fn chunk(len: usize, cfg: &ShuffleConfig) -> Vec<(usize, usize)> {
    let min = cfg.min_chunk_size.max(1);
    let chunk_count = match cfg.chunk_mode {
        ChunkMode::Count => (len / min).max(1),
        ChunkMode::Ratio => ((len as f64) * cfg.chunk_ratio).floor().max(1.0) as usize,
    };
    let chunk_count = chunk_count.min(len).max(1);
    let base = len / chunk_count;
    let extra = len % chunk_count;

    let mut bounds = Vec::with_capacity(chunk_count);
    let mut cursor = 0;
    for i in 0..chunk_count {
        let size = base + usize::from(i < extra);
        bounds.push((cursor, cursor + size));
        cursor += size;
    }
    bounds
}

/// A conservative reorder-safety approximation: a maximal run of plain expression
/// statements (no declarations, no control flow) whose side-effect variable sets are
/// pairwise disjoint.
fn find_reorder_safe_runs(statements: &[Statement]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < statements.len() {
        if !is_simple_expression_statement(&statements[i]) {
            i += 1;
            continue;
        }
        let mut seen: Vec<HashSet<String>> = Vec::new();
        let mut j = i;
        while j < statements.len() && is_simple_expression_statement(&statements[j]) {
            let touched = touched_variables(&statements[j]);
            if seen.iter().any(|prior| !prior.is_disjoint(&touched)) {
                break;
            }
            seen.push(touched);
            j += 1;
        }
        if j - i >= 2 {
            runs.push((i, j));
        }
        i = j.max(i + 1);
    }
    runs
}

fn is_simple_expression_statement(statement: &Statement) -> bool {
    matches!(statement, Statement::Expression(_) | Statement::Echo(_))
}

fn touched_variables(statement: &Statement) -> HashSet<String> {
    let mut set = HashSet::new();
    match statement {
        Statement::Expression(s) => collect_variables(&s.expression, &mut set),
        Statement::Echo(s) => {
            for value in &s.values {
                collect_variables(value, &mut set);
            }
        }
        _ => {}
    }
    set
}

fn collect_variables(expression: &Expression, set: &mut HashSet<String>) {
    match expression {
        Expression::Variable(v) => {
            set.insert(v.name.clone());
        }
        Expression::Assignment(a) => {
            collect_variables(&a.target, set);
            collect_variables(&a.value, set);
        }
        Expression::Binary(b) => {
            collect_variables(&b.lhs, set);
            collect_variables(&b.rhs, set);
        }
        Expression::Unary(u) => collect_variables(&u.operand, set),
        Expression::IncDec(i) => collect_variables(&i.operand, set),
        Expression::Call(c) => {
            if let CallTarget::Method { object, .. } = &c.target {
                collect_variables(object, set);
            }
            for argument in &c.arguments {
                collect_variables(argument, set);
            }
        }
        Expression::PropertyAccess(p) => collect_variables(&p.object, set),
        Expression::ArrayAccess(a) => {
            collect_variables(&a.array, set);
            collect_variables(&a.index, set);
        }
        Expression::Array(a) => {
            for element in &a.elements {
                if let Some(key) = &element.key {
                    collect_variables(key, set);
                }
                collect_variables(&element.value, set);
            }
        }
        Expression::Ternary(t) => {
            collect_variables(&t.condition, set);
            if let Some(then) = &t.then {
                collect_variables(then, set);
            }
            collect_variables(&t.otherwise, set);
        }
        Expression::Parenthesized(inner) => collect_variables(inner, set),
        Expression::InterpolatedString(s) => {
            for part in &s.parts {
                match part {
                    StringPart::Variable(v) => {
                        set.insert(v.name.clone());
                    }
                    StringPart::BracedExpression(inner) => collect_variables(inner, set),
                    StringPart::Literal(_) => {}
                }
            }
        }
        Expression::Isset(i) => {
            for v in &i.variables {
                collect_variables(v, set);
            }
        }
        Expression::Unset(u) => {
            for v in &u.variables {
                collect_variables(v, set);
            }
        }
        Expression::Empty(e) => collect_variables(&e.value, set),
        Expression::Literal(_) | Expression::Name(_) => {}
    }
}

fn recurse_into(statement: &mut Statement, cfg: &ShuffleConfig, seed: u64) {
    match statement {
        Statement::Block(b) => shuffle_statements(&mut b.statements, cfg, seed),
        Statement::Function(f) => shuffle_statements(&mut f.body.statements, cfg, seed),
        Statement::Class(c) => {
            for method in &mut c.methods {
                if let Some(body) = &mut method.body {
                    shuffle_statements(&mut body.statements, cfg, seed);
                }
            }
        }
        Statement::If(i) => {
            shuffle_statements(&mut i.then.statements, cfg, seed);
            for (_, body) in &mut i.else_ifs {
                shuffle_statements(&mut body.statements, cfg, seed);
            }
            if let Some(otherwise) = &mut i.otherwise {
                shuffle_statements(&mut otherwise.statements, cfg, seed);
            }
        }
        Statement::While(w) => shuffle_statements(&mut w.body.statements, cfg, seed),
        Statement::DoWhile(d) => shuffle_statements(&mut d.body.statements, cfg, seed),
        Statement::For(f) => shuffle_statements(&mut f.body.statements, cfg, seed),
        Statement::Foreach(f) => shuffle_statements(&mut f.body.statements, cfg, seed),
        Statement::Switch(s) => {
            for case in &mut s.cases {
                shuffle_statements(&mut case.body, cfg, seed);
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
    fn never_moves_declarations_or_control_flow() {
        let mut result = parse("<?php function f(){} if (1) { echo 1; } $a = 1;");
        let cfg = ShuffleConfig { enabled: true, min_chunk_size: 1, chunk_mode: ChunkMode::Count, chunk_ratio: 1.0 };
        run(&mut result.program, &cfg);
        let out = print_program(&result.program);
        assert!(out.starts_with("<?php\nfunction f() {\n}\nif (1) {"), "{out}");
    }
}
