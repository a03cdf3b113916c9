//! Fresh `NodeId` allocation for nodes synthesized by a pass (decoder calls, helper
//! guards, injected junk statements). The parser's own ids are dense but only cover
//! the nodes it produced, so every pass that manufactures new nodes draws from a
//! single counter seeded past the highest id already in the tree.

use phpmix_syntax::ast::{Expression, NodeId, Program, Statement};
use phpmix_syntax::walker::{walk_expression_children, walk_statement_children, MutWalker};

pub struct NodeIdGen {
    next: NodeId,
}

impl NodeIdGen {
    pub fn for_program(program: &Program) -> Self {
        let mut statements = program.statements.clone();
        let mut finder = MaxIdFinder { max: program.id };
        for statement in &mut statements {
            finder.visit_statement(statement);
        }
        Self { next: finder.max.saturating_add(1) }
    }

    pub fn fresh(&mut self) -> NodeId {
        let id = self.next;
        self.next += 1;
        id
    }
}

struct MaxIdFinder {
    max: NodeId,
}

impl MutWalker for MaxIdFinder {
    fn visit_statement(&mut self, statement: &mut Statement) {
        self.max = self.max.max(statement.id());
        walk_statement_children(self, statement);
    }

    fn visit_expression(&mut self, expression: &mut Expression) {
        self.max = self.max.max(expression.id());
        walk_expression_children(self, expression);
    }
}
