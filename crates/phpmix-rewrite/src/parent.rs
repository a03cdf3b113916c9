//! Parent Tracker: a side table from every node's id to its immediate
//! parent and the slot it occupies, built by a single downward walk.
//!
//! The table here is read-only and exists for passes that need to know a node's
//! syntactic context (for example, the array-access rewriter must not rewrite a
//! subscript expression sitting in an assignment's target position). Structural
//! replacement itself does not consult this table — see [`crate::replacer`] for why.

use phpmix_syntax::ast::*;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    BlockStatement,
    IfCondition,
    IfThenBranch,
    IfElseIfCondition,
    IfElseIfBranch,
    IfElseBranch,
    WhileCondition,
    WhileBody,
    DoWhileBody,
    DoWhileCondition,
    ForInit,
    ForCondition,
    ForStep,
    ForBody,
    ForeachSubject,
    ForeachKey,
    ForeachValue,
    ForeachBody,
    SwitchSubject,
    SwitchCaseTest,
    SwitchCaseBody,
    ReturnValue,
    EchoValue,
    ExpressionStatementExpr,
    FunctionParamDefault,
    FunctionBody,
    ClassConstValue,
    PropertyDefault,
    MethodParamDefault,
    MethodBody,
    AssignmentTarget,
    AssignmentValue,
    BinaryLhs,
    BinaryRhs,
    UnaryOperand,
    IncDecOperand,
    CallArgument,
    CallMethodObject,
    PropertyAccessObject,
    ArrayAccessBase,
    ArrayAccessIndex,
    ArrayElementKey,
    ArrayElementValue,
    TernaryCondition,
    TernaryThen,
    TernaryElse,
    IssetVariable,
    UnsetVariable,
    EmptyValue,
    InterpolatedPart,
}

#[derive(Debug, Clone, Copy)]
pub struct ParentInfo {
    pub parent: NodeId,
    pub slot: Slot,
}

#[derive(Debug, Default)]
pub struct ParentTracker {
    entries: HashMap<NodeId, ParentInfo>,
}

impl ParentTracker {
    pub fn build(program: &Program) -> Self {
        let mut tracker = Self::default();
        tracker.walk_statements(program.id, &program.statements);
        tracker
    }

    pub fn parent_of(&self, id: NodeId) -> Option<&ParentInfo> {
        self.entries.get(&id)
    }

    /// True if `id` is the target (left-hand side) of an assignment — the context
    /// the array-access rewriter and the arithmetic rewriter must both avoid
    /// touching. `Expression::id()` is transparent through `Parenthesized`, so a
    /// parenthesized target (`($a[0]) = 1`) is still recognized here.
    pub fn is_assignment_target(&self, id: NodeId) -> bool {
        matches!(self.parent_of(id), Some(info) if info.slot == Slot::AssignmentTarget)
    }

    fn record(&mut self, child: NodeId, parent: NodeId, slot: Slot) {
        self.entries.insert(child, ParentInfo { parent, slot });
    }

    fn walk_statements(&mut self, parent: NodeId, statements: &[Statement]) {
        for statement in statements {
            self.record(statement.id(), parent, Slot::BlockStatement);
            self.walk_statement(statement);
        }
    }

    fn walk_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Block(b) => self.walk_statements(b.id, &b.statements),
            Statement::Expression(s) => {
                self.record(s.expression.id(), s.id, Slot::ExpressionStatementExpr);
                self.walk_expression(&s.expression);
            }
            Statement::Echo(s) => {
                for value in &s.values {
                    self.record(value.id(), s.id, Slot::EchoValue);
                    self.walk_expression(value);
                }
            }
            Statement::Function(f) => {
                for param in &f.params {
                    if let Some(default) = &param.default {
                        self.record(default.id(), f.id, Slot::FunctionParamDefault);
                        self.walk_expression(default);
                    }
                }
                self.record(f.body.id, f.id, Slot::FunctionBody);
                self.walk_statements(f.body.id, &f.body.statements);
            }
            Statement::Class(c) => {
                for constant in &c.consts {
                    self.record(constant.value.id(), c.id, Slot::ClassConstValue);
                    self.walk_expression(&constant.value);
                }
                for property in &c.properties {
                    if let Some(default) = &property.default {
                        self.record(default.id(), c.id, Slot::PropertyDefault);
                        self.walk_expression(default);
                    }
                }
                for method in &c.methods {
                    for param in &method.params {
                        if let Some(default) = &param.default {
                            self.record(default.id(), method.id, Slot::MethodParamDefault);
                            self.walk_expression(default);
                        }
                    }
                    if let Some(body) = &method.body {
                        self.record(body.id, method.id, Slot::MethodBody);
                        self.walk_statements(body.id, &body.statements);
                    }
                }
            }
            Statement::If(i) => {
                self.record(i.condition.id(), i.id, Slot::IfCondition);
                self.walk_expression(&i.condition);
                self.record(i.then.id, i.id, Slot::IfThenBranch);
                self.walk_statements(i.then.id, &i.then.statements);
                for (condition, body) in &i.else_ifs {
                    self.record(condition.id(), i.id, Slot::IfElseIfCondition);
                    self.walk_expression(condition);
                    self.record(body.id, i.id, Slot::IfElseIfBranch);
                    self.walk_statements(body.id, &body.statements);
                }
                if let Some(otherwise) = &i.otherwise {
                    self.record(otherwise.id, i.id, Slot::IfElseBranch);
                    self.walk_statements(otherwise.id, &otherwise.statements);
                }
            }
            Statement::While(w) => {
                self.record(w.condition.id(), w.id, Slot::WhileCondition);
                self.walk_expression(&w.condition);
                self.record(w.body.id, w.id, Slot::WhileBody);
                self.walk_statements(w.body.id, &w.body.statements);
            }
            Statement::DoWhile(d) => {
                self.record(d.body.id, d.id, Slot::DoWhileBody);
                self.walk_statements(d.body.id, &d.body.statements);
                self.record(d.condition.id(), d.id, Slot::DoWhileCondition);
                self.walk_expression(&d.condition);
            }
            Statement::For(f) => {
                for e in &f.init {
                    self.record(e.id(), f.id, Slot::ForInit);
                    self.walk_expression(e);
                }
                for e in &f.condition {
                    self.record(e.id(), f.id, Slot::ForCondition);
                    self.walk_expression(e);
                }
                for e in &f.step {
                    self.record(e.id(), f.id, Slot::ForStep);
                    self.walk_expression(e);
                }
                self.record(f.body.id, f.id, Slot::ForBody);
                self.walk_statements(f.body.id, &f.body.statements);
            }
            Statement::Foreach(f) => {
                self.record(f.subject.id(), f.id, Slot::ForeachSubject);
                self.walk_expression(&f.subject);
                if let Some(key) = &f.key {
                    self.record(key.id(), f.id, Slot::ForeachKey);
                    self.walk_expression(key);
                }
                self.record(f.value.id(), f.id, Slot::ForeachValue);
                self.walk_expression(&f.value);
                self.record(f.body.id, f.id, Slot::ForeachBody);
                self.walk_statements(f.body.id, &f.body.statements);
            }
            Statement::Switch(s) => {
                self.record(s.subject.id(), s.id, Slot::SwitchSubject);
                self.walk_expression(&s.subject);
                for case in &s.cases {
                    if let Some(test) = &case.test {
                        self.record(test.id(), s.id, Slot::SwitchCaseTest);
                        self.walk_expression(test);
                    }
                    for stmt in &case.body {
                        self.record(stmt.id(), s.id, Slot::SwitchCaseBody);
                        self.walk_statement(stmt);
                    }
                }
            }
            Statement::Return(r) => {
                if let Some(value) = &r.value {
                    self.record(value.id(), r.id, Slot::ReturnValue);
                    self.walk_expression(value);
                }
            }
            Statement::Break(_) | Statement::Continue(_) | Statement::Global(_) | Statement::InlineHtml(_) | Statement::Noop(_, _) => {}
        }
    }

    fn walk_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Literal(_) | Expression::Variable(_) | Expression::Name(_) => {}
            Expression::InterpolatedString(s) => {
                for part in &s.parts {
                    if let StringPart::BracedExpression(inner) = part {
                        self.record(inner.id(), s.id, Slot::InterpolatedPart);
                        self.walk_expression(inner);
                    }
                }
            }
            Expression::Assignment(a) => {
                self.record(a.target.id(), a.id, Slot::AssignmentTarget);
                self.walk_expression(&a.target);
                self.record(a.value.id(), a.id, Slot::AssignmentValue);
                self.walk_expression(&a.value);
            }
            Expression::Binary(b) => {
                self.record(b.lhs.id(), b.id, Slot::BinaryLhs);
                self.walk_expression(&b.lhs);
                self.record(b.rhs.id(), b.id, Slot::BinaryRhs);
                self.walk_expression(&b.rhs);
            }
            Expression::Unary(u) => {
                self.record(u.operand.id(), u.id, Slot::UnaryOperand);
                self.walk_expression(&u.operand);
            }
            Expression::IncDec(i) => {
                self.record(i.operand.id(), i.id, Slot::IncDecOperand);
                self.walk_expression(&i.operand);
            }
            Expression::Call(c) => {
                if let CallTarget::Method { object, .. } = &c.target {
                    self.record(object.id(), c.id, Slot::CallMethodObject);
                    self.walk_expression(object);
                }
                for argument in &c.arguments {
                    self.record(argument.id(), c.id, Slot::CallArgument);
                    self.walk_expression(argument);
                }
            }
            Expression::PropertyAccess(p) => {
                self.record(p.object.id(), p.id, Slot::PropertyAccessObject);
                self.walk_expression(&p.object);
            }
            Expression::ArrayAccess(a) => {
                self.record(a.array.id(), a.id, Slot::ArrayAccessBase);
                self.walk_expression(&a.array);
                self.record(a.index.id(), a.id, Slot::ArrayAccessIndex);
                self.walk_expression(&a.index);
            }
            Expression::Array(a) => {
                for element in &a.elements {
                    if let Some(key) = &element.key {
                        self.record(key.id(), a.id, Slot::ArrayElementKey);
                        self.walk_expression(key);
                    }
                    self.record(element.value.id(), a.id, Slot::ArrayElementValue);
                    self.walk_expression(&element.value);
                }
            }
            Expression::Ternary(t) => {
                self.record(t.condition.id(), t.id, Slot::TernaryCondition);
                self.walk_expression(&t.condition);
                if let Some(then) = &t.then {
                    self.record(then.id(), t.id, Slot::TernaryThen);
                    self.walk_expression(then);
                }
                self.record(t.otherwise.id(), t.id, Slot::TernaryElse);
                self.walk_expression(&t.otherwise);
            }
            Expression::Isset(i) => {
                for v in &i.variables {
                    self.record(v.id(), i.id, Slot::IssetVariable);
                    self.walk_expression(v);
                }
            }
            Expression::Unset(u) => {
                for v in &u.variables {
                    self.record(v.id(), u.id, Slot::UnsetVariable);
                    self.walk_expression(v);
                }
            }
            Expression::Empty(e) => {
                self.record(e.value.id(), e.id, Slot::EmptyValue);
                self.walk_expression(&e.value);
            }
            Expression::Parenthesized(inner) => {
                // `Parenthesized` has no NodeId of its own, so the inner expression's
                // id was already recorded by whichever slot holds this node.
                self.walk_expression(inner);
            }
        }
    }
}
