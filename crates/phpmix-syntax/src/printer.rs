//! Deterministic pretty-printer.
//!
//! The printer does not attempt to preserve the original source's exact formatting;
//! it always produces a canonical layout from the AST. That is a deliberate choice
//! over a trivia-preserving printer: every obfuscation pass mutates the tree, so
//! "preserve the original formatting" stopped being a coherent goal after the first
//! pass runs, and a canonical printer trivially satisfies idempotence (print(parse(
//! print(ast))) == print(ast)).

use crate::ast::*;

pub fn print_program(program: &Program) -> String {
    let mut printer = Printer::new();
    printer.print_statements(&program.statements);
    printer.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        let mut printer = Self { out: String::new(), indent: 0 };
        printer.out.push_str("<?php\n");
        printer
    }

    fn indent_str(&self) -> String {
        "    ".repeat(self.indent)
    }

    fn print_statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.print_statement(statement);
        }
    }

    fn print_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Noop(_, _) => {}
            Statement::Block(block) => self.print_block(block),
            Statement::Expression(s) => {
                self.out.push_str(&self.indent_str());
                self.out.push_str(&print_expression(&s.expression));
                self.out.push_str(";\n");
            }
            Statement::Echo(s) => {
                self.out.push_str(&self.indent_str());
                self.out.push_str("echo ");
                let parts: Vec<String> = s.values.iter().map(print_expression).collect();
                self.out.push_str(&parts.join(", "));
                self.out.push_str(";\n");
            }
            Statement::InlineHtml(s) => {
                self.out.push_str("?>");
                self.out.push_str(&s.value);
                self.out.push_str("<?php\n");
            }
            Statement::Function(f) => {
                self.out.push_str(&self.indent_str());
                self.out.push_str("function ");
                if f.by_ref {
                    self.out.push('&');
                }
                self.out.push_str(&f.name);
                self.out.push('(');
                self.out.push_str(&print_params(&f.params));
                self.out.push(')');
                if let Some(ty) = &f.return_type {
                    self.out.push_str(": ");
                    self.out.push_str(ty);
                }
                self.out.push_str(" ");
                self.print_block(&f.body);
            }
            Statement::Class(c) => self.print_class(c),
            Statement::If(i) => self.print_if(i),
            Statement::While(w) => {
                self.out.push_str(&self.indent_str());
                self.out.push_str(&format!("while ({}) ", print_expression(&w.condition)));
                self.print_block(&w.body);
            }
            Statement::DoWhile(d) => {
                self.out.push_str(&self.indent_str());
                self.out.push_str("do ");
                self.print_block(&d.body);
                self.out.pop();
                self.out.push_str(&format!(" while ({});\n", print_expression(&d.condition)));
            }
            Statement::For(f) => {
                self.out.push_str(&self.indent_str());
                let init = f.init.iter().map(print_expression).collect::<Vec<_>>().join(", ");
                let cond = f.condition.iter().map(print_expression).collect::<Vec<_>>().join(", ");
                let step = f.step.iter().map(print_expression).collect::<Vec<_>>().join(", ");
                self.out.push_str(&format!("for ({init}; {cond}; {step}) "));
                self.print_block(&f.body);
            }
            Statement::Foreach(f) => {
                self.out.push_str(&self.indent_str());
                self.out.push_str("foreach (");
                self.out.push_str(&print_expression(&f.subject));
                self.out.push_str(" as ");
                if let Some(key) = &f.key {
                    self.out.push_str(&print_expression(key));
                    self.out.push_str(" => ");
                }
                if f.by_ref {
                    self.out.push('&');
                }
                self.out.push_str(&print_expression(&f.value));
                self.out.push_str(") ");
                self.print_block(&f.body);
            }
            Statement::Switch(s) => self.print_switch(s),
            Statement::Return(r) => {
                self.out.push_str(&self.indent_str());
                self.out.push_str("return");
                if let Some(value) = &r.value {
                    self.out.push(' ');
                    self.out.push_str(&print_expression(value));
                }
                self.out.push_str(";\n");
            }
            Statement::Break(b) => {
                self.out.push_str(&self.indent_str());
                self.out.push_str("break");
                if let Some(level) = b.level {
                    self.out.push_str(&format!(" {level}"));
                }
                self.out.push_str(";\n");
            }
            Statement::Continue(c) => {
                self.out.push_str(&self.indent_str());
                self.out.push_str("continue");
                if let Some(level) = c.level {
                    self.out.push_str(&format!(" {level}"));
                }
                self.out.push_str(";\n");
            }
            Statement::Global(g) => {
                self.out.push_str(&self.indent_str());
                self.out.push_str("global ");
                self.out.push_str(&g.variables.iter().map(|v| format!("${v}")).collect::<Vec<_>>().join(", "));
                self.out.push_str(";\n");
            }
        }
    }

    fn print_block(&mut self, block: &Block) {
        self.out.push_str("{\n");
        self.indent += 1;
        self.print_statements(&block.statements);
        self.indent -= 1;
        self.out.push_str(&self.indent_str());
        self.out.push_str("}\n");
    }

    fn print_if(&mut self, node: &If) {
        self.out.push_str(&self.indent_str());
        self.out.push_str(&format!("if ({}) ", print_expression(&node.condition)));
        self.print_block(&node.then);
        for (cond, body) in &node.else_ifs {
            self.out.pop();
            self.out.push_str(&format!(" elseif ({}) ", print_expression(cond)));
            self.print_block(body);
        }
        if let Some(otherwise) = &node.otherwise {
            self.out.pop();
            self.out.push_str(" else ");
            self.print_block(otherwise);
        }
    }

    fn print_switch(&mut self, node: &Switch) {
        self.out.push_str(&self.indent_str());
        self.out.push_str(&format!("switch ({}) {{\n", print_expression(&node.subject)));
        self.indent += 1;
        for case in &node.cases {
            self.out.push_str(&self.indent_str());
            match &case.test {
                Some(value) => self.out.push_str(&format!("case {}:\n", print_expression(value))),
                None => self.out.push_str("default:\n"),
            }
            self.indent += 1;
            self.print_statements(&case.body);
            self.indent -= 1;
        }
        self.indent -= 1;
        self.out.push_str(&self.indent_str());
        self.out.push_str("}\n");
    }

    fn print_class(&mut self, node: &ClassDecl) {
        self.out.push_str(&self.indent_str());
        if node.is_abstract {
            self.out.push_str("abstract ");
        }
        if node.is_final {
            self.out.push_str("final ");
        }
        self.out.push_str("class ");
        self.out.push_str(&node.name);
        if let Some(parent) = &node.extends {
            self.out.push_str(" extends ");
            self.out.push_str(parent);
        }
        if !node.implements.is_empty() {
            self.out.push_str(" implements ");
            self.out.push_str(&node.implements.join(", "));
        }
        self.out.push_str(" {\n");
        self.indent += 1;
        for constant in &node.consts {
            self.out.push_str(&self.indent_str());
            self.out.push_str(&format!("const {} = {};\n", constant.name, print_expression(&constant.value)));
        }
        for property in &node.properties {
            self.out.push_str(&self.indent_str());
            self.out.push_str(&print_modifiers(&property.modifiers));
            self.out.push_str(&format!("${}", property.name));
            if let Some(default) = &property.default {
                self.out.push_str(&format!(" = {}", print_expression(default)));
            }
            self.out.push_str(";\n");
        }
        for method in &node.methods {
            self.out.push_str(&self.indent_str());
            self.out.push_str(&print_modifiers(&method.modifiers));
            self.out.push_str("function ");
            self.out.push_str(&method.name);
            self.out.push('(');
            self.out.push_str(&print_params(&method.params));
            self.out.push(')');
            match &method.body {
                Some(body) => {
                    self.out.push(' ');
                    self.print_block(body);
                }
                None => self.out.push_str(";\n"),
            }
        }
        self.indent -= 1;
        self.out.push_str(&self.indent_str());
        self.out.push_str("}\n");
    }
}

fn print_modifiers(modifiers: &[Modifier]) -> String {
    if modifiers.is_empty() {
        return String::new();
    }
    let mut out = modifiers
        .iter()
        .map(|m| match m {
            Modifier::Public => "public",
            Modifier::Private => "private",
            Modifier::Protected => "protected",
            Modifier::Static => "static",
            Modifier::Abstract => "abstract",
            Modifier::Final => "final",
            Modifier::Readonly => "readonly",
        })
        .collect::<Vec<_>>()
        .join(" ");
    out.push(' ');
    out
}

fn print_params(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| {
            let mut s = String::new();
            if let Some(ty) = &p.type_hint {
                s.push_str(ty);
                s.push(' ');
            }
            if p.by_ref {
                s.push('&');
            }
            if p.variadic {
                s.push_str("...");
            }
            s.push('$');
            s.push_str(&p.name);
            if let Some(default) = &p.default {
                s.push_str(" = ");
                s.push_str(&print_expression(default));
            }
            s
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn print_expression(expression: &Expression) -> String {
    match expression {
        Expression::Literal(literal) => print_literal(literal),
        Expression::InterpolatedString(s) => print_interpolated(s),
        Expression::Variable(v) => format!("${}", v.name),
        Expression::Name(n) => n.value.clone(),
        Expression::Assignment(a) => {
            format!("{} {} {}", print_expression(&a.target), assign_op_str(a.op), print_expression(&a.value))
        }
        Expression::Binary(b) => {
            format!("{} {} {}", print_expression(&b.lhs), binary_op_str(b.op), print_expression(&b.rhs))
        }
        Expression::Unary(u) => match u.op {
            UnaryOp::Negate => format!("-{}", print_expression(&u.operand)),
            UnaryOp::Plus => format!("+{}", print_expression(&u.operand)),
            UnaryOp::Not => format!("!{}", print_expression(&u.operand)),
            UnaryOp::Reference => format!("&{}", print_expression(&u.operand)),
        },
        Expression::IncDec(i) => match i.op {
            IncDecOp::PreIncrement => format!("++{}", print_expression(&i.operand)),
            IncDecOp::PreDecrement => format!("--{}", print_expression(&i.operand)),
            IncDecOp::PostIncrement => format!("{}++", print_expression(&i.operand)),
            IncDecOp::PostDecrement => format!("{}--", print_expression(&i.operand)),
        },
        Expression::Call(c) => print_call(c),
        Expression::PropertyAccess(p) => format!("{}->{}", print_expression(&p.object), p.name),
        Expression::ArrayAccess(a) => format!("{}[{}]", print_expression(&a.array), print_expression(&a.index)),
        Expression::Array(a) => {
            let elements = a
                .elements
                .iter()
                .map(|e| match &e.key {
                    Some(key) => format!("{} => {}", print_expression(key), print_expression(&e.value)),
                    None => print_expression(&e.value),
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{elements}]")
        }
        Expression::Ternary(t) => match &t.then {
            Some(then) => {
                format!("{} ? {} : {}", print_expression(&t.condition), print_expression(then), print_expression(&t.otherwise))
            }
            None => format!("{} ?: {}", print_expression(&t.condition), print_expression(&t.otherwise)),
        },
        Expression::Isset(i) => format!("isset({})", i.variables.iter().map(print_expression).collect::<Vec<_>>().join(", ")),
        Expression::Unset(u) => format!("unset({})", u.variables.iter().map(print_expression).collect::<Vec<_>>().join(", ")),
        Expression::Empty(e) => format!("empty({})", print_expression(&e.value)),
        Expression::Parenthesized(inner) => format!("({})", print_expression(inner)),
    }
}

fn print_call(call: &Call) -> String {
    let arguments = call.arguments.iter().map(print_expression).collect::<Vec<_>>().join(", ");
    match &call.target {
        CallTarget::Function(name) => format!("{}({arguments})", name.value),
        CallTarget::Method { object, name } => format!("{}->{}({arguments})", print_expression(object), name),
        CallTarget::StaticMethod { class, name } => format!("{}::{}({arguments})", class.value, name),
    }
}

fn print_literal(literal: &Literal) -> String {
    match literal {
        Literal::Integer { raw, .. } => raw.clone(),
        Literal::Float { raw, .. } => raw.clone(),
        Literal::String { value, quote: QuoteKind::Single, .. } => {
            format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
        }
        Literal::String { value, quote: QuoteKind::Double, .. } => {
            format!("\"{}\"", escape_double_quoted(value))
        }
        Literal::Bool { value, .. } => if *value { "true".to_string() } else { "false".to_string() },
        Literal::Null { .. } => "null".to_string(),
    }
}

fn print_interpolated(node: &InterpolatedString) -> String {
    let mut body = String::new();
    for part in &node.parts {
        match part {
            StringPart::Literal(text) => body.push_str(&escape_double_quoted(text)),
            StringPart::Variable(v) => body.push_str(&format!("${{{}}}", v.name)),
            StringPart::BracedExpression(expr) => body.push_str(&format!("{{{}}}", print_expression(expr))),
        }
    }
    format!("\"{body}\"")
}

fn escape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '$' => out.push_str("\\$"),
            other => out.push(other),
        }
    }
    out
}

fn assign_op_str(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => "=",
        AssignOp::AddAssign => "+=",
        AssignOp::SubAssign => "-=",
        AssignOp::MulAssign => "*=",
        AssignOp::DivAssign => "/=",
        AssignOp::ModAssign => "%=",
        AssignOp::ConcatAssign => ".=",
    }
}

fn binary_op_str(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Concat => ".",
        BinaryOp::Eq => "==",
        BinaryOp::Identical => "===",
        BinaryOp::NotEq => "!=",
        BinaryOp::NotIdentical => "!==",
        BinaryOp::Lt => "<",
        BinaryOp::Gt => ">",
        BinaryOp::Le => "<=",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::Coalesce => "??",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn prints_simple_echo() {
        let result = parse("<?php echo \"hello\";");
        let printed = print_program(&result.program);
        assert_eq!(printed, "<?php\necho \"hello\";\n");
    }

    #[test]
    fn printer_is_idempotent_after_reparse() {
        let result = parse("<?php function f($a, $b = 1) { return $a + $b; }");
        let once = print_program(&result.program);
        let reparsed = parse(&once);
        let twice = print_program(&reparsed.program);
        assert_eq!(once, twice);
    }
}
