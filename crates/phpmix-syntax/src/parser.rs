//! Recursive-descent parser over the token stream produced by [`crate::lexer::Lexer`].
//!
//! Diagnostics are partitioned into fatal and recoverable: a recoverable error skips
//! to the next statement boundary and keeps going; nothing in this implementation
//! currently produces a fatal error (the
//! parser always manages to return *some* root), but the field exists so the
//! orchestrator's `abort_on_error` handling has something real to branch on.

use crate::ast::*;
use crate::lexer::Lexer;
use crate::token::{Span, Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub fatal: bool,
}

pub struct ParseResult {
    pub program: Program,
    pub diagnostics: Vec<ParseError>,
    /// Every comment the lexer produced, reconstructed to its original delimited text
    /// (`// ...`, `/* ... */`, `/** ... */`) in source order. The AST carries no
    /// comment nodes, so this flat list is the only record of a file's comments once
    /// parsing is done; the comment-stripper pass reads it back when disabled.
    pub comments: Vec<String>,
}

pub fn parse(source: &str) -> ParseResult {
    let (tokens, lex_errors) = Lexer::new(source).tokenize();
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();

    let mut diagnostics: Vec<ParseError> =
        lex_errors.into_iter().map(|e| ParseError { message: e.message, span: e.span, fatal: false }).collect();
    diagnostics.extend(parser.diagnostics);

    ParseResult { program, diagnostics, comments: parser.comments }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    next_id: NodeId,
    diagnostics: Vec<ParseError>,
    comments: Vec<String>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, next_id: 0, diagnostics: Vec::new(), comments: Vec::new() }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn peek(&self) -> &TokenKind {
        self.tokens.get(self.pos).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        self.tokens.get(self.pos + offset).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    fn span(&self) -> Span {
        self.tokens.get(self.pos).map(|t| t.span).unwrap_or(Span::new(0, 0))
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens.get(self.pos).cloned().unwrap_or(Token { kind: TokenKind::Eof, span: self.span() });
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if std::mem::discriminant(self.peek()) == std::mem::discriminant(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) {
        if !self.eat(kind) {
            self.error(format!("expected {what}"), false);
        }
    }

    fn error(&mut self, message: String, fatal: bool) {
        self.diagnostics.push(ParseError { message, span: self.span(), fatal });
    }

    /// Skip trivia tokens (comments), recording each one's reconstructed source text
    /// into `self.comments` before discarding it; the parser never builds comment
    /// nodes into the tree it returns, so this list is the only trace of a file's
    /// comments left once parsing finishes.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek().clone() {
                TokenKind::LineComment(text) => {
                    self.comments.push(format!("//{text}"));
                    self.advance();
                }
                TokenKind::BlockComment(text) | TokenKind::DocComment(text) => {
                    self.comments.push(format!("/*{text}*/"));
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        loop {
            self.skip_trivia();
            if self.at_eof() {
                break;
            }
            if matches!(self.peek(), TokenKind::OpenTag | TokenKind::CloseTag) {
                self.advance();
                continue;
            }
            if let TokenKind::InlineHtml(html) = self.peek().clone() {
                let start = self.span();
                self.advance();
                statements.push(Statement::InlineHtml(InlineHtml {
                    id: self.fresh_id(),
                    span: start,
                    value: html,
                }));
                continue;
            }
            statements.push(self.parse_statement());
        }
        Program { id: self.fresh_id(), span: Span::new(0, self.tokens.last().map(|t| t.span.end).unwrap_or(0)), statements }
    }

    fn synchronize(&mut self) {
        while !self.at_eof() && !matches!(self.peek(), TokenKind::Semicolon | TokenKind::RBrace) {
            self.advance();
        }
        self.eat(&TokenKind::Semicolon);
    }

    fn parse_block(&mut self) -> Block {
        let start = self.span();
        if !self.eat(&TokenKind::LBrace) {
            self.error("expected '{'".to_string(), false);
            let id = self.fresh_id();
            return Block { id, span: start, statements: Vec::new() };
        }
        let mut statements = Vec::new();
        loop {
            self.skip_trivia();
            if self.at_eof() || matches!(self.peek(), TokenKind::RBrace) {
                break;
            }
            statements.push(self.parse_statement());
        }
        let end = self.span();
        self.expect(&TokenKind::RBrace, "'}'");
        Block { id: self.fresh_id(), span: start.join(end), statements }
    }

    /// Parses either a `{ ... }` block or, for the colon-less single-statement forms
    /// PHP allows after `if`/`while`/`for`/`foreach`, a single statement wrapped as a
    /// one-element block so every pass can treat loop/branch bodies uniformly.
    fn parse_body(&mut self) -> Block {
        if matches!(self.peek(), TokenKind::LBrace) {
            return self.parse_block();
        }
        let start = self.span();
        let statement = self.parse_statement();
        let end_span = statement_span(&statement);
        Block { id: self.fresh_id(), span: start.join(end_span), statements: vec![statement] }
    }

    fn parse_statement(&mut self) -> Statement {
        self.skip_trivia();
        match self.peek().clone() {
            TokenKind::LBrace => Statement::Block(self.parse_block()),
            TokenKind::Semicolon => {
                let span = self.span();
                self.advance();
                Statement::Noop(self.fresh_id(), span)
            }
            TokenKind::KwEcho => self.parse_echo(),
            TokenKind::KwFunction => self.parse_function(),
            TokenKind::KwClass | TokenKind::KwAbstract | TokenKind::KwFinal if self.looks_like_class() => {
                self.parse_class()
            }
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwDo => self.parse_do_while(),
            TokenKind::KwFor => self.parse_for(),
            TokenKind::KwForeach => self.parse_foreach(),
            TokenKind::KwSwitch => self.parse_switch(),
            TokenKind::KwReturn => self.parse_return(),
            TokenKind::KwBreak => self.parse_break(),
            TokenKind::KwContinue => self.parse_continue(),
            TokenKind::KwGlobal => self.parse_global(),
            TokenKind::InlineHtml(html) => {
                let span = self.span();
                self.advance();
                Statement::InlineHtml(InlineHtml { id: self.fresh_id(), span, value: html })
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn looks_like_class(&self) -> bool {
        let mut offset = 0;
        while matches!(self.peek_at(offset), TokenKind::KwAbstract | TokenKind::KwFinal) {
            offset += 1;
        }
        matches!(self.peek_at(offset), TokenKind::KwClass)
    }

    fn parse_echo(&mut self) -> Statement {
        let start = self.span();
        self.advance();
        let mut values = vec![self.parse_expression()];
        while self.eat(&TokenKind::Comma) {
            values.push(self.parse_expression());
        }
        let end = self.span();
        self.expect(&TokenKind::Semicolon, "';'");
        Statement::Echo(Echo { id: self.fresh_id(), span: start.join(end), values })
    }

    fn parse_expression_statement(&mut self) -> Statement {
        let start = self.span();
        let expression = self.parse_expression();
        let end = self.span();
        if !self.eat(&TokenKind::Semicolon) {
            self.error("expected ';' after expression".to_string(), false);
            self.synchronize();
        }
        Statement::Expression(ExpressionStatement { id: self.fresh_id(), span: start.join(end), expression })
    }

    fn parse_param_list(&mut self) -> Vec<Param> {
        self.expect(&TokenKind::LParen, "'('");
        let mut params = Vec::new();
        while !matches!(self.peek(), TokenKind::RParen | TokenKind::Eof) {
            // Skip an optional type hint: a run of identifiers/`?`/`|` before the `$name`.
            let mut type_hint = None;
            let mut hint_parts = Vec::new();
            loop {
                match self.peek().clone() {
                    TokenKind::Identifier(name) => {
                        hint_parts.push(name);
                        self.advance();
                        if matches!(self.peek(), TokenKind::Dot) {
                            // not part of a type; bail defensively
                            break;
                        }
                    }
                    TokenKind::Question => {
                        hint_parts.push("?".to_string());
                        self.advance();
                    }
                    _ => break,
                }
            }
            if !hint_parts.is_empty() {
                type_hint = Some(hint_parts.join(""));
            }
            let by_ref = self.eat(&TokenKind::Amp);
            let variadic = self.eat_ellipsis();
            let name = self.parse_variable_name();
            let default = if self.eat(&TokenKind::Eq) { Some(self.parse_expression()) } else { None };
            params.push(Param { name, by_ref, variadic, type_hint, default });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')'");
        params
    }

    fn eat_ellipsis(&mut self) -> bool {
        // `...` is lexed as three `Dot` tokens since our lexer doesn't special-case it.
        if matches!(self.peek(), TokenKind::Dot)
            && matches!(self.peek_at(1), TokenKind::Dot)
            && matches!(self.peek_at(2), TokenKind::Dot)
        {
            self.advance();
            self.advance();
            self.advance();
            true
        } else {
            false
        }
    }

    fn parse_variable_name(&mut self) -> String {
        match self.peek().clone() {
            TokenKind::Variable(name) => {
                self.advance();
                name
            }
            _ => {
                self.error("expected variable".to_string(), false);
                String::new()
            }
        }
    }

    fn parse_function(&mut self) -> Statement {
        let start = self.span();
        self.advance();
        let by_ref = self.eat(&TokenKind::Amp);
        let name = self.parse_identifier_name();
        let params = self.parse_param_list();
        let return_type = if self.eat(&TokenKind::Colon) { Some(self.parse_type_hint()) } else { None };
        let body = self.parse_block();
        let span = start.join(body.span);
        Statement::Function(FunctionDecl { id: self.fresh_id(), span, name, by_ref, params, return_type, body })
    }

    fn parse_type_hint(&mut self) -> String {
        let mut parts = Vec::new();
        loop {
            match self.peek().clone() {
                TokenKind::Identifier(name) => {
                    parts.push(name);
                    self.advance();
                }
                TokenKind::Question => {
                    parts.push("?".to_string());
                    self.advance();
                }
                _ => break,
            }
        }
        parts.join("")
    }

    fn parse_identifier_name(&mut self) -> String {
        match self.peek().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                name
            }
            TokenKind::KwClass => {
                self.advance();
                "class".to_string()
            }
            _ => {
                self.error("expected identifier".to_string(), false);
                String::new()
            }
        }
    }

    fn parse_class(&mut self) -> Statement {
        let start = self.span();
        let mut is_abstract = false;
        let mut is_final = false;
        loop {
            match self.peek() {
                TokenKind::KwAbstract => {
                    is_abstract = true;
                    self.advance();
                }
                TokenKind::KwFinal => {
                    is_final = true;
                    self.advance();
                }
                _ => break,
            }
        }
        self.expect(&TokenKind::KwClass, "'class'");
        let name = self.parse_identifier_name();
        let extends = if self.eat(&TokenKind::KwExtends) { Some(self.parse_identifier_name()) } else { None };
        let mut implements = Vec::new();
        if self.eat(&TokenKind::KwImplements) {
            implements.push(self.parse_identifier_name());
            while self.eat(&TokenKind::Comma) {
                implements.push(self.parse_identifier_name());
            }
        }

        self.expect(&TokenKind::LBrace, "'{'");
        let mut consts = Vec::new();
        let mut properties = Vec::new();
        let mut methods = Vec::new();
        while !matches!(self.peek(), TokenKind::RBrace | TokenKind::Eof) {
            self.skip_trivia();
            if matches!(self.peek(), TokenKind::RBrace) {
                break;
            }
            let modifiers = self.parse_modifiers();
            if self.eat(&TokenKind::KwConst) {
                loop {
                    let name = self.parse_identifier_name();
                    self.expect(&TokenKind::Eq, "'='");
                    let value = self.parse_expression();
                    consts.push(ClassConst { name, value });
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::Semicolon, "';'");
            } else if self.eat(&TokenKind::KwFunction) {
                self.eat(&TokenKind::Amp);
                let name = self.parse_identifier_name();
                let params = self.parse_param_list();
                if self.eat(&TokenKind::Colon) {
                    self.parse_type_hint();
                }
                let body = if modifiers.contains(&Modifier::Abstract) || is_abstract && !matches!(self.peek(), TokenKind::LBrace) {
                    self.eat(&TokenKind::Semicolon);
                    None
                } else {
                    Some(self.parse_block())
                };
                let span = start;
                methods.push(MethodDecl { id: self.fresh_id(), span, name, modifiers, params, body });
            } else if matches!(self.peek(), TokenKind::Variable(_)) {
                loop {
                    let name = self.parse_variable_name();
                    let default = if self.eat(&TokenKind::Eq) { Some(self.parse_expression()) } else { None };
                    properties.push(PropertyDecl { name, modifiers: modifiers.clone(), default });
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::Semicolon, "';'");
            } else {
                // Unrecognized class member (e.g. a type-hinted property); skip defensively.
                self.error("unrecognized class member".to_string(), false);
                self.synchronize();
            }
        }
        let end = self.span();
        self.expect(&TokenKind::RBrace, "'}'");

        Statement::Class(ClassDecl {
            id: self.fresh_id(),
            span: start.join(end),
            name,
            is_abstract,
            is_final,
            extends,
            implements,
            consts,
            properties,
            methods,
        })
    }

    fn parse_modifiers(&mut self) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        loop {
            let modifier = match self.peek() {
                TokenKind::KwPublic => Modifier::Public,
                TokenKind::KwPrivate => Modifier::Private,
                TokenKind::KwProtected => Modifier::Protected,
                TokenKind::KwStatic => Modifier::Static,
                TokenKind::KwAbstract => Modifier::Abstract,
                TokenKind::KwFinal => Modifier::Final,
                TokenKind::KwReadonly => Modifier::Readonly,
                _ => break,
            };
            modifiers.push(modifier);
            self.advance();
        }
        modifiers
    }

    fn parse_if(&mut self) -> Statement {
        let start = self.span();
        self.advance();
        self.expect(&TokenKind::LParen, "'('");
        let condition = Box::new(self.parse_expression());
        self.expect(&TokenKind::RParen, "')'");
        let then = self.parse_body();
        let mut else_ifs = Vec::new();
        let mut otherwise = None;
        loop {
            if matches!(self.peek(), TokenKind::KwElseIf) {
                self.advance();
                self.expect(&TokenKind::LParen, "'('");
                let cond = self.parse_expression();
                self.expect(&TokenKind::RParen, "')'");
                let body = self.parse_body();
                else_ifs.push((cond, body));
            } else if matches!(self.peek(), TokenKind::KwElse) {
                self.advance();
                if matches!(self.peek(), TokenKind::KwIf) {
                    self.advance();
                    self.expect(&TokenKind::LParen, "'('");
                    let cond = self.parse_expression();
                    self.expect(&TokenKind::RParen, "')'");
                    let body = self.parse_body();
                    else_ifs.push((cond, body));
                } else {
                    otherwise = Some(self.parse_body());
                    break;
                }
            } else {
                break;
            }
        }
        let end = otherwise.as_ref().map(|b| b.span).unwrap_or_else(|| else_ifs.last().map(|(_, b)| b.span).unwrap_or(then.span));
        Statement::If(If { id: self.fresh_id(), span: start.join(end), condition, then, else_ifs, otherwise })
    }

    fn parse_while(&mut self) -> Statement {
        let start = self.span();
        self.advance();
        self.expect(&TokenKind::LParen, "'('");
        let condition = Box::new(self.parse_expression());
        self.expect(&TokenKind::RParen, "')'");
        let body = self.parse_body();
        let span = start.join(body.span);
        Statement::While(While { id: self.fresh_id(), span, condition, body })
    }

    fn parse_do_while(&mut self) -> Statement {
        let start = self.span();
        self.advance();
        let body = self.parse_body();
        self.expect(&TokenKind::KwWhile, "'while'");
        self.expect(&TokenKind::LParen, "'('");
        let condition = Box::new(self.parse_expression());
        self.expect(&TokenKind::RParen, "')'");
        let end = self.span();
        self.expect(&TokenKind::Semicolon, "';'");
        Statement::DoWhile(DoWhile { id: self.fresh_id(), span: start.join(end), body, condition })
    }

    fn parse_for(&mut self) -> Statement {
        let start = self.span();
        self.advance();
        self.expect(&TokenKind::LParen, "'('");
        let init = self.parse_expr_list_until(&TokenKind::Semicolon);
        self.expect(&TokenKind::Semicolon, "';'");
        let condition = self.parse_expr_list_until(&TokenKind::Semicolon);
        self.expect(&TokenKind::Semicolon, "';'");
        let step = self.parse_expr_list_until(&TokenKind::RParen);
        self.expect(&TokenKind::RParen, "')'");
        let body = self.parse_body();
        let span = start.join(body.span);
        Statement::For(For { id: self.fresh_id(), span, init, condition, step, body })
    }

    fn parse_expr_list_until(&mut self, terminator: &TokenKind) -> Vec<Expression> {
        let mut list = Vec::new();
        if std::mem::discriminant(self.peek()) == std::mem::discriminant(terminator) {
            return list;
        }
        list.push(self.parse_expression());
        while self.eat(&TokenKind::Comma) {
            list.push(self.parse_expression());
        }
        list
    }

    fn parse_foreach(&mut self) -> Statement {
        let start = self.span();
        self.advance();
        self.expect(&TokenKind::LParen, "'('");
        let subject = Box::new(self.parse_expression());
        self.expect(&TokenKind::KwAs, "'as'");
        let mut by_ref = self.eat(&TokenKind::Amp);
        let first = self.parse_expression();
        let (key, value) = if self.eat(&TokenKind::DoubleArrow) {
            by_ref = self.eat(&TokenKind::Amp);
            (Some(first), self.parse_expression())
        } else {
            (None, first)
        };
        self.expect(&TokenKind::RParen, "')'");
        let body = self.parse_body();
        let span = start.join(body.span);
        Statement::Foreach(Foreach { id: self.fresh_id(), span, subject, key, value: Box::new(value), by_ref, body })
    }

    fn parse_switch(&mut self) -> Statement {
        let start = self.span();
        self.advance();
        self.expect(&TokenKind::LParen, "'('");
        let subject = Box::new(self.parse_expression());
        self.expect(&TokenKind::RParen, "')'");
        self.expect(&TokenKind::LBrace, "'{'");
        let mut cases = Vec::new();
        while !matches!(self.peek(), TokenKind::RBrace | TokenKind::Eof) {
            self.skip_trivia();
            let test = if self.eat(&TokenKind::KwCase) {
                let expr = self.parse_expression();
                Some(expr)
            } else if self.eat(&TokenKind::KwDefault) {
                None
            } else {
                self.error("expected 'case' or 'default'".to_string(), false);
                self.synchronize();
                continue;
            };
            if !self.eat(&TokenKind::Colon) {
                self.eat(&TokenKind::Semicolon);
            }
            let mut body = Vec::new();
            while !matches!(self.peek(), TokenKind::KwCase | TokenKind::KwDefault | TokenKind::RBrace | TokenKind::Eof) {
                body.push(self.parse_statement());
            }
            cases.push(SwitchCase { test, body });
        }
        let end = self.span();
        self.expect(&TokenKind::RBrace, "'}'");
        Statement::Switch(Switch { id: self.fresh_id(), span: start.join(end), subject, cases })
    }

    fn parse_return(&mut self) -> Statement {
        let start = self.span();
        self.advance();
        let value = if matches!(self.peek(), TokenKind::Semicolon) { None } else { Some(self.parse_expression()) };
        let end = self.span();
        self.expect(&TokenKind::Semicolon, "';'");
        Statement::Return(Return { id: self.fresh_id(), span: start.join(end), value })
    }

    fn parse_break(&mut self) -> Statement {
        let start = self.span();
        self.advance();
        let level = self.parse_optional_level();
        let end = self.span();
        self.expect(&TokenKind::Semicolon, "';'");
        Statement::Break(Break { id: self.fresh_id(), span: start.join(end), level })
    }

    fn parse_continue(&mut self) -> Statement {
        let start = self.span();
        self.advance();
        let level = self.parse_optional_level();
        let end = self.span();
        self.expect(&TokenKind::Semicolon, "';'");
        Statement::Continue(Continue { id: self.fresh_id(), span: start.join(end), level })
    }

    fn parse_optional_level(&mut self) -> Option<u32> {
        if let TokenKind::Integer(raw) = self.peek().clone() {
            self.advance();
            raw.parse().ok()
        } else {
            None
        }
    }

    fn parse_global(&mut self) -> Statement {
        let start = self.span();
        self.advance();
        let mut variables = vec![self.parse_variable_name()];
        while self.eat(&TokenKind::Comma) {
            variables.push(self.parse_variable_name());
        }
        let end = self.span();
        self.expect(&TokenKind::Semicolon, "';'");
        Statement::Global(GlobalStatement { id: self.fresh_id(), span: start.join(end), variables })
    }

    // -- Expressions ---------------------------------------------------

    fn parse_expression(&mut self) -> Expression {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Expression {
        let lhs = self.parse_ternary();
        let op = match self.peek() {
            TokenKind::Eq => Some(AssignOp::Assign),
            TokenKind::PlusEq => Some(AssignOp::AddAssign),
            TokenKind::MinusEq => Some(AssignOp::SubAssign),
            TokenKind::StarEq => Some(AssignOp::MulAssign),
            TokenKind::SlashEq => Some(AssignOp::DivAssign),
            TokenKind::PercentEq => Some(AssignOp::ModAssign),
            TokenKind::DotEq => Some(AssignOp::ConcatAssign),
            _ => None,
        };
        let Some(op) = op else { return lhs };
        let start = lhs.span();
        self.advance();
        let value = self.parse_assignment();
        let span = start.join(value.span());
        Expression::Assignment(Assignment { id: self.fresh_id(), span, target: Box::new(lhs), op, value: Box::new(value) })
    }

    fn parse_ternary(&mut self) -> Expression {
        let condition = self.parse_coalesce();
        if self.eat(&TokenKind::Question) {
            let start = condition.span();
            let then = if matches!(self.peek(), TokenKind::Colon) { None } else { Some(Box::new(self.parse_expression())) };
            self.expect(&TokenKind::Colon, "':'");
            let otherwise = Box::new(self.parse_assignment());
            let span = start.join(otherwise.span());
            return Expression::Ternary(Ternary { id: self.fresh_id(), span, condition: Box::new(condition), then, otherwise });
        }
        condition
    }

    fn parse_coalesce(&mut self) -> Expression {
        let lhs = self.parse_logical_or();
        if self.eat(&TokenKind::QuestionQuestion) {
            let rhs = self.parse_coalesce();
            let span = lhs.span().join(rhs.span());
            return Expression::Binary(Binary { id: self.fresh_id(), span, op: BinaryOp::Coalesce, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        lhs
    }

    fn parse_logical_or(&mut self) -> Expression {
        let mut lhs = self.parse_logical_and();
        while self.eat(&TokenKind::PipePipe) {
            let rhs = self.parse_logical_and();
            let span = lhs.span().join(rhs.span());
            lhs = Expression::Binary(Binary { id: self.fresh_id(), span, op: BinaryOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        lhs
    }

    fn parse_logical_and(&mut self) -> Expression {
        let mut lhs = self.parse_equality();
        while self.eat(&TokenKind::AmpAmp) {
            let rhs = self.parse_equality();
            let span = lhs.span().join(rhs.span());
            lhs = Expression::Binary(Binary { id: self.fresh_id(), span, op: BinaryOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        lhs
    }

    fn parse_equality(&mut self) -> Expression {
        let mut lhs = self.parse_relational();
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::EqEqEq => BinaryOp::Identical,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::NotEqEq => BinaryOp::NotIdentical,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_relational();
            let span = lhs.span().join(rhs.span());
            lhs = Expression::Binary(Binary { id: self.fresh_id(), span, op, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        lhs
    }

    fn parse_relational(&mut self) -> Expression {
        let mut lhs = self.parse_concat();
        loop {
            let op = match self.peek() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_concat();
            let span = lhs.span().join(rhs.span());
            lhs = Expression::Binary(Binary { id: self.fresh_id(), span, op, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        lhs
    }

    fn parse_concat(&mut self) -> Expression {
        let mut lhs = self.parse_additive();
        while matches!(self.peek(), TokenKind::Dot) {
            self.advance();
            let rhs = self.parse_additive();
            let span = lhs.span().join(rhs.span());
            lhs = Expression::Binary(Binary { id: self.fresh_id(), span, op: BinaryOp::Concat, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        lhs
    }

    fn parse_additive(&mut self) -> Expression {
        let mut lhs = self.parse_multiplicative();
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative();
            let span = lhs.span().join(rhs.span());
            lhs = Expression::Binary(Binary { id: self.fresh_id(), span, op, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        lhs
    }

    fn parse_multiplicative(&mut self) -> Expression {
        let mut lhs = self.parse_unary();
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary();
            let span = lhs.span().join(rhs.span());
            lhs = Expression::Binary(Binary { id: self.fresh_id(), span, op, lhs: Box::new(lhs), rhs: Box::new(rhs) });
        }
        lhs
    }

    fn parse_unary(&mut self) -> Expression {
        let start = self.span();
        let op = match self.peek() {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Negate),
            TokenKind::Plus => Some(UnaryOp::Plus),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary();
            let span = start.join(operand.span());
            return Expression::Unary(Unary { id: self.fresh_id(), span, op, operand: Box::new(operand) });
        }
        if matches!(self.peek(), TokenKind::PlusPlus | TokenKind::MinusMinus) {
            let is_inc = matches!(self.peek(), TokenKind::PlusPlus);
            self.advance();
            let operand = self.parse_unary();
            let span = start.join(operand.span());
            let op = if is_inc { IncDecOp::PreIncrement } else { IncDecOp::PreDecrement };
            return Expression::IncDec(IncDec { id: self.fresh_id(), span, op, operand: Box::new(operand) });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Expression {
        let mut expr = self.parse_primary();
        loop {
            match self.peek() {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression();
                    let end = self.span();
                    self.expect(&TokenKind::RBracket, "']'");
                    let span = expr.span().join(end);
                    expr = Expression::ArrayAccess(ArrayAccess { id: self.fresh_id(), span, array: Box::new(expr), index: Box::new(index) });
                }
                TokenKind::Arrow => {
                    self.advance();
                    let name = self.parse_identifier_name();
                    let span = expr.span();
                    if matches!(self.peek(), TokenKind::LParen) {
                        let arguments = self.parse_arguments();
                        expr = Expression::Call(Call {
                            id: self.fresh_id(),
                            span,
                            target: CallTarget::Method { object: Box::new(expr), name },
                            arguments,
                        });
                    } else {
                        expr = Expression::PropertyAccess(PropertyAccess {
                            id: self.fresh_id(),
                            span,
                            object: Box::new(expr),
                            name,
                        });
                    }
                }
                TokenKind::DoubleColon => {
                    self.advance();
                    let name = self.parse_identifier_name();
                    let class_name = match &expr {
                        Expression::Name(n) => n.clone(),
                        _ => Name { id: self.fresh_id(), span: expr.span(), value: String::new() },
                    };
                    if matches!(self.peek(), TokenKind::LParen) {
                        let arguments = self.parse_arguments();
                        let span = expr.span();
                        expr = Expression::Call(Call {
                            id: self.fresh_id(),
                            span,
                            target: CallTarget::StaticMethod { class: class_name, name },
                            arguments,
                        });
                    }
                }
                TokenKind::LParen => {
                    let arguments = self.parse_arguments();
                    let span = expr.span();
                    let target = match &expr {
                        Expression::Name(n) => CallTarget::Function(n.clone()),
                        _ => CallTarget::Function(Name { id: self.fresh_id(), span, value: String::new() }),
                    };
                    expr = Expression::Call(Call { id: self.fresh_id(), span, target, arguments });
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let is_inc = matches!(self.peek(), TokenKind::PlusPlus);
                    let end = self.span();
                    self.advance();
                    let span = expr.span().join(end);
                    let op = if is_inc { IncDecOp::PostIncrement } else { IncDecOp::PostDecrement };
                    expr = Expression::IncDec(IncDec { id: self.fresh_id(), span, op, operand: Box::new(expr) });
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_arguments(&mut self) -> Vec<Expression> {
        self.expect(&TokenKind::LParen, "'('");
        let mut arguments = Vec::new();
        while !matches!(self.peek(), TokenKind::RParen | TokenKind::Eof) {
            arguments.push(self.parse_expression());
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')'");
        arguments
    }

    fn parse_primary(&mut self) -> Expression {
        let start = self.span();
        match self.peek().clone() {
            TokenKind::Integer(raw) => {
                self.advance();
                let value = raw.replace('_', "").parse().unwrap_or_default();
                Expression::Literal(Literal::Integer { id: self.fresh_id(), span: start, raw, value })
            }
            TokenKind::Float(raw) => {
                self.advance();
                let value = raw.parse().unwrap_or_default();
                Expression::Literal(Literal::Float { id: self.fresh_id(), span: start, raw, value })
            }
            TokenKind::SingleQuotedString(value) => {
                self.advance();
                let raw = value.clone();
                Expression::Literal(Literal::String { id: self.fresh_id(), span: start, raw, value, quote: QuoteKind::Single })
            }
            TokenKind::DoubleQuotedString(raw) => {
                self.advance();
                self.parse_double_quoted(raw, start)
            }
            TokenKind::KwTrue => {
                self.advance();
                Expression::Literal(Literal::Bool { id: self.fresh_id(), span: start, value: true })
            }
            TokenKind::KwFalse => {
                self.advance();
                Expression::Literal(Literal::Bool { id: self.fresh_id(), span: start, value: false })
            }
            TokenKind::KwNull => {
                self.advance();
                Expression::Literal(Literal::Null { id: self.fresh_id(), span: start })
            }
            TokenKind::Variable(name) => {
                self.advance();
                Expression::Variable(Variable { id: self.fresh_id(), span: start, name })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Expression::Name(Name { id: self.fresh_id(), span: start, value: name })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression();
                self.expect(&TokenKind::RParen, "')'");
                Expression::Parenthesized(Box::new(inner))
            }
            TokenKind::LBracket => self.parse_array_literal(start, TokenKind::RBracket),
            TokenKind::KwArray => {
                self.advance();
                self.parse_array_literal(start, TokenKind::RParen)
            }
            TokenKind::KwIsset => {
                self.advance();
                let variables = self.parse_paren_expr_list();
                let end = self.span();
                Expression::Isset(Isset { id: self.fresh_id(), span: start.join(end), variables })
            }
            TokenKind::KwUnset => {
                self.advance();
                let variables = self.parse_paren_expr_list();
                let end = self.span();
                Expression::Unset(Unset { id: self.fresh_id(), span: start.join(end), variables })
            }
            TokenKind::KwEmpty => {
                self.advance();
                self.expect(&TokenKind::LParen, "'('");
                let value = self.parse_expression();
                let end = self.span();
                self.expect(&TokenKind::RParen, "')'");
                Expression::Empty(Empty { id: self.fresh_id(), span: start.join(end), value: Box::new(value) })
            }
            TokenKind::KwNew => {
                self.advance();
                let class_name = self.parse_identifier_name();
                let arguments = if matches!(self.peek(), TokenKind::LParen) { self.parse_arguments() } else { Vec::new() };
                Expression::Call(Call {
                    id: self.fresh_id(),
                    span: start,
                    target: CallTarget::Function(Name { id: self.fresh_id(), span: start, value: format!("new {class_name}") }),
                    arguments,
                })
            }
            other => {
                self.error(format!("unexpected token while parsing expression: {other:?}"), false);
                self.advance();
                Expression::Literal(Literal::Null { id: self.fresh_id(), span: start })
            }
        }
    }

    fn parse_paren_expr_list(&mut self) -> Vec<Expression> {
        self.expect(&TokenKind::LParen, "'('");
        let mut list = Vec::new();
        while !matches!(self.peek(), TokenKind::RParen | TokenKind::Eof) {
            list.push(self.parse_expression());
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')'");
        list
    }

    fn parse_array_literal(&mut self, start: Span, closing: TokenKind) -> Expression {
        if matches!(closing, TokenKind::RParen) {
            self.expect(&TokenKind::LParen, "'('");
        } else {
            self.expect(&TokenKind::LBracket, "'['");
        }
        let mut elements = Vec::new();
        loop {
            if std::mem::discriminant(self.peek()) == std::mem::discriminant(&closing) {
                break;
            }
            let first = self.parse_expression();
            let element = if self.eat(&TokenKind::DoubleArrow) {
                let value = self.parse_expression();
                ArrayElement { key: Some(first), value }
            } else {
                ArrayElement { key: None, value: first }
            };
            elements.push(element);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let end = self.span();
        self.expect(&closing, "closing bracket");
        Expression::Array(ArrayExpr { id: self.fresh_id(), span: start.join(end), elements })
    }

    /// Decomposes a raw double-quoted string body into literal/variable/braced parts.
    fn parse_double_quoted(&mut self, raw: String, span: Span) -> Expression {
        let parts = decompose_interpolation(&raw);
        if parts.len() == 1 {
            if let InterpPart::Literal(text) = &parts[0] {
                return Expression::Literal(Literal::String {
                    id: self.fresh_id(),
                    span,
                    raw: raw.clone(),
                    value: text.clone(),
                    quote: QuoteKind::Double,
                });
            }
        }

        let mut string_parts = Vec::new();
        for part in parts {
            match part {
                InterpPart::Literal(text) => string_parts.push(StringPart::Literal(text)),
                InterpPart::Variable(name) => {
                    string_parts.push(StringPart::Variable(Variable { id: self.fresh_id(), span, name }))
                }
                InterpPart::Braced(source) => {
                    let inner = parse_embedded_expression(&source, &mut self.next_id);
                    string_parts.push(StringPart::BracedExpression(Box::new(inner)));
                }
            }
        }
        Expression::InterpolatedString(InterpolatedString { id: self.fresh_id(), span, parts: string_parts })
    }
}

fn statement_span(statement: &Statement) -> Span {
    match statement {
        Statement::Block(b) => b.span,
        Statement::Expression(s) => s.span,
        Statement::Echo(s) => s.span,
        Statement::Function(s) => s.span,
        Statement::Class(s) => s.span,
        Statement::If(s) => s.span,
        Statement::While(s) => s.span,
        Statement::DoWhile(s) => s.span,
        Statement::For(s) => s.span,
        Statement::Foreach(s) => s.span,
        Statement::Switch(s) => s.span,
        Statement::Return(s) => s.span,
        Statement::Break(s) => s.span,
        Statement::Continue(s) => s.span,
        Statement::Global(s) => s.span,
        Statement::InlineHtml(s) => s.span,
        Statement::Noop(_, span) => *span,
    }
}

enum InterpPart {
    Literal(String),
    Variable(String),
    Braced(String),
}

/// Splits a raw double-quoted string body (already unescaped of the outer quotes, but
/// still containing backslash escapes) into literal text, `$name` references, and
/// `{$expr}` braced expressions. This is the core of's interpolated-string
/// handling: each part later becomes either a decoder call or an untouched variable.
fn decompose_interpolation(raw: &str) -> Vec<InterpPart> {
    let bytes = raw.as_bytes();
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => {
                literal.push(unescape(bytes[i + 1]));
                i += 2;
            }
            b'$' if i + 1 < bytes.len() && (bytes[i + 1].is_ascii_alphabetic() || bytes[i + 1] == b'_') => {
                if !literal.is_empty() {
                    parts.push(InterpPart::Literal(std::mem::take(&mut literal)));
                }
                let name_start = i + 1;
                let mut j = name_start;
                while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
                    j += 1;
                }
                parts.push(InterpPart::Variable(raw[name_start..j].to_string()));
                i = j;
                // `$arr[key]` and `$obj->prop` simple interpolation forms collapse into
                // the variable name only; index/property access inside a plain `$x[0]`
                // interpolation segment is treated as literal trailing text so printing
                // remains a faithful round-trip for the (rare) unobfuscated case.
                if i < bytes.len() && bytes[i] == b'[' {
                    if let Some(end) = raw[i..].find(']') {
                        literal.push_str(&raw[i..i + end + 1]);
                        i += end + 1;
                    }
                }
            }
            b'{' if i + 1 < bytes.len() && bytes[i + 1] == b'$' => {
                if !literal.is_empty() {
                    parts.push(InterpPart::Literal(std::mem::take(&mut literal)));
                }
                let mut depth = 1usize;
                let mut j = i + 1;
                while j < bytes.len() && depth > 0 {
                    match bytes[j] {
                        b'{' => depth += 1,
                        b'}' => depth -= 1,
                        _ => {}
                    }
                    if depth > 0 {
                        j += 1;
                    }
                }
                parts.push(InterpPart::Braced(raw[i + 1..j].to_string()));
                i = j + 1;
            }
            b => {
                literal.push(b as char);
                i += 1;
            }
        }
    }
    if !literal.is_empty() || parts.is_empty() {
        parts.push(InterpPart::Literal(literal));
    }
    parts
}

fn unescape(b: u8) -> char {
    match b {
        b'n' => '\n',
        b't' => '\t',
        b'r' => '\r',
        b'"' => '"',
        b'\\' => '\\',
        b'$' => '$',
        other => other as char,
    }
}

/// Parses the small expression embedded in a `{$...}` interpolation segment using a
/// fresh sub-parser over just that text, continuing the parent's NodeId counter so ids
/// stay unique across the whole program.
fn parse_embedded_expression(source: &str, next_id: &mut NodeId) -> Expression {
    let wrapped = format!("<?php {source};");
    let (tokens, _errors) = Lexer::new(&wrapped).tokenize();
    let mut sub = Parser::new(tokens);
    sub.next_id = *next_id;
    // Skip the synthetic open tag.
    sub.eat(&TokenKind::OpenTag);
    let expr = sub.parse_expression();
    *next_id = sub.next_id;
    expr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_echo_with_plain_string() {
        let result = parse("<?php echo \"hello\";");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.program.statements.len(), 1);
    }

    #[test]
    fn decomposes_interpolated_string() {
        let result = parse("<?php echo \"Hello $name!\";");
        let Statement::Echo(echo) = &result.program.statements[0] else { panic!("expected echo") };
        let Expression::InterpolatedString(s) = &echo.values[0] else { panic!("expected interpolated string") };
        assert_eq!(s.parts.len(), 3);
    }

    #[test]
    fn parses_function_declaration() {
        let result = parse("<?php function f(){ echo 1; return 2; }");
        assert!(result.diagnostics.is_empty());
        assert!(matches!(result.program.statements[0], Statement::Function(_)));
    }

    #[test]
    fn parses_array_subscript_read() {
        let result = parse("<?php echo $a[0];");
        let Statement::Echo(echo) = &result.program.statements[0] else { panic!("expected echo") };
        assert!(matches!(echo.values[0], Expression::ArrayAccess(_)));
    }
}
