//! A Pratt parser over the token stream. Two imaginary dispatch tables —
//! "prefix" and "infix" — are realized here as `match` arms on `cur_token.kind` /
//! `peek_token.kind` rather than literal function-pointer tables, which is simpler in
//! Rust and has identical dispatch behavior. Parse errors are collected in a list
//! rather than raised; callers must check `errors()` before evaluating.

use crate::ast::{AssignOp, AssignTarget, Expr, ForClause, Stmt};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use log::debug;

#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
    Access,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
        TokenKind::Lparen => Precedence::Call,
        TokenKind::Lbracket => Precedence::Index,
        TokenKind::Arrow => Precedence::Access,
        _ => Precedence::Lowest,
    }
}

pub struct Parser {
    lexer: Lexer,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<String>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let cur = Self::next_significant(&mut lexer);
        let peek = Self::next_significant(&mut lexer);
        Parser {
            lexer,
            cur_token: cur,
            peek_token: peek,
            errors: Vec::new(),
        }
    }

    fn next_significant(lexer: &mut Lexer) -> Token {
        loop {
            let t = lexer.next_token();
            if t.kind != TokenKind::Comment {
                return t;
            }
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn next_token(&mut self) {
        self.cur_token = std::mem::replace(&mut self.peek_token, Self::next_significant(&mut self.lexer));
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur_token.kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek_token.kind == kind
    }

    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.next_token();
            true
        } else {
            self.peek_error(kind);
            false
        }
    }

    fn peek_error(&mut self, kind: TokenKind) {
        self.errors.push(format!(
            "line {}: expected next token to be {}, got {} instead",
            self.peek_token.line, kind, self.peek_token.kind
        ));
    }

    fn skip_semicolon(&mut self) {
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
    }

    fn error_expr(&self, token: Token) -> Expr {
        Expr::Identifier {
            token,
            name: "<parse-error>".to_string(),
        }
    }

    /// Parses the whole program: a flat list of statements terminated by `Eof`.
    pub fn parse_program(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.cur_is(TokenKind::Eof) {
            if self.cur_is(TokenKind::Semicolon) {
                self.next_token();
                continue;
            }
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }
        statements
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur_token.kind {
            TokenKind::Let => Some(self.parse_let_statement()),
            TokenKind::Return => Some(self.parse_return_statement()),
            TokenKind::Break => Some(self.parse_break_statement()),
            TokenKind::Function => Some(self.parse_function_statement()),
            _ => Some(self.parse_expression_or_assign_statement()),
        }
    }

    fn parse_let_statement(&mut self) -> Stmt {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::Ident) {
            return Stmt::Let {
                token: token.clone(),
                name: "<parse-error>".to_string(),
                value: self.error_expr(token),
            };
        }
        let name = self.cur_token.literal.clone();
        if !self.expect_peek(TokenKind::Assign) {
            return Stmt::Let {
                token: token.clone(),
                name,
                value: self.error_expr(token),
            };
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest);
        self.skip_semicolon();
        Stmt::Let { token, name, value }
    }

    fn parse_return_statement(&mut self) -> Stmt {
        let token = self.cur_token.clone();
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
            return Stmt::Return { token, value: None };
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest);
        self.skip_semicolon();
        Stmt::Return {
            token,
            value: Some(value),
        }
    }

    fn parse_break_statement(&mut self) -> Stmt {
        let token = self.cur_token.clone();
        self.skip_semicolon();
        Stmt::Break { token }
    }

    fn parse_function_statement(&mut self) -> Stmt {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::Ident) {
            return Stmt::FunctionDecl {
                token: token.clone(),
                name: "<parse-error>".to_string(),
                params: Vec::new(),
                body: Box::new(Stmt::Block {
                    token,
                    statements: Vec::new(),
                }),
            };
        }
        let name = self.cur_token.literal.clone();
        self.expect_peek(TokenKind::Lparen);
        let params = self.parse_function_parameters();
        self.expect_peek(TokenKind::Lbrace);
        let body = self.parse_block_statement();
        Stmt::FunctionDecl {
            token,
            name,
            params,
            body: Box::new(body),
        }
    }

    fn parse_function_parameters(&mut self) -> Vec<String> {
        let mut params = Vec::new();
        if self.peek_is(TokenKind::Rparen) {
            self.next_token();
            return params;
        }
        self.next_token();
        params.push(self.cur_token.literal.clone());
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            params.push(self.cur_token.literal.clone());
        }
        self.expect_peek(TokenKind::Rparen);
        params
    }

    fn parse_block_statement(&mut self) -> Stmt {
        let token = self.cur_token.clone();
        self.next_token();
        let mut statements = Vec::new();
        while !self.cur_is(TokenKind::Rbrace) && !self.cur_is(TokenKind::Eof) {
            if self.cur_is(TokenKind::Semicolon) {
                self.next_token();
                continue;
            }
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }
        Stmt::Block { token, statements }
    }

    /// Handles the assignment-vs-expression disambiguation by parsing a full
    /// expression first (so `a[i][j]`-shaped targets are already built), then checking
    /// whether an assignment operator follows. Only a bare identifier or a
    /// single-level index expression is a valid target.
    fn parse_expression_or_assign_statement(&mut self) -> Stmt {
        let token = self.cur_token.clone();
        let expr = self.parse_expression(Precedence::Lowest);
        if is_assign_op(self.peek_token.kind) {
            if let Some(target) = assignment_target_from_expr(&expr) {
                self.next_token(); // move onto the assignment operator
                let op = assign_op_from_token(self.cur_token.kind);
                self.next_token();
                let value = self.parse_expression(Precedence::Lowest);
                self.skip_semicolon();
                return Stmt::Assign {
                    token,
                    target,
                    op,
                    value,
                };
            } else {
                self.errors.push(format!(
                    "line {}: invalid assignment target",
                    self.peek_token.line
                ));
            }
        }
        self.skip_semicolon();
        Stmt::Expression { token, expr }
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Expr {
        let mut left = match self.cur_token.kind {
            TokenKind::Ident => self.parse_identifier(),
            TokenKind::Int => self.parse_integer_literal(),
            TokenKind::True | TokenKind::False => self.parse_boolean(),
            TokenKind::String => self.parse_string_literal(),
            TokenKind::Bang | TokenKind::Minus => self.parse_prefix_expression(),
            TokenKind::Lparen => self.parse_grouped_expression(),
            TokenKind::Lbracket => self.parse_array_literal(),
            TokenKind::Lbrace => self.parse_hash_literal(),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::For => self.parse_for_expression(),
            _ => {
                self.errors.push(format!(
                    "line {}: no prefix parse function for {} found",
                    self.cur_token.line, self.cur_token.kind
                ));
                self.error_expr(self.cur_token.clone())
            }
        };

        while !self.peek_is(TokenKind::Semicolon) && precedence < precedence_of(self.peek_token.kind) {
            match self.peek_token.kind {
                TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Asterisk
                | TokenKind::Slash
                | TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Gt => {
                    self.next_token();
                    left = self.parse_infix_expression(left);
                }
                TokenKind::Lparen => {
                    self.next_token();
                    left = self.parse_call_expression(left);
                }
                TokenKind::Lbracket => {
                    self.next_token();
                    left = self.parse_index_expression(left);
                }
                TokenKind::Arrow => {
                    self.next_token();
                    left = self.parse_access_expression(left);
                }
                _ => break,
            }
        }
        left
    }

    fn parse_identifier(&mut self) -> Expr {
        Expr::Identifier {
            token: self.cur_token.clone(),
            name: self.cur_token.literal.clone(),
        }
    }

    fn parse_integer_literal(&mut self) -> Expr {
        let token = self.cur_token.clone();
        match token.literal.parse::<i64>() {
            Ok(value) => Expr::IntegerLit { token, value },
            Err(_) => {
                self.errors.push(format!(
                    "line {}: could not parse {} as integer",
                    token.line, token.literal
                ));
                Expr::IntegerLit { token, value: 0 }
            }
        }
    }

    fn parse_boolean(&mut self) -> Expr {
        Expr::BooleanLit {
            token: self.cur_token.clone(),
            value: self.cur_token.kind == TokenKind::True,
        }
    }

    fn parse_string_literal(&mut self) -> Expr {
        Expr::StringLit {
            token: self.cur_token.clone(),
            value: self.cur_token.literal.clone(),
        }
    }

    fn parse_prefix_expression(&mut self) -> Expr {
        let token = self.cur_token.clone();
        let op = self.cur_token.literal.clone();
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix);
        Expr::Prefix {
            token,
            op,
            right: Box::new(right),
        }
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Expr {
        let token = self.cur_token.clone();
        let op = self.cur_token.literal.clone();
        let precedence = precedence_of(self.cur_token.kind);
        self.next_token();
        let right = self.parse_expression(precedence);
        Expr::Infix {
            token,
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn parse_grouped_expression(&mut self) -> Expr {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest);
        self.expect_peek(TokenKind::Rparen);
        expr
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Vec<Expr> {
        let mut list = Vec::new();
        if self.peek_is(end) {
            self.next_token();
            return list;
        }
        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest));
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest));
        }
        self.expect_peek(end);
        list
    }

    fn parse_array_literal(&mut self) -> Expr {
        let token = self.cur_token.clone();
        let elements = self.parse_expression_list(TokenKind::Rbracket);
        Expr::ArrayLit { token, elements }
    }

    fn parse_hash_literal(&mut self) -> Expr {
        let token = self.cur_token.clone();
        let mut pairs = Vec::new();
        while !self.peek_is(TokenKind::Rbrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest);
            if !self.expect_peek(TokenKind::Colon) {
                break;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest);
            pairs.push((key, value));
            if !self.peek_is(TokenKind::Rbrace) && !self.expect_peek(TokenKind::Comma) {
                break;
            }
        }
        self.expect_peek(TokenKind::Rbrace);
        Expr::HashLit { token, pairs }
    }

    fn parse_call_expression(&mut self, function: Expr) -> Expr {
        let token = self.cur_token.clone();
        let args = self.parse_expression_list(TokenKind::Rparen);
        Expr::Call {
            token,
            function: Box::new(function),
            args,
        }
    }

    fn parse_index_expression(&mut self, left: Expr) -> Expr {
        let token = self.cur_token.clone();
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest);
        self.expect_peek(TokenKind::Rbracket);
        Expr::Index {
            token,
            left: Box::new(left),
            index: Box::new(index),
        }
    }

    /// `a -> b`: the child is parsed as an expression-statement so both bare
    /// field access (`NOTES -> C5`) and method calls (`midi -> AddNote(...)`) share one
    /// code path.
    fn parse_access_expression(&mut self, parent: Expr) -> Expr {
        let token = self.cur_token.clone();
        self.next_token();
        let child_token = self.cur_token.clone();
        let child_expr = self.parse_expression(Precedence::Lowest);
        let child = Stmt::Expression {
            token: child_token,
            expr: child_expr,
        };
        Expr::Access {
            token,
            parent: Box::new(parent),
            child: Box::new(child),
        }
    }

    fn parse_if_expression(&mut self) -> Expr {
        let token = self.cur_token.clone();
        self.expect_peek(TokenKind::Lparen);
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest);
        self.expect_peek(TokenKind::Rparen);
        self.expect_peek(TokenKind::Lbrace);
        let consequence = self.parse_block_statement();
        let alternative = if self.peek_is(TokenKind::Else) {
            self.next_token();
            self.expect_peek(TokenKind::Lbrace);
            Some(Box::new(self.parse_block_statement()))
        } else {
            None
        };
        Expr::If {
            token,
            condition: Box::new(condition),
            consequence: Box::new(consequence),
            alternative,
        }
    }

    fn parse_for_expression(&mut self) -> Expr {
        let token = self.cur_token.clone();
        self.expect_peek(TokenKind::Lparen);
        self.expect_peek(TokenKind::Ident);
        let index = self.cur_token.literal.clone();
        self.expect_peek(TokenKind::In);
        self.next_token();
        let source = self.parse_expression(Precedence::Lowest);
        self.expect_peek(TokenKind::Rparen);
        self.expect_peek(TokenKind::Lbrace);
        let body = self.parse_block_statement();
        Expr::For {
            token,
            clause: ForClause {
                index,
                source: Box::new(source),
            },
            body: Box::new(body),
        }
    }
}

fn is_assign_op(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Assign
            | TokenKind::PlusAssign
            | TokenKind::MinusAssign
            | TokenKind::AsteriskAssign
            | TokenKind::SlashAssign
    )
}

fn assign_op_from_token(kind: TokenKind) -> AssignOp {
    match kind {
        TokenKind::PlusAssign => AssignOp::AddAssign,
        TokenKind::MinusAssign => AssignOp::SubAssign,
        TokenKind::AsteriskAssign => AssignOp::MulAssign,
        TokenKind::SlashAssign => AssignOp::DivAssign,
        _ => AssignOp::Assign,
    }
}

fn assignment_target_from_expr(expr: &Expr) -> Option<AssignTarget> {
    match expr {
        Expr::Identifier { name, .. } => Some(AssignTarget::Identifier(name.clone())),
        Expr::Index { left, index, .. } => match &**left {
            Expr::Identifier { name, .. } => Some(AssignTarget::Index {
                name: name.clone(),
                index: index.clone(),
            }),
            _ => None,
        },
        _ => None,
    }
}

/// Parses a full program and logs the statement count at `debug` level — a cheap
/// diagnostic for scripts run non-interactively via the CLI.
pub fn parse(source: &str) -> (Vec<Stmt>, Vec<String>) {
    let lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer);
    let statements = parser.parse_program();
    debug!("parsed {} statement(s), {} error(s)", statements.len(), parser.errors().len());
    (statements, parser.errors().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let (stmts, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        stmts
    }

    #[test]
    fn let_statement() {
        let stmts = parse_ok("let x = 5;");
        assert_eq!(stmts.len(), 1);
        assert!(matches!(&stmts[0], Stmt::Let { name, .. } if name == "x"));
    }

    #[test]
    fn operator_precedence_round_trips() {
        let stmts = parse_ok("1 + 2 * 3;");
        assert_eq!(stmts[0].to_string(), "(1 + (2 * 3))");
    }

    #[test]
    fn assignment_vs_expression_disambiguation() {
        let stmts = parse_ok("x = 5; x + 1;");
        assert!(matches!(&stmts[0], Stmt::Assign { .. }));
        assert!(matches!(&stmts[1], Stmt::Expression { .. }));
    }

    #[test]
    fn indexed_assignment_target() {
        let stmts = parse_ok("a[0] = 9;");
        match &stmts[0] {
            Stmt::Assign {
                target: AssignTarget::Index { name, .. },
                ..
            } => assert_eq!(name, "a"),
            other => panic!("expected indexed assignment, got {:?}", other),
        }
    }

    #[test]
    fn access_call_expression() {
        let stmts = parse_ok("m->AddNote(60, 4, 100);");
        let rendered = stmts[0].to_string();
        assert!(rendered.contains("AddNote(60, 4, 100)"));
    }

    #[test]
    fn function_declaration() {
        let stmts = parse_ok("function add(a, b) { return a + b; }");
        match &stmts[0] {
            Stmt::FunctionDecl { name, params, .. } => {
                assert_eq!(name, "add");
                assert_eq!(params, &vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected function declaration, got {:?}", other),
        }
    }

    #[test]
    fn for_loop_over_range() {
        let stmts = parse_ok("for (i in range(0, 10)) { print(i); }");
        assert!(matches!(&stmts[0], Stmt::Expression { expr: Expr::For { .. }, .. }));
    }

    #[test]
    fn malformed_input_collects_errors_without_panicking() {
        let (_stmts, errors) = parse("let x = ;");
        assert!(!errors.is_empty());
    }

    #[test]
    fn unclosed_paren_is_an_error_not_a_panic() {
        let (_stmts, errors) = parse("if (1 { }");
        assert!(!errors.is_empty());
    }

    #[test]
    fn parser_round_trip() {
        let source = "let a = [1, 2, 3]; if (a[0] < 2) { return 1; } else { return 0; }";
        let (stmts, errors) = parse(source);
        assert!(errors.is_empty());
        let rendered: String = stmts.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(" ");
        let (reparsed, errors2) = parse(&rendered);
        assert!(errors2.is_empty());
        let rerendered: String = reparsed
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rendered, rerendered);
    }
}
