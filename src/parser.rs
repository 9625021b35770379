//! Recursive-descent parser for the expression language (component B).
//!
//! Implements the EBNF grammar of §4.B directly, one method per production.
//! Precedence (tightest first): unary sign, `**` (right-assoc), `* /`,
//! `+ -`, comparisons (non-chaining), `not`, `and`, `or`.

use crate::ast::{BinOp, Expr, Loc, Stmt, UnOp};
use crate::error::{EngineError, Result};
use crate::lexer::{LexError, Lexer, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Parses a single expression from source text, consuming the whole
    /// input (a trailing token other than EOF is a parse error).
    pub fn parse_expr_str(src: &str) -> Result<Expr> {
        let mut parser = Self::new(src)?;
        let expr = parser.expr()?;
        parser.expect_eof()?;
        Ok(expr)
    }

    /// Parses a sequence of statements separated by `;` or line breaks, as
    /// accepted in exec/for-loop bodies.
    pub fn parse_stmts_str(src: &str) -> Result<Vec<Stmt>> {
        let mut parser = Self::new(src)?;
        let stmts = parser.stmt_list()?;
        parser.expect_eof()?;
        Ok(stmts)
    }

    fn new(src: &str) -> Result<Self> {
        let tokens = Lexer::new(src).tokenize().map_err(Self::lex_err)?;
        Ok(Parser { tokens, pos: 0 })
    }

    fn lex_err(e: LexError) -> EngineError {
        EngineError::Parse {
            token: e.text,
            offset: e.offset,
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn unexpected(&self) -> EngineError {
        let tok = self.peek();
        EngineError::Parse {
            token: tok.kind.to_string(),
            offset: tok.start,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_eof(&mut self) -> Result<()> {
        if self.check(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn skip_separators(&mut self) {
        while self.check(&TokenKind::Semicolon) {
            self.advance();
        }
    }

    /// `stmt_list := (stmt (';' stmt)*)?` with any number of separators
    /// (newline tokens are lexed as `;`) tolerated between statements.
    fn stmt_list(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        self.skip_separators();
        while !self.check(&TokenKind::Eof) {
            stmts.push(self.stmt()?);
            if self.check(&TokenKind::Semicolon) {
                self.skip_separators();
            } else {
                break;
            }
        }
        Ok(stmts)
    }

    /// `stmt := IDENT '=' expr | expr`
    fn stmt(&mut self) -> Result<Stmt> {
        if let TokenKind::Ident(name) = self.peek().kind.clone() {
            if self.tokens.get(self.pos + 1).map(|t| &t.kind) == Some(&TokenKind::Assign) {
                let start = self.peek().start;
                self.advance(); // ident
                self.advance(); // '='
                let value = self.expr()?;
                let loc = Loc::new(start, value.loc().end);
                return Ok(Stmt::Assign { name, value, loc });
            }
        }
        Ok(Stmt::Expr(self.expr()?))
    }

    fn expr(&mut self) -> Result<Expr> {
        self.or_expr()
    }

    /// `or_expr := and_expr ('or' and_expr)*`
    fn or_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.and_expr()?;
        while self.check(&TokenKind::Or) {
            self.advance();
            let rhs = self.and_expr()?;
            let loc = lhs.loc().merge(rhs.loc());
            lhs = Expr::Binary {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(lhs)
    }

    /// `and_expr := not_expr ('and' not_expr)*`
    fn and_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.not_expr()?;
        while self.check(&TokenKind::And) {
            self.advance();
            let rhs = self.not_expr()?;
            let loc = lhs.loc().merge(rhs.loc());
            lhs = Expr::Binary {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(lhs)
    }

    /// `not_expr := 'not' not_expr | cmp`
    fn not_expr(&mut self) -> Result<Expr> {
        if self.check(&TokenKind::Not) {
            let start = self.peek().start;
            self.advance();
            let operand = self.not_expr()?;
            let loc = Loc::new(start, operand.loc().end);
            return Ok(Expr::NotOp {
                operand: Box::new(operand),
                loc,
            });
        }
        self.cmp()
    }

    /// `cmp := sum ( cmp_op sum )?` — comparisons do not chain.
    fn cmp(&mut self) -> Result<Expr> {
        let lhs = self.sum()?;
        let op = match self.peek().kind {
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::NotEq => BinOp::Ne,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Le => BinOp::Le,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::Ge => BinOp::Ge,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.sum()?;
        let loc = lhs.loc().merge(rhs.loc());
        Ok(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            loc,
        })
    }

    /// `sum := mul (('+'|'-') mul)*`
    fn sum(&mut self) -> Result<Expr> {
        let mut lhs = self.mul()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.mul()?;
            let loc = lhs.loc().merge(rhs.loc());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(lhs)
    }

    /// `mul := pow (('*'|'/') pow)*`
    fn mul(&mut self) -> Result<Expr> {
        let mut lhs = self.pow()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.pow()?;
            let loc = lhs.loc().merge(rhs.loc());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(lhs)
    }

    /// `pow := unary ('**' pow)?` — right-associative.
    fn pow(&mut self) -> Result<Expr> {
        let lhs = self.unary()?;
        if self.check(&TokenKind::StarStar) {
            self.advance();
            let rhs = self.pow()?;
            let loc = lhs.loc().merge(rhs.loc());
            return Ok(Expr::Binary {
                op: BinOp::Pow,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                loc,
            });
        }
        Ok(lhs)
    }

    /// `unary := ('-' | '+') unary | primary`
    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek().kind {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Plus => Some(UnOp::Pos),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.peek().start;
            self.advance();
            let operand = self.unary()?;
            let loc = Loc::new(start, operand.loc().end);
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                loc,
            });
        }
        self.primary()
    }

    /// `primary := NUMBER | QUALIFIED | IDENT | '(' expr ')' | call`
    fn primary(&mut self) -> Result<Expr> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Number(value) => {
                self.advance();
                Ok(Expr::NumberLit {
                    value,
                    loc: Loc::new(tok.start, tok.end),
                })
            }
            TokenKind::Qualified(qualifier, name) => {
                self.advance();
                Ok(Expr::QualifiedName {
                    qualifier,
                    name,
                    loc: Loc::new(tok.start, tok.end),
                })
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Name {
                    name,
                    loc: Loc::new(tok.start, tok.end),
                })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expr()?;
                let close = self.expect(TokenKind::RParen)?;
                Ok(Expr::Paren {
                    loc: Loc::new(tok.start, close.end),
                    inner: Box::new(inner),
                })
            }
            TokenKind::Dollar => self.call(),
            _ => Err(self.unexpected()),
        }
    }

    /// `call := '$' IDENT '(' expr (',' expr)* ')'`
    fn call(&mut self) -> Result<Expr> {
        let start = self.peek().start;
        self.advance(); // '$'
        let name_tok = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let mut args = vec![self.expr()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            args.push(self.expr()?);
        }
        let close = self.expect(TokenKind::RParen)?;
        Ok(Expr::Call {
            name: name_tok,
            args,
            loc: Loc::new(start, close.end),
        })
    }

    fn expect_ident(&mut self) -> Result<String> {
        if let TokenKind::Ident(name) = self.peek().kind.clone() {
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_pow_right_assoc() {
        // 2 ** 3 ** 2 should parse as 2 ** (3 ** 2), not (2**3)**2.
        let e = Parser::parse_expr_str("2 ** 3 ** 2").unwrap();
        match e {
            Expr::Binary {
                op: BinOp::Pow,
                rhs,
                ..
            } => {
                assert!(matches!(*rhs, Expr::Binary { op: BinOp::Pow, .. }));
            }
            _ => panic!("expected Pow"),
        }
    }

    #[test]
    fn precedence_mul_over_add() {
        let e = Parser::parse_expr_str("1 + 2 * 3").unwrap();
        match e {
            Expr::Binary {
                op: BinOp::Add,
                rhs,
                ..
            } => assert!(matches!(*rhs, Expr::Binary { op: BinOp::Mul, .. })),
            _ => panic!("expected Add at top"),
        }
    }

    #[test]
    fn comparisons_do_not_chain() {
        // `1 < 2 < 3` should fail: after parsing `1 < 2`, cmp() returns and
        // the remaining `< 3` is a leftover token at the top level.
        let err = Parser::parse_expr_str("1 < 2 < 3").unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
    }

    #[test]
    fn logical_precedence() {
        // not a and b or c  ==  ((not a) and b) or c
        let e = Parser::parse_expr_str("not a and b or c").unwrap();
        assert!(matches!(e, Expr::Binary { op: BinOp::Or, .. }));
    }

    #[test]
    fn call_with_three_args() {
        let e = Parser::parse_expr_str("$random(0, 100, 50)").unwrap();
        match e {
            Expr::Call { name, args, .. } => {
                assert_eq!(name, "random");
                assert_eq!(args.len(), 3);
            }
            _ => panic!("expected Call"),
        }
    }

    #[test]
    fn qualified_name_parses() {
        let e = Parser::parse_expr_str("global.users + 1").unwrap();
        match e {
            Expr::Binary { lhs, .. } => {
                assert!(matches!(*lhs, Expr::QualifiedName { .. }));
            }
            _ => panic!("expected Binary"),
        }
    }

    #[test]
    fn assignment_statement() {
        let stmts = Parser::parse_stmts_str("result = i * 2").unwrap();
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0], Stmt::Assign { .. }));
    }

    #[test]
    fn multiple_statements_semicolon_separated() {
        let stmts = Parser::parse_stmts_str("x = 1; result = x + 1").unwrap();
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn multiple_statements_newline_separated() {
        let stmts = Parser::parse_stmts_str("x = 1\nresult = x + 1").unwrap();
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn trailing_garbage_is_parse_error() {
        let err = Parser::parse_expr_str("1 + 2)").unwrap_err();
        match err {
            EngineError::Parse { offset, .. } => assert_eq!(offset, 5),
            _ => panic!("expected Parse error"),
        }
    }
}
