//! The Pratt precedence table and the infix half of `parse_precedence`:
//! binary/logical operators, calls, indexing, field access/assignment,
//! and the `|>` pipe rewrite.

use super::{ParseError, Parser};
use lumen_ast::{BinaryOp, Expr, LogicalOp, NodeId};
use lumen_lexer::Token;

/// Low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Precedence {
    None,
    Assignment,
    Yield,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    /// One level tighter than `self`; used when a prefix/infix rule wants
    /// its operand parsed at higher-than-its-own binding power (so the
    /// operator doesn't re-associate into itself where it shouldn't).
    pub(crate) fn next(self) -> Self {
        use Precedence::*;
        match self {
            None => Assignment,
            Assignment => Yield,
            Yield => Or,
            Or => And,
            And => Equality,
            Equality => Comparison,
            Comparison => Term,
            Term => Factor,
            Factor => Unary,
            Unary => Call,
            Call | Primary => Primary,
        }
    }
}

/// The infix half of the table: every token that can continue an
/// expression, and how tightly it binds.
pub(crate) fn infix_precedence(tok: &Token) -> Precedence {
    match tok {
        Token::Eq => Precedence::Assignment,
        Token::OrOr => Precedence::Or,
        Token::AndAnd => Precedence::And,
        Token::EqEq | Token::NotEq => Precedence::Equality,
        Token::Lt | Token::LtEq | Token::Gt | Token::GtEq => Precedence::Comparison,
        Token::Plus | Token::Minus => Precedence::Term,
        Token::Star | Token::Slash => Precedence::Factor,
        Token::LParen | Token::Dot | Token::LBracket | Token::PipeArrow => Precedence::Call,
        _ => Precedence::None,
    }
}

impl<'a> Parser<'a> {
    /// One prefix, then infix operators climbed while their precedence is
    /// at least `min_prec`. `can_assign` is fixed for the whole climb: it
    /// is true only when `min_prec <= Assignment`, and a stray trailing
    /// `=` after the climb is itself a syntax error.
    pub(crate) fn parse_precedence(&mut self, min_prec: Precedence) -> Result<NodeId, ParseError> {
        let can_assign = min_prec <= Precedence::Assignment;
        let mut expr = self.parse_prefix(can_assign)?;

        while !self.is_at_end() && infix_precedence(self.peek()) >= min_prec {
            expr = self.parse_infix(expr, can_assign)?;
        }

        if can_assign && self.check(&Token::Eq) {
            return Err(self.error_at_current("Invalid assignment target."));
        }

        Ok(expr)
    }

    fn parse_infix(&mut self, left: NodeId, can_assign: bool) -> Result<NodeId, ParseError> {
        match self.peek().clone() {
            Token::Plus | Token::Minus | Token::Star | Token::Slash
            | Token::EqEq | Token::NotEq | Token::Lt | Token::LtEq | Token::Gt | Token::GtEq => {
                self.parse_binary(left)
            }
            Token::AndAnd | Token::OrOr => self.parse_logical(left),
            Token::LParen => self.parse_call(left),
            Token::LBracket => self.parse_get_item(left),
            Token::Dot => self.parse_get_or_set(left, can_assign),
            Token::PipeArrow => self.parse_pipe(left),
            _ => unreachable!("infix_precedence admitted a token with no infix rule"),
        }
    }

    fn parse_binary(&mut self, left: NodeId) -> Result<NodeId, ParseError> {
        let op_tok = self.advance().clone();
        let op = match op_tok {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::EqEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::LtEq => BinaryOp::LtEq,
            Token::Gt => BinaryOp::Gt,
            Token::GtEq => BinaryOp::GtEq,
            _ => unreachable!(),
        };
        let span = self.previous_node_span();
        let prec = infix_precedence(&op_tok);
        let right = self.parse_precedence(prec.next())?;
        Ok(self.ast_mut().alloc_expr(Expr::Binary { left, op, right, span }))
    }

    fn parse_logical(&mut self, left: NodeId) -> Result<NodeId, ParseError> {
        let op_tok = self.advance().clone();
        let op = match op_tok {
            Token::AndAnd => LogicalOp::And,
            Token::OrOr => LogicalOp::Or,
            _ => unreachable!(),
        };
        let prec = infix_precedence(&op_tok);
        let right = self.parse_precedence(prec.next())?;
        Ok(self.ast_mut().alloc_expr(Expr::Logical { left, op, right }))
    }

    /// `callee(args...)`. Argument-count validation is the type checker's
    /// job; the parser only builds the node.
    fn parse_call(&mut self, callee: NodeId) -> Result<NodeId, ParseError> {
        self.consume(&Token::LParen, "Expected '(' to start call arguments.")?;
        let args = self.parse_arguments()?;
        self.consume(&Token::RParen, "Expected ')' after arguments.")?;
        let paren = self.previous_node_span();
        Ok(self.ast_mut().alloc_expr(Expr::Call { callee, paren, args }))
    }

    pub(crate) fn parse_arguments(&mut self) -> Result<Vec<NodeId>, ParseError> {
        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        Ok(args)
    }

    /// `object[index]`.
    fn parse_get_item(&mut self, object: NodeId) -> Result<NodeId, ParseError> {
        self.consume(&Token::LBracket, "Expected '['.")?;
        let index = self.expression()?;
        self.consume(&Token::RBracket, "Expected ']' after index.")?;
        let span = self.previous_node_span();
        Ok(self.ast_mut().alloc_expr(Expr::GetItem { object, index, span }))
    }

    /// `object.name`, or `object.name = value` when `can_assign` and an
    /// `=` immediately follows the field name. Chained assignment
    /// (`a.b.c = x`) falls out of this rule firing again on the new
    /// `Get` as the infix loop continues climbing.
    fn parse_get_or_set(&mut self, object: NodeId, can_assign: bool) -> Result<NodeId, ParseError> {
        self.consume(&Token::Dot, "Expected '.'.")?;
        let name = self.consume_identifier("Expected property name after '.'.")?;
        let span = self.previous_node_span();

        if can_assign && self.match_token(&Token::Eq) {
            let value = self.parse_precedence(Precedence::Assignment)?;
            Ok(self.ast_mut().alloc_expr(Expr::Set { object, name, value, span }))
        } else {
            Ok(self.ast_mut().alloc_expr(Expr::Get { object, name, span }))
        }
    }

    /// `left |> f(args)` rewrites to `Call(f, [left, ...args])` — the
    /// right-hand side must already be a `Call` node; anything else is a
    /// syntax error.
    fn parse_pipe(&mut self, left: NodeId) -> Result<NodeId, ParseError> {
        self.consume(&Token::PipeArrow, "Expected '|>'.")?;
        let rhs = self.parse_precedence(Precedence::Call)?;
        match self.ast_mut().node(rhs).kind.clone() {
            lumen_ast::NodeKind::Expr(Expr::Call { callee, paren, args }) => {
                let mut new_args = Vec::with_capacity(args.len() + 1);
                new_args.push(left);
                new_args.extend(args);
                Ok(self
                    .ast_mut()
                    .alloc_expr(Expr::Call { callee, paren, args: new_args }))
            }
            _ => Err(self.error_at_previous("Expected a call on the right-hand side of '|>'.")),
        }
    }
}
