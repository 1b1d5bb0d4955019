//! The single entry point into the precedence climb, plus the
//! expression-statement production that wraps it at statement level.

use super::{ParseError, Parser, Precedence};
use lumen_ast::{NodeId, Stmt};
use lumen_lexer::Token;

impl<'a> Parser<'a> {
    pub(crate) fn expression(&mut self) -> Result<NodeId, ParseError> {
        self.parse_precedence(Precedence::Assignment)
    }

    /// `expr;` with the trailing `;` optional.
    pub(crate) fn expression_statement(&mut self) -> Result<NodeId, ParseError> {
        let expr = self.expression()?;
        self.match_token(&Token::Semicolon);
        Ok(self.ast_mut().alloc_stmt(Stmt::Expression(expr)))
    }
}
