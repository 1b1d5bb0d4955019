//! Panic-mode error reporting and resynchronization.
//!
//! On the first syntax error since the last sync point, `panic_mode` goes
//! up and a diagnostic is emitted; every further error is swallowed until
//! `synchronize` finds a semicolon or a leading declaration/statement
//! keyword.

use super::{ParseError, Parser};
use lumen_diagnostics::{error_codes, Span as DiagSpan};
use lumen_lexer::Token;

impl<'a> Parser<'a> {
    pub(crate) fn error_at_current(&mut self, message: &str) -> ParseError {
        let lexeme = self.current_lexeme();
        let line = self.current_line();
        self.report(message, &lexeme, line)
    }

    pub(crate) fn error_at_previous(&mut self, message: &str) -> ParseError {
        let span = self.previous_span().clone();
        let lexeme = self.source[span.span.clone()].to_string();
        self.report(message, &lexeme, span.line)
    }

    /// Every parse error carries a line number and the offending lexeme
    /// (or `"end"` at EOF). Only the first is actually emitted per sync
    /// window; later calls are no-ops until `synchronize` runs.
    fn report(&mut self, message: &str, lexeme: &str, line: u32) -> ParseError {
        self.had_error = true;
        if !self.panic_mode {
            self.panic_mode = true;
            let where_ = if lexeme == "end" {
                "at end".to_string()
            } else {
                format!("at '{lexeme}'")
            };
            let mut span = DiagSpan::new(self.file.clone(), line as usize, 1, lexeme.len().max(1));
            span.line = line as usize;
            self.diagnostics.emit_error(
                error_codes::SYNTAX_ERROR,
                format!("{message} {where_}"),
                span,
            );
        }
        ParseError
    }

    fn current_lexeme(&self) -> String {
        if self.is_at_end() {
            "end".to_string()
        } else {
            self.source[self.peek_span().span.clone()].to_string()
        }
    }

    fn current_line(&self) -> u32 {
        if self.is_at_end() {
            self.tokens.last().map_or(1, |t| t.line)
        } else {
            self.peek_span().line
        }
    }

    /// Skip tokens until a semicolon (consumed) or a token that starts a
    /// new declaration/statement (left for the next `declaration()` call).
    pub(crate) fn synchronize(&mut self) {
        self.panic_mode = false;

        while !self.is_at_end() {
            if self.current > 0 && matches!(self.previous(), Token::Semicolon) {
                return;
            }

            match self.peek() {
                Token::Class
                | Token::Fun
                | Token::Var
                | Token::For
                | Token::If
                | Token::While
                | Token::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}
