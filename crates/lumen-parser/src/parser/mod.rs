//! Parser state and token-stream plumbing shared by every sub-module.
//!
//! The grammar is split by syntactic category: declarations/statements,
//! expressions, the Pratt precedence table + infix handlers, prefix
//! primaries, and type annotations each get their own file; this module
//! only owns the `Parser` struct and the low-level token helpers they
//! all build on.

use lumen_ast::{Ast, Program, Span};
use lumen_diagnostics::{error_codes, DiagnosticEngine, Span as DiagSpan};
use lumen_lexer::{Lexer, Token, TokenSpan};

mod error_recovery;
mod expressions;
mod operators;
mod primaries;
mod statements;
mod types;

pub(crate) use operators::Precedence;

/// A syntax error has already been reported to the [`DiagnosticEngine`];
/// this unit value only tells the caller to resynchronize rather than
/// carrying the message itself (there is nothing else to propagate).
#[derive(Debug, Clone, Copy)]
pub(crate) struct ParseError;

pub struct Parser<'a> {
    tokens: Vec<TokenSpan>,
    current: usize,
    source: &'a str,
    file: String,
    ast: Ast,
    diagnostics: DiagnosticEngine,
    had_error: bool,
    panic_mode: bool,
}

impl<'a> Parser<'a> {
    /// Scans `source` fully up front. A lexer error is reported the same
    /// way a syntax error would be and short-circuits construction — there
    /// is no AST to build a parser around if the token stream itself is
    /// broken.
    pub fn new(file: &str, source: &'a str) -> Result<Self, DiagnosticEngine> {
        let mut diagnostics = DiagnosticEngine::new();
        let mut tokens = Vec::new();
        let mut had_error = false;

        for result in Lexer::new(source) {
            match result {
                Ok(tok) => tokens.push(tok),
                Err(lumen_lexer::LexError::InvalidToken { span, line }) => {
                    had_error = true;
                    let mut diag_span = DiagSpan::from_file_and_span(file, source, span);
                    diag_span.line = line as usize;
                    diagnostics.emit_error(
                        error_codes::UNEXPECTED_TOKEN,
                        "invalid token".to_string(),
                        diag_span,
                    );
                }
            }
        }

        if had_error {
            return Err(diagnostics);
        }

        Ok(Self {
            tokens,
            current: 0,
            source,
            file: file.to_string(),
            ast: Ast::new(),
            diagnostics,
            had_error: false,
            panic_mode: false,
        })
    }

    /// Top-level entry point: a sequence of `declaration()`s until EOF.
    /// Each failed declaration resynchronizes rather than aborting the
    /// whole parse, so later, unrelated errors still get reported.
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(ParseError) => self.synchronize(),
            }
        }
        Program::new(std::mem::take(&mut self.ast), statements)
    }

    /// Consumes the parser, returning whether any error was ever reported
    /// and the accumulated diagnostics.
    pub fn finish(self) -> (bool, DiagnosticEngine) {
        (self.had_error, self.diagnostics)
    }

    // ---- token stream helpers ----

    pub(crate) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    pub(crate) fn peek(&self) -> &Token {
        // `is_at_end` gates every call site; an EOF sentinel would need
        // its own token kind, so callers check first instead.
        &self.tokens[self.current.min(self.tokens.len() - 1)].token
    }

    pub(crate) fn peek_span(&self) -> &TokenSpan {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.current - 1].token
    }

    pub(crate) fn previous_span(&self) -> &TokenSpan {
        &self.tokens[self.current - 1]
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    pub(crate) fn check(&self, kind: &Token) -> bool {
        !self.is_at_end() && std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    pub(crate) fn match_token(&mut self, kind: &Token) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn consume(&mut self, kind: &Token, message: &str) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_at_current(message))
        }
    }

    pub(crate) fn consume_identifier(&mut self, message: &str) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_at_current(message)),
        }
    }

    /// `lumen_ast::Span` for the current token (used as a node's own span).
    pub(crate) fn current_node_span(&self) -> Span {
        let tok = self.peek_span();
        Span::new(tok.span.start as u32, tok.span.end as u32, tok.line)
    }

    pub(crate) fn previous_node_span(&self) -> Span {
        let tok = self.previous_span();
        Span::new(tok.span.start as u32, tok.span.end as u32, tok.line)
    }

    pub(crate) fn ast_mut(&mut self) -> &mut Ast {
        &mut self.ast
    }
}
