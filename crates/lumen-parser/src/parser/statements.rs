//! Declarations and statements: the `declaration()`/`statement()`
//! dispatch pair, blocks, and every concrete production (`var`/`const`,
//! functions and methods, classes, interfaces, `if`, `while`, `for`,
//! `return`, `break`, `import`, `type`, `enum`).

use super::primaries::function_kind_for_method;
use super::{ParseError, Parser};
use lumen_ast::{EnumVariant, Expr, FunctionKind, NodeId, Stmt, VarKind};
use lumen_lexer::Token;

impl<'a> Parser<'a> {
    /// Top-level dispatch on a leading keyword; anything else falls
    /// through to `statement()`.
    pub(crate) fn declaration(&mut self) -> Result<NodeId, ParseError> {
        if self.match_token(&Token::Class) {
            self.parse_class_declaration()
        } else if self.match_token(&Token::Fun) {
            self.parse_function_declaration()
        } else if self.match_token(&Token::Var) {
            self.parse_var_declaration(VarKind::Var)
        } else if self.match_token(&Token::Const) {
            self.parse_var_declaration(VarKind::Const)
        } else if self.match_token(&Token::Interface) {
            self.parse_interface_declaration()
        } else if self.match_token(&Token::Type) {
            self.parse_type_declaration()
        } else if self.match_token(&Token::Enum) {
            self.parse_enum_declaration()
        } else {
            self.statement()
        }
    }

    /// Dispatch on a leading statement keyword; anything else falls
    /// through to `expression_statement()`.
    pub(crate) fn statement(&mut self) -> Result<NodeId, ParseError> {
        if self.match_token(&Token::If) {
            self.parse_if_statement()
        } else if self.match_token(&Token::While) {
            self.parse_while_statement()
        } else if self.match_token(&Token::For) {
            self.parse_for_statement()
        } else if self.match_token(&Token::Return) {
            self.parse_return_statement()
        } else if self.match_token(&Token::Break) {
            self.parse_break_statement()
        } else if self.match_token(&Token::Import) {
            self.parse_import_statement()
        } else if self.check(&Token::LBrace) {
            self.parse_block()
        } else {
            self.expression_statement()
        }
    }

    /// `{ declaration* }`. Blocks admit nested declarations, not just
    /// statements, so locals can declare their own functions/classes.
    pub(crate) fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        self.consume(&Token::LBrace, "Expected '{'.")?;
        let mut statements = Vec::new();
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        self.consume(&Token::RBrace, "Expected '}' after block.")?;
        Ok(self.ast_mut().alloc_stmt(Stmt::Block(statements)))
    }

    /// `var name (: T)? (= init)? ;`, or the same shape with `const`.
    fn parse_var_declaration(&mut self, kind: VarKind) -> Result<NodeId, ParseError> {
        let name = self.consume_identifier("Expected variable name.")?;
        let span = self.previous_node_span();
        let ty = if self.match_token(&Token::Colon) {
            Some(self.type_annotation()?)
        } else {
            None
        };
        let init = if self.match_token(&Token::Eq) {
            Some(self.expression()?)
        } else {
            None
        };
        self.match_token(&Token::Semicolon);
        Ok(self.ast_mut().alloc_stmt(Stmt::Var { name, kind, ty, init, span }))
    }

    /// `fun name<gs>(p: T, ...): R { body }`.
    fn parse_function_declaration(&mut self) -> Result<NodeId, ParseError> {
        let name = self.consume_identifier("Expected function name.")?;
        self.parse_function_tail(name, FunctionKind::Function)
    }

    /// Shared by top-level functions and class/interface methods: name
    /// has already been consumed by the caller.
    fn parse_function_tail(&mut self, name: String, kind: FunctionKind) -> Result<NodeId, ParseError> {
        let generics = self.parse_generic_params()?;
        self.consume(&Token::LParen, "Expected '(' after function name.")?;
        let params = self.parse_params()?;
        self.consume(&Token::RParen, "Expected ')' after parameters.")?;
        let ret = self.parse_optional_return_type()?;
        let body = self.parse_block()?;
        Ok(self
            .ast_mut()
            .alloc_stmt(Stmt::Function { name, kind, generics, params, ret, body }))
    }

    /// `class Name<gs> (extends Parent)? { member* }`. Members are either
    /// `var` fields or methods — `fun` before a method name is optional.
    fn parse_class_declaration(&mut self) -> Result<NodeId, ParseError> {
        let name = self.consume_identifier("Expected class name.")?;
        let generics = self.parse_generic_params()?;
        let superclass = if self.match_token(&Token::Extends) {
            let parent = self.consume_identifier("Expected superclass name.")?;
            let span = self.previous_node_span();
            Some(self.ast_mut().alloc_expr(Expr::Variable { name: parent, span }))
        } else {
            None
        };

        self.consume(&Token::LBrace, "Expected '{' before class body.")?;
        let mut body = Vec::new();
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            body.push(self.parse_class_member()?);
        }
        self.consume(&Token::RBrace, "Expected '}' after class body.")?;

        Ok(self
            .ast_mut()
            .alloc_stmt(Stmt::Class { name, generics, superclass, body }))
    }

    fn parse_class_member(&mut self) -> Result<NodeId, ParseError> {
        if self.match_token(&Token::Var) {
            return self.parse_var_declaration(VarKind::Var);
        }
        if self.match_token(&Token::Const) {
            return self.parse_var_declaration(VarKind::Const);
        }
        self.match_token(&Token::Fun);
        let name = self.consume_identifier("Expected method name.")?;
        let kind = function_kind_for_method(&name);
        self.parse_function_tail(name, kind)
    }

    /// `interface Name<gs> (extends Supertype)? { member* }`. Members are
    /// `var` field signatures or bodiless method signatures.
    fn parse_interface_declaration(&mut self) -> Result<NodeId, ParseError> {
        let name = self.consume_identifier("Expected interface name.")?;
        let generics = self.parse_generic_params()?;
        let supertype = if self.match_token(&Token::Extends) {
            Some(self.type_annotation()?)
        } else {
            None
        };

        self.consume(&Token::LBrace, "Expected '{' before interface body.")?;
        let mut body = Vec::new();
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            body.push(self.parse_interface_member()?);
        }
        self.consume(&Token::RBrace, "Expected '}' after interface body.")?;

        Ok(self
            .ast_mut()
            .alloc_stmt(Stmt::Interface { name, generics, supertype, body }))
    }

    fn parse_interface_member(&mut self) -> Result<NodeId, ParseError> {
        if self.match_token(&Token::Var) {
            let name = self.consume_identifier("Expected field name.")?;
            let span = self.previous_node_span();
            let ty = if self.match_token(&Token::Colon) {
                Some(self.type_annotation()?)
            } else {
                None
            };
            self.match_token(&Token::Semicolon);
            // A field *signature* — distinct from a bodiless method
            // signature (`MethodSig` below), so the checker can tell a
            // required field apart from a required zero-argument method
            // when it structurally matches an interface.
            return Ok(self.ast_mut().alloc_stmt(Stmt::Var {
                name,
                kind: VarKind::Var,
                ty,
                init: None,
                span,
            }));
        }

        self.match_token(&Token::Fun);
        let name = self.consume_identifier("Expected method name.")?;
        let kind = function_kind_for_method(&name);
        let generics = self.parse_generic_params()?;
        self.consume(&Token::LParen, "Expected '(' after method name.")?;
        let params = self.parse_params()?;
        self.consume(&Token::RParen, "Expected ')' after parameters.")?;
        let ret = self.parse_optional_return_type()?;
        self.match_token(&Token::Semicolon);
        Ok(self
            .ast_mut()
            .alloc_stmt(Stmt::MethodSig { name, kind, generics, params, ret }))
    }

    /// `if (cond) stmt (else stmt)?`.
    fn parse_if_statement(&mut self) -> Result<NodeId, ParseError> {
        self.consume(&Token::LParen, "Expected '(' after 'if'.")?;
        let cond = self.expression()?;
        self.consume(&Token::RParen, "Expected ')' after condition.")?;
        let then_branch = self.statement()?;
        let else_branch = if self.match_token(&Token::Else) {
            Some(self.statement()?)
        } else {
            None
        };
        Ok(self
            .ast_mut()
            .alloc_stmt(Stmt::If { cond, then_branch, else_branch }))
    }

    /// `while (cond) stmt`.
    fn parse_while_statement(&mut self) -> Result<NodeId, ParseError> {
        self.consume(&Token::LParen, "Expected '(' after 'while'.")?;
        let cond = self.expression()?;
        self.consume(&Token::RParen, "Expected ')' after condition.")?;
        let body = self.statement()?;
        Ok(self.ast_mut().alloc_stmt(Stmt::While { cond, body }))
    }

    /// `for (init?; cond?; incr?) stmt`. Each clause is independently
    /// optional but the two separating semicolons are always required;
    /// this is kept as a distinct node rather than desugared to `while`.
    fn parse_for_statement(&mut self) -> Result<NodeId, ParseError> {
        self.consume(&Token::LParen, "Expected '(' after 'for'.")?;

        let init = if self.match_token(&Token::Semicolon) {
            None
        } else if self.match_token(&Token::Var) {
            Some(self.parse_var_declaration(VarKind::Var)?)
        } else {
            Some(self.expression_statement()?)
        };

        let cond = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(&Token::Semicolon, "Expected ';' after loop condition.")?;

        let incr = if self.check(&Token::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(&Token::RParen, "Expected ')' after for clauses.")?;

        let body = self.statement()?;
        Ok(self.ast_mut().alloc_stmt(Stmt::For { init, cond, incr, body }))
    }

    /// `return (expr)? ;`.
    fn parse_return_statement(&mut self) -> Result<NodeId, ParseError> {
        let keyword = self.previous_node_span();
        let value = if self.check(&Token::Semicolon) || self.check(&Token::RBrace) {
            None
        } else {
            Some(self.expression()?)
        };
        self.match_token(&Token::Semicolon);
        Ok(self.ast_mut().alloc_stmt(Stmt::Return { keyword, value }))
    }

    /// `break ;`.
    fn parse_break_statement(&mut self) -> Result<NodeId, ParseError> {
        self.match_token(&Token::Semicolon);
        Ok(self.ast_mut().alloc_stmt(Stmt::Break))
    }

    /// `import "path" as Name ;`. The path string is kept as a plain
    /// `String` rather than a nested `Literal` node — the checker only
    /// ever needs its value, never a re-evaluable expression.
    fn parse_import_statement(&mut self) -> Result<NodeId, ParseError> {
        let span = self.previous_node_span();
        let path = match self.advance().clone() {
            Token::StringLit(s) => s,
            _ => return Err(self.error_at_previous("Expected a string literal module path after 'import'.")),
        };
        self.consume(&Token::As, "Expected 'as' after import path.")?;
        let alias = self.consume_identifier("Expected an alias name after 'as'.")?;
        self.match_token(&Token::Semicolon);
        Ok(self.ast_mut().alloc_stmt(Stmt::Import { path, alias, span }))
    }

    /// `type Name<gs> = T ;`.
    fn parse_type_declaration(&mut self) -> Result<NodeId, ParseError> {
        let name = self.consume_identifier("Expected type name.")?;
        let generics = self.parse_generic_params()?;
        self.consume(&Token::Eq, "Expected '=' in type declaration.")?;
        let target = self.type_annotation()?;
        self.match_token(&Token::Semicolon);
        Ok(self
            .ast_mut()
            .alloc_stmt(Stmt::TypeDeclaration { name, generics, target }))
    }

    /// `enum Name<gs> { Variant (( T, ... ))? , ... }`.
    fn parse_enum_declaration(&mut self) -> Result<NodeId, ParseError> {
        let name = self.consume_identifier("Expected enum name.")?;
        let generics = self.parse_generic_params()?;
        self.consume(&Token::LBrace, "Expected '{' before enum body.")?;

        let mut variants = Vec::new();
        if !self.check(&Token::RBrace) {
            loop {
                let vname = self.consume_identifier("Expected variant name.")?;
                let fields = if self.match_token(&Token::LParen) {
                    let list = self.parse_enum_fields()?;
                    self.consume(&Token::RParen, "Expected ')' after variant fields.")?;
                    list
                } else {
                    Vec::new()
                };
                variants.push(EnumVariant { name: vname, fields });
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        self.consume(&Token::RBrace, "Expected '}' after enum body.")?;
        Ok(self.ast_mut().alloc_stmt(Stmt::Enum { name, generics, variants }))
    }

    fn parse_enum_fields(&mut self) -> Result<Vec<lumen_ast::TypeNode>, ParseError> {
        let mut fields = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                fields.push(self.type_annotation()?);
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        Ok(fields)
    }
}
