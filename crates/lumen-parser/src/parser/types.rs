//! Type annotations: simple names, generic application, functor types
//! (with an optional leading generic-parameter list), trailing unions, and
//! the generic-parameter declaration grammar shared by functions, classes,
//! interfaces, and `type` declarations.

use super::{ParseError, Parser};
use lumen_ast::{GenericParam, Param, TypeNode};
use lumen_lexer::Token;

impl<'a> Parser<'a> {
    /// `<gs>(args)=>ret` | `(args)=>ret` | `Name` | `Name<generics>`,
    /// each optionally followed by `| type` (left-recursing into a right
    /// spine of `Union`s: if `|` follows, recurse and build
    /// `Union(left, right)`).
    pub(crate) fn type_annotation(&mut self) -> Result<TypeNode, ParseError> {
        let left = if self.check(&Token::Lt) {
            self.parse_generic_functor()?
        } else if self.check(&Token::LParen) {
            self.parse_functor(Vec::new())?
        } else {
            self.parse_simple_type()?
        };

        if self.match_token(&Token::Pipe) {
            let right = self.type_annotation()?;
            Ok(TypeNode::Union {
                left: Box::new(left),
                right: Box::new(right),
            })
        } else {
            Ok(left)
        }
    }

    fn parse_generic_functor(&mut self) -> Result<TypeNode, ParseError> {
        let generics = self.parse_generic_params()?;
        self.parse_functor(generics)
    }

    fn parse_functor(&mut self, generics: Vec<GenericParam>) -> Result<TypeNode, ParseError> {
        self.consume(&Token::LParen, "Expected '(' in functor type.")?;
        let args = self.parse_type_list(&Token::RParen)?;
        self.consume(&Token::RParen, "Expected ')' after functor argument types.")?;
        self.consume(&Token::FatArrow, "Expected '=>' in functor type.")?;
        let ret = Some(Box::new(self.type_annotation()?));
        Ok(TypeNode::Functor { generics, args, ret })
    }

    fn parse_simple_type(&mut self) -> Result<TypeNode, ParseError> {
        let name = self.consume_identifier("Expected type name.")?;
        let generics = if self.match_token(&Token::Lt) {
            let gens = self.parse_type_list(&Token::Gt)?;
            self.consume(&Token::Gt, "Expected '>' after generic type arguments.")?;
            gens
        } else {
            Vec::new()
        };
        Ok(TypeNode::Simple { name, generics })
    }

    fn parse_type_list(&mut self, terminator: &Token) -> Result<Vec<TypeNode>, ParseError> {
        let mut types = Vec::new();
        if !self.check(terminator) {
            loop {
                types.push(self.type_annotation()?);
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        Ok(types)
    }

    /// `< name (extends T)? , ... >`; absent entirely (no leading `<`)
    /// yields an empty list.
    pub(crate) fn parse_generic_params(&mut self) -> Result<Vec<GenericParam>, ParseError> {
        if !self.match_token(&Token::Lt) {
            return Ok(Vec::new());
        }
        let mut params = Vec::new();
        if !self.check(&Token::Gt) {
            loop {
                let name = self.consume_identifier("Expected generic parameter name.")?;
                let extends = if self.match_token(&Token::Extends) {
                    Some(self.type_annotation()?)
                } else {
                    None
                };
                params.push(GenericParam { name, extends });
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        self.consume(&Token::Gt, "Expected '>' after generic parameters.")?;
        Ok(params)
    }

    /// `(p: T, ...)`'s contents — a parameter's type annotation is
    /// optional (the checker defaults a missing one to `Any`).
    pub(crate) fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let name = self.consume_identifier("Expected parameter name.")?;
                let ty = if self.match_token(&Token::Colon) {
                    Some(self.type_annotation()?)
                } else {
                    None
                };
                params.push(Param { name, ty });
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        Ok(params)
    }

    pub(crate) fn parse_optional_return_type(&mut self) -> Result<Option<TypeNode>, ParseError> {
        if self.match_token(&Token::Colon) {
            Ok(Some(self.type_annotation()?))
        } else {
            Ok(None)
        }
    }
}
