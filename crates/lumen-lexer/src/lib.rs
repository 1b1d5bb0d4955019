use logos::Logos;

/// Unescape a quoted string literal's contents (backslash escapes only,
/// the enclosing quotes are stripped by the caller).
fn unescape_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('"') => result.push('"'),
                Some('\\') => result.push('\\'),
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    if let Ok(code) = u32::from_str_radix(&hex, 16) {
                        if let Some(unicode_char) = char::from_u32(code) {
                            result.push(unicode_char);
                        }
                    }
                }
                Some(c) => {
                    result.push('\\');
                    result.push(c);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Token kinds for the core language. The scanner is an external
/// collaborator to the parser/checker pair (it only produces a token
/// stream); this module is the concrete implementation that feeds them.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // Keywords
    #[token("class")]
    Class,
    #[token("interface")]
    Interface,
    #[token("fun")]
    Fun,
    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("type")]
    Type,
    #[token("enum")]
    Enum,
    #[token("extends")]
    Extends,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("break")]
    Break,
    #[token("import")]
    Import,
    #[token("as")]
    As,
    #[token("this")]
    This,
    #[token("super")]
    Super,
    #[token("yield")]
    Yield,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nil")]
    Nil,

    // Operators and punctuation
    #[token("=")]
    Eq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("!")]
    Bang,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=>")]
    FatArrow,
    #[token("|>")]
    PipeArrow,
    #[token("|")]
    Pipe,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,

    // Literals
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse().ok())]
    Number(f64),

    #[regex(r#""([^"\\]|\\["\\nrtu])*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1])
    })]
    StringLit(String),

    // Atom literal: :name (interned symbol, akin to Ruby/Elixir atoms)
    #[regex(r":[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    AtomLit(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,
    #[regex(r"/\*([^*]|\*[^/])*\*/", logos::skip)]
    BlockComment,
}

/// A scanned token paired with its source span and 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub span: std::ops::Range<usize>,
    pub line: u32,
}

pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    source: &'source str,
    line: u32,
    last_pos: usize,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
            source,
            line: 1,
            last_pos: 0,
        }
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<TokenSpan, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.inner.next()?;
        let span = self.inner.span();

        self.line += self.source[self.last_pos..span.start]
            .matches('\n')
            .count() as u32;
        self.last_pos = span.start;

        match token {
            Ok(tok) => Some(Ok(TokenSpan {
                token: tok,
                span,
                line: self.line,
            })),
            Err(_) => Some(Err(LexError::InvalidToken {
                span,
                line: self.line,
            })),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("invalid token at {span:?} (line {line})")]
    InvalidToken {
        span: std::ops::Range<usize>,
        line: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        Lexer::new(source).map(|r| r.unwrap().token).collect()
    }

    #[test]
    fn keywords() {
        assert_eq!(
            tokens("class interface fun var return yield"),
            vec![
                Token::Class,
                Token::Interface,
                Token::Fun,
                Token::Var,
                Token::Return,
                Token::Yield,
            ]
        );
    }

    #[test]
    fn literals() {
        assert_eq!(
            tokens(r#"1 3.5 "hi" :ok true nil"#),
            vec![
                Token::Number(1.0),
                Token::Number(3.5),
                Token::StringLit("hi".to_string()),
                Token::AtomLit("ok".to_string()),
                Token::True,
                Token::Nil,
            ]
        );
    }

    #[test]
    fn line_tracking() {
        let spans: Vec<_> = Lexer::new("var x\n= 1;").map(|r| r.unwrap()).collect();
        assert_eq!(spans[0].line, 1); // var
        assert_eq!(spans[2].line, 2); // =
    }

    #[test]
    fn pipe_and_arrow_operators() {
        assert_eq!(
            tokens("a |> f(b) |x| => x"),
            vec![
                Token::Ident("a".to_string()),
                Token::PipeArrow,
                Token::Ident("f".to_string()),
                Token::LParen,
                Token::Ident("b".to_string()),
                Token::RParen,
                Token::Pipe,
                Token::Ident("x".to_string()),
                Token::Pipe,
                Token::FatArrow,
                Token::Ident("x".to_string()),
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            tokens("var x = 1; // comment\n/* block */ var y = 2;"),
            vec![
                Token::Var,
                Token::Ident("x".to_string()),
                Token::Eq,
                Token::Number(1.0),
                Token::Semicolon,
                Token::Var,
                Token::Ident("y".to_string()),
                Token::Eq,
                Token::Number(2.0),
                Token::Semicolon,
            ]
        );
    }
}
