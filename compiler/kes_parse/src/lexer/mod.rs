//! Tokenizer for Kestrel source.
//!
//! The front end only needs the module-level shape of a file, so the token
//! set is small: keywords that start top-level items, the punctuation the
//! import and impl grammars use, and catch-all tokens for everything that
//! can appear inside a skipped body.

use logos::Logos;

use kes_ir::Span;

use crate::ParseError;

/// Raw token kinds produced by logos.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
pub(crate) enum TokenKind {
    #[token("import")]
    Import,
    #[token("as")]
    As,
    #[token("impl")]
    Impl,

    #[token("obj")]
    Obj,
    #[token("node")]
    Node,
    #[token("edge")]
    Edge,
    #[token("walker")]
    Walker,
    #[token("can")]
    Can,
    #[token("glob")]
    Glob,
    #[token("test")]
    Test,

    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r"[0-9][0-9_]*")]
    Int,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,
    #[regex(r#""([^"\\\n]|\\.)*"#)]
    UnterminatedStr,

    /// Any other single character (operators, brackets) inside bodies.
    #[regex(r#"[^ \t\r\n\fA-Za-z0-9_#:;,.{}"]"#)]
    Punct,
}

impl TokenKind {
    /// Whether the token can spell a module name: identifiers, and keywords
    /// (a module may well be called `test`).
    pub(crate) fn is_name(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Import
                | TokenKind::As
                | TokenKind::Impl
                | TokenKind::Obj
                | TokenKind::Node
                | TokenKind::Edge
                | TokenKind::Walker
                | TokenKind::Can
                | TokenKind::Glob
                | TokenKind::Test
        )
    }
}

/// A token with its source span.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

/// Tokenize a whole file.
///
/// Stops at the first unterminated string or unrecognized character.
pub(crate) fn lex(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    while let Some(result) = lexer.next() {
        let span = Span::from_range(lexer.span());
        match result {
            Ok(TokenKind::UnterminatedStr) => return Err(ParseError::UnterminatedString { span }),
            Ok(kind) => tokens.push(Token { kind, span }),
            Err(()) => {
                let ch = lexer.slice().chars().next().unwrap_or('?');
                return Err(ParseError::InvalidCharacter { ch, span });
            }
        }
    }
    Ok(tokens)
}
