//! Python tokens, as far as import extraction needs them.
//!
//! Strings (including triple-quoted docstrings) and comments are matched as
//! whole tokens so that `import` inside them is never mistaken for a
//! statement. Everything else that is not structural collapses to `Other`.

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\f\r]+")]
#[logos(skip r"#[^\n]*")]
#[logos(skip r"\\\r?\n")]
pub(crate) enum PyToken {
    #[token("\n")]
    Newline,
    #[token(";")]
    Semi,

    #[token("import")]
    Import,
    #[token("from")]
    From,
    #[token("as")]
    As,
    #[token("def")]
    Def,
    #[token("class")]
    Class,
    #[token("async")]
    Async,

    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("*")]
    Star,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r"[0-9][0-9A-Za-z_]*")]
    Number,

    #[regex(r#"[rRbBuUfF]{0,2}"""([^"\\]|\\[\s\S]|"[^"\\]|"\\[\s\S]|""[^"\\]|""\\[\s\S])*""""#)]
    #[regex(r#"[rRbBuUfF]{0,2}'''([^'\\]|\\[\s\S]|'[^'\\]|'\\[\s\S]|''[^'\\]|''\\[\s\S])*'''"#)]
    #[regex(r#"[rRbBuUfF]{0,2}"([^"\\\n]|\\[\s\S])*""#)]
    #[regex(r#"[rRbBuUfF]{0,2}'([^'\\\n]|\\[\s\S])*'"#)]
    Str,

    #[regex(r#"[rRbBuUfF]{0,2}"([^"\\\n]|\\[\s\S])*"#)]
    #[regex(r#"[rRbBuUfF]{0,2}'([^'\\\n]|\\[\s\S])*"#)]
    UnterminatedStr,

    #[regex(r#"[^ \t\f\r\nA-Za-z0-9_#;.,*()\[\]{}"']"#)]
    Other,
}
