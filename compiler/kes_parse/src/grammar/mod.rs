//! Recursive-descent parser for the module-level grammar.
//!
//! ```text
//! module  := item*
//! item    := import | decl | impl | ';'
//! import  := 'import' ':' LANG target (',' target)* ';'
//! target  := '.'* IDENT ('.' IDENT)* ('as' IDENT)?
//! decl    := DECL_KW IDENT (block | token* ';')
//! impl    := 'impl' IDENT ('.' IDENT)* token* block
//! block   := '{' balanced '}'
//! ```
//!
//! Declaration and impl bodies are skipped by brace matching; only their
//! names reach the module forest.

use kes_ir::{
    Decl, DeclKind, ImplDef, ImportTarget, ParsedImport, ParsedItem, ParsedModule, SourceLang,
    Span,
};
use tracing::trace;

use crate::lexer::{Token, TokenKind};
use crate::ParseError;

pub(crate) struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(source: &'src str, tokens: Vec<Token>) -> Self {
        Parser {
            source,
            tokens,
            pos: 0,
        }
    }

    pub(crate) fn parse_module(mut self) -> Result<ParsedModule, ParseError> {
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            let item = match token.kind {
                TokenKind::Import => ParsedItem::Import(self.parse_import()?),
                TokenKind::Impl => ParsedItem::Impl(self.parse_impl()?),
                TokenKind::Semi => {
                    self.pos += 1;
                    continue;
                }
                kind => match decl_kind(kind) {
                    Some(decl) => ParsedItem::Decl(self.parse_decl(decl)?),
                    None => return Err(self.unexpected("a top-level item")),
                },
            };
            items.push(item);
        }
        Ok(ParsedModule { items })
    }

    fn parse_import(&mut self) -> Result<ParsedImport, ParseError> {
        let start = self.expect(TokenKind::Import, "`import`")?.span;
        self.expect(TokenKind::Colon, "`:` after `import`")?;
        let tag = self.expect(TokenKind::Ident, "an import language")?;
        let tag_text = self.text(tag);
        let lang = SourceLang::from_tag(tag_text).ok_or_else(|| ParseError::UnknownLanguage {
            tag: tag_text.to_string(),
            span: tag.span,
        })?;

        let mut targets = vec![self.parse_target()?];
        while self.eat(TokenKind::Comma) {
            targets.push(self.parse_target()?);
        }
        let end = self.expect(TokenKind::Semi, "`,` or `;`")?.span;

        trace!(lang = %lang, count = targets.len(), "import");
        Ok(ParsedImport {
            lang,
            targets,
            span: start.merge(end),
        })
    }

    fn parse_target(&mut self) -> Result<ImportTarget, ParseError> {
        let start = self.peek().map_or(Span::DUMMY, |t| t.span);
        let mut level = 0;
        while self.eat(TokenKind::Dot) {
            level += 1;
        }

        let first = self.expect_name("a module name")?;
        let mut end = first.span;
        let mut segments = vec![self.text(first).to_string()];
        while self.eat(TokenKind::Dot) {
            let seg = self.expect_name("a module name after `.`")?;
            end = seg.span;
            segments.push(self.text(seg).to_string());
        }

        let mut target = ImportTarget::new(segments, start.merge(end)).with_level(level);
        if self.eat(TokenKind::As) {
            let alias = self.expect_name("an alias after `as`")?;
            target.span = target.span.merge(alias.span);
            target = target.with_alias(self.text(alias));
        }
        Ok(target)
    }

    fn parse_decl(&mut self, kind: DeclKind) -> Result<Decl, ParseError> {
        let start = self.advance_span();
        let name = self.expect(TokenKind::Ident, "a declaration name")?;
        let name_text = self.text(name).to_string();
        let end = self.skip_item_rest()?;
        Ok(Decl {
            kind,
            name: name_text,
            span: start.merge(end),
        })
    }

    fn parse_impl(&mut self) -> Result<ImplDef, ParseError> {
        let start = self.expect(TokenKind::Impl, "`impl`")?.span;
        let first = self.expect(TokenKind::Ident, "the name being implemented")?;
        let mut target = vec![self.text(first).to_string()];
        while self.eat(TokenKind::Dot) {
            let seg = self.expect(TokenKind::Ident, "a name after `.`")?;
            target.push(self.text(seg).to_string());
        }
        // Signature tokens up to the body.
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::LBrace => break,
                TokenKind::Semi | TokenKind::RBrace => {
                    return Err(self.unexpected("an impl body"));
                }
                _ => self.pos += 1,
            }
        }
        let end = self.skip_block()?;
        Ok(ImplDef {
            target,
            span: start.merge(end),
        })
    }

    /// Skip the rest of a declaration: either up to `;` or through a block.
    fn skip_item_rest(&mut self) -> Result<Span, ParseError> {
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Semi => {
                    self.pos += 1;
                    return Ok(token.span);
                }
                TokenKind::LBrace => return self.skip_block(),
                TokenKind::RBrace => return Err(self.unexpected("`;` or `{`")),
                _ => self.pos += 1,
            }
        }
        Err(self.unexpected("`;` or `{`"))
    }

    /// Skip a brace-balanced block starting at the current `{`.
    fn skip_block(&mut self) -> Result<Span, ParseError> {
        let open = self.expect(TokenKind::LBrace, "`{`")?.span;
        let mut depth = 1usize;
        while let Some(token) = self.peek() {
            self.pos += 1;
            match token.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(open.merge(token.span));
                    }
                }
                _ => {}
            }
        }
        Err(ParseError::UnclosedBlock { span: open })
    }

    // Token helpers
    // -------------

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance_span(&mut self) -> Span {
        let span = self.peek().map_or(Span::DUMMY, |t| t.span);
        self.pos += 1;
        span
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().is_some_and(|t| t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// An identifier or keyword used as a module name.
    fn expect_name(&mut self, expected: &'static str) -> Result<Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind.is_name() => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn text(&self, token: Token) -> &'src str {
        &self.source[token.span.to_range()]
    }

    #[cold]
    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                found: format!("`{}`", self.text(token)),
                expected,
                span: token.span,
            },
            None => {
                let end = u32::try_from(self.source.len()).unwrap_or(u32::MAX);
                ParseError::UnexpectedToken {
                    found: "end of file".to_string(),
                    expected,
                    span: Span::new(end, end),
                }
            }
        }
    }
}

fn decl_kind(kind: TokenKind) -> Option<DeclKind> {
    match kind {
        TokenKind::Obj => Some(DeclKind::Object),
        TokenKind::Node => Some(DeclKind::Node),
        TokenKind::Edge => Some(DeclKind::Edge),
        TokenKind::Walker => Some(DeclKind::Walker),
        TokenKind::Can => Some(DeclKind::Ability),
        TokenKind::Glob => Some(DeclKind::Global),
        TokenKind::Test => Some(DeclKind::Test),
        _ => None,
    }
}
