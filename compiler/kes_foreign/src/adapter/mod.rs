//! Python source adapter.
//!
//! Converts a Python file into a [`ParsedModule`]: every top-level
//! (column 0) `import a.b as c` and `from ..pkg import x` becomes a foreign
//! import statement, every top-level `def` / `class` a declaration. Indented
//! imports (inside functions, `if TYPE_CHECKING:`, `try:` blocks) are not
//! part of the module's static import list and are skipped.
//!
//! Failures are classified structurally through [`AdaptError::is_benign`]:
//! callers never inspect message text.

mod lexer;

use logos::Logos;
use thiserror::Error;
use tracing::trace;

use kes_ir::{Decl, DeclKind, ImportTarget, ParsedImport, ParsedItem, ParsedModule, SourceLang, Span};

use lexer::PyToken;

/// Why a Python file could not be adapted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdaptError {
    /// The file is not UTF-8 (e.g. declares a legacy source encoding).
    #[error("source is not valid UTF-8")]
    Decode,

    /// An import statement with nothing to import (`import`, `from x import`).
    #[error("import statement has no targets")]
    EmptyImportFragment { span: Span },

    /// The file is not tokenizable Python.
    #[error("{message}")]
    Syntax { message: String, span: Span },
}

impl AdaptError {
    /// Whether this failure is an artifact of the adapter rather than a real
    /// problem with the module. Benign failures mean "cannot bridge", not
    /// "report an error".
    pub fn is_benign(&self) -> bool {
        matches!(self, AdaptError::Decode | AdaptError::EmptyImportFragment { .. })
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            AdaptError::Decode => None,
            AdaptError::EmptyImportFragment { span } | AdaptError::Syntax { span, .. } => {
                Some(*span)
            }
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct Tok {
    kind: PyToken,
    span: Span,
    /// First token on its physical line, with no indentation.
    at_column_zero: bool,
}

/// Adapt raw Python file contents.
pub fn adapt(bytes: &[u8]) -> Result<ParsedModule, AdaptError> {
    let source = std::str::from_utf8(bytes).map_err(|_| AdaptError::Decode)?;
    adapt_str(source)
}

/// Adapt Python source text.
pub fn adapt_str(source: &str) -> Result<ParsedModule, AdaptError> {
    let mut items = Vec::new();
    for line in logical_lines(source)? {
        let Some(first) = line.first() else {
            continue;
        };
        if !first.at_column_zero {
            continue;
        }
        let mut cursor = LineCursor {
            source,
            toks: &line,
            pos: 0,
        };
        if let Some(item) = cursor.statement()? {
            items.push(item);
        }
    }
    trace!(items = items.len(), "adapted foreign module");
    Ok(ParsedModule { items })
}

/// Split the token stream into logical lines.
///
/// Newlines inside brackets and backslash continuations do not end a
/// logical line; `;` does.
fn logical_lines(source: &str) -> Result<Vec<Vec<Tok>>, AdaptError> {
    let mut lines = Vec::new();
    let mut current: Vec<Tok> = Vec::new();
    let mut open: Vec<Span> = Vec::new();
    // Statements after `;` share the indentation of the line's first statement.
    let mut inherited_column_zero: Option<bool> = None;
    let mut lex = PyToken::lexer(source);
    // A byte-order mark is not part of the first line.
    let origin = if source.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };
    lex.bump(origin);

    while let Some(result) = lex.next() {
        let span = Span::from_range(lex.span());
        let kind = match result {
            Ok(PyToken::UnterminatedStr) => {
                return Err(AdaptError::Syntax {
                    message: "unterminated string literal".into(),
                    span,
                })
            }
            Ok(kind) => kind,
            Err(()) => {
                return Err(AdaptError::Syntax {
                    message: format!("unexpected character `{}`", lex.slice()),
                    span,
                })
            }
        };

        match kind {
            PyToken::LParen | PyToken::LBracket | PyToken::LBrace => open.push(span),
            PyToken::RParen | PyToken::RBracket | PyToken::RBrace => {
                if open.pop().is_none() {
                    return Err(AdaptError::Syntax {
                        message: format!("unmatched `{}`", lex.slice()),
                        span,
                    });
                }
            }
            PyToken::Newline if !open.is_empty() => continue,
            PyToken::Newline => {
                inherited_column_zero = None;
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                continue;
            }
            PyToken::Semi => {
                if let Some(first) = current.first() {
                    inherited_column_zero = Some(first.at_column_zero);
                    lines.push(std::mem::take(&mut current));
                }
                continue;
            }
            _ => {}
        }

        let start = span.start as usize;
        let at_column_zero = match inherited_column_zero {
            Some(inherited) if current.is_empty() => inherited,
            _ => start == origin || source.as_bytes().get(start - 1) == Some(&b'\n'),
        };
        current.push(Tok {
            kind,
            span,
            at_column_zero,
        });
    }

    if let Some(span) = open.first() {
        return Err(AdaptError::Syntax {
            message: "bracket is never closed".into(),
            span: *span,
        });
    }
    if !current.is_empty() {
        lines.push(current);
    }
    Ok(lines)
}

struct LineCursor<'a> {
    source: &'a str,
    toks: &'a [Tok],
    pos: usize,
}

impl LineCursor<'_> {
    fn statement(&mut self) -> Result<Option<ParsedItem>, AdaptError> {
        let Some(first) = self.bump() else {
            return Ok(None);
        };
        match first.kind {
            PyToken::Import => self.import(first.span).map(Some),
            PyToken::From => self.from_import(first.span).map(Some),
            PyToken::Def => Ok(self.decl(DeclKind::Function, first.span)),
            PyToken::Class => Ok(self.decl(DeclKind::Class, first.span)),
            PyToken::Async if self.eat(PyToken::Def) => Ok(self.decl(DeclKind::Function, first.span)),
            _ => Ok(None),
        }
    }

    /// `import a.b as c, d`
    fn import(&mut self, start: Span) -> Result<ParsedItem, AdaptError> {
        let mut targets = Vec::new();
        while let Some(mut target) = self.dotted_name() {
            if self.eat(PyToken::As) {
                if let Some(alias) = self.ident() {
                    target.span = target.span.merge(alias.1);
                    target = target.with_alias(alias.0);
                }
            }
            targets.push(target);
            if !self.eat(PyToken::Comma) {
                break;
            }
        }
        if targets.is_empty() {
            return Err(AdaptError::EmptyImportFragment {
                span: self.line_span(start),
            });
        }
        Ok(ParsedItem::Import(ParsedImport {
            lang: SourceLang::Foreign,
            targets,
            span: self.line_span(start),
        }))
    }

    /// `from ..pkg.mod import (a, b as c)`; the target is the module part.
    fn from_import(&mut self, start: Span) -> Result<ParsedItem, AdaptError> {
        let dots_start = self.peek().map_or(start, |t| t.span);
        let mut level = 0;
        while self.eat(PyToken::Dot) {
            level += 1;
        }
        let mut target = match self.dotted_name() {
            Some(target) => target,
            None if level > 0 => ImportTarget::new(Vec::new(), dots_start),
            None => {
                return Err(AdaptError::EmptyImportFragment {
                    span: self.line_span(start),
                })
            }
        };
        target = target.with_level(level);
        if level > 0 {
            target.span = dots_start.merge(target.span);
        }

        if !self.eat(PyToken::Import) {
            return Err(AdaptError::Syntax {
                message: "expected `import` in `from` statement".into(),
                span: self.line_span(start),
            });
        }
        let has_names = self
            .peek()
            .is_some_and(|t| matches!(t.kind, PyToken::Ident | PyToken::Star | PyToken::LParen));
        if !has_names {
            return Err(AdaptError::EmptyImportFragment {
                span: self.line_span(start),
            });
        }

        Ok(ParsedItem::Import(ParsedImport {
            lang: SourceLang::Foreign,
            targets: vec![target],
            span: self.line_span(start),
        }))
    }

    fn decl(&mut self, kind: DeclKind, start: Span) -> Option<ParsedItem> {
        let (name, span) = self.ident()?;
        Some(ParsedItem::Decl(Decl {
            kind,
            name,
            span: start.merge(span),
        }))
    }

    fn dotted_name(&mut self) -> Option<ImportTarget> {
        let (first, mut span) = self.ident()?;
        let mut segments = vec![first];
        while self.peek().is_some_and(|t| t.kind == PyToken::Dot) {
            self.pos += 1;
            match self.ident() {
                Some((seg, seg_span)) => {
                    segments.push(seg);
                    span = span.merge(seg_span);
                }
                None => break,
            }
        }
        Some(ImportTarget::new(segments, span))
    }

    fn ident(&mut self) -> Option<(String, Span)> {
        let tok = self.peek()?;
        if tok.kind != PyToken::Ident {
            return None;
        }
        self.pos += 1;
        Some((self.source[tok.span.to_range()].to_string(), tok.span))
    }

    fn peek(&self) -> Option<Tok> {
        self.toks.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    fn eat(&mut self, kind: PyToken) -> bool {
        if self.peek().is_some_and(|t| t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn line_span(&self, start: Span) -> Span {
        self.toks.last().map_or(start, |t| start.merge(t.span))
    }
}
