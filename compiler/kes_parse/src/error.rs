//! Parse errors.

use std::path::{Path, PathBuf};

use kes_diagnostic::{Diagnostic, ErrorCode};
use kes_ir::Span;
use thiserror::Error;

/// Why a file is not a well-formed Kestrel module.
///
/// Parsing stops at the first error; a file either parses completely or is
/// rejected as a whole.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{}` is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },

    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("invalid character `{ch}`")]
    InvalidCharacter { ch: char, span: Span },

    #[error("unexpected {found}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        span: Span,
    },

    #[error("block is never closed")]
    UnclosedBlock { span: Span },

    #[error("unknown import language `{tag}`")]
    UnknownLanguage { tag: String, span: Span },
}

impl ParseError {
    /// Source location of the error, when it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::Io { .. } | ParseError::Encoding { .. } => None,
            ParseError::UnterminatedString { span }
            | ParseError::InvalidCharacter { span, .. }
            | ParseError::UnexpectedToken { span, .. }
            | ParseError::UnclosedBlock { span }
            | ParseError::UnknownLanguage { span, .. } => Some(*span),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ParseError::UnterminatedString { .. } => ErrorCode::E0001,
            ParseError::InvalidCharacter { .. } | ParseError::Encoding { .. } => ErrorCode::E0002,
            ParseError::UnexpectedToken { .. } => ErrorCode::E1001,
            ParseError::UnclosedBlock { .. } => ErrorCode::E1002,
            ParseError::UnknownLanguage { .. } => ErrorCode::E1003,
            ParseError::Io { .. } => ErrorCode::E3001,
        }
    }

    /// Report this error against `file`.
    pub fn to_diagnostic(&self, file: &Path) -> Diagnostic {
        let diag = Diagnostic::error(self.code())
            .with_message(self.to_string())
            .in_file(file);
        match self.span() {
            Some(span) => diag.with_label(span, "here"),
            None => diag,
        }
    }
}
