//! Error codes for all front-end diagnostics.
//!
//! Each error code is a unique identifier (e.g., `E3001`) with the first digit
//! indicating the compiler phase. Used for `kesc explain` lookups.

use std::fmt;

/// Error codes for all front-end diagnostics.
///
/// Format: E#### where first digit indicates phase:
/// - E0xxx: Lexer errors
/// - E1xxx: Parser errors
/// - E3xxx: Import resolution and binding errors
/// - E9xxx: Internal compiler errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lexer Errors (E0xxx)
    /// Unterminated string literal
    E0001,
    /// Invalid character in source
    E0002,

    // Parser Errors (E1xxx)
    /// Unexpected token
    E1001,
    /// Unclosed block
    E1002,
    /// Unknown import language tag
    E1003,
    /// Expected identifier
    E1004,

    // Import / binding Errors (E3xxx)
    /// Imported module file does not exist
    E3001,
    /// Imported file is not a valid module
    E3002,
    /// Foreign module could not be bridged
    E3003,
    /// Name declared twice in one scope
    E3010,
    /// Definition with no matching declaration
    E3011,

    // Internal Errors (E9xxx)
    /// Internal invariant violated
    E9001,
}

impl ErrorCode {
    /// Every error code, in numeric order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E0001,
        ErrorCode::E0002,
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::E3003,
        ErrorCode::E3010,
        ErrorCode::E3011,
        ErrorCode::E9001,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E0002 => "E0002",
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E3010 => "E3010",
            ErrorCode::E3011 => "E3011",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// One-line explanation shown by `kesc explain`.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "unterminated string literal",
            ErrorCode::E0002 => "invalid character in source",
            ErrorCode::E1001 => "unexpected token",
            ErrorCode::E1002 => "block is never closed",
            ErrorCode::E1003 => "unknown import language; expected `kes` or `py`",
            ErrorCode::E1004 => "expected an identifier",
            ErrorCode::E3001 => "imported module file does not exist",
            ErrorCode::E3002 => "imported file is not a valid module",
            ErrorCode::E3003 => "foreign module could not be bridged; it is treated as opaque",
            ErrorCode::E3010 => "name is already declared in this scope",
            ErrorCode::E3011 => "definition has no matching declaration",
            ErrorCode::E9001 => "internal compiler error",
        }
    }

    pub fn is_lexer_error(&self) -> bool {
        matches!(self, ErrorCode::E0001 | ErrorCode::E0002)
    }

    pub fn is_parser_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E1001 | ErrorCode::E1002 | ErrorCode::E1003 | ErrorCode::E1004
        )
    }

    pub fn is_import_error(&self) -> bool {
        matches!(self, ErrorCode::E3001 | ErrorCode::E3002 | ErrorCode::E3003)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse an error code string like `"E3001"`. Case-insensitive.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}
