//! Parser for Kestrel source files.
//!
//! Turns one `.kes` file into a [`ParsedModule`]: its import statements,
//! named declarations and impl definitions, in source order. A file that is
//! not a well-formed module is rejected with a [`ParseError`].

mod error;
mod grammar;
mod lexer;

use std::path::Path;

use kes_ir::ParsedModule;
use tracing::debug;

pub use error::ParseError;

/// Parse Kestrel source text.
pub fn parse(source: &str) -> Result<ParsedModule, ParseError> {
    let tokens = lexer::lex(source)?;
    grammar::Parser::new(source, tokens).parse_module()
}

/// Read and parse a Kestrel file.
pub fn parse_file(path: &Path) -> Result<ParsedModule, ParseError> {
    let bytes = std::fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source = String::from_utf8(bytes).map_err(|_| ParseError::Encoding {
        path: path.to_path_buf(),
    })?;
    let module = parse(&source)?;
    debug!(path = %path.display(), items = module.items.len(), "parsed module");
    Ok(module)
}
