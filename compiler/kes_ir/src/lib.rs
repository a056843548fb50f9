//! Kestrel IR - shared front-end data structures.
//!
//! This crate contains:
//! - Spans for source locations
//! - [`ParsedModule`], the detached per-file parser output
//! - [`ModuleGraph`], the linked module forest and import table built by
//!   the resolver
//! - Canonical path helpers used as import-table keys

mod graph;
mod parsed;
pub mod path;
mod span;

pub use graph::{
    AnnexKind, ChildPosition, ImportStmt, Module, ModuleGraph, ModuleId, ModuleItem, ModulePath,
    ModulePathId, NodeRef,
};
pub use parsed::{
    Decl, DeclKind, ImplDef, ImportTarget, ParsedImport, ParsedItem, ParsedModule, SourceLang,
};
pub use span::{Span, SpanError};
