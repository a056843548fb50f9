//! Parser output for a single source file.
//!
//! Both the native parser and the foreign import adapter produce a
//! [`ParsedModule`]. It is a detached tree: module paths carry no links yet.
//! [`ModuleGraph::insert`](crate::ModuleGraph::insert) moves it into the
//! module forest where paths become addressable and linkable.

use std::fmt;

use crate::Span;

/// Language an import statement (and the module it produces) belongs to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SourceLang {
    /// Kestrel itself (`import:kes`).
    Native,
    /// The Python host ecosystem (`import:py`).
    Foreign,
}

impl SourceLang {
    /// Tag as written after `import:`.
    pub fn tag(self) -> &'static str {
        match self {
            SourceLang::Native => "kes",
            SourceLang::Foreign => "py",
        }
    }

    /// Parse an `import:<tag>` language tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "kes" => Some(SourceLang::Native),
            "py" => Some(SourceLang::Foreign),
            _ => None,
        }
    }
}

impl fmt::Display for SourceLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single import target as written in source: `..pkg.mod as m`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ImportTarget {
    /// Dotted path components. Empty for `from . import x` in foreign code.
    pub segments: Vec<String>,
    /// Number of leading dots.
    pub level: u32,
    /// `as` alias.
    pub alias: Option<String>,
    pub span: Span,
}

impl ImportTarget {
    /// Create an absolute target from dotted segments.
    pub fn new(segments: Vec<String>, span: Span) -> Self {
        ImportTarget {
            segments,
            level: 0,
            alias: None,
            span,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The dotted reference without leading dots (`pkg.mod`).
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    /// Whether this target is relative to the importing file.
    pub fn is_relative(&self) -> bool {
        self.level > 0
    }
}

impl fmt::Display for ImportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.level {
            f.write_str(".")?;
        }
        f.write_str(&self.dotted())?;
        if let Some(alias) = &self.alias {
            write!(f, " as {alias}")?;
        }
        Ok(())
    }
}

/// `import:<lang> a, b as c;`
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ParsedImport {
    pub lang: SourceLang,
    pub targets: Vec<ImportTarget>,
    pub span: Span,
}

/// Kind of a named top-level declaration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DeclKind {
    Object,
    Node,
    Edge,
    Walker,
    Ability,
    Global,
    Test,
    /// `class` in foreign source.
    Class,
    /// `def` in foreign source.
    Function,
}

impl DeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DeclKind::Object => "obj",
            DeclKind::Node => "node",
            DeclKind::Edge => "edge",
            DeclKind::Walker => "walker",
            DeclKind::Ability => "can",
            DeclKind::Global => "glob",
            DeclKind::Test => "test",
            DeclKind::Class => "class",
            DeclKind::Function => "def",
        }
    }
}

/// A named declaration. Bodies are not retained.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Decl {
    pub kind: DeclKind,
    pub name: String,
    pub span: Span,
}

/// `impl Archetype.ability { ... }`: a deferred body for a declaration.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ImplDef {
    pub target: Vec<String>,
    pub span: Span,
}

impl ImplDef {
    /// The outermost name the body belongs to (`Archetype` in `Archetype.ability`).
    pub fn owner(&self) -> Option<&str> {
        self.target.first().map(String::as_str)
    }
}

/// One top-level item of a parsed file.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum ParsedItem {
    Import(ParsedImport),
    Decl(Decl),
    Impl(ImplDef),
}

/// A parsed source file.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct ParsedModule {
    pub items: Vec<ParsedItem>,
}

impl ParsedModule {
    /// Iterate the import statements in source order.
    pub fn imports(&self) -> impl Iterator<Item = &ParsedImport> {
        self.items.iter().filter_map(|item| match item {
            ParsedItem::Import(imp) => Some(imp),
            _ => None,
        })
    }
}
