//! Static model of the host's module finder.
//!
//! Python's own finder executes import machinery; the front end only needs
//! its answer to "where does `name` come from, and is there source to read?".
//! [`HostLocator`] is that question as an injectable capability;
//! [`SearchPathLocator`] answers it by probing the filesystem in the same
//! order CPython's path-based finder does.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use kes_ir::path::normalize;

/// Modules compiled into the interpreter. They have no origin file.
pub const BUILTIN_MODULES: &[&str] = &[
    "_abc",
    "_codecs",
    "_collections",
    "_functools",
    "_imp",
    "_io",
    "_locale",
    "_operator",
    "_signal",
    "_sre",
    "_stat",
    "_string",
    "_symtable",
    "_thread",
    "_tracemalloc",
    "_warnings",
    "_weakref",
    "atexit",
    "builtins",
    "errno",
    "faulthandler",
    "gc",
    "itertools",
    "marshal",
    "posix",
    "pwd",
    "sys",
    "time",
];

/// Modules frozen into the interpreter image.
pub const FROZEN_MODULES: &[&str] = &[
    "_frozen_importlib",
    "_frozen_importlib_external",
    "__hello__",
    "__phello__",
    "zipimport",
];

/// Where a located module comes from.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum OriginKind {
    /// No finder knows the name.
    NotFound,
    /// Compiled into the interpreter.
    Builtin,
    /// Frozen bytecode inside the interpreter.
    Frozen,
    /// A native extension (`.so` / `.pyd`).
    Extension,
    /// A directory package without `__init__.py`.
    Namespace,
    /// A `.py` file, module or package `__init__.py`.
    Source,
}

/// Answer of a [`HostLocator`].
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Located {
    /// Origin file or directory, when the module has one.
    pub origin: Option<PathBuf>,
    pub kind: OriginKind,
}

impl Located {
    pub fn not_found() -> Self {
        Located {
            origin: None,
            kind: OriginKind::NotFound,
        }
    }

    fn without_origin(kind: OriginKind) -> Self {
        Located { origin: None, kind }
    }

    fn at(kind: OriginKind, origin: PathBuf) -> Self {
        Located {
            origin: Some(normalize(&origin)),
            kind,
        }
    }

    /// Whether there is a source file to read.
    pub fn has_source(&self) -> bool {
        self.kind == OriginKind::Source && self.origin.is_some()
    }

    /// The source file, if there is one to read.
    pub fn source_path(&self) -> Option<&Path> {
        if self.has_source() {
            self.origin.as_deref()
        } else {
            None
        }
    }
}

/// Finds the origin of a host module by name.
pub trait HostLocator {
    /// Locate dotted module `name`.
    ///
    /// `importer_dir` is the directory of the file doing the import; like the
    /// host appending the script directory to its search path, it is probed
    /// after the configured search paths.
    fn locate(&self, name: &str, importer_dir: Option<&Path>) -> Located;
}

/// Filesystem-backed locator over an ordered list of search directories.
#[derive(Clone, Debug)]
pub struct SearchPathLocator {
    search_paths: Vec<PathBuf>,
    builtins: FxHashSet<String>,
    frozen: FxHashSet<String>,
}

impl Default for SearchPathLocator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl SearchPathLocator {
    /// Locator over `search_paths` with the default built-in and frozen sets.
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        SearchPathLocator {
            search_paths,
            builtins: BUILTIN_MODULES.iter().map(|s| (*s).to_string()).collect(),
            frozen: FROZEN_MODULES.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Probe one search directory.
    ///
    /// Order per directory: regular package, extension module, source
    /// module, then namespace package (which only wins if no later
    /// directory has anything better).
    fn probe(dir: &Path, segments: &[&str]) -> Option<Located> {
        let (last, parents) = segments.split_last()?;
        let mut parent = dir.to_path_buf();
        parent.extend(parents);
        let base = parent.join(last);

        let init = base.join("__init__.py");
        if init.is_file() {
            return Some(Located::at(OriginKind::Source, init));
        }
        if let Some(ext) = find_extension(&parent, last) {
            return Some(Located::at(OriginKind::Extension, ext));
        }
        let file = parent.join(format!("{last}.py"));
        if file.is_file() {
            return Some(Located::at(OriginKind::Source, file));
        }
        if base.is_dir() {
            return Some(Located::at(OriginKind::Namespace, base));
        }
        None
    }
}

impl HostLocator for SearchPathLocator {
    fn locate(&self, name: &str, importer_dir: Option<&Path>) -> Located {
        if self.builtins.contains(name) {
            return Located::without_origin(OriginKind::Builtin);
        }
        if self.frozen.contains(name) {
            return Located::without_origin(OriginKind::Frozen);
        }

        let segments: Vec<&str> = name.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Located::not_found();
        }

        let mut namespace = None;
        for dir in self.search_paths.iter().map(PathBuf::as_path).chain(importer_dir) {
            match Self::probe(dir, &segments) {
                Some(found) if found.kind == OriginKind::Namespace => {
                    namespace.get_or_insert(found);
                }
                Some(found) => return found,
                None => {}
            }
        }
        namespace.unwrap_or_else(Located::not_found)
    }
}

/// Find `<stem>.so`, `<stem>.<abi-tag>.so` or `<stem>.pyd` in `dir`.
fn find_extension(dir: &Path, stem: &str) -> Option<PathBuf> {
    let prefix = format!("{stem}.");
    let entries = std::fs::read_dir(dir).ok()?;
    entries.flatten().map(|e| e.path()).find(|path| {
        path.is_file()
            && path.file_name().and_then(|n| n.to_str()).is_some_and(|n| {
                n.starts_with(&prefix)
                    && (n.ends_with(".so") || n.ends_with(".pyd"))
            })
    })
}
