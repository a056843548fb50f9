//! Module resolution.
//!
//! Discovers every module statically reachable from an entry file, parses it
//! once, and links each import path to the module it names.
//!
//! # Algorithm
//!
//! ```text
//! resolve(entry)
//!   ├── parse entry, cache under canonical path
//!   ├── annex(entry)                    <stem>.impl.kes prepended, <stem>.test.kes appended
//!   ├── worklist = every path under entry (annexes included)
//!   ├── drain rounds until empty
//!   │     ├── native:  cached? link : parse, cache, annex, link, queue its paths
//!   │     └── foreign: ForeignBridge::bridge, link, queue filtered expansion
//!   └── annex(entry) again; drain what it adds; repeat until stable
//! ```
//!
//! The worklist replaces recursion: a cycle `a -> b -> a` terminates because
//! the second visit of `a` is a cache hit that links and stops.
//!
//! Failures are local to one import path. A missing or invalid native file is
//! an error diagnostic attributed to the path, a foreign bridge failure a
//! warning; resolution always finishes with a best-effort forest.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use kes_diagnostic::{Diagnostic, DiagnosticBag, ErrorCode};
use kes_foreign::{BridgeError, BridgePolicy, ForeignBridge, HostLocator, SearchPathLocator};
use kes_ir::path::canonical;
use kes_ir::{
    AnnexKind, ImportTarget, ModuleGraph, ModuleId, ModulePathId, NodeRef, ParsedModule,
    SourceLang,
};
use kes_parse::ParseError;

/// Environment variable listing extra host search directories.
pub const HOST_PATH_ENV: &str = "KES_HOST_PATH";

/// Parses one native source file.
pub trait SourceParser {
    fn parse(&self, path: &Path) -> Result<ParsedModule, ParseError>;
}

/// The Kestrel grammar from `kes_parse`.
#[derive(Copy, Clone, Debug, Default)]
pub struct NativeParser;

impl SourceParser for NativeParser {
    fn parse(&self, path: &Path) -> Result<ParsedModule, ParseError> {
        kes_parse::parse_file(path)
    }
}

/// Resolver configuration.
#[derive(Clone, Debug)]
pub struct ResolveConfig {
    /// Extension of native source files, without the dot.
    pub native_ext: String,
    /// Which foreign modules may be bridged.
    pub policy: BridgePolicy,
    /// Directories searched for foreign modules, in order.
    pub host_paths: Vec<PathBuf>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        ResolveConfig {
            native_ext: "kes".to_string(),
            policy: BridgePolicy::default(),
            host_paths: Vec::new(),
        }
    }
}

impl ResolveConfig {
    /// Default configuration plus the directories listed in `KES_HOST_PATH`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(paths) = std::env::var_os(HOST_PATH_ENV) {
            config.host_paths = std::env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        config
    }

    #[must_use]
    pub fn with_policy(mut self, policy: BridgePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_host_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.host_paths.push(dir.into());
        self
    }
}

/// Result of resolving one entry file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveOutput {
    /// The entry module.
    pub root: ModuleId,
    /// Every module known to the run, by canonical path.
    pub deps: FxHashMap<PathBuf, ModuleId>,
    /// Problems found while resolving this entry, in discovery order.
    pub diagnostics: DiagnosticBag,
}

/// Links every statically reachable module of a program.
///
/// One resolver owns one import table; resolving a second entry with the same
/// resolver reuses every module already cached. Call [`reset`](Self::reset)
/// to start an independent run.
pub struct ModuleResolver<P = NativeParser, L = SearchPathLocator> {
    parser: P,
    bridge: ForeignBridge<L>,
    native_ext: String,
    graph: ModuleGraph,
    /// Paths already dispatched once; a failed path is not retried.
    attempted: FxHashSet<ModulePathId>,
    /// Files that failed to parse, with the failure.
    invalid: FxHashMap<PathBuf, ParseError>,
    /// Entries already resolved.
    finished: FxHashMap<ModuleId, ResolveOutput>,
    diagnostics: DiagnosticBag,
}

impl ModuleResolver {
    /// Resolver with the native parser and a search-path host locator.
    pub fn new(config: ResolveConfig) -> Self {
        let locator = SearchPathLocator::new(config.host_paths.clone());
        Self::with_parts(NativeParser, locator, config)
    }
}

impl<P: SourceParser, L: HostLocator> ModuleResolver<P, L> {
    pub fn with_parts(parser: P, locator: L, config: ResolveConfig) -> Self {
        ModuleResolver {
            parser,
            bridge: ForeignBridge::new(locator, config.policy),
            native_ext: config.native_ext,
            graph: ModuleGraph::new(),
            attempted: FxHashSet::default(),
            invalid: FxHashMap::default(),
            finished: FxHashMap::default(),
            diagnostics: DiagnosticBag::new(),
        }
    }

    /// The linked forest.
    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Forget every module, starting a fresh compilation run.
    pub fn reset(&mut self) {
        self.graph.clear();
        self.attempted.clear();
        self.invalid.clear();
        self.finished.clear();
        self.diagnostics = DiagnosticBag::new();
    }

    /// Resolve everything reachable from `entry`.
    ///
    /// Only a failure to parse the entry file itself is an `Err`; problems
    /// with imported modules are diagnostics in the output.
    #[tracing::instrument(level = "debug", skip(self), fields(entry = %entry.display()))]
    pub fn resolve(&mut self, entry: &Path) -> Result<ResolveOutput, ParseError> {
        let path = canonical(entry);
        let root = match self.graph.lookup(&path) {
            Some(root) => {
                if let Some(done) = self.finished.get(&root) {
                    debug!("entry already resolved");
                    return Ok(done.clone());
                }
                root
            }
            None => {
                let parsed = self.parser.parse(&path)?;
                self.graph.insert(path, SourceLang::Native, parsed)
            }
        };

        self.annex(root);
        let worklist = self.graph.collect_paths(root);
        self.drain(worklist);

        loop {
            let attached = self.annex(root);
            if attached.is_empty() {
                break;
            }
            let worklist = attached
                .iter()
                .flat_map(|&annex| self.graph.collect_paths(annex))
                .collect();
            self.drain(worklist);
        }

        let deps = self.graph.import_table().clone();
        self.graph.module_mut(root).mod_deps = deps.clone();
        let output = ResolveOutput {
            root,
            deps,
            diagnostics: std::mem::take(&mut self.diagnostics),
        };
        debug!(
            modules = output.deps.len(),
            errors = output.diagnostics.error_count(),
            "resolved"
        );
        self.finished.insert(root, output.clone());
        Ok(output)
    }

    /// Run worklist rounds until no round produces new paths.
    fn drain(&mut self, mut worklist: Vec<ModulePathId>) {
        let mut round = 0usize;
        while !worklist.is_empty() {
            round += 1;
            trace!(round, pending = worklist.len(), "worklist round");
            let mut next = Vec::new();
            for id in worklist {
                if self.graph.path(id).is_resolved() || !self.attempted.insert(id) {
                    continue;
                }
                match self.graph.path(id).lang {
                    SourceLang::Native => self.resolve_native(id, &mut next),
                    SourceLang::Foreign => self.resolve_foreign(id, &mut next),
                }
            }
            worklist = next;
        }
    }

    fn resolve_native(&mut self, id: ModulePathId, next: &mut Vec<ModulePathId>) {
        let mpath = self.graph.path(id);
        let importer = self.graph.module(mpath.owner).path.clone();
        let target = mpath.target.clone();

        let candidates = candidate_files(&importer, &target, &self.native_ext);
        let Some(file) = candidates.iter().find(|c| c.is_file()) else {
            let tried = candidates
                .iter()
                .map(|c| format!("`{}`", c.display()))
                .collect::<Vec<_>>()
                .join(", ");
            self.diagnostics.push(
                Diagnostic::error(ErrorCode::E3001)
                    .with_message(format!("cannot find module `{target}`"))
                    .in_file(&importer)
                    .at_node(NodeRef::ModulePath(id))
                    .with_label(target.span, "imported here")
                    .with_note(format!("looked for {tried}")),
            );
            return;
        };
        let file = canonical(file);

        if let Some(module) = self.graph.lookup(&file) {
            trace!(path = %file.display(), "import table hit");
            self.link(id, module);
            return;
        }

        let Some(module) = self.load(&file) else {
            if let Some(err) = self.invalid.get(&file) {
                self.diagnostics.push(invalid_module(id, &importer, &target, &file, err));
            }
            return;
        };

        self.graph.module_mut(module).is_imported = true;
        let annexes = self.annex(module);
        self.link(id, module);
        next.extend(self.graph.collect_paths(module));
        debug!(path = %file.display(), annexes = annexes.len(), "resolved module");
    }

    fn resolve_foreign(&mut self, id: ModulePathId, next: &mut Vec<ModulePathId>) {
        let mpath = self.graph.path(id);
        if mpath.target.is_relative() {
            trace!(target = %mpath.target, "relative foreign import left opaque");
            return;
        }
        let name = mpath.target.dotted();
        let owner = self.graph.module(mpath.owner);
        let importer = owner.path.clone();
        // Host modules only see the configured search paths; a native
        // importer's own directory is appended after them.
        let importer_dir = match owner.lang {
            SourceLang::Native => importer.parent(),
            SourceLang::Foreign => None,
        };
        let span = mpath.target.span;

        match self.bridge.bridge(&name, importer_dir, &mut self.graph) {
            Ok(Some(bridged)) => {
                if bridged.cached {
                    trace!(%name, "import table hit");
                }
                self.link(id, bridged.module);
                next.extend(bridged.expansion);
            }
            Ok(None) => {}
            Err(err) => {
                let mut diag = Diagnostic::warning(ErrorCode::E3003)
                    .with_message(format!("cannot bridge foreign module `{name}`"))
                    .in_file(&importer)
                    .at_node(NodeRef::ModulePath(id))
                    .with_label(span, "imported here")
                    .with_note(err.to_string());
                if let BridgeError::Adapt { path, source } = &err {
                    if let Some(at) = source.span() {
                        diag = diag.with_cross_file_label(path, at, "while reading this");
                    }
                }
                self.diagnostics.push(diag);
            }
        }
    }

    /// Link a path and apply its alias to the linked module's visible name.
    fn link(&mut self, id: ModulePathId, module: ModuleId) {
        self.graph.link(id, module);
        if let Some(alias) = self.graph.path(id).target.alias.clone() {
            self.graph.module_mut(module).name = alias;
        }
    }

    /// Parse `file` into the graph, remembering failures.
    fn load(&mut self, file: &Path) -> Option<ModuleId> {
        if self.invalid.contains_key(file) {
            return None;
        }
        match self.parser.parse(file) {
            Ok(parsed) => Some(self.graph.insert(file.to_path_buf(), SourceLang::Native, parsed)),
            Err(err) => {
                debug!(path = %file.display(), %err, "invalid module");
                self.invalid.insert(file.to_path_buf(), err);
                None
            }
        }
    }

    /// Attach any impl/test siblings of `module` not attached yet.
    ///
    /// Returns the newly attached annexes.
    fn annex(&mut self, module: ModuleId) -> Vec<ModuleId> {
        let owner = self.graph.module(module);
        if owner.lang != SourceLang::Native {
            return Vec::new();
        }
        let Some(stem) = annex_stem(&owner.path, &self.native_ext) else {
            return Vec::new();
        };
        let dir = owner.path.parent().map(Path::to_path_buf).unwrap_or_default();
        let owner_path = owner.path.clone();

        let mut attached = Vec::new();
        for kind in [AnnexKind::Impl, AnnexKind::Test] {
            if self.graph.module(module).annex(kind).is_some() {
                continue;
            }
            let sibling = dir.join(format!("{stem}.{}.{}", kind.infix(), self.native_ext));
            if !sibling.is_file() {
                continue;
            }
            let sibling = canonical(&sibling);
            let annex = match self.graph.lookup(&sibling) {
                Some(annex) => annex,
                None if self.invalid.contains_key(&sibling) => continue,
                None => match self.load(&sibling) {
                    Some(annex) => annex,
                    None => {
                        if let Some(err) = self.invalid.get(&sibling) {
                            let mut diag = Diagnostic::error(ErrorCode::E3002)
                                .with_message(format!(
                                    "`{}` is not a valid module",
                                    sibling.display()
                                ))
                                .in_file(&sibling)
                                .at_node(NodeRef::Module(module))
                                .with_note(err.to_string())
                                .with_note(format!(
                                    "{} annex of `{}` was not attached",
                                    kind.infix(),
                                    owner_path.display()
                                ));
                            if let Some(at) = err.span() {
                                diag = diag.with_label(at, "parsing stopped here");
                            }
                            self.diagnostics.push(diag);
                        }
                        continue;
                    }
                },
            };
            self.graph.module_mut(annex).is_imported = true;
            if self.graph.attach_annex(module, kind, annex) {
                trace!(annex = %sibling.display(), kind = kind.infix(), "attached annex");
                attached.push(annex);
            }
        }
        attached
    }
}

/// `<dir>/<segments>.<ext>` then `<dir>/<segments>/mod.<ext>`.
///
/// `dir` is the importer's directory; a `level` of `n > 1` ascends `n - 1`
/// parents from it.
pub(crate) fn candidate_files(importer: &Path, target: &ImportTarget, ext: &str) -> [PathBuf; 2] {
    let mut base = importer.parent().map(Path::to_path_buf).unwrap_or_default();
    for _ in 1..target.level {
        base.pop();
    }
    base.extend(&target.segments);

    let mut file = OsString::from(base.as_os_str());
    file.push(".");
    file.push(ext);
    [PathBuf::from(file), base.join(format!("mod.{ext}"))]
}

/// `dir/a.kes` → `a`. Annex files themselves have no annexes.
fn annex_stem(path: &Path, ext: &str) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(ext)?.strip_suffix('.')?;
    let is_annex = [AnnexKind::Impl, AnnexKind::Test]
        .iter()
        .any(|kind| stem.ends_with(&format!(".{}", kind.infix())));
    (!is_annex && !stem.is_empty()).then(|| stem.to_string())
}

fn invalid_module(
    id: ModulePathId,
    importer: &Path,
    target: &ImportTarget,
    file: &Path,
    err: &ParseError,
) -> Diagnostic {
    let diag = Diagnostic::error(ErrorCode::E3002)
        .with_message(format!("`{}` is not a valid module", file.display()))
        .in_file(importer)
        .at_node(NodeRef::ModulePath(id))
        .with_label(target.span, format!("imported as `{target}`"))
        .with_note(err.to_string());
    match err.span() {
        Some(at) => diag.with_cross_file_label(file, at, "parsing stopped here"),
        None => diag,
    }
}

#[cfg(test)]
mod tests;
