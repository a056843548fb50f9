use std::cell::Cell;

use pretty_assertions::assert_eq;

use kes_ir::{ModuleItem, Span};

use super::*;

/// Native parser that counts how often it runs.
#[derive(Default)]
struct CountingParser {
    calls: Cell<usize>,
}

impl SourceParser for CountingParser {
    fn parse(&self, path: &Path) -> Result<ParsedModule, ParseError> {
        self.calls.set(self.calls.get() + 1);
        NativeParser.parse(path)
    }
}

/// A source tree in a temporary directory.
struct Tree {
    dir: tempfile::TempDir,
}

impl Tree {
    fn new() -> Self {
        match tempfile::tempdir() {
            Ok(dir) => Tree { dir },
            Err(e) => panic!("tempdir: {e}"),
        }
    }

    fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                panic!("mkdir {}: {e}", parent.display());
            }
        }
        if let Err(e) = std::fs::write(&path, contents) {
            panic!("write {}: {e}", path.display());
        }
        path
    }

    fn path(&self, rel: &str) -> PathBuf {
        canonical(&self.dir.path().join(rel))
    }
}

fn resolver() -> ModuleResolver<CountingParser, SearchPathLocator> {
    ModuleResolver::with_parts(
        CountingParser::default(),
        SearchPathLocator::default(),
        ResolveConfig::default(),
    )
}

fn resolve<P: SourceParser, L: HostLocator>(
    resolver: &mut ModuleResolver<P, L>,
    entry: &Path,
) -> ResolveOutput {
    match resolver.resolve(entry) {
        Ok(output) => output,
        Err(e) => panic!("entry failed to parse: {e}"),
    }
}

fn module_paths<P, L>(resolver: &ModuleResolver<P, L>, module: ModuleId) -> Vec<ModulePathId>
where
    P: SourceParser,
    L: HostLocator,
{
    resolver.graph().collect_paths(module)
}

fn sorted_keys(deps: &FxHashMap<PathBuf, ModuleId>) -> Vec<PathBuf> {
    let mut keys: Vec<PathBuf> = deps.keys().cloned().collect();
    keys.sort();
    keys
}

#[test]
fn native_and_builtin_foreign_import() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:kes a;\nimport:py sys;\n");
    tree.write("a.kes", "obj A {}\n");
    let mut resolver = resolver();

    let out = resolve(&mut resolver, &entry);

    assert_eq!(out.deps.len(), 2);
    assert_eq!(sorted_keys(&out.deps), vec![tree.path("a.kes"), tree.path("main.kes")]);
    assert_eq!(out.diagnostics.error_count(), 0);

    let paths = module_paths(&resolver, out.root);
    let graph = resolver.graph();
    assert_eq!(graph.path(paths[0]).sub_module, out.deps.get(&tree.path("a.kes")).copied());
    assert_eq!(graph.path(paths[1]).sub_module, None);
}

#[test]
fn missing_native_import_is_one_error_on_that_path() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:kes missing;\n");
    let mut resolver = resolver();

    let out = resolve(&mut resolver, &entry);

    assert_eq!(out.deps.len(), 1);
    assert_eq!(out.diagnostics.len(), 1);
    let paths = module_paths(&resolver, out.root);
    let diag = &out.diagnostics.as_slice()[0];
    assert_eq!(diag.code, ErrorCode::E3001);
    assert!(diag.is_error());
    assert_eq!(diag.node, Some(NodeRef::ModulePath(paths[0])));
    assert_eq!(diag.file.as_deref(), Some(tree.path("main.kes").as_path()));
    assert!(!resolver.graph().path(paths[0]).is_resolved());
}

#[test]
fn sibling_paths_survive_a_missing_one() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:kes missing, present;\n");
    tree.write("present.kes", "glob x;\n");
    let mut resolver = resolver();

    let out = resolve(&mut resolver, &entry);

    assert_eq!(out.deps.len(), 2);
    assert_eq!(out.diagnostics.error_count(), 1);
}

#[test]
fn invalid_module_is_reported_once_per_importing_path() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:kes bad;\nimport:kes sub;\n");
    tree.write("sub.kes", "import:kes bad;\n");
    tree.write("bad.kes", "obj Broken {\n");
    let mut resolver = resolver();

    let out = resolve(&mut resolver, &entry);

    let codes: Vec<ErrorCode> = out.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![ErrorCode::E3002, ErrorCode::E3002]);
    assert_eq!(out.deps.len(), 2);
    // main, sub, and a single attempt at bad
    assert_eq!(resolver.parser().calls.get(), 3);
}

#[test]
fn cycle_terminates_with_one_module_each() {
    let tree = Tree::new();
    let a = tree.write("a.kes", "import:kes b;\n");
    tree.write("b.kes", "import:kes a;\n");
    let mut resolver = resolver();

    let out = resolve(&mut resolver, &a);

    assert_eq!(out.deps.len(), 2);
    let a_id = out.root;
    let b_id = out.deps.get(&tree.path("b.kes")).copied();
    let graph = resolver.graph();
    let a_path = module_paths(&resolver, a_id)[0];
    assert_eq!(graph.path(a_path).sub_module, b_id);
    let b_path = b_id.map(|b| module_paths(&resolver, b)[0]);
    assert_eq!(b_path.and_then(|p| graph.path(p).sub_module), Some(a_id));
}

#[test]
fn same_file_through_two_paths_is_one_module() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:kes x, y, lib.util;\n");
    tree.write("x.kes", "import:kes lib.util;\n");
    tree.write("y.kes", "import:kes .lib.util;\n");
    tree.write("lib/util.kes", "glob u;\n");
    let mut resolver = resolver();

    let out = resolve(&mut resolver, &entry);
    let util = out.deps.get(&tree.path("lib/util.kes")).copied();
    assert!(util.is_some());

    let graph = resolver.graph();
    let links: Vec<Option<ModuleId>> = graph
        .modules()
        .flat_map(|(id, _)| graph.collect_paths(id))
        .filter(|&p| graph.path(p).target.dotted() == "lib.util")
        .map(|p| graph.path(p).sub_module)
        .collect();
    assert_eq!(links, vec![util, util, util]);
    assert_eq!(resolver.parser().calls.get(), 4);
}

#[test]
fn package_mod_file_and_parent_levels() {
    let tree = Tree::new();
    let entry = tree.write("app/main.kes", "import:kes pkg, ..shared;\n");
    tree.write("app/pkg/mod.kes", "obj P {}\n");
    tree.write("shared.kes", "obj S {}\n");
    let mut resolver = resolver();

    let out = resolve(&mut resolver, &entry);

    assert_eq!(out.diagnostics.len(), 0);
    assert_eq!(
        sorted_keys(&out.deps),
        vec![tree.path("app/main.kes"), tree.path("app/pkg/mod.kes"), tree.path("shared.kes")]
    );
    assert_eq!(
        out.deps.get(&tree.path("app/pkg/mod.kes")).map(|&m| resolver.graph().module(m).name.clone()),
        Some("pkg".to_string())
    );
}

#[test]
fn candidate_files_follow_level_semantics() {
    let importer = Path::new("/src/app/main.kes");
    let target = |level| {
        ImportTarget::new(vec!["a".to_string(), "b".to_string()], Span::DUMMY).with_level(level)
    };

    let same = [PathBuf::from("/src/app/a/b.kes"), PathBuf::from("/src/app/a/b/mod.kes")];
    assert_eq!(candidate_files(importer, &target(0), "kes"), same);
    assert_eq!(candidate_files(importer, &target(1), "kes"), same);
    assert_eq!(
        candidate_files(importer, &target(2), "kes"),
        [PathBuf::from("/src/a/b.kes"), PathBuf::from("/src/a/b/mod.kes")]
    );
}

#[test]
fn second_resolve_is_a_cache_hit() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:kes a;\n");
    tree.write("a.kes", "import:kes main;\n");
    let mut resolver = resolver();

    let first = resolve(&mut resolver, &entry);
    let calls = resolver.parser().calls.get();
    let modules = resolver.graph().len();
    let second = resolve(&mut resolver, &entry);

    assert_eq!(first, second);
    assert_eq!(resolver.parser().calls.get(), calls);
    assert_eq!(resolver.graph().len(), modules);
}

#[test]
fn fresh_resolvers_agree() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:kes a, b;\n");
    tree.write("a.kes", "import:kes b;\n");
    tree.write("b.kes", "import:kes a;\n");

    let topology = |resolver: &ModuleResolver<CountingParser, SearchPathLocator>| {
        let graph = resolver.graph();
        let mut edges: Vec<(PathBuf, String, Option<PathBuf>)> = graph
            .modules()
            .flat_map(|(id, m)| {
                graph.collect_paths(id).into_iter().map(move |p| {
                    let mp = graph.path(p);
                    (
                        m.path.clone(),
                        mp.target.dotted(),
                        mp.sub_module.map(|s| graph.module(s).path.clone()),
                    )
                })
            })
            .collect();
        edges.sort();
        edges
    };

    let mut first = resolver();
    let out_first = resolve(&mut first, &entry);
    let mut second = resolver();
    let out_second = resolve(&mut second, &entry);

    assert_eq!(sorted_keys(&out_first.deps), sorted_keys(&out_second.deps));
    assert_eq!(topology(&first), topology(&second));
}

#[test]
fn reset_starts_a_new_run() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:kes a;\n");
    tree.write("a.kes", "glob a;\n");
    let mut resolver = resolver();

    resolve(&mut resolver, &entry);
    resolver.reset();
    assert!(resolver.graph().is_empty());

    let out = resolve(&mut resolver, &entry);
    assert_eq!(out.deps.len(), 2);
    assert_eq!(resolver.parser().calls.get(), 4);
}

#[test]
fn annexes_wrap_the_module_items() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "obj Main {}\n");
    tree.write("main.impl.kes", "impl Main.run {}\n");
    tree.write("main.test.kes", "test runs {}\n");
    let mut resolver = resolver();

    let out = resolve(&mut resolver, &entry);
    let graph = resolver.graph();
    let root = graph.module(out.root);

    let impl_annex = root.impl_annex;
    let test_annex = root.test_annex;
    assert!(impl_annex.is_some() && test_annex.is_some());
    assert_eq!(root.items.first(), impl_annex.map(ModuleItem::Annex).as_ref());
    assert_eq!(root.items.last(), test_annex.map(ModuleItem::Annex).as_ref());
    assert_eq!(root.items.len(), 3);
    assert!(impl_annex.is_some_and(|m| graph.module(m).is_imported));
    assert!(!root.is_imported);
    assert_eq!(out.deps.len(), 3);
}

#[test]
fn annexes_of_imported_modules_bring_their_own_imports() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:kes lib;\n");
    tree.write("lib.kes", "obj Lib {}\n");
    tree.write("lib.impl.kes", "import:kes helper;\nimpl Lib.go {}\n");
    tree.write("helper.kes", "glob h;\n");
    tree.write("lib.test.kes", "import:kes fixtures;\ntest lib_works {}\n");
    tree.write("fixtures.kes", "glob f;\n");
    let mut resolver = resolver();

    let out = resolve(&mut resolver, &entry);

    assert_eq!(out.diagnostics.len(), 0);
    assert!(out.deps.contains_key(&tree.path("helper.kes")));
    assert!(out.deps.contains_key(&tree.path("fixtures.kes")));
    assert_eq!(out.deps.len(), 6);

    let graph = resolver.graph();
    let lib = match out.deps.get(&tree.path("lib.kes")) {
        Some(&id) => graph.module(id),
        None => panic!("lib.kes not resolved"),
    };
    assert!(lib.impl_annex.is_some() && lib.test_annex.is_some());
    assert_eq!(lib.items.first(), lib.impl_annex.map(ModuleItem::Annex).as_ref());
    assert_eq!(lib.items.last(), lib.test_annex.map(ModuleItem::Annex).as_ref());
    assert_eq!(lib.items.len(), 3);
}

#[test]
fn entry_annex_imports_are_resolved() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "obj Main {}\n");
    tree.write("main.test.kes", "import:kes util;\ntest t {}\n");
    tree.write("util.kes", "glob u;\n");
    let mut resolver = resolver();

    let out = resolve(&mut resolver, &entry);
    let util = out.deps.get(&tree.path("util.kes")).copied();
    assert!(util.is_some());

    let graph = resolver.graph();
    let test_paths = graph.module(out.root).test_annex.map(|t| graph.collect_paths(t));
    let linked = test_paths.and_then(|paths| graph.path(paths[0]).sub_module);
    assert_eq!(linked, util);
}

#[test]
fn annexes_are_never_duplicated() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:kes other;\nobj Main {}\n");
    tree.write("other.kes", "import:kes main;\n");
    tree.write("main.impl.kes", "impl Main.run {}\n");
    let mut resolver = resolver();

    let out = resolve(&mut resolver, &entry);
    let annexes = resolver
        .graph()
        .module(out.root)
        .items
        .iter()
        .filter(|item| matches!(item, ModuleItem::Annex(_)))
        .count();
    assert_eq!(annexes, 1);
}

#[test]
fn invalid_annex_is_reported_and_skipped() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "obj Main {}\n");
    tree.write("main.impl.kes", "impl Main.run {\n");
    let mut resolver = resolver();

    let out = resolve(&mut resolver, &entry);

    assert_eq!(out.diagnostics.len(), 1);
    let diag = &out.diagnostics.as_slice()[0];
    assert_eq!(diag.code, ErrorCode::E3002);
    assert_eq!(diag.file, Some(tree.path("main.impl.kes")));
    assert_eq!(diag.node, Some(NodeRef::Module(out.root)));
    assert_eq!(diag.notes.len(), 2);
    assert_eq!(resolver.graph().module(out.root).impl_annex, None);
}

#[test]
fn alias_renames_the_visible_name_only() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:kes geometry.shapes as sh;\n");
    tree.write("geometry/shapes.kes", "obj Circle {}\n");
    let mut resolver = resolver();

    let out = resolve(&mut resolver, &entry);
    let key = tree.path("geometry/shapes.kes");
    let shapes = out.deps.get(&key).copied();
    let module = shapes.map(|m| resolver.graph().module(m));

    assert_eq!(module.map(|m| m.name.as_str()), Some("sh"));
    assert_eq!(module.map(|m| m.path.clone()), Some(key));
}

#[test]
fn foreign_imports_bridge_transitively() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:py pkg.api;\n");
    tree.write("site/pkg/__init__.py", "");
    tree.write("site/pkg/api.py", "import helpers\nimport math\n\ndef call():\n    pass\n");
    tree.write("site/helpers.py", "from pkg import api\n");
    let config = ResolveConfig::default().with_host_path(tree.dir.path().join("site"));
    let mut resolver = ModuleResolver::new(config);

    let out = resolve(&mut resolver, &entry);

    assert_eq!(out.diagnostics.len(), 0);
    let mut expected = vec![
        tree.path("main.kes"),
        tree.path("site/helpers.py"),
        tree.path("site/pkg/api.py"),
        // `from pkg import api` in helpers.py
        tree.path("site/pkg/__init__.py"),
    ];
    expected.sort();
    assert_eq!(sorted_keys(&out.deps), expected);
    let api = out.deps.get(&tree.path("site/pkg/api.py")).copied();
    let api_module = api.map(|m| resolver.graph().module(m));
    assert_eq!(api_module.map(|m| m.lang), Some(SourceLang::Foreign));
    assert!(api_module.is_some_and(|m| m.is_imported));
}

#[test]
fn host_modules_do_not_see_their_own_directory() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:py pkg;\n");
    tree.write("site/pkg/__init__.py", "import util\n");
    tree.write("site/pkg/util.py", "def helper():\n    pass\n");
    let config = ResolveConfig::default().with_host_path(tree.dir.path().join("site"));
    let mut resolver = ModuleResolver::new(config);

    let out = resolve(&mut resolver, &entry);

    assert_eq!(out.diagnostics.len(), 0);
    assert_eq!(
        sorted_keys(&out.deps),
        vec![tree.path("main.kes"), tree.path("site/pkg/__init__.py")]
    );
}

#[test]
fn foreign_module_outside_allow_list_is_silently_skipped() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:py other;\n");
    tree.write("site/other.py", "x = 1\n");
    let config = ResolveConfig::default()
        .with_host_path(tree.dir.path().join("site"))
        .with_policy(BridgePolicy::default().allow("numpy"));
    let mut resolver = ModuleResolver::new(config);

    let out = resolve(&mut resolver, &entry);

    assert_eq!(out.deps.len(), 1);
    assert_eq!(out.diagnostics.len(), 0);
    let path = module_paths(&resolver, out.root)[0];
    assert!(!resolver.graph().path(path).is_resolved());
}

#[test]
fn allowed_extension_module_is_silently_skipped() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:py _fast;\n");
    tree.write("site/_fast.cpython-312-x86_64-linux-gnu.so", "");
    let config = ResolveConfig::default()
        .with_host_path(tree.dir.path().join("site"))
        .with_policy(BridgePolicy::default().allow("_fast"));
    let mut resolver = ModuleResolver::new(config);

    let out = resolve(&mut resolver, &entry);

    assert_eq!(out.deps.len(), 1);
    assert_eq!(out.diagnostics.len(), 0);
}

#[test]
fn disabled_bridge_never_links_foreign_modules() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:py mod;\n");
    tree.write("site/mod.py", "import json\n");
    let config = ResolveConfig::default()
        .with_host_path(tree.dir.path().join("site"))
        .with_policy(BridgePolicy::disabled());
    let mut resolver = ModuleResolver::new(config);

    let out = resolve(&mut resolver, &entry);
    assert_eq!(out.deps.len(), 1);
    assert_eq!(out.diagnostics.len(), 0);
}

#[test]
fn foreign_bridge_failure_is_a_warning_on_the_path() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:py broken;\nimport:kes a;\n");
    tree.write("a.kes", "glob a;\n");
    tree.write("site/broken.py", "s = 'unterminated\n");
    let config = ResolveConfig::default().with_host_path(tree.dir.path().join("site"));
    let mut resolver = ModuleResolver::new(config);

    let out = resolve(&mut resolver, &entry);

    assert_eq!(out.deps.len(), 2);
    assert_eq!(out.diagnostics.error_count(), 0);
    assert_eq!(out.diagnostics.warning_count(), 1);
    let paths = module_paths(&resolver, out.root);
    let diag = &out.diagnostics.as_slice()[0];
    assert_eq!(diag.code, ErrorCode::E3003);
    assert_eq!(diag.node, Some(NodeRef::ModulePath(paths[0])));
}

#[test]
fn foreign_module_next_to_the_importer_is_found() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "import:py local_helper;\n");
    tree.write("local_helper.py", "def help():\n    pass\n");
    let mut resolver = ModuleResolver::new(ResolveConfig::default());

    let out = resolve(&mut resolver, &entry);
    assert!(out.deps.contains_key(&tree.path("local_helper.py")));
}

#[test]
fn entry_parse_failure_is_an_error() {
    let tree = Tree::new();
    let entry = tree.write("main.kes", "obj {\n");
    let mut resolver = resolver();

    assert!(resolver.resolve(&entry).is_err());
    assert!(resolver.resolve(&tree.dir.path().join("nope.kes")).is_err());
}
