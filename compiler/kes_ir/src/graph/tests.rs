use super::*;
use crate::{DeclKind, ParsedImport};
use pretty_assertions::assert_eq;

fn target(name: &str) -> ImportTarget {
    ImportTarget::new(name.split('.').map(String::from).collect(), Span::DUMMY)
}

fn parsed_with_imports(lang: SourceLang, names: &[&str]) -> ParsedModule {
    ParsedModule {
        items: vec![
            ParsedItem::Import(ParsedImport {
                lang,
                targets: names.iter().map(|n| target(n)).collect(),
                span: Span::DUMMY,
            }),
            ParsedItem::Decl(Decl {
                kind: DeclKind::Object,
                name: "Thing".into(),
                span: Span::new(10, 20),
            }),
        ],
    }
}

#[test]
fn insert_registers_module_and_paths() {
    let mut graph = ModuleGraph::new();
    let id = graph.insert(
        PathBuf::from("/p/main.kes"),
        SourceLang::Native,
        parsed_with_imports(SourceLang::Native, &["a", "b.c"]),
    );

    assert_eq!(graph.lookup(Path::new("/p/main.kes")), Some(id));
    assert_eq!(graph.module(id).name, "main");
    assert!(!graph.module(id).is_imported);

    let paths = graph.collect_paths(id);
    assert_eq!(paths.len(), 2);
    assert_eq!(graph.path(paths[1]).target.dotted(), "b.c");
    assert_eq!(graph.path(paths[1]).owner, id);
    assert_eq!(graph.path(paths[1]).lang, SourceLang::Native);
    assert!(!graph.path(paths[0]).is_resolved());
}

#[test]
fn insert_same_path_returns_cached_module() {
    let mut graph = ModuleGraph::new();
    let first = graph.insert(PathBuf::from("/p/a.kes"), SourceLang::Native, ParsedModule::default());
    let second = graph.insert(
        PathBuf::from("/p/a.kes"),
        SourceLang::Native,
        parsed_with_imports(SourceLang::Native, &["x"]),
    );
    assert_eq!(first, second);
    assert_eq!(graph.len(), 1);
    assert!(graph.collect_paths(first).is_empty());
}

#[test]
fn annexes_are_placed_around_owner_items() {
    let mut graph = ModuleGraph::new();
    let owner = graph.insert(
        PathBuf::from("/p/a.kes"),
        SourceLang::Native,
        parsed_with_imports(SourceLang::Native, &["x"]),
    );
    let test = graph.insert(
        PathBuf::from("/p/a.test.kes"),
        SourceLang::Native,
        parsed_with_imports(SourceLang::Native, &["t"]),
    );
    let imp = graph.insert(
        PathBuf::from("/p/a.impl.kes"),
        SourceLang::Native,
        parsed_with_imports(SourceLang::Native, &["i"]),
    );

    assert!(graph.attach_annex(owner, AnnexKind::Test, test));
    assert!(graph.attach_annex(owner, AnnexKind::Impl, imp));

    let items = &graph.module(owner).items;
    assert_eq!(items.first(), Some(&ModuleItem::Annex(imp)));
    assert_eq!(items.last(), Some(&ModuleItem::Annex(test)));
    assert_eq!(graph.module(owner).impl_annex, Some(imp));
    assert_eq!(graph.module(owner).test_annex, Some(test));

    let names: Vec<_> = graph
        .collect_paths(owner)
        .into_iter()
        .map(|p| graph.path(p).target.dotted())
        .collect();
    assert_eq!(names, vec!["i", "x", "t"]);
}

#[test]
fn attaching_a_filled_annex_slot_is_a_no_op() {
    let mut graph = ModuleGraph::new();
    let owner = graph.insert(PathBuf::from("/p/a.kes"), SourceLang::Native, ParsedModule::default());
    let imp = graph.insert(PathBuf::from("/p/a.impl.kes"), SourceLang::Native, ParsedModule::default());

    assert!(graph.attach_annex(owner, AnnexKind::Impl, imp));
    assert!(!graph.attach_annex(owner, AnnexKind::Impl, imp));
    assert_eq!(graph.module(owner).items.len(), 1);
}

#[test]
fn link_sets_sub_module() {
    let mut graph = ModuleGraph::new();
    let a = graph.insert(
        PathBuf::from("/p/a.kes"),
        SourceLang::Native,
        parsed_with_imports(SourceLang::Native, &["b"]),
    );
    let b = graph.insert(PathBuf::from("/p/b.kes"), SourceLang::Native, ParsedModule::default());
    let path = graph.collect_paths(a)[0];

    graph.link(path, b);
    assert_eq!(graph.path(path).sub_module, Some(b));
}

#[test]
fn clear_empties_import_table() {
    let mut graph = ModuleGraph::new();
    graph.insert(PathBuf::from("/p/a.kes"), SourceLang::Native, ParsedModule::default());
    graph.clear();
    assert!(graph.is_empty());
    assert!(graph.import_table().is_empty());
}
