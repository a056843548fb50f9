use super::*;
use kes_ir::ModulePathId;

#[test]
fn test_diagnostic_builder() {
    let diag = Diagnostic::error(ErrorCode::E3001)
        .with_message("cannot find module `a`")
        .in_file("/p/main.kes")
        .at_node(NodeRef::ModulePath(ModulePathId::new(3)))
        .with_label(Span::new(0, 5), "imported here")
        .with_note("searched: /p/a.kes");

    assert_eq!(diag.code, ErrorCode::E3001);
    assert!(diag.is_error());
    assert_eq!(diag.primary_span(), Some(Span::new(0, 5)));
    assert_eq!(diag.node, Some(NodeRef::ModulePath(ModulePathId::new(3))));
    assert_eq!(diag.notes.len(), 1);
}

#[test]
fn test_warning_is_not_error() {
    let diag = Diagnostic::warning(ErrorCode::E3003).with_message("opaque");
    assert_eq!(diag.severity, Severity::Warning);
    assert!(!diag.is_error());
    assert_eq!(diag.primary_span(), None);
}

#[test]
fn test_diagnostic_display() {
    let diag = Diagnostic::error(ErrorCode::E3010)
        .with_message("`x` is already declared")
        .in_file("/p/main.kes")
        .with_label(Span::new(10, 11), "redeclared here")
        .with_cross_file_label(Path::new("/p/other.kes"), Span::new(0, 1), "first declared here");

    let output = diag.to_string();
    assert!(output.starts_with("error [E3010]: `x` is already declared"));
    assert!(output.contains("--> /p/main.kes:10..11: redeclared here"));
    assert!(output.contains("::: /p/other.kes:0..1: first declared here"));
}

#[test]
fn test_display_without_labels_shows_file() {
    let diag = Diagnostic::error(ErrorCode::E3002)
        .with_message("not a module")
        .in_file("/p/bad.kes");
    assert!(diag.to_string().contains("--> /p/bad.kes"));
}
