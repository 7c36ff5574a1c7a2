use slicegen_core::Location;

use super::*;

fn at(line: u32) -> Location {
    Location::new("Demo.ice", line)
}

#[test]
fn severity_display() {
    insta::assert_snapshot!(format!("{}", Severity::Error), @"error");
    insta::assert_snapshot!(format!("{}", Severity::Warning), @"warning");
}

#[test]
fn report_with_default_message() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::AccessorConflict, at(3))
        .emit();

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics.has_errors());
    assert!(!diagnostics.has_warnings());
}

#[test]
fn report_with_custom_message() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::AccessorConflict, at(3))
        .message("getName")
        .emit();

    insta::assert_snapshot!(
        diagnostics.render(),
        @"error: Demo.ice:3: operation `getName' conflicts with method for data member"
    );
}

#[test]
fn warnings_do_not_count_as_errors() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::InvalidSerialVersionUid, at(5))
        .message("class `::Demo::Base'")
        .emit();
    diagnostics
        .report(DiagnosticKind::InvalidMetadata, at(6))
        .message("java:frobnicate")
        .emit();

    assert_eq!(diagnostics.warning_count(), 2);
    assert_eq!(diagnostics.error_count(), 0);
    insta::assert_snapshot!(diagnostics.render(), @r"
    warning: Demo.ice:5: ignoring invalid serialVersionUID for class `::Demo::Base'; generating default value
    warning: Demo.ice:6: ignoring invalid metadata `java:frobnicate'
    ");
}

#[test]
fn location_without_file() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::InvalidFreezeMetadata, Location::default())
        .emit();

    insta::assert_snapshot!(diagnostics.render(), @"warning: invalid freeze metadata");
}

#[test]
fn related_info_in_plain_output() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::AccessorConflict, at(4))
        .message("getX")
        .related_to("operation declared here", at(9))
        .emit();

    insta::assert_snapshot!(
        diagnostics.render(),
        @"error: Demo.ice:4: operation `getX' conflicts with method for data member (related: operation declared here at Demo.ice:9)"
    );
}

#[test]
fn snippet_when_source_registered() {
    let source = "module Demo\n{\n    class C { int x; int getX(); }\n}\n";
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::AccessorConflict, at(3))
        .message("getX")
        .emit();

    let result = diagnostics.printer().source("Demo.ice", source).render();
    assert!(result.starts_with("error: operation `getX' conflicts"));
    assert!(result.contains("Demo.ice:3"));
    assert!(result.contains("class C { int x; int getX(); }"));
}

#[test]
fn snippet_falls_back_for_unknown_line() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::AccessorConflict, at(40))
        .message("getX")
        .emit();

    let result = diagnostics.printer().source("Demo.ice", "one line\n").render();
    insta::assert_snapshot!(
        result,
        @"error: Demo.ice:40: operation `getX' conflicts with method for data member"
    );
}

#[test]
fn extend_merges_counts() {
    let mut a = Diagnostics::new();
    a.report(DiagnosticKind::AccessorConflict, at(1)).emit();
    let mut b = Diagnostics::new();
    b.report(DiagnosticKind::InvalidMetadata, at(2)).emit();

    a.extend(b);
    assert_eq!(a.len(), 2);
    assert_eq!(a.error_count(), 1);
    assert_eq!(a.warning_count(), 1);
}
