use crate::test_utils::DEMO_MODEL;
use crate::{RawDefinition, parse_unit};

#[test]
fn parse_raw_unit() {
    let raw = parse_unit(DEMO_MODEL).unwrap();
    assert_eq!(raw.files.len(), 1);

    let module = &raw.files[0].modules[0];
    assert_eq!(module.name, "Demo");
    assert_eq!(module.metadata, vec!["java:package:com.acme"]);
    assert_eq!(module.definitions.len(), 14);
}

#[test]
fn definitions_discriminated_by_kind() {
    let raw = parse_unit(DEMO_MODEL).unwrap();
    let defs = &raw.files[0].modules[0].definitions;

    assert!(matches!(defs[0], RawDefinition::Struct(_)));
    assert!(matches!(defs[3], RawDefinition::Class(_)));
    assert!(matches!(defs[7], RawDefinition::Interface(_)));
    assert_eq!(defs[7].name(), "Greeter");
}

#[test]
fn optional_fields_default() {
    let raw = parse_unit(r#"{"files": [{"name": "a.ice", "modules": [{"name": "M",
        "definitions": [{"kind": "struct", "name": "S"}]}]}]}"#)
    .unwrap();
    let RawDefinition::Struct(s) = &raw.files[0].modules[0].definitions[0] else {
        panic!("expected struct");
    };
    assert_eq!(s.line, 0);
    assert!(s.members.is_empty());
    assert!(raw.checksums.is_empty());
}

#[test]
fn unknown_kind_rejected() {
    let err = parse_unit(r#"{"files": [{"name": "a.ice", "modules": [{"name": "M",
        "definitions": [{"kind": "union", "name": "U"}]}]}]}"#)
    .unwrap_err();
    assert!(err.to_string().contains("unknown variant `union`"));
}
