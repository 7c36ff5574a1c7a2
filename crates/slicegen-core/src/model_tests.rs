use crate::test_utils::{def, demo_unit};
use crate::{Builtin, ConstValue, Definition, ModelError, Type, load_unit};

fn class_id(unit: &crate::Unit, scoped: &str) -> crate::ClassId {
    match def(unit, scoped) {
        Definition::Class(id) => id,
        other => panic!("{scoped} is {other:?}"),
    }
}

fn single_module(definitions: &str) -> String {
    format!(
        r#"{{"files": [{{"name": "t.ice", "modules": [{{"name": "M", "definitions": [{definitions}]}}]}}]}}"#
    )
}

#[test]
fn resolves_scoped_names() {
    let unit = demo_unit();
    assert!(matches!(def(&unit, "::Demo::Point"), Definition::Struct(_)));
    assert!(matches!(def(&unit, "::Demo::Greeter"), Definition::Class(_)));
    assert!(matches!(def(&unit, "::Demo::Loud"), Definition::Exception(_)));
    assert!(unit.lookup("::Demo::Missing").is_none());
}

#[test]
fn enumerator_values_continue_from_previous() {
    let unit = demo_unit();
    let Definition::Enum(id) = def(&unit, "::Demo::Color") else {
        panic!("not an enum");
    };
    let values: Vec<i32> = unit
        .enumeration(id)
        .enumerators
        .iter()
        .map(|e| e.value)
        .collect();
    assert_eq!(values, vec![0, 1, 4]);
    assert_eq!(unit.enumeration(id).max_value(), 4);
}

#[test]
fn enum_defaults_resolve_to_enumerators() {
    let unit = demo_unit();
    let derived = unit.class(class_id(&unit, "::Demo::Derived"));
    let color = &derived.members[1];
    assert!(matches!(color.default, Some(ConstValue::Enumerator(_, 1))));

    let Definition::Const(fav) = def(&unit, "::Demo::Favorite") else {
        panic!("not a const");
    };
    assert!(matches!(
        unit.constant(fav).value,
        ConstValue::Enumerator(_, 2)
    ));
}

#[test]
fn class_inheritance_queries() {
    let unit = demo_unit();
    let base = class_id(&unit, "::Demo::Base");
    let derived = class_id(&unit, "::Demo::Derived");

    assert_eq!(unit.class(derived).base, Some(base));
    assert!(unit.class_is_base_of(base, derived));
    assert!(!unit.class_is_base_of(derived, base));
    assert_eq!(unit.class_depth(derived), 1);

    let names: Vec<&str> = unit
        .all_class_members(derived)
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["id", "label", "peer", "color"]);

    assert!(unit.class_preserves_slice(derived));
    assert!(unit.class_inherits_preserve(derived));
    assert!(!unit.class_inherits_preserve(base));
}

#[test]
fn inherited_operations_follow_own() {
    let unit = demo_unit();
    let shouter = class_id(&unit, "::Demo::Shouter");
    let names: Vec<&str> = unit
        .all_operations(shouter)
        .iter()
        .map(|op| op.name.as_str())
        .collect();
    assert_eq!(names, vec!["shout", "greet", "count"]);
    assert!(unit.class_has_proxy(shouter));
}

#[test]
fn exception_chain() {
    let unit = demo_unit();
    let Definition::Exception(err) = def(&unit, "::Demo::Err") else {
        panic!("not an exception");
    };
    let Definition::Exception(loud) = def(&unit, "::Demo::Loud") else {
        panic!("not an exception");
    };
    assert!(unit.exception_is_base_of(err, loud));
    assert!(!unit.exception_is_base_of(loud, err));
    assert_eq!(unit.exception_depth(loud), 1);
    assert_eq!(unit.all_exception_members(loud).len(), 2);
}

#[test]
fn class_usage_is_transitive() {
    let unit = demo_unit();
    let Definition::Sequence(base_seq) = def(&unit, "::Demo::BaseSeq") else {
        panic!("not a sequence");
    };
    let Definition::Struct(named) = def(&unit, "::Demo::Named") else {
        panic!("not a struct");
    };
    assert!(unit.uses_classes(Type::Sequence(base_seq)));
    assert!(!unit.uses_classes(Type::Struct(named)));
    assert!(unit.uses_reference_semantics(Type::Builtin(Builtin::Value)));
    assert!(!unit.uses_reference_semantics(Type::Builtin(Builtin::ObjectProxy)));
}

#[test]
fn wire_sizes() {
    let unit = demo_unit();
    let Definition::Struct(point) = def(&unit, "::Demo::Point") else {
        panic!("not a struct");
    };
    let Definition::Struct(named) = def(&unit, "::Demo::Named") else {
        panic!("not a struct");
    };
    assert!(!unit.is_variable_length(Type::Struct(point)));
    assert!(unit.is_variable_length(Type::Struct(named)));
    assert_eq!(unit.min_wire_size(Type::Struct(point)), 8);
    assert_eq!(unit.min_wire_size(Type::Struct(named)), 9);
}

#[test]
fn operation_shape() {
    let unit = demo_unit();
    let greeter = unit.class(class_id(&unit, "::Demo::Greeter"));
    let count = &greeter.operations[1];
    assert!(count.returns_multiple_values());
    assert!(count.returns_data());
    assert!(!count.sends_optionals());
    assert!(!greeter.operations[0].returns_multiple_values());
}

#[test]
fn duplicate_definition_rejected() {
    let json = single_module(
        r#"{"kind": "struct", "name": "S", "line": 1}, {"kind": "enum", "name": "S", "line": 2, "enumerators": []}"#,
    );
    let err = load_unit(&json).unwrap_err();
    assert_eq!(err.to_string(), "t.ice:2: `::M::S` is already defined");
}

#[test]
fn undefined_type_rejected() {
    let json = single_module(
        r#"{"kind": "sequence", "name": "S", "line": 3, "element": "::M::Nope"}"#,
    );
    let err = load_unit(&json).unwrap_err();
    assert!(matches!(err, ModelError::UndefinedType { .. }));
}

#[test]
fn exception_is_not_a_type() {
    let json = single_module(
        r#"{"kind": "exception", "name": "E"}, {"kind": "sequence", "name": "S", "element": "::M::E"}"#,
    );
    let err = load_unit(&json).unwrap_err();
    assert!(matches!(err, ModelError::NotAType { .. }));
}

#[test]
fn cyclic_class_inheritance_rejected() {
    let json = single_module(
        r#"{"kind": "class", "name": "A", "base": "::M::B"}, {"kind": "class", "name": "B", "base": "::M::A"}"#,
    );
    let err = load_unit(&json).unwrap_err();
    assert!(matches!(err, ModelError::CyclicInheritance { .. }));
}

#[test]
fn interface_cannot_be_class_base() {
    let json = single_module(
        r#"{"kind": "interface", "name": "I"}, {"kind": "class", "name": "C", "base": "::M::I"}"#,
    );
    let err = load_unit(&json).unwrap_err();
    assert!(matches!(err, ModelError::InvalidBase { .. }));
}

#[test]
fn duplicate_tag_across_hierarchy_rejected() {
    let json = single_module(
        r#"{"kind": "class", "name": "A", "members": [{"name": "a", "type": "int", "tag": 1}]},
           {"kind": "class", "name": "B", "line": 5, "base": "::M::A",
            "members": [{"name": "b", "type": "int", "tag": 1}]}"#,
    );
    let err = load_unit(&json).unwrap_err();
    assert_eq!(
        err.to_string(),
        "t.ice:5: tag 1 is used more than once in `::M::B`"
    );
}

#[test]
fn negative_tag_rejected() {
    let json = single_module(
        r#"{"kind": "interface", "name": "I", "operations": [
             {"name": "op", "line": 3, "params": [{"name": "p", "type": "int", "tag": -1}]}
           ]}"#,
    );
    let err = load_unit(&json).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"t.ice:3: tag -1 in `::M::I::op` is negative");

    let json = single_module(
        r#"{"kind": "class", "name": "C", "line": 2,
            "members": [{"name": "m", "type": "int", "tag": -4}]}"#,
    );
    assert!(matches!(
        load_unit(&json).unwrap_err(),
        ModelError::NegativeTag { tag: -4, .. }
    ));
}

#[test]
fn integer_literals_checked_against_range() {
    let json = single_module(
        r#"{"kind": "const", "name": "B", "line": 6, "type": "byte", "value": "300"}"#,
    );
    insta::assert_snapshot!(
        load_unit(&json).unwrap_err().to_string(),
        @"t.ice:6: `300` is not a valid byte literal"
    );

    let json = single_module(
        r#"{"kind": "const", "name": "B", "type": "byte", "value": "0xFF"},
           {"kind": "const", "name": "L", "type": "long", "value": "-9L"}"#,
    );
    assert!(load_unit(&json).is_ok());

    let json = single_module(
        r#"{"kind": "struct", "name": "S", "members": [{"name": "n", "type": "short", "default": "lots"}]}"#,
    );
    assert!(matches!(
        load_unit(&json).unwrap_err(),
        ModelError::InvalidLiteral { type_name: "short", .. }
    ));
}

#[test]
fn invalid_enum_default_rejected() {
    let json = single_module(
        r#"{"kind": "enum", "name": "E", "enumerators": [{"name": "a"}]},
           {"kind": "struct", "name": "S", "members": [{"name": "e", "type": "::M::E", "default": "zzz"}]}"#,
    );
    let err = load_unit(&json).unwrap_err();
    assert!(matches!(err, ModelError::InvalidValueRef { .. }));
}

#[test]
fn tagged_struct_member_rejected() {
    let json = single_module(
        r#"{"kind": "struct", "name": "S", "members": [{"name": "a", "type": "int", "tag": 1, "line": 4}]}"#,
    );
    let err = load_unit(&json).unwrap_err();
    assert_eq!(
        err.to_string(),
        "t.ice:4: struct member `a` of `::M::S` cannot be optional"
    );
}
