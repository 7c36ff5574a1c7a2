use slicegen_core::{Builtin, Type, Unit};

use crate::test_utils::{class, newer_unit, older_unit, ty};
use crate::{DecodeError, EncodeError, Graph, Instance, Marshaler, Unmarshaler, Value, record};

/// Encode one class reference plus its pending instances.
fn encode_instance(unit: &Unit, graph: &Graph, declared: Type, value: &Value) -> Vec<u8> {
    let mut m = Marshaler::new(unit);
    m.write(graph, declared, value).unwrap();
    m.write_pending_values(graph).unwrap();
    m.finish()
}

fn decode_instance(unit: &Unit, declared: Type, bytes: &[u8]) -> Result<(Value, Graph), DecodeError> {
    let mut u = Unmarshaler::new(unit, bytes);
    let value = u.read(declared)?;
    u.read_pending_values()?;
    Ok((value, u.finish()?))
}

#[test]
fn struct_members_in_declaration_order() {
    let unit = older_unit();
    let point = ty(&unit, "Point");
    let value = Value::Struct(record! { "x" => Value::Int(1), "y" => Value::Int(2) });

    let mut m = Marshaler::new(&unit);
    m.write(&Graph::new(), point, &value).unwrap();
    let bytes = m.finish();
    assert_eq!(bytes, vec![1, 0, 0, 0, 2, 0, 0, 0]);

    let mut u = Unmarshaler::new(&unit, &bytes);
    assert_eq!(u.read(point), Ok(value));
}

#[test]
fn missing_struct_member_rejected() {
    let unit = older_unit();
    let value = Value::Struct(record! { "x" => Value::Int(1) });
    let mut m = Marshaler::new(&unit);
    let err = m.write(&Graph::new(), ty(&unit, "Point"), &value).unwrap_err();
    assert_eq!(err.to_string(), "missing required member `y`");
}

#[test]
fn type_mismatch_names_both_sides() {
    let unit = older_unit();
    let mut m = Marshaler::new(&unit);
    let err = m
        .write(&Graph::new(), Type::Builtin(Builtin::Int), &Value::String("x".into()))
        .unwrap_err();
    assert_eq!(err.to_string(), "expected int value, found string");
}

#[test]
fn enum_out_of_range_rejected() {
    let unit = older_unit();
    let bytes = [5];
    let mut u = Unmarshaler::new(&unit, &bytes);
    assert_eq!(
        u.read(ty(&unit, "Color")),
        Err(DecodeError::EnumOutOfRange {
            type_id: "::W::Color".to_string(),
            value: 5
        })
    );
}

#[test]
fn optionals_written_by_ascending_tag() {
    let unit = older_unit();
    let tags = class(&unit, "Tags");
    let members = record! {
        "a" => Value::Int(1),
        "c" => Value::Int(3),
        "b" => Value::Int(2),
    };

    let mut m = Marshaler::new(&unit);
    m.write_members(&Graph::new(), &unit.class(tags).members, &members)
        .unwrap();
    assert_eq!(
        m.finish(),
        vec![0x0A, 1, 0, 0, 0, 0x12, 2, 0, 0, 0, 0x1A, 3, 0, 0, 0]
    );
}

#[test]
fn read_optional_skips_smaller_unknown_tags() {
    let unit = older_unit();
    let bytes = [0x0A, 1, 0, 0, 0, 0x12, 2, 0, 0, 0, 0x1A, 3, 0, 0, 0];
    let mut u = Unmarshaler::new(&unit, &bytes);
    let int = Type::Builtin(Builtin::Int);
    assert_eq!(u.read_optional(3, int, bytes.len()), Ok(Some(Value::Int(3))));
    assert_eq!(u.input().position(), bytes.len());
}

#[test]
fn read_optional_leaves_larger_tag_in_place() {
    let unit = older_unit();
    let bytes = [0x1A, 3, 0, 0, 0];
    let mut u = Unmarshaler::new(&unit, &bytes);
    let int = Type::Builtin(Builtin::Int);
    assert_eq!(u.read_optional(2, int, bytes.len()), Ok(None));
    assert_eq!(u.input().position(), 0);
    assert_eq!(u.read_optional(3, int, bytes.len()), Ok(Some(Value::Int(3))));
}

#[test]
fn read_optional_rejects_wrong_format() {
    let unit = older_unit();
    let bytes = [0x0D, 1, b'x'];
    let mut u = Unmarshaler::new(&unit, &bytes);
    assert_eq!(
        u.read_optional(1, Type::Builtin(Builtin::Int), bytes.len()),
        Err(DecodeError::UnexpectedFormat {
            tag: 1,
            expected: "F4",
            found: "VSize"
        })
    );
}

#[test]
fn fixed_struct_optional_carries_size() {
    let unit = older_unit();
    let point = ty(&unit, "Point");
    let value = Value::Struct(record! { "x" => Value::Int(1), "y" => Value::Int(2) });

    let mut m = Marshaler::new(&unit);
    m.write_optional(&Graph::new(), 4, point, &value).unwrap();
    let bytes = m.finish();
    assert_eq!(bytes, vec![0x25, 8, 1, 0, 0, 0, 2, 0, 0, 0]);

    let mut u = Unmarshaler::new(&unit, &bytes);
    assert_eq!(u.read_optional(4, point, bytes.len()), Ok(Some(value)));
}

#[test]
fn class_with_optionals_round_trips() {
    let unit = older_unit();
    let derived = class(&unit, "Derived");
    let mut graph = Graph::new();
    let id = graph.add(Instance::new(
        derived,
        record! {
            "extra" => Value::Int(2),
            "note" => Value::String("n".into()),
            "code" => Value::Int(3),
            "id" => Value::Int(1),
            "label" => Value::String("x".into()),
        },
    ));

    let bytes = encode_instance(&unit, &graph, Type::Class(derived), &Value::Class(Some(id)));
    let (value, decoded) = decode_instance(&unit, Type::Class(derived), &bytes).unwrap();
    assert_eq!(value, Value::Class(Some(id)));
    assert_eq!(decoded, graph);
}

#[test]
fn absent_optionals_stay_absent() {
    let unit = older_unit();
    let base = class(&unit, "Base");
    let mut graph = Graph::new();
    let id = graph.add(Instance::new(base, record! { "id" => Value::Int(4) }));

    let bytes = encode_instance(&unit, &graph, Type::Class(base), &Value::Class(Some(id)));
    let (_, decoded) = decode_instance(&unit, Type::Class(base), &bytes).unwrap();
    assert!(!decoded.get(id).unwrap().members.contains_key("label"));
}

#[test]
fn null_reference_is_zero() {
    let unit = older_unit();
    let node = ty(&unit, "Node");
    let bytes = encode_instance(&unit, &Graph::new(), node, &Value::Class(None));
    assert_eq!(bytes, vec![0, 0]);

    let (value, graph) = decode_instance(&unit, node, &bytes).unwrap();
    assert_eq!(value, Value::Class(None));
    assert!(graph.is_empty());
}

#[test]
fn cyclic_graph_keeps_identity() {
    let unit = older_unit();
    let node = class(&unit, "Node");
    let mut graph = Graph::new();
    let a = graph.add(Instance::new(
        node,
        record! { "value" => Value::Int(1), "next" => Value::Class(None) },
    ));
    let b = graph.add(Instance::new(
        node,
        record! { "value" => Value::Int(2), "next" => Value::Class(Some(a)) },
    ));
    graph
        .get_mut(a)
        .unwrap()
        .members
        .insert("next".into(), Value::Class(Some(b)));

    let bytes = encode_instance(&unit, &graph, Type::Class(node), &Value::Class(Some(a)));
    let (value, decoded) = decode_instance(&unit, Type::Class(node), &bytes).unwrap();
    assert_eq!(value, Value::Class(Some(a)));
    assert_eq!(decoded, graph);
}

#[test]
fn unknown_derived_slice_preserved_and_restored() {
    let newer = newer_unit();
    let older = older_unit();
    let leaf = class(&newer, "Leaf");
    let members = record! {
        "depth" => Value::Int(9),
        "extra" => Value::Int(2),
        "code" => Value::Int(3),
        "id" => Value::Int(1),
    };
    let mut graph = Graph::new();
    let id = graph.add(Instance::new(leaf, members.clone()));
    let bytes = encode_instance(&newer, &graph, Type::Builtin(Builtin::Value), &Value::Class(Some(id)));

    let (value, sliced_graph) =
        decode_instance(&older, Type::Builtin(Builtin::Value), &bytes).unwrap();
    let Value::Class(Some(sliced_id)) = value else {
        panic!("expected an instance, got {value:?}");
    };
    let sliced = sliced_graph.get(sliced_id).unwrap();
    assert_eq!(sliced.class, class(&older, "Derived"));
    assert!(!sliced.members.contains_key("depth"));
    let preserved = sliced.sliced.as_ref().unwrap();
    assert_eq!(preserved.slices.len(), 1);
    assert_eq!(preserved.slices[0].compact_id, Some(9));
    assert_eq!(preserved.slices[0].bytes, vec![9, 0, 0, 0]);

    let forwarded = encode_instance(&older, &sliced_graph, Type::Builtin(Builtin::Value), &value);
    let (_, restored) =
        decode_instance(&newer, Type::Builtin(Builtin::Value), &forwarded).unwrap();
    let restored = restored.get(sliced_id).unwrap();
    assert_eq!(restored.class, leaf);
    assert_eq!(restored.members, members);
    assert_eq!(restored.sliced, None);
}

#[test]
fn unknown_slice_dropped_without_preservation() {
    let newer = newer_unit();
    let older = older_unit();
    let child = class(&newer, "PlainChild");
    let mut graph = Graph::new();
    let id = graph.add(Instance::new(
        child,
        record! { "m" => Value::Int(5), "n" => Value::Int(6) },
    ));
    let bytes = encode_instance(&newer, &graph, Type::Builtin(Builtin::Value), &Value::Class(Some(id)));

    let (_, decoded) = decode_instance(&older, Type::Builtin(Builtin::Value), &bytes).unwrap();
    let instance = decoded.get(id).unwrap();
    assert_eq!(instance.class, class(&older, "Plain"));
    assert_eq!(instance.members, record! { "n" => Value::Int(6) });
    assert_eq!(instance.sliced, None);
}

#[test]
fn no_known_type_rejected() {
    let newer = newer_unit();
    let older = older_unit();
    let orphan = class(&newer, "Orphan");
    let mut graph = Graph::new();
    let id = graph.add(Instance::new(orphan, record! { "o" => Value::Int(1) }));
    let bytes = encode_instance(&newer, &graph, Type::Builtin(Builtin::Value), &Value::Class(Some(id)));

    assert_eq!(
        decode_instance(&older, Type::Builtin(Builtin::Value), &bytes),
        Err(DecodeError::NoKnownType("::W::Orphan".to_string()))
    );
}

#[test]
fn reference_of_wrong_class_rejected() {
    let unit = older_unit();
    let base = class(&unit, "Base");
    let mut graph = Graph::new();
    let id = graph.add(Instance::new(base, record! { "id" => Value::Int(1) }));
    let bytes = encode_instance(&unit, &graph, Type::Builtin(Builtin::Value), &Value::Class(Some(id)));

    assert_eq!(
        decode_instance(&unit, ty(&unit, "Derived"), &bytes),
        Err(DecodeError::UnexpectedType {
            expected: "::W::Derived".to_string(),
            found: "::W::Base".to_string()
        })
    );
}

#[test]
fn dangling_reference_rejected() {
    let unit = older_unit();
    let bytes = [1, 0];
    assert_eq!(
        decode_instance(&unit, ty(&unit, "Node"), &bytes),
        Err(DecodeError::UnresolvedReference(1))
    );
}

#[test]
fn sequence_of_builtins() {
    let unit = slicegen_core::load_unit(indoc::indoc! {r#"
        {"files": [{"name": "S.ice", "modules": [{"name": "S", "definitions": [
          {"kind": "sequence", "name": "Shorts", "element": "short"}
        ]}]}]}
    "#})
    .unwrap();
    let Some(slicegen_core::Definition::Sequence(shorts)) = unit.lookup("::S::Shorts") else {
        panic!("missing sequence");
    };
    let payload = Value::Sequence(vec![Value::Short(1), Value::Short(-1)]);

    let mut m = Marshaler::new(&unit);
    m.write(&Graph::new(), Type::Sequence(shorts), &payload).unwrap();
    let bytes = m.finish();
    assert_eq!(bytes, vec![2, 1, 0, 0xFF, 0xFF]);

    let mut u = Unmarshaler::new(&unit, &bytes);
    assert_eq!(u.read(Type::Sequence(shorts)), Ok(payload));

    let oversized = [200, 1, 0];
    let mut u = Unmarshaler::new(&unit, &oversized);
    assert!(matches!(
        u.read(Type::Sequence(shorts)),
        Err(DecodeError::UnexpectedEof { .. })
    ));
}

#[test]
fn null_proxies_round_trip_in_sequence() {
    let unit = older_unit();
    let proxies = ty(&unit, "Proxies");
    let payload = Value::Sequence(vec![Value::Proxy(None); 3]);

    let mut m = Marshaler::new(&unit);
    m.write(&Graph::new(), proxies, &payload).unwrap();
    let bytes = m.finish();
    assert_eq!(bytes, vec![3, 0, 0, 0, 0, 0, 0]);

    let mut u = Unmarshaler::new(&unit, &bytes);
    assert_eq!(u.read(proxies), Ok(payload));
}

#[test]
fn proxy_identity_written_name_then_category() {
    let unit = older_unit();
    let links = ty(&unit, "Links");
    let payload = Value::Dictionary(vec![
        (Value::String("a".into()), Value::Proxy(Some("Grid/n1".into()))),
        (Value::String("b".into()), Value::Proxy(None)),
        (Value::String("c".into()), Value::Proxy(Some("solo".into()))),
    ]);

    let mut m = Marshaler::new(&unit);
    m.write(&Graph::new(), links, &payload).unwrap();
    let bytes = m.finish();
    assert_eq!(
        &bytes[..12],
        &[3, 1, b'a', 2, b'n', b'1', 4, b'G', b'r', b'i', b'd', 1]
    );

    let mut u = Unmarshaler::new(&unit, &bytes);
    assert_eq!(u.read(links), Ok(payload));
}

#[test]
fn enum_gaps_are_not_values() {
    let unit = older_unit();
    let shade = ty(&unit, "Shade");

    let mut m = Marshaler::new(&unit);
    let err = m.write(&Graph::new(), shade, &Value::Enum(2)).unwrap_err();
    assert!(matches!(err, EncodeError::Unencodable(_)));
    m.write(&Graph::new(), shade, &Value::Enum(4)).unwrap();
    assert_eq!(m.finish(), vec![4]);

    let mut u = Unmarshaler::new(&unit, &[2]);
    assert_eq!(
        u.read(shade),
        Err(DecodeError::EnumOutOfRange {
            type_id: "::W::Shade".to_string(),
            value: 2
        })
    );
    let mut u = Unmarshaler::new(&unit, &[4]);
    assert_eq!(u.read(shade), Ok(Value::Enum(4)));
}
