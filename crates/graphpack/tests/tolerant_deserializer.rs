//! End-to-end decoding of streams written under older type fingerprints.

use std::sync::Arc;

use graphpack::{
    DecodeError, Describe, ExtractError, FieldKind, FieldSchema, FieldSpec, Fingerprint,
    FingerprintRegistry, FromGraph, GraphSerializer, LocalTypes, ObjectGraph, ResolveError,
    TypeDescriptor, TypeIdentity, Value, VersionTolerantDeserializer,
};

const FOO: &str = "tests.Foo";

#[derive(Debug, PartialEq)]
struct Foo {
    name: String,
}

impl Describe for Foo {
    fn descriptor() -> TypeDescriptor {
        foo_descriptor(3)
    }
}

impl FromGraph for Foo {
    fn from_graph(graph: &ObjectGraph, value: &Value) -> Result<Self, ExtractError> {
        let instance = graph.instance_of(value, &TypeIdentity::from(FOO))?;
        Ok(Foo {
            name: instance.field(graph, "name")?,
        })
    }
}

fn foo_descriptor(fingerprint: u64) -> TypeDescriptor {
    TypeDescriptor::new(
        FOO,
        Fingerprint::new(fingerprint),
        FieldSchema::new([FieldSpec::new("name", FieldKind::Str)]),
    )
}

/// Serializes a `Foo` the way a build with `fingerprint` would have.
fn old_foo(fingerprint: u64, name: &str) -> Vec<u8> {
    let mut graph = ObjectGraph::new();
    let id = graph.add_object(Arc::new(foo_descriptor(fingerprint)), vec![Value::from(name)]);
    GraphSerializer::new()
        .serialize(&graph, &Value::Ref(id))
        .unwrap()
}

fn deserializer() -> VersionTolerantDeserializer {
    let mut types = LocalTypes::new();
    types.register_type::<Foo>();
    VersionTolerantDeserializer::new(Arc::new(types))
}

#[test]
fn fails_when_no_alternates_configured() {
    let deser = deserializer();
    let err = deser.deserialize(&old_foo(2, "dos")).unwrap_err();
    match err {
        DecodeError::SchemaIncompatible {
            identity,
            stream,
            local,
            allowed,
        } => {
            assert_eq!(identity.as_str(), FOO);
            assert_eq!(stream, Fingerprint::new(2));
            assert_eq!(local, Fingerprint::new(3));
            assert!(allowed.is_empty());
        }
        other => panic!("expected schema incompatibility, got {other:?}"),
    }
}

#[test]
fn independently_built_deserializers_share_one_registry() {
    let registry = Arc::new(FingerprintRegistry::new());
    let types = || {
        let mut types = LocalTypes::new();
        types.register_type::<Foo>();
        Arc::new(types)
    };
    let configuring = VersionTolerantDeserializer::with_registry(types(), Arc::clone(&registry));
    let reading = VersionTolerantDeserializer::with_registry(types(), Arc::clone(&registry));

    let bytes = old_foo(2, "dos");
    assert!(matches!(
        reading.deserialize(&bytes),
        Err(DecodeError::SchemaIncompatible { .. })
    ));

    configuring.allow_fingerprint(FOO, 2u64);
    assert!(registry.is_allowed(&TypeIdentity::from(FOO), Fingerprint::new(2)));
    let foo: Foo = reading.deserialize_as(&bytes).unwrap();
    assert_eq!(foo.name, "dos");
}

#[test]
fn passes_when_alternates_configured() {
    let deser = deserializer();
    deser.allow_type::<Foo>(1u64);
    deser.allow_type::<Foo>(2u64);

    let uno = deser.deserialize(&old_foo(1, "uno")).unwrap();
    let instance = uno.root_instance().unwrap();
    assert_eq!(instance.descriptor().fingerprint(), Fingerprint::new(3));
    assert_eq!(
        uno.extract::<Foo>().unwrap(),
        Foo {
            name: "uno".into()
        }
    );

    let dos: Foo = deser.deserialize_as(&old_foo(2, "dos")).unwrap();
    assert_eq!(dos.name, "dos");
}

#[test]
fn current_fingerprint_needs_no_alternates() {
    let deser = deserializer();
    let foo: Foo = deser.deserialize_as(&old_foo(3, "tres")).unwrap();
    assert_eq!(foo.name, "tres");
}

#[test]
fn unlisted_fingerprint_still_fails_when_others_are_allowed() {
    let deser = deserializer();
    deser.allow_fingerprint(FOO, 1u64);
    let err = deser.deserialize(&old_foo(4, "cuatro")).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::SchemaIncompatible { ref allowed, .. } if allowed == &[Fingerprint::new(1)]
    ));
    assert!(err.to_string().contains("allowed alternates [0x1]"));
}

#[test]
fn substituted_record_is_read_with_the_current_layout() {
    // The old build called the field `label`; the current one calls it `name`.
    let old = Arc::new(TypeDescriptor::new(
        FOO,
        Fingerprint::new(1),
        FieldSchema::new([FieldSpec::new("label", FieldKind::Str)]),
    ));
    let mut graph = ObjectGraph::new();
    let id = graph.add_object(old, vec![Value::from("uno")]);
    let bytes = GraphSerializer::new()
        .serialize(&graph, &Value::Ref(id))
        .unwrap();

    let deser = deserializer();
    deser.allow_fingerprint(FOO, 1u64);
    let doc = deser.deserialize(&bytes).unwrap();
    let instance = doc.root_instance().unwrap();
    assert_eq!(instance.get("name"), Some(&Value::from("uno")));
    assert_eq!(instance.get("label"), None);
}

#[test]
fn unknown_type_is_fatal_regardless_of_alternates() {
    let mut graph = ObjectGraph::new();
    let ghost = Arc::new(TypeDescriptor::new(
        "tests.Ghost",
        Fingerprint::new(1),
        FieldSchema::default(),
    ));
    let id = graph.add_object(ghost, vec![]);
    let bytes = GraphSerializer::new()
        .serialize(&graph, &Value::Ref(id))
        .unwrap();

    let deser = deserializer();
    deser.allow_fingerprint("tests.Ghost", 1u64);
    assert!(matches!(
        deser.deserialize(&bytes),
        Err(DecodeError::Resolve(ResolveError::UnknownType { identity }))
            if identity.as_str() == "tests.Ghost"
    ));
}

#[test]
fn cyclic_graph_survives_substitution() {
    let node = |fingerprint: u64| {
        Arc::new(TypeDescriptor::new(
            "tests.Node",
            Fingerprint::new(fingerprint),
            FieldSchema::new([
                FieldSpec::new("id", FieldKind::Long),
                FieldSpec::new("live", FieldKind::Bool),
                FieldSpec::new("weight", FieldKind::Double),
                FieldSpec::new("next", FieldKind::Object),
            ]),
        ))
    };

    let mut graph = ObjectGraph::new();
    let a = graph.add_object(
        node(7),
        vec![Value::Long(1), Value::Bool(true), Value::Double(0.5), Value::Null],
    );
    let b = graph.add_object(
        node(7),
        vec![Value::Long(2), Value::Bool(false), Value::Double(-1.0), Value::Ref(a)],
    );
    graph.instance_mut(a).unwrap().set("next", Value::Ref(b));
    let bytes = GraphSerializer::new()
        .serialize(&graph, &Value::Ref(a))
        .unwrap();

    let current = node(8);
    let mut types = LocalTypes::new();
    types.register((*current).clone());
    let deser = VersionTolerantDeserializer::new(Arc::new(types));
    deser.allow_fingerprint("tests.Node", 7u64);

    let doc = deser.deserialize(&bytes).unwrap();
    let first = doc.root_instance().unwrap();
    assert_eq!(first.descriptor(), &current);
    let second = doc.graph.resolve_instance(first.get("next").unwrap()).unwrap();
    assert_eq!(second.field::<i64>(&doc.graph, "id").unwrap(), 2);
    assert_eq!(second.field::<f64>(&doc.graph, "weight").unwrap(), -1.0);
    assert!(!second.field::<bool>(&doc.graph, "live").unwrap());
    assert_eq!(second.get("next"), Some(&doc.root));
    // Both records share the one interned descriptor.
    assert!(Arc::ptr_eq(first.descriptor(), second.descriptor()));
}

#[test]
fn opaque_local_type_is_decoded_with_the_stream_layout() {
    let mut graph = ObjectGraph::new();
    let blob = Arc::new(TypeDescriptor::new(
        "tests.Blob",
        Fingerprint::new(11),
        FieldSchema::new([FieldSpec::new("size", FieldKind::Int)]),
    ));
    let id = graph.add_object(Arc::clone(&blob), vec![Value::Int(64)]);
    let bytes = GraphSerializer::new()
        .serialize(&graph, &Value::Ref(id))
        .unwrap();

    let mut types = LocalTypes::new();
    types.register_opaque("tests.Blob");
    let deser = VersionTolerantDeserializer::new(Arc::new(types));
    deser.allow_fingerprint("tests.Blob", 11u64);

    let doc = deser.deserialize(&bytes).unwrap();
    let instance = doc.root_instance().unwrap();
    assert_eq!(instance.descriptor(), &blob);
    assert_eq!(instance.get("size"), Some(&Value::Int(64)));
}

#[test]
fn lists_of_mixed_versions() {
    let mut graph = ObjectGraph::new();
    let one = graph.add_object(Arc::new(foo_descriptor(1)), vec![Value::from("uno")]);
    let three = graph.add_object(Arc::new(foo_descriptor(3)), vec![Value::from("tres")]);
    let list = graph.add_list(vec![Value::Ref(one), Value::Null, Value::Ref(three)]);
    let bytes = GraphSerializer::new()
        .serialize(&graph, &Value::Ref(list))
        .unwrap();

    let deser = deserializer();
    deser.allow_type::<Foo>(1u64);
    let foos: Vec<Option<Foo>> = deser.deserialize_as(&bytes).unwrap();
    assert_eq!(
        foos,
        vec![
            Some(Foo { name: "uno".into() }),
            None,
            Some(Foo { name: "tres".into() }),
        ]
    );
}
